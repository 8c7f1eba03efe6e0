use std::io::Write;
use std::path::PathBuf;

use bpaf::Bpaf;
use yaml_comments::{AnnotatedTree, EmitterOptions};

#[derive(Debug, Clone, Bpaf)]
pub struct RenderArgs {
    /// Leave every comment out of the output
    #[bpaf(long("strip-comments"), switch)]
    pub strip_comments: bool,

    /// Spaces per indentation level (2, 3 or 4)
    #[bpaf(
        long("indent"),
        argument("N"),
        fallback(EmitterOptions::DEFAULT_INDENT_WIDTH),
        display_fallback
    )]
    pub indent: usize,

    #[bpaf(positional("PATH"))]
    pub paths: Vec<PathBuf>,
}

/// Write the rendered YAML of every file in `args.paths` to `out`.
pub fn run(args: &RenderArgs, verbose: bool, out: &mut impl Write) -> anyhow::Result<()> {
    anyhow::ensure!(!args.paths.is_empty(), "no input files");
    let options = EmitterOptions::new(args.indent)?;
    for path in &args.paths {
        let annotated = super::load(path, verbose)?;
        let annotated = if args.strip_comments {
            AnnotatedTree::bare(annotated.tree)
        } else {
            annotated
        };
        let rendered = yaml_comments::render_with(&annotated, &options)?;
        out.write_all(rendered.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(paths: Vec<PathBuf>) -> RenderArgs {
        RenderArgs {
            strip_comments: false,
            indent: EmitterOptions::DEFAULT_INDENT_WIDTH,
            paths,
        }
    }

    #[test]
    fn renders_with_comments() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.yml");
        std::fs::write(&path, "# top\na:\n  b: 1 # one\n")?;

        let mut out = Vec::new();
        run(&args(vec![path]), false, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "# top\na:\n  b: 1 # one\n");
        Ok(())
    }

    #[test]
    fn strips_comments_and_reindents() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.yml");
        std::fs::write(&path, "# top\na:\n  b: 1 # one\n")?;

        let mut out = Vec::new();
        let args = RenderArgs {
            strip_comments: true,
            indent: 4,
            ..args(vec![path])
        };
        run(&args, false, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "a:\n    b: 1\n");
        Ok(())
    }

    #[test]
    fn rejects_bad_indent() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.yml");
        std::fs::write(&path, "a: 1\n")?;

        let args = RenderArgs {
            indent: 8,
            ..args(vec![path])
        };
        let err = run(&args, false, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<yaml_comments::Error>(),
            Some(yaml_comments::Error::InvalidIndent { width: 8 })
        ));
        Ok(())
    }

    #[test]
    fn requires_a_path() {
        assert!(run(&args(Vec::new()), false, &mut Vec::new()).is_err());
    }
}
