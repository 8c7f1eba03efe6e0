use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use bpaf::Bpaf;
use yaml_comments::EmitterOptions;

#[derive(Debug, Clone, Bpaf)]
pub struct CheckArgs {
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

/// Compare every file with its own round trip, writing a unified diff to
/// `out` for each one that changes.
///
/// Returns whether any file differed.
pub fn run(args: &CheckArgs, verbose: bool, out: &mut impl Write) -> anyhow::Result<bool> {
    anyhow::ensure!(!args.paths.is_empty(), "no input files");
    let options = EmitterOptions::new(args.indent)?;
    let mut differing = 0usize;
    for path in &args.paths {
        let annotated = super::load(path, verbose)?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        // Rendered output never carries a byte order mark.
        let original = content.strip_prefix('\u{feff}').unwrap_or(&content);
        let rendered = yaml_comments::render_with(&annotated, &options)?;
        if rendered == original {
            continue;
        }
        differing += 1;
        tracing::debug!(path = %path.display(), "round trip differs");
        let diff = crate::diff::unified(&path.display().to_string(), original, &rendered);
        out.write_all(diff.as_bytes())?;
    }
    if differing > 0 {
        eprintln!(
            "{differing} of {} file{} would change on a round trip",
            args.paths.len(),
            if args.paths.len() == 1 { "" } else { "s" }
        );
    }
    Ok(differing > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(paths: Vec<PathBuf>) -> anyhow::Result<(bool, String)> {
        let args = CheckArgs {
            indent: EmitterOptions::DEFAULT_INDENT_WIDTH,
            paths,
        };
        let mut out = Vec::new();
        let differs = run(&args, false, &mut out)?;
        Ok((differs, String::from_utf8(out)?))
    }

    #[test]
    fn stable_file_passes() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ok.yml");
        std::fs::write(&path, "# note\nkey: value # inline\n")?;

        let (differs, out) = check(vec![path])?;
        assert!(!differs);
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn byte_order_mark_is_ignored() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bom.yml");
        std::fs::write(&path, "\u{feff}key: value\n")?;

        let (differs, _) = check(vec![path])?;
        assert!(!differs);
        Ok(())
    }

    #[test]
    fn changed_file_reports_a_diff() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ok = dir.path().join("ok.yml");
        let moved = dir.path().join("moved.yml");
        std::fs::write(&ok, "a: 1\n")?;
        std::fs::write(&moved, "items:\n  - a\n")?;

        let (differs, out) = check(vec![ok, moved])?;
        assert!(differs);
        assert!(out.contains("-  - a\n"), "{out}");
        assert!(out.contains("+- a\n"), "{out}");
        assert!(!out.contains("ok.yml"), "{out}");
        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let err = check(vec![dir.path().join("absent.yml")])
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected an error"))?;
        assert!(matches!(
            err.downcast_ref::<yaml_comments::Error>(),
            Some(yaml_comments::Error::Io { .. })
        ));
        Ok(())
    }

    #[test]
    fn invalid_yaml_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.yml");
        std::fs::write(&path, "a: [1\n")?;

        let err = check(vec![path]).err().ok_or_else(|| anyhow::anyhow!("expected an error"))?;
        assert!(matches!(
            err.downcast_ref::<yaml_comments::Error>(),
            Some(yaml_comments::Error::Parse { .. })
        ));
        Ok(())
    }
}
