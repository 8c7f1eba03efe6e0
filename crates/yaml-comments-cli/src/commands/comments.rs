use std::io::Write;
use std::path::{Path, PathBuf};

use bpaf::Bpaf;
use yaml_comments::AnnotatedTree;

#[derive(Debug, Clone, Bpaf)]
pub struct CommentsArgs {
    #[bpaf(positional("PATH"))]
    pub paths: Vec<PathBuf>,
}

/// List every attributed comment as `path:line:col kind slot text`.
pub fn run(args: &CommentsArgs, verbose: bool, out: &mut impl Write) -> anyhow::Result<()> {
    anyhow::ensure!(!args.paths.is_empty(), "no input files");
    for path in &args.paths {
        let annotated = super::load(path, verbose)?;
        for line in listing(path, &annotated) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

/// One line per comment, owners in tree order. Positions are 1-based and
/// point at the owning node.
fn listing(path: &Path, annotated: &AnnotatedTree) -> Vec<String> {
    let tree = &annotated.tree;
    let mut lines = Vec::new();
    for id in tree.walk() {
        let slot = annotated.comments.get(id);
        if slot.is_empty() {
            continue;
        }
        let node = tree.node(id);
        let prefix = format!("{}:{} {}", path.display(), node.start, node.kind.name());
        let entries = slot
            .leading
            .iter()
            .map(|text| ("leading", text))
            .chain(slot.line_end.iter().map(|text| ("line-end", text)))
            .chain(slot.trailing.iter().map(|text| ("trailing", text)));
        for (name, text) in entries {
            lines.push(format!("{prefix} {name} {text}"));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_comments_by_owning_node() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("c.yml");
        std::fs::write(&path, "# head\nkey: value # eol\nlist:\n- a\n# tail\n")?;

        let mut out = Vec::new();
        run(
            &CommentsArgs {
                paths: vec![path.clone()],
            },
            false,
            &mut out,
        )?;
        let p = path.display();
        pretty_assertions::assert_eq!(
            String::from_utf8(out)?,
            format!(
                "{p}:2:1 mapping trailing # tail\n\
                 {p}:2:1 scalar leading # head\n\
                 {p}:2:6 scalar line-end # eol\n"
            )
        );
        Ok(())
    }
}
