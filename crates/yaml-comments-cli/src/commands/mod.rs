pub mod check;
pub mod comments;
pub mod render;

use std::path::Path;

use yaml_comments::AnnotatedTree;

/// Read and analyse one input file.
pub(crate) fn load(path: &Path, verbose: bool) -> anyhow::Result<AnnotatedTree> {
    if verbose {
        eprintln!("{}", path.display());
    }
    let annotated = yaml_comments::parse_file(path)?;
    tracing::debug!(path = %path.display(), comments = annotated.comments.iter().count(), "loaded");
    Ok(annotated)
}
