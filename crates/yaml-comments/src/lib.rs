#![allow(unused_assignments)] // thiserror/miette derive macros trigger false positives
//! Keep YAML comments across a parse and re-emit round trip.
//!
//! [`parse_tree`] produces a positioned node tree, [`attach_comments`]
//! attributes every comment in the source to a node of that tree, and
//! [`render`] writes the annotated tree back out with the comments in place.
//!
//! ```
//! let text = "# greeting\nhello: world # inline\n";
//! let annotated = yaml_comments::parse_stream(text)?;
//! assert_eq!(yaml_comments::render(&annotated)?, text);
//! # Ok::<(), yaml_comments::Error>(())
//! ```

mod analyzer;
pub mod classify;
mod comments;
mod emitter;
mod error;
mod parser;
mod source;
mod tree;

use std::path::Path;

pub use analyzer::attach_comments;
pub use comments::{AnnotatedTree, CommentAttachment, Comments};
pub use emitter::{EmitterOptions, render, render_with};
pub use error::Error;
pub use parser::parse_tree;
pub use tree::{
    Collection, CollectionStyle, Document, Node, NodeId, NodeKind, Position, Scalar, ScalarStyle,
    TagDirective, Tree,
};

/// Parse `text` and attach its comments.
///
/// # Errors
///
/// Returns [`Error::Parse`] if `text` is not valid YAML.
pub fn parse_stream(text: &str) -> Result<AnnotatedTree, Error> {
    let tree = parse_tree(text)?;
    attach_comments(text, tree)
}

/// Parse `text` and return the analysed stream with the id of its first
/// document, or `None` if the stream holds no document.
///
/// # Errors
///
/// Returns [`Error::Parse`] if `text` is not valid YAML.
pub fn parse(text: &str) -> Result<Option<(AnnotatedTree, NodeId)>, Error> {
    let annotated = parse_stream(text)?;
    let first = annotated
        .tree
        .root()
        .and_then(|root| annotated.tree.kind(root).children().first().copied());
    Ok(first.map(|doc| (annotated, doc)))
}

/// Read, parse and analyse the YAML file at `path`.
///
/// A leading byte order mark is ignored. Parse errors carry the file name.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Parse`] if it
/// is not valid YAML.
pub fn parse_file(path: &Path) -> Result<AnnotatedTree, Error> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    let text = content.strip_prefix('\u{feff}').unwrap_or(&content);
    tracing::debug!(path = %path.display(), bytes = text.len(), "parsing file");
    parse_stream_named(text, &path.display().to_string())
}

/// Like [`parse_stream`], with `name` as the source name in parse errors.
///
/// # Errors
///
/// Returns [`Error::Parse`] if `text` is not valid YAML.
pub fn parse_stream_named(text: &str, name: &str) -> Result<AnnotatedTree, Error> {
    let tree = parser::parse_named(text, name)?;
    attach_comments(text, tree)
}
