use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::tree::{NodeId, Position};

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("invalid YAML: {message}")]
    #[diagnostic(code(yaml_comments::parse))]
    Parse {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("failed to read {path}")]
    #[diagnostic(code(yaml_comments::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("node {node} has position {position} outside the source text ({lines} lines)")]
    #[diagnostic(
        code(yaml_comments::position_out_of_bounds),
        help("the tree must be parsed from the same text that is passed to attach_comments")
    )]
    PositionOutOfBounds {
        node: NodeId,
        position: Position,
        lines: usize,
    },

    #[error("node {node} ends at {end} before it starts at {start}")]
    #[diagnostic(code(yaml_comments::inverted_span))]
    InvertedSpan {
        node: NodeId,
        start: Position,
        end: Position,
    },

    #[error("mapping has an odd number of children ({len})")]
    #[diagnostic(
        code(yaml_comments::odd_mapping),
        help("mapping children are key/value pairs flattened as [k0, v0, k1, v1, ...]")
    )]
    OddMapping { len: usize },

    #[error("child {child} does not exist in a tree of {len} nodes")]
    #[diagnostic(
        code(yaml_comments::dangling_child),
        help("push children before the collection that owns them")
    )]
    DanglingChild { child: NodeId, len: usize },

    #[error("unexpected {found} node {node} where {expected} was expected")]
    #[diagnostic(code(yaml_comments::unexpected_node))]
    UnexpectedNode {
        node: NodeId,
        found: &'static str,
        expected: &'static str,
    },

    #[error("comment {text:?} on node {node} is not a YAML comment")]
    #[diagnostic(
        code(yaml_comments::malformed_comment),
        help("comments must start with `#`, optionally preceded by whitespace, and fit on one line")
    )]
    MalformedComment { node: NodeId, text: String },

    #[error("anchor #{id} has no `&name` in the source")]
    #[diagnostic(code(yaml_comments::missing_anchor))]
    MissingAnchor { id: usize },

    #[error("indent width {width} is out of range")]
    #[diagnostic(
        code(yaml_comments::invalid_indent),
        help("use an indent width between 2 and 4")
    )]
    InvalidIndent { width: usize },
}
