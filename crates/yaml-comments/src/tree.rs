use core::fmt;

use crate::error::Error;

/// A 0-based line/column location in the source text.
///
/// Columns count characters, not bytes. Ordering is line first, then column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Index of a node in its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    pub const fn is_block(self) -> bool {
        matches!(self, Self::Literal | Self::Folded)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectionStyle {
    #[default]
    Block,
    Flow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scalar {
    pub value: String,
    pub style: ScalarStyle,
    /// Fully resolved tag, e.g. `tag:yaml.org,2002:str` or `!local`.
    pub tag: Option<String>,
    pub anchor: Option<String>,
}

impl Scalar {
    pub fn new(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            value: value.into(),
            style,
            tag: None,
            anchor: None,
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(value, ScalarStyle::Plain)
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }
}

/// Payload shared by mappings and sequences.
///
/// Mapping children are key/value pairs flattened as `[k0, v0, k1, v1, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub children: Vec<NodeId>,
    pub style: CollectionStyle,
    pub tag: Option<String>,
    pub anchor: Option<String>,
}

impl Collection {
    pub fn block(children: Vec<NodeId>) -> Self {
        Self {
            children,
            style: CollectionStyle::Block,
            tag: None,
            anchor: None,
        }
    }

    pub fn flow(children: Vec<NodeId>) -> Self {
        Self {
            style: CollectionStyle::Flow,
            ..Self::block(children)
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Key/value pairs of a mapping.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.children.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }
}

/// A `%TAG` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDirective {
    pub handle: String,
    pub prefix: String,
}

impl TagDirective {
    pub fn new(handle: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            prefix: prefix.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: NodeId,
    pub implicit_start: bool,
    pub implicit_end: bool,
    pub tag_directives: Vec<TagDirective>,
}

impl Document {
    /// A document without `---` or `...` markers.
    pub fn implicit(root: NodeId) -> Self {
        Self {
            root,
            implicit_start: true,
            implicit_end: true,
            tag_directives: Vec::new(),
        }
    }

    /// A document opened by `---` and closed by `...`.
    pub fn explicit(root: NodeId) -> Self {
        Self {
            implicit_start: false,
            implicit_end: false,
            ..Self::implicit(root)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Scalar(Scalar),
    /// Use-site of an anchor; holds the anchor name.
    Alias(String),
    Mapping(Collection),
    Sequence(Collection),
    Document(Document),
    /// The documents of a stream, in order.
    Stream(Vec<NodeId>),
}

impl NodeKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Alias(_) => "alias",
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Document(_) => "document",
            Self::Stream(_) => "stream",
        }
    }

    /// Direct children in document order.
    pub fn children(&self) -> &[NodeId] {
        match self {
            Self::Scalar(_) | Self::Alias(_) => &[],
            Self::Mapping(c) | Self::Sequence(c) => &c.children,
            Self::Document(doc) => core::slice::from_ref(&doc.root),
            Self::Stream(docs) => docs,
        }
    }

    pub fn anchor(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => s.anchor.as_deref(),
            Self::Mapping(c) | Self::Sequence(c) => c.anchor.as_deref(),
            Self::Alias(_) | Self::Document(_) | Self::Stream(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => s.tag.as_deref(),
            Self::Mapping(c) | Self::Sequence(c) => c.tag.as_deref(),
            Self::Alias(_) | Self::Document(_) | Self::Stream(_) => None,
        }
    }

    pub fn collection(&self) -> Option<&Collection> {
        match self {
            Self::Mapping(c) | Self::Sequence(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl Node {
    /// A node without a meaningful source span, for trees built by hand.
    pub fn new(kind: NodeKind) -> Self {
        Self::spanning(kind, Position::default(), Position::default())
    }

    pub fn spanning(kind: NodeKind, start: Position, end: Position) -> Self {
        Self { kind, start, end }
    }
}

impl From<NodeKind> for Node {
    fn from(kind: NodeKind) -> Self {
        Self::new(kind)
    }
}

/// Arena of nodes. Children are pushed before their parents and the last
/// node pushed is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, checking the shape invariants that do not depend on the
    /// source text.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced child has not been pushed yet, if a
    /// mapping has an odd number of children, or if the span is inverted.
    pub fn push(&mut self, node: impl Into<Node>) -> Result<NodeId, Error> {
        let node = node.into();
        let id = NodeId(self.nodes.len());
        if let Some(&child) = node.kind.children().iter().find(|c| c.0 >= id.0) {
            return Err(Error::DanglingChild {
                child,
                len: self.nodes.len(),
            });
        }
        if let NodeKind::Mapping(m) = &node.kind
            && m.children.len() % 2 != 0
        {
            return Err(Error::OddMapping {
                len: m.children.len(),
            });
        }
        if node.end < node.start {
            return Err(Error::InvertedSpan {
                node: id,
                start: node.start,
                end: node.end,
            });
        }
        self.nodes.push(node);
        Ok(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.nodes.len().checked_sub(1).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// All nodes with their ids, in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Node ids in document order (pre-order from the root).
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.kind(id).children().iter().rev());
        }
        order
    }

    /// First scalar in document order whose value is `value`.
    pub fn find_scalar(&self, value: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|&id| matches!(self.kind(id), NodeKind::Scalar(s) if s.value == value))
    }
}
