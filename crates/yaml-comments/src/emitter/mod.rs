//! Renders an annotated tree back to YAML text.
//!
//! Without comments the output matches a plain block-style serializer:
//! nested block collections are indented one unit, block sequences under a
//! mapping key sit at the key's indentation, and flow collections stay on
//! one line. Comments are written back where the analyzer found them.

mod claims;
mod scalar;
mod tags;
mod writer;

use crate::classify::{
    has_bullet_marker, is_single_line, needs_explicit_key, needs_space_before_colon,
    renders_in_flow,
};
use crate::comments::{AnnotatedTree, Comments};
use crate::error::Error;
use crate::tree::{Collection, Document, NodeId, NodeKind, Scalar, ScalarStyle, Tree};

use claims::BulletClaims;
use scalar::Encoded;
use tags::TagScope;
use writer::LineWriter;

/// Settings for [`render_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterOptions {
    indent_width: usize,
}

impl EmitterOptions {
    pub const DEFAULT_INDENT_WIDTH: usize = 2;

    /// # Errors
    ///
    /// Returns [`Error::InvalidIndent`] unless `indent_width` is 2, 3 or 4.
    pub fn new(indent_width: usize) -> Result<Self, Error> {
        if !(2..=4).contains(&indent_width) {
            return Err(Error::InvalidIndent {
                width: indent_width,
            });
        }
        Ok(Self { indent_width })
    }

    pub const fn indent_width(&self) -> usize {
        self.indent_width
    }
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            indent_width: Self::DEFAULT_INDENT_WIDTH,
        }
    }
}

/// Render `annotated` with the default options.
///
/// # Errors
///
/// Returns an error if a stored comment is not a `#` comment or if a
/// document or stream node appears where a value was expected.
pub fn render(annotated: &AnnotatedTree) -> Result<String, Error> {
    render_with(annotated, &EmitterOptions::default())
}

/// Render `annotated` to YAML text.
///
/// The root may be a stream, a document, or any value node.
///
/// # Errors
///
/// See [`render`].
pub fn render_with(annotated: &AnnotatedTree, options: &EmitterOptions) -> Result<String, Error> {
    let tree = &annotated.tree;
    let Some(root) = tree.root() else {
        return Ok(String::new());
    };
    let _span = tracing::debug_span!(
        "render",
        nodes = tree.len(),
        indent = options.indent_width
    )
    .entered();

    let claims = BulletClaims::collect(tree, &annotated.comments);
    let mut emitter = Emitter {
        tree,
        comments: &annotated.comments,
        claims: &claims,
        out: LineWriter::new(options.indent_width),
    };
    emitter.emit_root(root)?;
    Ok(emitter.out.finish())
}

/// Where a node is rendered.
#[derive(Clone, Copy)]
struct Frame<'s> {
    depth: usize,
    /// Inside a flow collection.
    flow: bool,
    /// Depth of the node that block scalar indentation indicators are
    /// relative to.
    block_base: usize,
    tags: &'s TagScope,
}

impl<'s> Frame<'s> {
    fn top(tags: &'s TagScope) -> Self {
        Self {
            depth: 0,
            flow: false,
            block_base: 0,
            tags,
        }
    }

    fn at(self, depth: usize) -> Self {
        Self { depth, ..self }
    }
}

struct Emitter<'t> {
    tree: &'t Tree,
    comments: &'t Comments,
    claims: &'t BulletClaims,
    out: LineWriter,
}

fn unexpected(tree: &Tree, id: NodeId, expected: &'static str) -> Error {
    Error::UnexpectedNode {
        node: id,
        found: tree.kind(id).name(),
        expected,
    }
}

/// The comment text to write, or an error if `text` is not a comment.
fn comment_text(id: NodeId, text: &str) -> Result<&str, Error> {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('#') || trimmed.contains(['\n', '\r']) {
        return Err(Error::MalformedComment {
            node: id,
            text: text.to_owned(),
        });
    }
    Ok(trimmed)
}

impl Emitter<'_> {
    fn emit_root(&mut self, root: NodeId) -> Result<(), Error> {
        let tree = self.tree;
        match tree.kind(root) {
            NodeKind::Stream(documents) => self.emit_stream(root, documents),
            NodeKind::Document(doc) => self.emit_document(root, doc, false, false).map(drop),
            _ => {
                let tags = TagScope::default();
                self.emit_node(root, Frame::top(&tags))?;
                self.out.newline();
                Ok(())
            }
        }
    }

    fn emit_stream(&mut self, id: NodeId, documents: &[NodeId]) -> Result<(), Error> {
        let tree = self.tree;
        let comments = self.comments;
        self.emit_comments(id, 0, comments.leading(id))?;
        let mut follows_open = false;
        for (i, &doc_id) in documents.iter().enumerate() {
            let NodeKind::Document(doc) = tree.kind(doc_id) else {
                return Err(unexpected(tree, doc_id, "document"));
            };
            let next_has_directives = documents.get(i + 1).is_some_and(|&next| {
                matches!(tree.kind(next), NodeKind::Document(d) if !d.tag_directives.is_empty())
            });
            let ended = self.emit_document(doc_id, doc, follows_open, next_has_directives)?;
            follows_open = !ended;
        }
        self.emit_comments(id, 0, comments.trailing(id))
    }

    /// Returns whether the document was closed with `...`.
    fn emit_document(
        &mut self,
        id: NodeId,
        doc: &Document,
        follows_open: bool,
        next_has_directives: bool,
    ) -> Result<bool, Error> {
        let comments = self.comments;
        self.emit_comments(id, 0, comments.leading(id))?;
        for directive in &doc.tag_directives {
            self.out.newline();
            self.out
                .write(0, &format!("%TAG {} {}", directive.handle, directive.prefix));
            self.out.newline();
        }
        if !doc.implicit_start || !doc.tag_directives.is_empty() || follows_open {
            self.out.newline();
            self.out.write(0, "---");
            if comments.leading(doc.root).is_empty() {
                self.out.space();
            } else {
                self.out.newline();
            }
        }

        let tags = TagScope::for_document(&doc.tag_directives);
        self.emit_node(doc.root, Frame::top(&tags))?;
        self.out.newline();

        let ended = !doc.implicit_end || next_has_directives;
        if ended {
            self.out.write(0, "...");
            self.out.newline();
        }
        self.emit_comments(id, 0, comments.trailing(id))?;
        tracing::debug!(node = %id, ended, "rendered document");
        Ok(ended)
    }

    fn emit_node(&mut self, id: NodeId, frame: Frame<'_>) -> Result<(), Error> {
        if !self.claims.is_claimed(id) {
            let comments = self.comments;
            self.emit_comments(id, frame.depth, comments.leading(id))?;
        }
        self.emit_content(id, frame)
    }

    /// Everything but the leading comments.
    fn emit_content(&mut self, id: NodeId, frame: Frame<'_>) -> Result<(), Error> {
        let tree = self.tree;
        let kind = tree.kind(id);
        if let Some(anchor) = kind.anchor() {
            self.out.write(frame.depth, &format!("&{anchor}"));
            self.out.space();
        }
        if let Some(tag) = kind.tag() {
            self.out.write(frame.depth, &frame.tags.render(tag));
            self.out.space();
        }
        match kind {
            NodeKind::Scalar(scalar) => self.emit_scalar(id, scalar, frame),
            NodeKind::Alias(name) => {
                self.out.write(frame.depth, &format!("*{name}"));
                self.emit_inline_end(id, frame)
            }
            NodeKind::Mapping(c) if renders_in_flow(tree, id, frame.flow) => {
                self.emit_flow_mapping(id, c, frame)
            }
            NodeKind::Sequence(c) if renders_in_flow(tree, id, frame.flow) => {
                self.emit_flow_sequence(id, c, frame)
            }
            NodeKind::Mapping(c) => self.emit_block_mapping(id, c, frame),
            NodeKind::Sequence(c) => self.emit_block_sequence(id, c, frame),
            NodeKind::Document(_) | NodeKind::Stream(_) => {
                Err(unexpected(tree, id, "scalar, alias, mapping or sequence"))
            }
        }
    }

    /// Each comment on a line of its own.
    fn emit_comments<S: AsRef<str>>(
        &mut self,
        id: NodeId,
        depth: usize,
        lines: &[S],
    ) -> Result<(), Error> {
        for line in lines {
            let text = comment_text(id, line.as_ref())?;
            self.out.newline();
            self.out.write(depth, text);
            self.out.newline();
        }
        Ok(())
    }

    /// A line-end comment goes after the node on the same line.
    fn emit_line_end(&mut self, id: NodeId) -> Result<bool, Error> {
        let Some(line) = self.comments.line_end(id) else {
            return Ok(false);
        };
        let text = comment_text(id, line)?;
        self.out.space();
        self.out.write(0, text);
        Ok(true)
    }

    /// Line-end and trailing comments of a node that ends mid-line.
    fn emit_inline_end(&mut self, id: NodeId, frame: Frame<'_>) -> Result<(), Error> {
        if self.emit_line_end(id)? {
            self.out.newline();
        }
        let comments = self.comments;
        self.emit_comments(id, frame.depth, comments.trailing(id))
    }

    fn emit_scalar(&mut self, id: NodeId, scalar: &Scalar, frame: Frame<'_>) -> Result<(), Error> {
        let units = (frame.depth + 1).saturating_sub(frame.block_base);
        match scalar::encode(scalar, frame.flow, self.out.unit() * units) {
            Encoded::Inline(text) => {
                self.out.write(frame.depth, &text);
                self.emit_inline_end(id, frame)
            }
            Encoded::Block { header, lines } => {
                self.out.write(frame.depth, &header);
                self.emit_line_end(id)?;
                self.out.block_lines(frame.depth, &lines);
                let comments = self.comments;
                self.emit_comments(id, frame.depth, comments.trailing(id))
            }
        }
    }

    fn emit_flow_mapping(
        &mut self,
        id: NodeId,
        collection: &Collection,
        frame: Frame<'_>,
    ) -> Result<(), Error> {
        let inner = Frame {
            depth: frame.depth + 1,
            flow: true,
            ..frame
        };
        self.out.write(frame.depth, "{");
        for (i, (key, value)) in collection.pairs().enumerate() {
            if i > 0 {
                self.out.write(inner.depth, ",");
                self.out.space();
            }
            self.emit_node(key, inner)?;
            if is_bare_null(self.tree, self.comments, value) {
                continue;
            }
            if needs_space_before_colon(self.tree, key) {
                self.out.space();
            }
            self.out.write(inner.depth, ":");
            self.out.space();
            self.emit_node(value, inner)?;
        }
        self.out.write(frame.depth, "}");
        self.emit_inline_end(id, frame)
    }

    fn emit_flow_sequence(
        &mut self,
        id: NodeId,
        collection: &Collection,
        frame: Frame<'_>,
    ) -> Result<(), Error> {
        let inner = Frame {
            depth: frame.depth + 1,
            flow: true,
            ..frame
        };
        self.out.write(frame.depth, "[");
        for (i, &child) in collection.children.iter().enumerate() {
            if i > 0 {
                self.out.write(inner.depth, ",");
                self.out.space();
            }
            self.emit_node(child, inner)?;
        }
        self.out.write(frame.depth, "]");
        self.emit_inline_end(id, frame)
    }

    fn emit_block_mapping(
        &mut self,
        id: NodeId,
        collection: &Collection,
        frame: Frame<'_>,
    ) -> Result<(), Error> {
        let tree = self.tree;
        let entry = Frame {
            block_base: frame.depth,
            ..frame
        };
        self.out.newline();
        for (key, value) in collection.pairs() {
            if needs_explicit_key(tree, self.comments, key) {
                self.emit_explicit_entry(key, value, entry)?;
            } else {
                self.emit_node(key, entry)?;
                if needs_space_before_colon(tree, key) {
                    self.out.space();
                }
                self.out.write(frame.depth, ":");
                self.out.space();
                self.emit_value(value, entry)?;
            }
            self.out.newline();
        }
        self.emit_block_end(id, frame.depth)
    }

    /// A mapping value after `key:`.
    fn emit_value(&mut self, value: NodeId, frame: Frame<'_>) -> Result<(), Error> {
        let tree = self.tree;
        if is_single_line(tree, self.comments, value) || has_bullet_marker(tree, value) {
            return self.emit_node(value, frame);
        }
        if !self.comments.leading(value).is_empty() {
            self.out.newline();
        }
        self.emit_node(value, frame.at(frame.depth + 1))
    }

    /// `? key` / `: value` for keys that do not fit before a `:`.
    fn emit_explicit_entry(
        &mut self,
        key: NodeId,
        value: NodeId,
        frame: Frame<'_>,
    ) -> Result<(), Error> {
        let comments = self.comments;
        let nested = frame.at(frame.depth + 1);
        for (indicator, node) in [("?", key), (":", value)] {
            self.out.newline();
            if !self.claims.is_claimed(node) {
                self.emit_comments(node, frame.depth, comments.leading(node))?;
            }
            self.out.bullet(frame.depth, indicator);
            self.emit_content(node, nested)?;
            self.out.close_bullet();
        }
        Ok(())
    }

    fn emit_block_sequence(
        &mut self,
        id: NodeId,
        collection: &Collection,
        frame: Frame<'_>,
    ) -> Result<(), Error> {
        let comments = self.comments;
        let claims = self.claims;
        let item_frame = Frame {
            depth: frame.depth + 1,
            block_base: frame.depth,
            ..frame
        };
        self.out.newline();
        for &item in &collection.children {
            for &hoisted in claims.hoisted(item) {
                self.emit_comments(hoisted, frame.depth, comments.leading(hoisted))?;
            }
            self.out.bullet(frame.depth, "-");
            self.emit_node(item, item_frame)?;
            self.out.close_bullet();
            self.out.newline();
        }
        self.emit_block_end(id, frame.depth)
    }

    /// Comments after the last entry of a block collection.
    fn emit_block_end(&mut self, id: NodeId, depth: usize) -> Result<(), Error> {
        let comments = self.comments;
        if let Some(line) = comments.line_end(id) {
            self.emit_comments(id, depth, &[line])?;
        }
        self.emit_comments(id, depth, comments.trailing(id))
    }
}

/// An empty plain value with nothing attached, written as `{key}` in flow.
fn is_bare_null(tree: &Tree, comments: &Comments, id: NodeId) -> bool {
    matches!(
        tree.kind(id),
        NodeKind::Scalar(s) if s.value.is_empty()
            && s.style == ScalarStyle::Plain
            && s.tag.is_none()
            && s.anchor.is_none()
    ) && comments.get(id).is_empty()
}
