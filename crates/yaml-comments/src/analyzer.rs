use tracing::debug;

use crate::classify::{has_bullet_marker, opens_with_delimiter};
use crate::comments::{AnnotatedTree, Comments};
use crate::error::Error;
use crate::source::{SourceText, comment_start};
use crate::tree::{Collection, NodeId, NodeKind, Position, Tree};

/// Attribute every comment in `text` to a node of `tree`.
///
/// `tree` must have been parsed from `text`. Comments between two nodes go to
/// the following node as leading comments; comments before the closing
/// delimiter of a flow collection, before an explicit `...`, or at the end of
/// the stream trail the node before them. A comment on the line where a
/// scalar, alias or flow collection ends, or on a block scalar's header line,
/// is that node's line-end comment.
///
/// # Errors
///
/// Returns an error if a node position lies outside `text` or a node ends
/// before it starts.
pub fn attach_comments(text: &str, tree: Tree) -> Result<AnnotatedTree, Error> {
    let source = SourceText::new(text);
    check_positions(&source, &tree)?;

    let _span = tracing::debug_span!("attach_comments", nodes = tree.len()).entered();
    let comments = {
        let mut analyzer = Analyzer {
            source: &source,
            tree: &tree,
            comments: Comments::for_tree(&tree),
            last: Position::default(),
            bullet_owner: None,
        };
        if let Some(root) = tree.root() {
            analyzer.visit(root);
        }
        analyzer.comments
    };
    Ok(AnnotatedTree::new(tree, comments))
}

fn check_positions(source: &SourceText<'_>, tree: &Tree) -> Result<(), Error> {
    for (id, node) in tree.nodes() {
        for position in [node.start, node.end] {
            if !source.contains(position) {
                return Err(Error::PositionOutOfBounds {
                    node: id,
                    position,
                    lines: source.line_count(),
                });
            }
        }
        if node.end < node.start {
            return Err(Error::InvertedSpan {
                node: id,
                start: node.start,
                end: node.end,
            });
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'t> {
    Bullet,
    Comment(&'t str),
}

/// Split the text between two nodes into `-` bullets and `#` comments.
///
/// A comment runs to the end of its line and hides any `-` inside it. Node
/// properties (`&anchor`, `!tag`) may contain both characters and are skipped
/// whole.
fn tokens(region: &str) -> Vec<Token<'_>> {
    let mut found = Vec::new();
    let mut rest = region;
    while let Some(i) = rest.find(['-', '#', '&', '!']) {
        if rest[i..].starts_with(['&', '!']) {
            let len = rest[i..].find(char::is_whitespace).unwrap_or(rest.len() - i);
            rest = &rest[i + len..];
            continue;
        }
        if rest[i..].starts_with('-') {
            found.push(Token::Bullet);
            rest = &rest[i + 1..];
            continue;
        }
        let line_len = rest[i..].find('\n').unwrap_or(rest.len() - i);
        let comment = &rest[i..i + line_len];
        found.push(Token::Comment(comment.strip_suffix('\r').unwrap_or(comment)));
        rest = &rest[i + line_len..];
    }
    found
}

struct Analyzer<'a> {
    source: &'a SourceText<'a>,
    tree: &'a Tree,
    comments: Comments,
    /// End of the last region handed out by `read_comments`.
    last: Position,
    /// Block sequence item whose `- ` may precede the next comments.
    bullet_owner: Option<NodeId>,
}

impl Analyzer<'_> {
    /// Comments between the cursor and `upto`; moves the cursor to `upto`.
    fn read_comments(&mut self, upto: Position) -> Vec<String> {
        let region = self.source.slice(self.last, upto);
        self.last = upto;
        let owner = self.bullet_owner.take();
        let mut buffered = Vec::new();
        for token in tokens(region) {
            match token {
                Token::Bullet => {
                    if let Some(owner) = owner
                        && !buffered.is_empty()
                    {
                        debug!(node = %owner, count = buffered.len(), "comments after bullet");
                        self.comments.get_mut(owner).leading.append(&mut buffered);
                    }
                }
                Token::Comment(text) => buffered.push(text.to_owned()),
            }
        }
        buffered
    }

    fn lead(&mut self, id: NodeId, upto: Position) {
        let found = self.read_comments(upto);
        if !found.is_empty() {
            debug!(node = %id, count = found.len(), "leading comments");
            self.comments.get_mut(id).leading.extend(found);
        }
    }

    fn trail(&mut self, id: NodeId, upto: Position) {
        let found = self.read_comments(upto);
        if !found.is_empty() {
            debug!(node = %id, count = found.len(), "trailing comments");
            self.comments.get_mut(id).trailing.extend(found);
        }
    }

    fn visit(&mut self, id: NodeId) {
        let tree = self.tree;
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Scalar(scalar) => {
                self.lead(id, node.start);
                self.last = node.end;
                if scalar.style.is_block() {
                    self.block_header_comment(id, node.start);
                } else {
                    self.same_line_comment(id, node.end);
                }
            }
            NodeKind::Alias(_) => {
                self.lead(id, node.start);
                self.last = node.end;
                self.same_line_comment(id, node.end);
            }
            NodeKind::Mapping(c) | NodeKind::Sequence(c) => self.visit_collection(id, c),
            NodeKind::Document(doc) => {
                if !doc.implicit_start {
                    self.lead(id, node.start);
                }
                self.visit(doc.root);
                if !doc.implicit_end {
                    self.trail(doc.root, node.end);
                }
            }
            NodeKind::Stream(documents) => {
                for &doc in documents {
                    self.visit(doc);
                }
                let target = match documents.last() {
                    None => id,
                    Some(&last) => match tree.kind(last) {
                        NodeKind::Document(doc) if doc.implicit_end => doc.root,
                        _ => last,
                    },
                };
                self.trail(target, node.end);
            }
        }
    }

    fn visit_collection(&mut self, id: NodeId, collection: &Collection) {
        let node = self.tree.node(id);
        let delimited = opens_with_delimiter(self.source.rest_of_line(node.start));
        let bullets = !delimited && has_bullet_marker(self.tree, id);

        if delimited {
            self.lead(id, node.start);
        }
        for &child in &collection.children {
            if bullets {
                self.bullet_owner = Some(child);
            }
            self.visit(child);
        }
        if delimited {
            let target = collection.children.last().copied().unwrap_or(id);
            self.trail(target, node.end);
            self.same_line_comment(id, node.end);
        }
    }

    /// `key: | # note` keeps the note on the scalar's header line.
    fn block_header_comment(&mut self, id: NodeId, start: Position) {
        let header = self.source.rest_of_line(start);
        let Some(at) = comment_start(header) else {
            return;
        };
        let comment = header[at..].trim_end();
        debug!(node = %id, "block scalar header comment");
        self.comments.get_mut(id).line_end = Some(comment.to_owned());
        let line_end = Position::new(start.line, start.column + header.chars().count());
        self.last = self.last.max(line_end);
    }

    /// `key: value # note` and `[a, b] # note` keep the note on the line
    /// where the node ends.
    fn same_line_comment(&mut self, id: NodeId, end: Position) {
        let rest = self.source.rest_of_line(end);
        let trimmed = rest.trim_start();
        if !trimmed.starts_with('#') {
            return;
        }
        debug!(node = %id, "line-end comment");
        self.comments.get_mut(id).line_end = Some(trimmed.trim_end().to_owned());
        self.last = Position::new(end.line, end.column + rest.chars().count());
    }
}
