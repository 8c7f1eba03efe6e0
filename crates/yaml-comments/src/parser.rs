use miette::NamedSource;
use saphyr_parser::{Event, Marker, Parser, ScalarStyle as EventStyle, ScanError, Span, Tag};

use crate::classify::is_anchor_char;
use crate::error::Error;
use crate::source::{SourceText, is_marker_line};
use crate::tree::{
    Collection, CollectionStyle, Document, Node, NodeId, NodeKind, Position, Scalar, ScalarStyle,
    TagDirective, Tree,
};

/// Parse `text` into a positioned tree without comments.
///
/// The root is a stream holding one document per YAML document.
///
/// # Errors
///
/// Returns [`Error::Parse`] if `text` is not valid YAML.
pub fn parse_tree(text: &str) -> Result<Tree, Error> {
    parse_named(text, "<input>")
}

pub(crate) fn parse_named(text: &str, name: &str) -> Result<Tree, Error> {
    let events = collect_events(text, name)?;
    tracing::debug!(events = events.len(), "collected parser events");
    TreeBuilder::new(text, &events).build()
}

fn collect_events<'a>(text: &'a str, name: &str) -> Result<Vec<(Event<'a>, Span)>, Error> {
    let mut events = Vec::new();
    for result in Parser::new_from_str(text) {
        let (event, span) = result.map_err(|e| parse_error(text, name, &e))?;
        events.push((event, span));
    }
    Ok(events)
}

fn parse_error(text: &str, name: &str, err: &ScanError) -> Error {
    let offset = SourceText::new(text).byte_offset(at(*err.marker()));
    Error::Parse {
        message: err.info().to_owned(),
        src: NamedSource::new(name, text.to_owned()),
        span: (offset, 0).into(),
    }
}

/// Marker lines are 1-based, columns 0-based.
fn at(marker: Marker) -> Position {
    Position::new(marker.line().saturating_sub(1), marker.col())
}

fn resolve_tag(tag: &Tag) -> String {
    format!("{}{}", tag.handle, tag.suffix)
}

const fn scalar_style(style: EventStyle) -> ScalarStyle {
    match style {
        EventStyle::Plain => ScalarStyle::Plain,
        EventStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        EventStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        EventStyle::Literal => ScalarStyle::Literal,
        EventStyle::Folded => ScalarStyle::Folded,
    }
}

struct TreeBuilder<'a> {
    source: SourceText<'a>,
    events: &'a [(Event<'a>, Span)],
    pos: usize,
    tree: Tree,
    /// Anchor names in definition order; the parser numbers anchors from 1.
    anchors: Vec<String>,
    /// Nesting depth of flow collections.
    in_flow_context: usize,
    /// End of the most recently built node. Implicit nulls are placed here.
    last_end: Position,
    /// Byte offset where the current document's preamble begins.
    doc_floor: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a str, events: &'a [(Event<'a>, Span)]) -> Self {
        let source = SourceText::new(text);
        let anchors = scan_anchors(&source, events);
        Self {
            source,
            events,
            pos: 0,
            tree: Tree::new(),
            anchors,
            in_flow_context: 0,
            last_end: Position::default(),
            doc_floor: 0,
        }
    }

    fn peek(&self) -> Option<&'a (Event<'a>, Span)> {
        self.events.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a (Event<'a>, Span)> {
        let item = self.events.get(self.pos);
        self.pos += 1;
        item
    }

    fn push(&mut self, kind: NodeKind, start: Position, end: Position) -> Result<NodeId, Error> {
        let end = end.max(start);
        self.last_end = end;
        self.tree.push(Node::spanning(kind, start, end))
    }

    fn build(mut self) -> Result<Tree, Error> {
        let mut documents = Vec::new();
        while let Some((event, _)) = self.peek() {
            match event {
                Event::DocumentStart(_) => documents.push(self.build_document()?),
                Event::StreamEnd => break,
                _ => self.pos += 1,
            }
        }
        let end = self.source.end();
        self.push(NodeKind::Stream(documents), Position::default(), end)?;
        Ok(self.tree)
    }

    fn build_document(&mut self) -> Result<NodeId, Error> {
        let explicit_start = matches!(self.advance(), Some((Event::DocumentStart(true), _)));
        let floor = self.doc_floor;

        let marker = if explicit_start {
            self.source.find_marker_line(floor, "---")
        } else {
            None
        };
        let tag_directives = marker.map_or_else(Vec::new, |m| self.tag_directives(floor, m));
        let marker = marker.map(|m| self.source.position_at(m));
        self.last_end = marker.map_or_else(
            || self.source.position_at(floor),
            |m| Position::new(m.line, m.column + 3),
        );

        let root = match self.build_node()? {
            Some(root) => root,
            None => {
                let at = self.last_end;
                self.push(NodeKind::Scalar(Scalar::plain("")), at, at)?
            }
        };
        let root_node = self.tree.node(root);
        let (root_start, root_end) = (root_node.start, root_node.end);

        let mut end = root_end;
        let mut implicit_end = true;
        if let Some((Event::DocumentEnd, span)) = self.peek() {
            self.pos += 1;
            let line = at(span.start).line;
            if is_marker_line(self.source.line(line), "...") {
                implicit_end = false;
                end = end.max(Position::new(line, 3));
            }
        }

        let document = Document {
            root,
            implicit_start: !explicit_start,
            implicit_end,
            tag_directives,
        };
        let start = marker.unwrap_or(root_start).min(root_start);
        let id = self.push(NodeKind::Document(document), start, end)?;
        self.doc_floor = self.source.byte_offset(end);
        tracing::debug!(node = %id, explicit_start, implicit_end, "built document");
        Ok(id)
    }

    /// `%TAG` lines between the previous document and this one's `---`.
    fn tag_directives(&self, from: usize, to: usize) -> Vec<TagDirective> {
        self.source.text()[from..to]
            .lines()
            .filter_map(|line| {
                let mut parts = line.trim().strip_prefix("%TAG")?.split_whitespace();
                Some(TagDirective::new(parts.next()?, parts.next()?))
            })
            .collect()
    }

    fn build_node(&mut self) -> Result<Option<NodeId>, Error> {
        let Some((event, span)) = self.peek() else {
            return Ok(None);
        };
        let id = match event {
            Event::Scalar(value, style, anchor_id, tag) => {
                self.pos += 1;
                self.build_scalar(value, scalar_style(*style), *anchor_id, tag.as_deref(), span)?
            }
            Event::MappingStart(anchor_id, tag) => {
                self.pos += 1;
                self.build_collection(true, *anchor_id, tag.as_deref(), span)?
            }
            Event::SequenceStart(anchor_id, tag) => {
                self.pos += 1;
                self.build_collection(false, *anchor_id, tag.as_deref(), span)?
            }
            Event::Alias(anchor_id) => {
                self.pos += 1;
                self.build_alias(*anchor_id, span)?
            }
            _ => return Ok(None),
        };
        Ok(Some(id))
    }

    fn build_scalar(
        &mut self,
        value: &str,
        style: ScalarStyle,
        anchor_id: usize,
        tag: Option<&Tag>,
        span: &Span,
    ) -> Result<NodeId, Error> {
        let anchor = self.anchor_name(anchor_id)?;
        let tag = tag.map(resolve_tag);

        if self.is_implicit_null(span, value, style) {
            let at = self.last_end;
            let scalar = Scalar {
                value: String::new(),
                style,
                tag,
                anchor,
            };
            return self.push(NodeKind::Scalar(scalar), at, at);
        }

        let (start, end) = match style {
            ScalarStyle::SingleQuoted => self.quoted_span(span, b'\''),
            ScalarStyle::DoubleQuoted => self.quoted_span(span, b'"'),
            ScalarStyle::Literal => (self.block_start(span, '|'), at(span.end)),
            ScalarStyle::Folded => (self.block_start(span, '>'), at(span.end)),
            ScalarStyle::Plain => (at(span.start), at(span.end)),
        };
        let scalar = Scalar {
            value: value.to_owned(),
            style,
            tag,
            anchor,
        };
        self.push(NodeKind::Scalar(scalar), start, end)
    }

    fn build_alias(&mut self, anchor_id: usize, span: &Span) -> Result<NodeId, Error> {
        let start = at(span.start);
        let token = self.source.rest_of_line(start);
        let name: String = token
            .strip_prefix('*')
            .unwrap_or("")
            .chars()
            .take_while(|c| is_anchor_char(*c))
            .collect();
        if name.is_empty() {
            let name = self
                .anchor_name(anchor_id)?
                .ok_or(Error::MissingAnchor { id: anchor_id })?;
            return self.push(NodeKind::Alias(name), start, at(span.end));
        }
        let end = Position::new(start.line, start.column + 1 + name.chars().count());
        self.push(NodeKind::Alias(name), start, end)
    }

    fn build_collection(
        &mut self,
        is_mapping: bool,
        anchor_id: usize,
        tag: Option<&Tag>,
        span: &Span,
    ) -> Result<NodeId, Error> {
        let (open, close) = if is_mapping { ('{', '}') } else { ('[', ']') };

        let opened_at = self.delimiter_at(at(span.start), open);
        let flow = opened_at.is_some() || self.in_flow_context > 0;
        let mut start = opened_at.unwrap_or_else(|| at(span.start));
        self.last_end = opened_at.map_or(start, |p| Position::new(p.line, p.column + 1));

        if flow {
            self.in_flow_context += 1;
        }
        let mut children = Vec::new();
        while let Some((event, _)) = self.peek() {
            if matches!(event, Event::MappingEnd | Event::SequenceEnd) {
                break;
            }
            match self.build_node()? {
                Some(child) => children.push(child),
                None => self.pos += 1,
            }
        }
        let end_span = self.advance().map(|(_, span)| *span);
        if flow {
            self.in_flow_context -= 1;
        }

        let last_child_end = children.last().map(|&c| self.tree.node(c).end);
        if let Some(&first) = children.first() {
            start = start.min(self.tree.node(first).start);
        }
        let end = match (opened_at, end_span) {
            (Some(open_pos), Some(end_span)) => self
                .close_after(end_span, close)
                .or_else(|| self.matching_close(open_pos))
                .unwrap_or_else(|| at(end_span.end)),
            _ => last_child_end.unwrap_or(start),
        };
        let end = last_child_end.map_or(end, |child_end| end.max(child_end));

        let collection = Collection {
            children,
            style: if flow {
                CollectionStyle::Flow
            } else {
                CollectionStyle::Block
            },
            tag: tag.map(resolve_tag),
            anchor: self.anchor_name(anchor_id)?,
        };
        let kind = if is_mapping {
            NodeKind::Mapping(collection)
        } else {
            NodeKind::Sequence(collection)
        };
        self.push(kind, start, end)
    }

    fn anchor_name(&self, id: usize) -> Result<Option<String>, Error> {
        if id == 0 {
            return Ok(None);
        }
        self.anchors
            .get(id - 1)
            .cloned()
            .map(Some)
            .ok_or(Error::MissingAnchor { id })
    }

    /// Empty plain scalars come through as `~`; only a `~` in the source is
    /// a real tilde.
    fn is_implicit_null(&self, span: &Span, value: &str, style: ScalarStyle) -> bool {
        if style != ScalarStyle::Plain || !(value == "~" || value.is_empty()) {
            return false;
        }
        span.is_empty() || !self.source.slice(at(span.start), at(span.end)).contains('~')
    }

    /// Position of `open` at `pos`, or after node properties on the same line.
    fn delimiter_at(&self, pos: Position, open: char) -> Option<Position> {
        let rest = self.source.rest_of_line(pos);
        let mut column = pos.column;
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == open {
                return Some(Position::new(pos.line, column));
            }
            if c == '&' || c == '!' {
                while chars.next_if(|c| !c.is_whitespace()).is_some() {
                    column += 1;
                }
            } else if !c.is_whitespace() {
                return None;
            }
            column += 1;
        }
        None
    }

    /// Position just past the closing delimiter the end event points at.
    fn close_after(&self, end_span: Span, close: char) -> Option<Position> {
        let pos = at(end_span.start);
        (self.source.char_at(pos) == Some(close)).then(|| Position::new(pos.line, pos.column + 1))
    }

    /// Bracket matching from an opening delimiter, skipping quoted text and
    /// comments.
    fn matching_close(&self, open: Position) -> Option<Position> {
        let text = self.source.text();
        let start = self.source.byte_offset(open);
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut in_comment = false;
        let mut prev = ' ';
        let mut chars = text[start..].char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if in_comment {
                in_comment = c != '\n';
            } else if let Some(q) = quote {
                if c == '\\' && q == '"' {
                    chars.next();
                } else if c == q {
                    if q == '\'' && chars.next_if(|&(_, n)| n == '\'').is_some() {
                        continue;
                    }
                    quote = None;
                }
            } else {
                match c {
                    '\'' | '"' if prev.is_whitespace() || matches!(prev, '[' | '{' | ',' | ':') => {
                        quote = Some(c);
                    }
                    '#' if prev.is_whitespace() => in_comment = true,
                    '[' | '{' => depth += 1,
                    ']' | '}' => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return Some(self.source.position_at(start + i + c.len_utf8()));
                        }
                    }
                    _ => {}
                }
            }
            prev = c;
        }
        None
    }

    /// Quoted scalars span their quotes.
    fn quoted_span(&self, span: &Span, quote: u8) -> (Position, Position) {
        let bytes = self.source.text().as_bytes();
        let from = self.source.byte_offset(at(span.start));
        let Some(open) = (from.saturating_sub(5)..=from)
            .rev()
            .find(|&i| bytes.get(i) == Some(&quote))
        else {
            return (at(span.start), at(span.end));
        };
        let mut i = open + 1;
        while i < bytes.len() {
            if quote == b'"' && bytes[i] == b'\\' {
                i += 2;
            } else if bytes[i] == quote {
                if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return (self.source.position_at(open), self.source.position_at(i + 1));
            } else {
                i += 1;
            }
        }
        (self.source.position_at(open), at(span.end))
    }

    /// Block scalars start at their `|` or `>` indicator.
    fn block_start(&self, span: &Span, indicator: char) -> Position {
        let start = at(span.start);
        if self.source.char_at(start) == Some(indicator) {
            return start;
        }
        let before = &self.source.text()[..self.source.byte_offset(start)];
        let mut search = before;
        while let Some(i) = search.rfind(indicator) {
            let header = before[i + 1..].lines().next().unwrap_or("").trim();
            let valid_after = header.is_empty()
                || header.starts_with(['+', '-', '#'])
                || header.starts_with(|c: char| c.is_ascii_digit());
            if valid_after {
                return self.source.position_at(i);
            }
            search = &before[..i];
        }
        start
    }
}

/// Anchor names in source order.
///
/// Events only carry numeric anchor ids, assigned in definition order, so the
/// `&name` tokens are read back from the text. Scalar and alias spans are
/// skipped, as are comments and directive lines.
fn scan_anchors(source: &SourceText<'_>, events: &[(Event<'_>, Span)]) -> Vec<String> {
    let skip: Vec<(usize, usize)> = events
        .iter()
        .filter(|(event, _)| matches!(event, Event::Scalar(..) | Event::Alias(_)))
        .map(|(_, span)| {
            (
                source.byte_offset(at(span.start)),
                source.byte_offset(at(span.end)),
            )
        })
        .filter(|(start, end)| start < end)
        .collect();

    let mut anchors = Vec::new();
    let mut next_skip = 0;
    let mut offset = 0;
    for line in source.text().split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line.trim_start().starts_with('%') {
            continue;
        }
        let mut prev: Option<char> = None;
        for (i, c) in line.char_indices() {
            let byte = line_start + i;
            while next_skip < skip.len() && skip[next_skip].1 <= byte {
                next_skip += 1;
            }
            let skipped = skip.get(next_skip).is_some_and(|&(start, _)| start <= byte);
            if !skipped {
                if c == '#' && prev.is_none_or(char::is_whitespace) {
                    break;
                }
                let starts_token =
                    prev.is_none_or(|p| p.is_whitespace() || matches!(p, '[' | '{' | ','));
                if c == '&' && starts_token {
                    let name: String = line[i + 1..]
                        .chars()
                        .take_while(|c| is_anchor_char(*c))
                        .collect();
                    if !name.is_empty() {
                        anchors.push(name);
                    }
                }
            }
            prev = Some(c);
        }
    }
    anchors
}
