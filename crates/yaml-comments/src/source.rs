use crate::tree::Position;

/// Line-oriented view of a source text addressed by [`Position`].
///
/// Lines keep their line breaks, so concatenating them yields the text.
pub(crate) struct SourceText<'a> {
    text: &'a str,
    lines: Vec<&'a str>,
    /// Byte offset of the first character of each line.
    starts: Vec<usize>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut starts = Vec::with_capacity(lines.len());
        let mut offset = 0;
        for line in &lines {
            starts.push(offset);
            offset += line.len();
        }
        Self {
            text,
            lines,
            starts,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line `index` including its line break, or `""` past the end.
    pub fn line(&self, index: usize) -> &'a str {
        self.lines.get(index).copied().unwrap_or("")
    }

    /// Line `index` without its line break.
    pub fn line_content(&self, index: usize) -> &'a str {
        let line = self.line(index);
        let line = line.strip_suffix('\n').unwrap_or(line);
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// Position just past the last character.
    pub fn end(&self) -> Position {
        match self.lines.last() {
            None => Position::new(0, 0),
            Some(last) if last.ends_with('\n') => Position::new(self.lines.len(), 0),
            Some(last) => Position::new(self.lines.len() - 1, last.chars().count()),
        }
    }

    /// Whether `pos` addresses a character of the text or the end of a line.
    pub fn contains(&self, pos: Position) -> bool {
        if pos.line < self.lines.len() {
            pos.column <= self.lines[pos.line].chars().count()
        } else {
            pos == self.end()
        }
    }

    pub fn char_at(&self, pos: Position) -> Option<char> {
        self.line(pos.line).chars().nth(pos.column)
    }

    /// Byte offset of `pos`, clamped to the text.
    pub fn byte_offset(&self, pos: Position) -> usize {
        let Some(&start) = self.starts.get(pos.line) else {
            return self.text.len();
        };
        let line = self.lines[pos.line];
        start
            + line
                .char_indices()
                .nth(pos.column)
                .map_or(line.len(), |(b, _)| b)
    }

    /// Position of byte offset `byte`, clamped to the text.
    pub fn position_at(&self, byte: usize) -> Position {
        let byte = byte.min(self.text.len());
        let line = self.starts.partition_point(|&s| s <= byte).saturating_sub(1);
        let Some(&start) = self.starts.get(line) else {
            return self.end();
        };
        if line + 1 == self.lines.len() && byte == self.text.len() {
            return self.end();
        }
        let column = self.text[start..byte].chars().count();
        Position::new(line, column)
    }

    /// Text from `from` (inclusive) to `to` (exclusive).
    ///
    /// A backwards range is empty. Columns past the end of a line are
    /// clamped to the line.
    pub fn slice(&self, from: Position, to: Position) -> &'a str {
        if to <= from {
            return "";
        }
        let start = self.byte_offset(from);
        let end = self.byte_offset(to);
        if end <= start {
            return "";
        }
        &self.text[start..end]
    }

    /// Text from `from` to the end of its line, without the line break.
    pub fn rest_of_line(&self, from: Position) -> &'a str {
        let content = self.line_content(from.line);
        content
            .char_indices()
            .nth(from.column)
            .map_or("", |(b, _)| &content[b..])
    }

    /// Byte offset of the first line at or after `from` that starts with
    /// `marker` followed by whitespace or the end of the line.
    pub fn find_marker_line(&self, from: usize, marker: &str) -> Option<usize> {
        let first = self.position_at(from).line;
        (first..self.lines.len())
            .filter(|&i| self.starts[i] >= from)
            .find(|&i| is_marker_line(self.lines[i], marker))
            .map(|i| self.starts[i])
    }
}

/// Whether `line` is a document marker line such as `--- !tag` or `... # end`.
pub(crate) fn is_marker_line(line: &str, marker: &str) -> bool {
    line.strip_prefix(marker)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Byte offset of the first comment `#` in `line`.
///
/// A `#` starts a comment only at the start of the line or after whitespace.
/// Quote state is tracked so `#` inside quoted text is skipped.
pub(crate) fn comment_start(line: &str) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev = None;
    for (i, ch) in line.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single && prev != Some('\\') => in_double = !in_double,
            '#' if !in_single && !in_double && prev.is_none_or(char::is_whitespace) => {
                return Some(i);
            }
            _ => {}
        }
        prev = Some(ch);
    }
    None
}
