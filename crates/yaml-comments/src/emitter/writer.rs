#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing written yet.
    Start,
    /// At the start of a line; the next write is indented.
    LineStart,
    /// A space is owed before the next write.
    WordEnd,
    InLine,
    /// Right after a `- ` or `? ` bullet, which stands in for indentation.
    PseudoIndent,
}

/// Output buffer that tracks where the cursor is on the current line.
pub(super) struct LineWriter {
    out: String,
    state: State,
    unit: usize,
}

impl LineWriter {
    pub fn new(unit: usize) -> Self {
        Self {
            out: String::new(),
            state: State::Start,
            unit,
        }
    }

    pub fn unit(&self) -> usize {
        self.unit
    }

    /// Append `text`, indenting to `depth` first if at the start of a line.
    ///
    /// Empty text writes nothing but cancels an owed space.
    pub fn write(&mut self, depth: usize, text: &str) {
        if text.is_empty() {
            if self.state == State::WordEnd {
                self.state = State::InLine;
            }
            return;
        }
        match self.state {
            State::WordEnd => self.out.push(' '),
            State::LineStart => self.pad(self.unit * depth),
            State::Start | State::InLine | State::PseudoIndent => {}
        }
        self.out.push_str(text);
        self.state = State::InLine;
    }

    /// Owe a single space before the next write.
    pub fn space(&mut self) {
        if self.state == State::InLine {
            self.state = State::WordEnd;
        }
    }

    pub fn newline(&mut self) {
        if matches!(
            self.state,
            State::Start | State::LineStart | State::PseudoIndent
        ) {
            return;
        }
        self.out.push('\n');
        self.state = State::LineStart;
    }

    /// Write `marker` padded to one indent unit, e.g. `- `.
    pub fn bullet(&mut self, depth: usize, marker: &str) {
        self.write(depth, marker);
        self.pad(self.unit.saturating_sub(marker.chars().count()).max(1));
        self.state = State::PseudoIndent;
    }

    /// Drop the padding of a bullet that was followed by nothing.
    pub fn close_bullet(&mut self) {
        if self.state == State::PseudoIndent {
            let trimmed = self.out.trim_end_matches(' ').len();
            self.out.truncate(trimmed);
            self.state = State::InLine;
        }
    }

    /// Body lines of a block scalar, one indent unit deeper than `depth`.
    /// Empty lines stay empty.
    pub fn block_lines(&mut self, depth: usize, lines: &[String]) {
        let width = self.unit * (depth + 1);
        for line in lines {
            self.out.push('\n');
            if !line.is_empty() {
                self.pad(width);
                self.out.push_str(line);
            }
        }
        self.state = State::InLine;
    }

    /// The rendered text, ending with a line break unless empty.
    pub fn finish(mut self) -> String {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    fn pad(&mut self, width: usize) {
        self.out.extend(core::iter::repeat_n(' ', width));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_at_line_start_only() {
        let mut w = LineWriter::new(2);
        w.write(0, "a:");
        w.newline();
        w.write(1, "b:");
        w.space();
        w.write(1, "c");
        assert_eq!(w.finish(), "a:\n  b: c\n");
    }

    #[test]
    fn newline_is_idempotent() {
        let mut w = LineWriter::new(2);
        w.newline();
        w.write(0, "a");
        w.newline();
        w.newline();
        w.write(0, "b");
        assert_eq!(w.finish(), "a\nb\n");
    }

    #[test]
    fn bullet_absorbs_indentation() {
        let mut w = LineWriter::new(2);
        w.bullet(0, "-");
        w.newline();
        w.write(1, "a: 1");
        w.newline();
        w.write(1, "b: 2");
        assert_eq!(w.finish(), "- a: 1\n  b: 2\n");
    }

    #[test]
    fn bullets_pad_to_the_indent_unit() {
        let mut w = LineWriter::new(4);
        w.bullet(0, "-");
        w.write(1, "x");
        assert_eq!(w.finish(), "-   x\n");
    }

    #[test]
    fn empty_bullet_loses_its_padding() {
        let mut w = LineWriter::new(2);
        w.bullet(0, "-");
        w.write(1, "");
        w.close_bullet();
        w.newline();
        assert_eq!(w.finish(), "-\n");
    }

    #[test]
    fn empty_write_cancels_owed_space() {
        let mut w = LineWriter::new(2);
        w.write(0, "key:");
        w.space();
        w.write(0, "");
        w.newline();
        assert_eq!(w.finish(), "key:\n");
    }

    #[test]
    fn block_lines_leave_blank_lines_unindented() {
        let mut w = LineWriter::new(2);
        w.write(0, "k: |");
        w.block_lines(0, &["a".to_owned(), String::new(), "b".to_owned()]);
        assert_eq!(w.finish(), "k: |\n  a\n\n  b\n");
    }
}
