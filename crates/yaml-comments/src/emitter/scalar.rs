use core::fmt::Write as _;

use crate::tree::{Scalar, ScalarStyle};

/// A scalar as it is written out.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Encoded {
    Inline(String),
    /// `header` is `|` or `>` with its indicators; `lines` are the body
    /// lines without indentation.
    Block { header: String, lines: Vec<String> },
}

/// Encode `scalar` in its own style if that style can hold the value,
/// falling back to plain, single-quoted, then double-quoted.
///
/// `indent` is the body indentation relative to the parent node, used as
/// the indentation indicator when the body starts with a space.
pub(super) fn encode(scalar: &Scalar, in_flow: bool, indent: usize) -> Encoded {
    let value = scalar.value.as_str();
    match scalar.style {
        ScalarStyle::Plain if value.is_empty() || is_plain_safe(value, in_flow) => {
            Encoded::Inline(value.to_owned())
        }
        ScalarStyle::Plain | ScalarStyle::SingleQuoted if is_single_quotable(value) => {
            Encoded::Inline(single_quoted(value))
        }
        ScalarStyle::Literal | ScalarStyle::Folded if !in_flow && is_block_safe(value) => {
            block(value, scalar.style == ScalarStyle::Folded, indent)
        }
        _ => Encoded::Inline(double_quoted(value)),
    }
}

fn is_indicator(c: char) -> bool {
    matches!(
        c,
        '-' | '?'
            | ':'
            | ','
            | '['
            | ']'
            | '{'
            | '}'
            | '#'
            | '&'
            | '*'
            | '!'
            | '|'
            | '>'
            | '\''
            | '"'
            | '%'
            | '@'
            | '`'
    )
}

fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

fn is_printable(c: char) -> bool {
    !c.is_control() && c != '\u{feff}'
}

fn is_plain_safe(value: &str, in_flow: bool) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if is_indicator(first) {
        let continues = chars
            .next()
            .is_some_and(|c| !c.is_whitespace() && !(in_flow && is_flow_indicator(c)));
        if !matches!(first, '-' | '?' | ':') || !continues {
            return false;
        }
    }
    if value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.ends_with(':')
        || value.starts_with("---")
        || value.starts_with("...")
    {
        return false;
    }
    if value.contains(": ") || value.contains(":\t") || value.contains(" #") || value.contains("\t#")
    {
        return false;
    }
    if in_flow && value.contains(is_flow_indicator) {
        return false;
    }
    value.chars().all(|c| c != '\t' && is_printable(c))
}

fn is_single_quotable(value: &str) -> bool {
    value.chars().all(|c| c == '\t' || is_printable(c))
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\u{1b}' => out.push_str("\\e"),
            '\u{85}' => out.push_str("\\N"),
            '\u{a0}' => out.push_str("\\_"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if is_printable(c) => out.push(c),
            c if u32::from(c) <= 0xff => {
                let _ = write!(out, "\\x{:02X}", u32::from(c));
            }
            c => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
        }
    }
    out.push('"');
    out
}

fn is_block_safe(value: &str) -> bool {
    value
        .chars()
        .all(|c| c == '\n' || c == '\t' || is_printable(c))
}

/// Lines starting with whitespace are never folded.
fn is_folding_line(line: &str) -> bool {
    !line.is_empty() && !line.starts_with([' ', '\t'])
}

fn block(value: &str, folded: bool, indent: usize) -> Encoded {
    let body = value.trim_end_matches('\n');
    let breaks = value.len() - body.len();
    let chomp = match breaks {
        0 => "-",
        1 if !body.is_empty() => "",
        _ => "+",
    };

    let mut lines: Vec<String> = if body.is_empty() {
        Vec::new()
    } else {
        body.split('\n').map(str::to_owned).collect()
    };
    if folded {
        lines = unfold(&lines);
    }
    let extra = if body.is_empty() {
        breaks
    } else {
        breaks.saturating_sub(1)
    };
    lines.extend(core::iter::repeat_n(String::new(), extra));

    let needs_indicator = lines
        .iter()
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with(' '));
    let indicator = if needs_indicator {
        indent.to_string()
    } else {
        String::new()
    };
    let style = if folded { '>' } else { '|' };
    Encoded::Block {
        header: format!("{style}{indicator}{chomp}"),
        lines,
    }
}

/// A line break between two folding lines reads back as a space, so it has
/// to be written as an extra empty line.
fn unfold(lines: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        out.push(line.clone());
        let next = lines[i + 1..].iter().find(|l| !l.is_empty());
        if is_folding_line(line) && next.is_some_and(|l| is_folding_line(l)) {
            out.push(String::new());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn inline(value: &str, style: ScalarStyle, in_flow: bool) -> String {
        match encode(&Scalar::new(value, style), in_flow, 2) {
            Encoded::Inline(text) => text,
            Encoded::Block { header, .. } => panic!("unexpected block scalar {header}"),
        }
    }

    fn block_of(value: &str, style: ScalarStyle) -> (String, Vec<String>) {
        match encode(&Scalar::new(value, style), false, 2) {
            Encoded::Block { header, lines } => (header, lines),
            Encoded::Inline(text) => panic!("unexpected inline scalar {text}"),
        }
    }

    #[test]
    fn plain_stays_plain_when_safe() {
        assert_eq!(inline("hello world", ScalarStyle::Plain, false), "hello world");
        assert_eq!(inline("-1", ScalarStyle::Plain, false), "-1");
        assert_eq!(inline("a,b", ScalarStyle::Plain, false), "a,b");
        assert_eq!(inline("", ScalarStyle::Plain, false), "");
    }

    #[test]
    fn unsafe_plain_is_quoted() {
        assert_eq!(inline("a: b", ScalarStyle::Plain, false), "'a: b'");
        assert_eq!(inline("- x", ScalarStyle::Plain, false), "'- x'");
        assert_eq!(inline("a,b", ScalarStyle::Plain, true), "'a,b'");
        assert_eq!(inline(" lead", ScalarStyle::Plain, false), "' lead'");
        assert_eq!(inline("x #y", ScalarStyle::Plain, false), "'x #y'");
        assert_eq!(inline("two\nlines", ScalarStyle::Plain, false), "\"two\\nlines\"");
    }

    #[test]
    fn quoted_styles_are_kept() {
        assert_eq!(inline("it's", ScalarStyle::SingleQuoted, false), "'it''s'");
        assert_eq!(inline("", ScalarStyle::SingleQuoted, false), "''");
        assert_eq!(
            inline("tab\there \"q\"", ScalarStyle::DoubleQuoted, false),
            "\"tab\\there \\\"q\\\"\""
        );
        assert_eq!(inline("\u{1}", ScalarStyle::DoubleQuoted, false), "\"\\x01\"");
    }

    #[test]
    fn block_styles_in_flow_become_double_quoted() {
        assert_eq!(inline("a\nb\n", ScalarStyle::Literal, true), "\"a\\nb\\n\"");
    }

    #[test]
    fn literal_chomping() {
        assert_eq!(block_of("a\nb", ScalarStyle::Literal), ("|-".into(), vec!["a".into(), "b".into()]));
        assert_eq!(block_of("a\n", ScalarStyle::Literal), ("|".into(), vec!["a".into()]));
        assert_eq!(
            block_of("a\n\n", ScalarStyle::Literal),
            ("|+".into(), vec!["a".into(), String::new()])
        );
        assert_eq!(block_of("\n", ScalarStyle::Literal), ("|+".into(), vec![String::new()]));
        assert_eq!(block_of("", ScalarStyle::Literal), ("|-".into(), vec![]));
    }

    #[test]
    fn leading_space_needs_an_indentation_indicator() {
        assert_eq!(
            block_of("  indented\nnot\n", ScalarStyle::Literal),
            ("|2".into(), vec!["  indented".into(), "not".into()])
        );
    }

    #[test]
    fn folded_lines_keep_their_breaks() {
        assert_eq!(
            block_of("one\ntwo\n\n  more\nthree\n", ScalarStyle::Folded),
            (
                ">".into(),
                vec![
                    "one".into(),
                    String::new(),
                    "two".into(),
                    String::new(),
                    "  more".into(),
                    "three".into()
                ]
            )
        );
    }
}
