//! Reconstructing clipboard text from rendered lines.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::indent::IndentConfig;

/// A run of digits plus one whitespace character at the start of any line.
static LINE_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^[0-9]+\s").ok());

/// One line wrapper as the browser shows it: its text plus computed indentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedLine {
    pub text: String,
    /// Computed `text-indent`, e.g. `"0px"`.
    pub text_indent: String,
    /// Computed `margin-left`, e.g. `"48px"`.
    pub margin_left: String,
}

impl RenderedLine {
    pub fn new(
        text: impl Into<String>,
        text_indent: impl Into<String>,
        margin_left: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            text_indent: text_indent.into(),
            margin_left: margin_left.into(),
        }
    }

    /// A line without indentation styles.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, "", "")
    }
}

/// Remove a leading line-number prefix from every line of `text`.
///
/// ```
/// use codeblock::strip_line_numbers;
///
/// assert_eq!(strip_line_numbers("12 let x = 1;"), "let x = 1;");
/// assert_eq!(strip_line_numbers("let x = 12 + 1;"), "let x = 12 + 1;");
/// ```
pub fn strip_line_numbers(text: &str) -> Cow<'_, str> {
    match LINE_NUMBER.as_ref() {
        Some(re) => re.replace_all(text, ""),
        None => Cow::Borrowed(text),
    }
}

/// Build the clipboard form of one line, or `None` if it is blank.
///
/// Line numbers are stripped and trailing whitespace trimmed. A line that is
/// left with nothing but whitespace and `placeholder` characters is dropped.
/// When the computed indentation yields at least one tab, the tabs replace the
/// line's own leading whitespace; otherwise the text is kept as it is.
pub fn copy_line(line: &RenderedLine, indent: &IndentConfig, placeholder: &str) -> Option<String> {
    let stripped = strip_line_numbers(&line.text);
    let trimmed = stripped.trim_end();

    if trimmed
        .chars()
        .all(|c| c.is_whitespace() || placeholder.contains(c))
    {
        return None;
    }

    let tabs = indent.tab_count(&line.text_indent, &line.margin_left);
    if tabs == 0 {
        return Some(trimmed.to_string());
    }

    let body = trimmed.trim_start();
    let mut out = String::with_capacity(tabs + body.len());
    out.extend(std::iter::repeat_n('\t', tabs));
    out.push_str(body);
    Some(out)
}

/// Join the clipboard form of all non-blank lines with `\n`.
pub fn copy_text(lines: &[RenderedLine], indent: &IndentConfig, placeholder: &str) -> String {
    lines
        .iter()
        .filter_map(|line| copy_line(line, indent, placeholder))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZWSP: &str = "\u{200b}";

    #[test]
    fn test_strip_line_numbers_per_line() {
        assert_eq!(strip_line_numbers("1 a\n22\tb\nc 3 d"), "a\nb\nc 3 d");
        assert_eq!(strip_line_numbers("42"), "42");
        assert!(matches!(strip_line_numbers("no digits"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_indentation_replaces_leading_spaces() {
        let indent = IndentConfig::default();
        let lines = [
            RenderedLine::new("  if x:", "0px", "0px"),
            RenderedLine::new("    return 1", "0px", "48px"),
        ];
        assert_eq!(copy_text(&lines, &indent, ZWSP), "  if x:\n\treturn 1");
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let indent = IndentConfig::default();
        let lines = [
            RenderedLine::plain("a"),
            RenderedLine::plain(ZWSP),
            RenderedLine::plain("   "),
            RenderedLine::plain("7 "),
            RenderedLine::plain("b   "),
        ];
        assert_eq!(copy_text(&lines, &indent, ZWSP), "a\nb");
    }

    #[test]
    fn test_number_prefix_and_trailing_trim() {
        let indent = IndentConfig::default();
        let line = RenderedLine::new("10 total += 1  ", "36px", "36px");
        // 72px at 0.75 pt/px is 54pt, rounding to 2 tabs
        assert_eq!(
            copy_line(&line, &indent, ZWSP),
            Some("\t\ttotal += 1".to_string())
        );
    }

    #[test]
    fn test_no_lines_copies_empty_string() {
        assert_eq!(copy_text(&[], &IndentConfig::default(), ZWSP), "");
    }

    #[test]
    fn test_empty_placeholder_setting() {
        let indent = IndentConfig::default();
        assert_eq!(copy_line(&RenderedLine::plain("x"), &indent, ""), Some("x".into()));
        assert_eq!(copy_line(&RenderedLine::plain(" "), &indent, ""), None);
    }
}
