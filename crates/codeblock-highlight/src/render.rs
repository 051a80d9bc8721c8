//! HTML rendering from highlight spans.
//!
//! This module converts raw spans from grammars into HTML with proper
//! handling of overlapping spans (deduplication) and span coalescing.
//!
//! # Flat runs
//!
//! Spans are first flattened into a sequence of non-overlapping runs, each
//! carrying at most one tag (the innermost span wins). Because no element is
//! ever nested inside another, the output can be cut at any newline and every
//! piece is still balanced HTML. [`spans_to_html_lines`] relies on this: it
//! closes the open tag before each `\n` and reopens it on the next line.

use crate::{HtmlFormat, Span};
use codeblock_theme::{tag_for_capture, tag_to_name};
use std::collections::HashMap;
use std::io::{self, Write};
use std::ops::Range;

/// Generate opening and closing HTML tags based on the configured format.
///
/// Returns (opening_tag, closing_tag) for the given short tag and format.
fn make_html_tags(short_tag: &str, format: &HtmlFormat) -> (String, String) {
    match format {
        HtmlFormat::CustomElements => (format!("<a-{short_tag}>"), format!("</a-{short_tag}>")),
        HtmlFormat::CustomElementsWithPrefix(prefix) => (
            format!("<{prefix}-{short_tag}>"),
            format!("</{prefix}-{short_tag}>"),
        ),
        HtmlFormat::ClassNames => match tag_to_name(short_tag) {
            Some(name) => (format!("<span class=\"{name}\">"), "</span>".to_string()),
            None => ("<span>".to_string(), "</span>".to_string()),
        },
        HtmlFormat::ClassNamesWithPrefix(prefix) => match tag_to_name(short_tag) {
            Some(name) => (
                format!("<span class=\"{prefix}-{name}\">"),
                "</span>".to_string(),
            ),
            None => ("<span>".to_string(), "</span>".to_string()),
        },
    }
}

/// A normalized span with theme slot tag.
#[derive(Debug, Clone)]
struct NormalizedSpan {
    start: u32,
    end: u32,
    tag: &'static str,
}

/// A stretch of source text rendered under at most one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    range: Range<usize>,
    tag: Option<&'static str>,
}

/// Normalize spans: map captures to theme slots and merge adjacent spans with same tag.
fn normalize_and_coalesce(spans: Vec<Span>) -> Vec<NormalizedSpan> {
    let mut normalized: Vec<NormalizedSpan> = spans
        .into_iter()
        .filter(|span| span.start < span.end)
        .filter_map(|span| {
            tag_for_capture(&span.capture).map(|tag| NormalizedSpan {
                start: span.start,
                end: span.end,
                tag,
            })
        })
        .collect();

    normalized.sort_by_key(|s| (s.start, s.end));

    let mut coalesced: Vec<NormalizedSpan> = Vec::with_capacity(normalized.len());
    for span in normalized {
        if let Some(last) = coalesced.last_mut()
            && span.tag == last.tag
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        coalesced.push(span);
    }

    coalesced
}

/// Deduplicate spans covering the exact same range.
///
/// Styled spans beat unstyled ones; among equals the later span wins.
fn dedupe(spans: Vec<Span>) -> Vec<Span> {
    let mut deduped: HashMap<(u32, u32), Span> = HashMap::new();
    for span in spans {
        let key = (span.start, span.end);
        let new_has_styling = tag_for_capture(&span.capture).is_some();
        let keep_existing = !new_has_styling
            && deduped
                .get(&key)
                .is_some_and(|existing| tag_for_capture(&existing.capture).is_some());
        if !keep_existing {
            deduped.insert(key, span);
        }
    }
    deduped.into_values().collect()
}

/// Flatten possibly-overlapping spans into non-overlapping runs covering all of `source`.
fn flatten(source: &str, spans: Vec<Span>) -> Vec<Run> {
    let len = source.len();
    let spans = normalize_and_coalesce(dedupe(spans));

    if spans.is_empty() {
        return if len == 0 {
            Vec::new()
        } else {
            vec![Run {
                range: 0..len,
                tag: None,
            }]
        };
    }

    // (pos, is_start, span_index); ends sort before starts at the same position
    let mut events: Vec<(usize, bool, usize)> = Vec::with_capacity(spans.len() * 2);
    for (i, span) in spans.iter().enumerate() {
        events.push((span.start as usize, true, i));
        events.push((span.end as usize, false, i));
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut runs: Vec<Run> = Vec::new();
    let mut last_pos = 0usize;
    let mut stack: Vec<usize> = Vec::new();

    for (pos, is_start, span_idx) in events {
        let pos = pos.min(len);
        if pos > last_pos && source.is_char_boundary(pos) {
            runs.push(Run {
                range: last_pos..pos,
                tag: stack.last().map(|&top| spans[top].tag),
            });
            last_pos = pos;
        }

        if is_start {
            stack.push(span_idx);
        } else if let Some(idx) = stack.iter().rposition(|&x| x == span_idx) {
            stack.remove(idx);
        }
    }

    if last_pos < len {
        runs.push(Run {
            range: last_pos..len,
            tag: stack.last().map(|&top| spans[top].tag),
        });
    }

    runs
}

fn push_run(out: &mut String, text: &str, tag: Option<&'static str>, format: &HtmlFormat) {
    if text.is_empty() {
        return;
    }
    match tag {
        Some(tag) => {
            let (open, close) = make_html_tags(tag, format);
            out.push_str(&open);
            out.push_str(&html_escape(text));
            out.push_str(&close);
        }
        None => out.push_str(&html_escape(text)),
    }
}

/// Deduplicate spans and convert to HTML.
///
/// Trailing newlines are trimmed from the source to avoid extra whitespace
/// when the output is embedded in `<pre><code>` tags.
pub fn spans_to_html(source: &str, spans: Vec<Span>, format: &HtmlFormat) -> String {
    let source = source.trim_end_matches('\n');

    let mut html = String::with_capacity(source.len() * 2);
    for run in flatten(source, spans) {
        push_run(&mut html, &source[run.range], run.tag, format);
    }
    html
}

/// Convert spans to one balanced HTML fragment per source line.
///
/// The result always has exactly `source.split('\n').count()` entries, including
/// empty strings for blank lines and for a trailing newline.
pub fn spans_to_html_lines(source: &str, spans: Vec<Span>, format: &HtmlFormat) -> Vec<String> {
    let mut lines = vec![String::new()];

    for run in flatten(source, spans) {
        let text = &source[run.range];
        for (i, piece) in text.split('\n').enumerate() {
            if i > 0 {
                lines.push(String::new());
            }
            if let Some(current) = lines.last_mut() {
                push_run(current, piece, run.tag, format);
            }
        }
    }

    lines
}

/// Write spans as HTML to a writer.
pub fn write_spans_as_html<W: Write>(
    w: &mut W,
    source: &str,
    spans: Vec<Span>,
    format: &HtmlFormat,
) -> io::Result<()> {
    let html = spans_to_html(source, spans, format);
    w.write_all(html.as_bytes())
}

/// Escape HTML special characters.
pub fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Decode the character references that show up in exported code text.
///
/// Handles the five XML entities, `&nbsp;`, and decimal/hex numeric
/// references. Anything else is left untouched.
pub fn html_unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                        None => num.parse::<u32>().ok()?,
                    };
                    char::from_u32(code)
                }),
            }?;
            Some((ch, semi + 1))
        });

        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32, capture: &str) -> Span {
        Span {
            start,
            end,
            capture: capture.into(),
        }
    }

    #[test]
    fn test_simple_highlight() {
        let spans = vec![span(0, 2, "keyword"), span(3, 7, "function")];
        let html = spans_to_html("fn main", spans, &HtmlFormat::CustomElements);
        assert_eq!(html, "<a-k>fn</a-k> <a-f>main</a-f>");
    }

    #[test]
    fn test_keyword_variants_coalesce() {
        let spans = vec![span(0, 3, "keyword"), span(3, 7, "keyword.control")];
        let html = spans_to_html("keyword", spans, &HtmlFormat::CustomElements);
        assert_eq!(html, "<a-k>keyword</a-k>");
    }

    #[test]
    fn test_overlapping_spans_innermost_wins() {
        // string containing an escape-highlighted region mapped to a different slot
        let spans = vec![span(0, 6, "string"), span(2, 4, "number")];
        let html = spans_to_html("\"a12b\"", spans, &HtmlFormat::CustomElements);
        assert_eq!(html, "<a-s>&quot;a</a-s><a-n>12</a-n><a-s>b&quot;</a-s>");
    }

    #[test]
    fn test_unstyled_duplicate_does_not_replace_styled() {
        let spans = vec![span(0, 4, "comment"), span(0, 4, "spell")];
        let html = spans_to_html("# hi", spans, &HtmlFormat::CustomElements);
        assert_eq!(html, "<a-c># hi</a-c>");
    }

    #[test]
    fn test_class_name_formats() {
        let spans = vec![span(0, 2, "keyword")];
        let html = spans_to_html("fn", spans.clone(), &HtmlFormat::ClassNames);
        assert_eq!(html, "<span class=\"keyword\">fn</span>");
        let html = spans_to_html(
            "fn",
            spans,
            &HtmlFormat::ClassNamesWithPrefix("hljs".to_string()),
        );
        assert_eq!(html, "<span class=\"hljs-keyword\">fn</span>");
    }

    #[test]
    fn test_custom_prefix() {
        let spans = vec![span(0, 2, "keyword")];
        let html = spans_to_html(
            "fn",
            spans,
            &HtmlFormat::CustomElementsWithPrefix("code".to_string()),
        );
        assert_eq!(html, "<code-k>fn</code-k>");
    }

    #[test]
    fn test_trailing_newlines_trimmed() {
        let html = spans_to_html("x\n\n", vec![], &HtmlFormat::CustomElements);
        assert_eq!(html, "x");
    }

    #[test]
    fn test_lines_split_multiline_span() {
        let source = "/* a\nb */ x";
        let spans = vec![span(0, 9, "comment")];
        let lines = spans_to_html_lines(source, spans, &HtmlFormat::CustomElements);
        assert_eq!(lines, vec!["<a-c>/* a</a-c>", "<a-c>b */</a-c> x"]);
    }

    #[test]
    fn test_lines_preserve_blank_and_trailing_lines() {
        let lines = spans_to_html_lines("a\n\nb\n", vec![], &HtmlFormat::CustomElements);
        assert_eq!(lines, vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_lines_of_empty_source() {
        let lines = spans_to_html_lines("", vec![], &HtmlFormat::CustomElements);
        assert_eq!(lines, vec![String::new()]);
    }

    #[test]
    fn test_out_of_range_spans_are_clamped() {
        let spans = vec![span(0, 40, "string")];
        let html = spans_to_html("'ok'", spans, &HtmlFormat::CustomElements);
        assert_eq!(html, "<a-s>&#39;ok&#39;</a-s>");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }

    #[test]
    fn test_html_unescape() {
        assert_eq!(html_unescape("a &lt;b&gt; &amp;&amp; c"), "a <b> && c");
        assert_eq!(html_unescape("&#65;&#x42;&nbsp;"), "AB\u{a0}");
        assert_eq!(html_unescape("fish & chips"), "fish & chips");
        assert_eq!(html_unescape("&bogus; &"), "&bogus; &");
    }
}
