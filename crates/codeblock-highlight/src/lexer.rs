//! Configurable lexical grammar.
//!
//! A [`LexicalGrammar`] scans the whole text once and recognizes the patterns
//! most languages share: line and block comments, quoted strings (optionally
//! spanning lines), numbers, sigil variables, attributes/decorators,
//! preprocessor directives and keyword classes. While scanning it accumulates a
//! relevance score that auto-detection uses to rank grammars against each other.

use crate::{Grammar, ParseResult, Span};

const KEYWORD_WEIGHT: i32 = 2;
const CONTROL_WEIGHT: i32 = 2;
const TYPE_WEIGHT: i32 = 1;
const BUILTIN_WEIGHT: i32 = 1;
const COMMENT_WEIGHT: i32 = 1;
const HINT_WEIGHT: i32 = 3;
const ILLEGAL_WEIGHT: i32 = 2;

/// Configuration for a [`LexicalGrammar`].
///
/// Word lists are matched whole-word. With `case_insensitive` the lists must be
/// written in lowercase.
#[derive(Debug)]
pub struct LexicalConfig {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub keywords: &'static [&'static str],
    pub control_keywords: &'static [&'static str],
    pub types: &'static [&'static str],
    pub builtins: &'static [&'static str],
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    /// String delimiters, longest first.
    pub strings: &'static [&'static str],
    /// Delimiters from `strings` whose literals may span lines.
    pub multiline_strings: &'static [&'static str],
    /// `$name` / `${name}` variables.
    pub variable_sigil: Option<u8>,
    /// `@decorator`, `#[attr]`.
    pub attribute_prefix: Option<u8>,
    /// Directive running to end of line when it opens a line (`#include`).
    pub directive_prefix: Option<u8>,
    /// Bytes allowed inside identifiers besides ASCII alphanumerics and `_`.
    pub ident_extra: &'static [u8],
    pub case_insensitive: bool,
    /// Capitalized identifiers are types.
    pub capitalized_types: bool,
    /// Identifiers directly followed by `:` are properties.
    pub colon_properties: bool,
    /// Substrings that strongly suggest this language.
    pub hints: &'static [&'static str],
    /// Substrings that cannot appear in this language.
    pub illegal: &'static [&'static str],
}

impl LexicalConfig {
    /// An empty configuration to build on with struct update syntax.
    pub const BASE: LexicalConfig = LexicalConfig {
        name: "",
        aliases: &[],
        keywords: &[],
        control_keywords: &[],
        types: &[],
        builtins: &[],
        line_comments: &[],
        block_comment: None,
        strings: &["\"", "'"],
        multiline_strings: &[],
        variable_sigil: None,
        attribute_prefix: None,
        directive_prefix: None,
        ident_extra: &[],
        case_insensitive: false,
        capitalized_types: false,
        colon_properties: false,
        hints: &[],
        illegal: &[],
    };
}

/// A grammar driven entirely by a [`LexicalConfig`].
#[derive(Debug, Clone, Copy)]
pub struct LexicalGrammar {
    config: &'static LexicalConfig,
}

impl LexicalGrammar {
    pub const fn new(config: &'static LexicalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'static LexicalConfig {
        self.config
    }

    fn is_ident_start(&self, b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_'
    }

    fn is_ident_char(&self, b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || self.config.ident_extra.contains(&b)
    }

    fn scan_word(&self, bytes: &[u8], pos: usize) -> usize {
        let mut end = pos;
        while end < bytes.len() && self.is_ident_char(bytes[end]) {
            end += 1;
        }
        end
    }

    /// Classify a word against the configured lists.
    fn classify(&self, word: &str) -> Option<(&'static str, i32)> {
        let cfg = self.config;
        let lowered;
        let word = if cfg.case_insensitive {
            lowered = word.to_ascii_lowercase();
            lowered.as_str()
        } else {
            word
        };

        if cfg.keywords.contains(&word) {
            Some(("keyword", KEYWORD_WEIGHT))
        } else if cfg.control_keywords.contains(&word) {
            Some(("keyword.control", CONTROL_WEIGHT))
        } else if cfg.types.contains(&word) {
            Some(("type.builtin", TYPE_WEIGHT))
        } else if cfg.builtins.contains(&word) {
            Some(("constant.builtin", BUILTIN_WEIGHT))
        } else {
            None
        }
    }
}

fn line_end(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |i| pos + i)
}

fn next_non_blank(bytes: &[u8], pos: usize) -> Option<u8> {
    bytes[pos..]
        .iter()
        .copied()
        .find(|b| *b != b' ' && *b != b'\t')
}

/// Scan a string literal opened by `delim` at `pos`. Returns the end offset.
///
/// Single-line literals stop (unclosed) at the newline.
fn scan_string(bytes: &[u8], pos: usize, delim: &str, multiline: bool) -> usize {
    let delim = delim.as_bytes();
    let mut i = pos + delim.len();
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i = (i + 2).min(bytes.len());
            continue;
        }
        if !multiline && bytes[i] == b'\n' {
            return i;
        }
        if bytes[i..].starts_with(delim) {
            return i + delim.len();
        }
        i += 1;
    }
    bytes.len()
}

/// Scan a number starting at `pos`.
fn scan_number(bytes: &[u8], pos: usize) -> usize {
    let mut end = pos;
    if end + 1 < bytes.len() && bytes[end] == b'0' && (bytes[end + 1] | 0x20) == b'x' {
        end += 2;
        while end < bytes.len() && (bytes[end].is_ascii_hexdigit() || bytes[end] == b'_') {
            end += 1;
        }
        return end;
    }
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'_') {
        end += 1;
    }
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] | 0x20) == b'e' {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            end = exp;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
    }
    // Type suffix (u32, f64, L, px)
    while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
        end += 1;
    }
    end
}

fn is_operator_byte(b: u8) -> bool {
    matches!(
        b,
        b'+' | b'-' | b'*' | b'/' | b'%' | b'=' | b'!' | b'<' | b'>' | b'&' | b'|' | b'^' | b'~'
            | b'?'
    )
}

impl Grammar for LexicalGrammar {
    fn name(&self) -> &'static str {
        self.config.name
    }

    fn parse(&mut self, text: &str) -> ParseResult {
        let cfg = self.config;
        let bytes = text.as_bytes();
        let mut spans = Vec::new();
        let mut relevance = 0i32;
        let mut pos = 0usize;
        let mut at_line_start = true;

        while pos < bytes.len() {
            let ch = bytes[pos];

            if ch == b'\n' {
                at_line_start = true;
                pos += 1;
                continue;
            }
            if ch.is_ascii_whitespace() {
                pos += 1;
                continue;
            }
            let line_start = std::mem::replace(&mut at_line_start, false);
            let rest = &bytes[pos..];

            if line_start && cfg.directive_prefix == Some(ch) {
                let end = line_end(bytes, pos);
                spans.push(Span::new(pos, end, "preproc"));
                relevance += KEYWORD_WEIGHT;
                pos = end;
                continue;
            }

            if cfg
                .line_comments
                .iter()
                .any(|prefix| rest.starts_with(prefix.as_bytes()))
            {
                let end = line_end(bytes, pos);
                spans.push(Span::new(pos, end, "comment"));
                relevance += COMMENT_WEIGHT;
                pos = end;
                continue;
            }

            if let Some((open, close)) = cfg.block_comment
                && rest.starts_with(open.as_bytes())
            {
                let body = pos + open.len();
                let end = text
                    .get(body..)
                    .and_then(|tail| tail.find(close))
                    .map_or(bytes.len(), |i| body + i + close.len());
                spans.push(Span::new(pos, end, "comment"));
                relevance += COMMENT_WEIGHT;
                pos = end;
                continue;
            }

            if let Some(delim) = cfg
                .strings
                .iter()
                .find(|delim| rest.starts_with(delim.as_bytes()))
            {
                let multiline = cfg.multiline_strings.contains(delim);
                let end = scan_string(bytes, pos, delim, multiline);
                spans.push(Span::new(pos, end, "string"));
                pos = end;
                continue;
            }

            if ch.is_ascii_digit()
                || (ch == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
            {
                let end = scan_number(bytes, pos);
                spans.push(Span::new(pos, end, "number"));
                pos = end;
                continue;
            }

            if cfg.variable_sigil == Some(ch) {
                let end = match bytes.get(pos + 1) {
                    Some(b'{') => bytes[pos..]
                        .iter()
                        .position(|&b| b == b'}' || b == b'\n')
                        .map_or(bytes.len(), |i| {
                            if bytes[pos + i] == b'}' { pos + i + 1 } else { pos + i }
                        }),
                    Some(&b) if self.is_ident_start(b) => self.scan_word(bytes, pos + 1),
                    _ => pos,
                };
                if end > pos {
                    spans.push(Span::new(pos, end, "variable"));
                    pos = end;
                    continue;
                }
            }

            if cfg.attribute_prefix == Some(ch) {
                let bracket = match bytes.get(pos + 1) {
                    Some(b'[') => Some(pos + 1),
                    Some(b'!') if bytes.get(pos + 2) == Some(&b'[') => Some(pos + 2),
                    _ => None,
                };
                let end = match bracket {
                    Some(open) => {
                        let stop = line_end(bytes, open);
                        bytes[open..stop]
                            .iter()
                            .position(|&b| b == b']')
                            .map_or(stop, |i| open + i + 1)
                    }
                    None => match bytes.get(pos + 1) {
                        Some(&b) if self.is_ident_start(b) => {
                            let mut end = self.scan_word(bytes, pos + 1);
                            while end + 1 < bytes.len()
                                && bytes[end] == b'.'
                                && self.is_ident_start(bytes[end + 1])
                            {
                                end = self.scan_word(bytes, end + 1);
                            }
                            end
                        }
                        _ => pos,
                    },
                };
                if end > pos {
                    spans.push(Span::new(pos, end, "attribute"));
                    pos = end;
                    continue;
                }
            }

            if self.is_ident_start(ch) {
                let end = self.scan_word(bytes, pos);
                let word = &text[pos..end];
                if let Some((capture, weight)) = self.classify(word) {
                    spans.push(Span::new(pos, end, capture));
                    relevance += weight;
                } else {
                    match next_non_blank(bytes, end) {
                        Some(b'(') => spans.push(Span::new(pos, end, "function")),
                        Some(b':') if cfg.colon_properties => {
                            spans.push(Span::new(pos, end, "property"))
                        }
                        _ if cfg.capitalized_types
                            && word.starts_with(|c: char| c.is_ascii_uppercase())
                            && word.contains(|c: char| c.is_ascii_lowercase()) =>
                        {
                            spans.push(Span::new(pos, end, "type"))
                        }
                        _ => {}
                    }
                }
                pos = end;
                continue;
            }

            if is_operator_byte(ch) {
                let start = pos;
                while pos < bytes.len() && is_operator_byte(bytes[pos]) {
                    pos += 1;
                }
                spans.push(Span::new(start, pos, "operator"));
                continue;
            }

            pos += text
                .get(pos..)
                .and_then(|tail| tail.chars().next())
                .map_or(1, char::len_utf8);
        }

        relevance += cfg
            .hints
            .iter()
            .filter(|hint| text.contains(**hint))
            .count() as i32
            * HINT_WEIGHT;
        relevance -= cfg
            .illegal
            .iter()
            .filter(|illegal| text.contains(**illegal))
            .count() as i32
            * ILLEGAL_WEIGHT;

        ParseResult { spans, relevance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TOY: LexicalConfig = LexicalConfig {
        name: "toy",
        keywords: &["let", "fn"],
        control_keywords: &["if", "return"],
        types: &["int"],
        builtins: &["true"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        strings: &["\"\"\"", "\"", "'"],
        multiline_strings: &["\"\"\""],
        variable_sigil: Some(b'$'),
        attribute_prefix: Some(b'@'),
        directive_prefix: Some(b'#'),
        hints: &["fn "],
        illegal: &["=>"],
        ..LexicalConfig::BASE
    };

    fn captures(text: &str) -> Vec<(&str, String)> {
        let mut grammar = LexicalGrammar::new(&TOY);
        grammar
            .parse(text)
            .spans
            .into_iter()
            .map(|s| (&text[s.start as usize..s.end as usize], s.capture))
            .collect()
    }

    fn has(caps: &[(&str, String)], text: &str, capture: &str) -> bool {
        caps.iter().any(|(t, c)| *t == text && c == capture)
    }

    #[test]
    fn test_keyword_classes() {
        let caps = captures("let x = true; if y return int");
        assert!(has(&caps, "let", "keyword"));
        assert!(has(&caps, "if", "keyword.control"));
        assert!(has(&caps, "return", "keyword.control"));
        assert!(has(&caps, "int", "type.builtin"));
        assert!(has(&caps, "true", "constant.builtin"));
        assert!(has(&caps, "=", "operator"));
    }

    #[test]
    fn test_keywords_need_word_boundaries() {
        let caps = captures("letter iffy");
        assert!(caps.is_empty());
    }

    #[test]
    fn test_comments_and_directives() {
        let caps = captures("#include x\n// note\n/* a\nb */ let");
        assert_eq!(caps[0], ("#include x", "preproc".to_string()));
        assert_eq!(caps[1], ("// note", "comment".to_string()));
        assert_eq!(caps[2], ("/* a\nb */", "comment".to_string()));
        assert_eq!(caps[3], ("let", "keyword".to_string()));
    }

    #[test]
    fn test_directive_only_at_line_start() {
        let caps = captures("let a # b");
        assert!(!caps.iter().any(|(_, c)| *c == "preproc"));
    }

    #[test]
    fn test_strings() {
        let caps = captures("'it\\'s' \"open\n\"\"\"multi\nline\"\"\"");
        assert_eq!(caps[0], ("'it\\'s'", "string".to_string()));
        assert_eq!(caps[1], ("\"open", "string".to_string()));
        assert_eq!(caps[2], ("\"\"\"multi\nline\"\"\"", "string".to_string()));
    }

    #[test]
    fn test_numbers_sigils_attributes_functions() {
        let caps = captures("0x1F 3.5e-2 $home ${x} @deco.rator call (1)");
        assert_eq!(caps[0], ("0x1F", "number".to_string()));
        assert_eq!(caps[1], ("3.5e-2", "number".to_string()));
        assert_eq!(caps[2], ("$home", "variable".to_string()));
        assert_eq!(caps[3], ("${x}", "variable".to_string()));
        assert_eq!(caps[4], ("@deco.rator", "attribute".to_string()));
        assert_eq!(caps[5], ("call", "function".to_string()));
    }

    #[test]
    fn test_non_ascii_text_is_skipped_safely() {
        let caps = captures("привет let 'строка'");
        assert_eq!(caps[0], ("let", "keyword".to_string()));
        assert_eq!(caps[1], ("'строка'", "string".to_string()));
    }

    #[test]
    fn test_relevance_counts_hints_and_illegal() {
        let mut grammar = LexicalGrammar::new(&TOY);
        let plain = grammar.parse("fn f").relevance;
        // keyword 2 + hint 3
        assert_eq!(plain, 5);
        let penalized = grammar.parse("fn f => 1").relevance;
        assert_eq!(penalized, 3);
    }
}
