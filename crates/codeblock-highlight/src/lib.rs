//! Syntax highlighting for decorated code blocks.
//!
//! This crate turns source text into highlighted HTML, either for a named
//! language or by auto-detecting the language from the text itself.
//!
//! # Architecture
//!
//! The engine is built around two traits:
//!
//! - [`Grammar`]: parses text and returns spans plus a relevance score
//! - [`GrammarProvider`]: looks grammars up by language name
//!
//! [`BuiltinProvider`] ships lexical grammars for fifteen common languages.
//! [`Highlighter`] drives a provider and renders spans with [`spans_to_html`]
//! or, one balanced fragment per source line, with [`spans_to_html_lines`].
//!
//! # Quick Start
//!
//! ```rust
//! use codeblock_highlight::{BuiltinProvider, Highlighter};
//!
//! let mut highlighter = Highlighter::new(BuiltinProvider::new());
//! let html = highlighter.highlight("python", "def f(): pass").unwrap();
//! assert!(html.contains(r#"<span class="hljs-keyword">def</span>"#));
//!
//! let auto = highlighter.highlight_auto("fn main() {\n    let mut x = 1;\n}").unwrap();
//! assert_eq!(auto.language, Some("rust"));
//! assert_eq!(auto.lines.len(), 3);
//! ```
//!
//! # HTML Output Formats
//!
//! See [`HtmlFormat`]. The default is class-based spans with the `hljs`
//! prefix (`<span class="hljs-keyword">`), which is what the bundled
//! stylesheet targets.

mod detect;
mod languages;
mod lexer;
mod render;
mod types;

pub use detect::{detect_from_content, normalize_language};
pub use languages::{BUILTIN_LANGUAGES, BuiltinProvider};
pub use lexer::{LexicalConfig, LexicalGrammar};
pub use render::{html_escape, html_unescape, spans_to_html, spans_to_html_lines, write_spans_as_html};
pub use types::{HighlightError, ParseResult, Span};

/// A grammar that can parse text and produce highlight spans.
pub trait Grammar {
    /// Canonical language name.
    fn name(&self) -> &'static str;

    /// Parse text and return spans with a relevance score.
    fn parse(&mut self, text: &str) -> ParseResult;
}

/// Provides grammars for languages.
pub trait GrammarProvider {
    /// The grammar type this provider returns.
    type Grammar: Grammar;

    /// Get a grammar for a language name or alias.
    ///
    /// Returns `None` if the language is not supported.
    fn get(&mut self, language: &str) -> Option<&mut Self::Grammar>;

    /// Canonical names of all grammars, in auto-detection order.
    fn languages(&self) -> Vec<&'static str>;
}

/// HTML output format for syntax highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlFormat {
    /// Custom elements with default prefix: `<a-k>`, `<a-f>`, etc.
    ///
    /// # Example
    /// ```html
    /// <a-k>def</a-k> <a-f>main</a-f>()
    /// ```
    CustomElements,

    /// Custom elements with custom prefix: `<prefix-k>`, `<prefix-f>`, etc.
    CustomElementsWithPrefix(String),

    /// Traditional class-based spans: `<span class="keyword">`, etc.
    ClassNames,

    /// Class-based spans with custom prefix: `<span class="prefix-keyword">`, etc.
    ///
    /// # Example
    /// ```html
    /// <!-- With prefix "hljs" -->
    /// <span class="hljs-keyword">def</span> <span class="hljs-function">main</span>()
    /// ```
    ClassNamesWithPrefix(String),
}

impl Default for HtmlFormat {
    fn default() -> Self {
        Self::ClassNamesWithPrefix("hljs".to_string())
    }
}

/// Configuration for highlighting.
#[derive(Debug, Clone, Default)]
pub struct HighlightConfig {
    /// HTML output format (custom elements vs class-based spans).
    pub html_format: HtmlFormat,
}

/// Result of [`Highlighter::highlight_auto`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoHighlight {
    /// Detected language, `None` when nothing scored above zero.
    pub language: Option<&'static str>,
    /// Relevance of the winning grammar.
    pub relevance: i32,
    /// One balanced HTML fragment per source line.
    pub lines: Vec<String>,
}

/// Highlighter over a [`GrammarProvider`].
///
/// # Example
///
/// ```rust
/// use codeblock_highlight::{BuiltinProvider, HighlightConfig, Highlighter, HtmlFormat};
///
/// let config = HighlightConfig { html_format: HtmlFormat::CustomElements };
/// let mut highlighter = Highlighter::with_config(BuiltinProvider::new(), config);
/// let html = highlighter.highlight("rust", "fn main() {}").unwrap();
/// assert!(html.starts_with("<a-k>fn</a-k>"));
/// ```
pub struct Highlighter<P: GrammarProvider> {
    provider: P,
    config: HighlightConfig,
}

impl<P: GrammarProvider> Highlighter<P> {
    /// Create a new highlighter with default configuration.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, HighlightConfig::default())
    }

    /// Create a new highlighter with custom configuration.
    pub fn with_config(provider: P, config: HighlightConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Get a mutable reference to the underlying provider.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    fn spans(&mut self, language: &str, source: &str) -> Result<Vec<Span>, HighlightError> {
        let grammar = self
            .provider
            .get(language)
            .ok_or_else(|| HighlightError::UnsupportedLanguage(language.into()))?;
        Ok(grammar.parse(source).spans)
    }

    /// Highlight source code and return HTML.
    pub fn highlight(&mut self, language: &str, source: &str) -> Result<String, HighlightError> {
        let spans = self.spans(language, source)?;
        Ok(spans_to_html(source, spans, &self.config.html_format))
    }

    /// Highlight source code and return one balanced HTML fragment per line.
    pub fn highlight_lines(
        &mut self,
        language: &str,
        source: &str,
    ) -> Result<Vec<String>, HighlightError> {
        let spans = self.spans(language, source)?;
        Ok(spans_to_html_lines(source, spans, &self.config.html_format))
    }

    /// Detect the language of `source` and highlight it.
    ///
    /// A recognized shebang settles the language. Otherwise every grammar
    /// parses the text and the highest relevance wins, ties going to the
    /// grammar listed first. When no grammar scores above zero the text is
    /// returned escaped but unhighlighted.
    pub fn highlight_auto(&mut self, source: &str) -> Result<AutoHighlight, HighlightError> {
        let languages = self.provider.languages();
        if languages.is_empty() {
            return Err(HighlightError::NoGrammars);
        }

        if let Some(language) = detect_from_content(source)
            && let Some(grammar) = self.provider.get(language)
        {
            let result = grammar.parse(source);
            let language = grammar.name();
            return Ok(AutoHighlight {
                language: Some(language),
                relevance: result.relevance,
                lines: spans_to_html_lines(source, result.spans, &self.config.html_format),
            });
        }

        let mut best: Option<(&'static str, ParseResult)> = None;
        for language in languages {
            let Some(grammar) = self.provider.get(language) else {
                continue;
            };
            let result = grammar.parse(source);
            if best
                .as_ref()
                .is_none_or(|(_, current)| result.relevance > current.relevance)
            {
                best = Some((language, result));
            }
        }

        match best {
            Some((language, result)) if result.relevance > 0 => Ok(AutoHighlight {
                language: Some(language),
                relevance: result.relevance,
                lines: spans_to_html_lines(source, result.spans, &self.config.html_format),
            }),
            _ => Ok(AutoHighlight {
                language: None,
                relevance: 0,
                lines: source.split('\n').map(html_escape).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    /// Grammar that marks every occurrence of one word and scores by count.
    struct WordGrammar {
        name: &'static str,
        word: &'static str,
    }

    impl Grammar for WordGrammar {
        fn name(&self) -> &'static str {
            self.name
        }

        fn parse(&mut self, text: &str) -> ParseResult {
            let spans: Vec<Span> = text
                .match_indices(self.word)
                .map(|(i, w)| Span::new(i, i + w.len(), "keyword"))
                .collect();
            ParseResult {
                relevance: spans.len() as i32,
                spans,
            }
        }
    }

    struct MockProvider {
        grammars: Vec<WordGrammar>,
    }

    impl GrammarProvider for MockProvider {
        type Grammar = WordGrammar;

        fn get(&mut self, language: &str) -> Option<&mut WordGrammar> {
            self.grammars.iter_mut().find(|g| g.name == language)
        }

        fn languages(&self) -> Vec<&'static str> {
            self.grammars.iter().map(|g| g.name).collect()
        }
    }

    fn mock() -> Highlighter<MockProvider> {
        Highlighter::new(MockProvider {
            grammars: vec![
                WordGrammar { name: "alpha", word: "foo" },
                WordGrammar { name: "beta", word: "bar" },
            ],
        })
    }

    #[test]
    fn test_highlight_named_language() {
        let mut hl = mock();
        let html = hl.highlight("alpha", "foo <x>").unwrap();
        assert_eq!(html, r#"<span class="hljs-keyword">foo</span> &lt;x&gt;"#);
    }

    #[test]
    fn test_unsupported_language() {
        let mut hl = mock();
        assert_eq!(
            hl.highlight("gamma", "x"),
            Err(HighlightError::UnsupportedLanguage("gamma".into()))
        );
    }

    #[test]
    fn test_highlight_lines_keeps_line_count() {
        let mut hl = mock();
        let lines = hl.highlight_lines("beta", "bar\n\nbar").unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "");
    }

    #[test]
    fn test_auto_picks_highest_relevance() {
        let mut hl = mock();
        let auto = hl.highlight_auto("bar foo bar").unwrap();
        assert_eq!(auto.language, Some("beta"));
        assert_eq!(auto.relevance, 2);
    }

    #[test]
    fn test_auto_tie_goes_to_first_grammar() {
        let mut hl = mock();
        let auto = hl.highlight_auto("foo bar").unwrap();
        assert_eq!(auto.language, Some("alpha"));
    }

    #[test]
    fn test_auto_falls_back_to_plain_text() {
        let mut hl = mock();
        let auto = hl.highlight_auto("a < b\nc").unwrap();
        assert_eq!(auto.language, None);
        assert_eq!(auto.lines, vec!["a &lt; b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_auto_without_grammars() {
        let mut hl = Highlighter::new(MockProvider { grammars: vec![] });
        assert_eq!(hl.highlight_auto("x"), Err(HighlightError::NoGrammars));
    }

    #[test]
    fn test_builtin_detects_python() {
        let mut hl = Highlighter::new(BuiltinProvider::new());
        let auto = hl
            .highlight_auto(indoc! {r#"
                def greet(name):
                    print(f"hi {name}")
                    return None
            "#})
            .unwrap();
        assert_eq!(auto.language, Some("python"));
        assert_eq!(auto.lines.len(), 4);
        assert!(auto.lines[0].starts_with(r#"<span class="hljs-keyword">def</span>"#));
    }

    #[test]
    fn test_builtin_detects_go_sql_and_json() {
        let mut hl = Highlighter::new(BuiltinProvider::new());
        let go = indoc! {r#"
            package main

            import "fmt"

            func main() {
                x := 1
                fmt.Println(x)
            }
        "#};
        assert_eq!(hl.highlight_auto(go).unwrap().language, Some("go"));

        let sql = "SELECT id, name FROM users WHERE age > 21 ORDER BY name;";
        assert_eq!(hl.highlight_auto(sql).unwrap().language, Some("sql"));

        let json = "{\n  \"name\": \"demo\",\n  \"enabled\": true\n}";
        assert_eq!(hl.highlight_auto(json).unwrap().language, Some("json"));
    }

    #[test]
    fn test_builtin_shebang_wins() {
        let mut hl = Highlighter::new(BuiltinProvider::new());
        let auto = hl.highlight_auto("#!/bin/bash\nls").unwrap();
        assert_eq!(auto.language, Some("bash"));
        assert_eq!(
            auto.lines[0],
            r##"<span class="hljs-comment">#!/bin/bash</span>"##
        );
    }

    #[test]
    fn test_builtin_plain_prose() {
        let mut hl = Highlighter::new(BuiltinProvider::new());
        let auto = hl.highlight_auto("hello world").unwrap();
        assert_eq!(auto.language, None);
        assert_eq!(auto.lines, vec!["hello world".to_string()]);
    }
}
