use std::fmt;

/// A highlighted byte range of the source, tagged with a capture name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offset where the span starts (inclusive).
    pub start: u32,
    /// Byte offset where the span ends (exclusive).
    pub end: u32,
    /// Capture name, e.g. `keyword.control` or `string`.
    pub capture: String,
}

impl Span {
    pub fn new(start: usize, end: usize, capture: impl Into<String>) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
            capture: capture.into(),
        }
    }
}

/// Output of a single grammar run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub spans: Vec<Span>,
    /// How strongly the text looks like this grammar's language.
    /// Only meaningful when comparing results of different grammars on the same text.
    pub relevance: i32,
}

/// Errors from the highlighting engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightError {
    /// The provider has no grammar for this language.
    UnsupportedLanguage(String),
    /// Auto-detection was requested but the provider holds no grammars.
    NoGrammars,
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightError::UnsupportedLanguage(lang) => {
                write!(f, "unsupported language: {lang}")
            }
            HighlightError::NoGrammars => write!(f, "no grammars registered for auto-detection"),
        }
    }
}

impl std::error::Error for HighlightError {}
