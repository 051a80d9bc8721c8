//! Highlight category definitions - single source of truth.
//!
//! Grammars emit capture names from a fairly large vocabulary
//! (`keyword.control`, `type.builtin`, `constant.builtin`, ...). Stylesheets only
//! color a handful of slots. This module collapses the former into the latter.
//!
//! Every slot has two spellings:
//!
//! 1. **Short tag** - used for custom elements (`<a-k>`, `<a-s>`)
//! 2. **Class name** - used for class-based spans (`<span class="hljs-keyword">`)
//!
//! Adjacent spans that map to the same slot are coalesced by the renderer.

/// The theme slots - the fixed set of color categories a stylesheet defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeSlot {
    Keyword,
    Function,
    String,
    Comment,
    Type,
    Variable,
    Constant,
    Number,
    Operator,
    Punctuation,
    Property,
    Attribute,
    Tag,
    Macro,
    Label,
    Namespace,
    /// Errors and illegal tokens
    Error,
    /// No styling
    None,
}

/// All styled slots, in stylesheet order.
pub const SLOTS: &[ThemeSlot] = &[
    ThemeSlot::Keyword,
    ThemeSlot::Function,
    ThemeSlot::String,
    ThemeSlot::Comment,
    ThemeSlot::Type,
    ThemeSlot::Variable,
    ThemeSlot::Constant,
    ThemeSlot::Number,
    ThemeSlot::Operator,
    ThemeSlot::Punctuation,
    ThemeSlot::Property,
    ThemeSlot::Attribute,
    ThemeSlot::Tag,
    ThemeSlot::Macro,
    ThemeSlot::Label,
    ThemeSlot::Namespace,
    ThemeSlot::Error,
];

impl ThemeSlot {
    /// Get the HTML tag suffix for this slot.
    /// Returns None for slots that produce no styling.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            ThemeSlot::Keyword => Some("k"),
            ThemeSlot::Function => Some("f"),
            ThemeSlot::String => Some("s"),
            ThemeSlot::Comment => Some("c"),
            ThemeSlot::Type => Some("t"),
            ThemeSlot::Variable => Some("v"),
            ThemeSlot::Constant => Some("co"),
            ThemeSlot::Number => Some("n"),
            ThemeSlot::Operator => Some("o"),
            ThemeSlot::Punctuation => Some("p"),
            ThemeSlot::Property => Some("pr"),
            ThemeSlot::Attribute => Some("at"),
            ThemeSlot::Tag => Some("tg"),
            ThemeSlot::Macro => Some("m"),
            ThemeSlot::Label => Some("l"),
            ThemeSlot::Namespace => Some("ns"),
            ThemeSlot::Error => Some("er"),
            ThemeSlot::None => None,
        }
    }

    /// Get the class name for this slot (without any prefix).
    pub fn name(self) -> Option<&'static str> {
        match self {
            ThemeSlot::Keyword => Some("keyword"),
            ThemeSlot::Function => Some("function"),
            ThemeSlot::String => Some("string"),
            ThemeSlot::Comment => Some("comment"),
            ThemeSlot::Type => Some("type"),
            ThemeSlot::Variable => Some("variable"),
            ThemeSlot::Constant => Some("constant"),
            ThemeSlot::Number => Some("number"),
            ThemeSlot::Operator => Some("operator"),
            ThemeSlot::Punctuation => Some("punctuation"),
            ThemeSlot::Property => Some("property"),
            ThemeSlot::Attribute => Some("attribute"),
            ThemeSlot::Tag => Some("tag"),
            ThemeSlot::Macro => Some("macro"),
            ThemeSlot::Label => Some("label"),
            ThemeSlot::Namespace => Some("namespace"),
            ThemeSlot::Error => Some("error"),
            ThemeSlot::None => None,
        }
    }
}

/// Map any capture name to its theme slot.
///
/// Sub-categories (`keyword.control`, `type.builtin`) resolve to their parent
/// slot. Unknown captures produce no styling.
pub fn capture_to_slot(capture: &str) -> ThemeSlot {
    let capture = capture.strip_prefix('@').unwrap_or(capture);

    match capture {
        "keyword" | "keyword.control" | "keyword.conditional" | "keyword.repeat"
        | "keyword.return" | "keyword.import" | "keyword.function" | "keyword.operator"
        | "keyword.exception" | "keyword.modifier" | "keyword.storage" | "include"
        | "conditional" | "repeat" | "exception" | "storageclass" | "preproc" => {
            ThemeSlot::Keyword
        }

        "function" | "function.builtin" | "function.method" | "function.call" | "method" => {
            ThemeSlot::Function
        }

        "string" | "string.special" | "string.escape" | "string.regexp" | "character"
        | "escape" => ThemeSlot::String,

        "comment" | "comment.line" | "comment.block" | "comment.documentation" => {
            ThemeSlot::Comment
        }

        "type" | "type.builtin" | "type.definition" | "type.qualifier" => ThemeSlot::Type,

        "variable" | "variable.builtin" | "variable.parameter" | "parameter" | "field" => {
            ThemeSlot::Variable
        }

        "constant" | "constant.builtin" | "constant.builtin.boolean" | "boolean" => {
            ThemeSlot::Constant
        }

        "number" | "constant.numeric" | "float" | "number.float" => ThemeSlot::Number,

        "operator" => ThemeSlot::Operator,

        "punctuation" | "punctuation.bracket" | "punctuation.delimiter" | "punctuation.special" => {
            ThemeSlot::Punctuation
        }

        "property" => ThemeSlot::Property,
        "attribute" => ThemeSlot::Attribute,
        "tag" | "tag.delimiter" | "tag.attribute" => ThemeSlot::Tag,
        "macro" | "function.macro" | "preproc.macro" => ThemeSlot::Macro,
        "label" => ThemeSlot::Label,
        "namespace" | "module" => ThemeSlot::Namespace,
        "error" => ThemeSlot::Error,

        "none" | "text" | "spell" | "nospell" => ThemeSlot::None,

        other => {
            if other.starts_with("keyword") {
                ThemeSlot::Keyword
            } else if other.starts_with("function") || other.starts_with("method") {
                ThemeSlot::Function
            } else if other.starts_with("string") {
                ThemeSlot::String
            } else if other.starts_with("comment") {
                ThemeSlot::Comment
            } else if other.starts_with("type") {
                ThemeSlot::Type
            } else if other.starts_with("constant") {
                ThemeSlot::Constant
            } else if other.starts_with("punctuation") {
                ThemeSlot::Punctuation
            } else {
                ThemeSlot::None
            }
        }
    }
}

/// Get the HTML tag for a capture name directly.
///
/// # Example
/// ```
/// use codeblock_theme::highlights::tag_for_capture;
///
/// assert_eq!(tag_for_capture("keyword"), Some("k"));
/// assert_eq!(tag_for_capture("keyword.control"), Some("k"));
/// assert_eq!(tag_for_capture("spell"), None);
/// ```
pub fn tag_for_capture(capture: &str) -> Option<&'static str> {
    capture_to_slot(capture).tag()
}

/// Reverse lookup: short tag to slot.
pub fn slot_for_tag(tag: &str) -> Option<ThemeSlot> {
    SLOTS.iter().copied().find(|slot| slot.tag() == Some(tag))
}

/// Map a short tag (`k`, `s`, ...) to its class name (`keyword`, `string`, ...).
pub fn tag_to_name(tag: &str) -> Option<&'static str> {
    slot_for_tag(tag).and_then(ThemeSlot::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_to_slot_keywords() {
        assert_eq!(capture_to_slot("keyword"), ThemeSlot::Keyword);
        assert_eq!(capture_to_slot("keyword.control"), ThemeSlot::Keyword);
        assert_eq!(capture_to_slot("@keyword.return"), ThemeSlot::Keyword);
        assert_eq!(capture_to_slot("include"), ThemeSlot::Keyword);
        assert_eq!(capture_to_slot("keyword.something.new"), ThemeSlot::Keyword);
    }

    #[test]
    fn test_capture_to_slot_builtins_collapse() {
        assert_eq!(capture_to_slot("type.builtin"), ThemeSlot::Type);
        assert_eq!(capture_to_slot("constant.builtin"), ThemeSlot::Constant);
        assert_eq!(capture_to_slot("function.builtin"), ThemeSlot::Function);
    }

    #[test]
    fn test_capture_to_slot_none() {
        assert_eq!(capture_to_slot("none"), ThemeSlot::None);
        assert_eq!(capture_to_slot("whatever"), ThemeSlot::None);
        assert_eq!(tag_for_capture("spell"), None);
    }

    #[test]
    fn test_tag_name_roundtrip_for_every_slot() {
        for slot in SLOTS {
            let tag = slot.tag().unwrap();
            assert_eq!(slot_for_tag(tag), Some(*slot));
            assert_eq!(tag_to_name(tag), slot.name());
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(tag_to_name("zz"), None);
    }
}
