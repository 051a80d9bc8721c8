//! Stylesheet generation.
//!
//! The generated CSS colors every highlight slot in both markup spellings
//! (`.hljs-keyword` and `a-k`) and lays out decorated code blocks: one block
//! per line wrapper, a copy button pinned to the top-right corner, and the
//! `copied` state of that button.

use std::fmt::Write;

use crate::highlights::{SLOTS, ThemeSlot};

/// First line of every generated stylesheet. Used to detect an already patched file.
pub const MARKER: &str = "/* codeblock syntax highlighting */";

/// Default foreground for a slot.
fn slot_color(slot: ThemeSlot) -> Option<&'static str> {
    match slot {
        ThemeSlot::Keyword => Some("#d73a49"),
        ThemeSlot::Function => Some("#6f42c1"),
        ThemeSlot::String => Some("#032f62"),
        ThemeSlot::Comment => Some("#6a737d"),
        ThemeSlot::Type => Some("#e36209"),
        ThemeSlot::Variable => Some("#24292e"),
        ThemeSlot::Constant => Some("#005cc5"),
        ThemeSlot::Number => Some("#005cc5"),
        ThemeSlot::Operator => Some("#d73a49"),
        ThemeSlot::Punctuation => Some("#24292e"),
        ThemeSlot::Property => Some("#005cc5"),
        ThemeSlot::Attribute => Some("#6f42c1"),
        ThemeSlot::Tag => Some("#22863a"),
        ThemeSlot::Macro => Some("#6f42c1"),
        ThemeSlot::Label => Some("#e36209"),
        ThemeSlot::Namespace => Some("#6f42c1"),
        ThemeSlot::Error => Some("#b31d28"),
        ThemeSlot::None => None,
    }
}

const LAYOUT: &str = r#".code-block {
  position: relative;
  white-space: pre;
  font-family: monospace;
}
.code-block .line {
  display: block;
  min-height: 1em;
}
.copy-btn {
  position: absolute;
  top: 0.4em;
  right: 0.4em;
  padding: 0.2em 0.6em;
  border: none;
  border-radius: 4px;
  background-color: #0366d6;
  color: #ffffff;
  cursor: pointer;
}
.copy-btn.copied {
  background-color: #28a745;
}
"#;

fn class_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}-{name}")
    }
}

/// Generate the full stylesheet.
///
/// `class_prefix` is the prefix used for class-based spans (`hljs` gives
/// `.hljs-keyword`).
pub fn stylesheet(class_prefix: &str) -> String {
    let mut css = String::with_capacity(2048);
    css.push('\n');
    css.push_str(MARKER);
    css.push('\n');

    for slot in SLOTS {
        let (Some(name), Some(tag), Some(color)) = (slot.name(), slot.tag(), slot_color(*slot))
        else {
            continue;
        };
        let class = class_name(class_prefix, name);
        let _ = writeln!(css, ".{class}, a-{tag} {{ color: {color}; }}");
    }
    let comment = class_name(class_prefix, "comment");
    let _ = writeln!(css, ".{comment}, a-c {{ font-style: italic; }}");

    css.push_str(LAYOUT);
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_starts_with_marker() {
        let css = stylesheet("hljs");
        assert!(css.trim_start().starts_with(MARKER));
    }

    #[test]
    fn test_stylesheet_covers_all_slots() {
        let css = stylesheet("hljs");
        for slot in SLOTS {
            let name = slot.name().unwrap();
            assert!(css.contains(&format!(".hljs-{name}")), "missing {name}");
            assert!(css.contains(&format!("a-{} ", slot.tag().unwrap())));
        }
    }

    #[test]
    fn test_stylesheet_custom_prefix_and_layout() {
        let css = stylesheet("cb");
        assert!(css.contains(".cb-keyword, a-k { color: #d73a49; }"));
        assert!(css.contains(".copy-btn.copied"));
        assert!(!css.contains(".hljs-"));
    }

    #[test]
    fn test_stylesheet_without_prefix() {
        let css = stylesheet("");
        assert!(css.contains(".keyword, a-k "));
        assert!(!css.contains(".-"));
    }
}
