//! Theme support for codeblock syntax highlighting.
//!
//! This crate provides:
//! - Highlight slot definitions (the small set of categories a stylesheet colors)
//! - The mapping from the broad capture vocabulary to those slots
//! - Stylesheet generation for class-based and custom-element markup

pub mod css;
pub mod highlights;

pub use highlights::{
    SLOTS, ThemeSlot, capture_to_slot, slot_for_tag, tag_for_capture, tag_to_name,
};
