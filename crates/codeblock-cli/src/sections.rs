//! Wrapping marker-delimited paragraphs into code blocks.
//!
//! Documents exported from a word processor mark code with a paragraph
//! containing `START_CODE_SECTION` before it and one containing
//! `END_CODE_SECTION` after it. Everything between is a run of sibling
//! paragraphs whose indentation lives in inline `text-indent` and
//! `margin-left` declarations.
//!
//! Each section becomes a `.code-block` container with one `.line` wrapper per
//! sibling element, and paragraph indentation is turned into leading spaces.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use codeblock::CssLength;
use lol_html::errors::{AttributeNameError, RewritingError};
use lol_html::html_content::{ContentType, Element, EndTag};
use lol_html::{RewriteStrSettings, element, rewrite_str, text};

pub const START_MARKER: &str = "START_CODE_SECTION";
pub const END_MARKER: &str = "END_CODE_SECTION";

const BLOCK_OPEN: &str =
    r#"<div class="code-block" style="white-space: pre; font-family: monospace;">"#;
const BLOCK_CLOSE: &str = "</div>";
const LINE_OPEN: &str = r#"<div class="line">"#;
const LINE_CLOSE: &str = "</div>";

/// Counters from one [`wrap_code_sections`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionStats {
    /// Sections turned into code blocks.
    pub sections: usize,
    /// Line wrappers written.
    pub lines: usize,
    /// Paragraphs whose indentation was moved into their text.
    pub indented: usize,
}

/// Errors from [`wrap_code_sections`]. The input is left untouched.
#[derive(Debug)]
pub enum SectionError {
    /// Start and end markers do not come in pairs.
    UnpairedMarkers { starts: usize, ends: usize },
    /// A start marker appears while section `section` is still open.
    NestedMarker { section: usize },
    /// An end marker appears after `closed` sections with none open.
    StrayEnd { closed: usize },
    /// The end marker of section `section` is not a sibling of its start.
    SplitSection { section: usize },
    /// The HTML could not be rewritten.
    Rewrite(RewritingError),
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionError::UnpairedMarkers { starts, ends } => write!(
                f,
                "unpaired code markers: {starts} {START_MARKER}, {ends} {END_MARKER}"
            ),
            SectionError::NestedMarker { section } => {
                write!(f, "{START_MARKER} inside open code section {section}")
            }
            SectionError::StrayEnd { closed } => {
                write!(f, "{END_MARKER} without an open section after section {closed}")
            }
            SectionError::SplitSection { section } => write!(
                f,
                "markers of code section {section} have different parents"
            ),
            SectionError::Rewrite(e) => write!(f, "HTML rewrite failed: {e}"),
        }
    }
}

impl std::error::Error for SectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SectionError::Rewrite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RewritingError> for SectionError {
    fn from(e: RewritingError) -> Self {
        SectionError::Rewrite(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Start,
    End,
}

impl Marker {
    fn classify(text: &str) -> Option<Marker> {
        if text.contains(START_MARKER) {
            Some(Marker::Start)
        } else if text.contains(END_MARKER) {
            Some(Marker::End)
        } else {
            None
        }
    }
}

/// A paragraph seen by the scanning pass.
#[derive(Debug, Default)]
struct Paragraph {
    parent: Option<usize>,
    text: String,
}

/// Open elements, identified by the ordinal of their start tag.
#[derive(Debug, Clone, Default)]
struct Nesting {
    open: Rc<RefCell<Vec<usize>>>,
    seen: Rc<Cell<usize>>,
}

impl Nesting {
    /// Parent of `el`, `None` at the top level. `el` stays open until its end tag.
    fn enter(&self, el: &mut Element<'_, '_>) -> Option<usize> {
        let id = self.seen.get();
        self.seen.set(id + 1);
        let parent = self.open.borrow().last().copied();
        if let Some(handlers) = el.end_tag_handlers() {
            self.open.borrow_mut().push(id);
            let open = Rc::clone(&self.open);
            handlers.push(Box::new(move |_end: &mut EndTag<'_>| {
                open.borrow_mut().pop();
                Ok(())
            }));
        }
        parent
    }
}

fn is_paragraph(el: &Element<'_, '_>) -> bool {
    el.tag_name().eq_ignore_ascii_case("p")
}

/// Spaces one indentation declaration value is worth.
///
/// Points, pixels and unitless values count one space per 9 units, `em` four
/// spaces, `cm` a space per 9/28.35 cm. Anything else is worth nothing.
pub fn indent_spaces(value: &str) -> i64 {
    let Some(length) = CssLength::parse(value) else {
        return 0;
    };
    let spaces = match length.unit.as_str() {
        "pt" | "px" | "" => length.value / 9.0,
        "em" => length.value * 4.0,
        "cm" => length.value * 28.35 / 9.0,
        _ => 0.0,
    };
    spaces.trunc() as i64
}

/// Split an inline style into the declarations to keep and the spaces its
/// `text-indent` and `margin-left` declarations add up to.
pub fn split_indent(style: &str) -> (String, i64) {
    let mut kept = Vec::new();
    let mut spaces = 0;
    for declaration in style.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        let (property, value) = declaration.split_once(':').unwrap_or((declaration, ""));
        match property.trim().to_ascii_lowercase().as_str() {
            "text-indent" | "margin-left" => spaces += indent_spaces(value),
            _ => kept.push(declaration),
        }
    }
    (kept.join(";"), spaces)
}

/// Move a paragraph's indentation declarations into leading spaces.
fn move_indent_into_text(el: &mut Element<'_, '_>) -> Result<bool, AttributeNameError> {
    let Some(style) = el.get_attribute("style") else {
        return Ok(false);
    };
    let (kept, spaces) = split_indent(&style);
    if spaces <= 0 {
        return Ok(false);
    }
    if kept.is_empty() {
        el.remove_attribute("style");
    } else {
        el.set_attribute("style", &kept)?;
    }
    el.prepend(&" ".repeat(spaces as usize), ContentType::Text);
    Ok(true)
}

fn scan_paragraphs(html: &str) -> Result<Vec<Paragraph>, SectionError> {
    let paragraphs = RefCell::new(Vec::<Paragraph>::new());
    let nesting = Nesting::default();

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("*", |el| {
                    let parent = nesting.enter(el);
                    if is_paragraph(el) {
                        paragraphs.borrow_mut().push(Paragraph {
                            parent,
                            text: String::new(),
                        });
                    }
                    Ok(())
                }),
                text!("p", |chunk| {
                    if let Some(last) = paragraphs.borrow_mut().last_mut() {
                        last.text.push_str(chunk.as_str());
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(paragraphs.into_inner())
}

/// Check marker pairing. Returns the marker of every paragraph.
fn check_markers(paragraphs: &[Paragraph]) -> Result<Vec<Option<Marker>>, SectionError> {
    let markers: Vec<Option<Marker>> = paragraphs
        .iter()
        .map(|p| Marker::classify(&p.text))
        .collect();

    let starts = markers.iter().filter(|m| **m == Some(Marker::Start)).count();
    let ends = markers.iter().filter(|m| **m == Some(Marker::End)).count();
    if starts != ends {
        return Err(SectionError::UnpairedMarkers { starts, ends });
    }

    let mut open: Option<Option<usize>> = None;
    let mut closed = 0;
    for (paragraph, marker) in paragraphs.iter().zip(&markers) {
        match (marker, open) {
            (Some(Marker::Start), None) => open = Some(paragraph.parent),
            (Some(Marker::Start), Some(_)) => {
                return Err(SectionError::NestedMarker { section: closed + 1 });
            }
            (Some(Marker::End), Some(parent)) => {
                closed += 1;
                if parent != paragraph.parent {
                    return Err(SectionError::SplitSection { section: closed });
                }
                open = None;
            }
            (Some(Marker::End), None) => return Err(SectionError::StrayEnd { closed }),
            (None, _) => {}
        }
    }

    Ok(markers)
}

/// Turn every marker-delimited section of `html` into a code block.
///
/// HTML without markers comes back unchanged.
///
/// ```
/// use codeblock_cli::wrap_code_sections;
///
/// let html = "<p>START_CODE_SECTION</p><p style=\"margin-left:18pt\">x = 1</p><p>END_CODE_SECTION</p>";
/// let (out, stats) = wrap_code_sections(html).unwrap();
/// assert_eq!(stats.sections, 1);
/// assert!(out.contains(r#"<div class="line"><p>  x = 1</p></div>"#));
/// ```
pub fn wrap_code_sections(html: &str) -> Result<(String, SectionStats), SectionError> {
    if !html.contains(START_MARKER) && !html.contains(END_MARKER) {
        return Ok((html.to_string(), SectionStats::default()));
    }

    let paragraphs = scan_paragraphs(html)?;
    let markers = check_markers(&paragraphs)?;
    if markers.iter().all(Option::is_none) {
        return Ok((html.to_string(), SectionStats::default()));
    }

    let nesting = Nesting::default();
    let mut stats = SectionStats::default();
    let mut seen = 0;
    // Parent of the open section's start marker.
    let mut open: Option<Option<usize>> = None;

    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                let parent = nesting.enter(el);
                let paragraph = is_paragraph(el);
                let marker = if paragraph {
                    seen += 1;
                    markers.get(seen - 1).copied().flatten()
                } else {
                    None
                };

                match marker {
                    Some(Marker::Start) => {
                        el.replace(BLOCK_OPEN, ContentType::Html);
                        open = Some(parent);
                        stats.sections += 1;
                    }
                    Some(Marker::End) => {
                        el.replace(BLOCK_CLOSE, ContentType::Html);
                        open = None;
                    }
                    None if open == Some(parent) => {
                        el.before(LINE_OPEN, ContentType::Html);
                        el.after(LINE_CLOSE, ContentType::Html);
                        stats.lines += 1;
                        if paragraph && move_indent_into_text(el)? {
                            stats.indented += 1;
                        }
                    }
                    None => {}
                }
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok((output, stats))
}
