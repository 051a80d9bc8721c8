//! Build-time decoration of code blocks in static HTML.
//!
//! Two passes with `lol_html`: the first collects the raw text of every
//! block's line elements, the second swaps each block's content for the
//! decorated markup. Blocks already carrying `data-decorated="true"` are left
//! alone.

use std::cell::RefCell;
use std::fmt;

use codeblock::highlight::{GrammarProvider, Highlighter, html_unescape};
use codeblock::{DecorateConfig, LineSource, StaticBlock, attach_copy_button, decorate_as};
use lol_html::errors::{RewritingError, SelectorError};
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, Selector, element, rewrite_str, text};

pub const DECORATED_ATTR: &str = "data-decorated";

/// Errors from [`transform_html`].
#[derive(Debug)]
pub enum TransformError {
    /// A configured selector is not valid CSS.
    Selector { selector: String, error: SelectorError },
    /// The HTML could not be rewritten.
    Rewrite(RewritingError),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Selector { selector, error } => {
                write!(f, "invalid selector `{selector}`: {error}")
            }
            TransformError::Rewrite(e) => write!(f, "HTML rewrite failed: {e}"),
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransformError::Selector { error, .. } => Some(error),
            TransformError::Rewrite(e) => Some(e),
        }
    }
}

impl From<RewritingError> for TransformError {
    fn from(e: RewritingError) -> Self {
        TransformError::Rewrite(e)
    }
}

/// What [`transform_html`] did to one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformResult {
    /// Blocks rebuilt with line wrappers and a button.
    pub blocks_decorated: usize,
    /// Blocks that were already decorated.
    pub blocks_skipped: usize,
    /// Decorated blocks no grammar recognized.
    pub plain_blocks: usize,
    /// Languages detected, in order of first appearance.
    pub languages: Vec<&'static str>,
}

/// Line texts of one block, as collected from the document.
#[derive(Debug, Default)]
struct CollectedBlock {
    decorated: bool,
    lines: Vec<String>,
}

fn checked(selector: String) -> Result<String, TransformError> {
    match selector.parse::<Selector>() {
        Ok(_) => Ok(selector),
        Err(error) => Err(TransformError::Selector { selector, error }),
    }
}

fn line_selector(config: &DecorateConfig) -> String {
    match config.line_source {
        LineSource::CodeElements => format!("{} code", config.block_selector),
        LineSource::LineElements => format!("{} .{}", config.block_selector, config.line_class),
    }
}

fn collect_blocks(
    html: &str,
    block_selector: &str,
    line_selector: &str,
) -> Result<Vec<CollectedBlock>, TransformError> {
    let blocks = RefCell::new(Vec::<CollectedBlock>::new());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(block_selector, |el| {
                    blocks.borrow_mut().push(CollectedBlock {
                        decorated: el.get_attribute(DECORATED_ATTR).as_deref() == Some("true"),
                        lines: Vec::new(),
                    });
                    Ok(())
                }),
                element!(line_selector, |_el| {
                    if let Some(block) = blocks.borrow_mut().last_mut() {
                        block.lines.push(String::new());
                    }
                    Ok(())
                }),
                text!(line_selector, |chunk| {
                    if let Some(line) = blocks
                        .borrow_mut()
                        .last_mut()
                        .and_then(|block| block.lines.last_mut())
                    {
                        line.push_str(chunk.as_str());
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok(blocks.into_inner())
}

/// Decorate every code block in `html`, auto-detecting each block's language.
pub fn transform_html<P: GrammarProvider>(
    html: &str,
    highlighter: &mut Highlighter<P>,
    config: &DecorateConfig,
) -> Result<(String, TransformResult), TransformError> {
    transform_html_as(html, highlighter, config, None)
}

/// Like [`transform_html`], with every block highlighted as `language`.
///
/// ```
/// use codeblock::{DecorateConfig, builtin_highlighter};
/// use codeblock_cli::transform_html_as;
///
/// let config = DecorateConfig::default();
/// let mut highlighter = builtin_highlighter(&config);
/// let html = r#"<div class="code-block"><div class="line">SELECT 1</div></div>"#;
///
/// let (out, result) = transform_html_as(html, &mut highlighter, &config, Some("sql")).unwrap();
/// assert_eq!(result.languages, ["sql"]);
/// assert!(out.contains(r#"data-decorated="true""#));
/// ```
pub fn transform_html_as<P: GrammarProvider>(
    html: &str,
    highlighter: &mut Highlighter<P>,
    config: &DecorateConfig,
    language: Option<&str>,
) -> Result<(String, TransformResult), TransformError> {
    let block_selector = checked(config.block_selector.clone())?;
    let line_selector = checked(line_selector(config))?;

    let collected = collect_blocks(html, &block_selector, &line_selector)?;
    let mut result = TransformResult::default();

    let rendered: Vec<Option<String>> = collected
        .into_iter()
        .map(|block| {
            if block.decorated {
                result.blocks_skipped += 1;
                return None;
            }
            let mut target = StaticBlock::new(block.lines.iter().map(|line| html_unescape(line)));
            let decoration = decorate_as(&mut target, highlighter, config, language);
            attach_copy_button(&mut target, config);

            result.blocks_decorated += 1;
            match decoration.language {
                Some(name) if !result.languages.contains(&name) => result.languages.push(name),
                Some(_) => {}
                None => result.plain_blocks += 1,
            }
            Some(target.inner_html())
        })
        .collect();

    if result.blocks_decorated == 0 {
        return Ok((html.to_string(), result));
    }

    let mut index = 0;
    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(&block_selector, |el| {
                if let Some(Some(inner)) = rendered.get(index) {
                    el.set_inner_content(inner, ContentType::Html);
                    el.set_attribute(DECORATED_ATTR, "true")?;
                }
                index += 1;
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )?;

    Ok((output, result))
}
