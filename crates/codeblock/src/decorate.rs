//! Decorating code blocks: highlighted line wrappers plus a copy button.
//!
//! Everything here talks to a block through the [`Block`] trait, so the same
//! code runs against live DOM elements in the browser, against blocks
//! collected from static HTML at build time, and against in-memory blocks in
//! tests.

use codeblock_highlight::{
    Grammar, GrammarProvider, Highlighter, html_escape, html_unescape, normalize_language,
};
use tracing::{debug, warn};

use crate::button::{ButtonView, CopyButton};
use crate::config::{DecorateConfig, LineSource};
use crate::copy::{RenderedLine, copy_text};

/// A code block container.
pub trait Block {
    /// Raw text of each line-bearing child, in document order.
    fn line_texts(&self, source: LineSource) -> Vec<String>;

    /// Replace all children with the given line wrapper markup.
    fn replace_lines(&mut self, lines: &[String]);

    /// Append a copy button rendered from `view`.
    fn append_button(&mut self, view: &ButtonView);

    /// Current line wrappers with their visible text and computed indentation.
    fn rendered_lines(&self) -> Vec<RenderedLine>;
}

/// What [`decorate`] did to a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    /// Detected (or forced) language, `None` for plain text.
    pub language: Option<&'static str>,
    pub relevance: i32,
    /// Number of line wrappers written.
    pub lines: usize,
}

/// Markup of one line wrapper.
///
/// An empty fragment is replaced by the placeholder so the line keeps its height.
pub fn line_markup(fragment: &str, config: &DecorateConfig) -> String {
    let content = if fragment.is_empty() {
        html_escape(&config.placeholder)
    } else {
        fragment.to_string()
    };
    format!(
        r#"<div class="{}"><code class="{}">{}</code></div>"#,
        html_escape(&config.line_class),
        html_escape(&config.code_class),
        content
    )
}

/// Markup of a copy button in the state described by `view`.
pub fn button_markup(view: &ButtonView) -> String {
    let style = view
        .background
        .as_deref()
        .map(|bg| format!(r#" style="background-color: {}""#, html_escape(bg)))
        .unwrap_or_default();
    format!(
        r#"<button type="button" class="{}" title="{}"{}>{}</button>"#,
        html_escape(&view.class_name),
        html_escape(&view.title),
        style,
        html_escape(&view.label)
    )
}

/// Visible text of a piece of markup: tags dropped, entities decoded.
pub fn markup_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    text.push_str(rest);
    html_unescape(&text)
}

/// Highlight a block's code and rebuild it as one wrapper per line.
///
/// Line texts are joined with `\n`, the language is auto-detected and the
/// highlighted output is split back into lines. The block's children are
/// replaced wholesale.
pub fn decorate<B, P>(
    block: &mut B,
    highlighter: &mut Highlighter<P>,
    config: &DecorateConfig,
) -> Decoration
where
    B: Block + ?Sized,
    P: GrammarProvider,
{
    decorate_as(block, highlighter, config, None)
}

/// Like [`decorate`], but with a fixed language instead of auto-detection.
///
/// An unsupported language falls back to auto-detection.
pub fn decorate_as<B, P>(
    block: &mut B,
    highlighter: &mut Highlighter<P>,
    config: &DecorateConfig,
    language: Option<&str>,
) -> Decoration
where
    B: Block + ?Sized,
    P: GrammarProvider,
{
    let texts = block.line_texts(config.line_source);
    let source = texts.join("\n");
    let expected = source.split('\n').count();

    let (detected, relevance, fragments) = highlight_source(highlighter, &source, language);

    if fragments.len() != expected {
        warn!(
            expected,
            actual = fragments.len(),
            "highlighted line count differs from source"
        );
    }

    let markup: Vec<String> = fragments
        .iter()
        .map(|fragment| line_markup(fragment, config))
        .collect();
    block.replace_lines(&markup);

    debug!(
        language = detected.unwrap_or("plain"),
        lines = markup.len(),
        "decorated block"
    );

    Decoration {
        language: detected,
        relevance,
        lines: markup.len(),
    }
}

fn highlight_source<P: GrammarProvider>(
    highlighter: &mut Highlighter<P>,
    source: &str,
    language: Option<&str>,
) -> (Option<&'static str>, i32, Vec<String>) {
    if let Some(language) = language {
        let name = normalize_language(language);
        let canonical = highlighter
            .provider_mut()
            .get(&name)
            .map(|grammar| grammar.name());
        match (canonical, highlighter.highlight_lines(&name, source)) {
            (Some(canonical), Ok(lines)) => return (Some(canonical), 0, lines),
            (_, Err(e)) => warn!(%e, "falling back to auto-detection"),
            (None, Ok(_)) => {}
        }
    }

    match highlighter.highlight_auto(source) {
        Ok(auto) => (auto.language, auto.relevance, auto.lines),
        Err(e) => {
            warn!(%e, "highlighting failed, using plain text");
            (None, 0, source.split('\n').map(html_escape).collect())
        }
    }
}

/// Create a copy button for a block and append it.
pub fn attach_copy_button<B: Block + ?Sized>(block: &mut B, config: &DecorateConfig) -> CopyButton {
    let button = CopyButton::new(config);
    block.append_button(&button.view());
    button
}

/// The text a click on the block's copy button puts on the clipboard.
pub fn block_copy_text<B: Block + ?Sized>(block: &B, config: &DecorateConfig) -> String {
    copy_text(&block.rendered_lines(), &config.indent, &config.placeholder)
}

/// A block held in memory.
///
/// Used for build-time decoration, where line texts are collected from
/// static HTML, and anywhere a live page is not available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticBlock {
    texts: Vec<String>,
    lines: Vec<String>,
    indents: Vec<(String, String)>,
    button: Option<ButtonView>,
}

impl StaticBlock {
    /// A block whose line-bearing children hold `texts`.
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Line wrapper markup after decoration.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn button(&self) -> Option<&ButtonView> {
        self.button.as_ref()
    }

    /// Set the computed indentation of line `index`, as CSS would.
    pub fn set_indent(
        &mut self,
        index: usize,
        text_indent: impl Into<String>,
        margin_left: impl Into<String>,
    ) {
        if self.indents.len() <= index {
            self.indents.resize(index + 1, Default::default());
        }
        self.indents[index] = (text_indent.into(), margin_left.into());
    }

    /// Inner HTML of the decorated block: line wrappers, then the button.
    pub fn inner_html(&self) -> String {
        let mut html: String = self.lines.concat();
        if let Some(view) = &self.button {
            html.push_str(&button_markup(view));
        }
        html
    }
}

impl Block for StaticBlock {
    fn line_texts(&self, _source: LineSource) -> Vec<String> {
        self.texts.clone()
    }

    fn replace_lines(&mut self, lines: &[String]) {
        self.lines = lines.to_vec();
        self.indents.clear();
        self.button = None;
    }

    fn append_button(&mut self, view: &ButtonView) {
        self.button = Some(view.clone());
    }

    fn rendered_lines(&self) -> Vec<RenderedLine> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let (text_indent, margin_left) = self.indents.get(i).cloned().unwrap_or_default();
                RenderedLine::new(markup_text(line), text_indent, margin_left)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::{ButtonState, ClipboardError, Clipboard, CopyOutcome, run_copy};
    use codeblock_highlight::{BuiltinProvider, HighlightConfig, HtmlFormat};
    use indoc::indoc;
    use std::cell::RefCell;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    fn highlighter() -> Highlighter<BuiltinProvider> {
        Highlighter::new(BuiltinProvider::new())
    }

    fn visible(block: &StaticBlock, placeholder: &str) -> String {
        block
            .rendered_lines()
            .iter()
            .map(|line| line.text.replace(placeholder, ""))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_line_markup() {
        let config = DecorateConfig::default();
        assert_eq!(
            line_markup("<b>x</b>", &config),
            r#"<div class="line"><code class="hljs"><b>x</b></code></div>"#
        );
        assert_eq!(
            line_markup("", &config),
            "<div class=\"line\"><code class=\"hljs\">\u{200b}</code></div>"
        );
    }

    #[test]
    fn test_button_markup_states() {
        let config = DecorateConfig::default();
        let mut button = CopyButton::new(&config);
        assert_eq!(
            button_markup(&button.view()),
            r#"<button type="button" class="copy-btn" title="Копировать код">Копировать</button>"#
        );
        button.fail();
        assert_eq!(
            button_markup(&button.view()),
            r##"<button type="button" class="copy-btn" title="Копировать код" style="background-color: #dc3545">Ошибка</button>"##
        );
    }

    #[test]
    fn test_markup_text() {
        assert_eq!(
            markup_text(r#"<span class="hljs-keyword">if</span> a &lt; b"#),
            "if a < b"
        );
        assert_eq!(markup_text("a <unclosed"), "a <unclosed");
    }

    #[test]
    fn test_decorate_preserves_text_and_line_count() {
        let config = DecorateConfig::default();
        let source = indoc! {r#"
            def area(r):

                return 3.14 * r * r  # <approx>
        "#}
        .trim_end();
        let mut block = StaticBlock::new(source.lines());
        let decoration = decorate(&mut block, &mut highlighter(), &config);

        assert_eq!(decoration.language, Some("python"));
        assert_eq!(decoration.lines, 3);
        assert_eq!(block.lines().len(), 3);
        assert!(block.lines()[1].contains('\u{200b}'));
        assert_eq!(visible(&block, &config.placeholder), source);
    }

    #[test]
    fn test_decorate_plain_text() {
        let config = DecorateConfig::default();
        let mut block = StaticBlock::new(["just words", "<b> more"]);
        let decoration = decorate(&mut block, &mut highlighter(), &config);
        assert_eq!(decoration.language, None);
        assert_eq!(
            block.lines()[1],
            r#"<div class="line"><code class="hljs">&lt;b&gt; more</code></div>"#
        );
    }

    #[test]
    fn test_decorate_empty_block() {
        let config = DecorateConfig::default();
        let mut block = StaticBlock::new(Vec::<String>::new());
        let decoration = decorate(&mut block, &mut highlighter(), &config);
        assert_eq!(decoration.lines, 1);
        assert_eq!(block_copy_text(&block, &config), "");
    }

    #[test]
    fn test_decorate_as_forced_language() {
        let config = DecorateConfig {
            html_format: HtmlFormat::CustomElements,
            ..Default::default()
        };
        let mut hl = Highlighter::with_config(
            BuiltinProvider::new(),
            HighlightConfig {
                html_format: config.html_format.clone(),
            },
        );
        let mut block = StaticBlock::new(["let x = 1"]);
        let decoration = decorate_as(&mut block, &mut hl, &config, Some("js"));
        assert_eq!(decoration.language, Some("javascript"));
        assert!(block.lines()[0].contains("<a-k>let</a-k>"));

        let mut block = StaticBlock::new(["let x = 1"]);
        let decoration = decorate_as(&mut block, &mut hl, &config, Some("cobol"));
        assert_ne!(decoration.language, Some("cobol"));
    }

    #[test]
    fn test_copy_after_decoration() {
        let config = DecorateConfig::default();
        let mut block = StaticBlock::new(["1   if x:", "2     return 1", "3 "]);
        decorate(&mut block, &mut highlighter(), &config);
        block.set_indent(0, "0px", "0px");
        block.set_indent(1, "0px", "48px");

        assert_eq!(block_copy_text(&block, &config), "  if x:\n\treturn 1");
    }

    struct RecordingClipboard {
        fail: bool,
        written: RefCell<Option<String>>,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> {
            *self.written.borrow_mut() = Some(text.to_string());
            std::future::ready(if self.fail {
                Err(ClipboardError::new("NotAllowedError"))
            } else {
                Ok(())
            })
        }
    }

    fn poll_once<F: Future>(future: F) -> F::Output {
        let mut future = pin!(future);
        match future.as_mut().poll(&mut Context::from_waker(Waker::noop())) {
            Poll::Ready(output) => output,
            Poll::Pending => panic!("future yielded"),
        }
    }

    #[test]
    fn test_click_flow_on_empty_block() {
        let config = DecorateConfig::default();
        let mut block = StaticBlock::default();
        let button = RefCell::new(attach_copy_button(&mut block, &config));
        assert_eq!(block.button().map(|b| b.label.as_str()), Some("Копировать"));

        let clipboard = RecordingClipboard {
            fail: false,
            written: RefCell::new(None),
        };
        let text = block_copy_text(&block, &config);
        let outcome = poll_once(run_copy(&button, &clipboard, &text));

        assert_eq!(clipboard.written.borrow().as_deref(), Some(""));
        assert!(matches!(outcome, CopyOutcome::Copied { .. }));
        assert_eq!(button.borrow().state(), ButtonState::Copied);
    }

    #[test]
    fn test_click_flow_rejected() {
        let config = DecorateConfig::default();
        let mut block = StaticBlock::new(["SELECT 1;"]);
        decorate(&mut block, &mut highlighter(), &config);
        let button = RefCell::new(attach_copy_button(&mut block, &config));
        let clipboard = RecordingClipboard {
            fail: true,
            written: RefCell::new(None),
        };

        let text = block_copy_text(&block, &config);
        let outcome = poll_once(run_copy(&button, &clipboard, &text));
        assert_eq!(clipboard.written.borrow().as_deref(), Some("SELECT 1;"));
        assert_eq!(button.borrow().view().label, "Ошибка");

        button.borrow_mut().revert(outcome.ticket());
        assert_eq!(button.borrow().view().label, "Копировать");
    }

    #[test]
    fn test_inner_html() {
        let config = DecorateConfig::default();
        let mut block = StaticBlock::new(["x"]);
        decorate(&mut block, &mut highlighter(), &config);
        attach_copy_button(&mut block, &config);
        let html = block.inner_html();
        assert!(html.starts_with(r#"<div class="line">"#));
        assert!(html.ends_with("Копировать</button>"));
    }
}
