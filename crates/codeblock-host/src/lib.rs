//! Browser host for code block decoration.
//!
//! Call [`setup`] once per page. Every element matching the block selector is
//! highlighted, rebuilt as one wrapper per line and given a copy button. Blocks
//! pre-rendered at build time (`data-decorated="true"`) keep their markup and
//! only get the click handler bound to their existing button.
//!
//! ```javascript
//! import init, { setupWithOptions, SetupOptions } from "./codeblock_host.js";
//!
//! await init();
//! const options = new SetupOptions();
//! options.setLineSource("code-elements");
//! setupWithOptions(options);
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

use codeblock::{
    Block, ButtonView, Clipboard, ClipboardError, CopyButton, CopyOutcome, DecorateConfig,
    IndentMode, LineSource, RenderedLine, attach_copy_button, block_copy_text, builtin_highlighter,
    decorate, settle_copy,
};
use codeblock::highlight::{BuiltinProvider, Highlighter};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, Element, Event, HtmlElement, Window};

const DECORATED_ATTR: &str = "data-decorated";

fn report(context: &str, error: &JsValue) {
    web_sys::console::error_2(&JsValue::from_str(context), error);
}

fn js_error_message(error: &JsValue) -> String {
    if let Some(text) = error.as_string() {
        return text;
    }
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{error:?}")
}

/// Settings for [`setup_with_options`] and [`decorate_element`].
#[wasm_bindgen]
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    config: DecorateConfig,
}

#[wasm_bindgen]
impl SetupOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from a TOML document with the same keys as the CLI config file.
    #[wasm_bindgen(js_name = fromToml)]
    pub fn from_toml(text: &str) -> Result<SetupOptions, JsValue> {
        DecorateConfig::from_toml_str(text)
            .map(|config| Self { config })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setBlockSelector)]
    pub fn set_block_selector(&mut self, selector: &str) {
        self.config.block_selector = selector.to_string();
    }

    /// `"code-elements"` or `"line-elements"`.
    #[wasm_bindgen(js_name = setLineSource)]
    pub fn set_line_source(&mut self, name: &str) -> Result<(), JsValue> {
        self.config.line_source = LineSource::from_name(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown line source `{name}`")))?;
        Ok(())
    }

    /// `"direct-sum"` or `"pixels-to-points"`.
    #[wasm_bindgen(js_name = setIndentMode)]
    pub fn set_indent_mode(&mut self, name: &str) -> Result<(), JsValue> {
        self.config.indent.mode = IndentMode::from_name(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown indent mode `{name}`")))?;
        Ok(())
    }

    #[wasm_bindgen(js_name = setUnitPerTab)]
    pub fn set_unit_per_tab(&mut self, unit: f64) {
        self.config.indent.unit_per_tab = unit;
    }

    #[wasm_bindgen(js_name = setPlaceholder)]
    pub fn set_placeholder(&mut self, placeholder: &str) {
        self.config.placeholder = placeholder.to_string();
    }

    #[wasm_bindgen(js_name = setCaptions)]
    pub fn set_captions(&mut self, copy: &str, copied: &str, error: &str, title: &str) {
        self.config.captions.copy = copy.to_string();
        self.config.captions.copied = copied.to_string();
        self.config.captions.error = error.to_string();
        self.config.captions.title = title.to_string();
    }

    #[wasm_bindgen(js_name = setErrorBackground)]
    pub fn set_error_background(&mut self, color: &str) {
        self.config.error_background = color.to_string();
    }

    #[wasm_bindgen(js_name = setRevertDelayMs)]
    pub fn set_revert_delay_ms(&mut self, ms: u32) {
        self.config.revert_delay = Duration::from_millis(u64::from(ms));
    }
}

/// A live code block element.
pub struct DomBlock {
    element: Element,
    window: Window,
    line_class: String,
    button: Option<Element>,
}

impl DomBlock {
    pub fn new(element: Element, window: Window, config: &DecorateConfig) -> Self {
        Self {
            element,
            window,
            line_class: config.line_class.clone(),
            button: None,
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    /// The copy button appended by [`Block::append_button`], if any.
    pub fn button(&self) -> Option<&Element> {
        self.button.as_ref()
    }

    fn is_decorated(&self) -> bool {
        self.element.get_attribute(DECORATED_ATTR).as_deref() == Some("true")
    }

    fn select(&self, selector: &str) -> Vec<Element> {
        let nodes = match self.element.query_selector_all(selector) {
            Ok(nodes) => nodes,
            Err(e) => {
                report("codeblock: bad selector", &e);
                return Vec::new();
            }
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn line_selector(&self) -> String {
        format!(".{}", self.line_class)
    }

    fn computed(&self, element: &Element, property: &str) -> String {
        match self.window.get_computed_style(element) {
            Ok(Some(style)) => style.get_property_value(property).unwrap_or_default(),
            _ => String::new(),
        }
    }
}

impl Block for DomBlock {
    fn line_texts(&self, source: LineSource) -> Vec<String> {
        let selector = match source {
            LineSource::CodeElements => "code".to_string(),
            LineSource::LineElements => self.line_selector(),
        };
        self.select(&selector)
            .iter()
            .map(|line| line.text_content().unwrap_or_default())
            .collect()
    }

    fn replace_lines(&mut self, lines: &[String]) {
        self.element.set_inner_html(&lines.concat());
        self.button = None;
    }

    fn append_button(&mut self, view: &ButtonView) {
        if let Err(e) = self
            .element
            .insert_adjacent_html("beforeend", &codeblock::button_markup(view))
        {
            report("codeblock: could not add copy button", &e);
            return;
        }
        self.button = self.element.last_element_child();
    }

    fn rendered_lines(&self) -> Vec<RenderedLine> {
        self.select(&self.line_selector())
            .iter()
            .map(|line| {
                RenderedLine::new(
                    line.text_content().unwrap_or_default(),
                    self.computed(line, "text-indent"),
                    self.computed(line, "margin-left"),
                )
            })
            .collect()
    }
}

/// `navigator.clipboard`.
pub struct NavigatorClipboard {
    clipboard: web_sys::Clipboard,
}

impl NavigatorClipboard {
    pub fn new(window: &Window) -> Self {
        Self {
            clipboard: window.navigator().clipboard(),
        }
    }

    /// Call `writeText` now and return a future for its promise.
    pub fn begin_write(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<(), ClipboardError>> + use<> {
        let promise = self.clipboard.write_text(text);
        async move {
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|e| ClipboardError::new(js_error_message(&e)))
        }
    }
}

impl Clipboard for NavigatorClipboard {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> {
        self.begin_write(text)
    }
}

/// The pending revert timeout of one button.
///
/// Scheduling a new revert clears the previous timeout.
pub struct RevertTimer {
    window: Window,
    handle: Option<i32>,
    callback: Option<Closure<dyn FnMut()>>,
}

impl RevertTimer {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            handle: None,
            callback: None,
        }
    }

    pub fn schedule(&mut self, delay: Duration, f: impl FnOnce() + 'static) -> Result<(), JsValue> {
        self.cancel();
        let callback = Closure::once(f);
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis,
            )?;
        self.handle = Some(handle);
        self.callback = Some(callback);
        Ok(())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        self.callback = None;
    }
}

/// A copy button bound to its block.
struct BoundButton {
    block: DomBlock,
    element: Element,
    state: RefCell<CopyButton>,
    timer: RefCell<RevertTimer>,
    clipboard: NavigatorClipboard,
    config: Rc<DecorateConfig>,
}

impl BoundButton {
    fn render(&self) {
        let view = self.state.borrow().view();
        apply_view(&self.element, &view);
    }

    /// Read the lines and start the clipboard write. Runs inside the click.
    fn start_copy(&self) -> (impl Future<Output = Result<(), ClipboardError>> + use<>, usize) {
        let text = block_copy_text(&self.block, &self.config);
        (self.clipboard.begin_write(&text), text.chars().count())
    }

    async fn finish_copy(
        self: Rc<Self>,
        write: impl Future<Output = Result<(), ClipboardError>>,
        chars: usize,
    ) {
        let outcome = settle_copy(&self.state, write, chars).await;
        if let CopyOutcome::Failed { error, .. } = &outcome {
            report("Copy failed:", &JsValue::from_str(&error.message));
        }
        self.render();

        let ticket = outcome.ticket();
        let delay = self.state.borrow().revert_delay();
        let weak: Weak<Self> = Rc::downgrade(&self);
        let scheduled = self.timer.borrow_mut().schedule(delay, move || {
            let Some(button) = weak.upgrade() else {
                return;
            };
            let reverted = button.state.borrow_mut().revert(ticket);
            if reverted {
                button.render();
            }
        });
        if let Err(e) = scheduled {
            report("codeblock: could not schedule revert", &e);
        }
    }
}

fn apply_view(button: &Element, view: &ButtonView) {
    button.set_text_content(Some(&view.label));
    button.set_class_name(&view.class_name);
    if let Err(e) = button.set_attribute("title", &view.title) {
        report("codeblock: could not set button title", &e);
    }
    if let Some(html) = button.dyn_ref::<HtmlElement>() {
        let style = html.style();
        let result = match &view.background {
            Some(color) => style.set_property("background-color", color),
            None => style.remove_property("background-color").map(|_| ()),
        };
        if let Err(e) = result {
            report("codeblock: could not style button", &e);
        }
    }
}

fn bind_button(button: BoundButton) -> Result<(), JsValue> {
    let button = Rc::new(button);
    let target = button.element.clone();
    let on_click = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        event.stop_propagation();
        let (write, chars) = button.start_copy();
        spawn_local(Rc::clone(&button).finish_copy(write, chars));
    });
    target.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    // The listener lives as long as the page.
    on_click.forget();
    Ok(())
}

fn existing_button(block: &DomBlock, config: &DecorateConfig) -> Result<Option<Element>, JsValue> {
    block
        .element()
        .query_selector(&format!("button.{}", config.button_class))
}

fn decorate_block(
    window: &Window,
    element: Element,
    config: &Rc<DecorateConfig>,
    highlighter: &mut Highlighter<BuiltinProvider>,
) -> Result<(), JsValue> {
    let mut block = DomBlock::new(element, window.clone(), config);

    let prerendered = if block.is_decorated() {
        existing_button(&block, config)?
    } else {
        None
    };

    let (element, state) = match prerendered {
        Some(element) => (element, CopyButton::new(config)),
        None => {
            decorate(&mut block, highlighter, config);
            block.element().set_attribute(DECORATED_ATTR, "true")?;
            let state = attach_copy_button(&mut block, config);
            let element = block
                .button()
                .cloned()
                .ok_or_else(|| JsValue::from_str("copy button was not attached"))?;
            (element, state)
        }
    };

    bind_button(BoundButton {
        block,
        element,
        state: RefCell::new(state),
        timer: RefCell::new(RevertTimer::new(window.clone())),
        clipboard: NavigatorClipboard::new(window),
        config: Rc::clone(config),
    })
}

fn decorate_document(window: &Window, document: &Document, config: DecorateConfig) -> Result<u32, JsValue> {
    let config = Rc::new(config);
    let mut highlighter = builtin_highlighter(&config);
    let blocks = document.query_selector_all(&config.block_selector)?;

    let mut decorated = 0;
    for i in 0..blocks.length() {
        let Some(element) = blocks.item(i).and_then(|node| node.dyn_into::<Element>().ok()) else {
            continue;
        };
        if let Err(e) = decorate_block(window, element, &config, &mut highlighter) {
            report("codeblock: could not decorate block", &e);
            continue;
        }
        decorated += 1;
    }
    debug!(blocks = decorated, "decorated document");
    Ok(decorated)
}

fn page() -> Result<(Window, Document), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?;
    Ok((window, document))
}

/// Decorate every code block on the page with the default settings.
#[wasm_bindgen]
pub fn setup() -> Result<(), JsValue> {
    setup_with_options(SetupOptions::default())
}

/// Decorate every code block on the page.
///
/// Runs immediately if the document has finished parsing, otherwise once
/// `DOMContentLoaded` fires.
#[wasm_bindgen(js_name = setupWithOptions)]
pub fn setup_with_options(options: SetupOptions) -> Result<(), JsValue> {
    let (window, document) = page()?;
    if document.ready_state() != "loading" {
        decorate_document(&window, &document, options.config)?;
        return Ok(());
    }

    let target = document.clone();
    let on_ready = Closure::once_into_js(move || {
        if let Err(e) = decorate_document(&window, &document, options.config) {
            report("codeblock: setup failed", &e);
        }
    });
    target.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())
}

/// Decorate a single block element.
#[wasm_bindgen(js_name = decorateElement)]
pub fn decorate_element(element: Element, options: Option<SetupOptions>) -> Result<(), JsValue> {
    let (window, _) = page()?;
    let config = Rc::new(options.unwrap_or_default().config);
    let mut highlighter = builtin_highlighter(&config);
    decorate_block(&window, element, &config, &mut highlighter)
}
