//! Code block decoration.
//!
//! Turns plain code block containers into highlighted, line-wrapped blocks with
//! a copy-to-clipboard button:
//!
//! - [`decorate`] joins a block's line texts, auto-detects the language,
//!   highlights the code and rebuilds the block as one wrapper per line
//!   (blank lines get a zero-width placeholder so they keep their height).
//! - [`attach_copy_button`] appends a button backed by a [`CopyButton`] state
//!   machine.
//! - [`block_copy_text`] rebuilds the text a click copies: indentation comes
//!   back from computed `text-indent` and `margin-left` as tabs, line number
//!   prefixes are stripped and blank lines are dropped.
//! - [`run_copy`] writes that text through a [`Clipboard`] and moves the
//!   button into its copied or error state.
//!
//! Nothing here touches a real page. Hosts implement [`Block`] and
//! [`Clipboard`] for their environment.
//!
//! # Example
//!
//! ```rust
//! use codeblock::{DecorateConfig, StaticBlock, attach_copy_button, builtin_highlighter, decorate};
//!
//! let config = DecorateConfig::default();
//! let mut highlighter = builtin_highlighter(&config);
//!
//! let mut block = StaticBlock::new(["fn main() {", "    let mut n = 1;", "}"]);
//! let decoration = decorate(&mut block, &mut highlighter, &config);
//! attach_copy_button(&mut block, &config);
//!
//! assert_eq!(decoration.language, Some("rust"));
//! assert_eq!(block.lines().len(), 3);
//! assert!(block.inner_html().ends_with("</button>"));
//! ```

mod button;
mod config;
mod copy;
mod decorate;
mod indent;

pub use button::{
    ButtonState, ButtonView, Clipboard, ClipboardError, CopyButton, CopyOutcome, RevertTicket,
    run_copy, settle_copy,
};
pub use config::{Captions, ConfigError, DecorateConfig, LineSource};
pub use copy::{RenderedLine, copy_line, copy_text, strip_line_numbers};
pub use decorate::{
    Block, Decoration, StaticBlock, attach_copy_button, block_copy_text, button_markup, decorate,
    decorate_as, line_markup, markup_text,
};
pub use indent::{CssLength, IndentConfig, IndentMode};

pub use codeblock_highlight as highlight;

use codeblock_highlight::{BuiltinProvider, HighlightConfig, Highlighter};

/// A highlighter over the built-in grammars, rendering in the configured format.
pub fn builtin_highlighter(config: &DecorateConfig) -> Highlighter<BuiltinProvider> {
    Highlighter::with_config(
        BuiltinProvider::new(),
        HighlightConfig {
            html_format: config.html_format.clone(),
        },
    )
}
