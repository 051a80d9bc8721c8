//! Static pre-processing of HTML for code block decoration.
//!
//! Runs over a directory of HTML files, typically a document exported from a
//! word processor:
//!
//! ```bash
//! codeblock ./export ./site --stylesheet styles/main.css
//! ```
//!
//! # How it works
//!
//! 1. **Marker sections**: paragraphs between a `START_CODE_SECTION` and an
//!    `END_CODE_SECTION` paragraph are wrapped into a `.code-block` container
//!    with one `.line` per paragraph, and paragraph indentation becomes
//!    leading spaces.
//!
//! 2. **Decoration**: every `.code-block` is highlighted and rebuilt the way
//!    the browser host would do it, then tagged `data-decorated="true"` so
//!    the host only binds the copy button.
//!
//! 3. **Stylesheet**: highlighting rules are appended once to a stylesheet of
//!    the site.

mod html;
mod processor;
mod sections;

pub use html::{DECORATED_ATTR, TransformError, TransformResult, transform_html, transform_html_as};
pub use processor::{ProcessError, ProcessOptions, Processor, ProcessorStats};
pub use sections::{
    END_MARKER, START_MARKER, SectionError, SectionStats, indent_spaces, split_indent,
    wrap_code_sections,
};
