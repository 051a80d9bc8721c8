//! Indentation reconstruction from computed CSS lengths.
//!
//! A rendered line carries its indentation in `text-indent` and `margin-left`
//! rather than in its text. Copying turns the sum of both back into tabs.

/// Points per CSS pixel.
const PT_PER_PX: f64 = 0.75;

/// A numeric CSS length as read from a style declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct CssLength {
    pub value: f64,
    /// Lowercased unit, empty for unitless values.
    pub unit: String,
}

impl CssLength {
    /// Parse the leading number of a CSS value and the unit after it.
    ///
    /// Like `parseFloat`, trailing garbage after the unit is kept in `unit` and
    /// a value without a leading number is `None`.
    ///
    /// ```
    /// use codeblock::CssLength;
    ///
    /// let len = CssLength::parse("48px").unwrap();
    /// assert_eq!(len.value, 48.0);
    /// assert_eq!(len.unit, "px");
    /// assert!(CssLength::parse("auto").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<CssLength> {
        let text = text.trim();
        let bytes = text.as_bytes();
        let mut end = 0;

        if matches!(bytes.first(), Some(b'+' | b'-')) {
            end += 1;
        }
        let int_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        let mut digits = end - int_start;
        if end < bytes.len() && bytes[end] == b'.' {
            let frac_start = end + 1;
            let mut frac_end = frac_start;
            while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
                frac_end += 1;
            }
            if frac_end > frac_start || digits > 0 {
                digits += frac_end - frac_start;
                end = frac_end;
            }
        }
        if digits == 0 {
            return None;
        }
        if end < bytes.len() && (bytes[end] | 0x20) == b'e' {
            let mut exp = end + 1;
            if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
                exp += 1;
            }
            if exp < bytes.len() && bytes[exp].is_ascii_digit() {
                while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                    exp += 1;
                }
                end = exp;
            }
        }

        let value: f64 = text[..end].parse().ok()?;
        Some(CssLength {
            value,
            unit: text[end..].trim().to_ascii_lowercase(),
        })
    }
}

/// How the two indentation lengths are brought into a common unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentMode {
    /// Sum the numeric magnitudes as they are.
    DirectSum,
    /// Convert pixel values to points before summing. Other units pass through.
    #[default]
    PixelsToPoints,
}

impl IndentMode {
    fn magnitude(self, length: &CssLength) -> f64 {
        match self {
            IndentMode::DirectSum => length.value,
            IndentMode::PixelsToPoints if length.unit == "px" => length.value * PT_PER_PX,
            IndentMode::PixelsToPoints => length.value,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IndentMode::DirectSum => "direct-sum",
            IndentMode::PixelsToPoints => "pixels-to-points",
        }
    }

    pub fn from_name(name: &str) -> Option<IndentMode> {
        match name {
            "direct-sum" | "direct" => Some(IndentMode::DirectSum),
            "pixels-to-points" | "px-to-pt" => Some(IndentMode::PixelsToPoints),
            _ => None,
        }
    }
}

/// Indentation conversion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct IndentConfig {
    pub mode: IndentMode,
    /// Size of one tab stop in the unit the mode produces.
    pub unit_per_tab: f64,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            mode: IndentMode::default(),
            unit_per_tab: 36.0,
        }
    }
}

impl IndentConfig {
    /// Convert a line's computed `text-indent` and `margin-left` into a tab count.
    ///
    /// Unparsable values count as zero. The sum is divided by `unit_per_tab`,
    /// rounded to the nearest integer and clamped at zero.
    pub fn tab_count(&self, text_indent: &str, margin_left: &str) -> usize {
        let total: f64 = [text_indent, margin_left]
            .into_iter()
            .filter_map(CssLength::parse)
            .map(|length| self.mode.magnitude(&length))
            .sum();

        if self.unit_per_tab <= 0.0 {
            return 0;
        }
        let tabs = (total / self.unit_per_tab).round();
        if tabs.is_finite() && tabs > 0.0 {
            tabs as usize
        } else {
            0
        }
    }
}
