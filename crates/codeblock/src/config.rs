//! Decoration settings.

use std::fmt;
use std::time::Duration;

use codeblock_highlight::HtmlFormat;

use crate::indent::{IndentConfig, IndentMode};

/// Which children of a block carry the raw code lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSource {
    /// `code` elements, one per line.
    CodeElements,
    /// Elements with the line class (`.line`).
    #[default]
    LineElements,
}

impl LineSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LineSource::CodeElements => "code-elements",
            LineSource::LineElements => "line-elements",
        }
    }

    pub fn from_name(name: &str) -> Option<LineSource> {
        match name {
            "code-elements" | "code" => Some(LineSource::CodeElements),
            "line-elements" | "line" => Some(LineSource::LineElements),
            _ => None,
        }
    }
}

/// User-visible button captions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captions {
    pub copy: String,
    pub copied: String,
    pub error: String,
    /// Tooltip.
    pub title: String,
}

impl Default for Captions {
    fn default() -> Self {
        Self {
            copy: "Копировать".to_string(),
            copied: "Скопировано!".to_string(),
            error: "Ошибка".to_string(),
            title: "Копировать код".to_string(),
        }
    }
}

/// Everything decoration and the copy button need to know about the page.
#[derive(Debug, Clone, PartialEq)]
pub struct DecorateConfig {
    /// Selector matching code block containers.
    pub block_selector: String,
    pub line_source: LineSource,
    /// Class of a line wrapper.
    pub line_class: String,
    /// Class of the inline element holding highlighted markup.
    pub code_class: String,
    pub button_class: String,
    /// Extra button class while the copied state is shown.
    pub copied_class: String,
    /// Content of an empty line so it keeps its height.
    pub placeholder: String,
    pub indent: IndentConfig,
    pub captions: Captions,
    /// Button background while the error state is shown.
    pub error_background: String,
    /// How long the copied and error states last.
    pub revert_delay: Duration,
    pub html_format: HtmlFormat,
}

impl Default for DecorateConfig {
    fn default() -> Self {
        Self {
            block_selector: ".code-block".to_string(),
            line_source: LineSource::default(),
            line_class: "line".to_string(),
            code_class: "hljs".to_string(),
            button_class: "copy-btn".to_string(),
            copied_class: "copied".to_string(),
            placeholder: "\u{200b}".to_string(),
            indent: IndentConfig::default(),
            captions: Captions::default(),
            error_background: "#dc3545".to_string(),
            revert_delay: Duration::from_secs(2),
            html_format: HtmlFormat::default(),
        }
    }
}

/// Error loading a [`DecorateConfig`] from TOML.
#[derive(Debug)]
pub enum ConfigError {
    /// The text is not valid TOML.
    Parse(toml::de::Error),
    /// A key holds a value of the wrong type.
    WrongType { key: String, expected: &'static str },
    /// A key holds a value outside its allowed set.
    UnknownValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid config: {e}"),
            ConfigError::WrongType { key, expected } => {
                write!(f, "config key `{key}` must be {expected}")
            }
            ConfigError::UnknownValue { key, value } => {
                write!(f, "config key `{key}` has unknown value `{value}`")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

fn read_string(
    table: &toml::Table,
    prefix: &str,
    key: &str,
    slot: &mut String,
) -> Result<(), ConfigError> {
    if let Some(value) = table.get(key) {
        *slot = value
            .as_str()
            .ok_or_else(|| ConfigError::WrongType {
                key: format!("{prefix}{key}"),
                expected: "a string",
            })?
            .to_string();
    }
    Ok(())
}

fn read_number(table: &toml::Table, prefix: &str, key: &str) -> Result<Option<f64>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(toml::Value::Float(f)) => Ok(Some(*f)),
        Some(toml::Value::Integer(i)) => Ok(Some(*i as f64)),
        Some(_) => Err(ConfigError::WrongType {
            key: format!("{prefix}{key}"),
            expected: "a number",
        }),
    }
}

fn read_table<'a>(table: &'a toml::Table, key: &str) -> Result<Option<&'a toml::Table>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(value) => value.as_table().map(Some).ok_or_else(|| ConfigError::WrongType {
            key: key.to_string(),
            expected: "a table",
        }),
    }
}

impl DecorateConfig {
    /// Load settings from TOML, starting from the defaults.
    ///
    /// Missing keys keep their default and unknown keys are ignored.
    ///
    /// ```
    /// use codeblock::{DecorateConfig, IndentMode, LineSource};
    ///
    /// let config = DecorateConfig::from_toml_str(r#"
    ///     line_source = "code-elements"
    ///     [indent]
    ///     mode = "direct-sum"
    /// "#).unwrap();
    /// assert_eq!(config.line_source, LineSource::CodeElements);
    /// assert_eq!(config.indent.mode, IndentMode::DirectSum);
    /// assert_eq!(config.captions.copy, "Копировать");
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = text.parse()?;
        let mut config = DecorateConfig::default();

        read_string(&table, "", "block_selector", &mut config.block_selector)?;
        read_string(&table, "", "line_class", &mut config.line_class)?;
        read_string(&table, "", "code_class", &mut config.code_class)?;
        read_string(&table, "", "button_class", &mut config.button_class)?;
        read_string(&table, "", "copied_class", &mut config.copied_class)?;
        read_string(&table, "", "placeholder", &mut config.placeholder)?;
        read_string(&table, "", "error_background", &mut config.error_background)?;

        let mut line_source = config.line_source.as_str().to_string();
        read_string(&table, "", "line_source", &mut line_source)?;
        config.line_source =
            LineSource::from_name(&line_source).ok_or_else(|| ConfigError::UnknownValue {
                key: "line_source".into(),
                value: line_source.clone(),
            })?;

        if let Some(ms) = read_number(&table, "", "revert_delay_ms")? {
            if ms < 0.0 || !ms.is_finite() {
                return Err(ConfigError::UnknownValue {
                    key: "revert_delay_ms".into(),
                    value: ms.to_string(),
                });
            }
            config.revert_delay = Duration::from_millis(ms as u64);
        }

        if let Some(prefix) = table.get("class_prefix") {
            let prefix = prefix.as_str().ok_or_else(|| ConfigError::WrongType {
                key: "class_prefix".into(),
                expected: "a string",
            })?;
            config.html_format = if prefix.is_empty() {
                HtmlFormat::ClassNames
            } else {
                HtmlFormat::ClassNamesWithPrefix(prefix.to_string())
            };
        }

        if let Some(indent) = read_table(&table, "indent")? {
            let mut mode = config.indent.mode.as_str().to_string();
            read_string(indent, "indent.", "mode", &mut mode)?;
            config.indent.mode =
                IndentMode::from_name(&mode).ok_or_else(|| ConfigError::UnknownValue {
                    key: "indent.mode".into(),
                    value: mode.clone(),
                })?;
            if let Some(unit) = read_number(indent, "indent.", "unit_per_tab")? {
                config.indent.unit_per_tab = unit;
            }
        }

        if let Some(captions) = read_table(&table, "captions")? {
            read_string(captions, "captions.", "copy", &mut config.captions.copy)?;
            read_string(captions, "captions.", "copied", &mut config.captions.copied)?;
            read_string(captions, "captions.", "error", &mut config.captions.error)?;
            read_string(captions, "captions.", "title", &mut config.captions.title)?;
        }

        Ok(config)
    }

    /// Class prefix used for highlight spans, if the format is class based.
    pub fn class_prefix(&self) -> Option<&str> {
        match &self.html_format {
            HtmlFormat::ClassNamesWithPrefix(prefix) => Some(prefix),
            HtmlFormat::ClassNames => Some(""),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_defaults() {
        let config = DecorateConfig::default();
        assert_eq!(config.block_selector, ".code-block");
        assert_eq!(config.line_source, LineSource::LineElements);
        assert_eq!(config.placeholder, "\u{200b}");
        assert_eq!(config.indent.unit_per_tab, 36.0);
        assert_eq!(config.indent.mode, IndentMode::PixelsToPoints);
        assert_eq!(config.revert_delay, Duration::from_secs(2));
        assert_eq!(config.captions.copied, "Скопировано!");
        assert_eq!(config.class_prefix(), Some("hljs"));
    }

    #[test]
    fn test_full_toml() {
        let config = DecorateConfig::from_toml_str(indoc! {r##"
            block_selector = "div.listing"
            line_source = "code"
            placeholder = " "
            error_background = "#ff0000"
            revert_delay_ms = 500
            class_prefix = "tok"

            [indent]
            mode = "direct-sum"
            unit_per_tab = 48

            [captions]
            copy = "Copy"
            copied = "Copied!"
            error = "Failed"
            title = "Copy code"

            [unrelated]
            ignored = true
        "##})
        .unwrap();

        assert_eq!(config.block_selector, "div.listing");
        assert_eq!(config.line_source, LineSource::CodeElements);
        assert_eq!(config.placeholder, " ");
        assert_eq!(config.error_background, "#ff0000");
        assert_eq!(config.revert_delay, Duration::from_millis(500));
        assert_eq!(config.html_format, HtmlFormat::ClassNamesWithPrefix("tok".into()));
        assert_eq!(config.indent.mode, IndentMode::DirectSum);
        assert_eq!(config.indent.unit_per_tab, 48.0);
        assert_eq!(config.captions.copy, "Copy");
        assert_eq!(config.captions.title, "Copy code");
        assert_eq!(config.button_class, "copy-btn");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(
            DecorateConfig::from_toml_str("").unwrap(),
            DecorateConfig::default()
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            DecorateConfig::from_toml_str("line_class = 3"),
            Err(ConfigError::WrongType { key, .. }) if key == "line_class"
        ));
        assert!(matches!(
            DecorateConfig::from_toml_str("[indent]\nmode = \"sideways\""),
            Err(ConfigError::UnknownValue { key, .. }) if key == "indent.mode"
        ));
        assert!(matches!(
            DecorateConfig::from_toml_str("captions = 1"),
            Err(ConfigError::WrongType { key, .. }) if key == "captions"
        ));
        assert!(matches!(
            DecorateConfig::from_toml_str("= broken"),
            Err(ConfigError::Parse(_))
        ));
    }
}
