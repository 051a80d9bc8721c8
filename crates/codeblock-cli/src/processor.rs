//! Directory processor: wraps marker sections and decorates code blocks in
//! every HTML file of a tree.

use crate::html::{TransformError, TransformResult, transform_html_as};
use crate::sections::{END_MARKER, START_MARKER, SectionError, SectionStats, wrap_code_sections};
use codeblock::highlight::{BuiltinProvider, Highlighter};
use codeblock::{DecorateConfig, builtin_highlighter};
use codeblock_theme::css::{MARKER, stylesheet};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;
use walkdir::WalkDir;

/// Options for the processor.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Directory containing the HTML files.
    pub input_dir: PathBuf,
    /// Output directory (if None, modifies in place).
    pub output_dir: Option<PathBuf>,
    /// Decoration settings.
    pub config: DecorateConfig,
    /// Language forced on every block instead of auto-detection.
    pub language: Option<String>,
    /// Stylesheet to append highlighting rules to, relative to the output directory.
    pub stylesheet: Option<PathBuf>,
    /// Turn `START_CODE_SECTION`/`END_CODE_SECTION` paragraphs into code blocks first.
    pub wrap_sections: bool,
}

impl ProcessOptions {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: None,
            config: DecorateConfig::default(),
            language: None,
            stylesheet: None,
            wrap_sections: true,
        }
    }
}

/// Statistics from processing.
#[derive(Debug, Default)]
pub struct ProcessorStats {
    /// Number of HTML files read.
    pub files_processed: usize,
    /// Number of HTML files rewritten.
    pub files_changed: usize,
    /// Files that could not be processed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// Marker sections turned into code blocks.
    pub sections_wrapped: usize,
    /// Code blocks decorated.
    pub blocks_decorated: usize,
    /// Code blocks that were already decorated.
    pub blocks_skipped: usize,
    /// Decorated blocks rendered as plain text.
    pub plain_blocks: usize,
    /// Languages detected across all files, sorted.
    pub languages: Vec<&'static str>,
    /// Stylesheet that was patched.
    pub css_file_modified: Option<PathBuf>,
    /// Total bytes read from input HTML files.
    pub bytes_input: u64,
    /// Total bytes written to output HTML files.
    pub bytes_output: u64,
    /// Time spent processing HTML files (excludes clone time).
    pub process_duration: Duration,
}

impl ProcessorStats {
    /// Calculate HTML inflation ratio (output / input).
    pub fn html_inflation_ratio(&self) -> f64 {
        if self.bytes_input == 0 {
            1.0
        } else {
            self.bytes_output as f64 / self.bytes_input as f64
        }
    }

    /// Calculate processing throughput in MB/s (excludes clone time).
    pub fn throughput_mb_s(&self) -> f64 {
        let secs = self.process_duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            (self.bytes_input as f64 / (1024.0 * 1024.0)) / secs
        }
    }
}

/// What happened to one file.
#[derive(Debug, Default)]
struct FileOutcome {
    sections: SectionStats,
    transform: TransformResult,
    input_size: usize,
    output_size: usize,
    changed: bool,
}

/// Class name a selector like `.code-block` requires, for a cheap substring
/// check before parsing.
fn class_needle(selector: &str) -> Option<&str> {
    selector
        .strip_prefix('.')
        .filter(|class| {
            !class.is_empty()
                && class
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
        .map(|style| style.progress_chars("█▉▊▋▌▍▎▏  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Processor for a directory of HTML files.
pub struct Processor {
    options: ProcessOptions,
    progress: bool,
}

impl Processor {
    /// Create a new processor with the given options.
    pub fn new(options: ProcessOptions) -> Self {
        Self {
            options,
            progress: true,
        }
    }

    /// Hide progress bars and spinners.
    pub fn quiet(mut self) -> Self {
        self.progress = false;
        self
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if self.progress {
            ProgressBar::new(len)
        } else {
            ProgressBar::hidden()
        }
    }

    /// Process the directory.
    pub fn process(&mut self) -> Result<ProcessorStats, ProcessError> {
        // Determine the actual output directory
        let output_dir = self
            .options
            .output_dir
            .as_ref()
            .unwrap_or(&self.options.input_dir)
            .clone();

        if let Some(ref out) = self.options.output_dir
            && out != &self.options.input_dir
        {
            if out.exists() {
                fs::remove_dir_all(out)?;
            }

            let spinner = if self.progress {
                ProgressBar::new_spinner()
            } else {
                ProgressBar::hidden()
            };
            spinner.set_style(spinner_style());
            spinner.set_message("Cloning directory tree...");
            spinner.enable_steady_tick(Duration::from_millis(80));

            clonetree::clone_tree(&self.options.input_dir, out, &clonetree::Options::new())
                .map_err(|e| ProcessError::Io(std::io::Error::other(e.to_string())))?;

            spinner.finish_with_message("Clone complete");
        }

        let css_file_modified = match &self.options.stylesheet {
            Some(relative) => Some(self.patch_css(&output_dir.join(relative))?),
            None => None,
        };

        let html_files: Vec<PathBuf> = WalkDir::new(&output_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_type().is_file()
                    && e.path()
                        .extension()
                        .is_some_and(|ext| ext == "html" || ext == "htm")
            })
            .map(|e| e.path().to_path_buf())
            .collect();

        let progress = self.progress_bar(html_files.len() as u64);
        progress.set_style(bar_style());

        let process_start = Instant::now();

        let files_processed = AtomicUsize::new(0);
        let files_changed = AtomicUsize::new(0);
        let sections_wrapped = AtomicUsize::new(0);
        let blocks_decorated = AtomicUsize::new(0);
        let blocks_skipped = AtomicUsize::new(0);
        let plain_blocks = AtomicUsize::new(0);
        let bytes_input = AtomicUsize::new(0);
        let bytes_output = AtomicUsize::new(0);
        let languages = Mutex::new(Vec::<&'static str>::new());
        let failures = Mutex::new(Vec::<(PathBuf, String)>::new());

        let options = &self.options;

        // One highlighter per worker thread.
        html_files.par_iter().for_each_init(
            || builtin_highlighter(&options.config),
            |highlighter, path| {
                debug!(path = %path.display(), "processing");

                match Self::process_html_file(path, highlighter, options) {
                    Ok(outcome) => {
                        files_processed.fetch_add(1, Ordering::Relaxed);
                        if outcome.changed {
                            files_changed.fetch_add(1, Ordering::Relaxed);
                        }
                        sections_wrapped.fetch_add(outcome.sections.sections, Ordering::Relaxed);
                        blocks_decorated
                            .fetch_add(outcome.transform.blocks_decorated, Ordering::Relaxed);
                        blocks_skipped.fetch_add(outcome.transform.blocks_skipped, Ordering::Relaxed);
                        plain_blocks.fetch_add(outcome.transform.plain_blocks, Ordering::Relaxed);
                        bytes_input.fetch_add(outcome.input_size, Ordering::Relaxed);
                        bytes_output.fetch_add(outcome.output_size, Ordering::Relaxed);

                        if !outcome.transform.languages.is_empty() {
                            let mut seen = languages.lock().unwrap_or_else(PoisonError::into_inner);
                            for language in outcome.transform.languages {
                                if !seen.contains(&language) {
                                    seen.push(language);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        progress.println(format!(
                            "Warning: Failed to process {}: {}",
                            path.display(),
                            e
                        ));
                        failures
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push((path.clone(), e.to_string()));
                    }
                }
                progress.inc(1);
            },
        );

        let process_duration = process_start.elapsed();
        progress.finish_and_clear();

        let mut languages = languages.into_inner().unwrap_or_else(PoisonError::into_inner);
        languages.sort_unstable();
        let mut failures = failures.into_inner().unwrap_or_else(PoisonError::into_inner);
        failures.sort();

        Ok(ProcessorStats {
            files_processed: files_processed.load(Ordering::Relaxed),
            files_changed: files_changed.load(Ordering::Relaxed),
            failures,
            sections_wrapped: sections_wrapped.load(Ordering::Relaxed),
            blocks_decorated: blocks_decorated.load(Ordering::Relaxed),
            blocks_skipped: blocks_skipped.load(Ordering::Relaxed),
            plain_blocks: plain_blocks.load(Ordering::Relaxed),
            languages,
            css_file_modified,
            bytes_input: bytes_input.load(Ordering::Relaxed) as u64,
            bytes_output: bytes_output.load(Ordering::Relaxed) as u64,
            process_duration,
        })
    }

    /// Append the highlighting stylesheet to `css_path` unless it is already there.
    fn patch_css(&self, css_path: &Path) -> Result<PathBuf, ProcessError> {
        if !css_path.is_file() {
            return Err(ProcessError::CssPatch(format!(
                "stylesheet not found at {}",
                css_path.display()
            )));
        }

        let mut css_content = fs::read_to_string(css_path)?;
        if css_content.contains(MARKER) {
            return Ok(css_path.to_path_buf());
        }

        let prefix = self.options.config.class_prefix().unwrap_or("");
        if !css_content.is_empty() && !css_content.ends_with('\n') {
            css_content.push('\n');
        }
        css_content.push_str(&stylesheet(prefix));
        fs::write(css_path, css_content)?;

        Ok(css_path.to_path_buf())
    }

    fn process_html_file(
        path: &Path,
        highlighter: &mut Highlighter<BuiltinProvider>,
        options: &ProcessOptions,
    ) -> Result<FileOutcome, ProcessError> {
        let html = fs::read_to_string(path)?;
        let mut outcome = FileOutcome {
            input_size: html.len(),
            output_size: html.len(),
            ..Default::default()
        };

        let mut current = html;

        if options.wrap_sections && (current.contains(START_MARKER) || current.contains(END_MARKER))
        {
            let (wrapped, stats) = wrap_code_sections(&current)?;
            outcome.sections = stats;
            current = wrapped;
        }

        // Skip lol_html parsing entirely when the block class never appears.
        let may_have_blocks = class_needle(&options.config.block_selector)
            .is_none_or(|needle| current.contains(needle));
        if may_have_blocks {
            let (transformed, result) = transform_html_as(
                &current,
                highlighter,
                &options.config,
                options.language.as_deref(),
            )?;
            outcome.transform = result;
            current = transformed;
        }

        if outcome.sections.sections > 0 || outcome.transform.blocks_decorated > 0 {
            fs::write(path, &current)?;
            outcome.changed = true;
        }
        outcome.output_size = current.len();

        Ok(outcome)
    }
}

/// Errors that can occur during processing.
#[derive(Debug)]
pub enum ProcessError {
    /// IO error.
    Io(std::io::Error),
    /// HTML transformation error.
    Transform(TransformError),
    /// Marker section error.
    Sections(SectionError),
    /// CSS patching error.
    CssPatch(String),
}

impl From<std::io::Error> for ProcessError {
    fn from(e: std::io::Error) -> Self {
        ProcessError::Io(e)
    }
}

impl From<TransformError> for ProcessError {
    fn from(e: TransformError) -> Self {
        ProcessError::Transform(e)
    }
}

impl From<SectionError> for ProcessError {
    fn from(e: SectionError) -> Self {
        ProcessError::Sections(e)
    }
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::Io(e) => write!(f, "IO error: {}", e),
            ProcessError::Transform(e) => write!(f, "Transform error: {}", e),
            ProcessError::Sections(e) => write!(f, "Code section error: {}", e),
            ProcessError::CssPatch(msg) => write!(f, "CSS patch error: {}", msg),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Io(e) => Some(e),
            ProcessError::Transform(e) => Some(e),
            ProcessError::Sections(e) => Some(e),
            ProcessError::CssPatch(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_needle() {
        assert_eq!(class_needle(".code-block"), Some("code-block"));
        assert_eq!(class_needle("div.code-block"), None);
        assert_eq!(class_needle(".a .b"), None);
        assert_eq!(class_needle("."), None);
    }

    #[test]
    fn test_stats_ratios() {
        let stats = ProcessorStats {
            bytes_input: 100,
            bytes_output: 250,
            ..Default::default()
        };
        assert_eq!(stats.html_inflation_ratio(), 2.5);
        assert_eq!(stats.throughput_mb_s(), 0.0);
        assert_eq!(ProcessorStats::default().html_inflation_ratio(), 1.0);
    }
}
