//! codeblock CLI - pre-render highlighted code blocks into static HTML.

use anyhow::{Context, Result, bail};
use codeblock::DecorateConfig;
use codeblock::highlight::{BuiltinProvider, GrammarProvider};
use codeblock_cli::{ProcessOptions, Processor};
use facet::Facet;
use facet_args as args;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Wrap code sections, highlight code blocks and add copy buttons in a directory of HTML files.
///
/// Blocks decorated here are tagged so the browser script only binds their copy buttons.
#[derive(Debug, Facet)]
struct Args {
    /// Input directory containing the HTML files
    #[facet(args::positional)]
    input: PathBuf,

    /// Output directory (defaults to modifying input in place)
    #[facet(args::positional, default)]
    output: Option<PathBuf>,

    /// TOML file with decoration settings
    #[facet(args::named, args::short = 'c', default)]
    config: Option<PathBuf>,

    /// Stylesheet to append highlighting rules to, relative to the output directory
    #[facet(args::named, args::short = 's', default)]
    stylesheet: Option<PathBuf>,

    /// Highlight every block as this language instead of auto-detecting
    #[facet(args::named, args::short = 'l', default)]
    language: Option<String>,

    /// Leave START_CODE_SECTION/END_CODE_SECTION paragraphs alone
    #[facet(args::named, default)]
    no_sections: bool,

    /// Show verbose output
    #[facet(args::named, args::short = 'v', default)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DecorateConfig> {
    let Some(path) = path else {
        return Ok(DecorateConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    DecorateConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn main() {
    let args: Args = facet_args::from_std_args().unwrap_or_else(|e| {
        if let Some(text) = e.help_text() {
            eprintln!("{text}");
        } else {
            eprintln!("{:?}", e);
        }
        std::process::exit(1);
    });

    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if !args.input.exists() {
        bail!("Input directory does not exist: {}", args.input.display());
    }

    if !args.input.is_dir() {
        bail!("Input path is not a directory: {}", args.input.display());
    }

    let config = load_config(args.config.as_ref())?;

    if let Some(language) = &args.language
        && !BuiltinProvider::new().supports(language)
    {
        bail!(
            "Unknown language: {}. Known languages: {}",
            language,
            BuiltinProvider::new().languages().join(", ")
        );
    }

    let options = ProcessOptions {
        input_dir: args.input.clone(),
        output_dir: args.output.clone(),
        config,
        language: args.language.clone(),
        stylesheet: args.stylesheet.clone(),
        wrap_sections: !args.no_sections,
    };

    let mut processor = Processor::new(options);

    eprintln!(
        "{} Processing HTML: {}",
        "codeblock".green().bold(),
        args.input.display()
    );

    if let Some(out) = &args.output {
        eprintln!("  Output: {}", out.display());
    } else {
        eprintln!("  {} Modifying in place", "Note:".yellow());
    }

    eprintln!();

    let start = Instant::now();
    let stats = processor.process()?;
    let elapsed = start.elapsed();

    eprintln!("{}", "Results:".bold());
    eprintln!(
        "  {} HTML files processed ({} changed)",
        stats.files_processed.to_string().cyan(),
        stats.files_changed.to_string().cyan()
    );
    eprintln!(
        "  {} code sections wrapped",
        stats.sections_wrapped.to_string().green()
    );
    eprintln!(
        "  {} code blocks decorated ({} as plain text)",
        stats.blocks_decorated.to_string().green(),
        stats.plain_blocks
    );
    eprintln!(
        "  {} code blocks already decorated",
        stats.blocks_skipped.to_string().yellow()
    );

    if !stats.languages.is_empty() {
        eprintln!("  Languages: {}", stats.languages.join(", "));
    }

    if let Some(css_path) = &stats.css_file_modified {
        eprintln!("  {} CSS patched: {}", "✓".green(), css_path.display());
    }

    if !stats.failures.is_empty() {
        eprintln!(
            "\n  {} {} files failed",
            "Note:".yellow(),
            stats.failures.len()
        );
        for (path, reason) in &stats.failures {
            eprintln!("    {}: {}", path.display(), reason);
        }
    }

    eprintln!(
        "\n  Completed in {:.2}s ({:.1} MB/s, HTML grew {:.2}x)",
        elapsed.as_secs_f64(),
        stats.throughput_mb_s(),
        stats.html_inflation_ratio()
    );

    Ok(())
}
