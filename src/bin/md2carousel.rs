//! CLI binary for md2carousel.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CarouselConfig` and prints results. Also hosts the hidden render-worker
//! mode used by the subprocess rendering strategy.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2carousel::pipeline::render;
use md2carousel::{convert, CarouselConfig, CarouselError, RenderStrategy};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes report_carousel.html and report_carousel.pdf
  # next to the input)
  md2carousel report.md

  # Without an API key: deterministic fallback slides, still a full carousel
  md2carousel report.md

  # Use a specific model
  md2carousel --model gpt-4o-mini report.md

  # Pin the rendering strategy (skip the fallback chain)
  md2carousel --strategy subprocess report.md

  # Point at a specific Chrome/Chromium binary
  md2carousel --chrome /usr/bin/chromium report.md

  # Machine-readable run report
  md2carousel --json report.md > run.json

OUTPUT:
  Every run produces two artifacts next to the input file:
    <base>_carousel.html   the compiled slide document (kept on render failure)
    <base>_carousel.pdf    1080x1080 pages, one per slide, plus a closing page

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key for slide generation (optional)
  OPENAI_API_BASE         Override the chat-completions endpoint
  MD2CAROUSEL_MODEL       Override the model ID
  MD2CAROUSEL_CHROME      Path to a Chrome/Chromium executable

SETUP:
  1. Install Chrome or Chromium (any recent headless-capable build).
  2. Optionally: export OPENAI_API_KEY=sk-...
  3. Convert:   md2carousel document.md
"#;

/// Convert markdown documents into LinkedIn carousel PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "md2carousel",
    version,
    about = "Convert markdown documents into LinkedIn carousel PDFs",
    long_about = "Convert a markdown document into a square LinkedIn carousel: an AI-generated \
slide deck compiled to styled HTML and rendered to a 1080x1080 PDF through a headless browser. \
Works without an API key by falling back to a deterministic basic slide list.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert.
    input: PathBuf,

    /// Chat model ID for slide generation.
    #[arg(long, env = "MD2CAROUSEL_MODEL", default_value = "gpt-4o")]
    model: String,

    /// API key for slide generation. Without it the basic fallback slides
    /// are used.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Source characters kept for the generation prompt.
    #[arg(long, env = "MD2CAROUSEL_MAX_CHARS", default_value_t = 3000)]
    max_content_chars: usize,

    /// Paint-settle delay after page load, in milliseconds.
    #[arg(long, env = "MD2CAROUSEL_SETTLE_MS", default_value_t = 3000)]
    settle_delay: u64,

    /// Wait ceiling per render attempt, in seconds.
    #[arg(long, env = "MD2CAROUSEL_RENDER_TIMEOUT", default_value_t = 60)]
    render_timeout: u64,

    /// Pin a rendering strategy instead of the platform default chain.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Path to a Chrome/Chromium executable.
    #[arg(long, env = "MD2CAROUSEL_CHROME")]
    chrome: Option<PathBuf>,

    /// Output a structured JSON run report instead of the summary.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    InProcess,
    Subprocess,
}

impl From<StrategyArg> for RenderStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::InProcess => RenderStrategy::InProcess,
            StrategyArg::Subprocess => RenderStrategy::Subprocess,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── Worker mode ──────────────────────────────────────────────────────
    // The subprocess rendering strategy re-executes this binary with a
    // hidden flag. Intercept it before clap sees the argument list.
    let argv: Vec<String> = std::env::args().collect();
    if argv.get(1).map(String::as_str) == Some(render::WORKER_FLAG) {
        return run_worker_mode(&argv).await;
    }

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // summary at the end carries everything the user needs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder = CarouselConfig::builder()
        .model(&cli.model)
        .max_content_chars(cli.max_content_chars)
        .settle_delay_ms(cli.settle_delay)
        .render_timeout_secs(cli.render_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(strategy) = cli.strategy {
        builder = builder.strategy(strategy.into());
    }
    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_executable(chrome.clone());
    }

    let config = builder.build().context("Invalid configuration")?;

    if cli.api_key.is_none() && !cli.quiet {
        eprintln!(
            "{} No API key set — using basic fallback slides. \
             Set OPENAI_API_KEY for AI-generated content.",
            cyan("◆")
        );
    }

    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message(cli.input.display().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = convert(&cli.input, &config).await;
    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }

    let output = match result {
        Ok(output) => output,
        Err(CarouselError::RenderFailed {
            attempts,
            detail,
            html_path,
        }) => {
            eprintln!(
                "{} PDF generation failed after {attempts} attempt(s): {detail}",
                red("✘")
            );
            eprintln!(
                "   The HTML document was kept at {} — convert it manually \
                 with any browser's print-to-PDF.",
                bold(&html_path.display().to_string())
            );
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Conversion failed"),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        if output.stats.used_fallback_content {
            eprintln!("{} AI generation unavailable, using basic output", cyan("⚠"));
        }
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            bold(&output.stats.page_count.to_string()),
            output.stats.total_duration_ms,
            bold(&output.pdf_path.display().to_string()),
        );
        eprintln!(
            "   {}  {}",
            dim(&format!("render: {}", output.stats.render_strategy)),
            dim(&format!("html: {}", output.html_path.display())),
        );
    }

    Ok(())
}

/// Render-worker entry: `md2carousel --render-worker <html> <pdf>`.
///
/// Stays silent on stdout; failures go to stderr and the exit status. The
/// parent judges success by the status plus a valid PDF at the output path.
async fn run_worker_mode(argv: &[String]) -> Result<()> {
    let (html, pdf) = match (argv.get(2), argv.get(3)) {
        (Some(h), Some(p)) => (PathBuf::from(h), PathBuf::from(p)),
        _ => {
            eprintln!("usage: md2carousel {} <html> <pdf>", render::WORKER_FLAG);
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(io::stderr)
        .init();

    render::run_worker(&html, &pdf)
        .await
        .context("render worker failed")?;
    Ok(())
}
