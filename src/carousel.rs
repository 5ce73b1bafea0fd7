//! Pipeline orchestrator: one markdown file in, two artifacts out.

use crate::config::CarouselConfig;
use crate::error::CarouselError;
use crate::output::{CarouselOutput, CarouselStats};
use crate::pipeline::{compile, generate, input, render, validate};
use crate::slide::Slide;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Convert a markdown document into a LinkedIn carousel PDF.
///
/// Runs the full pipeline: read the source, generate slide content (falling
/// back to a deterministic basic slide list when the generator is
/// unavailable), validate and coerce the slide JSON, compile the HTML
/// document, persist it next to the input as `<base>_carousel.html`, then
/// render `<base>_carousel.pdf` through the headless-browser driver.
///
/// The HTML artifact is written before rendering starts, so a render failure
/// still leaves a usable document behind for manual conversion.
///
/// # Example
/// ```rust,no_run
/// use md2carousel::{convert, CarouselConfig};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CarouselConfig::builder()
///     .api_key(std::env::var("OPENAI_API_KEY")?)
///     .build()?;
/// let output = convert("whitepaper.md", &config).await?;
/// println!("wrote {}", output.pdf_path.display());
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    input_path: impl AsRef<Path>,
    config: &CarouselConfig,
) -> Result<CarouselOutput, CarouselError> {
    let total_start = Instant::now();
    let source = input::read_source(input_path).await?;
    info!(
        "Read {} chars from '{}'",
        source.text.len(),
        source.path.display()
    );

    // Generation is a soft stage. Every failure mode here degrades to the
    // basic slide list; only IO and rendering can abort the run.
    let generate_start = Instant::now();
    let fallback_title = source.fallback_title();
    let (mut slides, used_fallback) = match generate::generate_slides(&source.text, config).await {
        Ok(raw) => {
            let validated = validate::validate_slides(&raw, &fallback_title);
            // The validator answers batch-level garbage with the fallback
            // list; detect that so the stats stay honest.
            let degraded = validated == validate::fallback_slides(&fallback_title);
            (validated, degraded)
        }
        Err(e) => {
            warn!("AI generation unavailable, using basic output: {e}");
            (validate::fallback_slides(&fallback_title), true)
        }
    };
    let generate_duration_ms = generate_start.elapsed().as_millis() as u64;

    // Exactly one closing page, always last, regardless of what the
    // generator produced.
    slides.retain(|s| !s.is_final());
    let content_slides = slides.len();
    slides.push(Slide::closing());
    info!(
        "Document has {content_slides} content slides plus the closing page{}",
        if used_fallback { " (fallback content)" } else { "" }
    );

    let html = compile::compile_document(&slides);
    let html_path = source.html_path();
    tokio::fs::write(&html_path, &html)
        .await
        .map_err(|e| CarouselError::ArtifactWriteFailed {
            path: html_path.clone(),
            source: e,
        })?;
    info!("Wrote HTML artifact to '{}'", html_path.display());

    let pdf_path = source.pdf_path();
    let render_start = Instant::now();
    let report = render::render_pdf(&html_path, &pdf_path, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Wrote PDF artifact to '{}'", pdf_path.display());

    Ok(CarouselOutput {
        html,
        pdf_bytes: report.pdf_bytes,
        html_path,
        pdf_path,
        stats: CarouselStats {
            content_slides,
            page_count: content_slides + 1,
            used_fallback_content: used_fallback,
            render_strategy: report.strategy.name().to_string(),
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            generate_duration_ms,
            render_duration_ms,
        },
    })
}

/// Blocking wrapper around [`convert`] for callers without a runtime.
///
/// Must not be called from within an async context; it creates its own
/// multi-thread runtime for the duration of the conversion.
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    config: &CarouselConfig,
) -> Result<CarouselOutput, CarouselError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CarouselError::Internal(format!("failed to create runtime: {e}")))?;
    runtime.block_on(convert(input_path, config))
}
