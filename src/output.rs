//! Output types returned by the pipeline orchestrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselOutput {
    /// The compiled HTML document (also persisted at `html_path`).
    pub html: String,

    /// Raw PDF bytes, identical to the file at `pdf_path`.
    ///
    /// Skipped in JSON output — callers wanting the bytes read the field or
    /// the file, not a megabyte of base64.
    #[serde(skip)]
    pub pdf_bytes: Vec<u8>,

    /// Where the HTML artifact was written (`<base>_carousel.html`).
    pub html_path: PathBuf,

    /// Where the PDF artifact was written (`<base>_carousel.pdf`).
    pub pdf_path: PathBuf,

    /// Run statistics.
    pub stats: CarouselStats,
}

/// Statistics about a conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselStats {
    /// Content slides produced by generation/validation (closing page excluded).
    pub content_slides: usize,

    /// Total pages in the output document (content slides + closing page).
    pub page_count: usize,

    /// True when the generator was unavailable or returned garbage and the
    /// basic fallback slide list was used instead.
    pub used_fallback_content: bool,

    /// Which rendering strategy produced the PDF ("in-process" or "subprocess").
    pub render_strategy: String,

    /// Wall-clock duration of the whole run, in milliseconds.
    pub total_duration_ms: u64,

    /// Time spent in slide generation (zero when the fallback was used
    /// without a network call).
    pub generate_duration_ms: u64,

    /// Time spent in the render driver, including any failed first attempt.
    pub render_duration_ms: u64,
}
