//! Error types for the md2carousel library.
//!
//! The taxonomy follows the three user-visible failure classes, which must
//! stay distinguishable because remediation differs for each:
//!
//! * **Input errors** — the source file is missing or unreadable. Fatal; the
//!   pipeline never starts.
//! * **Generation errors** — the slide generator is unavailable or returned
//!   garbage. These are *not* surfaced as `Err`: the pipeline substitutes the
//!   minimal fallback slide list and continues. They exist here only so the
//!   generator module can report *why* it degraded.
//! * **Render errors** — both rendering strategies failed. Surfaced to the
//!   caller as `Err`, but the compiled HTML artifact is already on disk, so
//!   the condition is recoverable by retry.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2carousel library.
///
/// Generation failures never appear here — they degrade to the fallback
/// slide list inside the pipeline (see [`crate::pipeline::generate`]).
#[derive(Debug, Error)]
pub enum CarouselError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source markdown file was not found at the given path.
    #[error("Markdown file not found: '{}'\nCheck the path exists and is readable.", path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the source file.
    #[error("Permission denied reading '{}'\nTry: chmod +r '{}'", path.display(), path.display())]
    PermissionDenied { path: PathBuf },

    /// The source file exists but could not be read as UTF-8 text.
    #[error("Failed to read '{}': {detail}", path.display())]
    UnreadableInput { path: PathBuf, detail: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// Every rendering strategy failed; no PDF was produced.
    ///
    /// `html_path` points at the compiled document, which survives the
    /// failure so the caller can inspect it or retry the render alone.
    #[error(
        "PDF generation failed after trying {attempts} strategies: {detail}\n\
         The compiled HTML was kept at '{}'.\n\
         Check that a Chrome/Chromium binary is installed and on PATH.",
        html_path.display()
    )]
    RenderFailed {
        attempts: usize,
        detail: String,
        html_path: PathBuf,
    },

    /// The subprocess rendering worker exceeded its wait ceiling.
    #[error("Render worker timed out after {secs}s and was killed")]
    RenderTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the compiled HTML or the output PDF.
    #[error("Failed to write artifact '{}': {source}", path.display())]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of the generative collaborator.
///
/// Produced by [`crate::pipeline::generate`] when the slide generator cannot
/// be used; callers log it and fall back to the basic slide list rather than
/// aborting the conversion.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// No API key was configured; the generator was never called.
    #[error("No API key configured — set OPENAI_API_KEY or pass one explicitly")]
    NoApiKey,

    /// The HTTP request itself failed (network, timeout, non-2xx status).
    #[error("Generator request failed: {0}")]
    RequestFailed(String),

    /// The response body contained no recognisable JSON slide array.
    #[error("Generator response is not a JSON slide array: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_failed_display_keeps_html_path() {
        let e = CarouselError::RenderFailed {
            attempts: 2,
            detail: "browser launch failed".into(),
            html_path: PathBuf::from("report_carousel.html"),
        };
        let msg = e.to_string();
        assert!(msg.contains("2 strategies"), "got: {msg}");
        assert!(msg.contains("report_carousel.html"), "got: {msg}");
    }

    #[test]
    fn render_timeout_display() {
        let e = CarouselError::RenderTimeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn generation_error_display() {
        let e = GenerationError::MalformedResponse("no array found".into());
        assert!(e.to_string().contains("no array found"));
        assert!(GenerationError::NoApiKey.to_string().contains("OPENAI_API_KEY"));
    }
}
