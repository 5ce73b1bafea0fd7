//! Configuration for a carousel conversion.
//!
//! Every knob lives in [`CarouselConfig`], built via its builder. One struct
//! keeps configs trivially cloneable across the pipeline stages and easy to
//! diff between two runs when their outputs differ.

use crate::error::CarouselError;
use crate::pipeline::generate::SlideGenerator;
use crate::pipeline::render::RenderStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Output page geometry in CSS pixels.
///
/// The publishing platform requires every page of the uploaded document to be
/// exactly square, so the default never changes in practice; the type exists
/// so the geometry flows through one value instead of scattered literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    /// The carousel contract: 1080 × 1080 CSS pixels, zero margins.
    pub const SQUARE_1080: PageSize = PageSize {
        width: 1080,
        height: 1080,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::SQUARE_1080
    }
}

/// Configuration for one markdown-to-carousel conversion.
///
/// Built via [`CarouselConfig::builder()`] or [`CarouselConfig::default()`].
///
/// # Example
/// ```rust
/// use md2carousel::CarouselConfig;
///
/// let config = CarouselConfig::builder()
///     .model("gpt-4o")
///     .settle_delay_ms(1500)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CarouselConfig {
    /// API key for the generative collaborator. `None` means the generator is
    /// skipped entirely and the fallback slide list is used — an explicit
    /// degrade branch, not an error.
    pub api_key: Option<String>,

    /// Chat model identifier. Default: "gpt-4o".
    pub model: String,

    /// Sampling temperature for slide generation. Default: 0.7.
    ///
    /// Slide copy benefits from some variation; this is content writing, not
    /// transcription.
    pub temperature: f32,

    /// Maximum tokens the generator may produce. Default: 4096.
    pub max_tokens: usize,

    /// Source text is truncated to this many characters before being embedded
    /// in the prompt. Default: 3000.
    ///
    /// Leaves room for the structural prompt and the response inside typical
    /// context windows. A truncation marker is appended when the cut happens.
    pub max_content_chars: usize,

    /// Per-call timeout for the generator HTTP request, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Pre-constructed slide generator. Takes precedence over `api_key`;
    /// used by tests and by callers that need custom middleware.
    pub generator: Option<Arc<dyn SlideGenerator>>,

    /// Output page geometry. Default: [`PageSize::SQUARE_1080`].
    pub page_size: PageSize,

    /// Device pixel density for the headless browser viewport. Default: 2.0.
    ///
    /// Raster content inside the PDF is captured at double density so text
    /// stays sharp when the platform re-rasterises the upload.
    pub device_scale_factor: f64,

    /// Fixed delay after the navigation settles, in milliseconds. Default: 3000.
    ///
    /// Fonts and the brand images finish painting after network idle; the PDF
    /// capture waits this long on top of the load signal.
    pub settle_delay_ms: u64,

    /// Bound on navigation plus network-idle wait, in seconds. Default: 30.
    ///
    /// A malformed document must not hang the pipeline indefinitely.
    pub navigation_timeout_secs: u64,

    /// Wait ceiling per rendering strategy attempt, in seconds. Default: 60.
    ///
    /// Applies to the subprocess worker as a hard kill timeout and to the
    /// in-process path as an overall bound.
    pub render_timeout_secs: u64,

    /// Explicit Chrome/Chromium executable. `None` lets the automation layer
    /// discover one on PATH.
    pub chrome_executable: Option<PathBuf>,

    /// Pin a single rendering strategy instead of the platform policy's
    /// primary-then-fallback chain. Mostly a debugging aid.
    pub strategy: Option<RenderStrategy>,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            max_content_chars: 3000,
            api_timeout_secs: 120,
            generator: None,
            page_size: PageSize::default(),
            device_scale_factor: 2.0,
            settle_delay_ms: 3000,
            navigation_timeout_secs: 30,
            render_timeout_secs: 60,
            chrome_executable: None,
            strategy: None,
        }
    }
}

impl fmt::Debug for CarouselConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarouselConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_content_chars", &self.max_content_chars)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("generator", &self.generator.as_ref().map(|_| "<dyn SlideGenerator>"))
            .field("page_size", &self.page_size)
            .field("device_scale_factor", &self.device_scale_factor)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("chrome_executable", &self.chrome_executable)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl CarouselConfig {
    /// Create a new builder for `CarouselConfig`.
    pub fn builder() -> CarouselConfigBuilder {
        CarouselConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`CarouselConfig`].
#[derive(Debug)]
pub struct CarouselConfigBuilder {
    config: CarouselConfig,
}

impl CarouselConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_content_chars(mut self, n: usize) -> Self {
        self.config.max_content_chars = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn generator(mut self, gen: Arc<dyn SlideGenerator>) -> Self {
        self.config.generator = Some(gen);
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn device_scale_factor(mut self, dsf: f64) -> Self {
        self.config.device_scale_factor = dsf.clamp(1.0, 4.0);
        self
    }

    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.navigation_timeout_secs = secs.max(1);
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    pub fn strategy(mut self, strategy: RenderStrategy) -> Self {
        self.config.strategy = Some(strategy);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CarouselConfig, CarouselError> {
        let c = &self.config;
        if c.page_size.width == 0 || c.page_size.height == 0 {
            return Err(CarouselError::InvalidConfig(format!(
                "Page size must be non-zero, got {}x{}",
                c.page_size.width, c.page_size.height
            )));
        }
        if c.max_content_chars < 100 {
            return Err(CarouselError::InvalidConfig(
                "max_content_chars must be ≥ 100".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_carousel_contract() {
        let c = CarouselConfig::default();
        assert_eq!(c.page_size, PageSize::SQUARE_1080);
        assert_eq!(c.render_timeout_secs, 60);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn builder_rejects_zero_page() {
        let r = CarouselConfig::builder()
            .page_size(PageSize { width: 0, height: 1080 })
            .build();
        assert!(r.is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = CarouselConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("redacted"));
    }
}
