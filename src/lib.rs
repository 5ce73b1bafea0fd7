//! # md2carousel
//!
//! Convert markdown documents into square, brand-styled LinkedIn carousel
//! PDFs.
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │ markdown │──▶│ generate  │──▶│ validate  │──▶│ compile  │──▶│  render  │
//! │  source  │   │ AI slides │   │  schema   │   │   HTML   │   │ PDF via  │
//! │   file   │   │ (or basic │   │ coercion  │   │ document │   │ headless │
//! │          │   │ fallback) │   │           │   │          │   │ browser  │
//! └──────────┘   └───────────┘   └───────────┘   └──────────┘   └──────────┘
//! ```
//!
//! Each run produces two sibling artifacts next to the input:
//! `<base>_carousel.html` (the compiled document, kept even when rendering
//! fails) and `<base>_carousel.pdf` (one exactly-square 1080×1080 page per
//! slide plus a fixed closing page).
//!
//! The generative stage is optional: without an API key the pipeline
//! degrades to a deterministic basic slide list derived from the document's
//! first heading, and still produces both artifacts.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use md2carousel::{convert, CarouselConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CarouselConfig::builder()
//!     .api_key(std::env::var("OPENAI_API_KEY")?)
//!     .build()?;
//!
//! let output = convert("whitepaper.md", &config).await?;
//! println!(
//!     "{} pages via {} -> {}",
//!     output.stats.page_count,
//!     output.stats.render_strategy,
//!     output.pdf_path.display()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Synchronous callers use [`convert_sync`], which spins up its own runtime.

pub mod carousel;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod slide;

pub use carousel::{convert, convert_sync};
pub use config::{CarouselConfig, CarouselConfigBuilder, PageSize};
pub use error::{CarouselError, GenerationError};
pub use output::{CarouselOutput, CarouselStats};
pub use pipeline::generate::SlideGenerator;
pub use pipeline::render::RenderStrategy;
pub use slide::Slide;
