//! The conversion pipeline, one module per stage:
//!
//! ```text
//! input ──▶ generate ──▶ validate ──▶ compile ──▶ render
//!  read      AI slide     schema       HTML        headless
//!  source    JSON (or     coercion     markup      browser
//!  file      fallback)    + repair     + styles    PDF
//! ```
//!
//! Stages are deliberately independent: `validate` and `compile` are pure
//! functions over their inputs, `generate` degrades to a deterministic
//! fallback instead of failing, and only `input` and `render` touch the
//! outside world. The orchestrator in [`crate::carousel`] wires them up.

pub mod compile;
pub mod generate;
pub mod input;
pub mod render;
pub mod validate;
