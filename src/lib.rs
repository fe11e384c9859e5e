//! # pixelprompt
//!
//! Turn a short text prompt into 16×16 pixel art using a language model, and
//! survive whatever the model actually answers.
//!
//! The model is asked for a JSON array of `{hexCode, column, row}` records.
//! What comes back is untrusted text: fenced, chatty, truncated, with trailing
//! commas, white pixels and coordinates off the canvas. This crate's job is to
//! turn that text into a bounded, validated grid.
//!
//! ## Pipeline Overview
//!
//! ```text
//! prompt
//!  │
//!  ├─ 1. Model     one chat completion via edgequake-llm (retry + timeout)
//!  ├─ 2. Extract   fenced parse → bracket span (+repair) → raw parse → pattern scan
//!  ├─ 3. Sanitize  type checks, drop white / malformed colors, clamp to 0..=15
//!  └─ 4. Compose   last write wins on duplicate cells → PixelGrid
//! ```
//!
//! Only three things end a request: an empty prompt, a missing provider
//! configuration, and model output with no recoverable pixel data (plus
//! transport failures of the model call itself). Everything else degrades to
//! fewer pixels and, below a soft minimum, a warning.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixelprompt::{generate_pixels_from_prompt, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = GenerationConfig::default();
//!     let art = generate_pixels_from_prompt("a yellow duck", &config).await?;
//!     if let Some(w) = &art.warning {
//!         eprintln!("warning: {w}");
//!     }
//!     println!("{} pixels", art.pixels.len());
//!     Ok(())
//! }
//! ```
//!
//! Already have a model answer? No provider needed:
//!
//! ```rust
//! use pixelprompt::{process_response, GenerationConfig};
//!
//! let raw = "```json\n[{\"hexCode\":\"#FF0000\",\"column\":7,\"row\":7}]\n```";
//! let art = process_response(raw, &GenerationConfig::default()).unwrap();
//! assert_eq!(art.grid.get(7, 7), Some("#FF0000"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pixelprompt` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, DEFAULT_MODEL};
pub use error::{DropReason, ErrorKind, PixelGenError};
pub use export::write_png;
pub use generate::{
    generate_batch, generate_pixels_from_prompt, generate_sync, generate_to_png,
    process_response, BatchItem,
};
pub use output::{
    GenerationOutput, GenerationStats, GenerationWarning, PixelGrid, ValidPixel, BACKGROUND_HEX,
    GRID_SIZE,
};
pub use pipeline::extract::{extract, CandidatePixel, Extraction, Strategy};
pub use pipeline::sanitize::sanitize;
pub use pipeline::compose::{compose, Composition};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
