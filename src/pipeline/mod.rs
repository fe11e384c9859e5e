//! Pipeline stages for prompt-to-pixel-art generation.
//!
//! ## Data Flow
//!
//! ```text
//! llm ──▶ extract ──▶ sanitize ──▶ compose
//! (text)  (candidates) (valid px)  (grid)
//! ```
//!
//! 1. [`llm`]      — the only async stage; asks the model and returns raw text
//! 2. [`extract`]  — ordered strategy chain recovering candidate records;
//!    its failure is the only fatal outcome of the pipeline
//! 3. [`sanitize`] — per-record type, color and range rules; never fails
//! 4. [`compose`]  — last-write-wins painting onto the 16×16 grid
//!
//! Stages 2–4 are synchronous, pure and stateless: [`run`] can be called on
//! any saved model answer without a provider.

pub mod compose;
pub mod extract;
pub mod llm;
pub mod sanitize;

use crate::error::PixelGenError;
use crate::output::{GenerationOutput, GenerationStats};
use tracing::debug;

/// Run extract → sanitize → compose on one model answer.
///
/// `min_pixels` is the soft minimum for the low-yield warning.
pub fn run(raw: &str, min_pixels: usize) -> Result<GenerationOutput, PixelGenError> {
    let extraction = extract::extract(raw)?;
    let candidates = extraction.candidates.len();

    let valid = sanitize::sanitize(&extraction.candidates);
    let dropped = candidates - valid.len();

    let composition = compose::compose(valid);
    let pixels = composition.pixels.len();
    debug!(
        "Pipeline: {} candidates, {} dropped, {} overwritten, {} pixels",
        candidates, dropped, composition.overwritten, pixels
    );

    let warning = compose::check_yield(pixels, min_pixels).map(|w| w.to_string());

    Ok(GenerationOutput {
        pixels: composition.pixels,
        grid: composition.grid,
        warning,
        stats: GenerationStats {
            strategy: Some(extraction.strategy),
            repaired: extraction.repaired,
            candidates,
            dropped,
            overwritten: composition.overwritten,
            pixels,
            ..Default::default()
        },
    })
}
