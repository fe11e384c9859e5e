//! Sanitization: turn untrusted candidate records into [`ValidPixel`]s.
//!
//! This is a best-effort filter, not a validating parser. Every record is
//! judged on its own; a bad record is dropped (and logged at `debug`) while
//! the rest keep flowing. [`sanitize`] never fails.
//!
//! Rules, in order:
//! 1. `hexCode` must be a string, `column` and `row` must be JSON numbers
//! 2. the color is compared case-insensitively
//! 3. background white (`#FFFFFF`, `#FFF`) is dropped
//! 4. anything that is not `#RRGGBB` is dropped
//! 5. coordinates are truncated toward zero, then clamped into `0..=15`
//!
//! Out-of-range coordinates are salvaged rather than discarded: a pixel pushed
//! onto the border is closer to what the model meant than a missing one.

use crate::error::DropReason;
use crate::output::{ValidPixel, MAX_COORD};
use crate::pipeline::extract::CandidatePixel;
use serde_json::Value;
use tracing::debug;

/// Sanitize every candidate, keeping input order and dropping the invalid ones.
pub fn sanitize(candidates: &[CandidatePixel]) -> Vec<ValidPixel> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(idx, candidate)| match sanitize_record(candidate) {
            Ok(pixel) => Some(pixel),
            Err(reason) => {
                debug!("Sanitize: dropped record {}: {}", idx, reason);
                None
            }
        })
        .collect()
}

/// Judge a single candidate.
pub fn sanitize_record(candidate: &CandidatePixel) -> Result<ValidPixel, DropReason> {
    let hex = match &candidate.hex_code {
        None => return Err(DropReason::MissingField("hexCode")),
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(DropReason::WrongType("hexCode")),
    };
    let column = number_field(candidate.column.as_ref(), "column")?;
    let row = number_field(candidate.row.as_ref(), "row")?;

    if is_background(hex) {
        return Err(DropReason::Background);
    }
    if !is_hex_color(hex) {
        return Err(DropReason::MalformedColor);
    }

    Ok(ValidPixel {
        hex_code: hex.to_string(),
        column: clamp_coordinate(column),
        row: clamp_coordinate(row),
    })
}

fn number_field(value: Option<&Value>, name: &'static str) -> Result<f64, DropReason> {
    match value {
        None => Err(DropReason::MissingField(name)),
        Some(Value::Number(n)) => n.as_f64().ok_or(DropReason::WrongType(name)),
        Some(_) => Err(DropReason::WrongType(name)),
    }
}

/// True for the background white in either the 6- or 3-digit form.
pub fn is_background(hex: &str) -> bool {
    let upper = hex.trim().to_ascii_uppercase();
    upper == "#FFFFFF" || upper == "#FFF"
}

/// True for `#` followed by exactly six hex digits.
pub fn is_hex_color(hex: &str) -> bool {
    hex.len() == 7
        && hex.starts_with('#')
        && hex[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Truncate toward zero, then clamp into `0..=15`.
///
/// `17.8` → 15, `-3` → 0, `4.9` → 4.
pub fn clamp_coordinate(value: f64) -> u8 {
    // `as` saturates, and maps NaN to 0.
    value.trunc().clamp(0.0, f64::from(MAX_COORD)) as u8
}
