//! Result types: pixels, the composed grid, warnings and statistics.

use crate::pipeline::extract::Strategy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of the canvas in cells.
pub const GRID_SIZE: usize = 16;

/// Total number of cells on the canvas.
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;

/// Largest valid row or column index.
pub const MAX_COORD: u8 = (GRID_SIZE - 1) as u8;

/// Color of every unset cell. Never emitted as a pixel.
pub const BACKGROUND_HEX: &str = "#FFFFFF";

/// A sanitized pixel: a color on an in-range cell.
///
/// `hex_code` is always `#` plus six hex digits in the case the model used;
/// `column` and `row` are always within `0..=15`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidPixel {
    #[serde(rename = "hexCode")]
    pub hex_code: String,
    pub column: u8,
    pub row: u8,
}

impl ValidPixel {
    pub fn new(hex_code: impl Into<String>, column: u8, row: u8) -> Self {
        Self {
            hex_code: hex_code.into(),
            column,
            row,
        }
    }
}

/// The 16×16 canvas after duplicate resolution, indexed by (row, column).
///
/// Only the compositor paints cells; once handed out a grid is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelGrid {
    cells: [[Option<String>; GRID_SIZE]; GRID_SIZE],
}

impl PixelGrid {
    pub(crate) fn paint(&mut self, pixel: &ValidPixel) -> Option<String> {
        self.cells[pixel.row as usize][pixel.column as usize].replace(pixel.hex_code.clone())
    }

    /// Color of the cell, or `None` for background (also for out-of-range indices).
    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.cells.get(row)?.get(column)?.as_deref()
    }

    /// Color to draw for the cell, substituting [`BACKGROUND_HEX`] for unset cells.
    pub fn color_at(&self, row: usize, column: usize) -> &str {
        self.get(row, column).unwrap_or(BACKGROUND_HEX)
    }

    pub fn is_set(&self, row: usize, column: usize) -> bool {
        self.get(row, column).is_some()
    }

    /// Number of non-background cells.
    pub fn set_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>; GRID_SIZE]> {
        self.cells.iter()
    }

    /// Set cells in row-major order as `(row, column, color)`.
    pub fn iter_set(&self) -> impl Iterator<Item = (usize, usize, &str)> {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| cell.as_deref().map(|hex| (r, c, hex)))
        })
    }
}

/// Advisory conditions attached to a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationWarning {
    /// Fewer pixels survived sanitization than the configured soft minimum.
    LowYield { count: usize, minimum: usize },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationWarning::LowYield { count, minimum } => write!(
                f,
                "Very few pixels generated ({count} < {minimum}); the model output may be malformed"
            ),
        }
    }
}

/// Per-request counters and timings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Strategy that recovered the candidate records.
    pub strategy: Option<Strategy>,
    /// True when the bracket-span text needed repairs before it parsed.
    pub repaired: bool,
    /// Records recovered by extraction.
    pub candidates: usize,
    /// Records discarded by the sanitizer.
    pub dropped: usize,
    /// Valid records whose cell was later painted again.
    pub overwritten: usize,
    /// Pixels in the final list (equals set cells in the grid).
    pub pixels: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub retries: u32,
    pub duration_ms: u64,
}

/// Everything produced for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Deduplicated pixels, one per set cell.
    pub pixels: Vec<ValidPixel>,
    /// The composed canvas.
    pub grid: PixelGrid,
    /// Human-readable advisory, e.g. for a low pixel count.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warning: Option<String>,
    pub stats: GenerationStats,
}
