//! Composition: paint sanitized pixels onto the grid, last write wins.
//!
//! The pixel list is read as a sequence of drawing operations. When two
//! records target the same cell, the later one's color is the one that
//! shows. No record is rejected here; every sanitized coordinate fits.

use crate::output::{GenerationWarning, PixelGrid, ValidPixel, GRID_SIZE};
use tracing::warn;

/// The composed grid and the matching deduplicated pixel list.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// One pixel per set cell, carrying the winning color, in the order the
    /// winning records appeared in the input.
    pub pixels: Vec<ValidPixel>,
    pub grid: PixelGrid,
    /// Records whose cell was painted again by a later record.
    pub overwritten: usize,
}

/// Apply `pixels` in order onto an empty grid.
pub fn compose(pixels: Vec<ValidPixel>) -> Composition {
    let mut grid = PixelGrid::default();
    let mut winner: [[Option<usize>; GRID_SIZE]; GRID_SIZE] = [[None; GRID_SIZE]; GRID_SIZE];
    let mut overwritten = 0;

    for (idx, pixel) in pixels.iter().enumerate() {
        if grid.paint(pixel).is_some() {
            overwritten += 1;
        }
        winner[pixel.row as usize][pixel.column as usize] = Some(idx);
    }

    let mut keep = vec![false; pixels.len()];
    for idx in winner.iter().flatten().flatten() {
        keep[*idx] = true;
    }
    let pixels = pixels
        .into_iter()
        .zip(keep)
        .filter_map(|(pixel, kept)| kept.then_some(pixel))
        .collect();

    Composition {
        pixels,
        grid,
        overwritten,
    }
}

/// Flag a result with fewer than `minimum` pixels. Advisory only.
pub fn check_yield(pixel_count: usize, minimum: usize) -> Option<GenerationWarning> {
    if pixel_count >= minimum {
        return None;
    }
    let warning = GenerationWarning::LowYield {
        count: pixel_count,
        minimum,
    };
    warn!("{}", warning);
    Some(warning)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let c = compose(vec![
            ValidPixel::new("#AAAAAA", 1, 1),
            ValidPixel::new("#BBBBBB", 1, 1),
        ]);
        assert_eq!(c.grid.get(1, 1), Some("#BBBBBB"));
        assert_eq!(c.pixels, vec![ValidPixel::new("#BBBBBB", 1, 1)]);
        assert_eq!(c.overwritten, 1);
    }

    #[test]
    fn test_dedup_keeps_order_of_winning_records() {
        let c = compose(vec![
            ValidPixel::new("#000001", 0, 0),
            ValidPixel::new("#000002", 5, 5),
            ValidPixel::new("#000003", 0, 0),
            ValidPixel::new("#000004", 9, 2),
        ]);
        assert_eq!(
            c.pixels,
            vec![
                ValidPixel::new("#000002", 5, 5),
                ValidPixel::new("#000003", 0, 0),
                ValidPixel::new("#000004", 9, 2),
            ]
        );
        assert_eq!(c.grid.set_count(), 3);
    }

    #[test]
    fn test_row_and_column_are_not_swapped() {
        let c = compose(vec![ValidPixel::new("#123456", 3, 4)]);
        assert_eq!(c.grid.get(4, 3), Some("#123456"));
        assert_eq!(c.grid.get(3, 4), None);
    }

    #[test]
    fn test_set_cells_match_pixels() {
        let input: Vec<ValidPixel> = (0..40usize)
            .map(|i| ValidPixel::new(format!("#0000{:02X}", i), (i % 16) as u8, (i * 7 % 16) as u8))
            .collect();
        let c = compose(input);
        assert_eq!(c.grid.set_count(), c.pixels.len());
        for p in &c.pixels {
            assert_eq!(c.grid.get(p.row as usize, p.column as usize), Some(p.hex_code.as_str()));
        }
    }

    #[test]
    fn test_empty_input() {
        let c = compose(Vec::new());
        assert!(c.pixels.is_empty());
        assert_eq!(c.grid, PixelGrid::default());
    }

    #[test]
    fn test_check_yield() {
        assert_eq!(check_yield(10, 10), None);
        assert_eq!(
            check_yield(2, 10),
            Some(GenerationWarning::LowYield { count: 2, minimum: 10 })
        );
        assert_eq!(check_yield(0, 0), None);
    }
}
