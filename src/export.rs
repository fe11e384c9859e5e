//! PNG export of a composed [`PixelGrid`].
//!
//! Every cell becomes a `scale × scale` block: unset cells in background
//! white, set cells in their color. Files are written atomically (temp file
//! + rename) so a crash never leaves a truncated PNG behind.

use crate::error::PixelGenError;
use crate::output::{PixelGrid, GRID_SIZE};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;
use tracing::debug;

const BACKGROUND_RGB: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);

/// Largest accepted scale factor (4096 px per side).
pub const MAX_SCALE: u32 = 256;

/// Parse `#RRGGBB` (case-insensitive) into RGB.
pub fn parse_hex_rgb(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Render the grid into an image of `16 * scale` pixels per side.
///
/// `scale` is clamped to `1..=MAX_SCALE`.
pub fn render_image(grid: &PixelGrid, scale: u32) -> RgbImage {
    let scale = scale.clamp(1, MAX_SCALE);
    let side = GRID_SIZE as u32 * scale;
    let mut img = RgbImage::from_pixel(side, side, BACKGROUND_RGB);

    for (row, column, hex) in grid.iter_set() {
        let color = parse_hex_rgb(hex).map(Rgb).unwrap_or(BACKGROUND_RGB);
        let (x0, y0) = (column as u32 * scale, row as u32 * scale);
        for y in y0..y0 + scale {
            for x in x0..x0 + scale {
                img.put_pixel(x, y, color);
            }
        }
    }
    img
}

/// Write the grid as a PNG at `path`, creating parent directories.
pub fn write_png(grid: &PixelGrid, scale: u32, path: impl AsRef<Path>) -> Result<(), PixelGenError> {
    let path = path.as_ref();
    let img = render_image(grid, scale);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PixelGenError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let tmp_path = path.with_extension("png.tmp");
    img.save_with_format(&tmp_path, ImageFormat::Png)
        .map_err(|e| PixelGenError::ImageEncodeFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    std::fs::rename(&tmp_path, path).map_err(|e| PixelGenError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("Wrote {}x{} PNG to {}", img.width(), img.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ValidPixel;
    use crate::pipeline::compose::compose;

    #[test]
    fn parse_hex_rgb_accepts_both_cases() {
        assert_eq!(parse_hex_rgb("#FF8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_rgb("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_rgb("FF8000"), None);
        assert_eq!(parse_hex_rgb("#FFF"), None);
    }

    #[test]
    fn render_image_scales_cells() {
        let grid = compose(vec![ValidPixel::new("#FF0000", 1, 2)]).grid;
        let img = render_image(&grid, 4);
        assert_eq!(img.dimensions(), (64, 64));
        // Cell (row 2, column 1) covers x 4..8, y 8..12.
        assert_eq!(img.get_pixel(4, 8), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(7, 11), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(8, 8), &BACKGROUND_RGB);
        assert_eq!(img.get_pixel(0, 0), &BACKGROUND_RGB);
    }

    #[test]
    fn render_image_clamps_scale() {
        let img = render_image(&PixelGrid::default(), 0);
        assert_eq!(img.dimensions(), (16, 16));
    }

    #[test]
    fn write_png_round_trips_through_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/art.png");
        let grid = compose(vec![ValidPixel::new("#00FF00", 15, 15)]).grid;

        write_png(&grid, 2, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (32, 32));
        assert_eq!(decoded.get_pixel(31, 31), &Rgb([0, 255, 0]));
        assert!(!path.with_extension("png.tmp").exists());
    }
}
