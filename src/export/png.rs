//! PNG export for atlas grids and masks.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Luma};
use thiserror::Error;

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
    #[error("Grid length {got} does not match {width}x{height}")]
    InvalidGridLength {
        got: usize,
        width: usize,
        height: usize,
    },
}

/// Options for 16-bit grayscale PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// Minimum height value for normalization.
    pub min_height: f32,
    /// Maximum height value for normalization.
    pub max_height: f32,
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            min_height: 0.0,
            max_height: 1.0,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Creates options with the height range taken from the grid itself.
    pub fn auto_range(grid: &[f32]) -> Self {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &v in grid {
            min = min.min(v);
            max = max.max(v);
        }
        if !(min < max) {
            min = 0.0;
            max = 1.0;
        }
        Self {
            min_height: min,
            max_height: max,
            ..Default::default()
        }
    }
}

/// Exports a row-major float grid as a 16-bit grayscale PNG, normalized
/// by the options' height range.
pub fn export_grid_png(
    grid: &[f32],
    width: usize,
    height: usize,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    if grid.len() != width * height {
        return Err(PngExportError::InvalidGridLength {
            got: grid.len(),
            width,
            height,
        });
    }

    let min = options.min_height;
    let max = options.max_height;
    if min >= max {
        return Err(PngExportError::InvalidHeightRange(min, max));
    }
    let range = max - min;

    let mut img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::new(width as u32, height as u32);
    for y in 0..height {
        for x in 0..width {
            let normalized = ((grid[y * width + x] - min) / range).clamp(0.0, 1.0);
            img.put_pixel(x as u32, y as u32, Luma([(normalized * 65535.0) as u16]));
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);

    encoder.write_image(
        bytemuck::cast_slice(img.as_raw()),
        width as u32,
        height as u32,
        image::ExtendedColorType::L16,
    )?;

    Ok(())
}

/// Exports a `[0, 1]` float mask as an 8-bit grayscale PNG.
pub fn export_mask_png(
    mask: &[f32],
    width: usize,
    height: usize,
    path: &Path,
) -> Result<(), PngExportError> {
    if mask.len() != width * height {
        return Err(PngExportError::InvalidGridLength {
            got: mask.len(),
            width,
            height,
        });
    }

    let mut img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::new(width as u32, height as u32);
    for y in 0..height {
        for x in 0..width {
            let v = (mask[y * width + x].clamp(0.0, 1.0) * 255.0) as u8;
            img.put_pixel(x as u32, y as u32, Luma([v]));
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(
        writer,
        CompressionType::Default,
        FilterType::Adaptive,
    );

    encoder.write_image(
        img.as_raw(),
        width as u32,
        height as u32,
        image::ExtendedColorType::L8,
    )?;

    Ok(())
}
