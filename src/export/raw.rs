//! RAW format export for game engine compatibility.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

/// Errors that can occur during RAW export.
#[derive(Error, Debug)]
pub enum RawExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
}

/// RAW export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFormat {
    /// 16-bit unsigned integer, little-endian (Unity default).
    R16LittleEndian,
    /// 16-bit unsigned integer, big-endian.
    R16BigEndian,
    /// 32-bit float, little-endian (high precision).
    R32Float,
}

impl Default for RawFormat {
    fn default() -> Self {
        RawFormat::R16LittleEndian
    }
}

/// Exports a row-major float grid as a RAW heightmap.
///
/// R16 formats normalize into `[min_height, max_height]`; R32 writes the
/// raw floats.
pub fn export_grid_raw(
    grid: &[f32],
    path: &Path,
    format: RawFormat,
    min_height: f32,
    max_height: f32,
) -> Result<(), RawExportError> {
    if format != RawFormat::R32Float && min_height >= max_height {
        return Err(RawExportError::InvalidHeightRange(min_height, max_height));
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let range = max_height - min_height;

    match format {
        RawFormat::R16LittleEndian => {
            for &height in grid {
                let normalized = ((height - min_height) / range).clamp(0.0, 1.0);
                let value = (normalized * 65535.0) as u16;
                writer.write_all(&value.to_le_bytes())?;
            }
        }
        RawFormat::R16BigEndian => {
            for &height in grid {
                let normalized = ((height - min_height) / range).clamp(0.0, 1.0);
                let value = (normalized * 65535.0) as u16;
                writer.write_all(&value.to_be_bytes())?;
            }
        }
        RawFormat::R32Float => {
            for &height in grid {
                writer.write_all(&height.to_le_bytes())?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Returns the expected file size for a RAW export.
pub fn expected_file_size(width: usize, height: usize, format: RawFormat) -> u64 {
    let pixels = (width as u64) * (height as u64);
    match format {
        RawFormat::R16LittleEndian | RawFormat::R16BigEndian => pixels * 2,
        RawFormat::R32Float => pixels * 4,
    }
}
