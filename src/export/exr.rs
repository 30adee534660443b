//! OpenEXR export (multi-channel, float).
//!
//! Writes one `.exr` file with the atlas heights plus every available
//! mask as a named float channel, so downstream tools get the full
//! generation result in a single high-precision file.

use std::path::Path;

use exr::image::{AnyChannel, AnyChannels, FlatSamples, Image, Layer};
use exr::meta::header::LayerAttributes;
use exr::prelude::{Encoding, WritableImage};
use thiserror::Error;

use crate::generator::TileGridResult;

/// Errors that can occur during EXR export.
#[derive(Error, Debug)]
pub enum ExrExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("IO / EXR error: {0}")]
    Exr(#[from] exr::error::Error),
    #[error("Invalid channel data length for '{name}': got {got}, expected {expected}")]
    InvalidChannelLength {
        name: &'static str,
        got: usize,
        expected: usize,
    },
}

/// Options for EXR export.
#[derive(Debug, Clone)]
pub struct ExrExportOptions {
    /// Compression/encoding choice.
    pub encoding: Encoding,
    /// Layer name in the EXR file.
    pub layer_name: &'static str,
}

impl Default for ExrExportOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::FAST_LOSSLESS,
            layer_name: "tilegen",
        }
    }
}

fn push_f32_channel(
    channels: &mut Vec<AnyChannel<FlatSamples>>,
    name: &'static str,
    samples: Vec<f32>,
    expected: usize,
) -> Result<(), ExrExportError> {
    if samples.len() != expected {
        return Err(ExrExportError::InvalidChannelLength {
            name,
            got: samples.len(),
            expected,
        });
    }
    channels.push(AnyChannel::new(name, FlatSamples::F32(samples)));
    Ok(())
}

/// Exports a generation result as a single multi-channel EXR.
///
/// Always writes `height`; water features and tracked erosion masks are
/// added as channels when present.
pub fn export_result_exr(
    result: &TileGridResult,
    path: &Path,
    options: &ExrExportOptions,
) -> Result<(), ExrExportError> {
    let expected = result.atlas_width * result.atlas_height;
    let mut channels: Vec<AnyChannel<FlatSamples>> = Vec::new();

    push_f32_channel(&mut channels, "height", result.atlas.clone(), expected)?;

    if let Some(water) = &result.water {
        push_f32_channel(&mut channels, "water_mask", water.water_mask.clone(), expected)?;
        push_f32_channel(&mut channels, "river_mask", water.river_mask.clone(), expected)?;
        push_f32_channel(&mut channels, "beach_mask", water.beach_mask.clone(), expected)?;
        push_f32_channel(
            &mut channels,
            "flow_accum",
            water.flow_accumulation.clone(),
            expected,
        )?;
    }

    if let Some(erosion) = &result.erosion_mask {
        push_f32_channel(&mut channels, "erosion", erosion.clone(), expected)?;
    }
    if let Some(deposition) = &result.deposition_mask {
        push_f32_channel(&mut channels, "deposition", deposition.clone(), expected)?;
    }

    let any_channels = AnyChannels::sort(channels.into());
    let layer = Layer::new(
        (result.atlas_width, result.atlas_height),
        LayerAttributes::named(options.layer_name),
        options.encoding,
        any_channels,
    );

    Image::from_layer(layer).write().to_file(path)?;
    Ok(())
}
