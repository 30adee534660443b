//! Multi-scale synthesis pipeline.
//!
//! Builds a heightfield as a pyramid: each level doubles the resolution,
//! resamples the current result up, and accumulates another round of FBM
//! plus the biome's filter chain. Low levels contribute the large shapes,
//! high levels the detail.

use crate::biomes::BiomeParams;
use crate::filters::TerrainFilter;
use crate::noise::{FbmParams, WorldUv};
use crate::terrain::HeightField;

/// Dune fields only make sense once there are enough pixels to resolve a
/// ridge; below this size the pass is skipped.
pub const DUNES_MIN_SIZE: usize = 256;

/// Maximum number of pyramid levels the derived default will request.
const MAX_DEFAULT_STEPS: u32 = 6;

/// Parameters of the pyramid schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PyramidConfig {
    /// Side length of the coarsest level.
    pub base_size: usize,
    /// Number of levels; the finest level has side `base_size << (steps-1)`.
    pub steps: u32,
    /// Master seed fed to every FBM pass.
    pub seed: u32,
    /// World-space scale of the noise domain.
    pub world_scale: f32,
}

impl PyramidConfig {
    /// Side length of the finest pyramid level.
    pub fn final_size(&self) -> usize {
        self.base_size << (self.steps.saturating_sub(1))
    }
}

/// Number of pyramid levels needed to reach `target` from `base`, plus one
/// refinement level, capped at six.
pub fn default_steps(target: usize, base: usize) -> u32 {
    let ratio = (target as f32 / base as f32).max(1.0);
    ((ratio.log2().ceil() as u32) + 1).clamp(1, MAX_DEFAULT_STEPS)
}

/// Synthesizes a continuous heightfield from a biome parameter bundle.
///
/// Per level: resample up, FBM (amplitude attenuated by distance from the
/// finest level), slope blur, dunes where the biome has them and the level
/// is large enough. Ridge sharpening runs once after the last level.
pub fn synthesize(config: &PyramidConfig, biome: &BiomeParams) -> HeightField {
    let final_size = config.final_size();
    let uv = WorldUv::Field {
        world_scale: config.world_scale,
    };

    let mut hf = HeightField::new(config.base_size);
    let mut size = config.base_size;

    for _ in 0..config.steps {
        if size > hf.size() {
            hf = hf.resample_to(size);
        }

        // Coarse levels carry proportionally less amplitude so the detail
        // levels do not drown in low-frequency energy.
        let attenuation = 1.0 + (final_size - size) as f32 / 128.0;
        let fbm = FbmParams {
            amplitude: biome.fbm.amplitude / attenuation,
            ..biome.fbm
        };

        TerrainFilter::Fbm(fbm).apply(&mut hf, config.seed, uv);
        TerrainFilter::SlopeBlur(biome.slope_blur).apply(&mut hf, config.seed, uv);

        if let Some(dunes) = biome.dunes {
            if size >= DUNES_MIN_SIZE {
                TerrainFilter::Dunes(dunes).apply(&mut hf, config.seed, uv);
            }
        }

        size *= 2;
    }

    TerrainFilter::RidgeSharpen(biome.ridge_sharpen).apply(&mut hf, config.seed, uv);

    hf
}
