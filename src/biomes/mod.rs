//! Biome registry: named parameter bundles consumed by the synthesis and
//! hydrology stages.

use serde::{Deserialize, Serialize};

use crate::filters::{DuneParams, SlopeBlurParams};
use crate::hydrology::WaterParams;
use crate::noise::FbmParams;

/// The three canonical biomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiomeKind {
    Temperate,
    Alpine,
    Desert,
}

impl BiomeKind {
    /// All canonical biomes, in registry order.
    pub fn all() -> [BiomeKind; 3] {
        [BiomeKind::Temperate, BiomeKind::Alpine, BiomeKind::Desert]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BiomeKind::Temperate => "temperate",
            BiomeKind::Alpine => "alpine",
            BiomeKind::Desert => "desert",
        }
    }
}

/// Full parameter bundle for one biome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeParams {
    /// FBM noise configuration.
    pub fbm: FbmParams,
    /// Slope-adaptive blur configuration.
    pub slope_blur: SlopeBlurParams,
    /// Ridge unsharp-mask strength.
    pub ridge_sharpen: f32,
    /// Dune field, for biomes that have one.
    pub dunes: Option<DuneParams>,
    /// Vertical scale of the terrain in meters.
    pub height_scale_m: f32,
    /// Hydrology configuration (terrain-relative units).
    pub water: Option<WaterParams>,
    /// Annual freeze-thaw cycles driving thermal erosion.
    pub temperature_cycles: f32,
}

impl BiomeParams {
    /// Returns the canonical parameter bundle for a biome.
    pub fn preset(kind: BiomeKind) -> Self {
        match kind {
            BiomeKind::Temperate => Self {
                fbm: FbmParams {
                    amplitude: 0.22,
                    frequency: 1.6,
                    octaves: 5,
                    lacunarity: 2.0,
                    gain: 0.5,
                    warp: 0.1,
                },
                slope_blur: SlopeBlurParams {
                    radius: 2.0,
                    k: 0.4,
                    iterations: 2,
                },
                ridge_sharpen: 0.35,
                dunes: None,
                height_scale_m: 900.0,
                water: Some(WaterParams {
                    sea_level: 0.08,
                    river_threshold: 0.12,
                    river_width: 3.0,
                    river_depth: 0.025,
                    coastal_erosion: 0.04,
                    beach_width: 10.0,
                }),
                temperature_cycles: 25.0,
            },
            BiomeKind::Alpine => Self {
                fbm: FbmParams {
                    amplitude: 0.35,
                    frequency: 1.3,
                    octaves: 6,
                    lacunarity: 2.0,
                    gain: 0.5,
                    warp: 0.12,
                },
                slope_blur: SlopeBlurParams {
                    radius: 1.0,
                    k: 0.2,
                    iterations: 1,
                },
                ridge_sharpen: 0.6,
                dunes: None,
                height_scale_m: 1800.0,
                water: Some(WaterParams {
                    sea_level: 0.05,
                    river_threshold: 0.15,
                    river_width: 1.5,
                    river_depth: 0.04,
                    coastal_erosion: 0.03,
                    beach_width: 6.0,
                }),
                temperature_cycles: 50.0,
            },
            BiomeKind::Desert => Self {
                fbm: FbmParams {
                    amplitude: 0.15,
                    frequency: 2.0,
                    octaves: 5,
                    lacunarity: 2.0,
                    gain: 0.5,
                    warp: 0.15,
                },
                slope_blur: SlopeBlurParams {
                    radius: 2.0,
                    k: 0.6,
                    iterations: 2,
                },
                ridge_sharpen: 0.2,
                dunes: Some(DuneParams {
                    scale: 16.0,
                    amplitude: 0.03,
                    direction: std::f32::consts::FRAC_PI_4,
                }),
                height_scale_m: 600.0,
                water: Some(WaterParams {
                    sea_level: 0.1,
                    river_threshold: 0.2,
                    river_width: 2.0,
                    river_depth: 0.03,
                    coastal_erosion: 0.05,
                    beach_width: 8.0,
                }),
                temperature_cycles: 10.0,
            },
        }
    }

    /// Returns a copy with the given overrides applied. Fields the override
    /// leaves unset are inherited unchanged, so an empty override is the
    /// identity.
    pub fn merged(&self, overrides: &BiomeOverrides) -> Self {
        let mut out = self.clone();

        if let Some(v) = overrides.amplitude {
            out.fbm.amplitude = v;
        }
        if let Some(v) = overrides.frequency {
            out.fbm.frequency = v;
        }
        if let Some(v) = overrides.octaves {
            out.fbm.octaves = v;
        }
        if let Some(v) = overrides.lacunarity {
            out.fbm.lacunarity = v;
        }
        if let Some(v) = overrides.gain {
            out.fbm.gain = v;
        }
        if let Some(v) = overrides.warp {
            out.fbm.warp = v;
        }
        if let Some(v) = overrides.ridge_sharpen {
            out.ridge_sharpen = v;
        }
        if let Some(v) = overrides.height_scale_m {
            out.height_scale_m = v;
        }

        out
    }
}

/// Per-axis overrides of the FBM sub-fields, ridge sharpening, and height
/// scale of a biome preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BiomeOverrides {
    pub amplitude: Option<f32>,
    pub frequency: Option<f32>,
    pub octaves: Option<u32>,
    pub lacunarity: Option<f32>,
    pub gain: Option<f32>,
    pub warp: Option<f32>,
    pub ridge_sharpen: Option<f32>,
    pub height_scale_m: Option<f32>,
}
