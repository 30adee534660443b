//! Geological erosion configuration.

use serde::{Deserialize, Serialize};

use crate::biomes::BiomeParams;

/// Which backend runs the hydraulic erosion pass.
///
/// The CPU implementation is the reference; the GPU path is an
/// accelerator whose numeric output may differ, so `Auto` trades
/// cross-machine reproducibility for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErosionBackend {
    /// Try the GPU; fall back to the CPU if no compute device is available.
    Auto,
    /// Force the CPU implementation.
    CpuOnly,
}

impl Default for ErosionBackend {
    fn default() -> Self {
        Self::CpuOnly
    }
}

/// Parameters for the geological erosion stage.
///
/// The simulated time budget is discretized into per-process iteration
/// counts: one wind pass per 100 years, one thermal pass per 50, one
/// hydraulic pass per 25. This mapping is part of the output contract;
/// changing it changes every generated terrain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErosionParams {
    /// Simulated geological time in years.
    pub time_years: f32,
    /// Sea level in meters. Divide by the biome height scale for the
    /// terrain-relative value.
    pub sea_level_m: f32,
    /// Wind erosion strength; 0 skips the wind pass.
    pub wind_strength: f32,
    /// Rain intensity; 0 skips the hydraulic pass.
    pub rain_intensity: f32,
    /// Annual freeze-thaw cycles; 0 skips the thermal pass.
    pub temperature_cycles: f32,
}

impl ErosionParams {
    /// Derives erosion parameters from a biome: wind scales with the
    /// noise amplitude, thermal cycling comes from the biome's climate.
    pub fn for_biome(biome: &BiomeParams, time_years: f32, sea_level_m: f32) -> Self {
        Self {
            time_years,
            sea_level_m,
            wind_strength: biome.fbm.amplitude * 0.5,
            rain_intensity: 1.0,
            temperature_cycles: biome.temperature_cycles,
        }
    }

    pub fn wind_iterations(&self) -> u32 {
        (self.time_years / 100.0).ceil().max(0.0) as u32
    }

    pub fn thermal_iterations(&self) -> u32 {
        (self.time_years / 50.0).ceil().max(0.0) as u32
    }

    pub fn hydraulic_iterations(&self) -> u32 {
        (self.time_years / 25.0).ceil().max(0.0) as u32
    }
}
