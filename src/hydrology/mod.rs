//! Hydrology: D8 flow accumulation, water/river/beach masks, and river
//! channel carving.

pub mod carve;
pub mod flow;
pub mod masks;

use serde::{Deserialize, Serialize};

use crate::terrain::HeightField;

/// Hydrology configuration in terrain-relative units (heights as produced
/// by the synthesis pipeline, widths in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterParams {
    /// Standing-water level in terrain units.
    pub sea_level: f32,
    /// Normalized flow-accumulation threshold for river cells.
    pub river_threshold: f32,
    /// Base river width in pixels.
    pub river_width: f32,
    /// Base river carve depth in terrain units.
    pub river_depth: f32,
    /// Coastal erosion amount per beach-mask unit.
    pub coastal_erosion: f32,
    /// Beach falloff width in pixels.
    pub beach_width: f32,
}

impl WaterParams {
    /// Fallback hydrology for biomes without a water configuration, at a
    /// caller-supplied sea level.
    pub fn with_sea_level(sea_level: f32) -> Self {
        Self {
            sea_level,
            river_threshold: 0.08,
            river_width: 8.0,
            river_depth: 0.05,
            coastal_erosion: 0.04,
            beach_width: 8.0,
        }
    }
}

/// Derived water features. All grids share one packing and dimensions;
/// the three masks are in `[0, 1]`, flow accumulation is at least 1.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterFeatures {
    pub width: usize,
    pub height: usize,
    pub water_mask: Vec<f32>,
    pub river_mask: Vec<f32>,
    pub beach_mask: Vec<f32>,
    pub flow_accumulation: Vec<f32>,
}

impl WaterFeatures {
    /// Copies the sub-rectangle at `(offset, offset)` of size
    /// `width x height` out of every grid.
    pub fn crop(&self, offset: usize, width: usize, height: usize) -> WaterFeatures {
        let crop = |src: &[f32]| crop_grid(src, self.width, offset, width, height);
        WaterFeatures {
            width,
            height,
            water_mask: crop(&self.water_mask),
            river_mask: crop(&self.river_mask),
            beach_mask: crop(&self.beach_mask),
            flow_accumulation: crop(&self.flow_accumulation),
        }
    }
}

/// Copies a `width x height` window at `(offset, offset)` out of a square
/// row-major grid of side `src_size`.
pub(crate) fn crop_grid(
    src: &[f32],
    src_size: usize,
    offset: usize,
    width: usize,
    height: usize,
) -> Vec<f32> {
    let mut out = vec![0.0f32; width * height];
    for y in 0..height {
        let src_row = (y + offset) * src_size + offset;
        out[y * width..(y + 1) * width].copy_from_slice(&src[src_row..src_row + width]);
    }
    out
}

/// Runs the full water system over a heightfield and owns the scratch
/// buffers so repeated runs do not reallocate.
///
/// Order: flow accumulation, river mask, beach mask (from the pre-carve
/// water extent), river carving, coastal erosion, then the final water
/// mask from the carved heights.
#[derive(Debug, Default)]
pub struct WaterSystem {
    order: Vec<u32>,
}

impl WaterSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives all water features and carves the corresponding channels
    /// into the heightfield.
    pub fn apply(&mut self, hf: &mut HeightField, params: &WaterParams) -> WaterFeatures {
        let size = hf.size();

        let flow = flow::flow_accumulation_with(hf, &mut self.order);
        let river = masks::river_mask(&flow, size, params.river_threshold);

        let pre_water = masks::water_mask(hf, &river, params.sea_level);
        let beach = masks::beach_mask(&pre_water, size, params.beach_width);

        carve::carve_rivers(hf, &river, params);
        carve::apply_coastal_erosion(hf, &beach, params.coastal_erosion);

        let water = masks::water_mask(hf, &river, params.sea_level);

        WaterFeatures {
            width: size,
            height: size,
            water_mask: water,
            river_mask: river,
            beach_mask: beach,
            flow_accumulation: flow,
        }
    }

    /// Recomputes flow accumulation and the river mask on the current
    /// heights without carving. Used by the hydraulic erosion pass.
    pub fn reflow(&mut self, hf: &HeightField, params: &WaterParams) -> (Vec<f32>, Vec<f32>) {
        let flow = flow::flow_accumulation_with(hf, &mut self.order);
        let river = masks::river_mask(&flow, hf.size(), params.river_threshold);
        (flow, river)
    }

    /// Recomputes the beach and water masks from the current heights,
    /// keeping the stored river mask and flow accumulation.
    pub fn refresh_masks(
        &mut self,
        hf: &HeightField,
        features: &mut WaterFeatures,
        params: &WaterParams,
    ) {
        let water = masks::water_mask(hf, &features.river_mask, params.sea_level);
        features.beach_mask = masks::beach_mask(&water, hf.size(), params.beach_width);
        features.water_mask = water;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bumpy_field(size: usize) -> HeightField {
        let mut hf = HeightField::new(size);
        for y in 0..size {
            for x in 0..size {
                let h = 0.3 + 0.2 * ((x as f32 * 0.7).sin() + (y as f32 * 0.45).cos());
                hf.set(x, y, h);
            }
        }
        hf
    }

    #[test]
    fn test_apply_produces_valid_masks() {
        let mut hf = bumpy_field(32);
        let mut system = WaterSystem::new();
        let params = WaterParams::with_sea_level(0.2);

        let features = system.apply(&mut hf, &params);

        assert_eq!(features.width, 32);
        assert!(features.water_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(features.river_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(features.beach_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(features.flow_accumulation.iter().all(|&v| v >= 1.0));
    }

    #[test]
    fn test_water_dominates_rivers() {
        let mut hf = bumpy_field(32);
        let mut system = WaterSystem::new();
        let features = system.apply(&mut hf, &WaterParams::with_sea_level(0.1));

        for i in 0..features.river_mask.len() {
            if features.river_mask[i] > 0.0 {
                assert!(features.water_mask[i] > 0.0);
            }
        }
    }

    #[test]
    fn test_apply_is_deterministic_across_instances() {
        let params = WaterParams::with_sea_level(0.15);

        let mut hf_a = bumpy_field(24);
        let mut hf_b = bumpy_field(24);
        let a = WaterSystem::new().apply(&mut hf_a, &params);
        let b = WaterSystem::new().apply(&mut hf_b, &params);

        assert_eq!(a, b);
        assert_eq!(hf_a, hf_b);
    }

    #[test]
    fn test_scratch_reuse_matches_fresh_instance() {
        let params = WaterParams::with_sea_level(0.15);
        let mut system = WaterSystem::new();

        let mut first = bumpy_field(24);
        system.apply(&mut first, &params);

        let mut reused = bumpy_field(24);
        let mut fresh = bumpy_field(24);
        let from_reused = system.apply(&mut reused, &params);
        let from_fresh = WaterSystem::new().apply(&mut fresh, &params);

        assert_eq!(from_reused, from_fresh);
    }

    #[test]
    fn test_crop_grid() {
        let src: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let out = crop_grid(&src, 4, 1, 2, 2);
        assert_eq!(out, vec![5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_refresh_masks_tracks_height_changes() {
        let mut hf = bumpy_field(24);
        let mut system = WaterSystem::new();
        let params = WaterParams::with_sea_level(0.2);
        let mut features = system.apply(&mut hf, &params);

        // Raise everything above sea level; only river water remains.
        for h in hf.data_mut() {
            *h += 10.0;
        }
        system.refresh_masks(&hf, &mut features, &params);

        for i in 0..features.water_mask.len() {
            assert_eq!(features.water_mask[i], features.river_mask[i]);
        }
    }
}
