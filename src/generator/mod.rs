//! Entry point: configuration validation, stage sequencing, and the
//! tile-grid result assembly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atlas::{self, UvRect};
use crate::biomes::BiomeParams;
use crate::erosion::{ErosionBackend, ErosionParams, GeologicalEroder};
use crate::hydrology::{crop_grid, WaterFeatures, WaterParams, WaterSystem};
use crate::pipeline::{self, PyramidConfig};
use crate::terrain::HeightField;

/// Configuration rejected before any allocation happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Grid must have at least one row and one column (got {rows}x{cols})")]
    NonPositiveGrid { rows: usize, cols: usize },
    #[error("Overlap {overlap} is invalid for tile size {tile_size}: need 0 < 2*overlap < tile_size")]
    InvalidOverlap { overlap: usize, tile_size: usize },
    #[error("Base size {0} is too small; the pyramid needs at least 2 pixels")]
    BaseSizeTooSmall(usize),
    #[error("Pyramid of {steps} steps from base {base_size} tops out below tile size {tile_size}")]
    PyramidTooSmall {
        base_size: usize,
        steps: u32,
        tile_size: usize,
    },
    #[error("Steps {0} outside the supported range 1..=16")]
    InvalidSteps(u32),
}

/// Upper bound on explicit pyramid steps; `64 << 15` already exceeds the
/// largest supported grid by a wide margin.
pub const MAX_PYRAMID_STEPS: u32 = 16;

/// Parameters of one tile-grid generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Tile grid rows.
    pub rows: usize,
    /// Tile grid columns.
    pub cols: usize,
    /// Side length of each tile, including overlap margins.
    pub tile_size: usize,
    /// Overlap margin on all four tile sides.
    pub overlap: usize,
    /// Side length of the coarsest pyramid level.
    pub base_size: usize,
    /// Pyramid levels; derived from the atlas size when unset.
    pub steps: Option<u32>,
    /// World-space scale of the noise domain.
    pub world_scale: f32,
    /// Master seed.
    pub seed: u32,
    /// Legacy seam blending across tile borders.
    pub blend_seams: bool,
    /// Sea level in meters; used when the biome has no water config.
    pub sea_level_m: f32,
    /// Simulated geological time; 0 skips the erosion stage.
    pub erosion_years: f32,
    /// Backend for the hydraulic erosion pass.
    pub erosion_backend: ErosionBackend,
    /// Keep the erosion and deposition masks in the result.
    pub track_erosion_maps: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            tile_size: 512,
            overlap: 32,
            base_size: 64,
            steps: None,
            world_scale: 1.0,
            seed: 0,
            blend_seams: false,
            sea_level_m: 23.0,
            erosion_years: 2500.0,
            erosion_backend: ErosionBackend::default(),
            track_erosion_maps: false,
        }
    }
}

impl GridConfig {
    /// Side length of a tile's inner region.
    pub fn inner_size(&self) -> usize {
        self.tile_size - 2 * self.overlap
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::NonPositiveGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.overlap == 0 || 2 * self.overlap >= self.tile_size {
            return Err(ConfigError::InvalidOverlap {
                overlap: self.overlap,
                tile_size: self.tile_size,
            });
        }
        if self.base_size < 2 {
            return Err(ConfigError::BaseSizeTooSmall(self.base_size));
        }
        if let Some(steps) = self.steps {
            if steps == 0 || steps > MAX_PYRAMID_STEPS {
                return Err(ConfigError::InvalidSteps(steps));
            }
            let top = self.base_size << (steps - 1);
            if top < self.tile_size {
                return Err(ConfigError::PyramidTooSmall {
                    base_size: self.base_size,
                    steps,
                    tile_size: self.tile_size,
                });
            }
        }
        Ok(())
    }
}

/// Everything one generation run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGridResult {
    /// `rows * cols` tiles in row-major order, each with its margins.
    pub tiles: Vec<HeightField>,
    /// Side length of a tile's inner region.
    pub inner_size: usize,
    /// Row-major float atlas of all inner regions.
    pub atlas: Vec<f32>,
    pub atlas_width: usize,
    pub atlas_height: usize,
    /// Per-tile atlas sub-rectangles, row-major in `(r, c)`.
    pub rects: Vec<UvRect>,
    /// Hydrology masks at atlas dimensions.
    pub water: Option<WaterFeatures>,
    /// Total eroded material per atlas cell, when tracked.
    pub erosion_mask: Option<Vec<f32>>,
    /// Total deposited material per atlas cell, when tracked.
    pub deposition_mask: Option<Vec<f32>>,
}

/// Generates a tile grid with a one-shot generator instance.
pub fn generate(config: &GridConfig, biome: &BiomeParams) -> Result<TileGridResult, ConfigError> {
    TerrainGenerator::new().generate(config, biome)
}

/// Runs the full synthesis pipeline and owns all stage working buffers,
/// so repeated generations reuse their allocations.
///
/// Stage order is fixed: pyramid synthesis, hydrology (flow, masks, river
/// carving), geological erosion, then tile extraction and atlas packing.
#[derive(Debug, Default)]
pub struct TerrainGenerator {
    water: WaterSystem,
    eroder: GeologicalEroder,
}

impl TerrainGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(
        &mut self,
        config: &GridConfig,
        biome: &BiomeParams,
    ) -> Result<TileGridResult, ConfigError> {
        config.validate()?;

        let inner = config.inner_size();
        let atlas_w = config.cols * inner;
        let atlas_h = config.rows * inner;
        let field_size = config.rows.max(config.cols) * inner + 2 * config.overlap;

        let steps = config
            .steps
            .unwrap_or_else(|| pipeline::default_steps(atlas_w.max(atlas_h), config.base_size));

        let pyramid = PyramidConfig {
            base_size: config.base_size,
            steps,
            seed: config.seed,
            world_scale: config.world_scale,
        };
        let mut field = pipeline::synthesize(&pyramid, biome).resample_to(field_size);

        let water_params = biome
            .water
            .unwrap_or_else(|| WaterParams::with_sea_level(config.sea_level_m / biome.height_scale_m));

        let mut features = self.water.apply(&mut field, &water_params);

        let erosion_masks = if config.erosion_years > 0.0 {
            let erosion_params =
                ErosionParams::for_biome(biome, config.erosion_years, config.sea_level_m);
            Some(self.eroder.apply(
                &mut field,
                &erosion_params,
                &water_params,
                &mut self.water,
                &mut features,
                config.erosion_backend,
            ))
        } else {
            None
        };

        let mut tiles =
            atlas::extract_tiles(&field, config.rows, config.cols, config.tile_size, inner);
        if config.blend_seams {
            atlas::blend_tile_seams(
                &mut tiles,
                config.rows,
                config.cols,
                config.tile_size,
                config.overlap,
            );
        }

        let (atlas_data, atlas_w, atlas_h) =
            atlas::pack_atlas(&field, config.rows, config.cols, inner, config.overlap);
        let rects = atlas::uv_rects(config.rows, config.cols, inner);

        let water = Some(features.crop(config.overlap, atlas_w, atlas_h));
        let (erosion_mask, deposition_mask) = match erosion_masks {
            Some(masks) if config.track_erosion_maps => (
                Some(crop_grid(
                    &masks.erosion,
                    field_size,
                    config.overlap,
                    atlas_w,
                    atlas_h,
                )),
                Some(crop_grid(
                    &masks.deposition,
                    field_size,
                    config.overlap,
                    atlas_w,
                    atlas_h,
                )),
            ),
            _ => (None, None),
        };

        Ok(TileGridResult {
            tiles,
            inner_size: inner,
            atlas: atlas_data,
            atlas_width: atlas_w,
            atlas_height: atlas_h,
            rects,
            water,
            erosion_mask,
            deposition_mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::{BiomeKind, BiomeOverrides};

    fn small_config() -> GridConfig {
        GridConfig {
            rows: 1,
            cols: 2,
            tile_size: 48,
            overlap: 8,
            base_size: 16,
            steps: Some(3),
            erosion_years: 100.0,
            ..GridConfig::default()
        }
    }

    #[test]
    fn test_rejects_zero_rows() {
        let config = GridConfig {
            rows: 0,
            ..small_config()
        };
        let biome = BiomeParams::preset(BiomeKind::Temperate);
        assert!(matches!(
            generate(&config, &biome),
            Err(ConfigError::NonPositiveGrid { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_overlap() {
        let biome = BiomeParams::preset(BiomeKind::Temperate);

        let zero = GridConfig {
            overlap: 0,
            ..small_config()
        };
        assert!(matches!(
            generate(&zero, &biome),
            Err(ConfigError::InvalidOverlap { .. })
        ));

        let huge = GridConfig {
            overlap: 24,
            tile_size: 48,
            ..small_config()
        };
        assert!(matches!(
            generate(&huge, &biome),
            Err(ConfigError::InvalidOverlap { .. })
        ));
    }

    #[test]
    fn test_rejects_uncovered_pyramid() {
        let config = GridConfig {
            tile_size: 48,
            base_size: 16,
            steps: Some(1),
            ..small_config()
        };
        let biome = BiomeParams::preset(BiomeKind::Temperate);
        assert!(matches!(
            generate(&config, &biome),
            Err(ConfigError::PyramidTooSmall { .. })
        ));

        let zero_steps = GridConfig {
            steps: Some(0),
            ..small_config()
        };
        assert!(matches!(
            generate(&zero_steps, &biome),
            Err(ConfigError::InvalidSteps(0))
        ));
    }

    #[test]
    fn test_result_dimensions() {
        let config = small_config();
        let biome = BiomeParams::preset(BiomeKind::Temperate);
        let result = generate(&config, &biome).unwrap();

        let inner = 48 - 16;
        assert_eq!(result.inner_size, inner);
        assert_eq!(result.atlas_width, 2 * inner);
        assert_eq!(result.atlas_height, inner);
        assert_eq!(result.atlas.len(), 2 * inner * inner);
        assert_eq!(result.tiles.len(), 2);
        assert_eq!(result.rects.len(), 2);

        let water = result.water.as_ref().unwrap();
        assert_eq!(water.width, 2 * inner);
        assert_eq!(water.height, inner);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = GridConfig {
            seed: 1337,
            ..small_config()
        };
        let biome = BiomeParams::preset(BiomeKind::Temperate);

        let a = generate(&config, &biome).unwrap();
        let b = generate(&config, &biome).unwrap();

        assert_eq!(a.atlas, b.atlas);
        assert_eq!(a.rects, b.rects);
        assert_eq!(a.water, b.water);
        assert_eq!(a.tiles, b.tiles);
    }

    #[test]
    fn test_generator_reuse_matches_fresh() {
        let config = small_config();
        let biome = BiomeParams::preset(BiomeKind::Desert);

        let mut generator = TerrainGenerator::new();
        let first = generator.generate(&config, &biome).unwrap();
        let reused = generator.generate(&config, &biome).unwrap();
        assert_eq!(first.atlas, reused.atlas);
    }

    #[test]
    fn test_adjacent_tiles_agree_on_shared_band() {
        let config = GridConfig {
            rows: 2,
            cols: 2,
            ..small_config()
        };
        let biome = BiomeParams::preset(BiomeKind::Temperate);
        let result = generate(&config, &biome).unwrap();

        let inner = result.inner_size;

        // Horizontally adjacent pairs overlap in a 2*overlap-wide band.
        for (left, right) in [(0usize, 1usize), (2, 3)] {
            for k in 0..2 * config.overlap {
                for y in 0..config.tile_size {
                    assert_eq!(
                        result.tiles[left].get(inner + k, y),
                        result.tiles[right].get(k, y)
                    );
                }
            }
        }

        // Vertically adjacent pairs likewise.
        for (top, bottom) in [(0usize, 2usize), (1, 3)] {
            for k in 0..2 * config.overlap {
                for x in 0..config.tile_size {
                    assert_eq!(
                        result.tiles[top].get(x, inner + k),
                        result.tiles[bottom].get(x, k)
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_tile_grid() {
        let config = GridConfig {
            rows: 1,
            cols: 1,
            tile_size: 48,
            overlap: 8,
            base_size: 16,
            steps: Some(3),
            erosion_years: 0.0,
            ..GridConfig::default()
        };
        let biome = BiomeParams::preset(BiomeKind::Temperate);
        let result = generate(&config, &biome).unwrap();

        assert_eq!(result.rects.len(), 1);
        assert_eq!(
            result.rects[0],
            UvRect {
                u0: 0.0,
                v0: 0.0,
                u1: 1.0,
                v1: 1.0
            }
        );

        // The atlas equals the single tile's inner region.
        let inner = result.inner_size;
        let tile = &result.tiles[0];
        for y in 0..inner {
            for x in 0..inner {
                assert_eq!(
                    result.atlas[y * inner + x],
                    tile.get(x + config.overlap, y + config.overlap)
                );
            }
        }
    }

    #[test]
    fn test_zero_erosion_years_skips_erosion_stage() {
        let config = GridConfig {
            erosion_years: 0.0,
            track_erosion_maps: true,
            ..small_config()
        };
        let biome = BiomeParams::preset(BiomeKind::Desert);
        let result = generate(&config, &biome).unwrap();

        assert!(result.erosion_mask.is_none());
        assert!(result.water.is_some());
    }

    #[test]
    fn test_tracked_erosion_masks_have_atlas_dims() {
        let config = GridConfig {
            track_erosion_maps: true,
            ..small_config()
        };
        let biome = BiomeParams::preset(BiomeKind::Alpine);
        let result = generate(&config, &biome).unwrap();

        let erosion = result.erosion_mask.unwrap();
        assert_eq!(erosion.len(), result.atlas_width * result.atlas_height);
    }

    #[test]
    fn test_mask_invariants_end_to_end() {
        let config = small_config();
        let biome = BiomeParams::preset(BiomeKind::Temperate);
        let result = generate(&config, &biome).unwrap();
        let water = result.water.unwrap();

        assert!(water.water_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(water.river_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(water.beach_mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(water.flow_accumulation.iter().all(|&v| v >= 1.0));

        for i in 0..water.river_mask.len() {
            if water.river_mask[i] > 0.0 {
                assert!(water.water_mask[i] > 0.0);
            }
        }
    }

    #[test]
    fn test_flattened_override_reduces_variance() {
        let config = GridConfig {
            erosion_years: 0.0,
            ..small_config()
        };
        let base = BiomeParams::preset(BiomeKind::Temperate);
        let flattened = base.merged(&BiomeOverrides {
            amplitude: Some(0.0),
            ridge_sharpen: Some(0.0),
            ..Default::default()
        });

        let variance = |atlas: &[f32]| {
            let mean = atlas.iter().sum::<f32>() / atlas.len() as f32;
            atlas.iter().map(|&h| (h - mean) * (h - mean)).sum::<f32>() / atlas.len() as f32
        };

        let full = generate(&config, &base).unwrap();
        let flat = generate(&config, &flattened).unwrap();
        assert!(variance(&flat.atlas) < variance(&full.atlas));
    }
}
