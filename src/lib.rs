//! Seamless tileable terrain synthesis.
//!
//! This crate turns a seed and a set of biome parameters into a continuous
//! heightfield, splits it into a grid of overlapping tiles, and packs the
//! tile interiors into a single float atlas with per-tile UV rectangles.
//! Alongside the atlas it derives hydrology masks (standing water, rivers,
//! beaches, flow accumulation) and runs multi-process geological erosion
//! (wind, thermal, hydraulic) budgeted by simulated years.
//!
//! The whole pipeline is a pure computation: identical inputs yield
//! identical outputs, with no I/O and no wall-clock dependence.

pub mod terrain;
pub mod noise;
pub mod filters;
pub mod pipeline;
pub mod hydrology;
pub mod erosion;
pub mod atlas;
pub mod biomes;
pub mod generator;
pub mod export;

pub use terrain::HeightField;
pub use noise::{FbmParams, WorldUv};
pub use filters::{DuneParams, SlopeBlurParams, TerrainFilter};
pub use pipeline::PyramidConfig;
pub use hydrology::{WaterFeatures, WaterParams, WaterSystem};
pub use erosion::{ErosionBackend, ErosionParams, GeologicalEroder};
pub use atlas::UvRect;
pub use biomes::{BiomeKind, BiomeOverrides, BiomeParams};
pub use generator::{generate, ConfigError, GridConfig, TerrainGenerator, TileGridResult};
