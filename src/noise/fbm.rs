//! Fractal Brownian motion with domain warp.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::terrain::HeightField;

use super::value::value_noise_2d;

/// Configuration for one FBM accumulation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FbmParams {
    /// Output amplitude: heights change by `(sum*2 - 1) * amplitude`.
    pub amplitude: f32,
    /// Base frequency of the first octave.
    pub frequency: f32,
    /// Number of octaves.
    pub octaves: u32,
    /// Frequency multiplier per octave (typically 2.0).
    pub lacunarity: f32,
    /// Amplitude decay per octave (typically 0.5).
    pub gain: f32,
    /// Domain warp strength.
    pub warp: f32,
}

impl Default for FbmParams {
    fn default() -> Self {
        Self {
            amplitude: 0.22,
            frequency: 1.6,
            octaves: 5,
            lacunarity: 2.0,
            gain: 0.5,
            warp: 0.1,
        }
    }
}

/// Maps a pixel coordinate to the world-space UV the noise is sampled at.
///
/// Grid-adjacent tiles must sample identical world coordinates along their
/// shared seam, which is what makes per-tile generation line up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldUv {
    /// One continuous field: `u = x / n * world_scale`.
    Field { world_scale: f32 },
    /// A single tile of a grid, addressed by inner-region coordinates:
    /// `u = (col + (x - overlap) / (inner - 1)) * world_scale`.
    ///
    /// The denominator makes the last inner pixel of tile `c` and the first
    /// inner pixel of tile `c + 1` land on the same world coordinate.
    Tile {
        row: f32,
        col: f32,
        inner: f32,
        overlap: f32,
        world_scale: f32,
    },
}

impl WorldUv {
    /// World UV for pixel `(x, y)` of a field with side `n`.
    pub fn map(&self, x: usize, y: usize, n: usize) -> (f32, f32) {
        match *self {
            WorldUv::Field { world_scale } => {
                let inv = world_scale / n as f32;
                (x as f32 * inv, y as f32 * inv)
            }
            WorldUv::Tile {
                row,
                col,
                inner,
                overlap,
                world_scale,
            } => {
                let denom = (inner - 1.0).max(1.0);
                let u = (col + (x as f32 - overlap) / denom) * world_scale;
                let v = (row + (y as f32 - overlap) / denom) * world_scale;
                (u, v)
            }
        }
    }
}

/// Accumulates domain-warped FBM noise into a heightfield.
///
/// Each pixel gains `(sum*2 - 1) * amplitude` where `sum` is the octave
/// sum at the pixel's world UV. Pixels are independent, so the row loop is
/// parallel without affecting determinism.
pub fn apply_fbm(hf: &mut HeightField, params: &FbmParams, seed: u32, uv: WorldUv) {
    let n = hf.size();
    let FbmParams {
        amplitude,
        frequency,
        octaves,
        lacunarity,
        gain,
        warp,
    } = *params;

    let seed_f = seed as f32;

    hf.data_mut()
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, height) in row.iter_mut().enumerate() {
                let (u, v) = uv.map(x, y, n);

                // Domain warp in world space.
                let wx = value_noise_2d((u + seed_f) * 8.123, (v - seed_f) * 7.321) * warp;
                let wy = value_noise_2d((u - seed_f) * 5.551, (v + seed_f) * 9.173) * warp;

                let mut amp = 1.0;
                let mut freq = frequency;
                let mut sum = 0.0;

                for _ in 0..octaves {
                    sum += value_noise_2d(
                        (u + wx) * freq + seed_f * 1.7,
                        (v + wy) * freq - seed_f * 2.1,
                    ) * amp;
                    freq *= lacunarity;
                    amp *= gain;
                }

                *height += (sum * 2.0 - 1.0) * amplitude;
            }
        });
}
