//! Deterministic value noise and fractal Brownian motion.

mod fbm;
mod value;

pub use fbm::{apply_fbm, FbmParams, WorldUv};
pub use value::value_noise_2d;
