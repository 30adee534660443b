//! GPU-accelerated hydraulic erosion (wgpu compute).

mod pipelines;

pub use pipelines::{run_hydraulic, wear_coefficients, ErosionGpuError};
