//! Geological erosion: wind, thermal, and hydraulic processes budgeted by
//! simulated years.
//!
//! The CPU implementation is authoritative. A wgpu compute variant of the
//! hydraulic pass exists as an accelerator; hosts without compute support
//! fall back to the CPU path.

mod config;
mod geological;
pub mod gpu;

pub use config::{ErosionBackend, ErosionParams};
pub use geological::{ErosionMasks, GeologicalEroder};
