//! Heightfield container.

mod heightfield;

pub use heightfield::HeightField;
