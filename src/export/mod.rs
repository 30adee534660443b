//! File exporters for the atlas and its masks.

mod exr;
mod png;
mod raw;

pub use exr::{export_result_exr, ExrExportError, ExrExportOptions};
pub use png::{export_grid_png, export_mask_png, PngExportError, PngExportOptions};
pub use raw::{expected_file_size, export_grid_raw, RawExportError, RawFormat};
