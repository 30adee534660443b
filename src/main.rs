//! Tilegen CLI - seamless tileable terrain generator.
//!
//! Generates a heightfield atlas plus hydrology masks from a seed and a
//! biome preset, and writes them to disk for engine consumption.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use tilegen::export::{
    export_grid_png, export_grid_raw, export_mask_png, export_result_exr, ExrExportOptions,
    PngExportOptions, RawFormat,
};
use tilegen::{BiomeKind, BiomeOverrides, BiomeParams, ErosionBackend, GridConfig, TerrainGenerator};

/// Seamless tileable terrain generator.
#[derive(Parser)]
#[command(name = "tilegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a tile grid and export the atlas and masks.
    Generate {
        /// Tile grid rows.
        #[arg(long, default_value = "2")]
        rows: usize,

        /// Tile grid columns.
        #[arg(long, default_value = "2")]
        cols: usize,

        /// Tile side length in pixels, including overlap margins.
        #[arg(short, long, default_value = "512")]
        tile_size: usize,

        /// Overlap margin on all four tile sides.
        #[arg(long, default_value = "32")]
        overlap: usize,

        /// Coarsest pyramid level side length.
        #[arg(long, default_value = "64")]
        base_size: usize,

        /// Pyramid levels (derived from the atlas size when omitted).
        #[arg(long)]
        steps: Option<u32>,

        /// World-space scale of the noise domain.
        #[arg(long, default_value = "1.0")]
        world_scale: f32,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u32>,

        /// Biome preset.
        #[arg(short, long, default_value = "temperate")]
        biome: BiomeArg,

        /// Override the biome's FBM amplitude.
        #[arg(long)]
        amplitude: Option<f32>,

        /// Override the biome's ridge sharpening strength.
        #[arg(long)]
        ridge_sharpen: Option<f32>,

        /// Sea level in meters.
        #[arg(long, default_value = "23.0")]
        sea_level: f32,

        /// Simulated geological time in years (0 skips erosion).
        #[arg(long, default_value = "2500.0")]
        erosion_years: f32,

        /// Backend for the hydraulic erosion pass.
        #[arg(long, default_value = "cpu-only")]
        backend: BackendArg,

        /// Legacy seam blending across tile borders.
        #[arg(long)]
        blend_seams: bool,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "terrain")]
        name: String,

        /// Atlas export format.
        #[arg(short, long, default_value = "png")]
        format: ExportFormat,

        /// Export the water mask.
        #[arg(long)]
        water_map: bool,

        /// Export the river mask.
        #[arg(long)]
        river_map: bool,

        /// Export the beach mask.
        #[arg(long)]
        beach_map: bool,

        /// Export the flow accumulation map.
        #[arg(long)]
        flow_map: bool,

        /// Export erosion/deposition maps.
        #[arg(long)]
        erosion_map: bool,
    },

    /// Display memory and output-size information for a configuration.
    Info {
        /// Tile grid rows.
        #[arg(long, default_value = "2")]
        rows: usize,

        /// Tile grid columns.
        #[arg(long, default_value = "2")]
        cols: usize,

        /// Tile side length in pixels.
        #[arg(short, long, default_value = "512")]
        tile_size: usize,

        /// Overlap margin in pixels.
        #[arg(long, default_value = "32")]
        overlap: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BiomeArg {
    Temperate,
    Alpine,
    Desert,
}

impl From<BiomeArg> for BiomeKind {
    fn from(arg: BiomeArg) -> Self {
        match arg {
            BiomeArg::Temperate => BiomeKind::Temperate,
            BiomeArg::Alpine => BiomeKind::Alpine,
            BiomeArg::Desert => BiomeKind::Desert,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    /// Try the GPU, fall back to the CPU.
    Auto,
    /// Force the CPU reference implementation.
    CpuOnly,
}

impl From<BackendArg> for ErosionBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => ErosionBackend::Auto,
            BackendArg::CpuOnly => ErosionBackend::CpuOnly,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// 16-bit PNG (universal compatibility).
    Png,
    /// 16-bit RAW little-endian (Unity).
    Raw,
    /// 32-bit float RAW (high precision).
    RawFloat,
    /// Multi-channel float EXR (atlas + masks in one file).
    Exr,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            rows,
            cols,
            tile_size,
            overlap,
            base_size,
            steps,
            world_scale,
            seed,
            biome,
            amplitude,
            ridge_sharpen,
            sea_level,
            erosion_years,
            backend,
            blend_seams,
            output,
            name,
            format,
            water_map,
            river_map,
            beach_map,
            flow_map,
            erosion_map,
        } => {
            // Generate seed if not provided.
            let seed = seed.unwrap_or_else(|| {
                use std::time::{SystemTime, UNIX_EPOCH};
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_nanos() as u32
            });

            let config = GridConfig {
                rows,
                cols,
                tile_size,
                overlap,
                base_size,
                steps,
                world_scale,
                seed,
                blend_seams,
                sea_level_m: sea_level,
                erosion_years,
                erosion_backend: backend.into(),
                track_erosion_maps: erosion_map,
            };

            let biome_params = BiomeParams::preset(biome.into()).merged(&BiomeOverrides {
                amplitude,
                ridge_sharpen,
                ..Default::default()
            });

            run_generate(
                &config, &biome_params, &output, &name, format, water_map, river_map, beach_map,
                flow_map, erosion_map,
            );
        }
        Commands::Info {
            rows,
            cols,
            tile_size,
            overlap,
        } => {
            run_info(rows, cols, tile_size, overlap);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_generate(
    config: &GridConfig,
    biome: &BiomeParams,
    output: &PathBuf,
    name: &str,
    format: ExportFormat,
    water_map: bool,
    river_map: bool,
    beach_map: bool,
    flow_map: bool,
    erosion_map: bool,
) {
    println!("Tilegen - Tileable Terrain Generator");
    println!("====================================");
    println!(
        "Grid: {}x{} tiles of {} px (overlap {})",
        config.rows, config.cols, config.tile_size, config.overlap
    );
    println!("Seed: {}", config.seed);
    println!("Erosion: {} years", config.erosion_years);
    println!("Output: {}", output.display());

    let start = Instant::now();

    let mut generator = TerrainGenerator::new();
    let result = generator.generate(config, biome).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let gen_time = start.elapsed();
    println!(
        "Generated {}x{} atlas in {:.2?}",
        result.atlas_width, result.atlas_height, gen_time
    );

    let export_start = Instant::now();
    std::fs::create_dir_all(output).unwrap_or_else(|e| {
        eprintln!("Error creating output directory: {}", e);
        std::process::exit(1);
    });

    let mut min_h = f32::MAX;
    let mut max_h = f32::MIN;
    for &h in &result.atlas {
        min_h = min_h.min(h);
        max_h = max_h.max(h);
    }
    println!("Height range: [{:.4}, {:.4}]", min_h, max_h);

    match format {
        ExportFormat::Png => {
            let path = output.join(format!("{}_atlas.png", name));
            let options = PngExportOptions::auto_range(&result.atlas);
            export_grid_png(
                &result.atlas,
                result.atlas_width,
                result.atlas_height,
                &path,
                &options,
            )
            .unwrap_or_else(|e| {
                eprintln!("Error exporting PNG: {}", e);
                std::process::exit(1);
            });
            println!("  Exported atlas: {}_atlas.png", name);
        }
        ExportFormat::Raw | ExportFormat::RawFloat => {
            let raw_format = match format {
                ExportFormat::Raw => RawFormat::R16LittleEndian,
                _ => RawFormat::R32Float,
            };
            let path = output.join(format!("{}_atlas.raw", name));
            export_grid_raw(&result.atlas, &path, raw_format, min_h, max_h).unwrap_or_else(|e| {
                eprintln!("Error exporting RAW: {}", e);
                std::process::exit(1);
            });
            println!("  Exported atlas: {}_atlas.raw", name);
        }
        ExportFormat::Exr => {
            let path = output.join(format!("{}.exr", name));
            export_result_exr(&result, &path, &ExrExportOptions::default()).unwrap_or_else(|e| {
                eprintln!("Error exporting EXR: {}", e);
                std::process::exit(1);
            });
            println!("  Exported atlas + masks: {}.exr", name);
        }
    }

    if let Some(water) = &result.water {
        let export_mask = |enabled: bool, mask: &[f32], suffix: &str| {
            if !enabled {
                return;
            }
            let path = output.join(format!("{}_{}.png", name, suffix));
            export_mask_png(mask, water.width, water.height, &path).unwrap_or_else(|e| {
                eprintln!("Error exporting {} map: {}", suffix, e);
                std::process::exit(1);
            });
            println!("  Exported mask: {}_{}.png", name, suffix);
        };

        export_mask(water_map, &water.water_mask, "water");
        export_mask(river_map, &water.river_mask, "rivers");
        export_mask(beach_map, &water.beach_mask, "beach");

        if flow_map {
            let path = output.join(format!("{}_flow.png", name));
            let options = PngExportOptions::auto_range(&water.flow_accumulation);
            export_grid_png(
                &water.flow_accumulation,
                water.width,
                water.height,
                &path,
                &options,
            )
            .unwrap_or_else(|e| {
                eprintln!("Error exporting flow map: {}", e);
                std::process::exit(1);
            });
            println!("  Exported flow accumulation: {}_flow.png", name);
        }
    }

    if erosion_map {
        if let (Some(erosion), Some(deposition)) = (&result.erosion_mask, &result.deposition_mask) {
            for (grid, suffix) in [(erosion, "erosion"), (deposition, "deposition")] {
                let path = output.join(format!("{}_{}.png", name, suffix));
                let options = PngExportOptions::auto_range(grid);
                export_grid_png(grid, result.atlas_width, result.atlas_height, &path, &options)
                    .unwrap_or_else(|e| {
                        eprintln!("Error exporting {} map: {}", suffix, e);
                        std::process::exit(1);
                    });
                println!("  Exported mask: {}_{}.png", name, suffix);
            }
        }
    }

    println!("Export completed in {:.2?}", export_start.elapsed());
    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn run_info(rows: usize, cols: usize, tile_size: usize, overlap: usize) {
    if 2 * overlap >= tile_size {
        eprintln!("Error: need 2*overlap < tile_size");
        std::process::exit(1);
    }

    let inner = tile_size - 2 * overlap;
    let atlas_w = cols * inner;
    let atlas_h = rows * inner;
    let field_size = rows.max(cols) * inner + 2 * overlap;

    let atlas_pixels = (atlas_w as u64) * (atlas_h as u64);
    let field_pixels = (field_size as u64) * (field_size as u64);
    let tile_pixels = (tile_size as u64) * (tile_size as u64) * (rows as u64) * (cols as u64);

    let bytes_atlas = atlas_pixels * 4;
    let bytes_masks = atlas_pixels * 4 * 4;
    let bytes_field = field_pixels * 4;
    let bytes_tiles = tile_pixels * 4;

    println!("Tilegen - Configuration Info");
    println!("============================");
    println!();
    println!("Grid: {}x{} tiles", rows, cols);
    println!("Tile: {}x{} px, overlap {}, inner {}", tile_size, tile_size, overlap, inner);
    println!("Atlas: {}x{} px", atlas_w, atlas_h);
    println!("Continuous field: {}x{} px", field_size, field_size);
    println!();
    println!("Memory usage (in-memory):");
    println!(
        "  Field:  {:>12} bytes ({:.2} MB)",
        bytes_field,
        bytes_field as f64 / 1024.0 / 1024.0
    );
    println!(
        "  Tiles:  {:>12} bytes ({:.2} MB)",
        bytes_tiles,
        bytes_tiles as f64 / 1024.0 / 1024.0
    );
    println!(
        "  Atlas:  {:>12} bytes ({:.2} MB)",
        bytes_atlas,
        bytes_atlas as f64 / 1024.0 / 1024.0
    );
    println!(
        "  Masks:  {:>12} bytes ({:.2} MB)",
        bytes_masks,
        bytes_masks as f64 / 1024.0 / 1024.0
    );
    println!();
    println!("Export file sizes:");
    println!(
        "  PNG (16-bit):  ~{:.2} MB",
        (atlas_pixels * 2) as f64 / 1024.0 / 1024.0
    );
    println!(
        "  RAW (R16):      {:.2} MB",
        (atlas_pixels * 2) as f64 / 1024.0 / 1024.0
    );
    println!(
        "  RAW (R32):      {:.2} MB",
        (atlas_pixels * 4) as f64 / 1024.0 / 1024.0
    );
}
