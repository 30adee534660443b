//! Compute pipeline for the hydraulic erosion accelerator.
//!
//! Runs the hydraulic model of `erosion::geological` on the GPU: the
//! per-cell flow and river-channel coefficients are folded into a wear
//! buffer on the host, and the kernel applies `wear * avg_slope` erosion
//! with 30% deposition onto the steepest downhill neighbor. Three
//! storage buffers (height, wear, sediment staging) plus one uniform,
//! dispatched with an 8x8 workgroup over the grid. The CPU pass updates
//! cells sequentially while the kernel steps the whole grid at once, so
//! the CPU remains the numeric reference.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use crate::terrain::HeightField;

#[derive(Debug, Error)]
pub enum ErosionGpuError {
    #[error("no compute adapter available")]
    NoAdapter,
    #[error("device request failed: {0}")]
    Device(String),
    #[error("height readback failed: {0}")]
    Readback(String),
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Params {
    size: u32,
    _pad: [u32; 3],
}

/// Folds the hydraulic erosion coefficients into one per-cell factor:
/// `(flow_n * 0.02 + river * 0.05) * rain_intensity`, with flow
/// normalized by its maximum. Multiplying by the local average slope
/// yields exactly the per-cell removal of the CPU pass. An all-zero flow
/// field yields zero wear everywhere.
pub fn wear_coefficients(flow: &[f32], river: &[f32], rain_intensity: f32) -> Vec<f32> {
    let max_flow = flow.iter().fold(0.0f32, |m, &f| m.max(f));
    if max_flow == 0.0 {
        return vec![0.0; flow.len()];
    }

    flow.iter()
        .zip(river)
        .map(|(&f, &r)| (f / max_flow * 0.02 + r * 0.05) * rain_intensity)
        .collect()
}

fn request_compute_device() -> Result<(wgpu::Device, wgpu::Queue), ErosionGpuError> {
    pollster::block_on(async {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await
            .ok_or(ErosionGpuError::NoAdapter)?;

        adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("tilegen-hydraulic-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(|e| ErosionGpuError::Device(e.to_string()))
    })
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Runs `iterations` hydraulic erosion steps on the GPU, updating the
/// heightfield in place. `flow` and `river` are the accumulation and
/// river-mask grids the pass erodes along, exactly as in the CPU path.
/// Fails cleanly, leaving the heights untouched, when no compute device
/// is available.
pub fn run_hydraulic(
    hf: &mut HeightField,
    flow: &[f32],
    river: &[f32],
    rain_intensity: f32,
    iterations: u32,
) -> Result<(), ErosionGpuError> {
    let (device, queue) = request_compute_device()?;
    let size = hf.size() as u32;
    let byte_len = (hf.size() * hf.size() * std::mem::size_of::<f32>()) as u64;

    use wgpu::util::DeviceExt;

    let uniform = Params {
        size,
        _pad: [0; 3],
    };
    let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("tilegen-hydraulic-params"),
        contents: bytemuck::bytes_of(&uniform),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    let height_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("tilegen-hydraulic-height"),
        contents: bytemuck::cast_slice(hf.data()),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
    });

    let wear = wear_coefficients(flow, river, rain_intensity);
    let wear_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("tilegen-hydraulic-wear"),
        contents: bytemuck::cast_slice(&wear),
        usage: wgpu::BufferUsages::STORAGE,
    });

    let staging_init = vec![0.0f32; hf.size() * hf.size()];
    let sediment_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("tilegen-hydraulic-sediment"),
        contents: bytemuck::cast_slice(&staging_init),
        usage: wgpu::BufferUsages::STORAGE,
    });

    let readback_buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("tilegen-hydraulic-readback"),
        size: byte_len,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("tilegen-hydraulic-wgsl"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/hydraulic.wgsl"))),
    });

    let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("tilegen-hydraulic-bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            storage_entry(1, false),
            storage_entry(2, true),
            storage_entry(3, false),
        ],
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("tilegen-hydraulic-layout"),
        bind_group_layouts: &[&bgl],
        push_constant_ranges: &[],
    });

    let make_pipeline = |entry: &str| {
        device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("tilegen-hydraulic-pipeline"),
            layout: Some(&layout),
            module: &module,
            entry_point: Some(entry),
            compilation_options: Default::default(),
            cache: None,
        })
    };
    let erode = make_pipeline("erode");
    let commit = make_pipeline("commit");

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("tilegen-hydraulic-bind-group"),
        layout: &bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: height_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wear_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: sediment_buf.as_entire_binding(),
            },
        ],
    });

    let groups = size.div_ceil(8);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("tilegen-hydraulic-encoder"),
    });

    for _ in 0..iterations {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("tilegen-hydraulic-pass"),
            timestamp_writes: None,
        });
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_pipeline(&erode);
        pass.dispatch_workgroups(groups, groups, 1);
        pass.set_pipeline(&commit);
        pass.dispatch_workgroups(groups, groups, 1);
    }

    encoder.copy_buffer_to_buffer(&height_buf, 0, &readback_buf, 0, byte_len);
    queue.submit(Some(encoder.finish()));

    let slice = readback_buf.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|e| ErosionGpuError::Readback(e.to_string()))?
        .map_err(|e| ErosionGpuError::Readback(e.to_string()))?;

    {
        let mapped = slice.get_mapped_range();
        hf.data_mut().copy_from_slice(bytemuck::cast_slice(&mapped));
    }
    readback_buf.unmap();

    Ok(())
}
