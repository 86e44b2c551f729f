//! Fog Probe
//!
//! Headless end-to-end driver for the volumetric fog pipeline. Creates a
//! GPU device without a window, runs a few frames against a fully-lit
//! shadow map, reads the accumulated volume back and prints one froxel
//! column next to the CPU reference for the same parameters.
//!
//! Usage: `cargo run --bin fog_probe`

use froxel_fog_engine::render::{
    slice_to_depth, CpuFogPipeline, FrameParams, FroxelGrid, FullyLit, VolumetricFogPass,
    FROXEL_GRID_X, FROXEL_GRID_Y, FROXEL_GRID_Z,
};
use glam::Mat4;

/// Resolution of the probe's stand-in shadow map.
const SHADOW_MAP_SIZE: u32 = 64;

/// Frames to run before reading back (enough to prime the temporal history).
const PROBE_FRAMES: u32 = 4;

fn main() {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .expect("Failed to find GPU adapter");

    let info = adapter.get_info();
    println!("[FogProbe] Adapter: {} ({:?})", info.name, info.backend);

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Fog Probe Device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        memory_hints: wgpu::MemoryHints::Performance,
        ..Default::default()
    }))
    .expect("Failed to create GPU device");

    // Stand-in shadow visibility oracle: a depth map cleared to 1.0, so
    // every position compares as lit.
    let shadow_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Probe Shadow Map"),
        size: wgpu::Extent3d {
            width: SHADOW_MAP_SIZE,
            height: SHADOW_MAP_SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let shadow_view = shadow_texture.create_view(&wgpu::TextureViewDescriptor::default());

    // Clear the shadow map to the far plane once, before any fog frame.
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Probe Shadow Clear"),
    });
    {
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("probe_shadow_clear_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &shadow_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }
    queue.submit([encoder.finish()]);

    let mut fog = VolumetricFogPass::new(&device, &queue);
    fog.set_shadow_map(&shadow_view);

    // A light frustum that covers the camera frustum, so the shadow lookup
    // exercises the in-bounds path.
    let light_view = Mat4::look_at_rh(
        glam::Vec3::new(0.0, 400.0, 120.0),
        glam::Vec3::ZERO,
        glam::Vec3::Z,
    );
    let light_proj = Mat4::orthographic_rh(-600.0, 600.0, -600.0, 600.0, 1.0, 1200.0);

    for frame in 0..PROBE_FRAMES {
        let params = FrameParams {
            frame_index: frame,
            light_view_proj: light_proj * light_view,
            ..FrameParams::default()
        };
        fog.prepare(&queue, &params);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Probe Fog Frame"),
        });
        fog.record(&mut encoder, &device, frame);
        queue.submit([encoder.finish()]);
    }

    // Read the accumulated volume back. Rgba16Float rows are 160 * 8 bytes,
    // already a multiple of the 256-byte copy alignment.
    let bytes_per_row = FROXEL_GRID_X * 8;
    let buffer_size = (bytes_per_row * FROXEL_GRID_Y * FROXEL_GRID_Z) as u64;
    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Probe Readback Buffer"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Probe Readback"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: fog.accumulated_texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(FROXEL_GRID_Y),
            },
        },
        wgpu::Extent3d {
            width: FROXEL_GRID_X,
            height: FROXEL_GRID_Y,
            depth_or_array_layers: FROXEL_GRID_Z,
        },
    );
    queue.submit([encoder.finish()]);

    let slice = readback.slice(..);
    slice.map_async(wgpu::MapMode::Read, |result| {
        result.expect("Failed to map readback buffer");
    });
    device.poll(wgpu::PollType::wait_indefinitely()).expect("Failed to wait for GPU");

    let data = slice.get_mapped_range();

    // CPU reference with identical parameters (identity shadow oracle to
    // match the cleared map). Kept to a small grid for speed; the center
    // column is compared qualitatively.
    let cpu_grid = FroxelGrid::new(8, 8, FROXEL_GRID_Z);
    let mut cpu = CpuFogPipeline::new(cpu_grid);
    for frame in 0..PROBE_FRAMES {
        let params = FrameParams {
            frame_index: frame,
            ..FrameParams::default()
        };
        cpu.run_frame(&params, &FullyLit);
    }

    let (cx, cy) = (FROXEL_GRID_X / 2, FROXEL_GRID_Y / 2);
    let params = FrameParams::default();
    println!(
        "[FogProbe] Center column ({}, {}) after {} frames:",
        cx, cy, PROBE_FRAMES
    );
    println!("  slice |  depth   | gpu radiance (r,g,b)        | gpu T    | cpu T");
    for z in (0..FROXEL_GRID_Z).step_by(16) {
        let row_offset =
            ((z * FROXEL_GRID_Y + cy) * bytes_per_row + cx * 8) as usize;
        let texel: [u16; 4] = [
            u16::from_le_bytes([data[row_offset], data[row_offset + 1]]),
            u16::from_le_bytes([data[row_offset + 2], data[row_offset + 3]]),
            u16::from_le_bytes([data[row_offset + 4], data[row_offset + 5]]),
            u16::from_le_bytes([data[row_offset + 6], data[row_offset + 7]]),
        ];
        let [r, g, b, t] = texel.map(f16_to_f32);
        let cpu_t = cpu.accumulated(4, 4, z).w;
        let depth = slice_to_depth(
            (z as f32 + 0.5) / FROXEL_GRID_Z as f32,
            params.near,
            params.far,
            params.settings.depth_power,
        );
        println!(
            "  {:5} | {:8.2} | ({:.5}, {:.5}, {:.5}) | {:.5} | {:.5}",
            z, depth, r, g, b, t, cpu_t
        );
    }

    drop(data);
    readback.unmap();
    println!("[FogProbe] Done");
}

/// Decode an IEEE 754 half-precision float.
fn f16_to_f32(bits: u16) -> f32 {
    let sign = ((bits >> 15) & 1) as u32;
    let exp = ((bits >> 10) & 0x1f) as u32;
    let frac = (bits & 0x3ff) as u32;

    let f32_bits = if exp == 0 {
        if frac == 0 {
            sign << 31
        } else {
            // Subnormal: normalize it.
            let mut e = 127 - 15 + 1;
            let mut f = frac;
            while f & 0x400 == 0 {
                f <<= 1;
                e -= 1;
            }
            (sign << 31) | ((e as u32) << 23) | ((f & 0x3ff) << 13)
        }
    } else if exp == 0x1f {
        (sign << 31) | (0xffu32 << 23) | (frac << 13)
    } else {
        (sign << 31) | ((exp + 127 - 15) << 23) | (frac << 13)
    };
    f32::from_bits(f32_bits)
}
