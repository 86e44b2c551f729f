//! Fog Compute Dispatchers
//!
//! Records the three fog compute passes into the frame encoder each frame:
//! - `dispatch_light_inject`: fresh (scatter, extinction) per froxel
//! - `dispatch_temporal_blend`: EMA against the parity-selected history
//! - `dispatch_ray_march`: front-to-back prefix integration per column
//!
//! The passes are recorded in this order into one encoder; wgpu's usage
//! tracking inserts the storage/sampled transitions between them, which is
//! the completion barrier each stage needs before its successor reads.

use super::fog_pipelines::FogPipelines;
use super::froxel_config::{FROXEL_GRID_X, FROXEL_GRID_Y, FROXEL_GRID_Z};

/// Workgroup footprint used by all three shaders (must match the WGSL).
pub const STAGE_WORKGROUP_SIZE: u32 = 8;

/// Workgroups along X: ceil(FROXEL_GRID_X / 8). 160 / 8 = 20 (exact).
pub const GROUPS_X: u32 = (FROXEL_GRID_X + STAGE_WORKGROUP_SIZE - 1) / STAGE_WORKGROUP_SIZE;

/// Workgroups along Y: ceil(FROXEL_GRID_Y / 8). 90 / 8 = 12 (with guard).
pub const GROUPS_Y: u32 = (FROXEL_GRID_Y + STAGE_WORKGROUP_SIZE - 1) / STAGE_WORKGROUP_SIZE;

// Compile-time assertions that the dispatch covers the grid.
const _: () = assert!(GROUPS_X == 20 && GROUPS_Y == 12);
const _: () = assert!(GROUPS_X * STAGE_WORKGROUP_SIZE >= FROXEL_GRID_X);
const _: () = assert!(GROUPS_Y * STAGE_WORKGROUP_SIZE >= FROXEL_GRID_Y);

/// Dispatch the light injection pass, writing one fresh sample per cell.
///
/// # Arguments
/// * `encoder` - Command encoder to record the compute pass into
/// * `device` - GPU device (used to create the bind group)
/// * `pipelines` - Fog pipelines (provides the injection pipeline + layout)
/// * `uniform_buffer` - This frame's uploaded `FogUniforms`
/// * `dither_view` - R8Unorm texture array holding the dither sequence
/// * `shadow_view` - Depth view of the external shadow map
/// * `shadow_sampler` - Comparison sampler for the shadow test
/// * `injection_view` - Storage view of the injection volume
#[allow(clippy::too_many_arguments)]
pub fn dispatch_light_inject(
    encoder: &mut wgpu::CommandEncoder,
    device: &wgpu::Device,
    pipelines: &FogPipelines,
    uniform_buffer: &wgpu::Buffer,
    dither_view: &wgpu::TextureView,
    shadow_view: &wgpu::TextureView,
    shadow_sampler: &wgpu::Sampler,
    injection_view: &wgpu::TextureView,
) {
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("fog_light_inject_bind_group"),
        layout: &pipelines.light_inject_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(dither_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(shadow_view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(shadow_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::TextureView(injection_view),
            },
        ],
    });

    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("fog_light_inject_pass"),
        timestamp_writes: None,
    });
    pass.set_pipeline(&pipelines.light_inject_pipeline);
    pass.set_bind_group(0, &bind_group, &[]);
    pass.dispatch_workgroups(GROUPS_X, GROUPS_Y, FROXEL_GRID_Z);
}

/// Dispatch the temporal blend pass.
///
/// Must run AFTER light injection (reads the injection volume) and receives
/// the parity-selected history views: `history_read_view` is last frame's
/// write target, `history_write_view` is this frame's.
pub fn dispatch_temporal_blend(
    encoder: &mut wgpu::CommandEncoder,
    device: &wgpu::Device,
    pipelines: &FogPipelines,
    uniform_buffer: &wgpu::Buffer,
    injection_view: &wgpu::TextureView,
    history_read_view: &wgpu::TextureView,
    history_write_view: &wgpu::TextureView,
) {
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("fog_temporal_blend_bind_group"),
        layout: &pipelines.temporal_blend_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(injection_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(history_read_view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(history_write_view),
            },
        ],
    });

    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("fog_temporal_blend_pass"),
        timestamp_writes: None,
    });
    pass.set_pipeline(&pipelines.temporal_blend_pipeline);
    pass.set_bind_group(0, &bind_group, &[]);
    pass.dispatch_workgroups(GROUPS_X, GROUPS_Y, FROXEL_GRID_Z);
}

/// Dispatch the ray march pass over all (x, y) columns.
///
/// Must run AFTER the temporal blend: it reads this frame's history write
/// target (the temporally integrated volume) and prefix-integrates it into
/// the accumulated volume.
pub fn dispatch_ray_march(
    encoder: &mut wgpu::CommandEncoder,
    device: &wgpu::Device,
    pipelines: &FogPipelines,
    uniform_buffer: &wgpu::Buffer,
    integrated_view: &wgpu::TextureView,
    accumulated_view: &wgpu::TextureView,
) {
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("fog_ray_march_bind_group"),
        layout: &pipelines.ray_march_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(integrated_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(accumulated_view),
            },
        ],
    });

    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("fog_ray_march_pass"),
        timestamp_writes: None,
    });
    pass.set_pipeline(&pipelines.ray_march_pipeline);
    pass.set_bind_group(0, &bind_group, &[]);
    pass.dispatch_workgroups(GROUPS_X, GROUPS_Y, 1);
}
