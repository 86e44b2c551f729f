//! Fog Compute Pipeline Infrastructure
//!
//! Creates and manages the three compute pipelines of the volumetric fog
//! pass:
//! - Light injection: writes fresh (scatter, extinction) samples per froxel
//! - Temporal blend: integrates the injection against the history volume
//! - Ray march: prefix-integrates columns into the accumulated volume

use std::num::NonZeroU64;

use crate::render::fog_uniforms::FogUniforms;
use crate::render::shader_loader::{create_shader_module, ShaderSource};

/// Embedded WGSL sources for the compute stages.
pub mod sources {
    pub const LIGHT_INJECT: &str = include_str!("../../../shaders/light_inject.wgsl");
    pub const TEMPORAL_BLEND: &str = include_str!("../../../shaders/temporal_blend.wgsl");
    pub const RAY_MARCH: &str = include_str!("../../../shaders/ray_march.wgsl");
}

/// Holds all fog compute pipelines and their associated bind group layouts.
pub struct FogPipelines {
    /// Light injection pipeline: one thread per froxel cell.
    pub light_inject_pipeline: wgpu::ComputePipeline,
    /// Bind group layout for the light injection pipeline.
    pub light_inject_bind_group_layout: wgpu::BindGroupLayout,

    /// Temporal blend pipeline: EMA against the history volume.
    pub temporal_blend_pipeline: wgpu::ComputePipeline,
    /// Bind group layout for the temporal blend pipeline.
    pub temporal_blend_bind_group_layout: wgpu::BindGroupLayout,

    /// Ray march pipeline: one thread per froxel column.
    pub ray_march_pipeline: wgpu::ComputePipeline,
    /// Bind group layout for the ray march pipeline.
    pub ray_march_bind_group_layout: wgpu::BindGroupLayout,
}

const UNIFORM_SIZE: u64 = std::mem::size_of::<FogUniforms>() as u64;

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: Some(NonZeroU64::new(UNIFORM_SIZE).unwrap()),
        },
        count: None,
    }
}

fn volume_read_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D3,
            multisampled: false,
        },
        count: None,
    }
}

fn volume_write_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: super::fog_volumes::VOLUME_FORMAT,
            view_dimension: wgpu::TextureViewDimension::D3,
        },
        count: None,
    }
}

impl FogPipelines {
    /// Create all fog compute pipelines from their embedded WGSL sources.
    ///
    /// Shader compilation problems surface through the device error
    /// callbacks and are fatal: the pipeline never starts in a degraded
    /// mode.
    pub fn new(device: &wgpu::Device) -> Self {
        let inject_module = create_shader_module(
            device,
            "fog_light_inject",
            &ShaderSource::Embedded(sources::LIGHT_INJECT),
        );
        let blend_module = create_shader_module(
            device,
            "fog_temporal_blend",
            &ShaderSource::Embedded(sources::TEMPORAL_BLEND),
        );
        let march_module = create_shader_module(
            device,
            "fog_ray_march",
            &ShaderSource::Embedded(sources::RAY_MARCH),
        );

        // --- Light injection ---
        // @group(0) @binding(0): uniform FogUniforms
        // @group(0) @binding(1): texture_2d_array (dither sequence)
        // @group(0) @binding(2): texture_depth_2d (shadow map)
        // @group(0) @binding(3): sampler_comparison
        // @group(0) @binding(4): texture_storage_3d<rgba16float, write> (injection)
        let light_inject_entries = [
            uniform_entry(0),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2Array,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
            volume_write_entry(4),
        ];
        let light_inject_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_light_inject_bind_group_layout"),
                entries: &light_inject_entries,
            });

        let light_inject_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("fog_light_inject_pipeline_layout"),
                bind_group_layouts: &[&light_inject_bind_group_layout],
                push_constant_ranges: &[],
            });

        let light_inject_pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("fog_light_inject_pipeline"),
                layout: Some(&light_inject_pipeline_layout),
                module: &inject_module,
                entry_point: Some("cs_inject"),
                compilation_options: Default::default(),
                cache: None,
            });

        // --- Temporal blend ---
        // @group(0) @binding(0): uniform FogUniforms
        // @group(0) @binding(1): texture_3d (injection volume)
        // @group(0) @binding(2): texture_3d (history read)
        // @group(0) @binding(3): texture_storage_3d<rgba16float, write> (history write)
        let temporal_blend_entries = [
            uniform_entry(0),
            volume_read_entry(1),
            volume_read_entry(2),
            volume_write_entry(3),
        ];
        let temporal_blend_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_temporal_blend_bind_group_layout"),
                entries: &temporal_blend_entries,
            });

        let temporal_blend_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("fog_temporal_blend_pipeline_layout"),
                bind_group_layouts: &[&temporal_blend_bind_group_layout],
                push_constant_ranges: &[],
            });

        let temporal_blend_pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("fog_temporal_blend_pipeline"),
                layout: Some(&temporal_blend_pipeline_layout),
                module: &blend_module,
                entry_point: Some("cs_blend"),
                compilation_options: Default::default(),
                cache: None,
            });

        // --- Ray march ---
        // @group(0) @binding(0): uniform FogUniforms
        // @group(0) @binding(1): texture_3d (this frame's history write)
        // @group(0) @binding(2): texture_storage_3d<rgba16float, write> (accumulated)
        let ray_march_entries = [
            uniform_entry(0),
            volume_read_entry(1),
            volume_write_entry(2),
        ];
        let ray_march_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_ray_march_bind_group_layout"),
                entries: &ray_march_entries,
            });

        let ray_march_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("fog_ray_march_pipeline_layout"),
                bind_group_layouts: &[&ray_march_bind_group_layout],
                push_constant_ranges: &[],
            });

        let ray_march_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fog_ray_march_pipeline"),
            layout: Some(&ray_march_pipeline_layout),
            module: &march_module,
            entry_point: Some("cs_march"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            light_inject_pipeline,
            light_inject_bind_group_layout,
            temporal_blend_pipeline,
            temporal_blend_bind_group_layout,
            ray_march_pipeline,
            ray_march_bind_group_layout,
        }
    }
}
