//! Volumetric Fog Pass
//!
//! The pipeline driver that owns every GPU resource of the froxel fog
//! system and runs the per-frame stage sequence:
//!
//! shadow oracle -> light injection -> temporal blend -> ray march ->
//! sampling interface (consumed by mesh/sky shading).
//!
//! # Usage
//!
//! ```rust,ignore
//! // Initialize
//! let mut fog = VolumetricFogPass::new(&device, &queue);
//! fog.set_shadow_map(&shadow_depth_view);
//!
//! // Each frame: snapshot parameters, upload, record stages in order
//! let params = FrameParams { frame_index, ..scene_state };
//! fog.prepare(&queue, &params);
//! fog.record(&mut encoder, &device, params.frame_index);
//!
//! // Shading composites via the sampling bind group + fog_sample.wgsl:
//! //   final = surface * fog.a + fog.rgb
//! let fog_bg = fog.create_sampling_bind_group(&device);
//! ```

use super::dither::DitherSequence;
use super::fog_dispatch::{dispatch_light_inject, dispatch_ray_march, dispatch_temporal_blend};
use super::fog_pipelines::FogPipelines;
use super::fog_uniforms::{FogUniforms, FrameParams};
use super::fog_volumes::FogVolumes;
use super::froxel_config::{FROXEL_GRID_X, FROXEL_GRID_Y, FROXEL_GRID_Z};

/// Owns the fog pipelines, volumes, dither sequence and samplers, and
/// records the three compute stages each frame.
pub struct VolumetricFogPass {
    pipelines: FogPipelines,
    volumes: FogVolumes,
    uniform_buffer: wgpu::Buffer,
    #[allow(dead_code)]
    dither_texture: wgpu::Texture,
    dither_view: wgpu::TextureView,
    shadow_sampler: wgpu::Sampler,
    shadow_view: Option<wgpu::TextureView>,
    volume_sampler: wgpu::Sampler,
    sampling_bind_group_layout: wgpu::BindGroupLayout,
}

impl VolumetricFogPass {
    /// Create the full fog pass. Any resource-creation failure here is
    /// fatal; the pipeline has no partial or degraded mode.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let pipelines = FogPipelines::new(device);
        let volumes = FogVolumes::new(device);

        let dither = DitherSequence::new();
        let (dither_texture, dither_view) = dither.create_texture(device, queue);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Fog Uniform Buffer"),
            size: std::mem::size_of::<FogUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Shadow visibility oracle: depth compare against the light's map.
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Fog Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        // Trilinear sampler for the accumulated volume lookups at shade time.
        let volume_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Fog Volume Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // Layout handed to mesh/sky shaders alongside fog_sample.wgsl.
        let sampling_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_sampling_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D3,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        println!(
            "[VolumetricFogPass] Initialized: {}x{}x{} froxels, 3 compute stages, temporal ping-pong",
            FROXEL_GRID_X, FROXEL_GRID_Y, FROXEL_GRID_Z
        );

        Self {
            pipelines,
            volumes,
            uniform_buffer,
            dither_texture,
            dither_view,
            shadow_sampler,
            shadow_view: None,
            volume_sampler,
            sampling_bind_group_layout,
        }
    }

    /// Bind the external shadow map (the visibility oracle). Must be called
    /// before the first recorded frame; call again whenever the shadow
    /// render target is recreated.
    pub fn set_shadow_map(&mut self, shadow_depth_view: &wgpu::TextureView) {
        self.shadow_view = Some(shadow_depth_view.clone());
        println!("[VolumetricFogPass] Shadow map bound");
    }

    /// Upload this frame's parameter snapshot. Call once per frame before
    /// [`Self::record`]; the stages treat the block as read-only after this.
    pub fn prepare(&self, queue: &wgpu::Queue, params: &FrameParams) {
        let uniforms = FogUniforms::from_params(params);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Record the three compute stages in dependency order. The frame index
    /// must match the one marshaled in [`Self::prepare`]; it selects the
    /// history ping-pong parity.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, device: &wgpu::Device, frame_index: u32) {
        let shadow_view = self
            .shadow_view
            .as_ref()
            .expect("[VolumetricFogPass] set_shadow_map must be called before recording");

        dispatch_light_inject(
            encoder,
            device,
            &self.pipelines,
            &self.uniform_buffer,
            &self.dither_view,
            shadow_view,
            &self.shadow_sampler,
            &self.volumes.injection_view,
        );

        dispatch_temporal_blend(
            encoder,
            device,
            &self.pipelines,
            &self.uniform_buffer,
            &self.volumes.injection_view,
            self.volumes.history_read_view(frame_index),
            self.volumes.history_write_view(frame_index),
        );

        dispatch_ray_march(
            encoder,
            device,
            &self.pipelines,
            &self.uniform_buffer,
            self.volumes.history_write_view(frame_index),
            &self.volumes.accumulated_view,
        );
    }

    /// The prefix-integrated output volume (rgb = in-scattered radiance,
    /// a = transmittance from the camera).
    pub fn accumulated_texture(&self) -> &wgpu::Texture {
        &self.volumes.accumulated
    }

    /// Bind group layout for the sampling interface (`fog_sample.wgsl`).
    pub fn sampling_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.sampling_bind_group_layout
    }

    /// Create the bind group mesh/sky shaders use to sample the fog.
    pub fn create_sampling_bind_group(&self, device: &wgpu::Device) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fog_sampling_bind_group"),
            layout: &self.sampling_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.volumes.accumulated_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.volume_sampler),
                },
            ],
        })
    }
}
