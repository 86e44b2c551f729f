//! Froxel Fog Engine Library
//!
//! Real-time volumetric fog over a frustum-aligned voxel ("froxel") grid.
//! A four-stage pipeline turns a shadow-visibility test and per-frame
//! lighting parameters into a pre-integrated 3D volume of in-scattered
//! light and transmittance, sampled once per shaded pixel:
//!
//! shadow oracle -> light injection -> temporal integration -> ray march ->
//! sampling interface
//!
//! # Modules
//!
//! - [`render`] - The fog pipeline: grid addressing, compute stages,
//!   temporal ping-pong bookkeeping, the CPU reference fallback and the
//!   sampling interface
//!
//! # Example
//!
//! ```ignore
//! use froxel_fog_engine::render::{FrameParams, VolumetricFogPass};
//!
//! // Startup (fatal on resource failure)
//! let mut fog = VolumetricFogPass::new(&device, &queue);
//! fog.set_shadow_map(&shadow_depth_view);
//!
//! // Per frame
//! let params = FrameParams { frame_index, ..scene_snapshot };
//! fog.prepare(&queue, &params);
//! let mut encoder = device.create_command_encoder(&Default::default());
//! fog.record(&mut encoder, &device, params.frame_index);
//! queue.submit([encoder.finish()]);
//!
//! // Shading samples the accumulated volume via fog_sample.wgsl and
//! // composites: final = surface_color * fog.a + fog.rgb
//! ```

pub mod render;
