//! Render Module
//!
//! The volumetric fog pipeline: froxel grid addressing, the three compute
//! stages and their dispatch plumbing, temporal history bookkeeping, the
//! CPU reference fallback and the sampling interface exposed to shading.

pub mod dither;
pub mod fog_cpu;
pub mod fog_dispatch;
pub mod fog_pass;
pub mod fog_pipelines;
pub mod fog_settings;
pub mod fog_uniforms;
pub mod fog_volumes;
pub mod froxel_config;
pub mod froxel_grid;
pub mod shader_loader;

// Re-export commonly used types for convenience
pub use dither::{DitherSequence, DITHER_PATTERN_SIZE};
pub use fog_cpu::{henyey_greenstein, ray_march_column, CpuFogPipeline, FullyLit, ShadowOracle};
pub use fog_pass::VolumetricFogPass;
pub use fog_pipelines::FogPipelines;
pub use fog_settings::{FogSettings, TEMPORAL_BLEND_FACTOR};
pub use fog_uniforms::{FogUniforms, FrameParams};
pub use fog_volumes::{history_read_index, history_write_index, FogVolumes, VOLUME_FORMAT};
pub use froxel_config::{
    depth_slice_bounds, depth_to_slice, slice_thickness, slice_to_depth, DITHER_SEQUENCE_LENGTH,
    FROXEL_GRID_X, FROXEL_GRID_Y, FROXEL_GRID_Z, TOTAL_FROXELS,
};
pub use froxel_grid::FroxelGrid;
pub use shader_loader::{create_shader_module, load_shader_file, ShaderSource};
