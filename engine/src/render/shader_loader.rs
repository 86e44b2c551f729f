//! Shader Loading Utilities
//!
//! Provides utilities for loading and compiling the WGSL fog shaders.
//! Supports both embedded (compile-time) and runtime shader loading.

use std::path::Path;

/// Shader source that can be either embedded at compile time or loaded at runtime.
pub enum ShaderSource {
    /// Embedded shader source (faster, no file I/O at runtime)
    Embedded(&'static str),
    /// Runtime-loaded shader source
    Runtime(String),
}

impl ShaderSource {
    /// Get the shader source as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            ShaderSource::Embedded(s) => s,
            ShaderSource::Runtime(s) => s.as_str(),
        }
    }
}

/// Load a shader from the filesystem at runtime.
///
/// # Arguments
/// * `path` - Path to the WGSL shader file
///
/// # Returns
/// The shader source as a string, or an error if the file couldn't be read.
pub fn load_shader_file(path: impl AsRef<Path>) -> Result<ShaderSource, std::io::Error> {
    let source = std::fs::read_to_string(path)?;
    Ok(ShaderSource::Runtime(source))
}

/// Create a wgpu shader module from the given source.
///
/// # Arguments
/// * `device` - The wgpu device to create the shader module on
/// * `label` - Label for debugging
/// * `source` - The WGSL shader source
pub fn create_shader_module(
    device: &wgpu::Device,
    label: &str,
    source: &ShaderSource,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
    })
}

/// Paths to the fog shader files (relative to the project root), for tools
/// that load shaders at runtime instead of the embedded copies.
pub mod paths {
    /// Light injection compute pass
    pub const LIGHT_INJECT: &str = "shaders/light_inject.wgsl";

    /// Temporal integration compute pass
    pub const TEMPORAL_BLEND: &str = "shaders/temporal_blend.wgsl";

    /// Front-to-back ray march compute pass
    pub const RAY_MARCH: &str = "shaders/ray_march.wgsl";

    /// Sampling library concatenated onto mesh/sky shaders
    pub const FOG_SAMPLE: &str = "shaders/fog_sample.wgsl";
}
