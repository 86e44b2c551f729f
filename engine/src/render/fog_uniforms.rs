//! Fog Uniform Structs
//!
//! Per-frame parameter marshaling for the volumetric fog compute stages.
//! [`FrameParams`] is the CPU-side immutable snapshot built once per frame;
//! [`FogUniforms`] is the GPU block derived from it, whose layout must match
//! the WGSL `FogUniforms` struct exactly.

use glam::{Mat4, Vec3};

use super::fog_settings::FogSettings;

/// Immutable per-frame snapshot of everything the fog stages read.
///
/// Constructed before the pipeline runs and passed by reference through all
/// stages; nothing mutates it mid-frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameParams {
    /// World-to-view matrix
    pub view: Mat4,
    /// View-to-clip projection matrix
    pub proj: Mat4,
    /// Previous frame's view-projection (kept for a future reprojection path)
    pub prev_view_proj: Mat4,
    /// World-to-light-clip matrix of the shadow map
    pub light_view_proj: Mat4,
    /// Camera position in world space
    pub camera_pos: Vec3,
    /// Direction the light travels (sun toward scene), need not be normalized
    pub light_direction: Vec3,
    /// Light color (linear RGB, before the intensity multiplier)
    pub light_color: Vec3,
    /// Near plane distance
    pub near: f32,
    /// Far plane distance
    pub far: f32,
    /// Render target width in pixels
    pub screen_width: u32,
    /// Render target height in pixels
    pub screen_height: u32,
    /// Monotonic frame counter; drives dither selection and ping-ponging
    pub frame_index: u32,
    /// Fog medium parameters
    pub settings: FogSettings,
}

impl Default for FrameParams {
    fn default() -> Self {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 3.0, 15.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 1.0, 1000.0);
        Self {
            view,
            proj,
            prev_view_proj: proj * view,
            light_view_proj: Mat4::IDENTITY,
            camera_pos: Vec3::new(0.0, 3.0, 15.0),
            light_direction: Vec3::new(0.0, -1.0, -0.3),
            light_color: Vec3::new(1.0, 0.96, 0.9),
            near: 1.0,
            far: 1000.0,
            screen_width: 1920,
            screen_height: 1080,
            frame_index: 0,
            settings: FogSettings::default(),
        }
    }
}

impl FrameParams {
    /// Combined view-projection matrix.
    #[inline]
    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }

    /// Inverse view-projection, used to unproject froxel cells to world space.
    #[inline]
    pub fn inv_view_proj(&self) -> Mat4 {
        self.view_proj().inverse()
    }

    /// World-space camera forward direction, extracted from the view matrix.
    #[inline]
    pub fn camera_forward(&self) -> Vec3 {
        // Third row of the RH view matrix is the negated forward axis.
        -Vec3::new(self.view.x_axis.z, self.view.y_axis.z, self.view.z_axis.z)
    }
}

/// GPU uniform block consumed by all three fog compute stages.
///
/// Must match the WGSL `FogUniforms` struct exactly.
///
/// WGSL std140-compatible layout (480 bytes):
///   offset   0: view (mat4x4<f32>)              = 64 bytes
///   offset  64: proj (mat4x4<f32>)              = 64 bytes
///   offset 128: view_proj (mat4x4<f32>)         = 64 bytes
///   offset 192: prev_view_proj (mat4x4<f32>)    = 64 bytes
///   offset 256: light_view_proj (mat4x4<f32>)   = 64 bytes
///   offset 320: inv_view_proj (mat4x4<f32>)     = 64 bytes
///   offset 384: light_dir (vec3<f32>) + pad     = 16 bytes
///   offset 400: light_color_intensity (vec3<f32>) + ambient_intensity (f32)
///   offset 416: camera_pos (vec3<f32>) + pad    = 16 bytes
///   offset 432: shadow_bias, near, far, depth_power (4 × f32)
///   offset 448: anisotropy, density, scattering, absorption (4 × f32)
///   offset 464: screen_size (vec2<f32>), frame_index (u32),
///               temporal_accumulation (u32)
///   Total: 480 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FogUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub prev_view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    /// Normalized direction the light travels (sun toward scene)
    pub light_dir: [f32; 3],
    pub _pad0: f32,
    /// Light color premultiplied by its intensity
    pub light_color_intensity: [f32; 3],
    /// Ambient in-scattering intensity (no shadow test)
    pub ambient_intensity: f32,
    pub camera_pos: [f32; 3],
    pub _pad1: f32,
    pub shadow_bias: f32,
    pub near: f32,
    pub far: f32,
    pub depth_power: f32,
    pub anisotropy: f32,
    pub density: f32,
    pub scattering: f32,
    pub absorption: f32,
    pub screen_size: [f32; 2],
    pub frame_index: u32,
    /// 1 = blend against history, 0 = pass-through
    pub temporal_accumulation: u32,
}

const _: () = assert!(
    std::mem::size_of::<FogUniforms>() == 480,
    "FogUniforms must stay in sync with the WGSL struct"
);
static_assertions::assert_eq_size!(FogUniforms, [u8; 480]);

impl FogUniforms {
    /// Marshal a frame snapshot into the GPU layout.
    ///
    /// Applies the defensive clamp so out-of-contract caller values cannot
    /// reach the shaders.
    pub fn from_params(params: &FrameParams) -> Self {
        let s = params.settings.clamped();
        let light_dir = params
            .light_direction
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y);
        Self {
            view: params.view.to_cols_array_2d(),
            proj: params.proj.to_cols_array_2d(),
            view_proj: params.view_proj().to_cols_array_2d(),
            prev_view_proj: params.prev_view_proj.to_cols_array_2d(),
            light_view_proj: params.light_view_proj.to_cols_array_2d(),
            inv_view_proj: params.inv_view_proj().to_cols_array_2d(),
            light_dir: light_dir.to_array(),
            _pad0: 0.0,
            light_color_intensity: (params.light_color * s.light_intensity).to_array(),
            ambient_intensity: s.ambient_intensity,
            camera_pos: params.camera_pos.to_array(),
            _pad1: 0.0,
            shadow_bias: s.shadow_bias,
            near: params.near,
            far: params.far.max(params.near + 1e-3),
            depth_power: s.depth_power,
            anisotropy: s.anisotropy,
            density: s.density,
            scattering: s.scattering,
            absorption: s.absorption,
            screen_size: [params.screen_width as f32, params.screen_height as f32],
            frame_index: params.frame_index,
            temporal_accumulation: s.temporal_accumulation as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fog_uniforms_size() {
        assert_eq!(std::mem::size_of::<FogUniforms>(), 480);
    }

    #[test]
    fn test_fog_uniforms_bytemuck_pod() {
        let uniforms = FogUniforms::from_params(&FrameParams::default());
        let bytes: &[u8] = bytemuck::bytes_of(&uniforms);
        assert_eq!(bytes.len(), std::mem::size_of::<FogUniforms>());

        let back: &FogUniforms = bytemuck::from_bytes(bytes);
        assert_eq!(back.frame_index, uniforms.frame_index);
        assert_eq!(back.camera_pos, uniforms.camera_pos);
    }

    #[test]
    fn test_from_params_premultiplies_light() {
        let mut params = FrameParams::default();
        params.light_color = Vec3::new(0.5, 1.0, 0.25);
        params.settings.light_intensity = 4.0;
        let u = FogUniforms::from_params(&params);
        assert_eq!(u.light_color_intensity, [2.0, 4.0, 1.0]);
    }

    #[test]
    fn test_from_params_clamps_settings() {
        let mut params = FrameParams::default();
        params.settings.density = -2.0;
        params.settings.anisotropy = 3.0;
        let u = FogUniforms::from_params(&params);
        assert_eq!(u.density, 0.0);
        assert_eq!(u.anisotropy, 1.0);
    }

    #[test]
    fn test_from_params_normalizes_light_dir() {
        let mut params = FrameParams::default();
        params.light_direction = Vec3::new(0.0, -10.0, 0.0);
        let u = FogUniforms::from_params(&params);
        assert_eq!(u.light_dir, [0.0, -1.0, 0.0]);

        // Degenerate zero direction falls back to straight down.
        params.light_direction = Vec3::ZERO;
        let u = FogUniforms::from_params(&params);
        assert_eq!(u.light_dir, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn test_camera_forward_from_view() {
        let params = FrameParams::default();
        let fwd = params.camera_forward();
        // Camera at (0,3,15) looking at the origin.
        let expected = (Vec3::ZERO - Vec3::new(0.0, 3.0, 15.0)).normalize();
        assert!((fwd - expected).length() < 1e-5);
    }

    #[test]
    fn test_temporal_flag_marshaling() {
        let mut params = FrameParams::default();
        params.settings.temporal_accumulation = false;
        assert_eq!(FogUniforms::from_params(&params).temporal_accumulation, 0);
        params.settings.temporal_accumulation = true;
        assert_eq!(FogUniforms::from_params(&params).temporal_accumulation, 1);
    }
}
