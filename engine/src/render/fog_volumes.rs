//! Fog Volume Storage
//!
//! The four grid-shaped 3D textures the compute stages write and read:
//!
//! 1. **Injection volume**: fresh per-frame samples, `rgb = scatter`,
//!    `a = extinction`
//! 2. **History pair [A, B]**: temporally integrated samples, ping-ponged
//!    every frame
//! 3. **Accumulated volume**: the prefix-integrated ray-march output,
//!    `rgb = in-scattered radiance from the camera`, `a = transmittance`
//!
//! All volumes are Rgba16Float at the froxel grid resolution, created once
//! at pipeline construction and never resized.
//!
//! ## Ping-pong discipline
//!
//! The history read/write roles are derived functionally from the frame
//! index rather than a mutated flag: frame N writes `N & 1` and reads
//! `(N + 1) & 1`, so the write target of frame N is exactly the read source
//! of frame N + 1 and the two textures never alias within one frame.

use super::froxel_config::{FROXEL_GRID_X, FROXEL_GRID_Y, FROXEL_GRID_Z};

/// Texel format of every fog volume.
pub const VOLUME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Bytes per Rgba16Float texel.
pub const VOLUME_TEXEL_BYTES: u32 = 8;

/// History buffer index written during `frame_index`.
#[inline]
pub fn history_write_index(frame_index: u32) -> usize {
    (frame_index & 1) as usize
}

/// History buffer index read during `frame_index` (last frame's write target).
#[inline]
pub fn history_read_index(frame_index: u32) -> usize {
    ((frame_index + 1) & 1) as usize
}

/// The grid-shaped GPU volumes plus their views.
pub struct FogVolumes {
    pub injection: wgpu::Texture,
    pub injection_view: wgpu::TextureView,
    pub history: [wgpu::Texture; 2],
    pub history_views: [wgpu::TextureView; 2],
    pub accumulated: wgpu::Texture,
    pub accumulated_view: wgpu::TextureView,
}

impl FogVolumes {
    /// Allocate all volumes at the reference grid resolution.
    ///
    /// Creation failure is a fatal startup error; wgpu reports allocation
    /// problems through the device error callbacks, after which the first
    /// frame panics.
    pub fn new(device: &wgpu::Device) -> Self {
        let (injection, injection_view) = create_volume(device, "Fog Injection Volume");
        let (history_a, history_a_view) = create_volume(device, "Fog History Volume A");
        let (history_b, history_b_view) = create_volume(device, "Fog History Volume B");
        let (accumulated, accumulated_view) = create_volume(device, "Fog Accumulated Volume");

        println!(
            "[FogVolumes] Allocated 4x {}x{}x{} Rgba16Float volumes ({} KB total)",
            FROXEL_GRID_X,
            FROXEL_GRID_Y,
            FROXEL_GRID_Z,
            4 * FROXEL_GRID_X * FROXEL_GRID_Y * FROXEL_GRID_Z * VOLUME_TEXEL_BYTES / 1024
        );

        Self {
            injection,
            injection_view,
            history: [history_a, history_b],
            history_views: [history_a_view, history_b_view],
            accumulated,
            accumulated_view,
        }
    }

    /// View of the history volume written this frame.
    #[inline]
    pub fn history_write_view(&self, frame_index: u32) -> &wgpu::TextureView {
        &self.history_views[history_write_index(frame_index)]
    }

    /// View of the history volume read this frame.
    #[inline]
    pub fn history_read_view(&self, frame_index: u32) -> &wgpu::TextureView {
        &self.history_views[history_read_index(frame_index)]
    }
}

fn create_volume(device: &wgpu::Device, label: &str) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: FROXEL_GRID_X,
            height: FROXEL_GRID_Y,
            depth_or_array_layers: FROXEL_GRID_Z,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D3,
        format: VOLUME_FORMAT,
        usage: wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        dimension: Some(wgpu::TextureViewDimension::D3),
        ..Default::default()
    });
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_never_aliases_read() {
        for frame in 0..64u32 {
            assert_ne!(history_write_index(frame), history_read_index(frame));
        }
    }

    #[test]
    fn test_write_becomes_next_read() {
        // Frame N's write target must be frame N+1's read source, for any
        // frame sequence.
        for frame in 0..64u32 {
            assert_eq!(history_write_index(frame), history_read_index(frame + 1));
        }
    }

    #[test]
    fn test_roles_alternate() {
        assert_eq!(history_write_index(0), 0);
        assert_eq!(history_read_index(0), 1);
        assert_eq!(history_write_index(1), 1);
        assert_eq!(history_read_index(1), 0);
    }
}
