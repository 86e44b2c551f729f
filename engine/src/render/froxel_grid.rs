//! Froxel Grid Addressing
//!
//! Pure cell-to-world and world-to-cell mapping for the fog grid. No state
//! beyond the grid resolution: every query takes the current frame snapshot
//! so the math stays a function of its inputs.
//!
//! ## Coordinate System
//!
//! - X: screen right, Y: screen down (texture convention), Z: depth slices
//!   from the near plane outward
//! - Cell (x, y, z) covers the screen tile `[x/nx, (x+1)/nx) × [y/ny,
//!   (y+1)/ny)` and the depth range of slice `z` on the power curve
//! - Linear index: X varies fastest, then Y, then Z (matches the WGSL
//!   dispatch order and the 3D texture layout)
//!
//! Out-of-range world positions clamp to the nearest valid cell; the
//! cell→world→cell round trip is exact for every in-range cell.

use glam::{Vec3, Vec4};

use super::fog_uniforms::FrameParams;
use super::froxel_config::{depth_to_slice, slice_to_depth};

/// Fixed-resolution froxel grid addressing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FroxelGrid {
    /// Screen tiles in X
    pub nx: u32,
    /// Screen tiles in Y
    pub ny: u32,
    /// Depth slices
    pub nz: u32,
}

impl FroxelGrid {
    /// Create a grid with the given resolution. Resolution is fixed for the
    /// lifetime of the pipeline.
    ///
    /// # Panics
    /// Panics if any dimension is zero.
    pub fn new(nx: u32, ny: u32, nz: u32) -> Self {
        assert!(nx > 0 && ny > 0 && nz > 0, "froxel grid dimensions must be positive");
        Self { nx, ny, nz }
    }

    /// The reference resolution used by the GPU pipeline.
    pub fn reference() -> Self {
        use super::froxel_config::{FROXEL_GRID_X, FROXEL_GRID_Y, FROXEL_GRID_Z};
        Self::new(FROXEL_GRID_X, FROXEL_GRID_Y, FROXEL_GRID_Z)
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        (self.nx * self.ny * self.nz) as usize
    }

    /// Linear index of cell (x, y, z): X fastest, then Y, then Z.
    #[inline]
    pub fn cell_index(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(x < self.nx && y < self.ny && z < self.nz);
        (z * self.nx * self.ny + y * self.nx + x) as usize
    }

    /// World-space position of the center of cell (x, y, z).
    #[inline]
    pub fn world_position(&self, x: u32, y: u32, z: u32, params: &FrameParams) -> Vec3 {
        self.world_position_jittered(x, y, z, params, 0.5)
    }

    /// World-space position of cell (x, y, z), shifted along the view ray by
    /// `jitter` in [0, 1) slice units (0.5 = exact slice center).
    ///
    /// The jitter is what the light-injection stage draws from the dither
    /// sequence; the temporal stage averages the resulting decorrelated
    /// samples back out.
    pub fn world_position_jittered(
        &self,
        x: u32,
        y: u32,
        z: u32,
        params: &FrameParams,
        jitter: f32,
    ) -> Vec3 {
        let uv_x = (x as f32 + 0.5) / self.nx as f32;
        let uv_y = (y as f32 + 0.5) / self.ny as f32;
        let ndc_x = uv_x * 2.0 - 1.0;
        let ndc_y = 1.0 - uv_y * 2.0;

        // Unproject the tile center on the far plane to get the view ray.
        let far_h = params.inv_view_proj() * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let far_pos = far_h.truncate() / far_h.w;
        let dir = (far_pos - params.camera_pos).normalize();

        let t = (z as f32 + 0.5 + (jitter - 0.5)) / self.nz as f32;
        let depth = slice_to_depth(t, params.near, params.far, params.settings.depth_power);

        // Scale along the ray so the point lands at view-space depth `depth`.
        let cos_theta = dir.dot(params.camera_forward()).max(1e-4);
        params.camera_pos + dir * (depth / cos_theta)
    }

    /// Cell containing the given world position; the exact inverse of
    /// [`world_position`] for in-range cells.
    ///
    /// Out-of-frustum positions clamp per axis to the nearest valid cell.
    pub fn cell_coordinates(&self, world_pos: Vec3, params: &FrameParams) -> (u32, u32, u32) {
        let clip = params.view_proj() * world_pos.extend(1.0);
        let w = clip.w.max(1e-6);
        let ndc_x = clip.x / w;
        let ndc_y = clip.y / w;
        let uv_x = ndc_x * 0.5 + 0.5;
        let uv_y = 0.5 - ndc_y * 0.5;

        let x = (uv_x * self.nx as f32).floor().clamp(0.0, (self.nx - 1) as f32) as u32;
        let y = (uv_y * self.ny as f32).floor().clamp(0.0, (self.ny - 1) as f32) as u32;

        let view_depth = -params.view.transform_point3(world_pos).z;
        let t = depth_to_slice(view_depth, params.near, params.far, params.settings.depth_power);
        let z = (t * self.nz as f32).floor().clamp(0.0, (self.nz - 1) as f32) as u32;

        (x, y, z)
    }
}
