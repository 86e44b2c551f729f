//! Froxel Configuration Module
//!
//! Defines constants and the depth-slicing curve for the froxel (frustum +
//! voxel) grid that carries the volumetric fog volumes.
//!
//! Froxels divide the view frustum into a 3D grid:
//! - X/Y: Screen-space tiles (FROXEL_GRID_X × FROXEL_GRID_Y)
//! - Z: Non-linearly distributed depth slices (FROXEL_GRID_Z)
//!
//! The slice distribution follows a power curve `depth = near + (far - near)
//! * t^p` with `p >= 1`. Larger exponents place more slices near the camera
//! where scattering detail matters most; `p = 1` degenerates to uniform
//! slicing.

/// Number of froxel tiles in the X (horizontal) direction.
pub const FROXEL_GRID_X: u32 = 160;

/// Number of froxel tiles in the Y (vertical) direction.
pub const FROXEL_GRID_Y: u32 = 90;

/// Number of depth slices for froxel partitioning.
pub const FROXEL_GRID_Z: u32 = 128;

/// Total number of froxels in the grid (grid_x * grid_y * grid_z).
pub const TOTAL_FROXELS: u32 = FROXEL_GRID_X * FROXEL_GRID_Y * FROXEL_GRID_Z;

/// Number of precomputed dither patterns cycled across frames.
pub const DITHER_SEQUENCE_LENGTH: u32 = 16;

/// Map a normalized slice coordinate `t` in [0, 1] to a view-space depth.
///
/// `depth = near + (far - near) * t^power`. Strictly monotonic for
/// `power >= 1`, so [`depth_to_slice`] is its exact inverse.
///
/// # Arguments
///
/// * `t` - Normalized slice coordinate (0 = near plane, 1 = far plane)
/// * `near` - Near plane distance
/// * `far` - Far plane distance
/// * `power` - Curve exponent (>= 1); higher biases slices toward the camera
#[inline]
pub fn slice_to_depth(t: f32, near: f32, far: f32, power: f32) -> f32 {
    near + (far - near) * t.clamp(0.0, 1.0).powf(power)
}

/// Map a view-space depth to its normalized slice coordinate in [0, 1].
///
/// Exact inverse of [`slice_to_depth`]. Depths outside [near, far] clamp to
/// the nearest boundary.
#[inline]
pub fn depth_to_slice(depth: f32, near: f32, far: f32, power: f32) -> f32 {
    let t = ((depth - near) / (far - near)).clamp(0.0, 1.0);
    t.powf(1.0 / power)
}

/// Physical depth covered by integer slice `z` of `total_slices`.
///
/// This is the step length of the ray march: the distance between the
/// slice's near and far boundary on the depth curve.
#[inline]
pub fn slice_thickness(z: u32, total_slices: u32, near: f32, far: f32, power: f32) -> f32 {
    let n = total_slices as f32;
    let d0 = slice_to_depth(z as f32 / n, near, far, power);
    let d1 = slice_to_depth((z + 1) as f32 / n, near, far, power);
    d1 - d0
}

/// Calculate the near and far depth bounds for a given depth slice.
///
/// # Returns
///
/// A tuple `(slice_near, slice_far)` containing the depth bounds of the slice.
pub fn depth_slice_bounds(slice: u32, near: f32, far: f32, power: f32) -> (f32, f32) {
    let n = FROXEL_GRID_Z as f32;
    let slice_near = slice_to_depth(slice as f32 / n, near, far, power);
    let slice_far = slice_to_depth((slice + 1) as f32 / n, near, far, power);
    (slice_near, slice_far)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(FROXEL_GRID_X, 160);
        assert_eq!(FROXEL_GRID_Y, 90);
        assert_eq!(FROXEL_GRID_Z, 128);
        assert_eq!(TOTAL_FROXELS, 160 * 90 * 128);
        assert_eq!(DITHER_SEQUENCE_LENGTH, 16);
    }

    #[test]
    fn test_slice_endpoints() {
        let (near, far) = (1.0, 1000.0);
        for power in [1.0, 1.5, 2.0, 4.0] {
            assert_eq!(slice_to_depth(0.0, near, far, power), near);
            assert_eq!(slice_to_depth(1.0, near, far, power), far);
        }
    }

    #[test]
    fn test_depth_slice_round_trip() {
        let (near, far) = (1.0, 1000.0);
        for power in [1.0, 1.5, 2.0, 4.0] {
            for i in 0..=200 {
                let d = near + (far - near) * (i as f32 / 200.0);
                let back = slice_to_depth(depth_to_slice(d, near, far, power), near, far, power);
                assert!(
                    (back - d).abs() <= d.abs() * 1e-4 + 1e-3,
                    "round trip failed at depth {} (power {}): got {}",
                    d,
                    power,
                    back
                );
            }
        }
    }

    #[test]
    fn test_slice_monotonic() {
        let (near, far) = (0.5, 500.0);
        for power in [1.0, 2.0, 3.0] {
            let mut prev = slice_to_depth(0.0, near, far, power);
            for i in 1..=128 {
                let d = slice_to_depth(i as f32 / 128.0, near, far, power);
                assert!(d > prev, "depth curve must be strictly increasing");
                prev = d;
            }
        }
    }

    #[test]
    fn test_power_biases_near_camera() {
        let (near, far) = (1.0, 1000.0);
        // With a higher exponent the first slice must cover less depth.
        let flat = slice_thickness(0, FROXEL_GRID_Z, near, far, 1.0);
        let biased = slice_thickness(0, FROXEL_GRID_Z, near, far, 2.0);
        assert!(biased < flat);

        // And the last slice correspondingly more.
        let flat_last = slice_thickness(FROXEL_GRID_Z - 1, FROXEL_GRID_Z, near, far, 1.0);
        let biased_last = slice_thickness(FROXEL_GRID_Z - 1, FROXEL_GRID_Z, near, far, 2.0);
        assert!(biased_last > flat_last);
    }

    #[test]
    fn test_depth_slice_bounds_continuity() {
        let (near, far, power) = (0.1, 1000.0, 2.0);

        // Each slice's far should equal the next slice's near
        for i in 0..FROXEL_GRID_Z - 1 {
            let (_, this_far) = depth_slice_bounds(i, near, far, power);
            let (next_near, _) = depth_slice_bounds(i + 1, near, far, power);
            assert!(
                (this_far - next_near).abs() < 1e-3,
                "Slice {} far ({}) should match slice {} near ({})",
                i,
                this_far,
                i + 1,
                next_near
            );
        }
    }

    #[test]
    fn test_thickness_sums_to_range() {
        let (near, far, power) = (1.0, 100.0, 2.0);
        let total: f32 = (0..FROXEL_GRID_Z)
            .map(|z| slice_thickness(z, FROXEL_GRID_Z, near, far, power))
            .sum();
        assert!((total - (far - near)).abs() < 0.05);
    }
}
