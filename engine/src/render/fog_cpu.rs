//! CPU-Side Fog Pipeline Fallback
//!
//! Runs the full volumetric fog pipeline on the CPU with the same semantics
//! as the compute shaders: light injection, temporal integration with the
//! ping-ponged history pair, and the front-to-back ray march. Used as the
//! software fallback when compute is unavailable and as the reference the
//! numerical properties are verified against.
//!
//! The grid resolution is chosen at construction (the GPU path always uses
//! the reference resolution; tests use small grids).

use glam::{Vec2, Vec3, Vec4};

use super::dither::DitherSequence;
use super::fog_settings::TEMPORAL_BLEND_FACTOR;
use super::fog_uniforms::FrameParams;
use super::fog_volumes::{history_read_index, history_write_index};
use super::froxel_config::{depth_to_slice, slice_to_depth};
use super::froxel_grid::FroxelGrid;

/// The shadow visibility oracle: 0.0 = fully shadowed toward the light,
/// 1.0 = fully lit. The GPU path implements this contract with a depth
/// compare against the shadow map; hosts provide their own on the CPU path.
pub trait ShadowOracle {
    fn visibility(&self, world_pos: Vec3, bias: f32) -> f32;
}

/// Oracle that reports every position as lit (no occluders).
pub struct FullyLit;

impl ShadowOracle for FullyLit {
    fn visibility(&self, _world_pos: Vec3, _bias: f32) -> f32 {
        1.0
    }
}

/// Single-lobe Henyey-Greenstein phase function.
///
/// `cos_theta` is the cosine between the light's travel direction and the
/// scatter direction toward the camera; `g` in [-1, 1] biases forward (+)
/// or backward (-) scattering. Integrates to 1 over the sphere.
#[inline]
pub fn henyey_greenstein(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let denom = (1.0 + g2 - 2.0 * g * cos_theta).max(1e-4);
    (1.0 - g2) / (4.0 * std::f32::consts::PI * denom * denom.sqrt())
}

/// Front-to-back integration of one froxel column.
///
/// `cells` holds (scatter rgb, extinction a) per slice, nearest first;
/// `thicknesses` the physical depth of each slice. Returns the running
/// (radiance rgb, transmittance a) per slice: element `z` is the exact
/// integral from the camera to the far boundary of slice `z`.
///
/// Transmittance starts at 1 and can only fall; zero extinction leaves it
/// exactly 1 (pure exponential, no division anywhere).
pub fn ray_march_column(cells: &[Vec4], thicknesses: &[f32]) -> Vec<Vec4> {
    assert_eq!(cells.len(), thicknesses.len());

    let mut out = Vec::with_capacity(cells.len());
    let mut transmittance = 1.0f32;
    let mut radiance = Vec3::ZERO;

    for (cell, &thickness) in cells.iter().zip(thicknesses) {
        radiance += transmittance * cell.truncate() * thickness;
        transmittance *= (-cell.w.max(0.0) * thickness).exp();
        out.push(radiance.extend(transmittance));
    }
    out
}

/// CPU mirror of the three-stage fog pipeline.
pub struct CpuFogPipeline {
    grid: FroxelGrid,
    dither: DitherSequence,
    injection: Vec<Vec4>,
    history: [Vec<Vec4>; 2],
    accumulated: Vec<Vec4>,
}

impl CpuFogPipeline {
    /// Create a pipeline over the given grid. All volumes are
    /// zero-initialized, matching the GPU textures at startup.
    pub fn new(grid: FroxelGrid) -> Self {
        let cells = grid.cell_count();
        Self {
            grid,
            dither: DitherSequence::new(),
            injection: vec![Vec4::ZERO; cells],
            history: [vec![Vec4::ZERO; cells], vec![Vec4::ZERO; cells]],
            accumulated: vec![Vec4::ZERO; cells],
        }
    }

    /// Grid this pipeline integrates over.
    pub fn grid(&self) -> &FroxelGrid {
        &self.grid
    }

    /// Run one full frame: inject -> blend -> march, in order, against the
    /// immutable frame snapshot. `params.frame_index` drives both the
    /// dither selection and the history ping-pong parity.
    pub fn run_frame(&mut self, params: &FrameParams, oracle: &dyn ShadowOracle) {
        self.inject(params, oracle);
        self.blend(params);
        self.march(params);
    }

    /// Light injection: one fresh (scatter rgb, extinction a) per cell.
    fn inject(&mut self, params: &FrameParams, oracle: &dyn ShadowOracle) {
        let s = params.settings.clamped();
        let pattern = DitherSequence::pattern_index(params.frame_index, s.temporal_accumulation);
        let light_dir = params
            .light_direction
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y);
        let light_color = params.light_color * s.light_intensity;
        let extinction = (s.scattering + s.absorption) * s.density;

        for z in 0..self.grid.nz {
            for y in 0..self.grid.ny {
                for x in 0..self.grid.nx {
                    let jitter = self.dither.value(pattern, x, y);
                    let world_pos = self
                        .grid
                        .world_position_jittered(x, y, z, params, jitter);

                    let vis = oracle.visibility(world_pos, s.shadow_bias).clamp(0.0, 1.0);

                    let view_dir = (world_pos - params.camera_pos).normalize();
                    let cos_theta = light_dir.dot(-view_dir);
                    let phase = henyey_greenstein(cos_theta, s.anisotropy);

                    let lit = light_color * vis * phase;
                    let scatter =
                        (lit + Vec3::splat(s.ambient_intensity)) * s.scattering * s.density;

                    let idx = self.grid.cell_index(x, y, z);
                    self.injection[idx] = scatter.extend(extinction);
                }
            }
        }
    }

    /// Temporal integration: EMA against the parity-selected history, or a
    /// plain copy when accumulation is off (or on the very first frame,
    /// before the history holds anything).
    fn blend(&mut self, params: &FrameParams) {
        let read = history_read_index(params.frame_index);
        let write = history_write_index(params.frame_index);
        debug_assert_ne!(read, write);

        let accumulate =
            params.settings.temporal_accumulation && params.frame_index > 0;

        let [a, b] = &mut self.history;
        let (read_buf, write_buf): (&Vec<Vec4>, &mut Vec<Vec4>) =
            if read == 0 { (&*a, b) } else { (&*b, a) };

        for (i, out) in write_buf.iter_mut().enumerate() {
            let current = self.injection[i];
            *out = if accumulate {
                read_buf[i].lerp(current, TEMPORAL_BLEND_FACTOR)
            } else {
                current
            };
        }
    }

    /// Ray march: prefix-integrate every column front to back.
    fn march(&mut self, params: &FrameParams) {
        let s = params.settings.clamped();
        let write = history_write_index(params.frame_index);
        let integrated = &self.history[write];
        let n = self.grid.nz as f32;

        // Slice thicknesses are shared by every column.
        let thicknesses: Vec<f32> = (0..self.grid.nz)
            .map(|z| {
                let d0 = slice_to_depth(z as f32 / n, params.near, params.far, s.depth_power);
                let d1 =
                    slice_to_depth((z + 1) as f32 / n, params.near, params.far, s.depth_power);
                d1 - d0
            })
            .collect();

        let mut column = Vec::with_capacity(self.grid.nz as usize);
        for y in 0..self.grid.ny {
            for x in 0..self.grid.nx {
                column.clear();
                column
                    .extend((0..self.grid.nz).map(|z| integrated[self.grid.cell_index(x, y, z)]));

                let marched = ray_march_column(&column, &thicknesses);
                for (z, value) in marched.into_iter().enumerate() {
                    self.accumulated[self.grid.cell_index(x, y, z as u32)] = value;
                }
            }
        }
    }

    /// Raw injected sample of a cell (after the last [`Self::run_frame`]).
    pub fn injection(&self, x: u32, y: u32, z: u32) -> Vec4 {
        self.injection[self.grid.cell_index(x, y, z)]
    }

    /// Temporally integrated sample of a cell for the given frame parity.
    pub fn integrated(&self, x: u32, y: u32, z: u32, frame_index: u32) -> Vec4 {
        self.history[history_write_index(frame_index)][self.grid.cell_index(x, y, z)]
    }

    /// Accumulated (prefix-integrated) value of a cell: rgb = in-scattered
    /// radiance from the camera up to the cell's depth, a = transmittance.
    pub fn accumulated(&self, x: u32, y: u32, z: u32) -> Vec4 {
        self.accumulated[self.grid.cell_index(x, y, z)]
    }

    /// The sampling interface: trilinear lookup of the accumulated volume.
    ///
    /// `screen_uv` in [0,1]^2 (y down), `view_depth` in view units. Returns
    /// rgb = in-scattered radiance, a = transmittance; shading composites
    /// `surface * a + rgb`. Mirrors `fog_sample.wgsl`.
    pub fn sample(&self, screen_uv: Vec2, view_depth: f32, params: &FrameParams) -> Vec4 {
        let s = params.settings.clamped();
        let w = depth_to_slice(view_depth, params.near, params.far, s.depth_power);

        // Texel-center convention: continuous coordinate minus half a texel.
        let fx = (screen_uv.x.clamp(0.0, 1.0) * self.grid.nx as f32 - 0.5).max(0.0);
        let fy = (screen_uv.y.clamp(0.0, 1.0) * self.grid.ny as f32 - 0.5).max(0.0);
        let fz = (w * self.grid.nz as f32 - 0.5).max(0.0);

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let z0 = fz.floor() as u32;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;
        let tz = fz - z0 as f32;

        let fetch = |x: u32, y: u32, z: u32| -> Vec4 {
            self.accumulated[self.grid.cell_index(
                x.min(self.grid.nx - 1),
                y.min(self.grid.ny - 1),
                z.min(self.grid.nz - 1),
            )]
        };

        let c00 = fetch(x0, y0, z0).lerp(fetch(x0 + 1, y0, z0), tx);
        let c10 = fetch(x0, y0 + 1, z0).lerp(fetch(x0 + 1, y0 + 1, z0), tx);
        let c01 = fetch(x0, y0, z0 + 1).lerp(fetch(x0 + 1, y0, z0 + 1), tx);
        let c11 = fetch(x0, y0 + 1, z0 + 1).lerp(fetch(x0 + 1, y0 + 1, z0 + 1), tx);

        let c0 = c00.lerp(c10, ty);
        let c1 = c01.lerp(c11, ty);
        c0.lerp(c1, tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fog_settings::FogSettings;

    fn test_params(frame_index: u32) -> FrameParams {
        FrameParams {
            frame_index,
            ..FrameParams::default()
        }
    }

    /// Oracle reporting a constant visibility everywhere.
    struct ConstantShadow(f32);

    impl ShadowOracle for ConstantShadow {
        fn visibility(&self, _world_pos: Vec3, _bias: f32) -> f32 {
            self.0
        }
    }

    #[test]
    fn test_phase_function_normalizes() {
        // The phase function must integrate to 1 over the unit sphere:
        // 2*pi * integral over cos_theta in [-1, 1].
        for g in [-0.8, -0.3, 0.0, 0.5, 0.9] {
            let steps = 20_000;
            let mut integral = 0.0f64;
            for i in 0..steps {
                let cos_theta = -1.0 + 2.0 * (i as f32 + 0.5) / steps as f32;
                integral += henyey_greenstein(cos_theta, g) as f64;
            }
            integral *= 2.0 / steps as f64 * 2.0 * std::f64::consts::PI;
            assert!(
                (integral - 1.0).abs() < 1e-2,
                "HG(g={}) integrates to {}",
                g,
                integral
            );
        }
    }

    #[test]
    fn test_phase_isotropic_at_zero_g() {
        let expected = 1.0 / (4.0 * std::f32::consts::PI);
        for cos_theta in [-1.0, -0.5, 0.0, 0.5, 1.0] {
            assert!((henyey_greenstein(cos_theta, 0.0) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_injection_extinction_matches_settings() {
        let mut pipe = CpuFogPipeline::new(FroxelGrid::new(4, 4, 4));
        let mut params = test_params(0);
        params.settings = FogSettings {
            density: 0.5,
            scattering: 0.4,
            absorption: 0.1,
            ..Default::default()
        };
        pipe.run_frame(&params, &FullyLit);
        let expected = (0.4 + 0.1) * 0.5;
        for z in 0..4 {
            let cell = pipe.injection(1, 2, z);
            assert!((cell.w - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_shadowed_cells_keep_ambient_only() {
        let grid = FroxelGrid::new(4, 4, 4);
        let mut lit = CpuFogPipeline::new(grid);
        let mut dark = CpuFogPipeline::new(grid);
        let params = test_params(0);
        lit.run_frame(&params, &FullyLit);
        dark.run_frame(&params, &ConstantShadow(0.0));

        let s = params.settings.clamped();
        let ambient = s.ambient_intensity * s.scattering * s.density;
        for z in 0..4 {
            let d = dark.injection(2, 2, z);
            // Fully shadowed: only the ambient term, no directional light.
            assert!((d.x - ambient).abs() < 1e-6);
            assert!((d.y - ambient).abs() < 1e-6);
            assert!((d.z - ambient).abs() < 1e-6);
            // And strictly less than the lit cell.
            assert!(d.x < lit.injection(2, 2, z).x);
        }
    }

    #[test]
    fn test_temporal_pass_through_when_disabled() {
        let mut pipe = CpuFogPipeline::new(FroxelGrid::new(4, 4, 4));
        let mut params = test_params(5);
        params.settings.temporal_accumulation = false;
        pipe.run_frame(&params, &FullyLit);

        for z in 0..4 {
            for y in 0..4 {
                for x in 0..4 {
                    assert_eq!(
                        pipe.injection(x, y, z),
                        pipe.integrated(x, y, z, params.frame_index),
                        "pass-through must be exact, cell-for-cell"
                    );
                }
            }
        }
    }

    #[test]
    fn test_temporal_blend_stays_bounded() {
        let mut pipe = CpuFogPipeline::new(FroxelGrid::new(4, 4, 4));

        // Frame 0 seeds the history, frame 1 blends against it with a
        // dimmer light.
        let mut p0 = test_params(0);
        p0.settings.light_intensity = 20.0;
        pipe.run_frame(&p0, &FullyLit);
        let history = pipe.integrated(1, 1, 1, 0);

        let mut p1 = test_params(1);
        p1.settings.light_intensity = 1.0;
        pipe.run_frame(&p1, &FullyLit);
        let current = pipe.injection(1, 1, 1);
        let blended = pipe.integrated(1, 1, 1, 1);

        for c in 0..4 {
            let lo = history[c].min(current[c]);
            let hi = history[c].max(current[c]);
            assert!(
                blended[c] >= lo - 1e-6 && blended[c] <= hi + 1e-6,
                "component {} overshoots: {} not in [{}, {}]",
                c,
                blended[c],
                lo,
                hi
            );
        }
    }

    #[test]
    fn test_first_frame_blend_is_pass_through() {
        // Frame 0 has no valid history; even with accumulation on the
        // output must equal the injection.
        let mut pipe = CpuFogPipeline::new(FroxelGrid::new(4, 4, 4));
        let params = test_params(0);
        assert!(params.settings.temporal_accumulation);
        pipe.run_frame(&params, &FullyLit);
        assert_eq!(pipe.injection(3, 0, 2), pipe.integrated(3, 0, 2, 0));
    }

    #[test]
    fn test_transmittance_monotonic() {
        let mut pipe = CpuFogPipeline::new(FroxelGrid::new(6, 6, 12));
        let params = test_params(0);
        pipe.run_frame(&params, &FullyLit);

        for y in 0..6 {
            for x in 0..6 {
                let mut prev = 1.0f32;
                for z in 0..12 {
                    let t = pipe.accumulated(x, y, z).w;
                    assert!(
                        t <= prev + 1e-7,
                        "transmittance rose along column ({}, {}) at slice {}",
                        x,
                        y,
                        z
                    );
                    assert!(t >= 0.0 && t <= 1.0);
                    prev = t;
                }
            }
        }
    }

    #[test]
    fn test_radiance_non_decreasing() {
        let mut pipe = CpuFogPipeline::new(FroxelGrid::new(4, 4, 8));
        let params = test_params(0);
        pipe.run_frame(&params, &FullyLit);

        for y in 0..4 {
            for x in 0..4 {
                let mut prev = Vec3::ZERO;
                for z in 0..8 {
                    let l = pipe.accumulated(x, y, z).truncate();
                    assert!(l.x >= prev.x - 1e-7 && l.y >= prev.y - 1e-7 && l.z >= prev.z - 1e-7);
                    prev = l;
                }
            }
        }
    }

    #[test]
    fn test_sample_matches_cell_centers() {
        let mut pipe = CpuFogPipeline::new(FroxelGrid::new(4, 4, 4));
        let params = test_params(0);
        pipe.run_frame(&params, &FullyLit);

        // Sampling at the exact center of a cell reproduces that cell.
        let s = params.settings.clamped();
        let uv = Vec2::new((2.0 + 0.5) / 4.0, (1.0 + 0.5) / 4.0);
        let depth = slice_to_depth(
            (2.0 + 0.5) / 4.0,
            params.near,
            params.far,
            s.depth_power,
        );
        let sampled = pipe.sample(uv, depth, &params);
        let direct = pipe.accumulated(2, 1, 2);
        assert!((sampled - direct).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_sample_interpolates_between_slices() {
        let mut pipe = CpuFogPipeline::new(FroxelGrid::new(2, 2, 4));
        let params = test_params(0);
        pipe.run_frame(&params, &FullyLit);

        let s = params.settings.clamped();
        let uv = Vec2::new(0.25, 0.25);
        // Halfway between the centers of slices 1 and 2.
        let depth = slice_to_depth(0.5, params.near, params.far, s.depth_power);
        let sampled = pipe.sample(uv, depth, &params).w;
        let t1 = pipe.accumulated(0, 0, 1).w;
        let t2 = pipe.accumulated(0, 0, 2).w;
        let (lo, hi) = (t1.min(t2), t1.max(t2));
        assert!(sampled >= lo - 1e-6 && sampled <= hi + 1e-6);
    }
}
