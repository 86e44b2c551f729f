//! Dither Sequence
//!
//! Precomputed low-discrepancy jitter patterns for the light-injection
//! stage. Each frame picks one pattern (`frame_index mod sequence length`)
//! and offsets every froxel sample along its view ray by the pattern value,
//! which breaks up slice banding into noise the temporal stage then averages
//! away.
//!
//! The base pattern is an 8×8 ordered (Bayer) matrix; successive patterns
//! rotate it by the golden-ratio sequence, so any run of consecutive frames
//! covers the unit interval close to uniformly.

use super::froxel_config::DITHER_SEQUENCE_LENGTH;

/// Side length of one dither pattern in texels.
pub const DITHER_PATTERN_SIZE: u32 = 8;

/// Fractional part of the golden ratio; the increment of the R1 sequence.
const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;

/// Classic 8×8 Bayer matrix, values 0..64 in dispersed order.
const BAYER_8X8: [u8; 64] = [
    0, 32, 8, 40, 2, 34, 10, 42, //
    48, 16, 56, 24, 50, 18, 58, 26, //
    12, 44, 4, 36, 14, 46, 6, 38, //
    60, 28, 52, 20, 62, 30, 54, 22, //
    3, 35, 11, 43, 1, 33, 9, 41, //
    51, 19, 59, 27, 49, 17, 57, 25, //
    15, 47, 7, 39, 13, 45, 5, 37, //
    63, 31, 55, 23, 61, 29, 53, 21,
];

/// The full precomputed pattern sequence. Created once at pipeline
/// initialization and shared by the CPU reference and the GPU upload.
pub struct DitherSequence {
    patterns: Vec<[f32; (DITHER_PATTERN_SIZE * DITHER_PATTERN_SIZE) as usize]>,
}

impl Default for DitherSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl DitherSequence {
    /// Generate all `DITHER_SEQUENCE_LENGTH` patterns.
    pub fn new() -> Self {
        let texels = (DITHER_PATTERN_SIZE * DITHER_PATTERN_SIZE) as usize;
        let mut patterns = Vec::with_capacity(DITHER_SEQUENCE_LENGTH as usize);
        for k in 0..DITHER_SEQUENCE_LENGTH {
            let shift = k as f32 * GOLDEN_RATIO_CONJUGATE;
            let mut pattern = [0.0f32; 64];
            for i in 0..texels {
                let base = (BAYER_8X8[i] as f32 + 0.5) / 64.0;
                pattern[i] = (base + shift).fract();
            }
            patterns.push(pattern);
        }
        Self { patterns }
    }

    /// Pattern selected for a frame: cycles through the sequence when
    /// temporal accumulation is enabled, else stays on pattern 0 so a
    /// non-accumulating image is stable.
    #[inline]
    pub fn pattern_index(frame_index: u32, temporal_enabled: bool) -> u32 {
        if temporal_enabled {
            frame_index % DITHER_SEQUENCE_LENGTH
        } else {
            0
        }
    }

    /// Jitter value in [0, 1) at texel (x, y) of the given pattern.
    /// Coordinates wrap, so callers can index with raw froxel coordinates.
    #[inline]
    pub fn value(&self, pattern: u32, x: u32, y: u32) -> f32 {
        let px = x % DITHER_PATTERN_SIZE;
        let py = y % DITHER_PATTERN_SIZE;
        self.patterns[(pattern % DITHER_SEQUENCE_LENGTH) as usize]
            [(py * DITHER_PATTERN_SIZE + px) as usize]
    }

    /// Upload the sequence as an R8Unorm 2D texture array, one layer per
    /// pattern, for the injection shader to `textureLoad` from.
    pub fn create_texture(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let size = wgpu::Extent3d {
            width: DITHER_PATTERN_SIZE,
            height: DITHER_PATTERN_SIZE,
            depth_or_array_layers: DITHER_SEQUENCE_LENGTH,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Fog Dither Sequence"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut data =
            Vec::with_capacity((DITHER_PATTERN_SIZE * DITHER_PATTERN_SIZE * DITHER_SEQUENCE_LENGTH) as usize);
        for pattern in &self.patterns {
            for &v in pattern.iter() {
                data.push((v * 256.0).min(255.0) as u8);
            }
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(DITHER_PATTERN_SIZE),
                rows_per_image: Some(DITHER_PATTERN_SIZE),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Fog Dither Sequence View"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        (texture, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_index_wraparound() {
        assert_eq!(
            DitherSequence::pattern_index(0, true),
            DitherSequence::pattern_index(16, true)
        );
        assert_eq!(
            DitherSequence::pattern_index(16, true),
            DitherSequence::pattern_index(32, true)
        );
        assert_ne!(
            DitherSequence::pattern_index(15, true),
            DitherSequence::pattern_index(16, true)
        );
    }

    #[test]
    fn test_pattern_index_fixed_when_disabled() {
        for frame in [0, 1, 7, 15, 16, 1000] {
            assert_eq!(DitherSequence::pattern_index(frame, false), 0);
        }
    }

    #[test]
    fn test_values_in_unit_interval() {
        let seq = DitherSequence::new();
        for p in 0..DITHER_SEQUENCE_LENGTH {
            for y in 0..DITHER_PATTERN_SIZE {
                for x in 0..DITHER_PATTERN_SIZE {
                    let v = seq.value(p, x, y);
                    assert!((0.0..1.0).contains(&v), "pattern {} ({}, {}) = {}", p, x, y, v);
                }
            }
        }
    }

    #[test]
    fn test_patterns_differ() {
        let seq = DitherSequence::new();
        // Consecutive patterns must disagree somewhere (wildly, in fact).
        for p in 0..DITHER_SEQUENCE_LENGTH - 1 {
            let mut max_diff = 0.0f32;
            for i in 0..DITHER_PATTERN_SIZE * DITHER_PATTERN_SIZE {
                let (x, y) = (i % DITHER_PATTERN_SIZE, i / DITHER_PATTERN_SIZE);
                max_diff = max_diff.max((seq.value(p, x, y) - seq.value(p + 1, x, y)).abs());
            }
            assert!(max_diff > 0.1, "patterns {} and {} nearly identical", p, p + 1);
        }
    }

    #[test]
    fn test_patterns_cover_unit_interval() {
        let seq = DitherSequence::new();
        // Every pattern is a shifted Bayer matrix: the mean stays near 0.5.
        for p in 0..DITHER_SEQUENCE_LENGTH {
            let mut sum = 0.0f32;
            for y in 0..DITHER_PATTERN_SIZE {
                for x in 0..DITHER_PATTERN_SIZE {
                    sum += seq.value(p, x, y);
                }
            }
            let mean = sum / 64.0;
            assert!((mean - 0.5).abs() < 0.05, "pattern {} mean {}", p, mean);
        }
    }

    #[test]
    fn test_coordinates_wrap() {
        let seq = DitherSequence::new();
        assert_eq!(seq.value(3, 2, 5), seq.value(3, 2 + 8, 5 + 16));
    }
}
