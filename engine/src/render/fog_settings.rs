//! Fog Settings
//!
//! Centralizes the tweakable volumetric fog parameters (density, scattering,
//! absorption, anisotropy, temporal accumulation) in a single
//! source-of-truth struct so the atmosphere can be tuned without touching
//! pipeline code. Serializable to JSON for saving/loading presets.

use serde::{Deserialize, Serialize};

/// Blend factor of the temporal exponential moving average: the weight of
/// the current frame against the accumulated history.
pub const TEMPORAL_BLEND_FACTOR: f32 = 0.05;

/// Volumetric fog parameters.
///
/// All coefficients obey the configuration contract: `scattering` and
/// `absorption` in [0, 1], `anisotropy` in [-1, 1], `density >= 0`,
/// `depth_power >= 1`. [`FogSettings::clamped`] enforces the contract on
/// values read from disk or a UI.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FogSettings {
    /// Global medium density multiplier (higher = thicker fog)
    pub density: f32,
    /// Scattering coefficient in [0, 1]
    pub scattering: f32,
    /// Absorption coefficient in [0, 1]
    pub absorption: f32,
    /// Henyey-Greenstein anisotropy g in [-1, 1]; positive = forward scattering
    pub anisotropy: f32,
    /// Directional light intensity multiplier
    pub light_intensity: f32,
    /// Ambient in-scattering intensity (no visibility test applied)
    pub ambient_intensity: f32,
    /// Shadow comparison bias in light NDC depth units
    pub shadow_bias: f32,
    /// Depth-slice curve exponent (>= 1); higher biases slices toward the camera
    pub depth_power: f32,
    /// Blend each frame against the history volume to smooth dither noise
    pub temporal_accumulation: bool,
}

impl Default for FogSettings {
    /// Returns a light morning-haze atmosphere.
    fn default() -> Self {
        Self {
            density: 0.3,
            scattering: 0.6,
            absorption: 0.05,
            anisotropy: 0.7,
            light_intensity: 10.0,
            ambient_intensity: 0.12,
            shadow_bias: 0.0015,
            depth_power: 2.0,
            temporal_accumulation: true,
        }
    }
}

impl FogSettings {
    /// Preset matching a clear morning with low haze and strong forward
    /// scattering (visible light shafts at grazing sun angles).
    pub fn clear_morning() -> Self {
        Self {
            density: 0.08,
            scattering: 0.35,
            absorption: 0.02,
            anisotropy: 0.8,
            ..Default::default()
        }
    }

    /// Preset for dense ground fog with reduced visibility.
    pub fn dense() -> Self {
        Self {
            density: 0.9,
            scattering: 0.85,
            absorption: 0.2,
            anisotropy: 0.4,
            ambient_intensity: 0.25,
            ..Default::default()
        }
    }

    /// Return a copy with every parameter forced into its contractual range.
    ///
    /// The pipeline never validates per frame; this is the single defensive
    /// normalization point so extinction/transmittance math cannot see
    /// negative or NaN inputs.
    pub fn clamped(self) -> Self {
        Self {
            density: sanitize(self.density, 0.0, f32::MAX),
            scattering: sanitize(self.scattering, 0.0, 1.0),
            absorption: sanitize(self.absorption, 0.0, 1.0),
            anisotropy: sanitize(self.anisotropy, -1.0, 1.0),
            light_intensity: sanitize(self.light_intensity, 0.0, f32::MAX),
            ambient_intensity: sanitize(self.ambient_intensity, 0.0, f32::MAX),
            shadow_bias: sanitize(self.shadow_bias, 0.0, 0.1),
            depth_power: sanitize(self.depth_power, 1.0, 16.0),
            temporal_accumulation: self.temporal_accumulation,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON string, clamping to the contract.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Self>(json).map(Self::clamped)
    }
}

#[inline]
fn sanitize(v: f32, min: f32, max: f32) -> f32 {
    if v.is_finite() { v.clamp(min, max) } else { min }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_in_contract() {
        let s = FogSettings::default();
        let c = s.clamped();
        assert_eq!(s.density, c.density);
        assert_eq!(s.scattering, c.scattering);
        assert_eq!(s.anisotropy, c.anisotropy);
        assert_eq!(s.depth_power, c.depth_power);
    }

    #[test]
    fn test_clamped_out_of_range() {
        let s = FogSettings {
            density: -1.0,
            scattering: 2.0,
            absorption: -0.5,
            anisotropy: 1.5,
            depth_power: 0.25,
            ..Default::default()
        }
        .clamped();
        assert_eq!(s.density, 0.0);
        assert_eq!(s.scattering, 1.0);
        assert_eq!(s.absorption, 0.0);
        assert_eq!(s.anisotropy, 1.0);
        assert_eq!(s.depth_power, 1.0);
    }

    #[test]
    fn test_clamped_rejects_nan() {
        let s = FogSettings {
            density: f32::NAN,
            scattering: f32::INFINITY,
            ..Default::default()
        }
        .clamped();
        // Non-finite values collapse to the safe lower bound.
        assert_eq!(s.density, 0.0);
        assert_eq!(s.scattering, 0.0);
    }

    #[test]
    fn test_json_round_trip() {
        let s = FogSettings::dense();
        let json = s.to_json().unwrap();
        let back = FogSettings::from_json(&json).unwrap();
        assert_eq!(s.density, back.density);
        assert_eq!(s.scattering, back.scattering);
        assert_eq!(s.temporal_accumulation, back.temporal_accumulation);
    }

    #[test]
    fn test_presets_in_contract() {
        for s in [FogSettings::clear_morning(), FogSettings::dense()] {
            let c = s.clamped();
            assert_eq!(s.density, c.density);
            assert_eq!(s.scattering, c.scattering);
            assert_eq!(s.absorption, c.absorption);
        }
    }
}
