/// Render parameters read by the shading pipeline.
///
/// Scene-lifetime and read-only during a render pass. Loaded from JSON at
/// the host boundary, validated once, then shared by reference with every
/// worker.

use serde::{Deserialize, Serialize};

use crate::engine::types::{Rgb, Vec3D};
use crate::error::ShaderError;
use crate::math::math3d;

/// Main directional light.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MainLightParams {
    pub enabled: bool,
    pub intensity: f64,
    pub colour: Rgb,
    /// Direction toward the light as azimuth / elevation (radians)
    pub alpha: f64,
    pub beta: f64,
    /// Strength of the light halo drawn on the background
    pub visibility: f64,
    /// Angular size of the halo, in degrees
    pub visibility_size: f64,
}

impl Default for MainLightParams {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 1.0,
            colour: Rgb::WHITE,
            alpha: -0.785,
            beta: 0.785,
            visibility: 1.0,
            visibility_size: 1.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowParams {
    pub enabled: bool,
    /// Emulated light-cone half angle in degrees (0 = hard shadows)
    pub cone_angle: f64,
    /// Occluders attenuate instead of fully blocking
    pub penetrating_lights: bool,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self { enabled: true, cone_angle: 1.0, penetrating_lights: true }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AoMode {
    #[default]
    Fast,
    MultipleRays,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusionParams {
    pub enabled: bool,
    pub mode: AoMode,
    /// Weight of the ambient term
    pub intensity: f64,
    pub quality: u32,
    /// Fast mode: weight of the sampled distance against the scan length
    pub fast_tune: f64,
}

impl Default for AmbientOcclusionParams {
    fn default() -> Self {
        Self { enabled: true, mode: AoMode::Fast, intensity: 1.0, quality: 4, fast_tune: 1.0 }
    }
}

/// Marching quality and the depth-dependent threshold model.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    pub camera: Vec3D,
    /// Step multiplier for sphere tracing (< 1 is more conservative)
    pub de_factor: f64,
    /// Angular size of one pixel
    pub resolution: f64,
    pub fov: f64,
    pub detail_level: f64,
    pub constant_de_threshold: bool,
    pub de_thresh: f64,
    pub view_distance_max: f64,
    /// Normal sampling offset multiplier
    pub smoothness: f64,
    /// Use the averaged central-difference normal
    pub slow_shading: bool,
    pub interior_mode: bool,
    pub limits_enabled: bool,
    pub iter_thresh_mode: bool,
    /// Fractal iteration limits
    pub min_n: u32,
    pub n: u32,
}

impl Default for QualityParams {
    fn default() -> Self {
        Self {
            camera: Vec3D::new(0.0, -3.0, 0.0),
            de_factor: 1.0,
            resolution: 1.0 / 800.0,
            fov: 1.0,
            detail_level: 1.0,
            constant_de_threshold: false,
            de_thresh: 0.01,
            view_distance_max: 50.0,
            smoothness: 1.0,
            slow_shading: false,
            interior_mode: false,
            limits_enabled: false,
            iter_thresh_mode: false,
            min_n: 1,
            n: 250,
        }
    }
}

impl QualityParams {
    /// Surface threshold at `point`: constant, or growing with the distance
    /// from the camera so detail matches the pixel footprint.
    pub fn dist_thresh(&self, point: &Vec3D) -> f64 {
        if self.constant_de_threshold {
            self.de_thresh
        } else {
            self.delta(point) / self.detail_level
        }
    }

    /// Pixel footprint at `point`.
    pub fn delta(&self, point: &Vec3D) -> f64 {
        math3d::vec3d_length(&(self.camera - *point)) * self.resolution * self.fov
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FogParams {
    pub enabled: bool,
    pub visibility: f64,
    pub colour: Rgb,
}

impl Default for FogParams {
    fn default() -> Self {
        Self { enabled: false, visibility: 20.0, colour: Rgb::new(0.5, 0.6, 0.7) }
    }
}

/// Three-band distance fog.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumetricFogParams {
    pub enabled: bool,
    pub density: f64,
    /// Falloff radius of the fog density around surfaces
    pub distance_factor: f64,
    pub colour_1: Rgb,
    pub colour_2: Rgb,
    pub colour_3: Rgb,
    pub colour_1_distance: f64,
    pub colour_2_distance: f64,
}

impl Default for VolumetricFogParams {
    fn default() -> Self {
        Self {
            enabled: false,
            density: 0.5,
            distance_factor: 0.5,
            colour_1: Rgb::new(0.0, 0.5, 1.0),
            colour_2: Rgb::new(1.0, 1.0, 1.0),
            colour_3: Rgb::new(1.0, 0.5, 0.0),
            colour_1_distance: 1.0,
            colour_2_distance: 2.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GlowParams {
    pub enabled: bool,
    pub intensity: f64,
    pub colour_1: Rgb,
    pub colour_2: Rgb,
}

impl Default for GlowParams {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.2,
            colour_1: Rgb::new(0.25, 0.5, 1.0),
            colour_2: Rgb::new(1.0, 1.0, 1.0),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuxLightParams {
    /// Slots below this index are shaded even when disabled
    pub min_active: usize,
    /// Strength of the visible light spheres in the volume
    pub visibility: f64,
    pub visibility_size: f64,
}

impl Default for AuxLightParams {
    fn default() -> Self {
        Self { min_active: 0, visibility: 0.0, visibility_size: 1.0 }
    }
}

/// Orbit-trap pseudo lights.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FakeLightParams {
    pub enabled: bool,
    pub intensity: f64,
    pub visibility: f64,
    pub visibility_size: f64,
}

impl Default for FakeLightParams {
    fn default() -> Self {
        Self { enabled: false, intensity: 1.0, visibility: 5.0, visibility_size: 5.0 }
    }
}

/// Shadowed light shafts. Slot 0 is the main light, slots 1..=4 are the
/// first four auxiliary lights.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumetricLightParams {
    pub enabled: [bool; 5],
    pub intensity: [f64; 5],
}

impl VolumetricLightParams {
    pub fn any_enabled(&self) -> bool {
        self.enabled.iter().any(|e| *e)
    }
}

/// Fog whose density follows the fractal iteration count.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IterFogParams {
    pub enabled: bool,
    /// Opacity speed
    pub opacity: f64,
    /// Iteration count below which the fog is transparent
    pub opacity_trim: f64,
    pub colour_1_maxiter: f64,
    pub colour_2_maxiter: f64,
    pub colour_1: Rgb,
    pub colour_2: Rgb,
    pub colour_3: Rgb,
}

impl Default for IterFogParams {
    fn default() -> Self {
        Self {
            enabled: false,
            opacity: 1000.0,
            opacity_trim: 4.0,
            colour_1_maxiter: 8.0,
            colour_2_maxiter: 12.0,
            colour_1: Rgb::new(1.0, 1.0, 1.0),
            colour_2: Rgb::new(1.0, 0.8, 0.5),
            colour_3: Rgb::new(0.5, 0.5, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMapping {
    #[default]
    Equirectangular,
    DoubleHemisphere,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundParams {
    pub textured: bool,
    pub mapping: BackgroundMapping,
    pub brightness: f64,
    /// Gradient stops: top, horizon, bottom
    pub colour_1: Rgb,
    pub colour_2: Rgb,
    pub colour_3: Rgb,
}

impl Default for BackgroundParams {
    fn default() -> Self {
        Self {
            textured: false,
            mapping: BackgroundMapping::Equirectangular,
            brightness: 1.0,
            colour_1: Rgb::new(0.0, 0.6, 0.8),
            colour_2: Rgb::new(1.0, 1.0, 1.0),
            colour_3: Rgb::new(0.0, 0.2, 0.4),
        }
    }
}

/// All toggles and scalars controlling the optical effects.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderParams {
    pub main_light: MainLightParams,
    pub shadow: ShadowParams,
    pub ambient_occlusion: AmbientOcclusionParams,
    pub quality: QualityParams,
    pub fog: FogParams,
    pub vol_fog: VolumetricFogParams,
    pub glow: GlowParams,
    pub aux_lights: AuxLightParams,
    pub fake_lights: FakeLightParams,
    pub volumetric_light: VolumetricLightParams,
    pub iter_fog: IterFogParams,
    pub background: BackgroundParams,
    pub env_mapping_enable: bool,
}

impl ShaderParams {
    /// Parse and validate parameters from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ShaderError> {
        let params: ShaderParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Every optical effect off: no lights, fog, glow, AO, or shadows.
    pub fn all_disabled() -> Self {
        let mut params = ShaderParams::default();
        params.main_light.enabled = false;
        params.shadow.enabled = false;
        params.ambient_occlusion.enabled = false;
        params.fog.enabled = false;
        params.vol_fog.enabled = false;
        params.glow.enabled = false;
        params.aux_lights.visibility = 0.0;
        params.fake_lights.enabled = false;
        params.volumetric_light = VolumetricLightParams::default();
        params.iter_fog.enabled = false;
        params.env_mapping_enable = false;
        params
    }

    /// Unit vector pointing toward the main light.
    pub fn main_light_vector(&self) -> Vec3D {
        math3d::vec3d_from_angles(self.main_light.alpha, self.main_light.beta)
    }

    /// Reject configurations the pipeline cannot shade meaningfully.
    pub fn validate(&self) -> Result<(), ShaderError> {
        let q = &self.quality;
        positive("quality.resolution", q.resolution)?;
        positive("quality.fov", q.fov)?;
        positive("quality.detail_level", q.detail_level)?;
        positive("quality.de_factor", q.de_factor)?;
        positive("quality.view_distance_max", q.view_distance_max)?;
        if q.constant_de_threshold {
            positive("quality.de_thresh", q.de_thresh)?;
        }
        if q.n == 0 {
            return Err(ShaderError::invalid("quality.n", "must be at least 1"));
        }
        if self.fog.enabled {
            positive("fog.visibility", self.fog.visibility)?;
        }
        if self.vol_fog.enabled {
            positive("vol_fog.colour_1_distance", self.vol_fog.colour_1_distance)?;
            positive("vol_fog.colour_2_distance", self.vol_fog.colour_2_distance)?;
        }
        if self.ambient_occlusion.enabled && self.ambient_occlusion.quality == 0 {
            return Err(ShaderError::invalid("ambient_occlusion.quality", "must be at least 1"));
        }
        if self.aux_lights.visibility > 0.0 {
            positive("aux_lights.visibility_size", self.aux_lights.visibility_size)?;
        }
        if self.fake_lights.enabled {
            positive("fake_lights.visibility_size", self.fake_lights.visibility_size)?;
        }
        if self.main_light.visibility > 0.0 {
            positive("main_light.visibility_size", self.main_light.visibility_size)?;
        }
        let f = &self.iter_fog;
        if f.enabled && !(f.opacity_trim < f.colour_1_maxiter && f.colour_1_maxiter < f.colour_2_maxiter) {
            return Err(ShaderError::invalid(
                "iter_fog",
                format!(
                    "breakpoints must increase: trim {} < colour_1 {} < colour_2 {}",
                    f.opacity_trim, f.colour_1_maxiter, f.colour_2_maxiter
                ),
            ));
        }
        if self.main_light.intensity < 0.0 {
            log::warn!("main light intensity {} is negative", self.main_light.intensity);
        }
        Ok(())
    }
}

fn positive(name: &'static str, v: f64) -> Result<(), ShaderError> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(ShaderError::invalid(name, format!("must be a positive finite number, got {v}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ShaderParams::default().validate().is_ok());
        assert!(ShaderParams::all_disabled().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params = ShaderParams::from_json(r#"{"fog":{"enabled":true,"visibility":3.5}}"#).unwrap();
        assert!(params.fog.enabled);
        assert_eq!(params.fog.visibility, 3.5);
        assert_eq!(params.ambient_occlusion.quality, 4);
    }

    #[test]
    fn test_rejects_zero_fog_visibility() {
        let err = ShaderParams::from_json(r#"{"fog":{"enabled":true,"visibility":0.0}}"#).unwrap_err();
        assert!(matches!(err, ShaderError::InvalidParameter { name: "fog.visibility", .. }));
    }

    #[test]
    fn test_rejects_unordered_iter_fog() {
        let json = r#"{"iter_fog":{"enabled":true,"opacity_trim":10,"colour_1_maxiter":8,"colour_2_maxiter":12}}"#;
        assert!(ShaderParams::from_json(json).is_err());
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(ShaderParams::from_json("{not json"), Err(ShaderError::Parse(_))));
    }

    #[test]
    fn test_main_light_vector_is_unit() {
        let v = ShaderParams::default().main_light_vector();
        assert!((math3d::vec3d_length(&v) - 1.0).abs() < 1e-12);
    }
}
