/// Scene-owned inputs to shading: materials, object placement, and lights.

use serde::{Deserialize, Serialize};

use crate::engine::types::{Matrix3, Rgb, Vec3D};
use crate::error::ShaderError;
use crate::lighting::palette::Palette;
use crate::lighting::texture::{Texture, TextureMappingType};

/// Surface material. Read-only to the shading pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Blend between flat (0) and Lambertian (1) shading
    pub shading: f64,
    pub specular: f64,
    pub specular_width: f64,
    pub specular_color: Rgb,
    pub reflectance: f64,
    pub luminosity: f64,
    pub luminosity_color: Rgb,
    pub luminosity_texture_intensity: f64,
    pub color_texture_intensity: f64,
    pub diffusion_texture_intensity: f64,
    pub normal_map_strength: f64,

    /// Colour source for fractal objects
    pub use_colors_from_palette: bool,
    pub color: Rgb,
    pub palette: Palette,
    pub coloring_speed: f64,
    pub palette_offset: f64,

    pub texture_mapping: TextureMappingType,
    pub texture_center: Vec3D,
    pub texture_rotation: Matrix3,
    pub texture_scale: Vec3D,

    #[serde(skip)]
    pub color_texture: Option<Texture>,
    #[serde(skip)]
    pub diffusion_texture: Option<Texture>,
    #[serde(skip)]
    pub luminosity_texture: Option<Texture>,
    #[serde(skip)]
    pub normal_map_texture: Option<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            shading: 1.0,
            specular: 1.0,
            specular_width: 1.0,
            specular_color: Rgb::WHITE,
            reflectance: 0.0,
            luminosity: 0.0,
            luminosity_color: Rgb::WHITE,
            luminosity_texture_intensity: 0.0,
            color_texture_intensity: 1.0,
            diffusion_texture_intensity: 0.0,
            normal_map_strength: 1.0,
            use_colors_from_palette: true,
            color: Rgb::new(0.9, 0.9, 0.9),
            palette: Palette::default(),
            coloring_speed: 1.0,
            palette_offset: 0.0,
            texture_mapping: TextureMappingType::Planar,
            texture_center: Vec3D::ZERO,
            texture_rotation: Matrix3::default(),
            texture_scale: Vec3D::new(1.0, 1.0, 1.0),
            color_texture: None,
            diffusion_texture: None,
            luminosity_texture: None,
            normal_map_texture: None,
        }
    }
}

impl Material {
    pub fn validate(&self) -> Result<(), ShaderError> {
        if self.specular_width.is_nan() || self.specular_width <= 0.0 {
            return Err(ShaderError::invalid("material.specular_width", "must be positive"));
        }
        let s = &self.texture_scale;
        if s.x == 0.0 || s.y == 0.0 || s.z == 0.0 {
            return Err(ShaderError::invalid("material.texture_scale", "components must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    #[default]
    Fractal,
    Primitive,
    None,
}

/// Placement of the object that was hit.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectData {
    pub kind: ObjectKind,
    pub position: Vec3D,
    pub rotation: Matrix3,
    pub size: Vec3D,
}

impl Default for ObjectData {
    fn default() -> Self {
        Self {
            kind: ObjectKind::Fractal,
            position: Vec3D::ZERO,
            rotation: Matrix3::default(),
            size: Vec3D::new(1.0, 1.0, 1.0),
        }
    }
}

/// Point light.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSource {
    pub position: Vec3D,
    pub colour: Rgb,
    pub intensity: f64,
    pub enabled: bool,
}

impl LightSource {
    /// Stand-in for slots past the end of the light list.
    pub const DISABLED: LightSource = LightSource {
        position: Vec3D::ZERO,
        colour: Rgb::BLACK,
        intensity: 0.0,
        enabled: false,
    };
}

impl Default for LightSource {
    fn default() -> Self {
        Self { position: Vec3D::ZERO, colour: Rgb::WHITE, intensity: 1.0, enabled: true }
    }
}

/// Minimum number of auxiliary light slots iterated by the shaders.
pub const MIN_LIGHT_SLOTS: usize = 4;

/// Ordered auxiliary lights.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lights {
    pub lights: Vec<LightSource>,
}

impl Lights {
    pub fn new(lights: Vec<LightSource>) -> Self {
        Self { lights }
    }

    /// Light in slot `i`, or a disabled zero light past the end.
    pub fn get(&self, i: usize) -> &LightSource {
        self.lights.get(i).unwrap_or(&LightSource::DISABLED)
    }

    /// Slots the shaders iterate: never fewer than four.
    pub fn effective_count(&self) -> usize {
        self.lights.len().max(MIN_LIGHT_SLOTS)
    }

    /// Whether slot `i` is shaded: forced for slots below `min_active`,
    /// otherwise by the light's own flag.
    pub fn is_active(&self, i: usize, min_active: usize) -> bool {
        i < min_active || self.get(i).enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_count_floor() {
        assert_eq!(Lights::default().effective_count(), 4);
        let many = Lights::new(vec![LightSource::default(); 6]);
        assert_eq!(many.effective_count(), 6);
    }

    #[test]
    fn test_get_past_end_is_disabled() {
        let lights = Lights::new(vec![LightSource::default()]);
        assert!(lights.get(0).enabled);
        assert_eq!(lights.get(3), &LightSource::DISABLED);
    }

    #[test]
    fn test_activation_rule() {
        let mut off = LightSource::default();
        off.enabled = false;
        let lights = Lights::new(vec![off.clone(), off, LightSource::default()]);
        assert!(lights.is_active(0, 1));
        assert!(!lights.is_active(1, 1));
        assert!(lights.is_active(2, 0));
        assert!(lights.is_active(3, 4));
    }

    #[test]
    fn test_material_validation() {
        assert!(Material::default().validate().is_ok());
        let mut m = Material::default();
        m.specular_width = 0.0;
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_lights_deserialize_as_list() {
        let lights: Lights = serde_json::from_str(r#"[{"intensity":2.0},{"enabled":false}]"#).unwrap();
        assert_eq!(lights.lights.len(), 2);
        assert_eq!(lights.lights[0].intensity, 2.0);
        assert!(!lights.lights[1].enabled);
    }
}
