/// Surface shading: albedo lookup and the composer that combines every
/// lighting term at a hit point.

use crate::engine::types::{RenderStats, Rgb, Rgba};
use crate::lighting::light::{main_shading, main_specular};
use crate::lighting::material::ObjectKind;
use crate::lighting::palette::PALETTE_INDEX_RANGE;
use crate::lighting::params::AoMode;
use crate::lighting::texture::{env_mapping, normal_map_shader, texture_shader};
use crate::lighting::{Shader, ShaderInput};

/// Palette colour indices wrap at this bound before speed and offset apply.
const COLOUR_INDEX_WRAP: i64 = 248 * 256;

/// Result of shading an opaque surface hit.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceShade {
    /// Diffuse radiance, alpha 1
    pub radiance: Rgba,
    /// Specular highlight, composited separately
    pub specular: Rgb,
    /// Albedo after texture blending
    pub colour: Rgb,
}

impl<'a> Shader<'a> {
    /// Albedo at the hit point.
    pub fn surface_colour(&self, input: &ShaderInput) -> Rgb {
        let material = input.material;
        match input.object.kind {
            ObjectKind::Fractal if material.use_colors_from_palette => {
                let out = self.orbits.orbit(&input.point, 0, self.params.quality.n.saturating_mul(10));
                let index = if out.colour_index.is_finite() { out.colour_index.floor() as i64 } else { 0 };
                let index = index.abs() % COLOUR_INDEX_WRAP;
                let colour_number = (index as f64 * material.coloring_speed + 256.0 * material.palette_offset) as i64;
                let colour_number = colour_number.rem_euclid(PALETTE_INDEX_RANGE as i64) as u32;
                material.palette.index_to_colour(colour_number)
            }
            ObjectKind::Fractal | ObjectKind::Primitive => material.color,
            ObjectKind::None => Rgb::BLACK,
        }
    }

    /// Fill in the surface-dependent parts of `input`: the estimated normal,
    /// perturbed by the material's normal map, and the diffusion texture
    /// sample.
    pub fn prepare_surface_input<'b>(&self, input: &ShaderInput<'b>, stats: &mut RenderStats) -> ShaderInput<'b> {
        let mut prepared = ShaderInput { normal: self.calculate_normal(input, stats), ..*input };
        let material = input.material;
        if let Some(normal_map) = &material.normal_map_texture {
            prepared.normal = normal_map_shader(&prepared, normal_map);
        }
        prepared.tex_diffuse = match &material.diffusion_texture {
            Some(tex) => texture_shader(&prepared, tex),
            None => Rgb::WHITE,
        };
        prepared
    }

    /// Combine main light, shadow, aux and fake lights, ambient occlusion,
    /// environment reflection, and luminosity into the surface radiance.
    pub fn object_shader(&self, input: &ShaderInput, stats: &mut RenderStats) -> SurfaceShade {
        let p = self.params;
        let material = input.material;

        let main_light = p.main_light.colour.scale(p.main_light.intensity);

        let tex_color = match &material.color_texture {
            Some(tex) => texture_shader(input, tex),
            None => Rgb::WHITE,
        };
        let tex_luminosity = match &material.luminosity_texture {
            Some(tex) => texture_shader(input, tex),
            None => Rgb::BLACK,
        };

        let mut shade = Rgb::BLACK;
        let mut specular = Rgb::BLACK;
        let mut shadow = Rgb::WHITE;
        if p.main_light.enabled {
            let lambert = main_shading(input);
            shade = Rgb::gray(1.0 - material.shading).add(&lambert.scale(material.shading));
            specular = main_specular(input).scale(material.specular);
            if p.shadow.enabled {
                shadow = self.main_shadow(input, stats).rgb();
            }
        }

        let tex_int = material.color_texture_intensity;
        let colour = self
            .surface_colour(input)
            .mul(&tex_color.scale(tex_int).add(&Rgb::gray(1.0 - tex_int)));

        let ambient = if p.ambient_occlusion.enabled {
            let ao = match p.ambient_occlusion.mode {
                AoMode::Fast => self.fast_ambient_occlusion(input, stats),
                AoMode::MultipleRays => self.ambient_occlusion(input, stats),
            };
            ao.rgb().scale(p.ambient_occlusion.intensity)
        } else {
            Rgb::BLACK
        };

        let env = match (&self.textures.env_map, p.env_mapping_enable) {
            (Some(map), true) => env_mapping(input, map).scale(material.reflectance).mul(&input.tex_diffuse),
            _ => Rgb::BLACK,
        };

        let (aux, aux_specular) = self.aux_lights_shader(input, stats);
        let fake = if p.fake_lights.enabled { self.fake_lights(input) } else { Rgb::BLACK };

        let luminosity = tex_luminosity
            .scale(material.luminosity_texture_intensity)
            .add(&material.luminosity_color.scale(material.luminosity));

        let direct = ambient.add(&main_light.mul(&shade).mul(&shadow));
        let out = env
            .add(&direct.mul(&colour))
            .add(&aux.add(&fake).mul(&colour))
            .add(&luminosity);

        SurfaceShade {
            radiance: out.with_alpha(1.0),
            specular: aux_specular.add(&main_light.mul(&specular).mul(&shadow)),
            colour,
        }
    }

    /// Estimate the normal at a hit and shade it.
    pub fn shade_surface(&self, input: &ShaderInput, stats: &mut RenderStats) -> SurfaceShade {
        let prepared = self.prepare_surface_input(input, stats);
        self.object_shader(&prepared, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::primitives::PrimitiveScene;
    use crate::engine::types::Vec3D;
    use crate::lighting::material::{Lights, Material, ObjectData};
    use crate::lighting::params::ShaderParams;
    use crate::lighting::palette::Palette;
    use crate::lighting::testing::{input_at, ConstantField};
    use crate::lighting::texture::Texture;
    use crate::lighting::SceneTextures;

    fn flat_params() -> ShaderParams {
        let mut params = ShaderParams::all_disabled();
        params.main_light.enabled = true;
        params
    }

    fn flat_material() -> Material {
        Material {
            shading: 1.0,
            specular: 0.0,
            use_colors_from_palette: false,
            color: Rgb::new(0.8, 0.4, 0.2),
            ..Material::default()
        }
    }

    #[test]
    fn test_main_light_reduces_to_intensity_times_albedo() {
        let mut params = flat_params();
        params.main_light.intensity = 0.7;
        let field = ConstantField { distance: 1.0, iters: 0 };
        let lights = Lights::default();
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &field, &field, &textures);
        let material = flat_material();
        let object = ObjectData::default();
        let input = input_at(Vec3D::ZERO, Vec3D::Z, &material, &object, &[]);
        let mut stats = RenderStats::default();

        let out = shader.object_shader(&input, &mut stats);
        assert!((out.radiance.r - 0.7 * 0.8).abs() < 1e-12);
        assert!((out.radiance.g - 0.7 * 0.4).abs() < 1e-12);
        assert!((out.radiance.b - 0.7 * 0.2).abs() < 1e-12);
        assert_eq!(out.radiance.a, 1.0);
        assert_eq!(out.specular, Rgb::BLACK);
        assert_eq!(out.colour, material.color);
        assert_eq!(stats.de_queries, 0);
    }

    #[test]
    fn test_shadow_darkens_main_light_only() {
        let mut params = flat_params();
        params.shadow.enabled = true;
        params.shadow.penetrating_lights = false;
        params.shadow.cone_angle = 0.0;
        let wall = ConstantField { distance: 0.0, iters: 0 };
        let lights = Lights::default();
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &wall, &wall, &textures);
        let mut material = flat_material();
        material.luminosity = 0.5;
        let object = ObjectData::default();
        let input = input_at(Vec3D::ZERO, Vec3D::Z, &material, &object, &[]);
        let mut stats = RenderStats::default();

        let out = shader.object_shader(&input, &mut stats);
        // Only the flat luminosity survives
        assert!((out.radiance.r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ambient_and_luminosity_add() {
        let mut params = ShaderParams::all_disabled();
        params.ambient_occlusion.enabled = true;
        params.ambient_occlusion.intensity = 0.5;
        let open = ConstantField { distance: 100.0, iters: 0 };
        let lights = Lights::default();
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &open, &open, &textures);
        let mut material = flat_material();
        material.luminosity = 0.25;
        material.luminosity_color = Rgb::new(1.0, 0.0, 0.0);
        let object = ObjectData::default();
        let input = input_at(Vec3D::ZERO, Vec3D::Z, &material, &object, &[]);
        let mut stats = RenderStats::default();

        let out = shader.object_shader(&input, &mut stats);
        // Unoccluded fast AO is 1
        assert!((out.radiance.r - (0.5 * 0.8 + 0.25)).abs() < 1e-12);
        assert!((out.radiance.g - 0.5 * 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_color_texture_blend() {
        let params = flat_params();
        let field = ConstantField { distance: 1.0, iters: 0 };
        let lights = Lights::default();
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &field, &field, &textures);
        let mut material = flat_material();
        material.color = Rgb::WHITE;
        material.color_texture = Some(Texture::solid(Rgb::new(0.0, 0.5, 1.0)));
        material.color_texture_intensity = 0.5;
        let object = ObjectData::default();
        let input = input_at(Vec3D::ZERO, Vec3D::Z, &material, &object, &[]);
        let mut stats = RenderStats::default();
        let out = shader.object_shader(&input, &mut stats);
        assert!((out.colour.r - 0.5).abs() < 1e-12);
        assert!((out.colour.g - 0.75).abs() < 1e-12);
        assert!((out.colour.b - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_env_mapping_scaled_by_reflectance() {
        let mut params = ShaderParams::all_disabled();
        params.env_mapping_enable = true;
        let field = ConstantField { distance: 1.0, iters: 0 };
        let lights = Lights::default();
        let textures = SceneTextures {
            env_map: Some(Texture::solid(Rgb::new(0.2, 0.4, 0.6))),
            ..SceneTextures::default()
        };
        let shader = Shader::new(&params, &lights, &field, &field, &textures);
        let mut material = flat_material();
        material.reflectance = 0.5;
        let object = ObjectData::default();
        let input = input_at(Vec3D::ZERO, Vec3D::Z, &material, &object, &[]);
        let mut stats = RenderStats::default();
        let out = shader.object_shader(&input, &mut stats);
        assert!((out.radiance.b - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_surface_colour_sources() {
        let params = ShaderParams::default();
        let scene = PrimitiveScene::sphere(1.0);
        let lights = Lights::default();
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &scene, &scene, &textures);
        let mut material = Material::default();
        material.palette = Palette::new(vec![Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 0.0, 1.0)]);
        material.coloring_speed = 0.0;

        let fractal = ObjectData::default();
        let input = input_at(Vec3D::X, Vec3D::X, &material, &fractal, &[]);
        assert_eq!(shader.surface_colour(&input), Rgb::new(1.0, 0.0, 0.0));

        // Offset one full entry
        material.palette_offset = 1.0;
        let input = input_at(Vec3D::X, Vec3D::X, &material, &fractal, &[]);
        assert_eq!(shader.surface_colour(&input), Rgb::new(0.0, 0.0, 1.0));

        let primitive = ObjectData { kind: ObjectKind::Primitive, ..ObjectData::default() };
        let input = input_at(Vec3D::X, Vec3D::X, &material, &primitive, &[]);
        assert_eq!(shader.surface_colour(&input), material.color);

        let none = ObjectData { kind: ObjectKind::None, ..ObjectData::default() };
        let input = input_at(Vec3D::X, Vec3D::X, &material, &none, &[]);
        assert_eq!(shader.surface_colour(&input), Rgb::BLACK);
    }

    #[test]
    fn test_prepare_surface_input_on_sphere() {
        let params = ShaderParams::default();
        let scene = PrimitiveScene::sphere(1.0);
        let lights = Lights::default();
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &scene, &scene, &textures);
        let mut material = Material::default();
        material.diffusion_texture = Some(Texture::solid(Rgb::gray(0.5)));
        let object = ObjectData::default();
        let mut input = input_at(Vec3D::new(0.0, 1.0, 0.0), Vec3D::ZERO, &material, &object, &[]);
        input.delta = 1e-6;
        let mut stats = RenderStats::default();
        let prepared = shader.prepare_surface_input(&input, &mut stats);
        assert!((prepared.normal.y - 1.0).abs() < 1e-5);
        assert!((prepared.tex_diffuse.g - 0.5).abs() < 1e-12);
    }
}
