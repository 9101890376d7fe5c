/// Sky radiance for rays that miss all geometry.

use std::f64::consts::PI;

use crate::engine::types::{Rgb, Rgba, Vec3D};
use crate::lighting::params::BackgroundMapping;
use crate::lighting::texture::Texture;
use crate::lighting::{Shader, ShaderInput};
use crate::math::{math3d, utils};

impl<'a> Shader<'a> {
    /// Background along `input.view_vector`: a vertical three-stop gradient
    /// or a panorama texture, plus the halo of the main light. Alpha is 0.
    pub fn background_shader(&self, input: &ShaderInput) -> Rgba {
        let bg = &self.params.background;
        let view = math3d::vec3d_normalized(&input.view_vector);

        let mut pixel = match (&self.textures.background, bg.textured) {
            (Some(texture), true) => {
                let sample = match bg.mapping {
                    BackgroundMapping::DoubleHemisphere => double_hemisphere(texture, &view),
                    BackgroundMapping::Equirectangular => equirectangular(texture, &view),
                };
                sample.scale(bg.brightness)
            }
            _ => {
                let grad = math3d::vec3d_dot(&view, &Vec3D::Z) + 1.0;
                if grad < 1.0 {
                    bg.colour_3.mix(&bg.colour_2, grad)
                } else {
                    bg.colour_2.mix(&bg.colour_1, grad - 1.0)
                }
            }
        };

        let main = &self.params.main_light;
        let halo = (math3d::vec3d_dot(&view, &input.light_vect) - 1.0) * 360.0 / main.visibility_size;
        let halo = 1.0 / (1.0 + halo.powi(6)) * main.visibility * main.intensity;
        pixel = pixel.add(&main.colour.scale(halo));

        pixel.with_alpha(0.0)
    }
}

fn equirectangular(texture: &Texture, view: &Vec3D) -> Rgb {
    let alpha = utils::wrap(math3d::vec3d_alpha(view) + 2.5 * PI, 2.0 * PI);
    let mut beta = -math3d::vec3d_beta(view);
    if beta > 0.5 * PI {
        beta = 0.5 * PI - beta;
    }
    if beta < -0.5 * PI {
        beta = -0.5 * PI + beta;
    }
    let x = alpha / (2.0 * PI) * texture.width() as f64;
    let y = (beta / PI + 0.5) * texture.height() as f64;
    texture.pixel(x, y)
}

/// Upper hemisphere in the left half of the texture, lower in the right.
fn double_hemisphere(texture: &Texture, view: &Vec3D) -> Rgb {
    let mut alpha = math3d::vec3d_alpha(view);
    let mut beta = math3d::vec3d_beta(view);
    let half_width = (texture.width() / 2) as f64;
    let height = texture.height() as f64;
    let mut offset = 0.0;
    if beta < 0.0 {
        beta = -beta;
        alpha = PI - alpha;
        offset = half_width;
    }
    let radius = 1.0 - beta / (0.5 * PI);
    let x = 0.5 * half_width + alpha.cos() * radius * half_width * 0.5 + offset;
    let y = 0.5 * height + alpha.sin() * radius * height * 0.5;
    texture.pixel(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::material::{Lights, Material, ObjectData};
    use crate::lighting::params::ShaderParams;
    use crate::lighting::testing::{input_at, ConstantField};
    use crate::lighting::SceneTextures;

    fn background(params: &ShaderParams, textures: &SceneTextures, view: Vec3D, light: Vec3D) -> Rgba {
        let lights = Lights::default();
        let field = ConstantField { distance: 1.0, iters: 0 };
        let shader = Shader::new(params, &lights, &field, &field, textures);
        let material = Material::default();
        let object = ObjectData::default();
        let mut input = input_at(Vec3D::ZERO, Vec3D::Z, &material, &object, &[]);
        input.view_vector = view;
        input.light_vect = light;
        shader.background_shader(&input)
    }

    fn no_halo() -> ShaderParams {
        let mut params = ShaderParams::default();
        params.main_light.visibility = 0.0;
        params
    }

    #[test]
    fn test_gradient_stops() {
        let params = no_halo();
        let textures = SceneTextures::default();
        let bg = &params.background;
        let up = background(&params, &textures, Vec3D::Z, Vec3D::X);
        assert!((up.rgb().b - bg.colour_1.b).abs() < 1e-12);
        let horizon = background(&params, &textures, Vec3D::Y, Vec3D::X);
        assert!((horizon.rgb().r - bg.colour_2.r).abs() < 1e-12);
        let down = background(&params, &textures, -Vec3D::Z, Vec3D::X);
        assert!((down.rgb().g - bg.colour_3.g).abs() < 1e-12);
        assert_eq!(down.a, 0.0);
    }

    #[test]
    fn test_halo_peaks_toward_light() {
        let mut params = ShaderParams::default();
        params.background.colour_1 = Rgb::BLACK;
        params.background.colour_2 = Rgb::BLACK;
        params.background.colour_3 = Rgb::BLACK;
        params.main_light.visibility = 2.0;
        params.main_light.intensity = 1.5;
        let textures = SceneTextures::default();
        let at_light = background(&params, &textures, Vec3D::X, Vec3D::X);
        assert!((at_light.r - 3.0).abs() < 1e-12);
        let away = background(&params, &textures, -Vec3D::X, Vec3D::X);
        assert!(away.r < 1e-12);
    }

    #[test]
    fn test_textured_scaled_by_brightness() {
        let mut params = no_halo();
        params.background.textured = true;
        params.background.brightness = 2.0;
        let textures = SceneTextures {
            background: Some(Texture::solid(Rgb::new(0.1, 0.2, 0.3))),
            ..SceneTextures::default()
        };
        for mapping in [BackgroundMapping::Equirectangular, BackgroundMapping::DoubleHemisphere] {
            params.background.mapping = mapping;
            let c = background(&params, &textures, Vec3D::new(0.3, -0.4, -0.5), Vec3D::X);
            assert!((c.g - 0.4).abs() < 1e-12);
        }
    }

    #[test]
    fn test_textured_without_texture_falls_back_to_gradient() {
        let mut params = no_halo();
        params.background.textured = true;
        let c = background(&params, &SceneTextures::default(), Vec3D::Z, Vec3D::X);
        assert!((c.b - params.background.colour_1.b).abs() < 1e-12);
    }
}
