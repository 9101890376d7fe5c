/// Direct lighting: main directional light, auxiliary point lights, and
/// orbit-trap fake lights.

use crate::engine::types::{RenderStats, Rgb, Vec3D};
use crate::lighting::material::{LightSource, Material};
use crate::lighting::{Shader, ShaderInput};
use crate::math::math3d;

const MAX_DIFFUSE: f64 = 500.0;
const MAX_SPECULAR: f64 = 15.0;

/// Lambertian term of the main light, `max(0, n·l)` on every channel.
pub fn main_shading(input: &ShaderInput) -> Rgb {
    Rgb::gray(math3d::vec3d_dot(&input.normal, &input.light_vect).max(0.0))
}

/// Blinn-style highlight of the main light, tinted by the material's
/// specular colour.
pub fn main_specular(input: &ShaderInput) -> Rgb {
    let shade = specular_term(input, &input.light_vect).min(MAX_SPECULAR);
    input.material.specular_color.scale(shade)
}

/// Half-vector highlight toward `light_vector`, damped by the diffusion
/// texture.
fn specular_term(input: &ShaderInput, light_vector: &Vec3D) -> f64 {
    let half = math3d::vec3d_normalized(&(*light_vector - input.view_vector));
    let shade = math3d::vec3d_dot(&input.normal, &half).max(0.0);
    let diffuse = diffuse_damping(input.material, &input.tex_diffuse);
    shade.powf(30.0 / input.material.specular_width / diffuse) / diffuse
}

fn diffuse_damping(material: &Material, tex_diffuse: &Rgb) -> f64 {
    10.0 * (1.1 - material.diffusion_texture_intensity * tex_diffuse.average())
}

impl<'a> Shader<'a> {
    /// Diffuse and specular contribution of one point light. `number` is the
    /// light count used to normalize the intensity.
    pub fn light_shading(
        &self,
        input: &ShaderInput,
        light: &LightSource,
        number: usize,
        stats: &mut RenderStats,
    ) -> (Rgb, Rgb) {
        let d = light.position - input.point;
        let distance = math3d::vec3d_length(&d);
        let light_vector = math3d::vec3d_normalized(&d);

        let intensity = 100.0 * light.intensity / (distance * distance + 1e-30) / number as f64;
        let lambert = math3d::vec3d_dot(&input.normal, &light_vector).max(0.0);
        let shading = input.material.shading;
        let mut shade = ((1.0 - shading) + lambert * shading) * intensity;
        shade = shade.min(MAX_DIFFUSE);

        let mut shade2 = specular_term(input, &light_vector) * intensity * input.material.specular;
        shade2 = shade2.min(MAX_SPECULAR);

        if self.params.shadow.enabled {
            if shade > 0.01 || shade2 > 0.01 {
                let visibility = self.aux_shadow(input, distance, &light_vector, stats);
                shade *= visibility;
                shade2 *= visibility;
            } else {
                shade = 0.0;
                shade2 = 0.0;
            }
        }

        (light.colour.scale(shade), light.colour.scale(shade2))
    }

    /// Sum of the auxiliary lights. Iterates at least four slots; a slot is
    /// shaded when forced by `min_active` or enabled.
    pub fn aux_lights_shader(&self, input: &ShaderInput, stats: &mut RenderStats) -> (Rgb, Rgb) {
        let count = self.lights.effective_count();
        let min_active = self.params.aux_lights.min_active;
        let mut diffuse = Rgb::BLACK;
        let mut specular = Rgb::BLACK;
        for i in 0..count {
            if self.lights.is_active(i, min_active) {
                let (d, s) = self.light_shading(input, self.lights.get(i), count, stats);
                diffuse = diffuse.add(&d);
                specular = specular.add(&s);
            }
        }
        (diffuse, specular)
    }

    /// Pseudo light radiating from the orbit trap. Brightness falls off as
    /// `intensity / r` and follows the angle between the surface normal and
    /// the trap gradient.
    pub fn fake_lights(&self, input: &ShaderInput) -> Rgb {
        let q = &self.params.quality;
        let delta = input.dist_thresh * q.smoothness;
        let trap = |p: Vec3D| self.orbits.orbit(&p, q.min_n, q.n).orbit_trap_r;

        let rr = trap(input.point);
        let fake_light = self.params.fake_lights.intensity / (rr + 1e-30);
        let r = 1.0 / (rr + 1e-30);
        let rx = 1.0 / (trap(input.point + Vec3D::new(delta, 0.0, 0.0)) + 1e-30);
        let ry = 1.0 / (trap(input.point + Vec3D::new(0.0, delta, 0.0)) + 1e-30);
        let rz = 1.0 / (trap(input.point + Vec3D::new(0.0, 0.0, delta)) + 1e-30);

        let mut fake_normal = Vec3D::new(r - rx, r - ry, r - rz);
        math3d::vec3d_normalize(&mut fake_normal);

        let shade = (fake_light * math3d::vec3d_dot(&input.normal, &fake_normal)).max(0.0);
        Rgb::gray(shade)
    }
}
