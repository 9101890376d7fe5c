/// Material preview renderer.
///
/// Ray-marches a small primitive scene, shades each pixel through the full
/// surface, background, and volumetric pipeline, and writes RGBA8 pixels.
/// Scanlines are interleaved across workers: worker `k` of `n` renders rows
/// `k, k + n, k + 2n, ...`.

use serde::{Deserialize, Serialize};

use crate::engine::primitives::{Primitive, PrimitiveScene};
use crate::engine::raymarcher;
use crate::engine::types::{RenderStats, Rgb, Vec3D};
use crate::error::ShaderError;
use crate::lighting::material::{Lights, Material, ObjectData, ObjectKind};
use crate::lighting::params::ShaderParams;
use crate::lighting::{SceneTextures, Shader, ShaderInput};
use crate::math::{math3d, utils};

/// Scene description received from the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewScene {
    pub primitives: Vec<Primitive>,
    pub material: Material,
    pub object: ObjectData,
    pub lights: Lights,
    pub params: ShaderParams,
    /// Point the camera looks at
    pub target: Vec3D,
    pub bin_search_steps: u32,
}

impl Default for PreviewScene {
    fn default() -> Self {
        Self {
            primitives: vec![Primitive::Sphere { center: Vec3D::ZERO, radius: 1.0 }],
            material: Material::default(),
            object: ObjectData { kind: ObjectKind::Primitive, ..ObjectData::default() },
            lights: Lights::default(),
            params: ShaderParams::default(),
            target: Vec3D::ZERO,
            bin_search_steps: 3,
        }
    }
}

impl PreviewScene {
    /// Parse and validate a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self, ShaderError> {
        let scene: PreviewScene = serde_json::from_str(json)?;
        scene.params.validate()?;
        scene.material.validate()?;
        Ok(scene)
    }
}

/// Camera basis looking from `camera` toward `target` with +Z up.
struct CameraBasis {
    forward: Vec3D,
    right: Vec3D,
    up: Vec3D,
}

impl CameraBasis {
    fn looking_at(camera: &Vec3D, target: &Vec3D) -> Self {
        let mut forward = *target - *camera;
        if forward.is_zero() {
            forward = Vec3D::Y;
        }
        math3d::vec3d_normalize(&mut forward);
        let mut right = math3d::vec3d_cross(&forward, &Vec3D::Z);
        if math3d::vec3d_length(&right) < 1e-12 {
            right = Vec3D::X;
        }
        math3d::vec3d_normalize(&mut right);
        let up = math3d::vec3d_cross(&right, &forward);
        Self { forward, right, up }
    }

    /// Unit view direction through pixel (x, y).
    fn ray(&self, x: u32, y: u32, width: u32, height: u32, fov: f64) -> Vec3D {
        let h = height as f64;
        let px = (x as f64 + 0.5 - width as f64 * 0.5) / h * fov;
        let py = (h * 0.5 - y as f64 - 0.5) / h * fov;
        math3d::vec3d_normalized(&(self.forward + self.right * px + self.up * py))
    }
}

/// Render the rows assigned to `worker_id` into `rgba_out`
/// (`width * height * 4` bytes). Returns the worker's iteration statistics.
pub fn render_preview(
    scene: &PreviewScene,
    textures: &SceneTextures,
    width: u32,
    height: u32,
    rgba_out: &mut [u8],
    worker_id: u32,
    worker_count: u32,
) -> Result<RenderStats, ShaderError> {
    if worker_count == 0 {
        return Err(ShaderError::invalid("worker_count", "must be at least 1"));
    }
    let needed = width as usize * height as usize * 4;
    if rgba_out.len() < needed {
        return Err(ShaderError::BufferTooSmall { needed, got: rgba_out.len() });
    }

    let field = PrimitiveScene::new(scene.primitives.clone());
    let params = &scene.params;
    let shader = Shader::new(params, &scene.lights, &field, &field, textures);
    let camera = params.quality.camera;
    let basis = CameraBasis::looking_at(&camera, &scene.target);
    let light_vect = params.main_light_vector();

    let mut stats = RenderStats::default();
    let mut rows = 0u32;
    let mut y = worker_id;
    while y < height {
        for x in 0..width {
            let dir = basis.ray(x, y, width, height, params.quality.fov);
            let colour = shade_pixel(&shader, scene, &camera, &dir, &light_vect, &mut stats);
            let idx = (y as usize * width as usize + x as usize) * 4;
            rgba_out[idx] = utils::float_to_byte(colour.r);
            rgba_out[idx + 1] = utils::float_to_byte(colour.g);
            rgba_out[idx + 2] = utils::float_to_byte(colour.b);
            rgba_out[idx + 3] = 255;
        }
        rows += 1;
        y += worker_count;
    }

    log::info!(
        "worker {worker_id}/{worker_count}: {rows} rows, {} DE queries, {} iterations",
        stats.de_queries,
        stats.total_iterations
    );
    Ok(stats)
}

/// March one primary ray and run it through the shading pipeline.
fn shade_pixel(
    shader: &Shader,
    scene: &PreviewScene,
    camera: &Vec3D,
    dir: &Vec3D,
    light_vect: &Vec3D,
    stats: &mut RenderStats,
) -> Rgb {
    let march = raymarcher::march_ray(camera, dir, &scene.params.quality, shader.sampler, scene.bin_search_steps, stats);

    let input = ShaderInput {
        point: march.point,
        view_vector: *dir,
        light_vect: *light_vect,
        normal: Vec3D::ZERO,
        material: &scene.material,
        object: &scene.object,
        dist_thresh: march.dist_thresh,
        delta: shader.calc_delta(&march.point),
        invert_mode: false,
        steps: &march.steps,
        tex_diffuse: Rgb::WHITE,
    };

    let seed = if march.hit {
        let shade = shader.shade_surface(&input, stats);
        let mut c = shade.radiance;
        c.r += shade.specular.r;
        c.g += shade.specular.g;
        c.b += shade.specular.b;
        c
    } else {
        shader.background_shader(&input)
    };

    shader.volumetric_shader(&input, seed, stats).colour.rgb()
}
