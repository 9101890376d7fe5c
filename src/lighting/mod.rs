/// Shading and volumetric light transport.
///
/// Consumes the output of a sphere-tracing march (hit point plus the
/// recorded step history) and produces radiance and opacity:
/// - Surface shading: main light, auxiliary point lights, orbit-trap fake
///   lights, ambient occlusion, environment reflection, luminosity
/// - Normal estimation from the distance-field gradient
/// - Hard, soft, and penetrating shadows
/// - Background gradient / panorama with main-light halo
/// - Volumetric integration: glow, visible lights, light shafts, distance
///   fog, three-band fog, and iteration fog

pub mod background;
pub mod light;
pub mod material;
pub mod normal;
pub mod occlusion;
pub mod palette;
pub mod params;
pub mod shadow;
pub mod surface;
pub mod texture;
pub mod volumetric;

use crate::engine::sampler::{DistanceOut, DistanceSampler, OrbitSampler};
use crate::engine::types::{MarchStep, RenderStats, Rgb, Vec3D};
use material::{Lights, Material, ObjectData};
use occlusion::AoVector;
use params::ShaderParams;
use texture::Texture;

/// Per-sample context passed to every shading routine.
///
/// Built fresh for each sample and never mutated; derived samples (a point
/// along a shadow ray, a volumetric step) are new values made with struct
/// update syntax.
#[derive(Clone, Copy, Debug)]
pub struct ShaderInput<'a> {
    pub point: Vec3D,
    /// Unit direction of the primary ray
    pub view_vector: Vec3D,
    /// Unit direction toward the main light
    pub light_vect: Vec3D,
    pub normal: Vec3D,
    pub material: &'a Material,
    pub object: &'a ObjectData,
    /// Local surface threshold
    pub dist_thresh: f64,
    /// Pixel footprint at the sample depth
    pub delta: f64,
    /// The ray started inside an object
    pub invert_mode: bool,
    /// March history of the primary ray, camera end first
    pub steps: &'a [MarchStep],
    /// Diffusion texture sample at the surface point
    pub tex_diffuse: Rgb,
}

impl<'a> ShaderInput<'a> {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// Scene-wide textures. Missing textures disable the effect that reads them.
#[derive(Clone, Debug, Default)]
pub struct SceneTextures {
    pub env_map: Option<Texture>,
    pub background: Option<Texture>,
    /// Weights the multi-ray ambient occlusion directions
    pub light_map: Option<Texture>,
}

/// Shading context for one render task.
///
/// Holds read-only references to scene data plus the precomputed ambient
/// occlusion directions. One instance per worker; iteration statistics are
/// threaded through every call as an explicit accumulator.
pub struct Shader<'a> {
    pub params: &'a ShaderParams,
    pub lights: &'a Lights,
    pub sampler: &'a dyn DistanceSampler,
    pub orbits: &'a dyn OrbitSampler,
    pub textures: &'a SceneTextures,
    ao_vectors: Vec<AoVector>,
}

impl<'a> Shader<'a> {
    pub fn new(
        params: &'a ShaderParams,
        lights: &'a Lights,
        sampler: &'a dyn DistanceSampler,
        orbits: &'a dyn OrbitSampler,
        textures: &'a SceneTextures,
    ) -> Self {
        let ao_vectors = occlusion::prepare_ao_vectors(
            params.ambient_occlusion.quality,
            textures.light_map.as_ref(),
        );
        log::debug!(
            "shader context: {} AO directions, {} light slots",
            ao_vectors.len(),
            lights.effective_count()
        );
        Self { params, lights, sampler, orbits, textures, ao_vectors }
    }

    pub fn ao_vectors(&self) -> &[AoVector] {
        &self.ao_vectors
    }

    /// Query the distance field and account for the iterations spent.
    #[inline]
    pub(crate) fn query(
        &self,
        point: &Vec3D,
        dist_thresh: f64,
        normal_calculation: bool,
        stats: &mut RenderStats,
    ) -> DistanceOut {
        let out = self.sampler.distance(point, dist_thresh, normal_calculation);
        stats.record(out.total_iters);
        out
    }

    /// Surface threshold at `point`.
    pub fn calc_dist_thresh(&self, point: &Vec3D) -> f64 {
        self.params.quality.dist_thresh(point)
    }

    /// Pixel footprint at `point`.
    pub fn calc_delta(&self, point: &Vec3D) -> f64 {
        self.params.quality.delta(point)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ConstantField;
    use super::*;

    #[test]
    fn test_depth_scaled_thresholds() {
        let mut params = ShaderParams::default();
        params.quality.camera = Vec3D::ZERO;
        params.quality.resolution = 0.01;
        params.quality.fov = 2.0;
        params.quality.detail_level = 4.0;
        let lights = Lights::default();
        let field = ConstantField { distance: 1.0, iters: 0 };
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &field, &field, &textures);
        let p = Vec3D::new(0.0, 10.0, 0.0);
        assert!((shader.calc_delta(&p) - 0.2).abs() < 1e-12);
        assert!((shader.calc_dist_thresh(&p) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_constant_threshold() {
        let mut params = ShaderParams::default();
        params.quality.constant_de_threshold = true;
        params.quality.de_thresh = 0.125;
        let lights = Lights::default();
        let field = ConstantField { distance: 1.0, iters: 0 };
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &field, &field, &textures);
        assert_eq!(shader.calc_dist_thresh(&Vec3D::new(5.0, 5.0, 5.0)), 0.125);
    }

    #[test]
    fn test_query_records_stats() {
        let params = ShaderParams::default();
        let lights = Lights::default();
        let field = ConstantField { distance: 1.0, iters: 0 };
        let textures = SceneTextures::default();
        let shader = Shader::new(&params, &lights, &field, &field, &textures);
        let mut stats = RenderStats::default();
        shader.query(&Vec3D::ZERO, 1e-3, false, &mut stats);
        shader.query(&Vec3D::ZERO, 1e-3, false, &mut stats);
        assert_eq!(stats.de_queries, 2);
        assert_eq!(stats.total_iterations, 2);
    }
}
