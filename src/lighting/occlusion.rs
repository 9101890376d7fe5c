/// Ambient occlusion: a fast single-ray estimate along the normal and a
/// multi-ray estimate over a fixed set of directions around the point.

use std::f64::consts::PI;

use crate::engine::types::{RenderStats, Rgba, Vec3D};
use crate::lighting::texture::Texture;
use crate::lighting::{Shader, ShaderInput};

/// Upper bound on the number of multi-ray AO directions.
pub const MAX_AO_VECTORS: usize = 10000;

/// Directions whose weights are all at or below this are dropped.
const MIN_AO_WEIGHT: f64 = 10.0;

/// One multi-ray AO sample direction with per-channel weights in 0..=255.
#[derive(Clone, Copy, Debug, Default)]
pub struct AoVector {
    pub alpha: f64,
    pub beta: f64,
    pub v: Vec3D,
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Build the AO direction set on a latitude/longitude lattice whose density
/// follows `quality`. Channel weights come from the light map when present.
pub fn prepare_ao_vectors(quality: u32, light_map: Option<&Texture>) -> Vec<AoVector> {
    let quality = quality.max(1) as f64;
    let mut vectors = Vec::new();

    let mut b = -0.49 * PI;
    'outer: while b < 0.49 * PI {
        let mut a = 0.0;
        while a < 2.0 * PI {
            let v = Vec3D::new((a + b).cos() * b.cos(), (a + b).sin() * b.cos(), b.sin());
            let (r, g, bl) = match light_map {
                Some(map) => {
                    let w = map.width() as f64;
                    let h = map.height() as f64;
                    let x = ((a + b) / (2.0 * PI) * w + w * 8.5) as i64 % map.width() as i64;
                    let y = (b / PI * h + h * 8.5) as i64 % map.height() as i64;
                    let c = map.pixel(x as f64, y as f64);
                    let weight = |v: f64| (v * 255.0).clamp(0.0, 255.0);
                    (weight(c.r), weight(c.g), weight(c.b))
                }
                None => (255.0, 255.0, 255.0),
            };
            if r > MIN_AO_WEIGHT || g > MIN_AO_WEIGHT || bl > MIN_AO_WEIGHT {
                vectors.push(AoVector { alpha: a, beta: b, v, r, g, b: bl });
                if vectors.len() >= MAX_AO_VECTORS {
                    break 'outer;
                }
            }
            a += (2.0 / quality) / b.cos();
        }
        b += 1.0 / quality;
    }

    if vectors.is_empty() {
        vectors.push(AoVector::default());
    }
    vectors
}

impl<'a> Shader<'a> {
    /// Single-ray occlusion along the normal with quadratically growing
    /// steps. Result in [0, 1].
    pub fn fast_ambient_occlusion(&self, input: &ShaderInput, stats: &mut RenderStats) -> Rgba {
        let ao_params = &self.params.ambient_occlusion;
        let delta = input.dist_thresh;
        let samples = (ao_params.quality as u64).pow(2);
        let mut ao_temp = 0.0;
        for i in 1..samples {
            let scan = (i as f64).powi(2) * delta;
            let point = input.point + input.normal * scan;
            let dist = self.query(&point, input.dist_thresh, false, stats).distance;
            // 0.5^i is already zero past i = 1074
            let weight = 0.5f64.powi(i.min(2048) as i32);
            ao_temp += weight * (scan - ao_params.fast_tune * dist) / input.dist_thresh;
        }
        let ao = (1.0 - 0.2 * ao_temp).clamp(0.0, 1.0);
        Rgba::new(ao, ao, ao, 1.0)
    }

    /// Occlusion averaged over the precomputed direction set, weighted per
    /// channel. Result in [0, 1].
    pub fn ambient_occlusion(&self, input: &ShaderInput, stats: &mut RenderStats) -> Rgba {
        let p = self.params;
        let recalc_thresh = p.iter_fog.enabled || p.volumetric_light.enabled[0];
        let start_dist = input.delta;
        let end_dist = input.delta / p.quality.resolution;
        let mut ao = Rgba::new(0.0, 0.0, 0.0, 1.0);

        for dir in self.ao_vectors() {
            let mut shadow_temp = 1.0;
            let mut r = start_dist;
            while r < end_dist {
                let point = input.point + dir.v * r;
                let out = self.query(&point, input.dist_thresh, false, stats);
                let dist = out.distance;

                let remaining = (end_dist - r) / end_dist;
                shadow_temp -= self.sample_fog_opacity(dist * 2.0, out.iters) * remaining;

                let dist_thresh = if recalc_thresh { self.calc_dist_thresh(&point) } else { input.dist_thresh };

                if dist < dist_thresh || out.max_iter || shadow_temp < 0.0 {
                    shadow_temp -= remaining;
                    if shadow_temp < 0.0 {
                        shadow_temp = 0.0;
                    }
                    break;
                }
                if dist.is_nan() || dist <= 0.0 {
                    break;
                }
                r += dist * 2.0;
            }

            ao.r += shadow_temp * dir.r;
            ao.g += shadow_temp * dir.g;
            ao.b += shadow_temp * dir.b;
        }

        let norm = self.ao_vectors().len() as f64 * 256.0;
        ao.r /= norm;
        ao.g /= norm;
        ao.b /= norm;
        ao
    }
}
