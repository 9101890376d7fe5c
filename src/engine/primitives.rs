/// Analytic primitive distance fields.
///
/// Exact distances for simple shapes, used for material previews and as
/// reference fields in tests. They also answer orbit-trap queries so the
/// fake-light and palette paths can be exercised without a fractal formula.

use serde::{Deserialize, Serialize};

use crate::engine::sampler::{DistanceOut, DistanceSampler, OrbitOut, OrbitSampler};
use crate::engine::types::Vec3D;
use crate::math::math3d;

/// A single primitive shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Sphere { center: Vec3D, radius: f64 },
    /// Half-space below the plane through `point` with unit `normal`
    Plane { point: Vec3D, normal: Vec3D },
}

impl Primitive {
    /// Signed distance from `p` to the surface.
    pub fn signed_distance(&self, p: &Vec3D) -> f64 {
        match self {
            Primitive::Sphere { center, radius } => math3d::vec3d_length(&(*p - *center)) - radius,
            Primitive::Plane { point, normal } => {
                math3d::vec3d_dot(&(*p - *point), &math3d::vec3d_normalized(normal))
            }
        }
    }
}

/// Union of primitives, queried as the minimum distance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PrimitiveScene {
    pub primitives: Vec<Primitive>,
}

impl PrimitiveScene {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self { primitives }
    }

    /// Single sphere centred at the origin.
    pub fn sphere(radius: f64) -> Self {
        Self::new(vec![Primitive::Sphere { center: Vec3D::ZERO, radius }])
    }

    fn signed_distance(&self, p: &Vec3D) -> f64 {
        self.primitives
            .iter()
            .map(|prim| prim.signed_distance(p))
            .fold(f64::MAX, f64::min)
    }
}

impl DistanceSampler for PrimitiveScene {
    fn distance(&self, point: &Vec3D, _dist_thresh: f64, normal_calculation: bool) -> DistanceOut {
        let sd = self.signed_distance(point);
        // Outside queries clamp at zero; gradient sampling keeps the sign so
        // differences stay smooth across the surface.
        let distance = if normal_calculation { sd } else { sd.max(0.0) };
        DistanceOut {
            distance,
            iters: 1,
            total_iters: 1,
            max_iter: sd < 0.0,
        }
    }
}

impl OrbitSampler for PrimitiveScene {
    fn orbit(&self, point: &Vec3D, _min_iter: u32, _max_iter: u32) -> OrbitOut {
        let r = math3d::vec3d_length(point);
        OrbitOut {
            orbit_trap_r: r,
            colour_index: r * 5000.0,
        }
    }
}
