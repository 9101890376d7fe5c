/// Surface normal estimation from the distance-field gradient.

use crate::engine::types::{RenderStats, Vec3D};
use crate::lighting::{Shader, ShaderInput};
use crate::math::math3d;

/// Grid resolution per axis of the averaged central-difference estimator.
const SLOW_GRID_STEPS: i32 = 10;

impl<'a> Shader<'a> {
    /// Unit normal at `input.point`.
    ///
    /// Default mode takes three forward differences; slow shading averages
    /// `offset * distance` over a dense grid of offsets. A vanishing gradient
    /// falls back to +X. Interior rays get the negated normal.
    pub fn calculate_normal(&self, input: &ShaderInput, stats: &mut RenderStats) -> Vec3D {
        let q = &self.params.quality;
        let mut normal = if !q.slow_shading {
            let delta = if q.interior_mode {
                input.dist_thresh * 0.2 * q.smoothness
            } else {
                input.delta * q.smoothness
            };
            self.gradient_normal(input, delta, stats)
        } else {
            let delta = if q.interior_mode {
                input.dist_thresh * 0.2 * q.smoothness
            } else {
                input.delta * q.smoothness * 0.5
            };
            self.averaged_normal(input, delta, stats)
        };

        if normal.is_zero() || !normal.x.is_finite() || !normal.y.is_finite() || !normal.z.is_finite() {
            normal = Vec3D::X;
        } else {
            math3d::vec3d_normalize(&mut normal);
        }

        if input.invert_mode {
            -normal
        } else {
            normal
        }
    }

    fn gradient_normal(&self, input: &ShaderInput, delta: f64, stats: &mut RenderStats) -> Vec3D {
        let p = input.point;
        let t = input.dist_thresh;
        let s1 = self.query(&p, t, true, stats).distance;
        let s2 = self.query(&(p + Vec3D::new(delta, 0.0, 0.0)), t, true, stats).distance;
        let s3 = self.query(&(p + Vec3D::new(0.0, delta, 0.0)), t, true, stats).distance;
        let s4 = self.query(&(p + Vec3D::new(0.0, 0.0, delta)), t, true, stats).distance;
        Vec3D::new(s2 - s1, s3 - s1, s4 - s1)
    }

    fn averaged_normal(&self, input: &ShaderInput, delta: f64, stats: &mut RenderStats) -> Vec3D {
        let mut normal = Vec3D::ZERO;
        let unit = |k: i32| -1.0 + 2.0 * k as f64 / SLOW_GRID_STEPS as f64;
        for ix in 0..=SLOW_GRID_STEPS {
            for iy in 0..=SLOW_GRID_STEPS {
                for iz in 0..=SLOW_GRID_STEPS {
                    let offset = Vec3D::new(unit(ix), unit(iy), unit(iz));
                    let sample = input.point + offset * delta;
                    let dist = self.query(&sample, input.dist_thresh, true, stats).distance;
                    normal += offset * dist;
                }
            }
        }
        normal
    }
}
