/// Shadow rays toward the main light and the auxiliary point lights.
///
/// A shadow ray sphere-traces from the surface toward the light. Hitting an
/// occluder zeroes the visibility, or for penetrating lights subtracts the
/// fraction of the ray still remaining. With iteration fog enabled the fog
/// along the ray also eats into the visibility.

use std::f64::consts::PI;

use crate::engine::types::{RenderStats, Rgba, Vec3D};
use crate::lighting::{Shader, ShaderInput};
use crate::math::utils;

/// Opacity of an iteration-fog sample.
///
/// Zero at or below `trim` iterations, then grows with the square of the
/// iteration excess, scaled by the step length and opacity speed. Clamped
/// to [0, 1].
pub fn iter_opacity(step: f64, iters: f64, max_n: f64, trim: f64, opacity_speed: f64) -> f64 {
    let mut opacity = (iters - trim) / max_n;
    if opacity < 0.0 {
        opacity = 0.0;
    }
    opacity *= opacity;
    opacity *= step * opacity_speed;
    utils::saturate(opacity)
}

impl<'a> Shader<'a> {
    /// Iteration-fog opacity of a shadow or occlusion sample.
    pub(crate) fn sample_fog_opacity(&self, step: f64, iters: u32) -> f64 {
        let f = &self.params.iter_fog;
        if !f.enabled {
            return 0.0;
        }
        iter_opacity(step, iters as f64, self.params.quality.n as f64, f.opacity_trim, f.opacity)
    }

    /// Visibility of the main light from `input.point`, per channel.
    pub fn main_shadow(&self, input: &ShaderInput, stats: &mut RenderStats) -> Rgba {
        let p = self.params;
        let penetrating = p.shadow.penetrating_lights;
        let range = if penetrating {
            input.delta / p.quality.resolution
        } else {
            p.quality.view_distance_max
        };

        let recalc_thresh = p.iter_fog.enabled || p.volumetric_light.enabled[0];
        let de_factor = if recalc_thresh { 1.0 } else { p.quality.de_factor };

        let start = if p.quality.interior_mode {
            input.dist_thresh * de_factor
        } else {
            input.dist_thresh
        };

        let soft_range = (p.shadow.cone_angle / 180.0 * PI).tan();
        let soft = !p.iter_fog.enabled && !p.quality.limits_enabled && !p.quality.iter_thresh_mode && soft_range > 0.0;
        let mut max_soft: f64 = 0.0;

        let mut shadow_temp = 1.0;
        let mut i = start;
        while i < range {
            let point = input.point + input.light_vect * i;
            let dist_thresh = if recalc_thresh { self.calc_dist_thresh(&point) } else { input.dist_thresh };
            let out = self.query(&point, dist_thresh, false, stats);
            let dist = out.distance;

            if soft {
                let mut angle = (dist - dist_thresh) / i;
                if angle < 0.0 || dist < dist_thresh {
                    angle = 0.0;
                }
                let mut soft_shadow = 1.0 - angle / soft_range;
                if penetrating {
                    soft_shadow *= (range - i) / range;
                }
                max_soft = max_soft.max(soft_shadow.max(0.0));
            }

            let remaining = (range - i) / range;
            shadow_temp -= self.sample_fog_opacity(dist * de_factor, out.iters) * remaining;

            if dist < dist_thresh || shadow_temp < 0.0 {
                shadow_temp -= remaining;
                if !penetrating || shadow_temp < 0.0 {
                    shadow_temp = 0.0;
                }
                break;
            }

            let advance = dist * de_factor;
            if advance.is_nan() || advance <= 0.0 {
                break;
            }
            i += advance;
        }

        let visibility = if soft { 1.0 - max_soft } else { shadow_temp };
        Rgba::new(visibility, visibility, visibility, 1.0)
    }

    /// Visibility of a point light at `distance` along unit `light_vector`.
    pub fn aux_shadow(&self, input: &ShaderInput, distance: f64, light_vector: &Vec3D, stats: &mut RenderStats) -> f64 {
        let p = self.params;
        let recalc_thresh = p.iter_fog.enabled || p.volumetric_light.any_enabled();
        let de_factor = if recalc_thresh { 1.0 } else { p.quality.de_factor };

        let mut shadow_temp = 1.0;
        let mut i = input.delta;
        while i < distance {
            let point = input.point + *light_vector * i;
            let out = self.query(&point, input.dist_thresh, false, stats);
            let dist = out.distance;

            let remaining = (distance - i) / distance;
            shadow_temp -= self.sample_fog_opacity(dist * de_factor, out.iters) * remaining;

            let dist_thresh = if recalc_thresh { self.calc_dist_thresh(&point) } else { input.dist_thresh };

            if dist < dist_thresh || shadow_temp < 0.0 {
                if p.shadow.penetrating_lights {
                    shadow_temp -= remaining;
                    if shadow_temp < 0.0 {
                        shadow_temp = 0.0;
                    }
                } else {
                    shadow_temp = 0.0;
                }
                break;
            }

            let advance = dist * de_factor;
            if advance.is_nan() || advance <= 0.0 {
                break;
            }
            i += advance;
        }
        shadow_temp
    }
}
