/// Step-recording sphere tracer.
///
/// Marches a primary ray through a distance field and keeps the full step
/// history for the volumetric integrator:
/// - Depth-scaled surface threshold
/// - Adaptive step regulation against overshooting DE jumps
/// - Binary search surface refinement
/// - Termination on hit, max-iteration sample, max distance, or bad DE

use crate::engine::sampler::DistanceSampler;
use crate::engine::types::*;
use crate::lighting::params::QualityParams;

/// Hard cap on march steps per ray.
pub const MAX_MARCH_STEPS: usize = 10000;

/// Result of a single ray march.
#[derive(Clone, Default, Debug)]
pub struct RayMarchResult {
    /// Did the ray hit the surface?
    pub hit: bool,
    /// Final sample point (refined hit position on a hit)
    pub point: Vec3D,
    /// Distance travelled along the ray
    pub depth: f64,
    /// Surface threshold at the final sample
    pub dist_thresh: f64,
    /// March history, camera end first
    pub steps: Vec<MarchStep>,
}

/// March from `origin` along unit `direction` until the surface, the view
/// distance limit, or a max-iteration sample is reached.
pub fn march_ray(
    origin: &Vec3D,
    direction: &Vec3D,
    quality: &QualityParams,
    sampler: &dyn DistanceSampler,
    bin_search_steps: u32,
    stats: &mut RenderStats,
) -> RayMarchResult {
    let mut result = RayMarchResult::default();
    let mut depth = 0.0f64;

    // Adaptive step regulation state
    let mut last_de = f64::MAX;
    let mut last_step = 0.0f64;
    let mut rsf_mul = 1.0f64;

    for step_no in 0..MAX_MARCH_STEPS {
        let point = *origin + *direction * depth;
        let dist_thresh = quality.dist_thresh(&point);
        let out = sampler.distance(&point, dist_thresh, false);
        stats.record(out.total_iters);

        let mut record = MarchStep {
            point,
            step: 0.0,
            distance: out.distance,
            dist_thresh,
            iters: out.iters,
        };

        if out.distance < dist_thresh || out.max_iter {
            result.steps.push(record);
            result.hit = true;
            result.point = if bin_search_steps > 0 && step_no > 0 {
                binary_search_refine(origin, direction, depth - last_step, last_step, quality, sampler, bin_search_steps, stats)
            } else {
                point
            };
            result.depth = depth;
            result.dist_thresh = dist_thresh;
            return result;
        }

        if depth > quality.view_distance_max || !out.distance.is_finite() {
            result.steps.push(record);
            result.point = point;
            result.depth = depth;
            result.dist_thresh = dist_thresh;
            return result;
        }

        // Cap the advance when the estimate jumps past what the previous
        // step allows.
        let mut de = out.distance;
        if step_no > 0 {
            let max_allowed = last_de + last_step;
            if de > max_allowed {
                de = max_allowed;
                rsf_mul = (rsf_mul * 0.9).max(0.5);
            } else {
                rsf_mul = (rsf_mul * 1.01).min(1.0);
            }
        }

        let step_size = de * quality.de_factor * rsf_mul;
        record.step = step_size;
        result.steps.push(record);

        depth += step_size;
        last_de = de;
        last_step = step_size;
    }

    log::debug!("ray march hit the step cap at depth {depth}");
    result.point = *origin + *direction * depth;
    result.depth = depth;
    result
}

/// Refine the hit by bisecting the last step. Returns the first point found
/// inside the surface threshold.
#[allow(clippy::too_many_arguments)]
fn binary_search_refine(
    origin: &Vec3D,
    direction: &Vec3D,
    start_depth: f64,
    last_step: f64,
    quality: &QualityParams,
    sampler: &dyn DistanceSampler,
    bin_search_steps: u32,
    stats: &mut RenderStats,
) -> Vec3D {
    let mut depth = start_depth;
    let mut step = last_step;

    for _ in 0..bin_search_steps {
        step *= 0.5;
        let test = *origin + *direction * (depth + step);
        let dist_thresh = quality.dist_thresh(&test);
        let out = sampler.distance(&test, dist_thresh, false);
        stats.record(out.total_iters);
        if out.distance >= dist_thresh && !out.max_iter {
            depth += step;
        }
    }

    *origin + *direction * (depth + step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::primitives::PrimitiveScene;

    fn quality() -> QualityParams {
        QualityParams {
            camera: Vec3D::new(0.0, -3.0, 0.0),
            constant_de_threshold: true,
            de_thresh: 1e-4,
            view_distance_max: 20.0,
            ..QualityParams::default()
        }
    }

    #[test]
    fn test_hits_sphere() {
        let scene = PrimitiveScene::sphere(1.0);
        let q = quality();
        let mut stats = RenderStats::default();
        let r = march_ray(&q.camera, &Vec3D::Y, &q, &scene, 3, &mut stats);
        assert!(r.hit);
        assert!((r.depth - 2.0).abs() < 1e-3);
        assert!((r.point.y + 1.0).abs() < 1e-3);
        assert!(r.steps.len() >= 2);
        assert!(stats.de_queries as usize >= r.steps.len());
    }

    #[test]
    fn test_steps_are_recorded_in_march_order() {
        let scene = PrimitiveScene::sphere(1.0);
        let q = quality();
        let mut stats = RenderStats::default();
        let r = march_ray(&q.camera, &Vec3D::Y, &q, &scene, 0, &mut stats);
        assert_eq!(r.steps[0].point, q.camera);
        assert!((r.steps[0].step - 2.0).abs() < 1e-12);
        for pair in r.steps.windows(2) {
            assert!(pair[1].point.y >= pair[0].point.y);
            assert!((pair[0].point.y + pair[0].step - pair[1].point.y).abs() < 1e-9);
        }
        assert_eq!(r.steps.last().map(|s| s.step), Some(0.0));
        assert_eq!(stats.de_queries as usize, r.steps.len());
    }

    #[test]
    fn test_miss_stops_at_view_distance() {
        let scene = PrimitiveScene::sphere(1.0);
        let q = quality();
        let mut stats = RenderStats::default();
        let r = march_ray(&q.camera, &Vec3D::X, &q, &scene, 3, &mut stats);
        assert!(!r.hit);
        assert!(r.depth > q.view_distance_max);
    }

    #[test]
    fn test_starting_inside_counts_as_hit() {
        let scene = PrimitiveScene::sphere(1.0);
        let q = quality();
        let mut stats = RenderStats::default();
        let r = march_ray(&Vec3D::ZERO, &Vec3D::X, &q, &scene, 3, &mut stats);
        assert!(r.hit);
        assert_eq!(r.steps.len(), 1);
        assert_eq!(r.point, Vec3D::ZERO);
    }
}
