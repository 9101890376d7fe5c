/// Narrow contracts to the scene's distance field and orbit-trap colouring.
///
/// One implementation exists per fractal family or primitive; the shading
/// pipeline only consumes the scalars these return.

use crate::engine::types::Vec3D;

/// Result of one distance-field query.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistanceOut {
    /// Distance estimate to the nearest surface (non-negative outside)
    pub distance: f64,
    /// Iterations used at this point (drives iteration fog)
    pub iters: u32,
    /// Iterations spent in total, including hybrid sub-formulas
    pub total_iters: u64,
    /// The iteration limit was reached (point is inside the set)
    pub max_iter: bool,
}

/// Distance estimator. Implementations must be pure functions of their
/// input so the sampler can be shared read-only between workers.
pub trait DistanceSampler: Send + Sync {
    /// Estimate the distance from `point` to the surface. `dist_thresh` is
    /// the local surface threshold; `normal_calculation` is set when the
    /// query is part of a gradient estimate.
    fn distance(&self, point: &Vec3D, dist_thresh: f64, normal_calculation: bool) -> DistanceOut;
}

/// Orbit-trap and colouring data sampled at a point.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrbitOut {
    /// Minimum orbit radius reached during iteration
    pub orbit_trap_r: f64,
    /// Raw colour index for palette lookup
    pub colour_index: f64,
}

/// Orbit-trap / colouring sampler.
pub trait OrbitSampler: Send + Sync {
    /// Iterate from `min_iter` up to `max_iter` at `point`.
    fn orbit(&self, point: &Vec3D, min_iter: u32, max_iter: u32) -> OrbitOut;
}
