/// Core value types shared by the marcher and the shading pipeline.
///
/// Everything here is a plain `Copy` value created per ray or per sample,
/// except `RenderStats`, which a worker owns for the duration of a render
/// task and merges into the frame total afterwards.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 3D vector with f64 precision.
#[repr(C, align(16))]
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3D {
    pub const ZERO: Vec3D = Vec3D { x: 0.0, y: 0.0, z: 0.0 };
    pub const X: Vec3D = Vec3D { x: 1.0, y: 0.0, z: 0.0 };
    pub const Y: Vec3D = Vec3D { x: 0.0, y: 1.0, z: 0.0 };
    pub const Z: Vec3D = Vec3D { x: 0.0, y: 0.0, z: 1.0 };

    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3D { x, y, z }
    }

    #[inline(always)]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl Add for Vec3D {
    type Output = Vec3D;

    #[inline(always)]
    fn add(self, rhs: Vec3D) -> Vec3D {
        Vec3D { x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }
}

impl AddAssign for Vec3D {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Vec3D) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3D {
    type Output = Vec3D;

    #[inline(always)]
    fn sub(self, rhs: Vec3D) -> Vec3D {
        Vec3D { x: self.x - rhs.x, y: self.y - rhs.y, z: self.z - rhs.z }
    }
}

impl Mul<f64> for Vec3D {
    type Output = Vec3D;

    #[inline(always)]
    fn mul(self, s: f64) -> Vec3D {
        Vec3D { x: self.x * s, y: self.y * s, z: self.z * s }
    }
}

impl Neg for Vec3D {
    type Output = Vec3D;

    #[inline(always)]
    fn neg(self) -> Vec3D {
        Vec3D { x: -self.x, y: -self.y, z: -self.z }
    }
}

/// 3×3 rotation matrix, row-major.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix3 {
    pub m: [[f64; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Matrix3 {
            m: [
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }
}

/// Linear RGB colour, unclamped (HDR-capable).
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };

    #[inline(always)]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Rgb { r, g, b }
    }

    #[inline(always)]
    pub const fn gray(v: f64) -> Self {
        Rgb { r: v, g: v, b: v }
    }

    #[inline(always)]
    pub fn scale(&self, s: f64) -> Rgb {
        Rgb { r: self.r * s, g: self.g * s, b: self.b * s }
    }

    /// Channel-wise product.
    #[inline(always)]
    pub fn mul(&self, o: &Rgb) -> Rgb {
        Rgb { r: self.r * o.r, g: self.g * o.g, b: self.b * o.b }
    }

    #[inline(always)]
    pub fn add(&self, o: &Rgb) -> Rgb {
        Rgb { r: self.r + o.r, g: self.g + o.g, b: self.b + o.b }
    }

    /// `self * (1 - t) + other * t` per channel.
    #[inline(always)]
    pub fn mix(&self, other: &Rgb, t: f64) -> Rgb {
        let tn = 1.0 - t;
        Rgb {
            r: self.r * tn + other.r * t,
            g: self.g * tn + other.g * t,
            b: self.b * tn + other.b * t,
        }
    }

    #[inline(always)]
    pub fn average(&self) -> f64 {
        (self.r + self.g + self.b) / 3.0
    }

    #[inline(always)]
    pub fn with_alpha(&self, a: f64) -> Rgba {
        Rgba { r: self.r, g: self.g, b: self.b, a }
    }
}

/// Radiance plus accumulated opacity. `a` grows toward 1 as volumetric
/// density accumulates along a ray.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    #[inline(always)]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Rgba { r, g, b, a }
    }

    #[inline(always)]
    pub fn rgb(&self) -> Rgb {
        Rgb { r: self.r, g: self.g, b: self.b }
    }
}

/// One sphere-tracing advance along a primary ray.
#[derive(Clone, Copy, Default, Debug)]
pub struct MarchStep {
    /// Point where the distance field was sampled
    pub point: Vec3D,
    /// Length of the advance taken from this point
    pub step: f64,
    /// Distance estimate at `point`
    pub distance: f64,
    /// Local surface threshold at `point`
    pub dist_thresh: f64,
    /// Fractal iterations used at `point`
    pub iters: u32,
}

/// Per-task iteration statistics. Each worker owns one and the driver sums
/// them with [`RenderStats::merge`] at frame end.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct RenderStats {
    /// Fractal iterations reported by every distance query
    pub total_iterations: u64,
    /// Number of distance-field queries issued
    pub de_queries: u64,
}

impl RenderStats {
    #[inline(always)]
    pub fn record(&mut self, total_iters: u64) {
        self.total_iterations += total_iters;
        self.de_queries += 1;
    }

    pub fn merge(&mut self, other: &RenderStats) {
        self.total_iterations += other.total_iterations;
        self.de_queries += other.de_queries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_ops() {
        let a = Vec3D::new(1.0, 2.0, 3.0);
        let b = Vec3D::new(0.5, -1.0, 2.0);
        assert_eq!(a + b, Vec3D::new(1.5, 1.0, 5.0));
        assert_eq!(a - b, Vec3D::new(0.5, 3.0, 1.0));
        assert_eq!(a * 2.0, Vec3D::new(2.0, 4.0, 6.0));
        assert_eq!(-a, Vec3D::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_rgb_mix() {
        let c = Rgb::BLACK.mix(&Rgb::WHITE, 0.25);
        assert!((c.r - 0.25).abs() < 1e-12);
        assert!((c.average() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_stats_merge() {
        let mut a = RenderStats::default();
        a.record(10);
        let mut b = RenderStats::default();
        b.record(5);
        b.record(7);
        a.merge(&b);
        assert_eq!(a.total_iterations, 22);
        assert_eq!(a.de_queries, 3);
    }
}
