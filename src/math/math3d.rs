/// 3D math helpers: vector and rotation-matrix operations with f64 precision.

use crate::engine::types::{Matrix3, Vec3D};

// ─── Vector operations ───────────────────────────────────────

#[inline(always)]
pub fn vec3d_dot(a: &Vec3D, b: &Vec3D) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

#[inline(always)]
pub fn vec3d_cross(a: &Vec3D, b: &Vec3D) -> Vec3D {
    Vec3D {
        x: a.y * b.z - a.z * b.y,
        y: a.z * b.x - a.x * b.z,
        z: a.x * b.y - a.y * b.x,
    }
}

#[inline(always)]
pub fn vec3d_length(v: &Vec3D) -> f64 {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}

/// Normalize in place. Vectors shorter than 1e-30 are left untouched.
#[inline(always)]
pub fn vec3d_normalize(v: &mut Vec3D) {
    let len = vec3d_length(v);
    if len > 1e-30 {
        let inv = 1.0 / len;
        v.x *= inv;
        v.y *= inv;
        v.z *= inv;
    }
}

#[inline(always)]
pub fn vec3d_normalized(v: &Vec3D) -> Vec3D {
    let mut result = *v;
    vec3d_normalize(&mut result);
    result
}

/// Azimuth of the vector in the XY plane, `atan2(y, x)`.
#[inline]
pub fn vec3d_alpha(v: &Vec3D) -> f64 {
    v.y.atan2(v.x)
}

/// Elevation of the vector above the XY plane.
#[inline]
pub fn vec3d_beta(v: &Vec3D) -> f64 {
    v.z.atan2((v.x * v.x + v.y * v.y).sqrt())
}

/// Unit vector from azimuth/elevation angles (inverse of alpha/beta).
pub fn vec3d_from_angles(alpha: f64, beta: f64) -> Vec3D {
    let (sa, ca) = alpha.sin_cos();
    let (sb, cb) = beta.sin_cos();
    Vec3D { x: ca * cb, y: sa * cb, z: sb }
}

// ─── Matrix operations ───────────────────────────────────────

/// Multiply matrix × vector: result = M * v
#[inline]
pub fn mat3_mul_vec(m: &Matrix3, v: &Vec3D) -> Vec3D {
    Vec3D {
        x: m.m[0][0] * v.x + m.m[0][1] * v.y + m.m[0][2] * v.z,
        y: m.m[1][0] * v.x + m.m[1][1] * v.y + m.m[1][2] * v.z,
        z: m.m[2][0] * v.x + m.m[2][1] * v.y + m.m[2][2] * v.z,
    }
}

/// Multiply transposed matrix × vector. For a rotation this is the inverse
/// rotation.
#[inline]
pub fn mat3_transpose_mul_vec(m: &Matrix3, v: &Vec3D) -> Vec3D {
    Vec3D {
        x: m.m[0][0] * v.x + m.m[1][0] * v.y + m.m[2][0] * v.z,
        y: m.m[0][1] * v.x + m.m[1][1] * v.y + m.m[2][1] * v.z,
        z: m.m[0][2] * v.x + m.m[1][2] * v.y + m.m[2][2] * v.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3d_normalize() {
        let mut v = Vec3D { x: 3.0, y: 0.0, z: 4.0 };
        vec3d_normalize(&mut v);
        assert!((v.x - 0.6).abs() < 1e-10);
        assert!((v.y - 0.0).abs() < 1e-10);
        assert!((v.z - 0.8).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_zero_is_noop() {
        let v = vec3d_normalized(&Vec3D::ZERO);
        assert!(v.is_zero());
    }

    #[test]
    fn test_vec3d_cross() {
        let c = vec3d_cross(&Vec3D::X, &Vec3D::Y);
        assert!((c.x - 0.0).abs() < 1e-10);
        assert!((c.y - 0.0).abs() < 1e-10);
        assert!((c.z - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_mat3_identity() {
        let i = Matrix3::default();
        let v = Vec3D { x: 1.0, y: 2.0, z: 3.0 };
        let r = mat3_mul_vec(&i, &v);
        assert!((r.x - 1.0).abs() < 1e-10);
        assert!((r.y - 2.0).abs() < 1e-10);
        assert!((r.z - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_transpose_inverts_rotation() {
        let (s, c) = 0.5f64.sin_cos();
        let m = Matrix3 { m: [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]] };
        let v = Vec3D::new(0.2, -1.3, 2.5);
        let back = mat3_transpose_mul_vec(&m, &mat3_mul_vec(&m, &v));
        assert!((back.x - v.x).abs() < 1e-12);
        assert!((back.y - v.y).abs() < 1e-12);
        assert!((back.z - v.z).abs() < 1e-12);
    }

    #[test]
    fn test_angles_roundtrip() {
        let v = vec3d_from_angles(0.8, -0.4);
        assert!((vec3d_alpha(&v) - 0.8).abs() < 1e-12);
        assert!((vec3d_beta(&v) + 0.4).abs() < 1e-12);
    }
}
