/// Scalar helpers for clamping, interpolation, and colour byte packing.

/// Clamp a value to [min, max] range. NaN collapses to `min`.
#[inline(always)]
pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    if v > max { max } else if v >= min { v } else { min }
}

/// Clamp to [0, 1].
#[inline(always)]
pub fn saturate(v: f64) -> f64 {
    clamp(v, 0.0, 1.0)
}

/// Linear interpolation between a and b.
#[inline(always)]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// `num / den` clamped to [0, 1]. A vanishing denominator yields a step
/// function on the sign of `num`.
#[inline]
pub fn blend_factor(num: f64, den: f64) -> f64 {
    if den.abs() < 1e-30 {
        if num >= 0.0 { 1.0 } else { 0.0 }
    } else {
        saturate(num / den)
    }
}

/// Floating-point modulo with a result in [0, m).
#[inline]
pub fn wrap(v: f64, m: f64) -> f64 {
    let r = v % m;
    if r < 0.0 { r + m } else { r }
}

/// Pack a float to a byte [0, 255].
#[inline(always)]
pub fn float_to_byte(v: f64) -> u8 {
    let vi = (v * 255.0) as i32;
    if vi < 0 { 0 } else if vi > 255 { 255 } else { vi as u8 }
}

/// Unpack a byte [0, 255] to a float [0, 1].
#[inline(always)]
pub fn byte_to_float(v: u8) -> f64 {
    v as f64 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
        assert_eq!(clamp(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 10.0, 0.5) - 5.0).abs() < 1e-10);
        assert!((lerp(0.0, 10.0, 0.0) - 0.0).abs() < 1e-10);
        assert!((lerp(0.0, 10.0, 1.0) - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_blend_factor() {
        assert_eq!(blend_factor(5.0, 10.0), 0.5);
        assert_eq!(blend_factor(50.0, 10.0), 1.0);
        assert_eq!(blend_factor(-1.0, 10.0), 0.0);
        assert_eq!(blend_factor(1.0, 0.0), 1.0);
        assert_eq!(blend_factor(-1.0, 0.0), 0.0);
    }

    #[test]
    fn test_wrap() {
        assert!((wrap(-1.0, 4.0) - 3.0).abs() < 1e-12);
        assert!((wrap(9.0, 4.0) - 1.0).abs() < 1e-12);
    }
}
