/// Floating point type used throughout system
pub type Real = f64;

/// Default density and pressure floor: `sqrt(1024 * FLT_MIN)`.
pub fn default_floor() -> Real {
    (1024.0 * f32::MIN_POSITIVE as Real).sqrt()
}

/// Square of a value.
#[inline]
pub fn sqr(x: Real) -> Real {
    x * x
}

/// Sum of squares of a 3-vector.
#[inline]
pub fn norm_sq3(v: [Real; 3]) -> Real {
    v[0] * v[0] + v[1] * v[1] + v[2] * v[2]
}

/// Dot product of two 3-vectors.
#[inline]
pub fn dot3(a: [Real; 3], b: [Real; 3]) -> Real {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_floor_is_tiny_and_positive() {
        let floor = default_floor();
        assert!(floor > 0.0);
        assert!(floor < 1e-16);
    }

    #[test]
    fn vector_helpers() {
        assert_eq!(norm_sq3([1.0, 2.0, 2.0]), 9.0);
        assert_eq!(dot3([1.0, 0.0, 2.0], [3.0, 5.0, 0.5]), 4.0);
        assert_eq!(sqr(-3.0), 9.0);
    }
}
