//! Mathematical structs and functions.

use cgmath::prelude::*;
use cgmath::{Point2, Vector2};

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// Splits a vector into its unit direction and magnitude.
/// Returns `None` for a zero-length vector.
#[inline(always)]
pub fn normalize_with_length(v: Vector2d) -> Option<(Vector2d, f64)> {
    let mag = v.magnitude();
    if mag > 0.0 {
        Some((v / mag, mag))
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn zero_vector_has_no_direction() {
        assert!(normalize_with_length(Vector2d::new(0.0, 0.0)).is_none());
        let (dir, len) = normalize_with_length(Vector2d::new(3.0, 4.0)).unwrap();
        assert_approx_eq!(len, 5.0);
        assert_approx_eq!(dir.x, 0.6);
    }
}
