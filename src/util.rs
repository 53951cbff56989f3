//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

use cgmath::num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: std::cmp::PartialOrd> Interval<T> {
    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns true if the value lies strictly inside the interval.
    pub fn contains_open(&self, value: T) -> bool {
        value > self.min && value < self.max
    }

    /// Returns true if the interval is non-empty.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

impl<T: Float> Interval<T> {
    /// Creates an interval with the given centre and relative radius,
    /// e.g. `disc_rel(800.0, 0.3)` is `[560, 1040]`.
    pub fn disc_rel(centre: T, fraction: T) -> Self {
        Self {
            min: centre * (T::one() - fraction),
            max: centre * (T::one() + fraction),
        }
    }

    /// Clamps a value into the interval.
    pub fn clamp(&self, value: T) -> T {
        value.max(self.min).min(self.max)
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

#[cfg(test)]
mod test {
    use super::Interval;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn relative_disc() {
        let i = Interval::disc_rel(800.0f64, 0.3);
        assert_approx_eq!(i.min, 560.0);
        assert_approx_eq!(i.max, 1040.0);
    }

    #[test]
    fn open_and_closed() {
        let i = Interval::new(-50.0f64, 400.0);
        assert!(i.contains(400.0));
        assert!(!i.contains_open(400.0));
        assert!(i.contains_open(0.0));
        assert_eq!(i.clamp(500.0), 400.0);
    }
}
