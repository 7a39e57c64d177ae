use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A number that is an integer multiple of one half.
///
/// Routing track indices live on a half-integer grid: track `i` sits on a pitch
/// boundary, track `i + 1/2` sits halfway between two pitch boundaries.
#[derive(
    Debug, Default, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct HalfInt(i64);

impl HalfInt {
    /// Creates a [`HalfInt`] equal to `dbl / 2`.
    #[inline]
    pub const fn from_double(dbl: i64) -> Self {
        Self(dbl)
    }

    #[inline]
    pub const fn from_int(val: i64) -> Self {
        Self(2 * val)
    }

    /// Returns twice the value of this number.
    #[inline]
    pub const fn double(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_integer(&self) -> bool {
        self.0 % 2 == 0
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 2.0
    }
}

impl From<i64> for HalfInt {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

impl std::ops::Add for HalfInt {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for HalfInt {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::Mul<i64> for HalfInt {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Display for HalfInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halfint_display() {
        assert_eq!(HalfInt::from_int(3).to_string(), "3");
        assert_eq!(HalfInt::from_double(7).to_string(), "3.5");
        assert_eq!(HalfInt::from_double(-1).to_string(), "-0.5");
    }

    #[test]
    fn test_halfint_arith() {
        let a = HalfInt::from_double(3);
        let b = HalfInt::from_int(2);
        assert_eq!(a + b, HalfInt::from_double(7));
        assert_eq!(b - a, HalfInt::from_double(1));
        assert_eq!(a * 4, HalfInt::from_int(6));
        assert!(!a.is_integer());
    }
}
