//! Grid rounding helpers.
//!
//! All rounding is floor-based on the mathematical integers, so negative coordinates
//! round the same way positive ones do.

/// Integer division rounding towards positive infinity.
#[inline]
pub fn ceil_div(num: i64, den: i64) -> i64 {
    debug_assert!(den > 0);
    -((-num).div_euclid(den))
}

/// Rounds `val` up to the nearest multiple of `grid`.
#[inline]
pub fn round_up(val: i64, grid: i64) -> i64 {
    ceil_div(val, grid) * grid
}

/// Rounds `val` down to the nearest multiple of `grid`.
#[inline]
pub fn round_down(val: i64, grid: i64) -> i64 {
    val.div_euclid(grid) * grid
}

/// Rounds `val` up to the nearest value of the form `k * grid + offset`.
#[inline]
pub fn round_up_offset(val: i64, grid: i64, offset: i64) -> i64 {
    round_up(val - offset, grid) + offset
}

/// Rounds `val` down to the nearest value of the form `k * grid + offset`.
#[inline]
pub fn round_down_offset(val: i64, grid: i64, offset: i64) -> i64 {
    round_down(val - offset, grid) + offset
}

/// Greatest common divisor of two non-negative integers.
pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple of all the given values.
///
/// Returns 1 for an empty iterator.
pub fn lcm(values: impl IntoIterator<Item = i64>) -> i64 {
    values
        .into_iter()
        .fold(1, |acc, v| if v == 0 { acc } else { acc / gcd(acc, v) * v.abs() })
}
