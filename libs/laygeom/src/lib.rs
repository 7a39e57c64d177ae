//! Integer layout geometry and grid arithmetic.

use serde::{Deserialize, Serialize};

pub mod grid;
pub mod halfint;

pub use grid::{ceil_div, lcm, round_down, round_down_offset, round_up, round_up_offset};
pub use halfint::HalfInt;

/// A point in two-dimensional layout-space.
#[derive(
    Debug, Copy, Clone, Default, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    /// Creates a new [`Point`] from (x,y) coordinates.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// A closed interval of integer coordinates.
///
/// Unlike most geometry in this crate, a [`Span`] built with [`Span::new_unchecked`] may be
/// empty or inverted. Solvers use such spans to signal "nothing to draw"; see
/// [`Span::is_physical`].
#[derive(
    Debug, Default, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize, PartialEq, Eq,
)]
pub struct Span {
    start: i64,
    stop: i64,
}

impl Span {
    /// Creates a new [`Span`] between two integers, without reordering them.
    pub const fn new_unchecked(start: i64, stop: i64) -> Self {
        Self { start, stop }
    }

    /// Creates a new [`Span`] between two integers.
    pub fn new(start: i64, stop: i64) -> Self {
        use std::cmp::{max, min};
        Self {
            start: min(start, stop),
            stop: max(start, stop),
        }
    }

    pub fn with_start_and_length(start: i64, length: i64) -> Self {
        Self {
            stop: start + length,
            start,
        }
    }

    pub fn with_stop_and_length(stop: i64, length: i64) -> Self {
        Self {
            start: stop - length,
            stop,
        }
    }

    /// Creates a span of the given length whose start is `center - length / 2`.
    ///
    /// Odd lengths place the extra unit above the center, matching floor division
    /// of the half length.
    pub fn from_center_length(center: i64, length: i64) -> Self {
        Self::with_start_and_length(center - length.div_euclid(2), length)
    }

    /// Gets the center of the span, rounded towards negative infinity.
    #[inline]
    pub fn center(&self) -> i64 {
        (self.start + self.stop).div_euclid(2)
    }

    /// Gets the signed length of the span.
    #[inline]
    pub fn length(&self) -> i64 {
        self.stop - self.start
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> i64 {
        self.stop
    }

    /// Returns `true` if the span has strictly positive length.
    #[inline]
    pub fn is_physical(&self) -> bool {
        self.stop > self.start
    }

    /// Returns the smallest span containing both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self {
            start: std::cmp::min(self.start, other.start),
            stop: std::cmp::max(self.stop, other.stop),
        }
    }

    /// Returns `true` if `other` lies entirely within `self`.
    pub fn contains(self, other: Self) -> bool {
        self.start <= other.start && self.stop >= other.stop
    }
}

/// An enumeration of axis-aligned directions.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub enum Dir {
    /// The horizontal, or x-aligned, direction.
    #[default]
    Horiz,
    /// The vertical, or y-aligned, direction.
    Vert,
}

/// An axis-aligned rectangle.
///
/// Rectangles built with [`Rect::from_sides`] keep their corners as given and may be
/// degenerate. Use [`Rect::is_physical`] before emitting such a rectangle.
#[derive(
    Debug, Default, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Rect {
    /// The lower-left corner.
    pub p0: Point,
    /// The upper-right corner.
    pub p1: Point,
}

impl Rect {
    /// Creates a rectangle from its left, bottom, right and top coordinates as given.
    pub fn from_sides(xl: i64, yb: i64, xr: i64, yt: i64) -> Self {
        Self {
            p0: Point::new(xl, yb),
            p1: Point::new(xr, yt),
        }
    }

    /// Creates a rectangle from horizontal and vertical [`Span`]s.
    pub fn from_spans(h: Span, v: Span) -> Self {
        Self {
            p0: Point::new(h.start(), v.start()),
            p1: Point::new(h.stop(), v.stop()),
        }
    }

    /// Returns the center point of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(
            (self.p0.x + self.p1.x).div_euclid(2),
            (self.p0.y + self.p1.y).div_euclid(2),
        )
    }

    #[inline]
    pub fn bottom(&self) -> i64 {
        self.p0.y
    }

    #[inline]
    pub fn top(&self) -> i64 {
        self.p1.y
    }

    #[inline]
    pub fn left(&self) -> i64 {
        self.p0.x
    }

    #[inline]
    pub fn right(&self) -> i64 {
        self.p1.x
    }

    pub fn hspan(&self) -> Span {
        Span::new_unchecked(self.p0.x, self.p1.x)
    }

    pub fn vspan(&self) -> Span {
        Span::new_unchecked(self.p0.y, self.p1.y)
    }

    /// Returns the signed horizontal width of the rectangle.
    #[inline]
    pub fn width(&self) -> i64 {
        self.hspan().length()
    }

    /// Returns the signed vertical height of the rectangle.
    #[inline]
    pub fn height(&self) -> i64 {
        self.vspan().length()
    }

    /// Returns `true` if both the width and height are strictly positive.
    #[inline]
    pub fn is_physical(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}
