#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A two dimensional point.
///
/// This is the basic type used for defining positions. All coordinates are
/// `f64` — the exact geometric predicates (see [crate::math]) are anchored to
/// double precision arithmetic.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Point2 {
    /// The point's x coordinate
    pub x: f64,
    /// The point's y coordinate
    pub y: f64,
}

impl Point2 {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }

    /// Returns the squared distance of this point and another point.
    #[inline]
    pub fn distance_2(&self, other: Self) -> f64 {
        self.sub(other).length2()
    }

    /// Returns the distance of this point and another point.
    #[inline]
    pub fn distance(&self, other: Self) -> f64 {
        self.distance_2(other).sqrt()
    }

    pub(crate) fn mul(&self, factor: f64) -> Self {
        Point2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub(crate) fn add(&self, other: Self) -> Self {
        Point2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub(crate) fn sub(&self, other: Self) -> Self {
        Point2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub(crate) fn length2(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub(crate) fn dot(&self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub(crate) fn lerp(&self, other: Self, t: f64) -> Self {
        self.add(other.sub(*self).mul(t))
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Point2::new(x, y)
    }
}

impl From<[f64; 2]> for Point2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Point2::new(x, y)
    }
}

impl From<Point2> for [f64; 2] {
    fn from(point: Point2) -> Self {
        [point.x, point.y]
    }
}

/// An axis aligned rectangle, used to report mesh extents and to clip
/// unbounded Voronoi cells.
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct BoundingBox {
    lower: Point2,
    upper: Point2,
}

impl BoundingBox {
    /// Creates a bounding box that contains no point.
    ///
    /// Extending it with any point will make it degenerate to that point.
    pub fn empty() -> Self {
        BoundingBox {
            lower: Point2::new(f64::INFINITY, f64::INFINITY),
            upper: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates a bounding box from two corner points.
    pub fn from_corners(a: Point2, b: Point2) -> Self {
        BoundingBox {
            lower: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            upper: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// The corner with the smallest coordinates.
    pub fn lower(&self) -> Point2 {
        self.lower
    }

    /// The corner with the largest coordinates.
    pub fn upper(&self) -> Point2 {
        self.upper
    }

    /// Width of the box, zero for an empty box.
    pub fn width(&self) -> f64 {
        (self.upper.x - self.lower.x).max(0.0)
    }

    /// Height of the box, zero for an empty box.
    pub fn height(&self) -> f64 {
        (self.upper.y - self.lower.y).max(0.0)
    }

    /// Extends the box to contain `point`.
    pub fn add_point(&mut self, point: Point2) {
        self.lower = Point2::new(self.lower.x.min(point.x), self.lower.y.min(point.y));
        self.upper = Point2::new(self.upper.x.max(point.x), self.upper.y.max(point.y));
    }

    /// Returns `true` if `point` lies inside or on the boundary of the box.
    pub fn contains(&self, point: Point2) -> bool {
        point.x >= self.lower.x
            && point.x <= self.upper.x
            && point.y >= self.lower.y
            && point.y <= self.upper.y
    }

    /// Grows the box by `margin` in every direction.
    pub fn inflated(&self, margin: f64) -> Self {
        BoundingBox {
            lower: Point2::new(self.lower.x - margin, self.lower.y - margin),
            upper: Point2::new(self.upper.x + margin, self.upper.y + margin),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{BoundingBox, Point2};
    use approx::assert_relative_eq;

    #[test]
    fn test_point_arithmetic() {
        let a = Point2::new(1.0, 2.0);
        let b = Point2::new(4.0, 6.0);
        assert_relative_eq!(a.distance_2(b), 25.0);
        assert_relative_eq!(a.distance(b), 5.0);
        assert_eq!(a.add(b), Point2::new(5.0, 8.0));
        assert_eq!(b.sub(a), Point2::new(3.0, 4.0));
        assert_relative_eq!(a.dot(b), 16.0);
        assert_eq!(a.lerp(b, 0.5), Point2::new(2.5, 4.0));
    }

    #[test]
    fn test_bounding_box() {
        let mut bounds = BoundingBox::empty();
        bounds.add_point(Point2::new(1.0, -1.0));
        bounds.add_point(Point2::new(-2.0, 3.0));
        assert_eq!(bounds.lower(), Point2::new(-2.0, -1.0));
        assert_eq!(bounds.upper(), Point2::new(1.0, 3.0));
        assert_relative_eq!(bounds.width(), 3.0);
        assert_relative_eq!(bounds.height(), 4.0);
        assert!(bounds.contains(Point2::new(0.0, 0.0)));
        assert!(!bounds.contains(Point2::new(2.0, 0.0)));

        let inflated = bounds.inflated(1.0);
        assert!(inflated.contains(Point2::new(2.0, 0.0)));
    }
}
