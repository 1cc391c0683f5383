//! Geometric primitives used by every layer above.
//!
//! The orientation and in-circle tests delegate to the `robust` crate, an
//! implementation of Shewchuk's adaptive precision predicates: a fast floating
//! point evaluation is attempted first and escalated to exact arithmetic only
//! when the result is too close to zero to trust. All tie breaking and
//! degeneracy policy of the triangulation algorithms lives here, not in the
//! callers.

use std::{error::Error, fmt::Display};

use crate::Point2;

/// The error type used for inserting vertices into a mesh.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Debug, Hash)]
pub enum InsertionError {
    /// A coordinate value was too small.
    ///
    /// The absolute value of any inserted vertex coordinate must either be zero
    /// or greater than or equal to [MIN_ALLOWED_VALUE].
    TooSmall,

    /// A coordinate value was too large.
    ///
    /// The absolute value of any inserted vertex coordinate must be less than
    /// or equal to [MAX_ALLOWED_VALUE].
    TooLarge,

    /// A coordinate value was NaN.
    NAN,

    /// The inserted vertex coincides exactly with a vertex that is already
    /// part of the mesh.
    ///
    /// Coincident points cannot be represented topologically; reporting them
    /// is preferred over silently corrupting the triangulation.
    DuplicateVertex,
}

impl Display for InsertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Debug>::fmt(self, f)
    }
}

impl Error for InsertionError {}

/// The smallest allowed coordinate value greater than zero. Equal to 2<sup>-142</sup>.
///
/// The *absolute value* of any vertex coordinate must be either zero or greater
/// than or equal to this value. This prevents floating point exponent underflow
/// inside the exact predicate evaluation.
// These numbers come from the paper of Jonathan Richard Shewchuk:
// "The four predicates implemented for this report will not overflow nor underflow if
// their inputs have exponents in the range -[142, 201] and IEEE-745 double precision
// arithmetic is used."
pub const MIN_ALLOWED_VALUE: f64 = 1.793662034335766e-43; // 1.0 * 2^-142

/// The largest allowed coordinate value. Equal to 2<sup>201</sup>.
///
/// The *absolute value* of any vertex coordinate must be smaller than or equal
/// to this value, preventing overflow inside the exact predicate evaluation.
pub const MAX_ALLOWED_VALUE: f64 = 3.2138760885179806e60; // 1.0 * 2^201

/// Checks if a coordinate value is suitable for triangulation.
///
/// Will return an error if and only if
///  - The absolute value of the coordinate is too small (see [MIN_ALLOWED_VALUE])
///  - The absolute value of the coordinate is too large (see [MAX_ALLOWED_VALUE])
///  - The coordinate is NaN (not a number)
///
/// Passing in any non-finite floating point number (e.g. `f64::NEG_INFINITY`)
/// will result in `Err(InsertionError::TooLarge)`.
pub fn validate_coordinate(value: f64) -> Result<(), InsertionError> {
    if value.is_nan() {
        Err(InsertionError::NAN)
    } else if value.abs() < MIN_ALLOWED_VALUE && value != 0.0 {
        Err(InsertionError::TooSmall)
    } else if value.abs() > MAX_ALLOWED_VALUE {
        Err(InsertionError::TooLarge)
    } else {
        Ok(())
    }
}

/// Checks if a point is suitable for triangulation, see [validate_coordinate].
pub fn validate_point(point: Point2) -> Result<(), InsertionError> {
    validate_coordinate(point.x)?;
    validate_coordinate(point.y)?;
    Ok(())
}

/// Prevents underflow issues of a position by setting any coordinate that is
/// too small to zero.
///
/// A point returned by this function will never cause [InsertionError::TooSmall].
/// Note that this method will _always_ round towards zero.
pub fn mitigate_underflow(position: Point2) -> Point2 {
    let fix = |value: f64| {
        if value != 0.0 && value.abs() < MIN_ALLOWED_VALUE {
            0.0
        } else {
            value
        }
    };
    Point2::new(fix(position.x), fix(position.y))
}

fn to_robust_coord(point: Point2) -> robust::Coord<f64> {
    robust::Coord {
        x: point.x,
        y: point.y,
    }
}

/// Returns twice the signed area of the triangle `a`, `b`, `c`.
///
/// The result is positive if the corners occur in counterclockwise order,
/// negative for clockwise order and exactly zero if the points are collinear.
pub fn counterclockwise(a: Point2, b: Point2, c: Point2) -> f64 {
    robust::orient2d(to_robust_coord(a), to_robust_coord(b), to_robust_coord(c))
}

/// In-circle test.
///
/// Assuming `a`, `b`, `c` are in counterclockwise order, the result is positive
/// if `d` lies strictly inside the circle through `a`, `b` and `c`, negative if
/// it lies strictly outside and exactly zero if all four points are cocircular.
pub fn in_circle(a: Point2, b: Point2, c: Point2, d: Point2) -> f64 {
    robust::incircle(
        to_robust_coord(a),
        to_robust_coord(b),
        to_robust_coord(c),
        to_robust_coord(d),
    )
}

/// Indicates a point's position relative to a directed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSide {
    /// The point lies strictly left of the directed line.
    Left,
    /// The point lies exactly on the line.
    On,
    /// The point lies strictly right of the directed line.
    Right,
}

impl LineSide {
    pub(crate) fn from_determinant(determinant: f64) -> Self {
        if determinant > 0.0 {
            LineSide::Left
        } else if determinant < 0.0 {
            LineSide::Right
        } else {
            LineSide::On
        }
    }

    /// Returns `true` for [LineSide::Left].
    pub fn is_left(self) -> bool {
        self == LineSide::Left
    }

    /// Returns `true` for [LineSide::Right].
    pub fn is_right(self) -> bool {
        self == LineSide::Right
    }

    /// Returns `true` for [LineSide::On].
    pub fn is_on_line(self) -> bool {
        self == LineSide::On
    }
}

/// Classifies `query` relative to the directed line from `from` to `to`.
pub fn side(from: Point2, to: Point2, query: Point2) -> LineSide {
    LineSide::from_determinant(counterclockwise(from, to, query))
}

/// The unsigned area of the triangle `a`, `b`, `c`.
pub fn triangle_area(a: Point2, b: Point2, c: Point2) -> f64 {
    let ab = b.sub(a);
    let ac = c.sub(a);
    (ab.x * ac.y - ab.y * ac.x).abs() * 0.5
}

/// Result of [circumcenter]: the center point together with its offset from
/// the first triangle corner, expressed along the triangle's edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circumcenter {
    /// The circumcenter position.
    pub position: Point2,
    /// Multiple of the edge `a -> b` contained in `position - a`.
    pub xi: f64,
    /// Multiple of the edge `a -> c` contained in `position - a`.
    pub eta: f64,
}

/// Computes the circumcenter of the triangle `a`, `b`, `c`.
///
/// The corners must not be collinear. The returned barycentric style offsets
/// `xi`/`eta` allow callers to tell which triangle edge the center is closest
/// to without further orientation tests.
pub fn circumcenter(a: Point2, b: Point2, c: Point2) -> Circumcenter {
    let ab = b.sub(a);
    let ac = c.sub(a);
    let ab_len = ab.length2();
    let ac_len = ac.length2();

    let denominator = 0.5 / (ab.x * ac.y - ab.y * ac.x);
    let dx = (ac.y * ab_len - ab.y * ac_len) * denominator;
    let dy = (ab.x * ac_len - ac.x * ab_len) * denominator;

    let xi = (ac.y * dx - ac.x * dy) * (2.0 * denominator);
    let eta = (ab.x * dy - ab.y * dx) * (2.0 * denominator);

    Circumcenter {
        position: Point2::new(a.x + dx, a.y + dy),
        xi,
        eta,
    }
}

/// Computes the "off-center" Steiner point of a skinny triangle.
///
/// `a` and `b` must form the shortest edge of the triangle `a`, `b`, `c`,
/// ordered counterclockwise. The off-center lies on the perpendicular bisector
/// of the shortest edge, between the edge midpoint and the circumcenter, at
/// the closest position whose triangle `(a, b, offcenter)` still meets the
/// given `radius_edge_bound`. Inserting it instead of the circumcenter removes
/// the skinny triangle just as well but keeps Ruppert style refinement
/// terminating for tighter angle bounds (Üngör's variant).
pub fn off_center(a: Point2, b: Point2, c: Point2, radius_edge_bound: f64) -> Point2 {
    let circumcenter = circumcenter(a, b, c).position;
    let discriminant = 4.0 * radius_edge_bound * radius_edge_bound - 1.0;
    if discriminant < 0.0 {
        // A bound below 0.5 cannot be attained by any triangle.
        return circumcenter;
    }
    let midpoint = a.add(b).mul(0.5);

    // Distance from the midpoint at which the triangle (a, b, x) attains
    // exactly the bounded radius-to-shortest-edge ratio.
    let half_edge = (a.distance_2(b) * 0.25).sqrt();
    let target_height = half_edge * (2.0 * radius_edge_bound + discriminant.sqrt());

    let center_offset = circumcenter.sub(midpoint);
    let center_distance = center_offset.length2().sqrt();
    if center_distance <= target_height || center_distance == 0.0 {
        circumcenter
    } else {
        midpoint.add(center_offset.mul(target_height / center_distance))
    }
}

/// Returns `true` if `query` lies strictly inside the diametral circle of the
/// segment from `a` to `b`.
///
/// This is the encroachment test used by quality refinement: a point inside
/// the diametral circle sees the segment under an angle greater than 90
/// degrees.
pub fn in_diametral_circle(a: Point2, b: Point2, query: Point2) -> bool {
    a.sub(query).dot(b.sub(query)) < 0.0
}

/// Computes the squared cosine of the minimum angle of the triangle `a`, `b`, `c`
/// along with the squared length of its shortest edge.
pub fn min_angle_info(a: Point2, b: Point2, c: Point2) -> (f64, f64) {
    let ab = a.distance_2(b);
    let bc = b.distance_2(c);
    let ca = c.distance_2(a);

    // The minimum angle is opposite the shortest edge.
    let (opposite, adj1, adj2) = if ab <= bc && ab <= ca {
        (ab, bc, ca)
    } else if bc <= ca {
        (bc, ca, ab)
    } else {
        (ca, ab, bc)
    };

    let cos_numerator = adj1 + adj2 - opposite;
    let cos_2 = cos_numerator * cos_numerator / (4.0 * adj1 * adj2);
    (cos_2, opposite)
}

/// Computes the intersection of the segments `a0 -> a1` and `b0 -> b1`.
///
/// The segments must not be parallel. Used by conforming Delaunay segment
/// recovery to place Steiner points at segment crossings.
pub fn segment_intersection(a0: Point2, a1: Point2, b0: Point2, b1: Point2) -> Point2 {
    let r = a1.sub(a0);
    let s = b1.sub(b0);
    let denominator = r.x * s.y - r.y * s.x;
    let t = ((b0.x - a0.x) * s.y - (b0.y - a0.y) * s.x) / denominator;
    a0.add(r.mul(t))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_validate_coordinate() {
        use InsertionError::*;
        assert_eq!(validate_coordinate(f64::NAN), Err(NAN));
        assert_eq!(validate_coordinate(f64::INFINITY), Err(TooLarge));
        assert_eq!(validate_coordinate(f64::NEG_INFINITY), Err(TooLarge));
        assert_eq!(validate_coordinate(MAX_ALLOWED_VALUE * 2.0), Err(TooLarge));
        assert_eq!(validate_coordinate(MIN_ALLOWED_VALUE / 2.0), Err(TooSmall));
        assert_eq!(validate_coordinate(MIN_ALLOWED_VALUE), Ok(()));
        assert_eq!(validate_coordinate(0.0), Ok(()));
        assert_eq!(validate_coordinate(-42.0), Ok(()));
    }

    #[test]
    fn test_mitigate_underflow() {
        let fixed = mitigate_underflow(Point2::new(1.0e-300, 42.0));
        assert_eq!(fixed, Point2::new(0.0, 42.0));
        assert_eq!(validate_point(fixed), Ok(()));
    }

    #[test]
    fn test_counterclockwise() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert!(counterclockwise(a, b, c) > 0.0);
        assert!(counterclockwise(a, c, b) < 0.0);
        assert_eq!(counterclockwise(a, b, Point2::new(2.0, 0.0)), 0.0);
        assert_relative_eq!(counterclockwise(a, b, c), 1.0);
    }

    #[test]
    fn test_in_circle() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        let c = Point2::new(1.0, 1.0);
        assert!(in_circle(a, b, c, Point2::new(1.0, 0.5)) > 0.0);
        assert!(in_circle(a, b, c, Point2::new(5.0, 5.0)) < 0.0);
        // Cocircular: (1, -1) lies on the circle through a, b, c.
        assert_eq!(in_circle(a, b, c, Point2::new(1.0, -1.0)), 0.0);
    }

    #[test]
    fn test_side() {
        let from = Point2::new(0.0, 0.0);
        let to = Point2::new(1.0, 1.0);
        assert!(side(from, to, Point2::new(0.0, 1.0)).is_left());
        assert!(side(from, to, Point2::new(1.0, 0.0)).is_right());
        assert!(side(from, to, Point2::new(0.5, 0.5)).is_on_line());
    }

    #[test]
    fn test_circumcenter() {
        let result = circumcenter(
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        );
        assert_relative_eq!(result.position.x, 1.0);
        assert_relative_eq!(result.position.y, 1.0);

        // The circumcenter of an equilateral triangle is its centroid.
        let sqrt3 = 3.0f64.sqrt();
        let result = circumcenter(
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, sqrt3),
        );
        assert_relative_eq!(result.position.x, 1.0);
        assert_relative_eq!(result.position.y, 1.0 / sqrt3, epsilon = 1.0e-10);
    }

    #[test]
    fn test_off_center_falls_back_to_circumcenter() {
        // A well shaped triangle: the circumcenter already satisfies the bound.
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.5, 0.9);
        let off = off_center(a, b, c, 1.0);
        let center = circumcenter(a, b, c).position;
        assert_relative_eq!(off.x, center.x);
        assert_relative_eq!(off.y, center.y);
    }

    #[test]
    fn test_off_center_moves_towards_short_edge() {
        // Very flat triangle: its circumcenter lies far away from the short
        // edge, the off-center must lie strictly closer.
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(0.1, 0.0);
        let c = Point2::new(0.05, 4.0);
        let center = circumcenter(a, b, c).position;
        let off = off_center(a, b, c, 1.0);
        let midpoint = a.add(b).mul(0.5);
        assert!(off.distance_2(midpoint) < center.distance_2(midpoint));
        // Still on the perpendicular bisector of (a, b).
        assert_relative_eq!(off.x, 0.05, epsilon = 1.0e-10);
    }

    #[test]
    fn test_diametral_circle() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        assert!(in_diametral_circle(a, b, Point2::new(1.0, 0.5)));
        assert!(!in_diametral_circle(a, b, Point2::new(1.0, 1.5)));
        // On the circle boundary: not encroaching.
        assert!(!in_diametral_circle(a, b, Point2::new(1.0, 1.0)));
    }

    #[test]
    fn test_min_angle_info() {
        // 45-45-90 triangle: the smallest angle is 45 degrees.
        let (cos_2, shortest) = min_angle_info(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        );
        assert_relative_eq!(cos_2, 0.5, epsilon = 1.0e-10);
        assert_relative_eq!(shortest, 1.0);
    }

    #[test]
    fn test_segment_intersection() {
        let result = segment_intersection(
            Point2::new(-1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, -1.0),
            Point2::new(0.0, 1.0),
        );
        assert_relative_eq!(result.x, 0.0);
        assert_relative_eq!(result.y, 0.0);
    }
}
