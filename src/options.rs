//! Configuration surface and input/configuration error types.

use std::{error::Error, fmt::Display, sync::Arc};

use crate::Point2;

/// The triangulation strategy used to build the initial Delaunay
/// triangulation.
///
/// All strategies produce a topologically identical result; they differ in
/// run time characteristics. Divide and conquer is the fastest in practice
/// and the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Randomized incremental insertion (Bowyer–Watson). Expected
    /// `O(n log n)`, worst case `O(n²)`.
    Incremental,
    /// Dwyer's alternating-cut divide and conquer. `O(n log n)` worst case.
    #[default]
    DivideAndConquer,
    /// Plane sweep with a splay tree front. `O(n log n)` worst case.
    Sweepline,
}

/// A user supplied triangle test for quality refinement.
///
/// Called with the triangle's corner positions (counterclockwise) and its
/// area; returning `true` marks the triangle as unsuitable, requesting a
/// split. The test may be inconsistent (e.g. always `true`); refinement will
/// then stop once its Steiner budget is exhausted instead of looping.
pub type TriangleUnsuitable = Arc<dyn Fn([Point2; 3], f64) -> bool + Send + Sync>;

/// Controls how a triangulation is built and refined.
///
/// Constructed with [TriangulateOptions::new] and customized through its
/// builder methods:
///
/// ```
/// use ruppert::{Algorithm, TriangulateOptions};
///
/// let options = TriangulateOptions::new()
///     .with_algorithm(Algorithm::Incremental)
///     .with_min_angle(25.0)
///     .with_max_area(0.1)
///     .enclose_convex_hull();
/// ```
#[derive(Clone)]
pub struct TriangulateOptions {
    pub(crate) algorithm: Algorithm,
    pub(crate) quality: bool,
    pub(crate) min_angle: f64,
    pub(crate) max_angle: Option<f64>,
    pub(crate) max_area: Option<f64>,
    pub(crate) region_areas: bool,
    pub(crate) user_test: Option<TriangleUnsuitable>,
    pub(crate) conforming: bool,
    pub(crate) enclose_hull: bool,
    pub(crate) boundary_markers: bool,
    pub(crate) jettison: bool,
    pub(crate) steiner_budget: Option<usize>,
    pub(crate) seed: u64,
}

impl Default for TriangulateOptions {
    fn default() -> Self {
        TriangulateOptions {
            algorithm: Algorithm::default(),
            quality: false,
            min_angle: 0.0,
            max_angle: None,
            max_area: None,
            region_areas: false,
            user_test: None,
            conforming: false,
            enclose_hull: false,
            boundary_markers: true,
            jettison: false,
            steiner_budget: None,
            seed: DEFAULT_SEED,
        }
    }
}

/// Default seed for the per-build random source; see
/// [TriangulateOptions::with_seed].
pub const DEFAULT_SEED: u64 = 0x8af1_77c4_9b2f_03d1;

impl TriangulateOptions {
    /// Creates the default options: divide and conquer, no refinement, no
    /// hull enclosure, boundary markers enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the triangulation strategy.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enables quality refinement with a minimum angle bound in degrees.
    ///
    /// Termination is only provable for bounds up to roughly 28.6 degrees
    /// (more with the off-center insertion point this crate uses). Larger
    /// values are accepted up to 60 degrees; the Steiner budget then acts as
    /// the safety valve. Values outside `0..=60` are rejected by
    /// [Self::validate].
    pub fn with_min_angle(mut self, degrees: f64) -> Self {
        self.quality = true;
        self.min_angle = degrees;
        self
    }

    /// Enables quality refinement with a maximum angle bound in degrees
    /// (valid range 60–180).
    pub fn with_max_angle(mut self, degrees: f64) -> Self {
        self.quality = true;
        self.max_angle = Some(degrees);
        self
    }

    /// Enables quality refinement with a fixed area bound: every output
    /// triangle will have an area of at most `area`.
    pub fn with_max_area(mut self, area: f64) -> Self {
        self.quality = true;
        self.max_area = Some(area);
        self
    }

    /// Honors the per-region area bounds attached to region seed points.
    pub fn with_region_areas(mut self) -> Self {
        self.quality = true;
        self.region_areas = true;
        self
    }

    /// Installs a user supplied suitability test, see [TriangleUnsuitable].
    pub fn with_user_test(mut self, test: TriangleUnsuitable) -> Self {
        self.quality = true;
        self.user_test = Some(test);
        self
    }

    /// Requests a *conforming* Delaunay triangulation: instead of merely
    /// forcing input segments into the mesh, Steiner points are inserted
    /// until every triangle satisfies the empty circumcircle property
    /// globally.
    pub fn conforming_delaunay(mut self) -> Self {
        self.conforming = true;
        self
    }

    /// Encloses the triangulation's convex hull with subsegments.
    pub fn enclose_convex_hull(mut self) -> Self {
        self.enclose_hull = true;
        self
    }

    /// Suppresses boundary markers on output vertices and segments.
    pub fn suppress_boundary_markers(mut self) -> Self {
        self.boundary_markers = false;
        self
    }

    /// Drops vertices that ended up unused (undead) from written output.
    pub fn jettison_unused_vertices(mut self) -> Self {
        self.jettison = true;
        self
    }

    /// Limits the number of Steiner points refinement may insert.
    ///
    /// Defaults to ten times the input vertex count. Exhausting the budget
    /// surfaces as `RefinementResult { complete: false, .. }` carrying the
    /// partially refined mesh.
    pub fn with_steiner_budget(mut self, budget: usize) -> Self {
        self.steiner_budget = Some(budget);
        self
    }

    /// Seeds the random source used for incremental insertion order, locator
    /// sampling and sweepline tie breaks.
    ///
    /// Builds with the same seed and input are reproducible. The default seed
    /// is a fixed constant.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates angle and area bounds.
    ///
    /// An out-of-range minimum angle is a hard error here; the reference
    /// engine instead demoted it to "no refinement" with a warning, which
    /// hides the mistake from callers that do not read warnings.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !(0.0..=60.0).contains(&self.min_angle) || self.min_angle.is_nan() {
            return Err(OptionsError::InvalidMinAngle(self.min_angle));
        }
        if let Some(max_angle) = self.max_angle {
            if !(60.0..=180.0).contains(&max_angle) || max_angle.is_nan() {
                return Err(OptionsError::InvalidMaxAngle(max_angle));
            }
            if self.min_angle > max_angle {
                return Err(OptionsError::ConflictingAngleBounds {
                    min: self.min_angle,
                    max: max_angle,
                });
            }
        }
        if let Some(max_area) = self.max_area {
            if !(max_area > 0.0) {
                return Err(OptionsError::InvalidMaxArea(max_area));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for TriangulateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriangulateOptions")
            .field("algorithm", &self.algorithm)
            .field("quality", &self.quality)
            .field("min_angle", &self.min_angle)
            .field("max_angle", &self.max_angle)
            .field("max_area", &self.max_area)
            .field("region_areas", &self.region_areas)
            .field("user_test", &self.user_test.as_ref().map(|_| "<fn>"))
            .field("conforming", &self.conforming)
            .field("enclose_hull", &self.enclose_hull)
            .field("boundary_markers", &self.boundary_markers)
            .field("jettison", &self.jettison)
            .field("steiner_budget", &self.steiner_budget)
            .field("seed", &self.seed)
            .finish()
    }
}

/// Invalid configuration, reported before any mesh mutation begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionsError {
    /// The minimum angle bound lies outside `0..=60` degrees.
    InvalidMinAngle(f64),
    /// The maximum angle bound lies outside `60..=180` degrees.
    InvalidMaxAngle(f64),
    /// The minimum angle bound exceeds the maximum angle bound.
    ConflictingAngleBounds {
        /// Configured minimum angle in degrees.
        min: f64,
        /// Configured maximum angle in degrees.
        max: f64,
    },
    /// The fixed area bound is zero, negative or NaN.
    InvalidMaxArea(f64),
}

impl Display for OptionsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionsError::InvalidMinAngle(angle) => {
                write!(f, "minimum angle bound {angle}° is outside 0°..=60°")
            }
            OptionsError::InvalidMaxAngle(angle) => {
                write!(f, "maximum angle bound {angle}° is outside 60°..=180°")
            }
            OptionsError::ConflictingAngleBounds { min, max } => {
                write!(f, "minimum angle bound {min}° exceeds maximum angle bound {max}°")
            }
            OptionsError::InvalidMaxArea(area) => {
                write!(f, "maximum area bound {area} is not a positive number")
            }
        }
    }
}

impl Error for OptionsError {}

/// Invalid input geometry, reported before any mesh mutation begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// Fewer than three input points were given.
    TooFewPoints(usize),
    /// A segment's endpoint index does not refer to an input point.
    SegmentIndexOutOfRange {
        /// Index of the offending segment.
        segment: usize,
        /// The out-of-range endpoint index.
        endpoint: usize,
    },
    /// A segment's endpoints are the same point.
    DegenerateSegment {
        /// Index of the offending segment.
        segment: usize,
    },
    /// All input points lie on a single line; no triangle can be formed.
    AllCollinear,
    /// A triangle corner index in reconstruction data is out of range.
    TriangleIndexOutOfRange {
        /// Index of the offending triangle.
        triangle: usize,
        /// The out-of-range corner index.
        corner: usize,
    },
    /// A triangle in reconstruction data has zero area.
    DegenerateTriangle {
        /// Index of the offending triangle.
        triangle: usize,
    },
    /// A segment in reconstruction data does not match any triangle edge.
    SegmentNotAnEdge {
        /// Index of the offending segment.
        segment: usize,
    },
    /// Two input points coincide exactly. Carried as a detail of
    /// reconstruction, where coincident points cannot be skipped silently.
    DuplicatePoint {
        /// Index of the later duplicate point.
        point: usize,
    },
}

impl Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::TooFewPoints(count) => {
                write!(f, "at least 3 input points are required, got {count}")
            }
            InputError::SegmentIndexOutOfRange { segment, endpoint } => {
                write!(f, "segment {segment} references nonexistent point {endpoint}")
            }
            InputError::DegenerateSegment { segment } => {
                write!(f, "segment {segment} has identical endpoints")
            }
            InputError::AllCollinear => {
                write!(f, "all input points are collinear")
            }
            InputError::TriangleIndexOutOfRange { triangle, corner } => {
                write!(f, "triangle {triangle} references nonexistent point {corner}")
            }
            InputError::DegenerateTriangle { triangle } => {
                write!(f, "triangle {triangle} has zero area")
            }
            InputError::SegmentNotAnEdge { segment } => {
                write!(f, "segment {segment} does not coincide with a triangle edge")
            }
            InputError::DuplicatePoint { point } => {
                write!(f, "point {point} coincides with an earlier point")
            }
        }
    }
}

impl Error for InputError {}

/// Umbrella error for the triangulation entry points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangulateError {
    /// Invalid configuration.
    Options(OptionsError),
    /// Invalid input geometry.
    Input(InputError),
    /// A vertex could not be inserted.
    Insertion(crate::InsertionError),
}

impl Display for TriangulateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriangulateError::Options(e) => e.fmt(f),
            TriangulateError::Input(e) => e.fmt(f),
            TriangulateError::Insertion(e) => e.fmt(f),
        }
    }
}

impl Error for TriangulateError {}

impl From<OptionsError> for TriangulateError {
    fn from(error: OptionsError) -> Self {
        TriangulateError::Options(error)
    }
}

impl From<InputError> for TriangulateError {
    fn from(error: InputError) -> Self {
        TriangulateError::Input(error)
    }
}

impl From<crate::InsertionError> for TriangulateError {
    fn from(error: crate::InsertionError) -> Self {
        TriangulateError::Insertion(error)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_angle_validation() {
        assert!(TriangulateOptions::new().validate().is_ok());
        assert!(TriangulateOptions::new()
            .with_min_angle(28.0)
            .validate()
            .is_ok());
        assert_eq!(
            TriangulateOptions::new().with_min_angle(61.0).validate(),
            Err(OptionsError::InvalidMinAngle(61.0))
        );
        assert_eq!(
            TriangulateOptions::new().with_min_angle(-1.0).validate(),
            Err(OptionsError::InvalidMinAngle(-1.0))
        );
        assert_eq!(
            TriangulateOptions::new().with_max_angle(30.0).validate(),
            Err(OptionsError::InvalidMaxAngle(30.0))
        );
        assert_eq!(
            TriangulateOptions::new()
                .with_min_angle(60.0)
                .with_max_angle(178.0)
                .validate(),
            Ok(())
        );
    }

    #[test]
    fn test_area_validation() {
        assert_eq!(
            TriangulateOptions::new().with_max_area(0.0).validate(),
            Err(OptionsError::InvalidMaxArea(0.0))
        );
        assert!(matches!(
            TriangulateOptions::new().with_max_area(f64::NAN).validate(),
            Err(OptionsError::InvalidMaxArea(_))
        ));
        assert!(TriangulateOptions::new()
            .with_max_area(2.5)
            .validate()
            .is_ok());
    }
}
