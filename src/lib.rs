//! # Ruppert
//!
//! Planar mesh generation: Delaunay and constrained Delaunay triangulations
//! with quality refinement.
//!
//! Given a set of points, or a planar straight line graph (a polygon with
//! holes, internal contours and region seeds), the crate builds a Delaunay
//! or constrained Delaunay triangulation and, on request, refines it into a
//! quality mesh honoring minimum angle and maximum area bounds. All
//! predicates use adaptive exact arithmetic, so degenerate inputs (collinear
//! and cocircular points) are handled correctly.
//!
//! # Features
//! * Three interchangeable triangulation algorithms: incremental
//!   Bowyer–Watson insertion, divide and conquer with alternating cuts, and
//!   a plane sweep
//! * Constrained and conforming Delaunay triangulations of segment input,
//!   with hole carving and regional attributes
//! * Ruppert style refinement with off-center Steiner points, bounded by a
//!   configurable budget
//! * Point location, Voronoi duals (open and clipped), raw-array
//!   interchange, and a structural consistency checker
//!
//! # Example
//!
//! ```
//! use ruppert::{triangulate, Point2, Polygon, TriangulateOptions};
//!
//! let mut polygon = Polygon::from_points(Vec::new());
//! polygon.add_contour(
//!     &[
//!         Point2::new(0.0, 0.0),
//!         Point2::new(10.0, 0.0),
//!         Point2::new(10.0, 10.0),
//!         Point2::new(0.0, 10.0),
//!     ],
//!     1,
//! );
//! let options = TriangulateOptions::new()
//!     .with_min_angle(28.0)
//!     .with_max_area(2.0);
//! let mesh = triangulate(&polygon, &options)?;
//!
//! for triangle in mesh.triangles() {
//!     assert!(triangle.area() <= 2.0);
//! }
//! # Ok::<(), ruppert::TriangulateError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cdt;
mod interchange;
mod locator;
mod math;
mod mesh;
mod options;
mod point;
mod refinement;
mod triangulate;
mod validation;
mod voronoi;

pub use interchange::RawMesh;
pub use locator::PointLocation;
pub use math::{
    validate_coordinate, validate_point, InsertionError, MAX_ALLOWED_VALUE, MIN_ALLOWED_VALUE,
};
pub use mesh::entities::VertexKind;
pub use mesh::handles::{FixedSubsegHandle, FixedTriangleHandle, FixedVertexHandle};
pub use mesh::{EdgeView, Mesh, MeshStatistics, SubsegView, TriangleView, VertexView};
pub use options::{
    Algorithm, InputError, OptionsError, TriangleUnsuitable, TriangulateError,
    TriangulateOptions, DEFAULT_SEED,
};
pub use point::{BoundingBox, Point2};
pub use refinement::RefinementResult;
pub use triangulate::{triangulate, triangulate_points, Polygon, RegionAttr};
pub use validation::{validate, Diagnostic};
pub use voronoi::{BoundedVoronoi, VoronoiCell, VoronoiDiagram, VoronoiEdge};
