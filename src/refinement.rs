//! Quality refinement in the style of Ruppert's algorithm.
//!
//! Two worklists drive the process: encroached subsegments (a vertex inside
//! the diametral circle) are split at a shell-aligned point, and bad
//! triangles (too skinny, too obtuse or too large) receive a Steiner point at
//! their off-center. A Steiner point that would itself encroach upon a
//! subsegment is withheld and the subsegment split first. The loop is bounded
//! by a Steiner budget; running out of budget is reported as an incomplete
//! result, never an error.

use std::collections::VecDeque;

use crate::cdt;
use crate::math;
use crate::mesh::entities::VertexKind;
use crate::mesh::handles::{FixedSubsegHandle, FixedTriangleHandle, FixedVertexHandle, Otri};
use crate::mesh::insertion::InsertOutcome;
use crate::mesh::Mesh;
use crate::locator::Location;
use crate::{Point2, TriangulateOptions};

/// Outcome of a refinement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinementResult {
    /// `false` if the Steiner budget ran out before every quality bound held.
    pub complete: bool,
    /// Number of Steiner vertices this run inserted.
    pub steiner_points: usize,
}

/// Without an explicit budget, refinement may insert at most this many
/// Steiner vertices per existing vertex.
const DEFAULT_BUDGET_FACTOR: usize = 10;

/// A triangle queued for a Steiner point, remembered by its corners so a
/// recycled record is recognized as stale.
struct BadTriangle {
    handle: FixedTriangleHandle,
    corners: [FixedVertexHandle; 3],
}

/// Quality bounds in the form the per-triangle test consumes.
struct Bounds {
    /// Squared cosine of the minimum angle bound, if an angle bound is set.
    min_cos2: Option<f64>,
    /// Cosine of the maximum angle bound.
    max_cos: Option<f64>,
    /// Radius to shortest edge ratio fed to the off-center computation.
    radius_edge: Option<f64>,
}

impl Bounds {
    fn from_options(options: &TriangulateOptions) -> Self {
        let min_cos2 = (options.min_angle > 0.0).then(|| {
            let cos = options.min_angle.to_radians().cos();
            cos * cos
        });
        let radius_edge = (options.min_angle > 0.0)
            .then(|| 0.5 / options.min_angle.to_radians().sin());
        let max_cos = options.max_angle.map(|degrees| degrees.to_radians().cos());
        Bounds {
            min_cos2,
            max_cos,
            radius_edge,
        }
    }
}

impl Mesh {
    /// Refines the mesh until every triangle satisfies the quality bounds in
    /// `options`, or the Steiner budget runs out.
    ///
    /// The mesh stays a valid constrained Delaunay triangulation either way;
    /// an incomplete run simply leaves some bad triangles behind.
    pub fn refine(&mut self, options: &TriangulateOptions) -> RefinementResult {
        // A bad triangle whose Steiner point escapes the domain is repaired
        // by splitting the boundary edge it escaped through, so every
        // boundary edge must carry a subsegment. Carved meshes already do;
        // wall any bare boundary edges of plain point sets here.
        if options.quality {
            cdt::enclose_hull(self);
        }

        let bounds = Bounds::from_options(options);
        let budget = options
            .steiner_budget
            .unwrap_or(DEFAULT_BUDGET_FACTOR * self.num_vertices().max(1));

        let mut encroached: VecDeque<FixedSubsegHandle> = VecDeque::new();
        let mut bad: VecDeque<BadTriangle> = VecDeque::new();

        for handle in self.subsegs.handles() {
            if self.subseg_encroached(handle) {
                encroached.push_back(handle);
            }
        }
        for handle in self.triangles.handles() {
            self.queue_if_bad(handle, options, &bounds, &mut bad);
        }

        let mut inserted = 0usize;
        let complete = loop {
            if inserted >= budget && (!encroached.is_empty() || !bad.is_empty()) {
                break false;
            }
            if let Some(subseg) = encroached.pop_front() {
                if self.subsegs.is_live(subseg) {
                    self.split_encroached(subseg, options, &bounds, &mut inserted, &mut encroached, &mut bad);
                }
                continue;
            }
            let Some(candidate) = bad.pop_front() else {
                break true;
            };
            if !self.bad_triangle_is_current(&candidate) {
                continue;
            }
            self.split_triangle(candidate, options, &bounds, &mut inserted, &mut encroached, &mut bad);
        };

        RefinementResult {
            complete,
            steiner_points: inserted,
        }
    }

    // ----- queue admission -----

    fn bad_triangle_is_current(&self, candidate: &BadTriangle) -> bool {
        self.triangles.is_live(candidate.handle)
            && self.triangle_data(candidate.handle).corners
                == candidate.corners.map(Some)
    }

    fn queue_if_bad(
        &self,
        handle: FixedTriangleHandle,
        options: &TriangulateOptions,
        bounds: &Bounds,
        bad: &mut VecDeque<BadTriangle>,
    ) {
        let corners = self.triangle_data(handle).corners;
        let corners = [
            corners[0].expect("live triangle has real corners"),
            corners[1].expect("live triangle has real corners"),
            corners[2].expect("live triangle has real corners"),
        ];
        if self.triangle_is_bad(handle, corners, options, bounds) {
            bad.push_back(BadTriangle { handle, corners });
        }
    }

    fn triangle_is_bad(
        &self,
        handle: FixedTriangleHandle,
        corners: [FixedVertexHandle; 3],
        options: &TriangulateOptions,
        bounds: &Bounds,
    ) -> bool {
        let positions = corners.map(|corner| self.position(corner));
        let [a, b, c] = positions;
        let area = math::triangle_area(a, b, c);

        if let Some(max_area) = options.max_area {
            if area > max_area {
                return true;
            }
        }
        if let Some(max_area) = self.triangle_data(handle).max_area {
            if area > max_area {
                return true;
            }
        }
        if let Some(test) = &options.user_test {
            if test(positions, area) {
                return true;
            }
        }
        if let Some(min_cos2) = bounds.min_cos2 {
            let (cos2, _) = math::min_angle_info(a, b, c);
            // A smaller minimum angle means a larger cosine.
            if cos2 > min_cos2 {
                return true;
            }
        }
        if let Some(max_cos) = bounds.max_cos {
            if largest_angle_cos(a, b, c) < max_cos {
                return true;
            }
        }
        false
    }

    /// Returns `true` if a vertex lies strictly inside the subsegment's
    /// diametral circle. Checking the two apexes suffices: in a constrained
    /// Delaunay triangulation any encroaching vertex implies an encroaching
    /// apex.
    fn subseg_encroached(&self, handle: FixedSubsegHandle) -> bool {
        let data = self.subseg_data(handle);
        let a = self.position(data.endpoints[0]);
        let b = self.position(data.endpoints[1]);
        for side in data.triangles {
            if side.is_ghost() {
                continue;
            }
            if let Some(apex) = side.apex(self) {
                if math::in_diametral_circle(a, b, self.position(apex)) {
                    return true;
                }
            }
        }
        false
    }

    // ----- splitting -----

    #[allow(clippy::too_many_arguments)]
    fn split_encroached(
        &mut self,
        subseg: FixedSubsegHandle,
        options: &TriangulateOptions,
        bounds: &Bounds,
        inserted: &mut usize,
        encroached: &mut VecDeque<FixedSubsegHandle>,
        bad: &mut VecDeque<BadTriangle>,
    ) {
        let data = self.subseg_data(subseg);
        let [org, dest] = data.endpoints;
        let extensions = data.extensions;
        let a = self.position(org);
        let b = self.position(dest);

        // Split at the midpoint, except when exactly one endpoint is an
        // original segment endpoint: then a power-of-two fraction measured
        // from that endpoint keeps successive splits on concentric shells,
        // which stops two segments meeting at a small angle from encroaching
        // upon each other forever.
        let org_is_end = org == extensions[0] || org == extensions[1];
        let dest_is_end = dest == extensions[0] || dest == extensions[1];
        let t = if org_is_end == dest_is_end {
            0.5
        } else {
            let length = a.distance(b);
            let mut shell = 1.0;
            while length > 3.0 * shell {
                shell *= 2.0;
            }
            while length < 1.5 * shell {
                shell *= 0.5;
            }
            if org_is_end {
                shell / length
            } else {
                1.0 - shell / length
            }
        };
        let point = a.lerp(b, t);

        match self.split_subsegment(subseg, point) {
            InsertOutcome::Inserted { vertex, .. } => {
                *inserted += 1;
                self.scan_neighborhood(vertex, options, bounds, encroached, bad);
            }
            // The subsegment is too short to split at f64 precision.
            InsertOutcome::Duplicate(_) => {}
            InsertOutcome::Violating(_) | InsertOutcome::Outside => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn split_triangle(
        &mut self,
        candidate: BadTriangle,
        options: &TriangulateOptions,
        bounds: &Bounds,
        inserted: &mut usize,
        encroached: &mut VecDeque<FixedSubsegHandle>,
        bad: &mut VecDeque<BadTriangle>,
    ) {
        let point = self.steiner_position(&candidate, bounds);
        let hint = Otri::new(candidate.handle, 0);

        let location = self.locate_hinted(point, Some(hint));
        if let Location::Outside(edge) = location {
            // The off-center fell outside the domain. The boundary edge it
            // escaped through is encroached by it; split that instead.
            if !edge.is_ghost() {
                let wall = edge.pivot(self);
                if !wall.is_none() {
                    encroached.push_back(wall.sub);
                    bad.push_back(candidate);
                }
            }
            return;
        }
        match self.insert_located(location, point, 0, VertexKind::Free, None, true) {
            InsertOutcome::Inserted { vertex, .. } => {
                *inserted += 1;
                self.scan_neighborhood(vertex, options, bounds, encroached, bad);
            }
            InsertOutcome::Violating(subsegs) => {
                // Ruppert's rule: withhold the Steiner point and split the
                // subsegments it would encroach upon, then revisit.
                for subseg in subsegs {
                    encroached.push_back(subseg);
                }
                bad.push_back(candidate);
            }
            InsertOutcome::Duplicate(_) | InsertOutcome::Outside => {}
        }
    }

    /// Where to put the Steiner point for a bad triangle: the off-center
    /// relative to its shortest edge when an angle bound drives the split,
    /// the plain circumcenter otherwise.
    fn steiner_position(&self, candidate: &BadTriangle, bounds: &Bounds) -> Point2 {
        let [a, b, c] = candidate.corners.map(|corner| self.position(corner));
        let Some(radius_edge) = bounds.radius_edge else {
            return math::circumcenter(a, b, c).position;
        };
        let ab = a.distance_2(b);
        let bc = b.distance_2(c);
        let ca = c.distance_2(a);
        let (u, v, w) = if ab <= bc && ab <= ca {
            (a, b, c)
        } else if bc <= ca {
            (b, c, a)
        } else {
            (c, a, b)
        };
        math::off_center(u, v, w, radius_edge)
    }

    /// After an insertion, requeues whatever the new vertex made bad: the
    /// triangles of its fan and any adjoining subsegment it now encroaches
    /// upon.
    fn scan_neighborhood(
        &mut self,
        vertex: FixedVertexHandle,
        options: &TriangulateOptions,
        bounds: &Bounds,
        encroached: &mut VecDeque<FixedSubsegHandle>,
        bad: &mut VecDeque<BadTriangle>,
    ) {
        for cursor in self.vertex_star(vertex) {
            self.queue_if_bad(cursor.tri, options, bounds, bad);
            for edge in [cursor, cursor.lnext()] {
                let subseg = edge.pivot(self);
                if !subseg.is_none() && self.subseg_encroached(subseg.sub) {
                    encroached.push_back(subseg.sub);
                }
            }
        }
    }
}

/// Cosine of the triangle's largest angle, which sits opposite its longest
/// edge.
fn largest_angle_cos(a: Point2, b: Point2, c: Point2) -> f64 {
    let ab = a.distance_2(b);
    let bc = b.distance_2(c);
    let ca = c.distance_2(a);
    let (opposite, adj1, adj2) = if ab >= bc && ab >= ca {
        (ab, bc, ca)
    } else if bc >= ca {
        (bc, ca, ab)
    } else {
        (ca, ab, bc)
    };
    (adj1 + adj2 - opposite) / (2.0 * (adj1 * adj2).sqrt())
}

/// Runs refinement as the last stage of the triangulation pipeline, keeping
/// the outcome on the mesh for the caller to inspect.
pub(crate) fn refine(mesh: &mut Mesh, options: &TriangulateOptions) -> RefinementResult {
    let result = mesh.refine(options);
    mesh.refinement = Some(result);
    result
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::math;
    use crate::triangulate::{triangulate, triangulate_points, Polygon};
    use crate::{Point2, TriangulateOptions};

    fn unit_square() -> Polygon {
        let mut polygon = Polygon::from_points(Vec::new());
        polygon.add_contour(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
            1,
        );
        polygon
    }

    fn min_angle_degrees(mesh: &crate::mesh::Mesh) -> f64 {
        let mut worst = 180.0f64;
        for face in mesh.triangles() {
            let [a, b, c] = face.positions();
            let (cos2, _) = math::min_angle_info(a, b, c);
            let angle = cos2.sqrt().min(1.0).acos().to_degrees();
            worst = worst.min(angle);
        }
        worst
    }

    #[test]
    fn min_angle_bound_is_met() {
        let options = TriangulateOptions::new().with_min_angle(25.0);
        let mesh = triangulate(&unit_square(), &options).unwrap();
        assert!(min_angle_degrees(&mesh) >= 25.0 - 1.0e-9);
        // No subsegment may stay encroached.
        for subseg in mesh.subsegments() {
            let [a, b] = subseg.positions();
            for vertex in mesh.vertices() {
                let p = vertex.position();
                if p == a || p == b {
                    continue;
                }
                assert!(!math::in_diametral_circle(a, b, p));
            }
        }
    }

    #[test]
    fn bare_point_set_meets_the_angle_bound() {
        // A point just above the bottom edge of a square makes sliver
        // triangles whose Steiner points fall below the hull. Repairing them
        // requires splitting the boundary edge they escape through, which
        // only works if the hull gets walled with subsegments before
        // refinement.
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
            Point2::new(5.0, 0.1),
        ];
        let options = TriangulateOptions::new()
            .with_min_angle(28.0)
            .with_steiner_budget(1000);
        let mesh = triangulate_points(&points, &options).unwrap();
        assert!(min_angle_degrees(&mesh) >= 28.0 - 1.0e-9);
        let result = mesh.refinement_result().unwrap();
        assert!(result.complete);
        assert!(result.steiner_points > 0);
    }

    #[test]
    fn max_area_bound_is_met() {
        let options = TriangulateOptions::new().with_max_area(0.05);
        let mesh = triangulate(&unit_square(), &options).unwrap();
        assert!(mesh.num_triangles() >= 20);
        for face in mesh.triangles() {
            assert!(face.area() <= 0.05 + 1.0e-12);
        }
    }

    #[test]
    fn budget_reports_incomplete() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        // An unsatisfiable test together with a tiny budget must stop with
        // `complete == false` instead of looping.
        let always_bad = Arc::new(|_: [Point2; 3], _: f64| true);
        let options = TriangulateOptions::new()
            .with_user_test(always_bad)
            .with_steiner_budget(8);
        let mut mesh = triangulate_points(&points, &options).unwrap();
        let result = mesh.refine(&options);
        assert!(!result.complete);
        assert!(result.steiner_points <= 8);
    }

    #[test]
    fn refinement_without_bounds_is_identity() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 2.0),
        ];
        let mut mesh = triangulate_points(&points, &TriangulateOptions::new()).unwrap();
        let result = mesh.refine(&TriangulateOptions::new());
        assert!(result.complete);
        assert_eq!(result.steiner_points, 0);
        assert_eq!(mesh.num_triangles(), 1);
    }

    #[test]
    fn steiner_points_stay_inside_the_hole() {
        let mut polygon = Polygon::from_points(Vec::new());
        polygon.add_contour(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(8.0, 0.0),
                Point2::new(8.0, 8.0),
                Point2::new(0.0, 8.0),
            ],
            1,
        );
        polygon.add_contour(
            &[
                Point2::new(3.0, 3.0),
                Point2::new(5.0, 3.0),
                Point2::new(5.0, 5.0),
                Point2::new(3.0, 5.0),
            ],
            2,
        );
        polygon.holes.push(Point2::new(4.0, 4.0));
        let options = TriangulateOptions::new().with_min_angle(20.0).with_max_area(0.5);
        let mesh = triangulate(&polygon, &options).unwrap();
        for vertex in mesh.vertices() {
            let p = vertex.position();
            let strictly_inside_hole = p.x > 3.0 && p.x < 5.0 && p.y > 3.0 && p.y < 5.0;
            assert!(!strictly_inside_hole, "Steiner point leaked into the hole");
        }
        for face in mesh.triangles() {
            assert!(face.area() <= 0.5 + 1.0e-12);
        }
    }
}
