//! Point location: random triangle sampling followed by an oriented edge walk.

use rand::Rng;

use crate::math;
use crate::mesh::handles::{FixedTriangleHandle, FixedVertexHandle, Otri};
use crate::mesh::Mesh;
use crate::Point2;

/// Result of locating a point within a mesh, exposed to external callers.
///
/// The crate-internal algorithms work with the cursor-based [Location]
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    /// The query point coincides with a mesh vertex.
    OnVertex(FixedVertexHandle),
    /// The query point lies on the interior of a triangle edge.
    OnEdge {
        /// A triangle containing the edge.
        triangle: FixedTriangleHandle,
        /// The edge's endpoints.
        endpoints: [FixedVertexHandle; 2],
    },
    /// The query point lies strictly inside a triangle.
    InTriangle(FixedTriangleHandle),
    /// The query point lies outside the triangulation.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Location {
    /// The cursor's origin is the coincident vertex.
    OnVertex(Otri),
    /// The point lies on the interior of the cursor's edge.
    OnEdge(Otri),
    /// The point lies strictly inside the cursor's triangle.
    InTriangle(Otri),
    /// The point lies beyond the cursor's edge, which borders outer space.
    Outside(Otri),
}

/// Sampling state for point location.
///
/// Location starts from the best of a handful of randomly sampled triangles
/// (or the most recently located one) and walks from there. The sample count
/// follows the cube root of the live triangle count and is refreshed whenever
/// that count has changed materially.
#[derive(Debug, Clone)]
pub(crate) struct Locator {
    recent: Otri,
    sample_size: usize,
    triangles_at_refresh: usize,
}

impl Locator {
    pub fn new() -> Self {
        Locator {
            recent: Otri::GHOST,
            sample_size: 1,
            triangles_at_refresh: 0,
        }
    }

    fn refresh(&mut self, live_triangles: usize) {
        let delta = live_triangles.abs_diff(self.triangles_at_refresh);
        if delta * 4 > self.triangles_at_refresh.max(16) {
            self.sample_size = (live_triangles as f64).cbrt().ceil().max(1.0) as usize;
            self.triangles_at_refresh = live_triangles;
        }
    }
}

impl Mesh {
    /// Locates `point`, updating the locator's sampling state.
    pub(crate) fn locate(&mut self, point: Point2) -> Location {
        let start = self.choose_start(point);
        if start.is_ghost() {
            return Location::Outside(Otri::GHOST);
        }
        let location = self.walk(start, point);
        let recent = match location {
            Location::OnVertex(otri)
            | Location::OnEdge(otri)
            | Location::InTriangle(otri)
            | Location::Outside(otri) => otri,
        };
        if !recent.is_ghost() {
            self.locator.recent = recent;
        }
        location
    }

    /// Locates `point` and translates the result for external callers.
    pub fn locate_point(&mut self, point: Point2) -> PointLocation {
        match self.locate(point) {
            Location::OnVertex(otri) => {
                PointLocation::OnVertex(otri.org(self).expect("cursor sits on a live triangle"))
            }
            Location::OnEdge(otri) => PointLocation::OnEdge {
                triangle: otri.tri,
                endpoints: [
                    otri.org(self).expect("cursor sits on a live triangle"),
                    otri.dest(self).expect("cursor sits on a live triangle"),
                ],
            },
            Location::InTriangle(otri) => PointLocation::InTriangle(otri.tri),
            Location::Outside(_) => PointLocation::Outside,
        }
    }

    fn choose_start(&mut self, point: Point2) -> Otri {
        self.locator.refresh(self.triangles.len());

        let mut best = Otri::GHOST;
        let mut best_distance = f64::INFINITY;

        let recent = self.locator.recent;
        if !recent.is_ghost() && self.triangles.is_live(recent.tri) {
            if let Some(org) = recent.org(self) {
                best = recent;
                best_distance = self.position(org).distance_2(point);
            }
        }

        let upper = self.triangles.slot_upper_bound();
        if upper <= 1 {
            return best;
        }
        for _ in 0..self.locator.sample_size {
            let index = self.rng.gen_range(1..upper);
            let Some((handle, data)) = self.triangles.get_at_index(index) else {
                continue;
            };
            if data.is_ring_ghost() {
                continue;
            }
            let otri = Otri::new(handle, 0);
            let org = data.corners[1].expect("non-ghost triangle has real corners");
            let distance = self.position(org).distance_2(point);
            if distance < best_distance {
                best = otri;
                best_distance = distance;
            }
        }

        if best.is_ghost() {
            // Sampling found nothing (tiny or heavily recycled pool): fall
            // back to the first live triangle.
            for (handle, data) in self.triangles.iter() {
                if !data.is_ring_ghost() {
                    return Otri::new(handle, 0);
                }
            }
        }
        best
    }

    /// Walks from `start` towards `point` using orientation tests.
    ///
    /// `start` must be a live, non-ring triangle. The walk is a visibility
    /// walk: it terminates on Delaunay meshes; a step budget guards against
    /// cycles on constrained meshes, falling back to an exhaustive scan.
    pub(crate) fn walk(&self, start: Otri, point: Point2) -> Location {
        let mut otri = start;
        let position =
            |vertex: Option<FixedVertexHandle>| self.position(vertex.expect("real corner"));

        // Establish the invariant that `point` is left of or on org -> dest.
        let mut o0 = math::counterclockwise(
            position(otri.org(self)),
            position(otri.dest(self)),
            point,
        );
        if o0 < 0.0 {
            let mirror = otri.sym(self);
            if mirror.is_ghost() {
                return Location::Outside(otri);
            }
            otri = mirror;
            o0 = -o0;
        }

        let mut budget = 3 * self.triangles.slot_upper_bound() + 16;
        loop {
            if budget == 0 {
                return self.exhaustive_locate(point);
            }
            budget -= 1;

            let org = position(otri.org(self));
            let dest = position(otri.dest(self));
            let apex = position(otri.apex(self));

            let o1 = math::counterclockwise(dest, apex, point);
            let o2 = math::counterclockwise(apex, org, point);

            let cross_edge = if o1 < 0.0 && o2 < 0.0 {
                // Either direction makes progress; Triangle's tie breaking
                // heuristic picks based on the walk direction.
                if apex.sub(point).dot(dest.sub(org)) > 0.0 {
                    otri.lnext()
                } else {
                    otri.lprev()
                }
            } else if o1 < 0.0 {
                otri.lnext()
            } else if o2 < 0.0 {
                otri.lprev()
            } else {
                // Contained; classify against the exact zero results.
                return if o0 == 0.0 && o1 == 0.0 {
                    Location::OnVertex(otri.lnext())
                } else if o0 == 0.0 && o2 == 0.0 {
                    Location::OnVertex(otri)
                } else if o1 == 0.0 && o2 == 0.0 {
                    Location::OnVertex(otri.lprev())
                } else if o0 == 0.0 {
                    Location::OnEdge(otri)
                } else if o1 == 0.0 {
                    Location::OnEdge(otri.lnext())
                } else if o2 == 0.0 {
                    Location::OnEdge(otri.lprev())
                } else {
                    Location::InTriangle(otri)
                };
            };

            let crossed = if cross_edge.same_edge(otri.lnext()) {
                o1
            } else {
                o2
            };
            let next = cross_edge.sym(self);
            if next.is_ghost() {
                return Location::Outside(cross_edge);
            }
            otri = next;
            o0 = -crossed;
        }
    }

    fn exhaustive_locate(&self, point: Point2) -> Location {
        let mut hull_edge = Otri::GHOST;
        for (handle, data) in self.triangles.iter() {
            if data.is_ring_ghost() {
                continue;
            }
            let otri = Otri::new(handle, 0);
            let org = self.position(otri.org(self).expect("real corner"));
            let dest = self.position(otri.dest(self).expect("real corner"));
            let apex = self.position(otri.apex(self).expect("real corner"));

            let o0 = math::counterclockwise(org, dest, point);
            let o1 = math::counterclockwise(dest, apex, point);
            let o2 = math::counterclockwise(apex, org, point);
            if o0 >= 0.0 && o1 >= 0.0 && o2 >= 0.0 {
                return if o0 == 0.0 && o1 == 0.0 {
                    Location::OnVertex(otri.lnext())
                } else if o0 == 0.0 && o2 == 0.0 {
                    Location::OnVertex(otri)
                } else if o1 == 0.0 && o2 == 0.0 {
                    Location::OnVertex(otri.lprev())
                } else if o0 == 0.0 {
                    Location::OnEdge(otri)
                } else if o1 == 0.0 {
                    Location::OnEdge(otri.lnext())
                } else if o2 == 0.0 {
                    Location::OnEdge(otri.lprev())
                } else {
                    Location::InTriangle(otri)
                };
            }
            if hull_edge.is_ghost() {
                for orient in 0..3u8 {
                    let edge = Otri::new(handle, orient);
                    if edge.sym(self).is_ghost() {
                        hull_edge = edge;
                    }
                }
            }
        }
        Location::Outside(hull_edge)
    }
}

#[cfg(test)]
mod test {
    use super::PointLocation;
    use crate::triangulate::triangulate_points;
    use crate::{Point2, TriangulateOptions};

    #[test]
    fn queries_are_classified() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let mut mesh = triangulate_points(&points, &TriangulateOptions::new()).unwrap();

        match mesh.locate_point(Point2::new(0.0, 0.0)) {
            PointLocation::OnVertex(vertex) => {
                assert_eq!(mesh.position(vertex), Point2::new(0.0, 0.0));
            }
            other => panic!("expected a vertex hit, got {:?}", other),
        }
        match mesh.locate_point(Point2::new(0.5, 0.0)) {
            PointLocation::OnEdge { endpoints, .. } => {
                let mut ends = [mesh.position(endpoints[0]), mesh.position(endpoints[1])];
                ends.sort_by(|a, b| a.partial_cmp(b).unwrap());
                assert_eq!(ends, [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
            }
            other => panic!("expected an edge hit, got {:?}", other),
        }
        assert!(matches!(
            mesh.locate_point(Point2::new(0.25, 0.1)),
            PointLocation::InTriangle(_)
        ));
        assert_eq!(
            mesh.locate_point(Point2::new(2.0, 2.0)),
            PointLocation::Outside
        );
    }
}
