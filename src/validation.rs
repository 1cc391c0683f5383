//! Mesh consistency checking.
//!
//! [`validate`] walks the whole mesh and reports every violated structural
//! invariant as a [`Diagnostic`] instead of panicking, so it can run against
//! a mesh in any state, including one a bug has already damaged. Intended for
//! tests and debugging; nothing in the engine depends on it.

use crate::math;
use crate::mesh::entities::VertexKind;
use crate::mesh::handles::{
    FixedSubsegHandle, FixedTriangleHandle, FixedVertexHandle, Otri,
};
use crate::mesh::Mesh;

/// A single violated invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// A triangle's corners are clockwise or collinear.
    NonPositiveArea {
        /// The offending triangle.
        triangle: FixedTriangleHandle,
    },
    /// A neighbor bond is one-sided: the neighbor does not point back, or
    /// disagrees about the shared edge's endpoints.
    AsymmetricBond {
        /// The triangle whose bond is broken.
        triangle: FixedTriangleHandle,
        /// The edge carrying the broken bond.
        orient: u8,
    },
    /// A subsegment and the triangle edge it is bonded to disagree about
    /// their endpoints, or the bond is one-sided.
    SubsegMismatch {
        /// The offending subsegment.
        subseg: FixedSubsegHandle,
    },
    /// An unconstrained interior edge violates the empty circle property.
    NonDelaunayPair {
        /// The triangle on one side of the edge.
        triangle: FixedTriangleHandle,
        /// The offending edge.
        orient: u8,
    },
    /// A live vertex's cached incident triangle does not contain it.
    BadIncident {
        /// The offending vertex.
        vertex: FixedVertexHandle,
    },
}

/// Checks every structural invariant of `mesh`. An empty result means the
/// mesh is consistent.
pub fn validate(mesh: &Mesh) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_triangles(mesh, &mut diagnostics);
    check_subsegments(mesh, &mut diagnostics);
    check_incidents(mesh, &mut diagnostics);
    diagnostics
}

fn check_triangles(mesh: &Mesh, diagnostics: &mut Vec<Diagnostic>) {
    for (handle, data) in mesh.triangles.iter() {
        if data.is_ring_ghost() {
            continue;
        }
        let corners = data.corners.map(|corner| {
            mesh.position(corner.expect("non-ghost triangle has real corners"))
        });
        if math::counterclockwise(corners[0], corners[1], corners[2]) <= 0.0 {
            diagnostics.push(Diagnostic::NonPositiveArea { triangle: handle });
        }

        for orient in 0..3u8 {
            let edge = Otri::new(handle, orient);
            let mirror = edge.sym(mesh);
            if mirror.is_ghost() {
                continue;
            }
            if !mesh.triangles.is_live(mirror.tri) {
                diagnostics.push(Diagnostic::AsymmetricBond {
                    triangle: handle,
                    orient,
                });
                continue;
            }
            let back = mirror.sym(mesh);
            let symmetric = back.same_edge(edge)
                && mirror.org(mesh) == edge.dest(mesh)
                && mirror.dest(mesh) == edge.org(mesh);
            if !symmetric {
                diagnostics.push(Diagnostic::AsymmetricBond {
                    triangle: handle,
                    orient,
                });
                continue;
            }

            // The empty circle property, once per interior edge. Constrained
            // edges are exempt.
            if handle.index() < mirror.tri.index() && edge.pivot(mesh).is_none() {
                if let Some(apex) = mirror.apex(mesh) {
                    let [a, b, c] = data.corners.map(|corner| {
                        mesh.position(corner.expect("non-ghost triangle has real corners"))
                    });
                    if math::in_circle(a, b, c, mesh.position(apex)) > 0.0 {
                        diagnostics.push(Diagnostic::NonDelaunayPair {
                            triangle: handle,
                            orient,
                        });
                    }
                }
            }
        }
    }
}

fn check_subsegments(mesh: &Mesh, diagnostics: &mut Vec<Diagnostic>) {
    for (handle, data) in mesh.subsegs.iter() {
        let mut bonded_sides = 0;
        let mut broken = false;
        for orient in 0..2usize {
            let side = data.triangles[orient];
            if side.is_ghost() {
                continue;
            }
            bonded_sides += 1;
            if !mesh.triangles.is_live(side.tri) {
                broken = true;
                continue;
            }
            // The subsegment side and the triangle edge must run in the
            // same direction, and the edge must point back at us.
            let expected_org = Some(data.endpoints[orient]);
            let expected_dest = Some(data.endpoints[1 - orient]);
            let pivot = side.pivot(mesh);
            if side.org(mesh) != expected_org
                || side.dest(mesh) != expected_dest
                || pivot.sub != handle
                || pivot.orient as usize != orient
            {
                broken = true;
            }
        }
        if broken || bonded_sides == 0 {
            diagnostics.push(Diagnostic::SubsegMismatch { subseg: handle });
        }
    }
}

fn check_incidents(mesh: &Mesh, diagnostics: &mut Vec<Diagnostic>) {
    for (index, data) in mesh.vertices.iter().enumerate() {
        if data.kind == VertexKind::Undead {
            continue;
        }
        let vertex = FixedVertexHandle::new(index);
        let incident = data.incident;
        let good = !incident.is_ghost()
            && mesh.triangles.is_live(incident.tri)
            && !mesh.triangle_data(incident.tri).is_ring_ghost()
            && incident.org(mesh) == Some(vertex);
        if !good {
            diagnostics.push(Diagnostic::BadIncident { vertex });
        }
    }
}

#[cfg(test)]
mod test {
    use super::validate;
    use crate::triangulate::{triangulate, triangulate_points, Polygon};
    use crate::{Point2, TriangulateOptions};

    fn scattered(count: usize) -> Vec<Point2> {
        (0..count)
            .map(|i| {
                let x = (i as f64 * 0.618_033_988_7).fract() * 7.0;
                let y = (i as f64 * 0.414_213_562_4).fract() * 7.0;
                Point2::new(x, y)
            })
            .collect()
    }

    #[test]
    fn delaunay_meshes_are_consistent() {
        for algorithm in [
            crate::Algorithm::Incremental,
            crate::Algorithm::DivideAndConquer,
            crate::Algorithm::Sweepline,
        ] {
            let options = TriangulateOptions::new().with_algorithm(algorithm);
            let mesh = triangulate_points(&scattered(80), &options).unwrap();
            assert_eq!(validate(&mesh), Vec::new(), "{algorithm:?}");
        }
    }

    #[test]
    fn refined_pslg_is_consistent() {
        let mut polygon = Polygon::from_points(Vec::new());
        polygon.add_contour(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(5.0, 0.0),
                Point2::new(5.0, 5.0),
                Point2::new(0.0, 5.0),
            ],
            1,
        );
        polygon.add_contour(
            &[
                Point2::new(2.0, 2.0),
                Point2::new(3.0, 2.0),
                Point2::new(3.0, 3.0),
                Point2::new(2.0, 3.0),
            ],
            2,
        );
        polygon.holes.push(Point2::new(2.5, 2.5));
        let options = TriangulateOptions::new().with_min_angle(22.0).with_max_area(0.4);
        let mesh = triangulate(&polygon, &options).unwrap();
        assert_eq!(validate(&mesh), Vec::new());
    }
}
