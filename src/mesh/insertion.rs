//! Bowyer–Watson cavity insertion.
//!
//! A new vertex is inserted by digging the cavity of all triangles whose
//! circumcircle contains it (never crossing subsegments), deleting them and
//! fanning new triangles from the vertex to the cavity boundary. Points that
//! land on a subsegment or hull edge split that edge and fill the two half
//! cavities with open fans instead.

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::locator::Location;
use crate::math;
use crate::Point2;

use super::entities::VertexKind;
use super::handles::{FixedSubsegHandle, FixedTriangleHandle, FixedVertexHandle, Osub, Otri};
use super::Mesh;

/// Result of a cavity insertion.
#[derive(Debug)]
pub(crate) enum InsertOutcome {
    /// The vertex is part of the mesh; the cursor's origin is the new vertex.
    Inserted {
        vertex: FixedVertexHandle,
        otri: Otri,
    },
    /// The position coincides with an existing vertex; nothing was mutated.
    Duplicate(FixedVertexHandle),
    /// Inserting would have encroached upon these subsegments; nothing was
    /// mutated. Only reported when rejection was requested.
    Violating(SmallVec<[FixedSubsegHandle; 4]>),
    /// The position lies outside the triangulation; nothing was mutated.
    Outside,
}

struct Rim {
    org: FixedVertexHandle,
    dest: FixedVertexHandle,
    outside: Otri,
    subseg: Osub,
}

struct Cavity {
    triangles: Vec<FixedTriangleHandle>,
    rims: Vec<Rim>,
    boundary_subsegs: SmallVec<[FixedSubsegHandle; 4]>,
}

impl Mesh {
    /// Inserts a point into the triangulation.
    ///
    /// With `reject_encroached` set, the insertion is abandoned without any
    /// mutation if the new point would lie inside the diametral circle of a
    /// subsegment on its cavity boundary; refinement then splits those
    /// subsegments first.
    pub(crate) fn insert_point(
        &mut self,
        position: Point2,
        marker: i32,
        kind: VertexKind,
        hint: Option<Otri>,
        reject_encroached: bool,
    ) -> InsertOutcome {
        let location = self.locate_hinted(position, hint);
        self.insert_located(location, position, marker, kind, None, reject_encroached)
    }

    /// Inserts a vertex whose record already exists, e.g. because input
    /// vertices are created in input order but inserted in shuffled order.
    pub(crate) fn insert_vertex(
        &mut self,
        vertex: FixedVertexHandle,
        hint: Option<Otri>,
    ) -> InsertOutcome {
        let data = self.vertex_data(vertex);
        let (position, marker, kind) = (data.position, data.marker, data.kind);
        let location = self.locate_hinted(position, hint);
        self.insert_located(location, position, marker, kind, Some(vertex), false)
    }

    pub(crate) fn locate_hinted(&mut self, position: Point2, hint: Option<Otri>) -> Location {
        match hint {
            Some(start)
                if start.tri.index() != 0
                    && self.triangles.is_live(start.tri)
                    && !self.triangle_data(start.tri).is_ring_ghost() =>
            {
                self.walk(start, position)
            }
            _ => self.locate(position),
        }
    }

    pub(crate) fn insert_located(
        &mut self,
        location: Location,
        position: Point2,
        marker: i32,
        kind: VertexKind,
        existing: Option<FixedVertexHandle>,
        reject_encroached: bool,
    ) -> InsertOutcome {
        match location {
            Location::OnVertex(otri) => {
                InsertOutcome::Duplicate(otri.org(self).expect("cursor sits on a live triangle"))
            }
            Location::Outside(_) => InsertOutcome::Outside,
            Location::InTriangle(otri) => {
                self.insert_interior(position, marker, kind, existing, &[otri], reject_encroached)
            }
            Location::OnEdge(otri) => {
                let subseg = otri.pivot(self);
                let mirror = otri.sym(self);
                if !subseg.is_none() || mirror.is_ghost() {
                    self.insert_splitting_edge(position, marker, kind, existing, otri)
                } else {
                    self.insert_interior(
                        position,
                        marker,
                        kind,
                        existing,
                        &[otri, mirror],
                        reject_encroached,
                    )
                }
            }
        }
    }

    /// Splits the subsegment under `subseg` at `position`.
    ///
    /// Used by refinement; `position` must lie on the open segment.
    pub(crate) fn split_subsegment(
        &mut self,
        subseg: FixedSubsegHandle,
        position: Point2,
    ) -> InsertOutcome {
        let cursor = Osub::new(subseg, 0);
        let side = cursor.tri_pivot(self);
        let edge = if side.is_ghost() {
            cursor.ssym().tri_pivot(self)
        } else {
            side
        };
        debug_assert!(!edge.is_ghost(), "subsegment bonded to outer space on both sides");
        let marker = self.subseg_data(subseg).marker;
        self.insert_splitting_edge(position, marker, VertexKind::SteinerOnSegment, None, edge)
    }

    // ----- interior insertion (closed fan) -----

    fn insert_interior(
        &mut self,
        position: Point2,
        marker: i32,
        kind: VertexKind,
        existing: Option<FixedVertexHandle>,
        seeds: &[Otri],
        reject_encroached: bool,
    ) -> InsertOutcome {
        let cavity = self.dig_cavity(position, seeds);

        if reject_encroached {
            let mut violated: SmallVec<[FixedSubsegHandle; 4]> = SmallVec::new();
            for &subseg in &cavity.boundary_subsegs {
                let [a, b] = self.subseg_data(subseg).endpoints;
                if math::in_diametral_circle(self.position(a), self.position(b), position) {
                    violated.push(subseg);
                }
            }
            if !violated.is_empty() {
                return InsertOutcome::Violating(violated);
            }
        }

        let vertex = match existing {
            Some(vertex) => vertex,
            None => self.create_vertex(position, marker, kind),
        };
        for handle in &cavity.triangles {
            self.triangle_dealloc(*handle);
        }

        let mut by_org: HashMap<FixedVertexHandle, Otri> =
            HashMap::with_capacity(cavity.rims.len());
        for rim in &cavity.rims {
            let fan = self.make_triangle();
            self.set_org(fan, Some(rim.org));
            self.set_dest(fan, Some(rim.dest));
            self.set_apex(fan, Some(vertex));
            self.rebond(fan, rim.outside, rim.subseg);
            self.set_incident(fan);
            by_org.insert(rim.org, fan);
        }
        // Link the fan triangles to each other around the new vertex: the
        // rim edge following (org, dest) starts at dest.
        for rim in &cavity.rims {
            let fan = by_org[&rim.org];
            let next = by_org[&rim.dest];
            self.bond(fan.lnext(), next.lprev());
        }

        let result = by_org[&cavity.rims[0].org].lprev();
        self.set_incident(result);
        InsertOutcome::Inserted {
            vertex,
            otri: result,
        }
    }

    fn dig_cavity(&self, position: Point2, seeds: &[Otri]) -> Cavity {
        let mut in_cavity: HashSet<FixedTriangleHandle> = HashSet::new();
        let mut stack: SmallVec<[FixedTriangleHandle; 16]> = SmallVec::new();
        for seed in seeds {
            if in_cavity.insert(seed.tri) {
                stack.push(seed.tri);
            }
        }

        let mut triangles = Vec::new();
        let mut rims = Vec::new();
        let mut boundary_subsegs = SmallVec::new();

        while let Some(handle) = stack.pop() {
            triangles.push(handle);
            for orient in 0..3u8 {
                let edge = Otri::new(handle, orient);
                let subseg = edge.pivot(self);
                let neighbor = edge.sym(self);

                let grows = if !subseg.is_none() {
                    if !boundary_subsegs.contains(&subseg.sub) {
                        boundary_subsegs.push(subseg.sub);
                    }
                    false
                } else if neighbor.is_ghost() {
                    false
                } else if in_cavity.contains(&neighbor.tri) {
                    continue;
                } else {
                    let corners = self.triangle_data(neighbor.tri).corners;
                    let a = self.position(corners[0].expect("real corner"));
                    let b = self.position(corners[1].expect("real corner"));
                    let c = self.position(corners[2].expect("real corner"));
                    math::in_circle(a, b, c, position) > 0.0
                };

                if grows {
                    in_cavity.insert(neighbor.tri);
                    stack.push(neighbor.tri);
                } else {
                    rims.push(Rim {
                        org: edge.org(self).expect("real corner"),
                        dest: edge.dest(self).expect("real corner"),
                        outside: neighbor,
                        subseg,
                    });
                }
            }
        }

        Cavity {
            triangles,
            rims,
            boundary_subsegs,
        }
    }

    // ----- edge splitting insertion (open fans) -----

    /// Inserts `position`, which lies on the interior of the edge under
    /// `edge`, splitting the edge's subsegment (if any) into two halves.
    fn insert_splitting_edge(
        &mut self,
        position: Point2,
        marker: i32,
        kind: VertexKind,
        existing: Option<FixedVertexHandle>,
        edge: Otri,
    ) -> InsertOutcome {
        let a = edge.org(self).expect("real corner");
        let b = edge.dest(self).expect("real corner");
        // Near the f64 precision limit a split position can collapse onto an
        // endpoint; report the coincidence instead of making a zero length
        // subsegment.
        if existing.is_none() {
            if position == self.position(a) {
                return InsertOutcome::Duplicate(a);
            }
            if position == self.position(b) {
                return InsertOutcome::Duplicate(b);
            }
        }
        let subseg = edge.pivot(self);
        let mirror = edge.sym(self);

        let kind = if !subseg.is_none() && kind == VertexKind::Free {
            VertexKind::SteinerOnSegment
        } else {
            kind
        };
        let marker = if marker == 0 && !subseg.is_none() {
            self.subseg_data(subseg.sub).marker
        } else {
            marker
        };
        let vertex = match existing {
            Some(vertex) => {
                let data = self.vertex_data_mut(vertex);
                if data.marker == 0 {
                    data.marker = marker;
                }
                vertex
            }
            None => self.create_vertex(position, marker, kind),
        };

        // Split the subsegment record: the original becomes the half from
        // `a` to the new vertex, normalized to orientation 0; the second
        // half inherits marker and original segment extensions.
        let halves = if !subseg.is_none() {
            let ext_org = subseg.seg_org(self);
            let ext_dest = subseg.seg_dest(self);
            let seg_marker = self.subseg_data(subseg.sub).marker;
            {
                let data = self.subseg_data_mut(subseg.sub);
                data.endpoints = [a, vertex];
                data.extensions = [ext_org, ext_dest];
            }
            let second = self.make_subseg(vertex, b, seg_marker);
            self.subseg_data_mut(second.sub).extensions = [ext_org, ext_dest];
            Some((Osub::new(subseg.sub, 0), second))
        } else {
            None
        };

        // Two half cavities, one per side of the split edge.
        let first_side = self.fill_open_fan(position, vertex, edge, a, b);
        let second_side = if mirror.is_ghost() {
            None
        } else {
            Some(self.fill_open_fan(position, vertex, mirror, b, a))
        };

        // Stitch the fans (or outer space) together across the two new
        // half edges a -> vertex and vertex -> b, and bond the subsegment
        // halves onto them.
        let (end_a0, end_b0) = first_side;
        match second_side {
            Some((end_b1, end_a1)) => {
                self.bond(end_a0, end_a1);
                self.bond(end_b0, end_b1);
            }
            None => {
                self.bond_to_ghost(end_a0);
                self.bond_to_ghost(end_b0);
            }
        }
        if let Some((first_half, second_half)) = halves {
            self.tsbond(end_a0, first_half);
            self.tsbond(end_b0, second_half);
            match second_side {
                Some((end_b1, end_a1)) => {
                    self.tsbond(end_a1, first_half.ssym());
                    self.tsbond(end_b1, second_half.ssym());
                }
                None => {
                    self.sdissolve_side(first_half.ssym());
                    self.sdissolve_side(second_half.ssym());
                }
            }
        }

        self.set_incident(end_a0);
        let result = end_b0;
        self.set_incident(result);
        InsertOutcome::Inserted {
            vertex,
            otri: result,
        }
    }

    /// Fills one side of a split edge with an open fan around `vertex`.
    ///
    /// `seed` is the side's triangle, whose directed edge runs from `from` to
    /// `to` along the split edge. Returns the two open end cursors: the fan
    /// edge running `from -> vertex` and the fan edge running
    /// `vertex -> to`.
    fn fill_open_fan(
        &mut self,
        position: Point2,
        vertex: FixedVertexHandle,
        seed: Otri,
        from: FixedVertexHandle,
        to: FixedVertexHandle,
    ) -> (Otri, Otri) {
        let cavity = self.dig_cavity(position, &[seed]);
        for handle in &cavity.triangles {
            self.triangle_dealloc(*handle);
        }

        let mut by_org: HashMap<FixedVertexHandle, Otri> =
            HashMap::with_capacity(cavity.rims.len());
        for rim in &cavity.rims {
            // The split edge itself gets no fan triangle; the new vertex
            // lies on it.
            if rim.org == from && rim.dest == to {
                continue;
            }
            let fan = self.make_triangle();
            self.set_org(fan, Some(rim.org));
            self.set_dest(fan, Some(rim.dest));
            self.set_apex(fan, Some(vertex));
            self.rebond(fan, rim.outside, rim.subseg);
            self.set_incident(fan);
            by_org.insert(rim.org, fan);
        }
        for rim in &cavity.rims {
            if rim.org == from && rim.dest == to {
                continue;
            }
            if let Some(next) = by_org.get(&rim.dest) {
                let fan = by_org[&rim.org];
                self.bond(fan.lnext(), next.lprev());
            }
        }

        // Open ends: the fan triangle ending at `from` contributes the edge
        // from -> vertex, the one starting at `to` contributes vertex -> to.
        let end_from = by_org
            .values()
            .find(|fan| fan.dest(self) == Some(from))
            .expect("open fan ends at the split edge")
            .lnext();
        let end_to = by_org[&to].lprev();
        (end_from, end_to)
    }
}

#[cfg(test)]
mod test {
    use super::InsertOutcome;
    use crate::triangulate::{triangulate, Polygon};
    use crate::{Point2, TriangulateOptions};

    #[test]
    fn splitting_at_an_endpoint_reports_the_coincidence() {
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
        let mut mesh = triangulate(&polygon, &TriangulateOptions::new()).unwrap();

        let (subseg, endpoints) = {
            let view = mesh.subsegments().next().unwrap();
            (view.handle(), view.endpoints())
        };
        let position = mesh.position(endpoints[0]);
        match mesh.split_subsegment(subseg, position) {
            InsertOutcome::Duplicate(vertex) => assert_eq!(vertex, endpoints[0]),
            other => panic!("expected a coincidence report, got {:?}", other),
        }
        // Nothing was inserted or split.
        assert_eq!(mesh.num_subsegments(), 4);
        assert_eq!(mesh.num_triangles(), 2);
    }
}
