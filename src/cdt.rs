//! Constrained and conforming Delaunay machinery.
//!
//! [`recover_segments`] forces the input segments to appear as mesh edges,
//! either by cavity retriangulation (constrained mode, no new vertices unless
//! segments cross) or by recursive bisection (conforming mode, where every
//! subsegment ends up a true Delaunay edge). [`carve_holes`] removes the
//! triangles outside the boundary and inside holes with a flood fill that
//! never crosses subsegments, and stamps regional attributes.

use hashbrown::{HashMap, HashSet};

use crate::locator::Location;
use crate::math;
use crate::mesh::entities::VertexKind;
use crate::mesh::handles::{FixedTriangleHandle, FixedVertexHandle, Osub, Otri};
use crate::mesh::insertion::InsertOutcome;
use crate::mesh::Mesh;
use crate::triangulate::RegionAttr;
use crate::{Point2, TriangulateOptions};

/// Forces every segment to appear as a union of subsegment edges.
///
/// Segment endpoints must already be vertices of the mesh. Segments that
/// cross each other are split at their intersection point in both modes.
pub(crate) fn recover_segments(
    mesh: &mut Mesh,
    segments: &[([FixedVertexHandle; 2], i32)],
    conforming: bool,
) {
    for &([a, b], marker) in segments {
        if a == b {
            continue;
        }
        if conforming {
            recover_conforming(mesh, a, b, marker);
        } else {
            recover_constrained(mesh, a, b, marker);
        }
    }
}

/// Puts a subsegment wall on every convex hull edge, so carving cannot eat
/// into the hull and refinement treats it as a boundary.
pub(crate) fn enclose_hull(mesh: &mut Mesh) {
    for handle in mesh.triangles.handles() {
        for orient in 0..3 {
            let edge = Otri::new(handle, orient);
            if edge.sym(mesh).is_ghost() && edge.pivot(mesh).is_none() {
                let org = edge.org(mesh).expect("hull edge of a live triangle");
                let dest = edge.dest(mesh).expect("hull edge of a live triangle");
                let subseg = mesh.make_subseg(org, dest, 1);
                mesh.tsbond(edge, subseg);
                mesh.sdissolve_side(subseg.ssym());
            }
        }
    }
}

// ----- segment recovery -----

/// What lies ahead of a segment origin, looking towards its destination.
enum Scout {
    /// The segment already coincides with this edge cursor (origin to
    /// destination).
    Edge(Otri),
    /// A vertex sits exactly on the segment; this edge cursor leads to it.
    Collinear(Otri),
    /// The segment enters this triangle; the cursor's origin is the segment
    /// origin and the opposite edge is the first one crossed.
    Cross(Otri),
    /// No triangle around the origin is crossed. Happens only for degenerate
    /// input; the segment is left unrecovered.
    Lost,
}

/// How a march through the crossed triangles ended.
enum March {
    /// The far endpoint (or a vertex exactly on the segment) was reached.
    Reached {
        end: FixedVertexHandle,
        cavity: Vec<FixedTriangleHandle>,
        left: Vec<FixedVertexHandle>,
        right: Vec<FixedVertexHandle>,
    },
    /// A subsegment blocks the way; `edge` is the crossed edge carrying it.
    Blocked { edge: Otri },
}

/// Recovers segment `(a, b)` by retriangulating the corridor of triangles it
/// crosses. Crossing subsegments are split at the intersection point first.
fn recover_constrained(
    mesh: &mut Mesh,
    a: FixedVertexHandle,
    b: FixedVertexHandle,
    marker: i32,
) {
    let extensions = [a, b];
    let mut org = a;
    while org != b {
        let start = match scout(mesh, org, b) {
            Scout::Edge(edge) => {
                attach_subseg(mesh, edge, marker, extensions);
                return;
            }
            Scout::Collinear(edge) => {
                attach_subseg(mesh, edge, marker, extensions);
                org = edge.dest(mesh).expect("edge of a live triangle");
                continue;
            }
            Scout::Cross(otri) => otri,
            Scout::Lost => return,
        };
        match march(mesh, start, org, b) {
            March::Reached {
                end,
                cavity,
                left,
                right,
            } => {
                retriangulate_corridor(mesh, org, end, &cavity, &left, &right, marker, extensions);
                org = end;
            }
            March::Blocked { edge } => {
                // The segment crosses another subsegment. Split the standing
                // one at the intersection point; the new vertex lies on our
                // segment, so the next pass walks through it.
                let crossing = edge.pivot(mesh);
                let blocked_org = edge.org(mesh).expect("crossed edge of a live triangle");
                let blocked_dest = edge.dest(mesh).expect("crossed edge of a live triangle");
                let split = math::segment_intersection(
                    mesh.position(org),
                    mesh.position(b),
                    mesh.position(blocked_org),
                    mesh.position(blocked_dest),
                );
                match mesh.split_subsegment(crossing.sub, split) {
                    InsertOutcome::Inserted { .. } | InsertOutcome::Duplicate(_) => {}
                    InsertOutcome::Violating(_) | InsertOutcome::Outside => return,
                }
            }
        }
    }
}

/// Recovers segment `(a, b)` by bisection: insert midpoints until every piece
/// coincides with a Delaunay edge.
fn recover_conforming(mesh: &mut Mesh, a: FixedVertexHandle, b: FixedVertexHandle, marker: i32) {
    let extensions = [a, b];
    let mut pending = vec![(a, b)];
    while let Some((p, q)) = pending.pop() {
        if p == q {
            continue;
        }
        match scout(mesh, p, q) {
            Scout::Edge(edge) => {
                attach_subseg(mesh, edge, marker, extensions);
                continue;
            }
            Scout::Collinear(edge) => {
                attach_subseg(mesh, edge, marker, extensions);
                let mid = edge.dest(mesh).expect("edge of a live triangle");
                pending.push((mid, q));
                continue;
            }
            Scout::Cross(_) => {}
            Scout::Lost => continue,
        }
        let midpoint = mesh.position(p).lerp(mesh.position(q), 0.5);
        match mesh.insert_point(midpoint, marker, VertexKind::SteinerOnSegment, None, false) {
            InsertOutcome::Inserted { vertex, .. } | InsertOutcome::Duplicate(vertex) => {
                if vertex == p || vertex == q {
                    // The piece is too short to bisect in f64. Give up on it
                    // rather than split forever.
                    continue;
                }
                pending.push((vertex, q));
                pending.push((p, vertex));
            }
            InsertOutcome::Violating(_) | InsertOutcome::Outside => {}
        }
    }
}

/// Examines the triangles around `org`, looking towards `dest`.
fn scout(mesh: &Mesh, org: FixedVertexHandle, dest: FixedVertexHandle) -> Scout {
    let from = mesh.position(org);
    let to = mesh.position(dest);
    let star = mesh.vertex_star(org);
    for &cursor in &star {
        if cursor.dest(mesh) == Some(dest) {
            return Scout::Edge(cursor);
        }
    }
    for &cursor in &star {
        let neighbor = cursor.dest(mesh).expect("edge of a live triangle");
        let position = mesh.position(neighbor);
        if math::counterclockwise(from, to, position) == 0.0
            && position.sub(from).dot(to.sub(from)) > 0.0
            && from.distance_2(position) < from.distance_2(to)
        {
            return Scout::Collinear(cursor);
        }
    }
    for &cursor in &star {
        let Some(apex) = cursor.apex(mesh) else {
            continue;
        };
        let neighbor = cursor.dest(mesh).expect("edge of a live triangle");
        // The segment leaves through the far edge iff the destination lies
        // strictly right of it and the apex strictly left.
        if math::counterclockwise(from, to, mesh.position(neighbor)) < 0.0
            && math::counterclockwise(from, to, mesh.position(apex)) > 0.0
        {
            return Scout::Cross(cursor);
        }
    }
    Scout::Lost
}

/// Walks the corridor of triangles crossed by the segment `(org, dest)`,
/// starting from the triangle under `start` (whose origin is `org`). Collects
/// the crossed triangles and the corridor polygon's left and right chains
/// without mutating anything.
fn march(mesh: &Mesh, start: Otri, org: FixedVertexHandle, dest: FixedVertexHandle) -> March {
    let from = mesh.position(org);
    let to = mesh.position(dest);
    let mut cavity = vec![start.tri];
    let mut left = vec![start.apex(mesh).expect("crossed triangle is real")];
    let mut right = vec![start.dest(mesh).expect("crossed triangle is real")];
    // The crossed edge always runs from the right chain to the left chain.
    let mut crossed = start.lnext();
    loop {
        if !crossed.pivot(mesh).is_none() {
            return March::Blocked { edge: crossed };
        }
        let inside = crossed.sym(mesh);
        debug_assert!(!inside.is_ghost(), "segment endpoint lies outside the hull");
        cavity.push(inside.tri);
        let apex = inside.apex(mesh).expect("crossed triangle is real");
        if apex == dest {
            return March::Reached {
                end: dest,
                cavity,
                left,
                right,
            };
        }
        let side = math::counterclockwise(from, to, mesh.position(apex));
        if side == 0.0 {
            return March::Reached {
                end: apex,
                cavity,
                left,
                right,
            };
        }
        if side > 0.0 {
            left.push(apex);
            crossed = inside.lnext();
        } else {
            right.push(apex);
            crossed = inside.lprev();
        }
    }
}

type BoundaryMap = HashMap<(usize, usize), (Otri, Osub)>;

fn edge_key(a: FixedVertexHandle, b: FixedVertexHandle) -> (usize, usize) {
    let (a, b) = (a.index(), b.index());
    (a.min(b), a.max(b))
}

/// Deletes the crossed corridor and retriangulates its two halves so the
/// edge `(org, end)` exists, then pins a subsegment on it.
#[allow(clippy::too_many_arguments)]
fn retriangulate_corridor(
    mesh: &mut Mesh,
    org: FixedVertexHandle,
    end: FixedVertexHandle,
    cavity: &[FixedTriangleHandle],
    left: &[FixedVertexHandle],
    right: &[FixedVertexHandle],
    marker: i32,
    extensions: [FixedVertexHandle; 2],
) {
    let corridor: HashSet<FixedTriangleHandle> = cavity.iter().copied().collect();
    let mut bounds = BoundaryMap::new();
    for &handle in cavity {
        for orient in 0..3 {
            let edge = Otri::new(handle, orient);
            let outside = edge.sym(mesh);
            if outside.is_ghost() || !corridor.contains(&outside.tri) {
                let key = edge_key(
                    edge.org(mesh).expect("corridor triangle is real"),
                    edge.dest(mesh).expect("corridor triangle is real"),
                );
                bounds.insert(key, (outside, edge.pivot(mesh)));
            }
        }
    }
    for &handle in cavity {
        mesh.triangle_dealloc(handle);
    }

    let reversed: Vec<FixedVertexHandle> = right.iter().rev().copied().collect();
    let upper = fill_polygon(mesh, org, end, left, &bounds)
        .expect("corridor has a vertex on its left side");
    let lower = fill_polygon(mesh, end, org, &reversed, &bounds)
        .expect("corridor has a vertex on its right side");
    mesh.bond(upper, lower);

    let subseg = mesh.make_subseg(org, end, marker);
    mesh.subseg_data_mut(subseg.sub).extensions = extensions;
    mesh.tsbond(upper, subseg);
    mesh.tsbond(lower, subseg.ssym());
}

/// Triangulates the polygon left of the base edge `(org, dest)` bounded by
/// `chain`, Delaunay with respect to its own vertices. Returns the cursor
/// covering the base edge, or `None` for an empty chain (the base then is a
/// boundary edge of the old corridor).
fn fill_polygon(
    mesh: &mut Mesh,
    org: FixedVertexHandle,
    dest: FixedVertexHandle,
    chain: &[FixedVertexHandle],
    bounds: &BoundaryMap,
) -> Option<Otri> {
    if chain.is_empty() {
        return None;
    }
    let base_org = mesh.position(org);
    let base_dest = mesh.position(dest);
    let mut best = 0;
    for index in 1..chain.len() {
        if math::in_circle(
            base_org,
            base_dest,
            mesh.position(chain[best]),
            mesh.position(chain[index]),
        ) > 0.0
        {
            best = index;
        }
    }
    let apex = chain[best];

    let slot = mesh.make_triangle();
    let tri = mesh.rewrite_real(slot, org, dest, apex);
    let before = fill_polygon(mesh, org, apex, &chain[..best], bounds);
    let after = fill_polygon(mesh, apex, dest, &chain[best + 1..], bounds);
    link_filled(mesh, tri.lprev(), before, bounds);
    link_filled(mesh, tri.lnext(), after, bounds);
    mesh.set_incident(tri);
    mesh.set_incident(tri.lnext());
    mesh.set_incident(tri.lprev());
    Some(tri)
}

/// Bonds a freshly filled triangle edge to its counterpart: either the base
/// cursor of a recursive fill, or the surviving outside of the old corridor.
fn link_filled(mesh: &mut Mesh, edge: Otri, inner: Option<Otri>, bounds: &BoundaryMap) {
    match inner {
        Some(base) => mesh.bond(edge, base),
        None => {
            let key = edge_key(
                edge.org(mesh).expect("filled triangle is real"),
                edge.dest(mesh).expect("filled triangle is real"),
            );
            let &(outside, subseg) = bounds
                .get(&key)
                .expect("corridor boundary edge was recorded");
            mesh.rebond(edge, outside, subseg);
        }
    }
}

/// Pins a subsegment on an existing edge, or refreshes the marker of one
/// already there. Also used by mesh reconstruction to reattach segments.
pub(crate) fn attach_subseg(
    mesh: &mut Mesh,
    edge: Otri,
    marker: i32,
    extensions: [FixedVertexHandle; 2],
) {
    let existing = edge.pivot(mesh);
    if !existing.is_none() {
        let data = mesh.subseg_data_mut(existing.sub);
        if data.marker == 0 {
            data.marker = marker;
        }
        return;
    }
    let org = edge.org(mesh).expect("edge of a live triangle");
    let dest = edge.dest(mesh).expect("edge of a live triangle");
    let subseg = mesh.make_subseg(org, dest, marker);
    mesh.subseg_data_mut(subseg.sub).extensions = extensions;
    mesh.tsbond(edge, subseg);
    let mirror = edge.sym(mesh);
    if mirror.is_ghost() {
        mesh.sdissolve_side(subseg.ssym());
    } else {
        mesh.tsbond(mirror, subseg.ssym());
    }
}

// ----- hole and region carving -----

/// Removes the triangles outside the subsegment boundary and inside holes,
/// then stamps regional attributes.
///
/// Infection starts from every hull edge not protected by a subsegment and
/// from the triangle containing each hole point, and spreads through edges
/// that carry no subsegment. Infected triangles are deleted; vertices left
/// without any triangle become undead and are dropped at output time.
pub(crate) fn carve_holes(
    mesh: &mut Mesh,
    holes: &[Point2],
    regions: &[RegionAttr],
    options: &TriangulateOptions,
) {
    let mut worklist: Vec<FixedTriangleHandle> = Vec::new();

    for handle in mesh.triangles.handles() {
        for orient in 0..3 {
            let edge = Otri::new(handle, orient);
            if edge.sym(mesh).is_ghost() && edge.pivot(mesh).is_none() {
                infect(mesh, handle, &mut worklist);
                break;
            }
        }
    }
    for &hole in holes {
        match mesh.locate(hole) {
            Location::InTriangle(otri) | Location::OnEdge(otri) | Location::OnVertex(otri) => {
                infect(mesh, otri.tri, &mut worklist);
            }
            Location::Outside(_) => {}
        }
    }

    while let Some(handle) = worklist.pop() {
        for orient in 0..3 {
            let edge = Otri::new(handle, orient);
            if !edge.pivot(mesh).is_none() {
                continue;
            }
            let neighbor = edge.sym(mesh);
            if !neighbor.is_ghost() && !mesh.triangle_data(neighbor.tri).infected {
                infect(mesh, neighbor.tri, &mut worklist);
            }
        }
    }

    // Kill the infected triangles: detach survivors and subsegment walls
    // from them, then free the records.
    let infected: Vec<FixedTriangleHandle> = mesh
        .triangles
        .iter()
        .filter(|(_, data)| data.infected)
        .map(|(handle, _)| handle)
        .collect();
    for &handle in &infected {
        for orient in 0..3 {
            let edge = Otri::new(handle, orient);
            let neighbor = edge.sym(mesh);
            if !neighbor.is_ghost() && !mesh.triangle_data(neighbor.tri).infected {
                mesh.bond_to_ghost(neighbor);
            }
            let subseg = edge.pivot(mesh);
            if !subseg.is_none() {
                mesh.sdissolve_side(subseg);
            }
        }
    }
    for &handle in &infected {
        mesh.triangle_dealloc(handle);
    }
    for handle in mesh.subsegs.handles() {
        let data = mesh.subseg_data(handle);
        if data.triangles[0].is_ghost() && data.triangles[1].is_ghost() {
            mesh.subseg_dealloc(handle);
        }
    }
    reap_orphans(mesh);

    if !regions.is_empty() {
        stamp_regions(mesh, regions, options);
    }
}

fn infect(mesh: &mut Mesh, handle: FixedTriangleHandle, worklist: &mut Vec<FixedTriangleHandle>) {
    let data = mesh.triangle_data_mut(handle);
    if !data.infected {
        data.infected = true;
        worklist.push(handle);
    }
}

/// Repoints vertex incidents at surviving triangles and marks vertices with
/// no triangle left as undead.
fn reap_orphans(mesh: &mut Mesh) {
    for handle in mesh.triangles.handles() {
        for orient in 0..3 {
            mesh.set_incident(Otri::new(handle, orient));
        }
    }
    for index in 0..mesh.vertices.len() {
        let vertex = FixedVertexHandle::new(index);
        let data = mesh.vertex_data(vertex);
        if data.kind == VertexKind::Undead {
            continue;
        }
        let cached = data.incident;
        let alive = !cached.is_ghost()
            && mesh.triangles.is_live(cached.tri)
            && cached.org(mesh) == Some(vertex);
        if !alive {
            mesh.mark_undead(vertex);
        }
    }
}

/// Floods each region seed's attribute and area bound outwards, stopping at
/// subsegment walls.
fn stamp_regions(mesh: &mut Mesh, regions: &[RegionAttr], options: &TriangulateOptions) {
    for region in regions {
        let seed = match mesh.locate(region.point) {
            Location::InTriangle(otri) | Location::OnEdge(otri) | Location::OnVertex(otri) => {
                otri.tri
            }
            Location::Outside(_) => continue,
        };
        let max_area = if options.region_areas {
            region.max_area
        } else {
            None
        };
        let mut visited: HashSet<FixedTriangleHandle> = HashSet::new();
        let mut worklist = vec![seed];
        visited.insert(seed);
        while let Some(handle) = worklist.pop() {
            let data = mesh.triangle_data_mut(handle);
            data.region = region.id;
            if max_area.is_some() {
                data.max_area = max_area;
            }
            for orient in 0..3 {
                let edge = Otri::new(handle, orient);
                if !edge.pivot(mesh).is_none() {
                    continue;
                }
                let neighbor = edge.sym(mesh);
                if !neighbor.is_ghost() && visited.insert(neighbor.tri) {
                    worklist.push(neighbor.tri);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::triangulate::{triangulate, Polygon, RegionAttr};
    use crate::{Point2, TriangulateOptions};

    fn square_with_diagonal() -> Polygon {
        let mut polygon = Polygon::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
            Point2::new(1.0, 2.0),
            Point2::new(3.0, 2.0),
        ]);
        polygon.segments = vec![[0, 1], [1, 2], [2, 3], [3, 0], [4, 5]];
        polygon
    }

    #[test]
    fn forced_edge_appears() {
        let polygon = square_with_diagonal();
        let mesh = triangulate(&polygon, &TriangulateOptions::new()).unwrap();
        // The interior segment (1,2)-(3,2) must be an edge of the result.
        let mut found = false;
        for edge in mesh.edges() {
            let [a, b] = edge.positions();
            let is_forced = (a == Point2::new(1.0, 2.0) && b == Point2::new(3.0, 2.0))
                || (b == Point2::new(1.0, 2.0) && a == Point2::new(3.0, 2.0));
            found |= is_forced;
        }
        assert!(found);
        assert_eq!(mesh.num_subsegments(), 5);
    }

    #[test]
    fn crossing_segments_are_split() {
        let mut polygon = Polygon::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ]);
        // The two diagonals cross at (2, 2).
        polygon.segments = vec![[0, 1], [1, 2], [2, 3], [3, 0], [0, 2], [1, 3]];
        let mesh = triangulate(&polygon, &TriangulateOptions::new()).unwrap();
        assert!(mesh
            .vertices()
            .any(|vertex| vertex.position() == Point2::new(2.0, 2.0)));
        // Four boundary subsegments plus each diagonal split in two.
        assert_eq!(mesh.num_subsegments(), 8);
        assert_eq!(mesh.num_triangles(), 4);
    }

    #[test]
    fn hole_is_carved() {
        let mut polygon = Polygon::from_points(Vec::new());
        polygon.add_contour(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(6.0, 0.0),
                Point2::new(6.0, 6.0),
                Point2::new(0.0, 6.0),
            ],
            1,
        );
        polygon.add_contour(
            &[
                Point2::new(2.0, 2.0),
                Point2::new(4.0, 2.0),
                Point2::new(4.0, 4.0),
                Point2::new(2.0, 4.0),
            ],
            2,
        );
        polygon.holes.push(Point2::new(3.0, 3.0));
        let mesh = triangulate(&polygon, &TriangulateOptions::new()).unwrap();
        assert_eq!(mesh.num_triangles(), 8);
        for face in mesh.triangles() {
            let center = face
                .positions()
                .into_iter()
                .fold(Point2::new(0.0, 0.0), |acc, p| acc.add(p))
                .mul(1.0 / 3.0);
            let inside_hole =
                center.x > 2.0 && center.x < 4.0 && center.y > 2.0 && center.y < 4.0;
            assert!(!inside_hole);
        }
    }

    #[test]
    fn concave_outside_is_removed() {
        // An L-shaped boundary; the convex hull contains triangles outside it
        // which carving must eat from the unprotected hull edges.
        let mut polygon = Polygon::from_points(Vec::new());
        polygon.add_contour(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 2.0),
                Point2::new(2.0, 2.0),
                Point2::new(2.0, 4.0),
                Point2::new(0.0, 4.0),
            ],
            1,
        );
        let mesh = triangulate(&polygon, &TriangulateOptions::new()).unwrap();
        for face in mesh.triangles() {
            let center = face
                .positions()
                .into_iter()
                .fold(Point2::new(0.0, 0.0), |acc, p| acc.add(p))
                .mul(1.0 / 3.0);
            let in_notch = center.x > 2.0 && center.y > 2.0;
            assert!(!in_notch, "triangle outside the boundary survived");
        }
    }

    #[test]
    fn region_attributes_are_stamped() {
        let mut polygon = Polygon::from_points(Vec::new());
        polygon.add_contour(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 2.0),
                Point2::new(0.0, 2.0),
            ],
            1,
        );
        // A wall splitting the rectangle in two.
        let base = polygon.points.len();
        polygon.points.push(Point2::new(2.0, 0.0));
        polygon.points.push(Point2::new(2.0, 2.0));
        polygon.segments.push([base, base + 1]);
        polygon.segment_markers.push(0);
        polygon.regions.push(RegionAttr {
            point: Point2::new(1.0, 1.0),
            id: 7,
            max_area: None,
        });
        let mesh = triangulate(&polygon, &TriangulateOptions::new()).unwrap();
        for face in mesh.triangles() {
            let center = face
                .positions()
                .into_iter()
                .fold(Point2::new(0.0, 0.0), |acc, p| acc.add(p))
                .mul(1.0 / 3.0);
            let expected = if center.x < 2.0 { 7 } else { 0 };
            assert_eq!(face.region(), expected);
        }
    }

    #[test]
    fn conforming_pieces_are_delaunay_edges() {
        let polygon = square_with_diagonal();
        let options = TriangulateOptions::new().conforming_delaunay();
        let mesh = triangulate(&polygon, &options).unwrap();
        // Every subsegment of a conforming mesh is an unconstrained Delaunay
        // edge: no vertex may lie strictly inside the circumcircle of any
        // triangle. Check the empty circle property over all pairs.
        for face in mesh.triangles() {
            let [a, b, c] = face.positions();
            for vertex in mesh.vertices() {
                let p = vertex.position();
                if p == a || p == b || p == c {
                    continue;
                }
                assert!(
                    crate::math::in_circle(a, b, c, p) <= 0.0,
                    "conforming mesh is not globally Delaunay"
                );
            }
        }
    }

    #[test]
    fn conforming_splits_blocked_segment() {
        // The point just above the midline keeps (0,2)-(4,2) out of the
        // Delaunay triangulation; conforming recovery must bisect it.
        let mut polygon = Polygon::from_points(vec![
            Point2::new(0.0, 2.0),
            Point2::new(4.0, 2.0),
            Point2::new(2.0, 2.4),
        ]);
        polygon.add_contour(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
                Point2::new(0.0, 4.0),
            ],
            1,
        );
        polygon.segments.push([0, 1]);
        polygon.segment_markers.push(5);
        let options = TriangulateOptions::new().conforming_delaunay();
        let mesh = triangulate(&polygon, &options).unwrap();
        assert!(mesh
            .vertices()
            .any(|vertex| vertex.position() == Point2::new(2.0, 2.0)));
        assert!(mesh.num_steiner_vertices() >= 1);
        // Both halves carry the segment's marker.
        let marked = mesh
            .subsegments()
            .filter(|subseg| subseg.marker() == 5)
            .count();
        assert_eq!(marked, 2);
    }

    #[test]
    fn enclosed_hull_is_a_closed_ccw_loop() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(5.0, 2.0),
            Point2::new(3.0, 4.0),
            Point2::new(1.0, 3.0),
            Point2::new(2.0, 1.5),
        ];
        let options = TriangulateOptions::new().enclose_convex_hull();
        let mesh = crate::triangulate::triangulate_points(&points, &options).unwrap();

        assert_eq!(mesh.num_subsegments(), mesh.hull_size());
        let mut successor = hashbrown::HashMap::new();
        for subseg in mesh.subsegments() {
            let [org, dest] = subseg.endpoints();
            assert!(successor.insert(org, dest).is_none());
        }

        let start = *successor.keys().next().unwrap();
        let mut loop_points = Vec::new();
        let mut current = start;
        loop {
            loop_points.push(mesh.position(current));
            current = successor[&current];
            if current == start {
                break;
            }
            assert!(loop_points.len() <= successor.len());
        }
        assert_eq!(loop_points.len(), mesh.hull_size());

        let mut doubled_area = 0.0;
        for (index, a) in loop_points.iter().enumerate() {
            let b = loop_points[(index + 1) % loop_points.len()];
            doubled_area += a.x * b.y - b.x * a.y;
        }
        assert!(doubled_area > 0.0);
    }
}
