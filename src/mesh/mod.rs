//! The mesh aggregate: entity storage, sentinels and topological mutators.
//!
//! A [Mesh] owns the vertex collection, the triangle and subsegment pools and
//! the per-mesh ghost entities. All topological algorithms above this layer
//! (triangulators, constraint recovery, refinement) are expressed through the
//! oriented cursor primitives of [handles] plus the mutators defined here.

pub(crate) mod entities;
pub(crate) mod handles;
pub(crate) mod insertion;
pub(crate) mod pool;

use hashbrown::HashSet;
use rand::{rngs::SmallRng, SeedableRng};

use crate::locator::Locator;
use crate::math;
use crate::refinement::RefinementResult;
use crate::{BoundingBox, Point2};

use entities::{SubsegData, TriangleData, VertexData, VertexKind};
use handles::{FixedSubsegHandle, FixedTriangleHandle, FixedVertexHandle, Osub, Otri};
use pool::Pool;

/// A two dimensional triangle mesh.
///
/// Produced by the triangulation entry points (see [crate::triangulate]) or by
/// [Mesh::reconstruct]. External consumers access it exclusively through the
/// read-only views ([Mesh::vertices], [Mesh::triangles], [Mesh::subsegments],
/// [Mesh::edges]); topology is mutated only by the engine itself.
pub struct Mesh {
    pub(crate) vertices: Vec<VertexData>,
    pub(crate) triangles: Pool<TriangleData, FixedTriangleHandle>,
    pub(crate) subsegs: Pool<SubsegData, FixedSubsegHandle>,

    pub(crate) undead_count: usize,
    pub(crate) steiner_count: usize,
    pub(crate) refinement: Option<RefinementResult>,

    pub(crate) locator: Locator,
    pub(crate) rng: SmallRng,
}

impl Mesh {
    /// Creates an empty mesh with freshly allocated sentinel entities.
    pub(crate) fn with_seed(seed: u64) -> Self {
        Mesh {
            vertices: Vec::new(),
            triangles: Pool::with_sentinel(TriangleData::blank()),
            subsegs: Pool::with_sentinel(SubsegData {
                endpoints: [FixedVertexHandle(u32::MAX); 2],
                extensions: [FixedVertexHandle(u32::MAX); 2],
                marker: 0,
                triangles: [Otri::GHOST; 2],
            }),
            undead_count: 0,
            steiner_count: 0,
            refinement: None,
            locator: Locator::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    // ----- raw data access (used by the cursor primitives) -----

    pub(crate) fn triangle_data(&self, handle: FixedTriangleHandle) -> &TriangleData {
        self.triangles.get(handle)
    }

    pub(crate) fn triangle_data_mut(&mut self, handle: FixedTriangleHandle) -> &mut TriangleData {
        self.triangles.get_mut(handle)
    }

    pub(crate) fn subseg_data(&self, handle: FixedSubsegHandle) -> &SubsegData {
        self.subsegs.get(handle)
    }

    pub(crate) fn subseg_data_mut(&mut self, handle: FixedSubsegHandle) -> &mut SubsegData {
        self.subsegs.get_mut(handle)
    }

    pub(crate) fn vertex_data(&self, handle: FixedVertexHandle) -> &VertexData {
        &self.vertices[handle.index()]
    }

    pub(crate) fn vertex_data_mut(&mut self, handle: FixedVertexHandle) -> &mut VertexData {
        &mut self.vertices[handle.index()]
    }

    /// The position of a vertex.
    pub fn position(&self, handle: FixedVertexHandle) -> Point2 {
        self.vertex_data(handle).position
    }

    pub(crate) fn create_vertex(
        &mut self,
        position: Point2,
        marker: i32,
        kind: VertexKind,
    ) -> FixedVertexHandle {
        let handle = FixedVertexHandle::new(self.vertices.len());
        self.vertices.push(VertexData::new(position, marker, kind));
        if matches!(kind, VertexKind::Free | VertexKind::SteinerOnSegment) {
            self.steiner_count += 1;
        }
        handle
    }

    pub(crate) fn mark_undead(&mut self, handle: FixedVertexHandle) {
        let data = self.vertex_data_mut(handle);
        if data.kind != VertexKind::Undead {
            data.kind = VertexKind::Undead;
            self.undead_count += 1;
        }
    }

    // ----- entity creation and recycling -----

    pub(crate) fn make_triangle(&mut self) -> Otri {
        let handle = self.triangles.insert(TriangleData::blank());
        Otri::new(handle, 0)
    }

    pub(crate) fn triangle_dealloc(&mut self, handle: FixedTriangleHandle) {
        self.triangles.remove(handle);
    }

    pub(crate) fn make_subseg(
        &mut self,
        org: FixedVertexHandle,
        dest: FixedVertexHandle,
        marker: i32,
    ) -> Osub {
        let handle = self.subsegs.insert(SubsegData::new(org, dest, marker));
        Osub::new(handle, 0)
    }

    pub(crate) fn subseg_dealloc(&mut self, handle: FixedSubsegHandle) {
        self.subsegs.remove(handle);
    }

    // ----- topological mutators -----

    /// Links two triangle edges as neighbors of each other.
    pub(crate) fn bond(&mut self, a: Otri, b: Otri) {
        debug_assert!(!a.is_ghost() && !b.is_ghost());
        self.triangle_data_mut(a.tri).neighbors[a.orient as usize] = b;
        self.triangle_data_mut(b.tri).neighbors[b.orient as usize] = a;
    }

    /// Makes `a` a boundary edge: its neighbor becomes the ghost triangle,
    /// whose re-entry cursor is pointed back at `a`.
    pub(crate) fn bond_to_ghost(&mut self, a: Otri) {
        debug_assert!(!a.is_ghost());
        self.triangle_data_mut(a.tri).neighbors[a.orient as usize] = Otri::GHOST;
        self.triangles.get_mut(FixedTriangleHandle::GHOST).neighbors[0] = a;
    }

    /// Attaches a subsegment to a triangle edge (and vice versa). The cursor
    /// directions must match: `t` and `s` run from the same origin to the
    /// same destination.
    pub(crate) fn tsbond(&mut self, t: Otri, s: Osub) {
        debug_assert!(!t.is_ghost() && !s.is_none());
        self.triangle_data_mut(t.tri).subsegs[t.orient as usize] = s;
        self.subseg_data_mut(s.sub).triangles[s.orient as usize] = t;
    }

    /// Detaches the triangle side of a subsegment bond, leaving the
    /// subsegment bonded to outer space on that side.
    pub(crate) fn sdissolve_side(&mut self, s: Osub) {
        self.subseg_data_mut(s.sub).triangles[s.orient as usize] = Otri::GHOST;
    }

    pub(crate) fn set_org(&mut self, t: Otri, v: Option<FixedVertexHandle>) {
        let slot = handles::PLUS_1_MOD_3[t.orient as usize] as usize;
        self.triangle_data_mut(t.tri).corners[slot] = v;
    }

    pub(crate) fn set_dest(&mut self, t: Otri, v: Option<FixedVertexHandle>) {
        let slot = handles::MINUS_1_MOD_3[t.orient as usize] as usize;
        self.triangle_data_mut(t.tri).corners[slot] = v;
    }

    pub(crate) fn set_apex(&mut self, t: Otri, v: Option<FixedVertexHandle>) {
        self.triangle_data_mut(t.tri).corners[t.orient as usize] = v;
    }

    /// Records `t` as the triangle used to re-enter the mesh from its origin
    /// vertex.
    pub(crate) fn set_incident(&mut self, t: Otri) {
        if let Some(org) = t.org(self) {
            self.vertex_data_mut(org).incident = t;
        }
    }

    /// An edge cursor whose origin is `v`, re-entering the mesh through the
    /// vertex's incident triangle. Falls back to a mesh scan if the cached
    /// cursor went stale.
    pub(crate) fn vertex_otri(&self, v: FixedVertexHandle) -> Option<Otri> {
        let cached = self.vertex_data(v).incident;
        if !cached.is_ghost()
            && self.triangles.is_live(cached.tri)
            && !self.triangle_data(cached.tri).is_ring_ghost()
            && cached.org(self) == Some(v)
        {
            return Some(cached);
        }
        for (handle, data) in self.triangles.iter() {
            if data.is_ring_ghost() {
                continue;
            }
            for orient in 0..3u8 {
                let otri = Otri::new(handle, orient);
                if data.corners[handles::PLUS_1_MOD_3[orient as usize] as usize] == Some(v) {
                    return Some(otri);
                }
            }
        }
        None
    }

    /// All edge cursors whose origin is `v`, in rotational order.
    ///
    /// For a hull vertex, the fan is collected from both sides of the cached
    /// cursor so that no wedge is missed.
    pub(crate) fn vertex_star(&self, v: FixedVertexHandle) -> Vec<Otri> {
        let Some(start) = self.vertex_otri(v) else {
            return Vec::new();
        };
        let mut star = vec![start];
        let mut cursor = start.onext(self);
        while !cursor.is_ghost() && cursor != start {
            star.push(cursor);
            cursor = cursor.onext(self);
        }
        if cursor.is_ghost() {
            let mut cursor = start.oprev(self);
            while !cursor.is_ghost() {
                star.push(cursor);
                cursor = cursor.oprev(self);
            }
        }
        star
    }

    /// Flips the edge under `t`.
    ///
    /// `t` and its neighbor must both be live non-ring triangles and the edge
    /// must not be a subsegment. The returned cursor's edge runs between the
    /// two apexes, with the old origin on its apex slot.
    pub(crate) fn flip(&mut self, t: Otri) -> Otri {
        let u = t.org(self);
        let v = t.dest(self);
        let w = t.apex(self);
        let mirror = t.sym(self);
        debug_assert!(!mirror.is_ghost(), "cannot flip a boundary edge");
        debug_assert!(t.pivot(self).is_none(), "cannot flip a subsegment");
        let z = mirror.apex(self);

        // Outer edges of the quadrilateral u, z, v, w together with their
        // neighbors and subsegments.
        let edge_vw = t.lnext();
        let edge_wu = t.lprev();
        let edge_uz = mirror.lnext();
        let edge_zv = mirror.lprev();

        let n_vw = edge_vw.sym(self);
        let n_wu = edge_wu.sym(self);
        let n_uz = edge_uz.sym(self);
        let n_zv = edge_zv.sym(self);

        let s_vw = edge_vw.pivot(self);
        let s_wu = edge_wu.pivot(self);
        let s_uz = edge_uz.pivot(self);
        let s_zv = edge_zv.pivot(self);

        // Reuse both records: t becomes (u, z, w), mirror becomes (z, v, w),
        // sharing the new diagonal z -> w.
        self.set_org(t, u);
        self.set_dest(t, z);
        self.set_apex(t, w);
        self.set_org(mirror, z);
        self.set_dest(mirror, v);
        self.set_apex(mirror, w);

        // t edges: orient (u->z) external, lnext (z->w) diagonal, lprev (w->u).
        // mirror edges: orient (z->v) external, lnext (v->w), lprev (w->z).
        self.rebond(t, n_uz, s_uz);
        self.rebond(t.lprev(), n_wu, s_wu);
        self.rebond(mirror, n_zv, s_zv);
        self.rebond(mirror.lnext(), n_vw, s_vw);
        self.bond(t.lnext(), mirror.lprev());
        self.triangle_data_mut(t.tri).subsegs[t.lnext().orient as usize] = Osub::NONE;
        self.triangle_data_mut(mirror.tri).subsegs[mirror.lprev().orient as usize] = Osub::NONE;

        self.set_incident(t);
        self.set_incident(t.lprev());
        self.set_incident(mirror);
        self.set_incident(mirror.lnext());

        t.lnext()
    }

    /// Bonds `edge` to `neighbor` (or to outer space) and reattaches `subseg`.
    pub(crate) fn rebond(&mut self, edge: Otri, neighbor: Otri, subseg: Osub) {
        if neighbor.is_ghost() {
            self.bond_to_ghost(edge);
        } else {
            self.bond(edge, neighbor);
        }
        if subseg.is_none() {
            self.triangle_data_mut(edge.tri).subsegs[edge.orient as usize] = Osub::NONE;
        } else {
            self.tsbond(edge, subseg);
        }
    }

    // ----- counts and extents -----

    /// Number of vertices that are part of the mesh, excluding undead ones.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() - self.undead_count
    }

    /// Number of Steiner points the engine added.
    pub fn num_steiner_vertices(&self) -> usize {
        self.steiner_count
    }

    /// The outcome of the refinement pass, if one ran.
    pub fn refinement_result(&self) -> Option<RefinementResult> {
        self.refinement
    }

    /// Number of live triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of subsegments.
    pub fn num_subsegments(&self) -> usize {
        self.subsegs.len()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        (3 * self.num_triangles() + self.hull_size()) / 2
    }

    /// Number of edges on the mesh boundary.
    pub fn hull_size(&self) -> usize {
        self.triangles
            .iter()
            .map(|(_, data)| {
                data.neighbors
                    .iter()
                    .filter(|neighbor| neighbor.is_ghost())
                    .count()
            })
            .sum()
    }

    /// The bounding box of all live input and Steiner vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for data in &self.vertices {
            if data.kind != VertexKind::Undead {
                bounds.add_point(data.position);
            }
        }
        bounds
    }

    // ----- read-only views -----

    /// Iterates over all live vertices.
    pub fn vertices(&self) -> impl Iterator<Item = VertexView<'_>> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, data)| data.kind != VertexKind::Undead)
            .map(|(index, data)| VertexView {
                handle: FixedVertexHandle::new(index),
                data,
            })
    }

    /// Iterates over all live triangles.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleView<'_>> {
        self.triangles
            .iter()
            .filter(|(_, data)| !data.is_ring_ghost())
            .map(move |(handle, _)| TriangleView { mesh: self, handle })
    }

    /// Iterates over all subsegments.
    pub fn subsegments(&self) -> impl Iterator<Item = SubsegView<'_>> {
        self.subsegs
            .iter()
            .map(move |(handle, _)| SubsegView { mesh: self, handle })
    }

    /// Iterates over all undirected edges.
    ///
    /// Each edge is reported exactly once, as the view of one of its two
    /// triangle sides.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        let mut seen = HashSet::new();
        let mut result = Vec::with_capacity(self.num_edges());
        for (handle, data) in self.triangles.iter() {
            if data.is_ring_ghost() {
                continue;
            }
            for orient in 0..3u8 {
                let otri = Otri::new(handle, orient);
                let from = otri.org(self).expect("live triangle has real corners");
                let to = otri.dest(self).expect("live triangle has real corners");
                let key = if from < to { (from, to) } else { (to, from) };
                if seen.insert(key) {
                    result.push(EdgeView {
                        mesh: self,
                        otri,
                    });
                }
            }
        }
        result.into_iter()
    }

    /// The view of a single triangle, if the handle is still live.
    pub fn triangle(&self, handle: FixedTriangleHandle) -> Option<TriangleView<'_>> {
        let data = self.triangles.try_get(handle)?;
        if handle.is_ghost() || data.is_ring_ghost() {
            None
        } else {
            Some(TriangleView { mesh: self, handle })
        }
    }

    /// The view of a single vertex.
    pub fn vertex(&self, handle: FixedVertexHandle) -> Option<VertexView<'_>> {
        let data = self.vertices.get(handle.index())?;
        if data.kind == VertexKind::Undead {
            None
        } else {
            Some(VertexView { handle, data })
        }
    }

    /// A snapshot of the mesh's gross counts, consumed by reporting tools.
    pub fn statistics(&self) -> MeshStatistics {
        MeshStatistics {
            vertices: self.num_vertices(),
            steiner_vertices: self.steiner_count,
            triangles: self.num_triangles(),
            subsegments: self.num_subsegments(),
            edges: self.num_edges(),
            hull_size: self.hull_size(),
            bounds: self.bounding_box(),
        }
    }

    // ----- renumbering -----

    /// Assigns dense, 0-based output ids to vertices and triangles.
    ///
    /// Required before building any indexed output, since entity indices may
    /// have gaps after deletions. Undead vertices never receive an id; with
    /// `jettison` enabled, vertices that are not a corner of any live
    /// triangle are skipped as well.
    pub fn renumber(&mut self, jettison: bool) {
        let mut used = vec![!jettison; self.vertices.len()];
        if jettison {
            for (_, data) in self.triangles.iter() {
                for corner in data.corners.iter().flatten() {
                    used[corner.index()] = true;
                }
            }
        }

        let mut next_id = 0u32;
        for (index, data) in self.vertices.iter_mut().enumerate() {
            if data.kind != VertexKind::Undead && used[index] {
                data.renumbered = next_id;
                next_id += 1;
            } else {
                data.renumbered = u32::MAX;
            }
        }

        let mut next_id = 0u32;
        let handles = self.triangles.handles();
        for handle in handles {
            let data = self.triangles.get_mut(handle);
            if !data.is_ring_ghost() {
                data.renumbered = next_id;
                next_id += 1;
            }
        }
    }

    /// The dense id assigned to a vertex by the latest [Mesh::renumber] call.
    pub fn vertex_id(&self, handle: FixedVertexHandle) -> Option<usize> {
        let id = self.vertex_data(handle).renumbered;
        (id != u32::MAX).then_some(id as usize)
    }

    /// The dense id assigned to a triangle by the latest [Mesh::renumber] call.
    pub fn triangle_id(&self, handle: FixedTriangleHandle) -> Option<usize> {
        let id = self.triangles.try_get(handle)?.renumbered;
        (id != u32::MAX).then_some(id as usize)
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("vertices", &self.num_vertices())
            .field("triangles", &self.num_triangles())
            .field("subsegments", &self.num_subsegments())
            .finish()
    }
}

/// Gross mesh counts, see [Mesh::statistics].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStatistics {
    /// Live vertices, including Steiner points.
    pub vertices: usize,
    /// Steiner points among the vertices.
    pub steiner_vertices: usize,
    /// Live triangles.
    pub triangles: usize,
    /// Subsegments.
    pub subsegments: usize,
    /// Undirected edges.
    pub edges: usize,
    /// Edges on the mesh boundary.
    pub hull_size: usize,
    /// Bounding box of all live vertices.
    pub bounds: BoundingBox,
}

/// Read-only view of a vertex.
#[derive(Clone, Copy)]
pub struct VertexView<'a> {
    handle: FixedVertexHandle,
    data: &'a VertexData,
}

impl VertexView<'_> {
    /// The vertex's handle.
    pub fn handle(&self) -> FixedVertexHandle {
        self.handle
    }

    /// The vertex's position.
    pub fn position(&self) -> Point2 {
        self.data.position
    }

    /// The vertex's boundary marker.
    pub fn marker(&self) -> i32 {
        self.data.marker
    }

    /// How the vertex entered the mesh.
    pub fn kind(&self) -> VertexKind {
        self.data.kind
    }
}

impl std::fmt::Debug for VertexView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexView")
            .field("handle", &self.handle)
            .field("position", &self.data.position)
            .finish()
    }
}

/// Read-only view of a triangle.
#[derive(Clone, Copy)]
pub struct TriangleView<'a> {
    mesh: &'a Mesh,
    handle: FixedTriangleHandle,
}

impl TriangleView<'_> {
    /// The triangle's handle.
    pub fn handle(&self) -> FixedTriangleHandle {
        self.handle
    }

    /// The corner vertices in counterclockwise order.
    pub fn corners(&self) -> [FixedVertexHandle; 3] {
        let corners = self.mesh.triangle_data(self.handle).corners;
        [
            corners[0].expect("live triangle has real corners"),
            corners[1].expect("live triangle has real corners"),
            corners[2].expect("live triangle has real corners"),
        ]
    }

    /// The corner positions in counterclockwise order.
    pub fn positions(&self) -> [Point2; 3] {
        self.corners().map(|corner| self.mesh.position(corner))
    }

    /// The neighbor triangle across each edge, `None` at the mesh boundary.
    ///
    /// Neighbor `i` adjoins the edge opposite corner `i`.
    pub fn neighbors(&self) -> [Option<FixedTriangleHandle>; 3] {
        self.mesh.triangle_data(self.handle).neighbors.map(|neighbor| {
            if neighbor.is_ghost() {
                None
            } else {
                Some(neighbor.tri)
            }
        })
    }

    /// The subsegment adjoining each edge, `None` for unconstrained edges.
    pub fn subsegments(&self) -> [Option<FixedSubsegHandle>; 3] {
        self.mesh.triangle_data(self.handle).subsegs.map(|subseg| {
            if subseg.is_none() {
                None
            } else {
                Some(subseg.sub)
            }
        })
    }

    /// The region id assigned by region carving, 0 by default.
    pub fn region(&self) -> i32 {
        self.mesh.triangle_data(self.handle).region
    }

    /// The triangle's area constraint, if any.
    pub fn max_area(&self) -> Option<f64> {
        self.mesh.triangle_data(self.handle).max_area
    }

    /// The triangle's area.
    pub fn area(&self) -> f64 {
        let [a, b, c] = self.positions();
        math::triangle_area(a, b, c)
    }
}

impl std::fmt::Debug for TriangleView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriangleView")
            .field("handle", &self.handle)
            .field("corners", &self.corners())
            .finish()
    }
}

/// Read-only view of a subsegment.
#[derive(Clone, Copy)]
pub struct SubsegView<'a> {
    mesh: &'a Mesh,
    handle: FixedSubsegHandle,
}

impl SubsegView<'_> {
    /// The subsegment's handle.
    pub fn handle(&self) -> FixedSubsegHandle {
        self.handle
    }

    /// The two endpoint vertices.
    pub fn endpoints(&self) -> [FixedVertexHandle; 2] {
        self.mesh.subseg_data(self.handle).endpoints
    }

    /// The endpoint positions.
    pub fn positions(&self) -> [Point2; 2] {
        self.endpoints().map(|endpoint| self.mesh.position(endpoint))
    }

    /// The subsegment's boundary marker.
    pub fn marker(&self) -> i32 {
        self.mesh.subseg_data(self.handle).marker
    }

    /// The triangles adjoining the subsegment, `None` where outer space does.
    pub fn triangles(&self) -> [Option<FixedTriangleHandle>; 2] {
        self.mesh.subseg_data(self.handle).triangles.map(|otri| {
            if otri.is_ghost() {
                None
            } else {
                Some(otri.tri)
            }
        })
    }
}

impl std::fmt::Debug for SubsegView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsegView")
            .field("handle", &self.handle)
            .field("endpoints", &self.endpoints())
            .finish()
    }
}

/// Read-only view of an undirected mesh edge.
#[derive(Clone, Copy)]
pub struct EdgeView<'a> {
    mesh: &'a Mesh,
    otri: Otri,
}

impl EdgeView<'_> {
    /// The edge's endpoint vertices.
    pub fn endpoints(&self) -> [FixedVertexHandle; 2] {
        [
            self.otri.org(self.mesh).expect("live triangle has real corners"),
            self.otri.dest(self.mesh).expect("live triangle has real corners"),
        ]
    }

    /// The edge's endpoint positions.
    pub fn positions(&self) -> [Point2; 2] {
        self.endpoints().map(|endpoint| self.mesh.position(endpoint))
    }

    /// The boundary marker of the subsegment adjoining this edge, if any.
    pub fn marker(&self) -> Option<i32> {
        let subseg = self.otri.pivot(self.mesh);
        if subseg.is_none() {
            None
        } else {
            Some(self.mesh.subseg_data(subseg.sub).marker)
        }
    }

    /// Returns `true` if the edge lies on the mesh boundary.
    pub fn is_boundary(&self) -> bool {
        self.otri.sym(self.mesh).is_ghost()
    }
}

impl std::fmt::Debug for EdgeView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeView")
            .field("endpoints", &self.endpoints())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::handles::Otri;
    use crate::triangulate::triangulate_points;
    use crate::{validate, Point2, TriangulateOptions};

    #[test]
    fn flip_swaps_the_diagonal() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let mut mesh = triangulate_points(&points, &TriangulateOptions::new()).unwrap();
        assert_eq!(mesh.num_triangles(), 2);

        let mut diagonal = Otri::GHOST;
        for handle in mesh.triangles.handles() {
            for orient in 0..3 {
                let edge = Otri::new(handle, orient);
                if !edge.sym(&mesh).is_ghost() {
                    diagonal = edge;
                }
            }
        }
        assert!(!diagonal.is_ghost());
        let old_org = diagonal.org(&mesh).unwrap();
        let mut apexes = [
            diagonal.apex(&mesh).unwrap(),
            diagonal.sym(&mesh).apex(&mesh).unwrap(),
        ];
        apexes.sort();

        let flipped = mesh.flip(diagonal);

        let mut ends = [flipped.org(&mesh).unwrap(), flipped.dest(&mesh).unwrap()];
        ends.sort();
        assert_eq!(ends, apexes);
        assert_eq!(flipped.apex(&mesh), Some(old_org));
        assert_eq!(mesh.num_triangles(), 2);
        // The square's points are cocircular, so the flipped diagonal is
        // still Delaunay and the mesh must pass every structural check.
        assert_eq!(validate(&mesh), Vec::new());
    }
}
