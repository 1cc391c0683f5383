//! Triangulation entry points.
//!
//! [`triangulate`] runs the full pipeline: Delaunay triangulation of the
//! input points with the configured algorithm, segment recovery, hole and
//! region carving, and quality refinement. [`triangulate_points`] is the
//! shortcut for plain point sets.

pub(crate) mod dwyer;
pub(crate) mod incremental;
pub(crate) mod sweepline;

use hashbrown::HashMap;

use crate::cdt;
use crate::math;
use crate::mesh::entities::VertexKind;
use crate::mesh::handles::{FixedVertexHandle, Otri};
use crate::mesh::Mesh;
use crate::refinement;
use crate::{Algorithm, InputError, Point2, TriangulateError, TriangulateOptions};

/// A planar straight line graph: points, optional segments that must appear
/// as mesh edges, and optional hole and region seed points.
///
/// Segment endpoints index into `points`. Markers follow the usual
/// convention: 0 means unmarked, 1 is reserved for the outer boundary,
/// anything else is passed through to the output untouched.
#[derive(Debug, Clone, Default)]
pub struct Polygon {
    /// The input points.
    pub points: Vec<Point2>,
    /// Per-point boundary markers; missing entries default to 0.
    pub point_markers: Vec<i32>,
    /// Per-point attribute vectors, carried through to the output.
    pub point_attributes: Vec<Vec<f64>>,
    /// Segments as pairs of point indices.
    pub segments: Vec<[usize; 2]>,
    /// Per-segment boundary markers; missing entries default to 0.
    pub segment_markers: Vec<i32>,
    /// One seed point per hole; every triangle reachable from the seed
    /// without crossing a segment is removed.
    pub holes: Vec<Point2>,
    /// Region seed points with their attributes.
    pub regions: Vec<RegionAttr>,
}

/// A region seed: triangles reachable from `point` without crossing a
/// segment receive `id` (and `max_area` when area constraints are enabled).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(crate = "serde")
)]
pub struct RegionAttr {
    /// A point inside the region.
    pub point: Point2,
    /// The regional attribute, stored per triangle.
    pub id: i32,
    /// Optional per-region maximum triangle area.
    pub max_area: Option<f64>,
}

impl Polygon {
    /// A polygon with no segments, holes or regions.
    pub fn from_points(points: Vec<Point2>) -> Self {
        Polygon {
            points,
            ..Default::default()
        }
    }

    /// Appends a closed contour: consecutive points become segments, the
    /// last point connecting back to the first.
    pub fn add_contour(&mut self, points: &[Point2], marker: i32) {
        let base = self.points.len();
        let n = points.len();
        self.points.extend_from_slice(points);
        for i in 0..n {
            self.segments.push([base + i, base + (i + 1) % n]);
            self.segment_markers.push(marker);
        }
    }

    fn marker(&self, index: usize) -> i32 {
        self.point_markers.get(index).copied().unwrap_or(0)
    }

    fn attributes(&self, index: usize) -> Vec<f64> {
        self.point_attributes.get(index).cloned().unwrap_or_default()
    }
}

/// Triangulates a planar straight line graph.
///
/// The result is a constrained (or conforming) Delaunay triangulation of
/// the input, with holes carved, regions labelled and quality refinement
/// applied as configured in `options`.
pub fn triangulate(
    polygon: &Polygon,
    options: &TriangulateOptions,
) -> Result<Mesh, TriangulateError> {
    options.validate()?;
    validate_input(polygon)?;

    let mut mesh = Mesh::with_seed(options.seed);
    let mut handles = Vec::with_capacity(polygon.points.len());
    for (index, &point) in polygon.points.iter().enumerate() {
        let position = math::mitigate_underflow(point);
        let vertex = mesh.create_vertex(position, polygon.marker(index), VertexKind::Input);
        let attrs = polygon.attributes(index);
        if !attrs.is_empty() {
            mesh.vertex_data_mut(vertex).attrs = attrs;
        }
        handles.push(vertex);
    }

    match options.algorithm {
        Algorithm::Incremental => incremental::triangulate(&mut mesh, &handles),
        Algorithm::DivideAndConquer => dwyer::triangulate(&mut mesh, &handles),
        Algorithm::Sweepline => sweepline::triangulate(&mut mesh, &handles),
    }
    if mesh.num_triangles() == 0 {
        return Err(InputError::AllCollinear.into());
    }

    let pslg =
        !polygon.segments.is_empty() || !polygon.holes.is_empty() || !polygon.regions.is_empty();
    if !polygon.segments.is_empty() {
        let redirect = duplicate_redirects(&mesh, &handles);
        let segments: Vec<([FixedVertexHandle; 2], i32)> = polygon
            .segments
            .iter()
            .enumerate()
            .map(|(index, seg)| {
                let a = redirect(handles[seg[0]]);
                let b = redirect(handles[seg[1]]);
                let marker = polygon.segment_markers.get(index).copied().unwrap_or(0);
                ([a, b], marker)
            })
            .collect();
        cdt::recover_segments(&mut mesh, &segments, options.conforming);
    }
    if options.enclose_hull {
        cdt::enclose_hull(&mut mesh);
    }
    if pslg {
        cdt::carve_holes(&mut mesh, &polygon.holes, &polygon.regions, options);
    }

    if options.quality {
        refinement::refine(&mut mesh, options);
    }

    if options.boundary_markers {
        mesh.mark_hull_boundaries();
    } else {
        mesh.clear_markers();
    }
    mesh.renumber(options.jettison);
    Ok(mesh)
}

/// Triangulates a plain point set: the Delaunay triangulation of the points,
/// refined if quality options are set.
pub fn triangulate_points(
    points: &[Point2],
    options: &TriangulateOptions,
) -> Result<Mesh, TriangulateError> {
    triangulate(&Polygon::from_points(points.to_vec()), options)
}

fn validate_input(polygon: &Polygon) -> Result<(), TriangulateError> {
    if polygon.points.len() < 3 {
        return Err(InputError::TooFewPoints(polygon.points.len()).into());
    }
    for &point in &polygon.points {
        math::validate_point(point)?;
    }
    for (index, segment) in polygon.segments.iter().enumerate() {
        for &endpoint in segment {
            if endpoint >= polygon.points.len() {
                return Err(InputError::SegmentIndexOutOfRange {
                    segment: index,
                    endpoint,
                }
                .into());
            }
        }
        if segment[0] == segment[1]
            || polygon.points[segment[0]] == polygon.points[segment[1]]
        {
            return Err(InputError::DegenerateSegment { segment: index }.into());
        }
    }
    Ok(())
}

/// Maps vertices skipped as exact duplicates onto their surviving twin, so
/// segments referencing a duplicate still recover against the mesh.
fn duplicate_redirects(
    mesh: &Mesh,
    handles: &[FixedVertexHandle],
) -> impl Fn(FixedVertexHandle) -> FixedVertexHandle {
    // Which twin of a duplicate pair survives depends on insertion order,
    // so collect every survivor before resolving any undead vertex.
    let mut by_position: HashMap<(u64, u64), FixedVertexHandle> = HashMap::new();
    for &handle in handles {
        let data = mesh.vertex_data(handle);
        if data.kind != VertexKind::Undead {
            let key = (data.position.x.to_bits(), data.position.y.to_bits());
            by_position.insert(key, handle);
        }
    }
    let mut redirect: HashMap<FixedVertexHandle, FixedVertexHandle> = HashMap::new();
    for &handle in handles {
        let data = mesh.vertex_data(handle);
        if data.kind == VertexKind::Undead {
            let key = (data.position.x.to_bits(), data.position.y.to_bits());
            if let Some(&survivor) = by_position.get(&key) {
                redirect.insert(handle, survivor);
            }
        }
    }
    move |handle| redirect.get(&handle).copied().unwrap_or(handle)
}

// ----- ghost ring plumbing shared by the construction algorithms -----
//
// During divide and conquer and sweepline construction the hull is bounded
// by a ring of ghost triangles: triangles whose apex corner is `None`, whose
// primary edge covers one hull edge (directed so that outer space lies to
// its left, i.e. clockwise around the hull), and whose two remaining edges
// are bonded to the neighboring ring ghosts.

impl Mesh {
    /// Creates a ghost ring triangle covering the directed hull edge
    /// `org -> dest`. Ring links and the interior bond are left to the
    /// caller.
    pub(crate) fn make_ring_ghost(
        &mut self,
        org: FixedVertexHandle,
        dest: FixedVertexHandle,
    ) -> Otri {
        let ghost = self.make_triangle();
        self.set_org(ghost, Some(org));
        self.set_dest(ghost, Some(dest));
        ghost
    }

    /// Rewrites an existing triangle record into a ring ghost, reusing its
    /// slot. All bonds must be re-established by the caller.
    pub(crate) fn rewrite_ghost(
        &mut self,
        target: Otri,
        org: FixedVertexHandle,
        dest: FixedVertexHandle,
    ) -> Otri {
        let cursor = Otri::new(target.tri, 0);
        self.set_org(cursor, Some(org));
        self.set_dest(cursor, Some(dest));
        self.set_apex(cursor, None);
        cursor
    }

    /// Rewrites an existing triangle record into the real triangle
    /// `(a, b, c)`, reusing its slot. The returned cursor's primary edge
    /// runs `a -> b` with apex `c`; all bonds must be re-established by the
    /// caller.
    pub(crate) fn rewrite_real(
        &mut self,
        target: Otri,
        a: FixedVertexHandle,
        b: FixedVertexHandle,
        c: FixedVertexHandle,
    ) -> Otri {
        let cursor = Otri::new(target.tri, 0);
        self.set_org(cursor, Some(a));
        self.set_dest(cursor, Some(b));
        self.set_apex(cursor, Some(c));
        cursor
    }

    /// The next ghost clockwise around the ring (the one whose origin is
    /// this ghost's destination).
    pub(crate) fn ring_next(&self, ghost: Otri) -> Otri {
        ghost.lnext().sym(self).lnext()
    }

    /// The previous ghost clockwise around the ring.
    pub(crate) fn ring_prev(&self, ghost: Otri) -> Otri {
        ghost.lprev().sym(self).lprev()
    }

    /// Links two ring ghosts as consecutive: `second` follows `first`
    /// clockwise, sharing `first`'s destination vertex.
    pub(crate) fn ring_bond(&mut self, first: Otri, second: Otri) {
        self.bond(first.lnext(), second.lprev());
    }

    /// Deletes all ring ghosts, bonding the real hull edges behind them to
    /// the mesh's ghost sentinel and repointing hull vertex incidents at
    /// real triangles.
    pub(crate) fn remove_ring_ghosts(&mut self) {
        let doomed: Vec<_> = self
            .triangles
            .iter()
            .filter(|(_, data)| data.is_ring_ghost())
            .map(|(handle, _)| handle)
            .collect();
        for &handle in &doomed {
            let data = self.triangle_data(handle);
            let apex_slot = data
                .corners
                .iter()
                .position(|corner| corner.is_none())
                .expect("ring ghost has an empty corner") as u8;
            let edge = Otri::new(handle, apex_slot);
            let interior = edge.sym(self);
            if !interior.is_ghost() && !self.triangle_data(interior.tri).is_ring_ghost() {
                self.bond_to_ghost(interior);
                self.set_incident(interior);
                self.set_incident(interior.lnext());
            }
        }
        for handle in doomed {
            self.triangle_dealloc(handle);
        }
    }

    /// Marks every hull vertex and hull subsegment with boundary marker 1,
    /// unless it already carries a marker.
    pub(crate) fn mark_hull_boundaries(&mut self) {
        for handle in self.triangles.handles() {
            if !self.triangles.is_live(handle) {
                continue;
            }
            for orient in 0..3u8 {
                let edge = Otri::new(handle, orient);
                if !edge.sym(self).is_ghost() {
                    continue;
                }
                for vertex in [edge.org(self), edge.dest(self)].into_iter().flatten() {
                    let data = self.vertex_data_mut(vertex);
                    if data.marker == 0 {
                        data.marker = 1;
                    }
                }
                let subseg = edge.pivot(self);
                if !subseg.is_none() && self.subseg_data(subseg.sub).marker == 0 {
                    self.subseg_data_mut(subseg.sub).marker = 1;
                }
            }
        }
    }

    /// Zeroes all vertex and subsegment markers.
    pub(crate) fn clear_markers(&mut self) {
        for data in &mut self.vertices {
            data.marker = 0;
        }
        for handle in self.subsegs.handles() {
            if self.subsegs.is_live(handle) {
                self.subsegs.get_mut(handle).marker = 0;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_too_few_points() {
        let result = triangulate_points(
            &[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
            &TriangulateOptions::new(),
        );
        assert!(matches!(
            result,
            Err(TriangulateError::Input(InputError::TooFewPoints(2)))
        ));
    }

    #[test]
    fn test_collinear_points_rejected() {
        let points: Vec<_> = (0..5).map(|i| Point2::new(i as f64, 2.0 * i as f64)).collect();
        let result = triangulate_points(&points, &TriangulateOptions::new());
        assert!(matches!(
            result,
            Err(TriangulateError::Input(InputError::AllCollinear))
        ));
    }

    #[test]
    fn test_unit_square() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        for algorithm in [
            Algorithm::Incremental,
            Algorithm::DivideAndConquer,
            Algorithm::Sweepline,
        ] {
            let mesh = triangulate_points(
                &points,
                &TriangulateOptions::new().with_algorithm(algorithm),
            )
            .unwrap();
            assert_eq!(mesh.num_vertices(), 4);
            assert_eq!(mesh.num_triangles(), 2);
            assert_eq!(mesh.num_edges(), 5);
            assert_eq!(mesh.hull_size(), 4);
        }
    }

    #[test]
    fn test_duplicate_points_are_skipped() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
        ];
        let mesh = triangulate_points(&points, &TriangulateOptions::new()).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_triangles(), 1);
    }

    #[test]
    fn test_segments_referencing_a_duplicate_survive() {
        // Which twin of a duplicate pair survives depends on the shuffled
        // insertion order, so a segment may name the vertex that ends up
        // undead. Its subsegments must still be recovered, whatever the
        // order.
        let mut polygon = Polygon::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
            Point2::new(0.0, 0.0),
        ]);
        polygon.segments.extend([[0, 1], [1, 2], [2, 3], [3, 0]]);
        polygon.segment_markers.extend([1, 1, 1, 1]);
        for seed in 0..32 {
            let options = TriangulateOptions::new()
                .with_algorithm(Algorithm::Incremental)
                .with_seed(seed);
            let mesh = triangulate(&polygon, &options).unwrap();
            assert_eq!(mesh.num_subsegments(), 4, "seed {}", seed);
            assert_eq!(mesh.num_triangles(), 2, "seed {}", seed);
        }
    }

    #[test]
    fn test_segment_validation() {
        let mut polygon = Polygon::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
        ]);
        polygon.segments.push([0, 7]);
        let result = triangulate(&polygon, &TriangulateOptions::new());
        assert!(matches!(
            result,
            Err(TriangulateError::Input(InputError::SegmentIndexOutOfRange {
                segment: 0,
                endpoint: 7,
            }))
        ));
    }

    #[test]
    fn test_algorithms_agree_on_random_points() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::SmallRng::seed_from_u64(42);
        let points: Vec<_> = (0..120)
            .map(|_| Point2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0)))
            .collect();

        let reference = triangulate_points(&points, &TriangulateOptions::new()).unwrap();
        for algorithm in [Algorithm::Incremental, Algorithm::Sweepline] {
            let mesh = triangulate_points(
                &points,
                &TriangulateOptions::new().with_algorithm(algorithm),
            )
            .unwrap();
            assert_eq!(mesh.num_vertices(), reference.num_vertices());
            assert_eq!(mesh.num_triangles(), reference.num_triangles());
            assert_eq!(mesh.hull_size(), reference.hull_size());
        }
    }
}
