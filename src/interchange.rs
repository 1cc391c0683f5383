//! Raw-array interchange.
//!
//! [`RawMesh`] mirrors the classic `.node`/`.ele`/`.poly`/`.edge`/`.area`
//! layout as parallel arrays of plain numbers, the form file writers and
//! foreign callers consume. [`Mesh::write_raw`] emits it from a renumbered
//! mesh; [`Mesh::reconstruct`] rebuilds the full topology, neighbor and
//! segment bonds included, from nothing but the arrays.

use hashbrown::HashMap;

use crate::cdt;
use crate::math;
use crate::mesh::entities::VertexKind;
use crate::mesh::handles::{FixedVertexHandle, Otri};
use crate::mesh::Mesh;
use crate::triangulate::RegionAttr;
use crate::{InputError, Point2, TriangulateError, DEFAULT_SEED};

/// A triangulation as parallel arrays.
///
/// Vertex and triangle references are dense 0-based indices. `triangle_areas`
/// uses a negative value for "no constraint", following the classic `.area`
/// file convention. `holes` and `regions` are carried untouched for the
/// benefit of PSLG round trips; the mesh itself does not consume them.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(crate = "serde")
)]
pub struct RawMesh {
    /// Vertex positions.
    pub points: Vec<Point2>,
    /// Per-vertex user attributes (possibly empty per vertex).
    pub point_attributes: Vec<Vec<f64>>,
    /// Per-vertex boundary markers.
    pub point_markers: Vec<i32>,
    /// Corner indices per triangle, counterclockwise.
    pub triangles: Vec<[usize; 3]>,
    /// Regional attribute per triangle.
    pub triangle_attributes: Vec<f64>,
    /// Area constraint per triangle, negative for none.
    pub triangle_areas: Vec<f64>,
    /// Subsegment endpoint indices.
    pub segments: Vec<[usize; 2]>,
    /// Per-subsegment boundary markers.
    pub segment_markers: Vec<i32>,
    /// Hole points, passed through.
    pub holes: Vec<Point2>,
    /// Region seeds, passed through.
    pub regions: Vec<RegionAttr>,
    /// Endpoint indices of every mesh edge.
    pub edges: Vec<[usize; 2]>,
    /// Boundary marker per edge, 0 for unconstrained interior edges.
    pub edge_markers: Vec<i32>,
}

impl Mesh {
    /// Emits the mesh as parallel arrays.
    ///
    /// Uses the dense ids of the latest [Mesh::renumber] call; the
    /// triangulation entry points and [Mesh::reconstruct] renumber before
    /// returning, so a freshly built mesh is always ready to write.
    pub fn write_raw(&self) -> RawMesh {
        let mut raw = RawMesh::default();

        let vertex_count = self
            .vertices
            .iter()
            .filter(|data| data.kind != VertexKind::Undead && data.renumbered != u32::MAX)
            .count();
        raw.points = vec![Point2::new(0.0, 0.0); vertex_count];
        raw.point_attributes = vec![Vec::new(); vertex_count];
        raw.point_markers = vec![0; vertex_count];
        for data in &self.vertices {
            if data.kind == VertexKind::Undead || data.renumbered == u32::MAX {
                continue;
            }
            let id = data.renumbered as usize;
            raw.points[id] = data.position;
            raw.point_attributes[id] = data.attrs.clone();
            raw.point_markers[id] = data.marker;
        }

        let mut faces: Vec<_> = self.triangles().collect();
        faces.sort_by_key(|face| {
            self.triangle_id(face.handle())
                .expect("renumber assigns every live triangle an id")
        });
        for face in faces {
            let corners = face.corners().map(|corner| {
                self.vertex_id(corner)
                    .expect("triangle corners receive vertex ids")
            });
            raw.triangles.push(corners);
            raw.triangle_attributes.push(face.region() as f64);
            raw.triangle_areas.push(face.max_area().unwrap_or(-1.0));
        }

        for subseg in self.subsegments() {
            let [org, dest] = subseg.endpoints();
            raw.segments.push([
                self.vertex_id(org).expect("subsegment endpoints receive ids"),
                self.vertex_id(dest).expect("subsegment endpoints receive ids"),
            ]);
            raw.segment_markers.push(subseg.marker());
        }

        for edge in self.edges() {
            let [org, dest] = edge.endpoints();
            raw.edges.push([
                self.vertex_id(org).expect("edge endpoints receive ids"),
                self.vertex_id(dest).expect("edge endpoints receive ids"),
            ]);
            raw.edge_markers.push(edge.marker().unwrap_or(0));
        }

        raw
    }

    /// Rebuilds a mesh, topology and all, from raw arrays.
    ///
    /// Corner order per triangle may be either winding; clockwise triangles
    /// are reoriented. Neighbor bonds are inferred from shared edges,
    /// segments must coincide with triangle edges.
    pub fn reconstruct(raw: &RawMesh) -> Result<Mesh, TriangulateError> {
        let mut mesh = Mesh::with_seed(DEFAULT_SEED);

        if raw.points.len() < 3 {
            return Err(InputError::TooFewPoints(raw.points.len()).into());
        }
        let mut seen: HashMap<(u64, u64), usize> = HashMap::with_capacity(raw.points.len());
        for (index, &point) in raw.points.iter().enumerate() {
            math::validate_point(point)?;
            if seen
                .insert((point.x.to_bits(), point.y.to_bits()), index)
                .is_some()
            {
                return Err(InputError::DuplicatePoint { point: index }.into());
            }
            let marker = raw.point_markers.get(index).copied().unwrap_or(0);
            let vertex = mesh.create_vertex(point, marker, VertexKind::Input);
            if let Some(attrs) = raw.point_attributes.get(index) {
                if !attrs.is_empty() {
                    mesh.vertex_data_mut(vertex).attrs = attrs.clone();
                }
            }
        }

        // Create the triangles, then stitch neighbors through a map of open
        // edges: the second triangle seen on an edge bonds against the first,
        // whatever is left over is hull.
        let mut open_edges: HashMap<(usize, usize), Otri> = HashMap::new();
        for (index, &corners) in raw.triangles.iter().enumerate() {
            for &corner in &corners {
                if corner >= raw.points.len() {
                    return Err(InputError::TriangleIndexOutOfRange {
                        triangle: index,
                        corner,
                    }
                    .into());
                }
            }
            let [mut a, mut b, mut c] = corners;
            let orientation = math::counterclockwise(
                raw.points[a],
                raw.points[b],
                raw.points[c],
            );
            if orientation == 0.0 {
                return Err(InputError::DegenerateTriangle { triangle: index }.into());
            }
            if orientation < 0.0 {
                std::mem::swap(&mut b, &mut c);
            }

            let slot = mesh.make_triangle();
            let tri = mesh.rewrite_real(
                slot,
                FixedVertexHandle::new(a),
                FixedVertexHandle::new(b),
                FixedVertexHandle::new(c),
            );
            if let Some(&attribute) = raw.triangle_attributes.get(index) {
                mesh.triangle_data_mut(tri.tri).region = attribute as i32;
            }
            if let Some(&area) = raw.triangle_areas.get(index) {
                if area >= 0.0 {
                    mesh.triangle_data_mut(tri.tri).max_area = Some(area);
                }
            }
            for cursor in [tri, tri.lnext(), tri.lprev()] {
                mesh.set_incident(cursor);
                let org = cursor.org(&mesh).expect("fresh triangle is real").index();
                let dest = cursor.dest(&mesh).expect("fresh triangle is real").index();
                let key = (org.min(dest), org.max(dest));
                match open_edges.remove(&key) {
                    Some(other) => mesh.bond(cursor, other),
                    None => {
                        open_edges.insert(key, cursor);
                    }
                }
            }
        }
        for (_, cursor) in open_edges {
            mesh.bond_to_ghost(cursor);
        }

        for (index, &[a, b]) in raw.segments.iter().enumerate() {
            for endpoint in [a, b] {
                if endpoint >= raw.points.len() {
                    return Err(InputError::SegmentIndexOutOfRange {
                        segment: index,
                        endpoint,
                    }
                    .into());
                }
            }
            if a == b {
                return Err(InputError::DegenerateSegment { segment: index }.into());
            }
            let org = FixedVertexHandle::new(a);
            let dest = FixedVertexHandle::new(b);
            let edge = mesh
                .vertex_star(org)
                .into_iter()
                .find(|cursor| cursor.dest(&mesh) == Some(dest))
                .ok_or(InputError::SegmentNotAnEdge { segment: index })?;
            let marker = raw.segment_markers.get(index).copied().unwrap_or(0);
            cdt::attach_subseg(&mut mesh, edge, marker, [org, dest]);
        }

        mesh.renumber(false);
        Ok(mesh)
    }
}

#[cfg(test)]
mod test {
    use super::RawMesh;
    use crate::mesh::Mesh;
    use crate::triangulate::{triangulate, triangulate_points, Polygon};
    use crate::{InputError, Point2, TriangulateError, TriangulateOptions};

    fn sample_points(count: usize) -> Vec<Point2> {
        // A deterministic, well spread point set.
        (0..count)
            .map(|i| {
                let x = (i as f64 * 0.754_877_666_3).fract() * 10.0;
                let y = (i as f64 * 0.569_840_290_9).fract() * 10.0;
                Point2::new(x, y)
            })
            .collect()
    }

    #[test]
    fn round_trip_preserves_topology() {
        let options = TriangulateOptions::new().with_min_angle(25.0);
        let mesh = triangulate_points(&sample_points(100), &options).unwrap();
        let raw = mesh.write_raw();
        let rebuilt = Mesh::reconstruct(&raw).unwrap();

        assert_eq!(rebuilt.num_vertices(), mesh.num_vertices());
        assert_eq!(rebuilt.num_triangles(), mesh.num_triangles());
        assert_eq!(rebuilt.num_edges(), mesh.num_edges());
        assert_eq!(rebuilt.hull_size(), mesh.hull_size());

        // Coordinates survive bit-for-bit, in renumbered order.
        let raw_again = rebuilt.write_raw();
        assert_eq!(raw_again.points, raw.points);
        assert_eq!(raw_again.triangles.len(), raw.triangles.len());
    }

    #[test]
    fn round_trip_preserves_segments_and_markers() {
        let mut polygon = Polygon::from_points(Vec::new());
        polygon.add_contour(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 0.0),
                Point2::new(3.0, 3.0),
                Point2::new(0.0, 3.0),
            ],
            7,
        );
        let mesh = triangulate(&polygon, &TriangulateOptions::new()).unwrap();
        let raw = mesh.write_raw();
        assert_eq!(raw.segments.len(), 4);
        assert!(raw.segment_markers.iter().all(|&marker| marker == 7));

        let rebuilt = Mesh::reconstruct(&raw).unwrap();
        assert_eq!(rebuilt.num_subsegments(), 4);
        assert!(rebuilt.subsegments().all(|subseg| subseg.marker() == 7));
    }

    #[test]
    fn reconstruct_fixes_clockwise_triangles() {
        let raw = RawMesh {
            points: vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.0, 1.0),
            ],
            // Clockwise on purpose.
            triangles: vec![[0, 2, 1]],
            ..RawMesh::default()
        };
        let mesh = Mesh::reconstruct(&raw).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
        let face = mesh.triangles().next().unwrap();
        let [a, b, c] = face.positions();
        assert!(crate::math::counterclockwise(a, b, c) > 0.0);
    }

    #[test]
    fn reconstruct_rejects_bad_input() {
        let base = RawMesh {
            points: vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.0, 1.0),
            ],
            triangles: vec![[0, 1, 2]],
            ..RawMesh::default()
        };

        let mut out_of_range = base.clone();
        out_of_range.triangles = vec![[0, 1, 9]];
        assert!(matches!(
            Mesh::reconstruct(&out_of_range),
            Err(TriangulateError::Input(
                InputError::TriangleIndexOutOfRange { .. }
            ))
        ));

        let mut degenerate = base.clone();
        degenerate.points[2] = Point2::new(2.0, 0.0);
        assert!(matches!(
            Mesh::reconstruct(&degenerate),
            Err(TriangulateError::Input(InputError::DegenerateTriangle { .. }))
        ));

        let mut bad_segment = base.clone();
        bad_segment.points.push(Point2::new(5.0, 5.0));
        bad_segment.segments = vec![[0, 3]];
        assert!(matches!(
            Mesh::reconstruct(&bad_segment),
            Err(TriangulateError::Input(InputError::SegmentNotAnEdge { .. }))
        ));

        let mut duplicate = base;
        duplicate.points.push(Point2::new(1.0, 0.0));
        assert!(matches!(
            Mesh::reconstruct(&duplicate),
            Err(TriangulateError::Input(InputError::DuplicatePoint { .. }))
        ));
    }
}
