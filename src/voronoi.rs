//! Voronoi duals of a finished triangulation.
//!
//! Every triangle contributes one Voronoi vertex (its circumcenter); every
//! interior mesh edge contributes a finite Voronoi edge between the adjacent
//! circumcenters, every hull edge an infinite ray pointing outward.
//! [`BoundedVoronoi`] additionally clips the rays into a box and assembles a
//! closed polygonal cell per site, suitable for direct rendering or area
//! queries.

use hashbrown::HashMap;

use crate::math;
use crate::mesh::entities::VertexKind;
use crate::mesh::handles::{FixedTriangleHandle, FixedVertexHandle, Otri};
use crate::mesh::Mesh;
use crate::{BoundingBox, Point2};

/// The Voronoi dual of a triangulation, with unbounded cells left open.
#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    vertices: Vec<Point2>,
    edges: Vec<VoronoiEdge>,
}

/// One edge of the Voronoi diagram. `sites` are the two input vertices whose
/// cells the edge separates; indices refer to [VoronoiDiagram::vertices].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoronoiEdge {
    /// An edge between two circumcenters, dual to an interior mesh edge.
    Finite {
        /// Index of the first endpoint.
        from: usize,
        /// Index of the second endpoint.
        to: usize,
        /// The separated sites.
        sites: [FixedVertexHandle; 2],
    },
    /// An infinite ray, dual to a hull edge.
    Ray {
        /// Index of the ray's origin.
        from: usize,
        /// The (unnormalized) outward direction.
        direction: Point2,
        /// The separated sites.
        sites: [FixedVertexHandle; 2],
    },
}

impl VoronoiDiagram {
    /// Builds the dual of `mesh`.
    pub fn new(mesh: &Mesh) -> Self {
        let mut vertices = Vec::with_capacity(mesh.num_triangles());
        let mut indices: HashMap<_, usize> = HashMap::with_capacity(mesh.num_triangles());
        for face in mesh.triangles() {
            let [a, b, c] = face.positions();
            indices.insert(face.handle(), vertices.len());
            vertices.push(math::circumcenter(a, b, c).position);
        }

        let mut edges = Vec::new();
        for face in mesh.triangles() {
            let handle = face.handle();
            for orient in 0..3u8 {
                let otri = Otri::new(handle, orient);
                let sites = [
                    otri.org(mesh).expect("live triangle has real corners"),
                    otri.dest(mesh).expect("live triangle has real corners"),
                ];
                let mirror = otri.sym(mesh);
                if mirror.is_ghost() {
                    edges.push(VoronoiEdge::Ray {
                        from: indices[&handle],
                        direction: outward_normal(mesh, otri),
                        sites,
                    });
                } else if handle.index() < mirror.tri.index() {
                    edges.push(VoronoiEdge::Finite {
                        from: indices[&handle],
                        to: indices[&mirror.tri],
                        sites,
                    });
                }
            }
        }
        VoronoiDiagram { vertices, edges }
    }

    /// The Voronoi vertices: one circumcenter per triangle.
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    /// The Voronoi edges.
    pub fn edges(&self) -> &[VoronoiEdge] {
        &self.edges
    }
}

/// A closed Voronoi cell.
#[derive(Debug, Clone)]
pub struct VoronoiCell {
    /// The site the cell belongs to.
    pub site: FixedVertexHandle,
    /// The cell boundary, counterclockwise. Cells of hull sites are closed
    /// by the clip box.
    pub polygon: Vec<Point2>,
}

/// The Voronoi diagram clipped into a box: every cell is a closed polygon.
#[derive(Debug, Clone)]
pub struct BoundedVoronoi {
    bounds: BoundingBox,
    cells: Vec<VoronoiCell>,
}

impl BoundedVoronoi {
    /// Builds the clipped dual of `mesh`.
    ///
    /// The clip box is the mesh's bounding box, grown to contain every
    /// circumcenter and inflated by `margin` (which must be positive so that
    /// rays leave every circumcenter before hitting the box).
    pub fn new(mesh: &Mesh, margin: f64) -> Self {
        let mut box_builder = mesh.bounding_box();
        let mut circumcenters: HashMap<_, Point2> =
            HashMap::with_capacity(mesh.num_triangles());
        for face in mesh.triangles() {
            let [a, b, c] = face.positions();
            let center = math::circumcenter(a, b, c).position;
            box_builder.add_point(center);
            circumcenters.insert(face.handle(), center);
        }
        let bounds = box_builder.inflated(margin.max(f64::MIN_POSITIVE));

        let mut cells = Vec::new();
        for index in 0..mesh.vertices.len() {
            let site = FixedVertexHandle::new(index);
            if mesh.vertex_data(site).kind == VertexKind::Undead {
                continue;
            }
            if let Some(cell) = build_cell(mesh, site, &circumcenters, bounds) {
                cells.push(cell);
            }
        }
        BoundedVoronoi { bounds, cells }
    }

    /// The clip box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// The cells, one per live site.
    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }
}

/// Outward normal of a hull edge (interior lies left of org -> dest).
fn outward_normal(mesh: &Mesh, edge: Otri) -> Point2 {
    let org = mesh.position(edge.org(mesh).expect("live triangle has real corners"));
    let dest = mesh.position(edge.dest(mesh).expect("live triangle has real corners"));
    let along = dest.sub(org);
    Point2::new(along.y, -along.x)
}

/// The triangle fan around `site` in counterclockwise order, starting at the
/// clockwise-most cursor (for hull sites, the one whose own edge lies on the
/// hull).
fn ordered_fan(mesh: &Mesh, site: FixedVertexHandle) -> (Vec<Otri>, bool) {
    let Some(start) = mesh.vertex_otri(site) else {
        return (Vec::new(), false);
    };
    let mut cursor = start;
    let mut on_hull = false;
    loop {
        let prev = cursor.oprev(mesh);
        if prev.is_ghost() {
            on_hull = true;
            break;
        }
        if prev == start {
            cursor = prev;
            break;
        }
        cursor = prev;
    }
    let first = cursor;
    let mut fan = vec![first];
    let mut cursor = first.onext(mesh);
    while !cursor.is_ghost() && cursor != first {
        fan.push(cursor);
        cursor = cursor.onext(mesh);
    }
    (fan, on_hull)
}

fn build_cell(
    mesh: &Mesh,
    site: FixedVertexHandle,
    circumcenters: &HashMap<FixedTriangleHandle, Point2>,
    bounds: BoundingBox,
) -> Option<VoronoiCell> {
    let (fan, on_hull) = ordered_fan(mesh, site);
    if fan.is_empty() {
        return None;
    }
    let mut polygon: Vec<Point2> = fan
        .iter()
        .map(|cursor| circumcenters[&cursor.tri])
        .collect();
    if !on_hull {
        return Some(VoronoiCell { site, polygon });
    }

    // The first fan cursor's own edge and the last cursor's previous edge
    // are the two hull edges at the site. Their dual rays close the cell
    // through the clip box.
    let first = fan[0];
    let last = *fan.last().expect("fan is non-empty");
    let exit_edge = last.lprev();
    debug_assert!(first.sym(mesh).is_ghost() && exit_edge.sym(mesh).is_ghost());

    let exit = clip_ray(
        circumcenters[&exit_edge.tri],
        outward_normal(mesh, exit_edge),
        bounds,
    );
    let entry = clip_ray(circumcenters[&first.tri], outward_normal(mesh, first), bounds);
    polygon.push(exit);
    walk_box(bounds, exit, entry, &mut polygon);
    polygon.push(entry);
    Some(VoronoiCell { site, polygon })
}

/// Intersects the ray `start + t * direction` (`t >= 0`, `start` inside the
/// box) with the box boundary.
fn clip_ray(start: Point2, direction: Point2, bounds: BoundingBox) -> Point2 {
    let lower = bounds.lower();
    let upper = bounds.upper();
    let mut t = f64::INFINITY;
    if direction.x > 0.0 {
        t = t.min((upper.x - start.x) / direction.x);
    } else if direction.x < 0.0 {
        t = t.min((lower.x - start.x) / direction.x);
    }
    if direction.y > 0.0 {
        t = t.min((upper.y - start.y) / direction.y);
    } else if direction.y < 0.0 {
        t = t.min((lower.y - start.y) / direction.y);
    }
    start.add(direction.mul(t))
}

/// Position of a boundary point along the box perimeter, measured
/// counterclockwise from the lower left corner.
fn perimeter_position(bounds: BoundingBox, point: Point2) -> f64 {
    let lower = bounds.lower();
    let upper = bounds.upper();
    let w = bounds.width();
    let h = bounds.height();
    // Classify by the nearest side; clip points sit exactly on one of them.
    let sides = [
        (point.y - lower.y).abs(),
        (upper.x - point.x).abs(),
        (upper.y - point.y).abs(),
        (point.x - lower.x).abs(),
    ];
    let mut side = 0;
    for candidate in 1..4 {
        if sides[candidate] < sides[side] {
            side = candidate;
        }
    }
    match side {
        0 => point.x - lower.x,
        1 => w + (point.y - lower.y),
        2 => w + h + (upper.x - point.x),
        _ => w + h + w + (upper.y - point.y),
    }
}

/// Appends every box corner strictly between `from` and `to` when walking
/// the perimeter counterclockwise.
fn walk_box(bounds: BoundingBox, from: Point2, to: Point2, polygon: &mut Vec<Point2>) {
    let lower = bounds.lower();
    let upper = bounds.upper();
    let w = bounds.width();
    let h = bounds.height();
    let total = 2.0 * (w + h);

    let start = perimeter_position(bounds, from);
    let end = perimeter_position(bounds, to);
    let mut span = end - start;
    if span <= 0.0 {
        span += total;
    }

    let corners = [
        (w, Point2::new(upper.x, lower.y)),
        (w + h, Point2::new(upper.x, upper.y)),
        (w + h + w, Point2::new(lower.x, upper.y)),
        (total, Point2::new(lower.x, lower.y)),
    ];
    let mut passed: Vec<(f64, Point2)> = Vec::new();
    for (position, corner) in corners {
        let mut offset = position - start;
        if offset <= 0.0 {
            offset += total;
        }
        if offset < span {
            passed.push((offset, corner));
        }
    }
    passed.sort_by(|a, b| a.0.total_cmp(&b.0));
    polygon.extend(passed.into_iter().map(|(_, corner)| corner));
}

#[cfg(test)]
mod test {
    use super::{BoundedVoronoi, VoronoiDiagram, VoronoiEdge};
    use crate::triangulate::triangulate_points;
    use crate::{Point2, TriangulateOptions};

    fn polygon_area(polygon: &[Point2]) -> f64 {
        let mut doubled = 0.0;
        for i in 0..polygon.len() {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];
            doubled += a.x * b.y - a.y * b.x;
        }
        doubled * 0.5
    }

    fn grid(n: usize) -> Vec<Point2> {
        let mut points = Vec::new();
        for y in 0..n {
            for x in 0..n {
                points.push(Point2::new(x as f64, y as f64));
            }
        }
        points
    }

    #[test]
    fn square_dual() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let mesh = triangulate_points(&points, &TriangulateOptions::new()).unwrap();
        let voronoi = VoronoiDiagram::new(&mesh);
        assert_eq!(voronoi.vertices().len(), 2);
        // The corners are cocircular: both circumcenters coincide.
        for vertex in voronoi.vertices() {
            assert_eq!(*vertex, Point2::new(1.0, 1.0));
        }
        let rays = voronoi
            .edges()
            .iter()
            .filter(|edge| matches!(edge, VoronoiEdge::Ray { .. }))
            .count();
        let finite = voronoi.edges().len() - rays;
        assert_eq!(rays, 4);
        assert_eq!(finite, 1);
    }

    #[test]
    fn interior_cell_of_a_grid() {
        let mesh = triangulate_points(&grid(3), &TriangulateOptions::new()).unwrap();
        let bounded = BoundedVoronoi::new(&mesh, 1.0);
        let center = mesh
            .vertices()
            .find(|vertex| vertex.position() == Point2::new(1.0, 1.0))
            .unwrap()
            .handle();
        let cell = bounded
            .cells()
            .iter()
            .find(|cell| cell.site == center)
            .unwrap();
        // The interior site's true Voronoi cell is the unit square around it.
        assert!((polygon_area(&cell.polygon) - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn bounded_cells_partition_the_box() {
        let mesh = triangulate_points(&grid(3), &TriangulateOptions::new()).unwrap();
        let bounded = BoundedVoronoi::new(&mesh, 1.0);
        assert_eq!(bounded.cells().len(), 9);
        let total: f64 = bounded
            .cells()
            .iter()
            .map(|cell| polygon_area(&cell.polygon))
            .sum();
        let bounds = bounded.bounds();
        let box_area = bounds.width() * bounds.height();
        assert!(
            (total - box_area).abs() < 1.0e-9 * box_area,
            "cells cover {total}, box is {box_area}"
        );
        // Every cell is counterclockwise and stays inside the box.
        for cell in bounded.cells() {
            assert!(polygon_area(&cell.polygon) > 0.0);
            for &point in &cell.polygon {
                assert!(bounds.inflated(1.0e-9).contains(point));
            }
        }
    }
}
