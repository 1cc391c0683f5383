//! Incremental construction.
//!
//! The input is enclosed in a large bounding triangle so that every point
//! lands inside the mesh, then inserted one cavity insertion at a time in
//! random order. The bounding triangle and everything touching its corners
//! is removed afterwards.

use hashbrown::HashSet;
use rand::seq::SliceRandom;

use crate::mesh::entities::VertexKind;
use crate::mesh::handles::{FixedVertexHandle, Otri};
use crate::mesh::insertion::InsertOutcome;
use crate::mesh::Mesh;
use crate::point::BoundingBox;
use crate::Point2;

pub(crate) fn triangulate(mesh: &mut Mesh, vertices: &[FixedVertexHandle]) {
    let mut bounds = BoundingBox::empty();
    for &vertex in vertices {
        bounds.add_point(mesh.position(vertex));
    }
    let corners = make_bounding_triangle(mesh, &bounds);

    let mut order = vertices.to_vec();
    order.shuffle(&mut mesh.rng);

    let mut hint: Option<Otri> = None;
    for vertex in order {
        match mesh.insert_vertex(vertex, hint) {
            InsertOutcome::Inserted { otri, .. } => hint = Some(otri),
            InsertOutcome::Duplicate(_) => mesh.mark_undead(vertex),
            InsertOutcome::Violating(_) | InsertOutcome::Outside => {
                unreachable!("point inside the bounding triangle, no subsegments yet")
            }
        }
    }

    remove_bounding_triangle(mesh, corners);
}

/// Creates a triangle big enough that no input point can see its edges from
/// the circumcircle side, so cavity insertion never reaches the hull.
fn make_bounding_triangle(mesh: &mut Mesh, bounds: &BoundingBox) -> [FixedVertexHandle; 3] {
    let mut width = bounds.width().max(bounds.height());
    if width == 0.0 {
        width = 1.0;
    }
    let mid = bounds.lower().lerp(bounds.upper(), 0.5);
    let corners = [
        Point2::new(mid.x - 50.0 * width, mid.y - 40.0 * width),
        Point2::new(mid.x + 50.0 * width, mid.y - 40.0 * width),
        Point2::new(mid.x, mid.y + 60.0 * width),
    ];
    let handles = corners.map(|p| mesh.create_vertex(p, 0, VertexKind::Input));

    let tri = mesh.make_triangle();
    mesh.set_org(tri, Some(handles[0]));
    mesh.set_dest(tri, Some(handles[1]));
    mesh.set_apex(tri, Some(handles[2]));
    for orient in 0..3u8 {
        let edge = Otri::new(tri.tri, orient);
        mesh.bond_to_ghost(edge);
        mesh.set_incident(edge);
    }
    handles
}

/// Deletes every triangle incident to a bounding corner and rebonds the
/// surviving boundary to the ghost sentinel.
fn remove_bounding_triangle(mesh: &mut Mesh, corners: [FixedVertexHandle; 3]) {
    let doomed: Vec<_> = mesh
        .triangles
        .iter()
        .filter(|(_, data)| {
            data.corners
                .iter()
                .any(|corner| corner.map_or(false, |c| corners.contains(&c)))
        })
        .map(|(handle, _)| handle)
        .collect();
    let doomed_set: HashSet<_> = doomed.iter().copied().collect();

    for &handle in &doomed {
        for orient in 0..3u8 {
            let edge = Otri::new(handle, orient);
            let neighbor = edge.sym(mesh);
            if !neighbor.is_ghost() && !doomed_set.contains(&neighbor.tri) {
                mesh.bond_to_ghost(neighbor);
                mesh.set_incident(neighbor);
                mesh.set_incident(neighbor.lnext());
            }
        }
    }
    for handle in doomed {
        mesh.triangle_dealloc(handle);
    }
    for corner in corners {
        mesh.mark_undead(corner);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn build(points: &[Point2]) -> Mesh {
        let mut mesh = Mesh::with_seed(1);
        let handles: Vec<_> = points
            .iter()
            .map(|&p| mesh.create_vertex(p, 0, VertexKind::Input))
            .collect();
        triangulate(&mut mesh, &handles);
        mesh
    }

    #[test]
    fn test_single_triangle() {
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 1.0),
        ]);
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.hull_size(), 3);
    }

    #[test]
    fn test_bounding_box_ignores_the_removed_bounding_triangle() {
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 1.0),
        ]);
        let bounds = mesh.bounding_box();
        assert_eq!(bounds.lower(), Point2::new(0.0, 0.0));
        assert_eq!(bounds.upper(), Point2::new(2.0, 1.0));
    }

    #[test]
    fn test_grid_is_fully_triangulated() {
        let points: Vec<_> = (0..5)
            .flat_map(|x| (0..5).map(move |y| Point2::new(x as f64, y as f64)))
            .collect();
        let mesh = build(&points);
        // Euler: for n vertices with h on the hull, 2(n-1) - h triangles.
        assert_eq!(mesh.num_vertices(), 25);
        assert_eq!(mesh.hull_size(), 16);
        assert_eq!(mesh.num_triangles(), 2 * 24 - 16);
    }

    #[test]
    fn test_collinear_points_leave_no_triangles() {
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(3.0, 3.0),
        ]);
        assert_eq!(mesh.num_triangles(), 0);
    }
}
