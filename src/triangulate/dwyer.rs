//! Divide and conquer construction with alternating cuts.
//!
//! Points are split by median cuts whose axis alternates between x and y at
//! each level. Sub-triangulations carry a clockwise ring of ghost triangles
//! around their hull; two rings are merged by finding the lower common
//! tangent and stitching triangles upward along the seam, discarding edges
//! that fail the circumcircle test.
//!
//! Throughout the merge the seam is covered by a dedicated ghost whose ring
//! neighbors are the next hull edges to consume on either side, so every
//! surgery is a local, symmetric relink.

use std::cmp::Ordering;

use crate::math;
use crate::mesh::handles::{FixedVertexHandle, Otri};
use crate::mesh::Mesh;
use crate::Point2;

pub(crate) fn triangulate(mesh: &mut Mesh, vertices: &[FixedVertexHandle]) {
    let mut sorted = vertices.to_vec();
    sorted.sort_by(|&a, &b| cmp_key(key(mesh.position(a), 0), key(mesh.position(b), 0)));

    let mut unique: Vec<FixedVertexHandle> = Vec::with_capacity(sorted.len());
    for vertex in sorted {
        if let Some(&last) = unique.last() {
            if mesh.position(last) == mesh.position(vertex) {
                mesh.mark_undead(vertex);
                continue;
            }
        }
        unique.push(vertex);
    }

    if unique.len() < 2 {
        return;
    }
    recurse(mesh, &mut unique, 0);
    mesh.remove_ring_ghosts();
}

/// Sort key along the cut axis. The y axis variant rotates the plane a
/// quarter turn so that all orientation tests keep their meaning.
fn key(p: Point2, axis: u8) -> (f64, f64) {
    if axis == 0 {
        (p.x, p.y)
    } else {
        (p.y, -p.x)
    }
}

fn cmp_key(a: (f64, f64), b: (f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1))
}

/// Triangulates `verts`, returning one live ghost of the resulting ring.
fn recurse(mesh: &mut Mesh, verts: &mut [FixedVertexHandle], axis: u8) -> Otri {
    match verts.len() {
        2 => {
            sort_by_axis(mesh, verts, axis);
            bare_edge(mesh, verts[0], verts[1])
        }
        3 => {
            sort_by_axis(mesh, verts, axis);
            base_triangle(mesh, verts[0], verts[1], verts[2])
        }
        n => {
            let mid = n / 2;
            verts.select_nth_unstable_by(mid, |&a, &b| {
                cmp_key(key(mesh.position(a), axis), key(mesh.position(b), axis))
            });
            let child_axis = 1 - axis;
            let (left, right) = verts.split_at_mut(mid);
            let left_ring = recurse(mesh, left, child_axis);
            let right_ring = recurse(mesh, right, child_axis);
            merge(mesh, left_ring, right_ring, axis)
        }
    }
}

fn sort_by_axis(mesh: &Mesh, verts: &mut [FixedVertexHandle], axis: u8) {
    verts.sort_by(|&a, &b| cmp_key(key(mesh.position(a), axis), key(mesh.position(b), axis)));
}

/// Two ghosts back to back around a single edge.
fn bare_edge(mesh: &mut Mesh, u: FixedVertexHandle, v: FixedVertexHandle) -> Otri {
    let a = mesh.make_ring_ghost(u, v);
    let b = mesh.make_ring_ghost(v, u);
    mesh.bond(a, b);
    mesh.ring_bond(a, b);
    mesh.ring_bond(b, a);
    a
}

fn base_triangle(
    mesh: &mut Mesh,
    u: FixedVertexHandle,
    v: FixedVertexHandle,
    w: FixedVertexHandle,
) -> Otri {
    let area = math::counterclockwise(mesh.position(u), mesh.position(v), mesh.position(w));
    if area == 0.0 {
        // Collinear: a two edge chain. The ring passes u -> v -> w along
        // one side and back along the other.
        let a = mesh.make_ring_ghost(u, v);
        let b = mesh.make_ring_ghost(v, u);
        let c = mesh.make_ring_ghost(v, w);
        let d = mesh.make_ring_ghost(w, v);
        mesh.bond(a, b);
        mesh.bond(c, d);
        mesh.ring_bond(a, c);
        mesh.ring_bond(c, d);
        mesh.ring_bond(d, b);
        mesh.ring_bond(b, a);
        return a;
    }

    let (a, b, c) = if area > 0.0 { (u, v, w) } else { (u, w, v) };
    let tri = mesh.make_triangle();
    let tri = mesh.rewrite_real(tri, a, b, c);
    let g1 = mesh.make_ring_ghost(b, a);
    let g2 = mesh.make_ring_ghost(a, c);
    let g3 = mesh.make_ring_ghost(c, b);
    mesh.bond(g1, tri);
    mesh.bond(g2, tri.lprev());
    mesh.bond(g3, tri.lnext());
    mesh.ring_bond(g1, g2);
    mesh.ring_bond(g2, g3);
    mesh.ring_bond(g3, g1);
    mesh.set_incident(tri);
    mesh.set_incident(tri.lnext());
    mesh.set_incident(tri.lprev());
    g1
}

/// Walks a ghost ring to the ghost whose origin is extreme along `axis`.
fn extreme_ring_ghost(mesh: &Mesh, start: Otri, axis: u8, want_max: bool) -> Otri {
    let org_key = |g: Otri| key(mesh.position(g.org(mesh).expect("ring ghost origin")), axis);
    let mut best = start;
    let mut best_key = org_key(start);
    let mut g = mesh.ring_next(start);
    while g != start {
        let k = org_key(g);
        if (want_max && cmp_key(k, best_key) == Ordering::Greater)
            || (!want_max && cmp_key(k, best_key) == Ordering::Less)
        {
            best = g;
            best_key = k;
        }
        g = mesh.ring_next(g);
    }
    best
}

fn merge(mesh: &mut Mesh, left_ring: Otri, right_ring: Otri, axis: u8) -> Otri {
    // Tangent walk state: gl's origin is the current left tangent point,
    // gr's destination the current right one.
    let mut gl = extreme_ring_ghost(mesh, left_ring, axis, true);
    let mut gr = mesh.ring_prev(extreme_ring_ghost(mesh, right_ring, axis, false));
    let mut x = gl.org(mesh).expect("ring ghost origin");
    let mut y = gr.dest(mesh).expect("ring ghost destination");

    // Lower common tangent: pull either endpoint toward any hull neighbor
    // strictly below the current line.
    loop {
        let below =
            |mesh: &Mesh, x: Point2, y: Point2, c: FixedVertexHandle| {
                math::counterclockwise(x, y, mesh.position(c)) < 0.0
            };
        let (px, py) = (mesh.position(x), mesh.position(y));
        let next_l = mesh.ring_next(gl);
        let prev_l = mesh.ring_prev(gl);
        let next_r = mesh.ring_next(gr);
        let prev_r = mesh.ring_prev(gr);
        if below(mesh, px, py, gl.dest(mesh).expect("ghost dest")) {
            gl = next_l;
        } else if below(mesh, px, py, prev_l.org(mesh).expect("ghost org")) {
            gl = prev_l;
        } else if below(mesh, px, py, gr.org(mesh).expect("ghost org")) {
            gr = prev_r;
        } else if below(mesh, px, py, next_r.dest(mesh).expect("ghost dest")) {
            gr = next_r;
        } else {
            break;
        }
        x = gl.org(mesh).expect("ring ghost origin");
        y = gr.dest(mesh).expect("ring ghost destination");
    }

    // Splice the two rings into one: a bottom ghost under the tangent edge
    // and a seam ghost above it.
    let gpl = mesh.ring_prev(gl);
    let gqr = mesh.ring_next(gr);
    let bottom = mesh.make_ring_ghost(y, x);
    let seam = mesh.make_ring_ghost(x, y);
    mesh.bond(bottom, seam);
    mesh.ring_bond(gr, bottom);
    mesh.ring_bond(bottom, gl);
    mesh.ring_bond(gpl, seam);
    mesh.ring_bond(seam, gqr);

    let mut s = seam;
    let mut p = x;
    let mut q = y;
    loop {
        let mut gpl = mesh.ring_prev(s);
        let mut gqr = mesh.ring_next(s);
        let mut lc = gpl.org(mesh).expect("ring ghost origin");
        let mut rc = gqr.dest(mesh).expect("ring ghost destination");
        let (pp, pq) = (mesh.position(p), mesh.position(q));

        // Discard left hull edges whose inner triangle's apex invades the
        // circumcircle through the seam endpoints and the candidate.
        while math::counterclockwise(pp, pq, mesh.position(lc)) > 0.0 {
            let t = gpl.sym(mesh);
            if mesh.triangle_data(t.tri).is_ring_ghost() {
                break;
            }
            let m = t.apex(mesh).expect("real triangle apex");
            if math::in_circle(pp, pq, mesh.position(lc), mesh.position(m)) <= 0.0 {
                break;
            }
            // t runs p -> lc with apex m; its far edges survive as the new
            // hull boundary lc -> m -> p.
            let g_up = mesh.ring_prev(gpl);
            let n_a = t.lnext().sym(mesh);
            let n_b = t.lprev().sym(mesh);
            let g_a = mesh.rewrite_ghost(t, lc, m);
            let g_b = mesh.rewrite_ghost(gpl, m, p);
            mesh.bond(g_a, n_a);
            mesh.bond(g_b, n_b);
            mesh.ring_bond(g_up, g_a);
            mesh.ring_bond(g_a, g_b);
            mesh.ring_bond(g_b, s);
            gpl = g_b;
            lc = m;
        }
        // Mirror image on the right.
        while math::counterclockwise(pp, pq, mesh.position(rc)) > 0.0 {
            let t = gqr.sym(mesh);
            if mesh.triangle_data(t.tri).is_ring_ghost() {
                break;
            }
            let m = t.apex(mesh).expect("real triangle apex");
            if math::in_circle(pp, pq, mesh.position(rc), mesh.position(m)) <= 0.0 {
                break;
            }
            let g_dn = mesh.ring_next(gqr);
            let n_a = t.lnext().sym(mesh);
            let n_b = t.lprev().sym(mesh);
            let g_b = mesh.rewrite_ghost(gqr, q, m);
            let g_a = mesh.rewrite_ghost(t, m, rc);
            mesh.bond(g_b, n_a);
            mesh.bond(g_a, n_b);
            mesh.ring_bond(s, g_b);
            mesh.ring_bond(g_b, g_a);
            mesh.ring_bond(g_a, g_dn);
            gqr = g_b;
            rc = m;
        }

        let l_valid = math::counterclockwise(pp, pq, mesh.position(lc)) > 0.0;
        let r_valid = math::counterclockwise(pp, pq, mesh.position(rc)) > 0.0;
        if !l_valid && !r_valid {
            // The seam is the upper tangent; its ghost is already in place.
            return bottom;
        }
        let take_right = if !l_valid {
            true
        } else if !r_valid {
            false
        } else {
            math::in_circle(mesh.position(lc), pp, pq, mesh.position(rc)) > 0.0
        };

        if take_right {
            let below = s.sym(mesh);
            let inner = gqr.sym(mesh);
            let g_dn = mesh.ring_next(gqr);
            let tri = mesh.rewrite_real(gqr, p, q, rc);
            mesh.bond(tri, below);
            mesh.bond(tri.lnext(), inner);
            let s2 = mesh.rewrite_ghost(s, p, rc);
            mesh.bond(s2, tri.lprev());
            mesh.ring_bond(gpl, s2);
            mesh.ring_bond(s2, g_dn);
            mesh.set_incident(tri);
            mesh.set_incident(tri.lnext());
            mesh.set_incident(tri.lprev());
            s = s2;
            q = rc;
        } else {
            let below = s.sym(mesh);
            let inner = gpl.sym(mesh);
            let g_up = mesh.ring_prev(gpl);
            let tri = mesh.rewrite_real(gpl, p, q, lc);
            mesh.bond(tri, below);
            mesh.bond(tri.lprev(), inner);
            let s2 = mesh.rewrite_ghost(s, lc, q);
            mesh.bond(s2, tri.lnext());
            mesh.ring_bond(g_up, s2);
            mesh.ring_bond(s2, gqr);
            mesh.set_incident(tri);
            mesh.set_incident(tri.lnext());
            mesh.set_incident(tri.lprev());
            s = s2;
            p = lc;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mesh::entities::VertexKind;

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
    fn test_two_triangles() {
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]);
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.hull_size(), 4);
    }

    #[test]
    fn test_cocircular_grid() {
        let points: Vec<_> = (0..4)
            .flat_map(|x| (0..4).map(move |y| Point2::new(x as f64, y as f64)))
            .collect();
        let mesh = build(&points);
        assert_eq!(mesh.num_vertices(), 16);
        assert_eq!(mesh.hull_size(), 12);
        assert_eq!(mesh.num_triangles(), 2 * 15 - 12);
    }

    #[test]
    fn test_duplicates_marked_undead() {
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 2.0),
        ]);
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_triangles(), 1);
    }

    #[test]
    fn test_delaunay_property_on_fan() {
        // A fan of points where a greedy triangulation would violate the
        // empty circle property.
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 0.3),
            Point2::new(1.0, 2.0),
            Point2::new(3.0, 2.0),
        ];
        let mesh = build(&points);
        for tri in mesh.triangles() {
            let [a, b, c] = tri.positions();
            for v in mesh.vertices() {
                let p = v.position();
                if p == a || p == b || p == c {
                    continue;
                }
                assert!(
                    math::in_circle(a, b, c, p) <= 0.0,
                    "{p:?} invades the circumcircle of {a:?} {b:?} {c:?}"
                );
            }
        }
    }
}
