//! Sweepline construction.
//!
//! Sites are processed in x order. The boundary of the swept region facing
//! the sweep is a chain of ghost ring triangles, indexed by a splay tree
//! with lazy deletion: a node is trusted only while its ghost still carries
//! the endpoints recorded at insertion time. Pockets left behind the front
//! are filled by circle events, scheduled at the rightmost point of the
//! circumcircle of the two adjacent front edges and validated when popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::math;
use crate::mesh::handles::{FixedVertexHandle, Otri};
use crate::mesh::Mesh;
use crate::Point2;

pub(crate) fn triangulate(mesh: &mut Mesh, vertices: &[FixedVertexHandle]) {
    let mut heap: BinaryHeap<QueueEntry> = BinaryHeap::with_capacity(vertices.len());
    for &vertex in vertices {
        let p = mesh.position(vertex);
        heap.push(QueueEntry {
            key: (p.x, p.y),
            rank: 1,
            event: Event::Site(vertex),
        });
    }

    // The first two distinct sites form a bare edge.
    let Some(first) = pop_site(mesh, &mut heap, None) else {
        return;
    };
    let Some(second) = pop_site(mesh, &mut heap, Some(first)) else {
        return;
    };
    let a = mesh.make_ring_ghost(first, second);
    let b = mesh.make_ring_ghost(second, first);
    mesh.bond(a, b);
    mesh.ring_bond(a, b);
    mesh.ring_bond(b, a);

    let mut front = Front::default();
    front.insert(mesh, a, mesh.position(first));
    front.insert(mesh, b, mesh.position(first));

    let mut last_site = mesh.position(second);
    while let Some(entry) = heap.pop() {
        match entry.event {
            Event::Site(vertex) => {
                let position = mesh.position(vertex);
                if position == last_site {
                    mesh.mark_undead(vertex);
                    continue;
                }
                last_site = position;
                site_event(mesh, &mut front, &mut heap, vertex, position);
            }
            Event::Circle { edge, org, dest } => {
                circle_event(mesh, &mut front, &mut heap, edge, org, dest);
            }
        }
    }

    mesh.remove_ring_ghosts();
}

/// Pops the next site, skipping (and undeading) duplicates of `previous`.
fn pop_site(
    mesh: &mut Mesh,
    heap: &mut BinaryHeap<QueueEntry>,
    previous: Option<FixedVertexHandle>,
) -> Option<FixedVertexHandle> {
    while let Some(entry) = heap.pop() {
        let Event::Site(vertex) = entry.event else {
            continue;
        };
        if let Some(prev) = previous {
            if mesh.position(vertex) == mesh.position(prev) {
                mesh.mark_undead(vertex);
                continue;
            }
        }
        return Some(vertex);
    }
    None
}

// ----- event queue -----

enum Event {
    Site(FixedVertexHandle),
    /// Kills `edge` and its ring successor, filling the pocket between
    /// them, if both still carry the recorded endpoints.
    Circle {
        edge: Otri,
        org: FixedVertexHandle,
        dest: FixedVertexHandle,
    },
}

struct QueueEntry {
    key: (f64, f64),
    /// Circle events (0) fire before sites (1) at equal keys.
    rank: u8,
    event: Event,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted: BinaryHeap is a max-heap, events pop smallest first.
        let this = (self.key.0, self.key.1, self.rank);
        let that = (other.key.0, other.key.1, other.rank);
        that.0
            .total_cmp(&this.0)
            .then(that.1.total_cmp(&this.1))
            .then(that.2.cmp(&this.2))
    }
}

/// Schedules a circle event for `edge` and its ring successor if they bend
/// away from the sweep.
fn schedule_circle(mesh: &Mesh, heap: &mut BinaryHeap<QueueEntry>, edge: Otri) {
    if !mesh.triangles.is_live(edge.tri) || !mesh.triangle_data(edge.tri).is_ring_ghost() {
        return;
    }
    let next = mesh.ring_next(edge);
    let (Some(a), Some(m)) = (edge.org(mesh), edge.dest(mesh)) else {
        return;
    };
    let Some(b) = next.dest(mesh) else {
        return;
    };
    let (pa, pm, pb) = (mesh.position(a), mesh.position(m), mesh.position(b));
    if math::counterclockwise(pa, pm, pb) <= 0.0 {
        return;
    }
    let circum = math::circumcenter(pa, pm, pb);
    let radius = circum.position.distance(pa);
    heap.push(QueueEntry {
        key: (circum.position.x + radius, circum.position.y),
        rank: 0,
        event: Event::Circle {
            edge,
            org: a,
            dest: m,
        },
    });
}

// ----- the front -----

struct FrontNode {
    edge: Otri,
    org: FixedVertexHandle,
    dest: FixedVertexHandle,
    left: Tree,
    right: Tree,
}

type Tree = Option<Box<FrontNode>>;

#[derive(Default)]
struct Front {
    root: Tree,
}

impl Front {
    fn insert(&mut self, mesh: &Mesh, edge: Otri, near: Point2) {
        let node = Box::new(FrontNode {
            edge,
            org: edge.org(mesh).expect("front edge origin"),
            dest: edge.dest(mesh).expect("front edge destination"),
            left: None,
            right: None,
        });
        self.root = insert(splay(self.root.take(), mesh, near), mesh, node, near);
    }

    /// A live front edge near `point`, as a starting cursor for the ring
    /// walk. Falls back to scanning for any ring ghost.
    fn locate(&mut self, mesh: &Mesh, point: Point2) -> Option<Otri> {
        self.root = splay(self.root.take(), mesh, point);
        if let Some(root) = &self.root {
            if alive(mesh, root) {
                return Some(root.edge);
            }
        }
        mesh.triangles
            .iter()
            .find(|(_, data)| data.is_ring_ghost())
            .map(|(handle, data)| {
                let apex_slot = data
                    .corners
                    .iter()
                    .position(|c| c.is_none())
                    .expect("ring ghost has an empty corner");
                Otri::new(handle, apex_slot as u8)
            })
    }
}

fn alive(mesh: &Mesh, node: &FrontNode) -> bool {
    mesh.triangles.is_live(node.edge.tri)
        && mesh.triangle_data(node.edge.tri).is_ring_ghost()
        && node.edge.org(mesh) == Some(node.org)
        && node.edge.dest(mesh) == Some(node.dest)
}

/// Move-to-root splay guided by the front order at `point`; dead nodes
/// encountered on the way are dropped.
fn splay(tree: Tree, mesh: &Mesh, point: Point2) -> Tree {
    let Some(mut node) = tree else {
        return None;
    };
    if !alive(mesh, &node) {
        let left = splay(node.left.take(), mesh, point);
        let right = splay(node.right.take(), mesh, point);
        return join(left, right);
    }
    if right_of_hyperbola(mesh.position(node.org), mesh.position(node.dest), point) {
        match splay(node.right.take(), mesh, point) {
            None => Some(node),
            Some(mut child) => {
                node.right = child.left.take();
                child.left = Some(node);
                Some(child)
            }
        }
    } else {
        match splay(node.left.take(), mesh, point) {
            None => Some(node),
            Some(mut child) => {
                node.left = child.right.take();
                child.right = Some(node);
                Some(child)
            }
        }
    }
}

fn join(left: Tree, right: Tree) -> Tree {
    match left {
        None => right,
        Some(mut node) => {
            attach_rightmost(&mut node, right);
            Some(node)
        }
    }
}

fn attach_rightmost(node: &mut FrontNode, tree: Tree) {
    match &mut node.right {
        Some(child) => attach_rightmost(child, tree),
        slot @ None => *slot = tree,
    }
}

fn insert(tree: Tree, mesh: &Mesh, mut node: Box<FrontNode>, point: Point2) -> Tree {
    match tree {
        None => Some(node),
        Some(mut root) => {
            if right_of_hyperbola(mesh.position(root.org), mesh.position(root.dest), point) {
                node.right = root.right.take();
                node.left = Some(root);
            } else {
                node.left = root.left.take();
                node.right = Some(root);
            }
            Some(node)
        }
    }
}

/// Whether `site` falls beyond the front edge `a -> b`, toward its ring
/// successor. The front is cut by hyperbolic arcs: points equidistant from
/// an edge endpoint and the sweepline.
fn right_of_hyperbola(a: Point2, b: Point2, site: Point2) -> bool {
    if a.x < b.x || (a.x == b.x && a.y > b.y) {
        if site.y <= b.y {
            return true;
        }
    } else if site.y >= a.y {
        return false;
    }
    let dxa = site.y - a.y;
    let dya = a.x - site.x;
    let dxb = site.y - b.y;
    let dyb = b.x - site.x;
    dya * (dxb * dxb + dyb * dyb) > dyb * (dxa * dxa + dya * dya)
}

/// Walks the ring from `start` to the front edge whose arc contains `site`.
fn front_walk(mesh: &Mesh, start: Otri, site: Point2) -> Otri {
    let arc = |g: Otri| {
        let a = mesh.position(g.org(mesh).expect("ring ghost origin"));
        let b = mesh.position(g.dest(mesh).expect("ring ghost destination"));
        right_of_hyperbola(a, b, site)
    };
    let mut g = start;
    let limit = 2 * mesh.triangles.len() + 4;
    for _ in 0..limit {
        if arc(g) {
            g = mesh.ring_next(g);
        } else if arc(mesh.ring_prev(g)) {
            return g;
        } else {
            g = mesh.ring_prev(g);
        }
    }
    g
}

// ----- event handlers -----

fn site_event(
    mesh: &mut Mesh,
    front: &mut Front,
    heap: &mut BinaryHeap<QueueEntry>,
    vertex: FixedVertexHandle,
    position: Point2,
) {
    let start = front
        .locate(mesh, position)
        .expect("a nonempty front outlives the sweep");
    let mut g = front_walk(mesh, start, position);
    let mut a = g.org(mesh).expect("ring ghost origin");
    let mut b = g.dest(mesh).expect("ring ghost destination");
    let mut orientation =
        math::counterclockwise(mesh.position(a), mesh.position(b), position);
    if orientation < 0.0 {
        // The hyperbola walk can land one edge off in degenerate inputs;
        // fall back to scanning the ring for a visible edge.
        let limit = 2 * mesh.triangles.len() + 4;
        for _ in 0..limit {
            g = mesh.ring_next(g);
            a = g.org(mesh).expect("ring ghost origin");
            b = g.dest(mesh).expect("ring ghost destination");
            orientation = math::counterclockwise(mesh.position(a), mesh.position(b), position);
            if orientation >= 0.0 {
                break;
            }
        }
    }

    if orientation > 0.0 {
        // The site sees this front edge: one new triangle, two new front
        // edges meeting at the site.
        let below = g.sym(mesh);
        let g_up = mesh.ring_prev(g);
        let g_dn = mesh.ring_next(g);
        let tri = mesh.make_triangle();
        let tri = mesh.rewrite_real(tri, a, b, vertex);
        mesh.bond(tri, below);
        let g1 = mesh.rewrite_ghost(g, a, vertex);
        let g2 = mesh.make_ring_ghost(vertex, b);
        mesh.bond(g1, tri.lprev());
        mesh.bond(g2, tri.lnext());
        mesh.ring_bond(g_up, g1);
        mesh.ring_bond(g1, g2);
        mesh.ring_bond(g2, g_dn);
        mesh.set_incident(tri);
        mesh.set_incident(tri.lnext());
        mesh.set_incident(tri.lprev());
        front.insert(mesh, g1, position);
        front.insert(mesh, g2, position);
        schedule_circle(mesh, heap, g_up);
        schedule_circle(mesh, heap, g2);
    } else {
        // Collinear with the located edge: the swept region is still a
        // chain; extend it past the nearer endpoint.
        let beyond_dest = mesh
            .position(b)
            .sub(mesh.position(a))
            .dot(position.sub(mesh.position(b)))
            > 0.0;
        if beyond_dest {
            let c = mesh.make_ring_ghost(b, vertex);
            let d = mesh.make_ring_ghost(vertex, b);
            mesh.bond(c, d);
            let g_dn = mesh.ring_next(g);
            mesh.ring_bond(g, c);
            mesh.ring_bond(c, d);
            mesh.ring_bond(d, g_dn);
            front.insert(mesh, c, position);
            front.insert(mesh, d, position);
            schedule_circle(mesh, heap, d);
        } else {
            let c = mesh.make_ring_ghost(vertex, a);
            let d = mesh.make_ring_ghost(a, vertex);
            mesh.bond(c, d);
            let g_up = mesh.ring_prev(g);
            mesh.ring_bond(g_up, d);
            mesh.ring_bond(d, c);
            mesh.ring_bond(c, g);
            front.insert(mesh, c, position);
            front.insert(mesh, d, position);
            schedule_circle(mesh, heap, g_up);
        }
    }
}

fn circle_event(
    mesh: &mut Mesh,
    front: &mut Front,
    heap: &mut BinaryHeap<QueueEntry>,
    edge: Otri,
    org: FixedVertexHandle,
    dest: FixedVertexHandle,
) {
    // Lazy validation: both edges must still be the ghosts the event was
    // scheduled for.
    if !mesh.triangles.is_live(edge.tri)
        || !mesh.triangle_data(edge.tri).is_ring_ghost()
        || edge.org(mesh) != Some(org)
        || edge.dest(mesh) != Some(dest)
    {
        return;
    }
    let next = mesh.ring_next(edge);
    if !mesh.triangle_data(next.tri).is_ring_ghost() {
        return;
    }
    let Some(b) = next.dest(mesh) else {
        return;
    };
    let (pa, pm, pb) = (
        mesh.position(org),
        mesh.position(dest),
        mesh.position(b),
    );
    if math::counterclockwise(pa, pm, pb) <= 0.0 {
        return;
    }

    // Fill the pocket org -> dest -> b with one triangle; the two front
    // edges collapse into one.
    let inner1 = edge.sym(mesh);
    let inner2 = next.sym(mesh);
    let g_up = mesh.ring_prev(edge);
    let g_dn = mesh.ring_next(next);
    let tri = mesh.make_triangle();
    let tri = mesh.rewrite_real(tri, org, dest, b);
    mesh.bond(tri, inner1);
    mesh.bond(tri.lnext(), inner2);
    let merged = mesh.rewrite_ghost(edge, org, b);
    mesh.bond(merged, tri.lprev());
    mesh.ring_bond(g_up, merged);
    mesh.ring_bond(merged, g_dn);
    mesh.triangle_dealloc(next.tri);
    mesh.set_incident(tri);
    mesh.set_incident(tri.lnext());
    mesh.set_incident(tri.lprev());
    front.insert(mesh, merged, pm);
    schedule_circle(mesh, heap, g_up);
    schedule_circle(mesh, heap, merged);
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
    fn test_single_triangle() {
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 2.0),
            Point2::new(2.0, 0.5),
        ]);
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.hull_size(), 3);
    }

    #[test]
    fn test_square_with_center() {
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
            Point2::new(1.0, 1.0),
        ]);
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_triangles(), 4);
        assert_eq!(mesh.hull_size(), 4);
    }

    #[test]
    fn test_pocket_is_filled_by_circle_events() {
        // The third point hides behind the front relative to the first
        // two; only a circle event can connect the hull across it.
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 4.0),
            Point2::new(1.0, 1.0),
            Point2::new(4.0, 2.0),
            Point2::new(5.0, 0.5),
        ]);
        assert_eq!(mesh.num_vertices(), 5);
        // All five points participate; Euler with 4 hull points.
        assert_eq!(mesh.hull_size(), 4);
        assert_eq!(mesh.num_triangles(), 2 * 4 - 4);
    }

    #[test]
    fn test_vertical_line_then_offset_point() {
        let mesh = build(&[
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 2.0),
            Point2::new(0.0, 3.0),
            Point2::new(2.0, 1.5),
        ]);
        assert_eq!(mesh.num_triangles(), 3);
        assert_eq!(mesh.hull_size(), 5);
    }
}
