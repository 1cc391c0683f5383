use crate::Point2;

use super::handles::{FixedVertexHandle, Osub, Otri};

/// Classifies how a vertex entered the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// Part of the original input.
    Input,
    /// A Steiner point inserted on a constrained segment.
    SteinerOnSegment,
    /// A free Steiner point inserted in the interior.
    Free,
    /// Logically removed. Undead vertices stay in the collection to keep
    /// indices stable during a run and are purged at output time.
    Undead,
}

#[derive(Debug, Clone)]
pub(crate) struct VertexData {
    pub position: Point2,
    pub marker: i32,
    pub kind: VertexKind,
    /// User supplied attributes, carried through to output untouched.
    pub attrs: Vec<f64>,
    /// One triangle edge whose origin is this vertex; used to re-enter the
    /// mesh from the vertex. Ghost until the vertex is linked in.
    pub incident: Otri,
    /// Dense output index assigned by `Mesh::renumber`, `u32::MAX` before.
    pub renumbered: u32,
}

impl VertexData {
    pub fn new(position: Point2, marker: i32, kind: VertexKind) -> Self {
        VertexData {
            position,
            marker,
            kind,
            attrs: Vec::new(),
            incident: Otri::GHOST,
            renumbered: u32::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TriangleData {
    /// Corner vertices in counterclockwise order. `None` is the ghost vertex
    /// of construction-time hull ring triangles.
    pub corners: [Option<FixedVertexHandle>; 3],
    /// Neighbor across edge `i`, oriented to face back. Ghost at boundaries.
    pub neighbors: [Otri; 3],
    /// Subsegment adjoining edge `i`, [Osub::NONE] for unconstrained edges.
    pub subsegs: [Osub; 3],
    pub region: i32,
    pub max_area: Option<f64>,
    /// Transient flag used by hole/region carving.
    pub infected: bool,
    /// Dense output index assigned by `Mesh::renumber`.
    pub renumbered: u32,
}

impl TriangleData {
    pub fn blank() -> Self {
        TriangleData {
            corners: [None; 3],
            neighbors: [Otri::GHOST; 3],
            subsegs: [Osub::NONE; 3],
            region: 0,
            max_area: None,
            infected: false,
            renumbered: u32::MAX,
        }
    }

    /// A hull ring triangle has the ghost vertex as one corner.
    pub fn is_ring_ghost(&self) -> bool {
        self.corners.iter().any(Option::is_none)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SubsegData {
    /// Endpoint vertices; orientation 0 runs from `endpoints[0]` to
    /// `endpoints[1]`.
    pub endpoints: [FixedVertexHandle; 2],
    /// Endpoints of the original input segment this subsegment descends from.
    /// Splitting a subsegment keeps the extensions, so refinement can always
    /// recover the full segment a piece belongs to.
    pub extensions: [FixedVertexHandle; 2],
    pub marker: i32,
    /// Adjoining triangle per side: `triangles[i]` runs along the subsegment
    /// in the direction of orientation `i`. Ghost where outer space adjoins.
    pub triangles: [Otri; 2],
}

impl SubsegData {
    pub fn new(org: FixedVertexHandle, dest: FixedVertexHandle, marker: i32) -> Self {
        SubsegData {
            endpoints: [org, dest],
            extensions: [org, dest],
            marker,
            triangles: [Otri::GHOST; 2],
        }
    }
}
