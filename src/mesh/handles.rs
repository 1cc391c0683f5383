//! Fixed entity handles and the oriented cursors used to navigate topology.
//!
//! A fixed handle pairs an arena index with a generation tag; it stays valid
//! across arbitrary mesh mutation and can be checked for staleness. An
//! oriented cursor ([Otri], [Osub]) additionally selects one of the entity's
//! edge orientations. Cursors are small `Copy` values; all primitive
//! operations are pure `(handle, orientation) -> (handle, orientation)`
//! functions, mutation goes through `&mut Mesh` methods.

use super::pool::PoolHandle;
use super::Mesh;

pub(crate) const PLUS_1_MOD_3: [u8; 3] = [1, 2, 0];
pub(crate) const MINUS_1_MOD_3: [u8; 3] = [2, 0, 1];

/// A stable reference to a vertex of a mesh.
///
/// Vertices are never physically removed during a run (redundant vertices are
/// marked undead instead and purged at output time), so the handle is a plain
/// index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedVertexHandle(pub(crate) u32);

impl FixedVertexHandle {
    pub(crate) fn new(index: usize) -> Self {
        FixedVertexHandle(index as u32)
    }

    /// The vertex's position in the mesh's vertex collection.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for FixedVertexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedVertexHandle")
            .field("index", &self.0)
            .finish()
    }
}

macro_rules! fixed_pool_handle {
    ($(#[$outer:meta])* $name:ident) => {
        $(#[$outer])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            pub(crate) index: u32,
            pub(crate) generation: u32,
        }

        impl $name {
            /// The per-mesh sentinel ("ghost") entity, stored in slot 0.
            pub(crate) const GHOST: $name = $name {
                index: 0,
                generation: 0,
            };

            /// The handle's arena index.
            pub fn index(&self) -> usize {
                self.index as usize
            }

            /// Returns `true` if this handle refers to the mesh's sentinel
            /// entity rather than a live one.
            pub fn is_ghost(&self) -> bool {
                self.index == 0
            }
        }

        impl PoolHandle for $name {
            fn from_parts(index: u32, generation: u32) -> Self {
                $name { index, generation }
            }

            fn index(&self) -> usize {
                self.index as usize
            }

            fn generation(&self) -> u32 {
                self.generation
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                if self.is_ghost() {
                    write!(f, concat!(stringify!($name), "(ghost)"))
                } else {
                    write!(f, concat!(stringify!($name), "({})"), self.index)
                }
            }
        }
    };
}

fixed_pool_handle!(
    /// A stable, generation-checked reference to a triangle of a mesh.
    FixedTriangleHandle
);

fixed_pool_handle!(
    /// A stable, generation-checked reference to a subsegment of a mesh.
    FixedSubsegHandle
);

/// An oriented triangle cursor.
///
/// `orient` selects one of the three directed edges of the triangle: edge `i`
/// runs from corner `(i + 1) % 3` to corner `(i + 2) % 3`, its apex is corner
/// `i`. Corners are counterclockwise, so the triangle's interior always lies
/// to the left of the cursor's directed edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Otri {
    pub tri: FixedTriangleHandle,
    pub orient: u8,
}

impl std::fmt::Debug for Otri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Otri({:?}, {})", self.tri, self.orient)
    }
}

impl Otri {
    /// The cursor on the per-mesh "outer space" sentinel triangle.
    pub const GHOST: Otri = Otri {
        tri: FixedTriangleHandle::GHOST,
        orient: 0,
    };

    pub fn new(tri: FixedTriangleHandle, orient: u8) -> Self {
        debug_assert!(orient < 3);
        Otri { tri, orient }
    }

    /// Returns `true` if the cursor sits on the sentinel triangle.
    pub fn is_ghost(&self) -> bool {
        self.tri.is_ghost()
    }

    /// The next edge counterclockwise within the same triangle.
    pub fn lnext(self) -> Otri {
        Otri {
            tri: self.tri,
            orient: PLUS_1_MOD_3[self.orient as usize],
        }
    }

    /// The previous edge (clockwise) within the same triangle.
    pub fn lprev(self) -> Otri {
        Otri {
            tri: self.tri,
            orient: MINUS_1_MOD_3[self.orient as usize],
        }
    }

    /// Crosses to the triangle on the other side of this edge.
    ///
    /// The result is oriented so that its directed edge runs opposite to this
    /// one; `sym(sym(o)) == o` for bonded edges. Returns the ghost cursor at
    /// the mesh boundary.
    pub fn sym(self, mesh: &Mesh) -> Otri {
        mesh.triangle_data(self.tri).neighbors[self.orient as usize]
    }

    /// The next edge counterclockwise around this edge's origin.
    pub fn onext(self, mesh: &Mesh) -> Otri {
        self.lprev().sym(mesh)
    }

    /// The next edge clockwise around this edge's origin.
    pub fn oprev(self, mesh: &Mesh) -> Otri {
        self.sym(mesh).lnext()
    }

    /// The next edge counterclockwise around this edge's destination.
    pub fn dnext(self, mesh: &Mesh) -> Otri {
        self.sym(mesh).lprev()
    }

    /// The next edge clockwise around this edge's destination.
    pub fn dprev(self, mesh: &Mesh) -> Otri {
        self.lnext().sym(mesh)
    }

    /// The origin vertex of the directed edge. `None` denotes the ghost
    /// vertex of a construction-time hull ring triangle.
    pub fn org(self, mesh: &Mesh) -> Option<FixedVertexHandle> {
        mesh.triangle_data(self.tri).corners[PLUS_1_MOD_3[self.orient as usize] as usize]
    }

    /// The destination vertex of the directed edge.
    pub fn dest(self, mesh: &Mesh) -> Option<FixedVertexHandle> {
        mesh.triangle_data(self.tri).corners[MINUS_1_MOD_3[self.orient as usize] as usize]
    }

    /// The vertex opposite the directed edge.
    pub fn apex(self, mesh: &Mesh) -> Option<FixedVertexHandle> {
        mesh.triangle_data(self.tri).corners[self.orient as usize]
    }

    /// Crosses to the subsegment adjoining this edge, or [Osub::NONE].
    pub fn pivot(self, mesh: &Mesh) -> Osub {
        mesh.triangle_data(self.tri).subsegs[self.orient as usize]
    }

    /// Returns `true` if both cursors denote the same undirected triangle edge.
    pub fn same_edge(self, other: Otri) -> bool {
        self.tri == other.tri && self.orient == other.orient
    }
}

/// An oriented subsegment cursor.
///
/// Orientation 0 runs from the subsegment's first endpoint to its second,
/// orientation 1 the other way.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Osub {
    pub sub: FixedSubsegHandle,
    pub orient: u8,
}

impl std::fmt::Debug for Osub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Osub({:?}, {})", self.sub, self.orient)
    }
}

impl Osub {
    /// The cursor on the per-mesh "no subsegment" sentinel.
    pub const NONE: Osub = Osub {
        sub: FixedSubsegHandle::GHOST,
        orient: 0,
    };

    pub fn new(sub: FixedSubsegHandle, orient: u8) -> Self {
        debug_assert!(orient < 2);
        Osub { sub, orient }
    }

    /// Returns `true` if the cursor denotes "no subsegment".
    pub fn is_none(&self) -> bool {
        self.sub.is_ghost()
    }

    /// The same subsegment, traversed in the opposite direction.
    pub fn ssym(self) -> Osub {
        Osub {
            sub: self.sub,
            orient: self.orient ^ 1,
        }
    }

    /// The origin vertex of the directed subsegment.
    pub fn org(self, mesh: &Mesh) -> FixedVertexHandle {
        mesh.subseg_data(self.sub).endpoints[self.orient as usize]
    }

    /// The destination vertex of the directed subsegment.
    pub fn dest(self, mesh: &Mesh) -> FixedVertexHandle {
        mesh.subseg_data(self.sub).endpoints[(self.orient ^ 1) as usize]
    }

    /// The endpoint of the *original* input segment this subsegment descends
    /// from, on the origin side.
    pub fn seg_org(self, mesh: &Mesh) -> FixedVertexHandle {
        mesh.subseg_data(self.sub).extensions[self.orient as usize]
    }

    /// The endpoint of the original input segment on the destination side.
    pub fn seg_dest(self, mesh: &Mesh) -> FixedVertexHandle {
        mesh.subseg_data(self.sub).extensions[(self.orient ^ 1) as usize]
    }

    /// Crosses to the triangle adjoining this side of the subsegment.
    ///
    /// The returned cursor's directed edge runs along the subsegment in the
    /// same direction as this cursor. Ghost if outer space adjoins this side.
    pub fn tri_pivot(self, mesh: &Mesh) -> Otri {
        mesh.subseg_data(self.sub).triangles[self.orient as usize]
    }
}
