use crate::mask::VertexState;
use crate::math::{Point2, Vector2};

slotmap::new_key_type! {
    /// Unique identifier for a voxel in the world arena.
    pub struct VoxelId;
}

/// One of the four children of a voxel, named by the sign of its offset
/// from the parent centre (`N` negative, `P` positive; x first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NN = 0,
    NP = 1,
    PN = 2,
    PP = 3,
}

impl Quadrant {
    /// Quadrant of `center` that owns `point`. Points on a dividing line go
    /// to the positive side, matching [`Voxel::contains`].
    #[must_use]
    pub fn of(center: &Point2, point: &Point2) -> Self {
        let px = point.x >= center.x;
        let py = point.y >= center.y;
        match (px, py) {
            (true, true) => Self::PP,
            (false, true) => Self::NP,
            (true, false) => Self::PN,
            (false, false) => Self::NN,
        }
    }

    /// Unit-sign offset direction of this quadrant.
    #[must_use]
    pub fn direction(self) -> Vector2 {
        match self {
            Self::NN => Vector2::new(-1.0, -1.0),
            Self::NP => Vector2::new(-1.0, 1.0),
            Self::PN => Vector2::new(1.0, -1.0),
            Self::PP => Vector2::new(1.0, 1.0),
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Reference from a leaf voxel to a triangle held by its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleRef {
    /// Index of the first of the triangle's three vertices in the container store.
    pub start: usize,
    /// Value of the triangle counter when the triangle was committed.
    pub sequence: u32,
}

/// A stored triangle vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredVertex {
    pub position: Point2,
    pub elevation: f64,
}

/// Parallel vertex and state buffers owned by a container voxel.
///
/// Triangles are appended as three consecutive entries and never mutated.
#[derive(Debug, Clone, Default)]
pub struct TriangleStore {
    vertices: Vec<StoredVertex>,
    states: Vec<VertexState>,
}

impl TriangleStore {
    /// Appends one triangle and returns the index of its first vertex.
    pub fn push(&mut self, vertices: [StoredVertex; 3], states: [VertexState; 3]) -> usize {
        let start = self.vertices.len();
        self.vertices.extend_from_slice(&vertices);
        self.states.extend_from_slice(&states);
        start
    }

    /// The triangle whose first vertex is at `start`.
    #[must_use]
    pub fn triangle(&self, start: usize) -> Option<(&[StoredVertex], &[VertexState])> {
        let end = start.checked_add(3)?;
        Some((self.vertices.get(start..end)?, self.states.get(start..end)?))
    }

    #[must_use]
    pub fn vertices(&self) -> &[StoredVertex] {
        &self.vertices
    }

    #[must_use]
    pub fn states(&self) -> &[VertexState] {
        &self.states
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// A quadtree node.
///
/// Routing nodes sit above the container level and hold nothing. A node at
/// the container level owns a [`TriangleStore`]; it and every deeper node
/// point at it through `container`. Only leaves carry triangle references.
#[derive(Debug, Clone)]
pub struct Voxel {
    pub(super) center: Point2,
    pub(super) half_side: f64,
    pub(super) level: u32,
    pub(super) parent: Option<VoxelId>,
    pub(super) children: [Option<VoxelId>; 4],
    pub(super) container: Option<VoxelId>,
    pub(super) leaf: bool,
    pub(super) triangle_refs: Vec<TriangleRef>,
    pub(super) storage: Option<TriangleStore>,
    pub(super) list_next: Option<VoxelId>,
}

impl Voxel {
    pub(super) fn new(center: Point2, half_side: f64, level: u32, parent: Option<VoxelId>) -> Self {
        Self {
            center,
            half_side,
            level,
            parent,
            children: [None; 4],
            container: None,
            leaf: false,
            triangle_refs: Vec::new(),
            storage: None,
            list_next: None,
        }
    }

    #[must_use]
    pub fn center(&self) -> &Point2 {
        &self.center
    }

    #[must_use]
    pub fn half_side(&self) -> f64 {
        self.half_side
    }

    #[must_use]
    pub fn side(&self) -> f64 {
        self.half_side * 2.0
    }

    /// Depth below the root (root is level 0).
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn parent(&self) -> Option<VoxelId> {
        self.parent
    }

    #[must_use]
    pub fn child(&self, quadrant: Quadrant) -> Option<VoxelId> {
        self.children[quadrant.index()]
    }

    /// The container voxel holding this voxel's triangles.
    #[must_use]
    pub fn container(&self) -> Option<VoxelId> {
        self.container
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    #[must_use]
    pub fn triangle_refs(&self) -> &[TriangleRef] {
        &self.triangle_refs
    }

    /// The triangle buffers, present only on container voxels.
    #[must_use]
    pub fn storage(&self) -> Option<&TriangleStore> {
        self.storage.as_ref()
    }

    /// Returns `true` if `point` lies in the half-open square `[min, max)` of
    /// this voxel.
    ///
    /// Exact comparisons keep this in agreement with [`Quadrant::of`], so a
    /// cached voxel and a root descent always pick the same leaf.
    #[must_use]
    pub fn contains(&self, point: &Point2) -> bool {
        let min_x = self.center.x - self.half_side;
        let min_y = self.center.y - self.half_side;
        let max_x = self.center.x + self.half_side;
        let max_y = self.center.y + self.half_side;
        point.x >= min_x && point.x < max_x && point.y >= min_y && point.y < max_y
    }

    /// The square's corners, counter-clockwise from the minimum corner.
    #[must_use]
    pub fn corners(&self) -> [Point2; 4] {
        let h = self.half_side;
        let c = self.center;
        [
            Point2::new(c.x - h, c.y - h),
            Point2::new(c.x + h, c.y - h),
            Point2::new(c.x + h, c.y + h),
            Point2::new(c.x - h, c.y + h),
        ]
    }
}
