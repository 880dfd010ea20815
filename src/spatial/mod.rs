pub mod query;
mod voxel;

pub use query::{classify_lane, HitQuery};
pub use voxel::{Quadrant, StoredVertex, TriangleRef, TriangleStore, Voxel, VoxelId};

use slotmap::SlotMap;
use tracing::{error, trace, warn};

use crate::error::{ConfigError, Result};
use crate::mask::{LaneMask, VertexState};
use crate::math::intersect_2d::boxes_overlap;
use crate::math::triangle_2d::triangle_contains;
use crate::math::{Point2, TOLERANCE};
use crate::tessellation::Triangle2;

/// Side length of the whole indexed square, centred on the origin.
pub const WORLD_EXTENT: f64 = 5120.0;

/// Side length of a leaf voxel.
pub const LEAF_SIDE: f64 = 40.0;

/// Depth of the voxels that own triangle buffers.
pub const CONTAINER_LEVEL: u32 = 5;

/// Triangles committed fewer than this many insertions ago never count as hits.
pub const MINIMAL_TRIANGLE_OFFSET: u32 = 80;

/// Elevation reported when nothing is hit.
pub const BASE_ELEVATION: f64 = 0.1;

/// Added to the highest hit triangle to get a clear draw elevation.
pub const ELEVATION_OFFSET: f64 = 0.05;

/// Maps a plane point to the lane it belongs to.
pub trait LaneClassifier {
    fn lane_at(&self, point: &Point2) -> usize;
}

/// Shape of the voxel world.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldParams {
    pub extent: f64,
    pub leaf_side: f64,
    pub container_level: u32,
    pub minimal_triangle_offset: u32,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            extent: WORLD_EXTENT,
            leaf_side: LEAF_SIDE,
            container_level: CONTAINER_LEVEL,
            minimal_triangle_offset: MINIMAL_TRIANGLE_OFFSET,
        }
    }
}

impl WorldParams {
    /// Checks the shape and returns the depth of the leaf level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WorldShape`] if `extent / leaf_side` is not a
    /// power of two of at least 2, or if the container level lies below the
    /// leaf level.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn leaf_level(&self) -> Result<u32> {
        if !(self.extent.is_finite() && self.leaf_side.is_finite())
            || self.extent <= 0.0
            || self.leaf_side <= 0.0
        {
            return Err(ConfigError::WorldShape(format!(
                "extent {} and leaf side {} must be positive",
                self.extent, self.leaf_side
            ))
            .into());
        }
        let ratio = self.extent / self.leaf_side;
        let rounded = ratio.round();
        if (ratio - rounded).abs() > TOLERANCE || rounded < 2.0 || rounded > f64::from(u32::MAX) {
            return Err(ConfigError::WorldShape(format!(
                "extent / leaf side = {ratio} is not a power of two"
            ))
            .into());
        }
        let cells = rounded as u64;
        if !cells.is_power_of_two() {
            return Err(ConfigError::WorldShape(format!(
                "extent / leaf side = {cells} is not a power of two"
            ))
            .into());
        }
        let leaf_level = cells.trailing_zeros();
        if self.container_level > leaf_level {
            return Err(ConfigError::WorldShape(format!(
                "container level {} is deeper than leaf level {leaf_level}",
                self.container_level
            ))
            .into());
        }
        Ok(leaf_level)
    }
}

/// The quadtree voxel world.
///
/// Leaves record references to triangles; the container voxel above them
/// stores the triangle data once for all of its descendants.
#[derive(Debug)]
pub struct VoxelWorld {
    params: WorldParams,
    leaf_level: u32,
    voxels: SlotMap<VoxelId, Voxel>,
    root: VoxelId,
    center_voxel: Option<VoxelId>,
    list_head: Option<VoxelId>,
    list_tail: Option<VoxelId>,
    listed: usize,
    containers: Vec<VoxelId>,
}

impl VoxelWorld {
    /// Creates an empty world with only the root voxel.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` describe an invalid shape.
    pub fn new(params: WorldParams) -> Result<Self> {
        let leaf_level = params.leaf_level()?;
        let mut voxels = SlotMap::with_key();
        let root = voxels.insert(Voxel::new(Point2::origin(), params.extent * 0.5, 0, None));
        if params.container_level == 0 {
            voxels[root].container = Some(root);
            voxels[root].storage = Some(TriangleStore::default());
        }
        Ok(Self {
            params,
            leaf_level,
            voxels,
            root,
            center_voxel: None,
            list_head: None,
            list_tail: None,
            listed: 0,
            containers: Vec::new(),
        })
    }

    #[must_use]
    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    /// Depth of the leaf voxels.
    #[must_use]
    pub fn leaf_level(&self) -> u32 {
        self.leaf_level
    }

    #[must_use]
    pub fn root(&self) -> VoxelId {
        self.root
    }

    #[must_use]
    pub fn voxel(&self, id: VoxelId) -> Option<&Voxel> {
        self.voxels.get(id)
    }

    /// Total number of voxels in the arena.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    /// The cached voxel around the tracked object.
    #[must_use]
    pub fn center_voxel(&self) -> Option<VoxelId> {
        self.center_voxel
    }

    /// Finds the leaf containing `point` without building anything.
    ///
    /// Returns `None` if the point is outside the world or its leaf does not
    /// exist yet.
    #[must_use]
    pub fn locate(&self, point: &Point2) -> Option<VoxelId> {
        if let Some(id) = self.cached_center(point) {
            return Some(id);
        }
        let mut id = self.root;
        if !self.voxels[id].contains(point) {
            return None;
        }
        loop {
            let voxel = &self.voxels[id];
            if voxel.leaf {
                return Some(id);
            }
            id = voxel.child(Quadrant::of(&voxel.center, point))?;
        }
    }

    /// Finds the leaf containing `point`, creating voxels along the way.
    ///
    /// Returns `None` if the point lies outside the world.
    ///
    /// # Panics
    ///
    /// Panics if the descent does not reach a leaf within `leaf_level + 1`
    /// steps, which means the tree is corrupt.
    pub fn locate_or_build(&mut self, point: &Point2) -> Option<VoxelId> {
        if let Some(id) = self.cached_center(point) {
            return Some(id);
        }
        let mut id = self.root;
        if !self.voxels[id].contains(point) {
            return None;
        }
        let max_steps = self.leaf_level + 1;
        for _ in 0..=max_steps {
            if self.voxels[id].leaf {
                return Some(id);
            }
            let quadrant = Quadrant::of(&self.voxels[id].center, point);
            id = match self.voxels[id].child(quadrant) {
                Some(child) => child,
                None => self.build_child(id, quadrant),
            };
        }
        error!(x = point.x, y = point.y, "could not locate a leaf voxel");
        panic!("quadtree descent exceeded {max_steps} steps at ({}, {})", point.x, point.y);
    }

    /// Re-resolves and caches the leaf around the tracked object.
    pub fn update_center_voxel(&mut self, position: &Point2) -> Option<VoxelId> {
        self.center_voxel = None;
        self.center_voxel = self.locate_or_build(position);
        self.center_voxel
    }

    /// Stores a committed triangle.
    ///
    /// Each distinct container touched by the triangle's vertices receives
    /// one copy of it; each distinct leaf receives one reference. Vertices
    /// outside the world are ignored. Returns the number of leaf references
    /// added.
    pub fn insert_triangle<C: LaneClassifier + ?Sized>(
        &mut self,
        triangle: &Triangle2,
        hit: &LaneMask,
        app: &LaneMask,
        sequence: u32,
        elevation: f64,
        classifier: &C,
    ) -> usize {
        let mut leaves: Vec<VoxelId> = Vec::with_capacity(3);
        for vertex in triangle {
            match self.locate_or_build(vertex) {
                Some(id) if !leaves.contains(&id) => leaves.push(id),
                Some(_) => {}
                None => warn!(x = vertex.x, y = vertex.y, "triangle vertex outside the voxel world"),
            }
        }

        let vertices = triangle.map(|position| StoredVertex {
            position,
            elevation,
        });
        let states = triangle.map(|position| {
            let lane = u32::try_from(classifier.lane_at(&position)).unwrap_or(u32::MAX);
            VertexState::new(lane, hit, app)
        });

        let mut stored: Vec<(VoxelId, usize)> = Vec::with_capacity(3);
        let mut added = 0;
        for leaf in leaves {
            let Some(container) = self.voxels[leaf].container else {
                continue;
            };
            let start = match stored.iter().find(|(c, _)| *c == container) {
                Some((_, start)) => *start,
                None => {
                    let Some(store) = self.voxels[container].storage.as_mut() else {
                        continue;
                    };
                    if store.is_empty() {
                        self.containers.push(container);
                    }
                    let start = store.push(vertices, states);
                    stored.push((container, start));
                    start
                }
            };
            self.voxels[leaf]
                .triangle_refs
                .push(TriangleRef { start, sequence });
            added += 1;
        }
        added
    }

    /// Tests `point` against old enough triangles of its leaf.
    ///
    /// A triangle counts when it strictly contains the point and was
    /// committed more than the minimal triangle offset before `counter`.
    /// `painted` comes from the first counting triangle whose lane bit is
    /// set, or from the first counting triangle if none is.
    #[must_use]
    pub fn intersects(&self, point: &Point2, counter: u32, lane_lengths: &[f64]) -> HitQuery {
        let mut result = HitQuery {
            hit: false,
            lane: None,
            painted: false,
            elevation: BASE_ELEVATION,
        };
        let Some(leaf) = self.locate(point) else {
            return result;
        };
        let voxel = &self.voxels[leaf];
        let Some(store) = voxel
            .container
            .and_then(|c| self.voxels.get(c))
            .and_then(Voxel::storage)
        else {
            return result;
        };

        for tri_ref in &voxel.triangle_refs {
            if counter.saturating_sub(tri_ref.sequence) <= self.params.minimal_triangle_offset {
                continue;
            }
            let Some((vertices, states)) = store.triangle(tri_ref.start) else {
                continue;
            };
            let positions = [vertices[0].position, vertices[1].position, vertices[2].position];
            if !triangle_contains(&positions[0], &positions[1], &positions[2], point) {
                continue;
            }

            let max_elevation = vertices
                .iter()
                .map(|v| v.elevation)
                .fold(f64::NEG_INFINITY, f64::max);
            if max_elevation > result.elevation {
                result.elevation = max_elevation + ELEVATION_OFFSET;
            }
            result.hit = true;

            if !result.painted {
                let lanes = [states[0].lane, states[1].lane, states[2].lane]
                    .map(|lane| usize::try_from(lane).unwrap_or(usize::MAX));
                let lane = classify_lane(&positions, lanes, point, lane_lengths);
                result.lane = Some(lane);
                result.painted = states[0].app_mask().get(lane);
            }
        }
        result
    }

    /// Leaf voxels in creation order.
    pub fn listed_voxels(&self) -> ListedVoxels<'_> {
        ListedVoxels {
            world: self,
            next: self.list_head,
        }
    }

    /// Number of leaf voxels created so far.
    #[must_use]
    pub fn listed_count(&self) -> usize {
        self.listed
    }

    /// Leaf voxels whose square overlaps the quadrilateral `view`.
    pub fn visible_voxels<'a>(
        &'a self,
        view: &'a [Point2; 4],
    ) -> impl Iterator<Item = (VoxelId, &'a Voxel)> + 'a {
        self.listed_voxels()
            .filter(move |(_, voxel)| boxes_overlap(&voxel.corners(), view))
    }

    /// Container voxels holding at least one triangle, in first-use order.
    pub fn containers(&self) -> impl Iterator<Item = (VoxelId, &TriangleStore)> + '_ {
        self.containers.iter().filter_map(|id| {
            self.voxels
                .get(*id)
                .and_then(Voxel::storage)
                .map(|store| (*id, store))
        })
    }

    /// Drops every voxel and starts over with the same parameters.
    pub fn clear(&mut self) {
        let root = Voxel::new(Point2::origin(), self.params.extent * 0.5, 0, None);
        self.voxels.clear();
        self.root = self.voxels.insert(root);
        if self.params.container_level == 0 {
            self.voxels[self.root].container = Some(self.root);
            self.voxels[self.root].storage = Some(TriangleStore::default());
        }
        self.center_voxel = None;
        self.list_head = None;
        self.list_tail = None;
        self.listed = 0;
        self.containers.clear();
    }

    fn cached_center(&self, point: &Point2) -> Option<VoxelId> {
        self.center_voxel
            .filter(|id| self.voxels.get(*id).is_some_and(|v| v.contains(point)))
    }

    fn build_child(&mut self, parent: VoxelId, quadrant: Quadrant) -> VoxelId {
        let (center, half_side, level, parent_container) = {
            let p = &self.voxels[parent];
            (
                p.center + quadrant.direction() * (p.half_side * 0.5),
                p.half_side * 0.5,
                p.level + 1,
                p.container,
            )
        };
        let is_container = level == self.params.container_level;
        let is_leaf = level == self.leaf_level;

        let id = self.voxels.insert_with_key(|id| {
            let mut voxel = Voxel::new(center, half_side, level, Some(parent));
            voxel.leaf = is_leaf;
            if is_container {
                voxel.container = Some(id);
                voxel.storage = Some(TriangleStore::default());
            } else if level > self.params.container_level {
                voxel.container = parent_container;
            }
            voxel
        });
        self.voxels[parent].children[quadrant.index()] = Some(id);
        trace!(level, x = center.x, y = center.y, is_container, is_leaf, "voxel created");

        if is_leaf {
            self.list_append(id);
        }
        id
    }

    fn list_append(&mut self, id: VoxelId) {
        match self.list_tail {
            Some(tail) => self.voxels[tail].list_next = Some(id),
            None => self.list_head = Some(id),
        }
        self.list_tail = Some(id);
        self.listed += 1;
    }
}

/// Iterator over the leaf voxel list.
#[derive(Debug)]
pub struct ListedVoxels<'a> {
    world: &'a VoxelWorld,
    next: Option<VoxelId>,
}

impl<'a> Iterator for ListedVoxels<'a> {
    type Item = (VoxelId, &'a Voxel);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let voxel = self.world.voxels.get(id)?;
        self.next = voxel.list_next;
        Some((id, voxel))
    }
}
