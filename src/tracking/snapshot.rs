use crate::mask::LaneMask;
use crate::tessellation::RibbonState;

use super::coordinate::GeoCoordinate;
use super::orientation::Orientation;

/// Resumable tracker state handed to a persistence layer.
///
/// The voxel world is not part of the snapshot; a resumed session rebuilds
/// it by replaying stored fixes through
/// [`Tracker::bulk_load`](super::Tracker::bulk_load) or keeps the live one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerSnapshot {
    pub ribbon: RibbonState,
    pub orientation: Orientation,
    pub hit_mask: LaneMask,
    pub movement_mask: LaneMask,
    pub published_mask: LaneMask,
    pub triangle_counter: u32,
    pub current_elevation: f64,
    pub previous_fix: Option<GeoCoordinate>,
}
