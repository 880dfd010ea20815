use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::mask::MAX_LANES;
use crate::spatial::WorldParams;
use crate::tessellation::StrokeStyle;

/// Default number of interior control points per lane.
pub const DEFAULT_SAMPLES_PER_LANE: usize = 3;

/// Default minimum movement (metres) accepted by the movement filter.
pub const DEFAULT_FILTER_DISTANCE: f64 = 0.15;

/// Default jump (metres) between consecutive fixes that starts a new lap.
pub const DEFAULT_LAP_RESET_DISTANCE: f64 = 10.0;

/// Validated tracker configuration.
///
/// Built once with [`TrackerOptions::new`] and refined with the `with_*`
/// setters. A running [`Tracker`](super::Tracker) only picks up a new value
/// through [`Tracker::reconfigure`](super::Tracker::reconfigure).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerOptions {
    lane_lengths: Vec<f64>,
    stroke: StrokeStyle,
    samples_per_lane: usize,
    filter_enabled: bool,
    filter_distance: f64,
    lap_reset_distance: f64,
    world: WorldParams,
}

impl TrackerOptions {
    /// Creates options for the given lane lengths with default settings.
    ///
    /// More than [`MAX_LANES`] lanes are truncated with a warning. The ribbon
    /// thickness defaults to the sum of the lane lengths.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoLanes`] for an empty list and
    /// [`ConfigError::InvalidLaneLength`] for a non-positive or non-finite length.
    pub fn new(lane_lengths: &[f64]) -> Result<Self> {
        if lane_lengths.is_empty() {
            return Err(ConfigError::NoLanes.into());
        }
        let mut lane_lengths = lane_lengths.to_vec();
        if lane_lengths.len() > MAX_LANES {
            warn!(
                requested = lane_lengths.len(),
                max = MAX_LANES,
                "lane count truncated"
            );
            lane_lengths.truncate(MAX_LANES);
        }
        for (lane, value) in lane_lengths.iter().enumerate() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(ConfigError::InvalidLaneLength {
                    lane,
                    value: *value,
                }
                .into());
            }
        }
        let stroke = StrokeStyle::new(lane_lengths.iter().sum())?;

        Ok(Self {
            lane_lengths,
            stroke,
            samples_per_lane: DEFAULT_SAMPLES_PER_LANE,
            filter_enabled: true,
            filter_distance: DEFAULT_FILTER_DISTANCE,
            lap_reset_distance: DEFAULT_LAP_RESET_DISTANCE,
            world: WorldParams::default(),
        })
    }

    /// Overrides the ribbon thickness.
    ///
    /// # Errors
    ///
    /// Returns an error if `thickness` is not a positive finite number.
    pub fn with_thickness(mut self, thickness: f64) -> Result<Self> {
        self.stroke = StrokeStyle::new(thickness)?;
        Ok(self)
    }

    /// Sets the interior control points per lane; zero falls back to the default.
    #[must_use]
    pub fn with_samples_per_lane(mut self, samples: usize) -> Self {
        self.samples_per_lane = if samples == 0 {
            DEFAULT_SAMPLES_PER_LANE
        } else {
            samples
        };
        self
    }

    /// Enables or disables the movement filter and sets its threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if `distance` is negative or not finite.
    pub fn with_movement_filter(mut self, enabled: bool, distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "filter_distance",
                value: distance,
                reason: "must be non-negative",
            }
            .into());
        }
        self.filter_enabled = enabled;
        self.filter_distance = distance;
        Ok(self)
    }

    /// Sets the jump distance that triggers a lap reset.
    ///
    /// # Errors
    ///
    /// Returns an error if `distance` is not a positive finite number.
    pub fn with_lap_reset_distance(mut self, distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "lap_reset_distance",
                value: distance,
                reason: "must be positive",
            }
            .into());
        }
        self.lap_reset_distance = distance;
        Ok(self)
    }

    /// Sets how many insertions a triangle must age before it can be hit.
    #[must_use]
    pub fn with_minimal_triangle_offset(mut self, offset: u32) -> Self {
        self.world.minimal_triangle_offset = offset;
        self
    }

    /// Replaces the spatial world shape.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WorldShape`] if the shape is invalid.
    pub fn with_world(mut self, world: WorldParams) -> Result<Self> {
        world.leaf_level()?;
        self.world = world;
        Ok(self)
    }

    #[must_use]
    pub fn lane_lengths(&self) -> &[f64] {
        &self.lane_lengths
    }

    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lane_lengths.len()
    }

    /// Sum of all lane lengths.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.lane_lengths.iter().sum()
    }

    #[must_use]
    pub fn stroke(&self) -> StrokeStyle {
        self.stroke
    }

    #[must_use]
    pub fn samples_per_lane(&self) -> usize {
        self.samples_per_lane
    }

    #[must_use]
    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    #[must_use]
    pub fn filter_distance(&self) -> f64 {
        self.filter_distance
    }

    #[must_use]
    pub fn lap_reset_distance(&self) -> f64 {
        self.lap_reset_distance
    }

    #[must_use]
    pub fn world(&self) -> &WorldParams {
        &self.world
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::LanetraceError;
    use approx::assert_abs_diff_eq;

    #[test]
    fn defaults_follow_lane_lengths() {
        let options = TrackerOptions::new(&[1.0, 2.0, 0.5]).unwrap();
        assert_eq!(options.lane_count(), 3);
        assert_abs_diff_eq!(options.stroke().thickness(), 3.5);
        assert_eq!(options.samples_per_lane(), DEFAULT_SAMPLES_PER_LANE);
        assert!(options.filter_enabled());
        assert_abs_diff_eq!(options.filter_distance(), DEFAULT_FILTER_DISTANCE);
        assert_abs_diff_eq!(options.lap_reset_distance(), DEFAULT_LAP_RESET_DISTANCE);
        assert_eq!(options.world(), &WorldParams::default());
    }

    #[test]
    fn too_many_lanes_are_truncated() {
        let options = TrackerOptions::new(&[0.1; 100]).unwrap();
        assert_eq!(options.lane_count(), MAX_LANES);
        assert_abs_diff_eq!(options.total_length(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn invalid_lanes_are_rejected() {
        assert!(matches!(
            TrackerOptions::new(&[]),
            Err(LanetraceError::Config(ConfigError::NoLanes))
        ));
        assert!(matches!(
            TrackerOptions::new(&[1.0, 0.0]),
            Err(LanetraceError::Config(ConfigError::InvalidLaneLength { lane: 1, .. }))
        ));
        assert!(TrackerOptions::new(&[f64::INFINITY]).is_err());
    }

    #[test]
    fn setters_validate() {
        let options = TrackerOptions::new(&[1.0]).unwrap();
        assert!(options.clone().with_thickness(-1.0).is_err());
        assert!(options.clone().with_movement_filter(true, -0.1).is_err());
        assert!(options.clone().with_lap_reset_distance(0.0).is_err());
        assert_eq!(options.clone().with_samples_per_lane(0).samples_per_lane(), 3);

        let bad_world = WorldParams {
            extent: 100.0,
            ..WorldParams::default()
        };
        assert!(options.clone().with_world(bad_world).is_err());

        let tuned = options
            .with_thickness(4.0)
            .unwrap()
            .with_movement_filter(false, 0.0)
            .unwrap()
            .with_minimal_triangle_offset(0);
        assert_abs_diff_eq!(tuned.stroke().thickness(), 4.0);
        assert!(!tuned.filter_enabled());
        assert_eq!(tuned.world().minimal_triangle_offset, 0);
    }
}
