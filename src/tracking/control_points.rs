use crate::math::{left_normal, Point2, Vector2, TOLERANCE};
use crate::spatial::LaneClassifier;

use super::options::TrackerOptions;

/// A lane cross-section sample point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPoint {
    pub position: Point2,
    pub lane: usize,
}

/// Cross-section sample points laid across the ribbon at the tracked position.
///
/// The first point sits on the lane-0 edge at `position - normal * total / 2`,
/// where `normal` is the left normal of the movement direction. Each lane
/// then contributes `samples` evenly spaced interior points and the last
/// point sits on the far edge, tagged with the last lane.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlPoints {
    points: Vec<ControlPoint>,
}

impl ControlPoints {
    /// Lays the cross-section at `position` for movement along `direction`.
    ///
    /// A zero direction falls back to +X.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(position: Point2, direction: Vector2, options: &TrackerOptions) -> Self {
        let direction = direction
            .try_normalize(TOLERANCE)
            .unwrap_or_else(Vector2::x);
        let normal = left_normal(&direction);
        let half = options.total_length() * 0.5;
        let samples = options.samples_per_lane();
        let lane_lengths = options.lane_lengths();

        let mut points = Vec::with_capacity(lane_lengths.len() * samples + 2);
        let edge = position - normal * half;
        points.push(ControlPoint {
            position: edge,
            lane: 0,
        });

        let mut offset = 0.0;
        for (lane, len) in lane_lengths.iter().enumerate() {
            let spacing = len / (samples as f64 + 1.0);
            for k in 1..=samples {
                points.push(ControlPoint {
                    position: edge + normal * (offset + spacing * k as f64),
                    lane,
                });
            }
            offset += len;
        }

        points.push(ControlPoint {
            position: position + normal * half,
            lane: lane_lengths.len().saturating_sub(1),
        });
        Self { points }
    }

    /// The layout of a fresh session: at the origin, facing +X.
    #[must_use]
    pub fn initial(options: &TrackerOptions) -> Self {
        Self::build(Point2::origin(), Vector2::x(), options)
    }

    #[must_use]
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lane of the control point closest to `point`, or 0 when empty.
    #[must_use]
    pub fn nearest_lane(&self, point: &Point2) -> usize {
        self.points
            .iter()
            .map(|cp| (cp.lane, (cp.position - point).norm_squared()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(lane, _)| lane)
    }
}

impl LaneClassifier for ControlPoints {
    fn lane_at(&self, point: &Point2) -> usize {
        self.nearest_lane(point)
    }
}
