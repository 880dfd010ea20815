mod control_points;
mod coordinate;
mod options;
mod orientation;
mod snapshot;

pub use control_points::{ControlPoint, ControlPoints};
pub use coordinate::{GeoCoordinate, EARTH_MEAN_RADIUS};
pub use options::{
    TrackerOptions, DEFAULT_FILTER_DISTANCE, DEFAULT_LAP_RESET_DISTANCE, DEFAULT_SAMPLES_PER_LANE,
};
pub use orientation::{bearing_of, direction_of, Orientation};
pub use snapshot::TrackerSnapshot;

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::mask::LaneMask;
use crate::math::{direction, Point2, Vector2};
use crate::spatial::{VoxelWorld, BASE_ELEVATION, ELEVATION_OFFSET};
use crate::tessellation::{RibbonBuilder, Triangle2, TriangleSink};

/// Elevation added above the current draw elevation for committed triangles.
pub const TRIANGLE_ELEVATION_STEP: f64 = 0.01;

/// One flipped bit of the published hit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneChange {
    pub lane: usize,
    /// The new value of the lane bit.
    pub value: bool,
}

/// Outcome of a position update.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    /// The fix was accepted (first fix of a lap or an unfiltered movement).
    pub changed: bool,
    /// The fix jumped far enough to start a new lap.
    pub lap_reset: bool,
    pub position: Point2,
    pub hit_mask: LaneMask,
    pub lane_changes: Vec<LaneChange>,
}

/// A stored fix replayed by [`Tracker::bulk_load`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathRecord {
    pub coordinate: GeoCoordinate,
    /// Movement mask bytes as persisted, `ceil(lane_count / 8)` long.
    pub movement_mask: Vec<u8>,
    /// Lane count the mask was recorded with.
    pub lane_count: usize,
}

/// Result of a bulk load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSummary {
    pub replayed: usize,
    /// Records with invalid coordinates.
    pub skipped: usize,
    /// Position before the last accepted movement.
    pub previous_position: Point2,
    pub position: Point2,
    pub min_elevation: f64,
}

/// Consistent view of the published orientation state.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationReport {
    pub orientation: Orientation,
    pub control_points: ControlPoints,
    pub hit_mask: LaneMask,
    pub movement_mask: LaneMask,
    /// Lowest elevation the renderer should draw new geometry at.
    pub min_elevation: f64,
}

/// Commit choke point: numbers each triangle and stores it in the world.
struct WorldSink<'a> {
    world: &'a mut VoxelWorld,
    counter: &'a mut u32,
    hit: &'a LaneMask,
    app: &'a LaneMask,
    elevation: f64,
    classifier: &'a ControlPoints,
}

impl TriangleSink for WorldSink<'_> {
    fn commit(&mut self, triangle: Triangle2) {
        *self.counter = self.counter.saturating_add(1);
        self.world.insert_triangle(
            &triangle,
            self.hit,
            self.app,
            *self.counter,
            self.elevation,
            self.classifier,
        );
    }
}

#[derive(Debug)]
struct TrackingState {
    options: TrackerOptions,
    orientation: Orientation,
    control_points: ControlPoints,
    ribbon: RibbonBuilder,
    hit_mask: LaneMask,
    movement_mask: LaneMask,
    published_mask: LaneMask,
    triangle_counter: u32,
    current_elevation: f64,
    previous_fix: Option<GeoCoordinate>,
}

impl TrackingState {
    fn new(options: TrackerOptions) -> Self {
        let mut state = Self {
            control_points: ControlPoints::initial(&options),
            options,
            orientation: Orientation::default(),
            ribbon: RibbonBuilder::new(),
            hit_mask: LaneMask::new(),
            movement_mask: LaneMask::new(),
            published_mask: LaneMask::new(),
            triangle_counter: 0,
            current_elevation: BASE_ELEVATION,
            previous_fix: None,
        };
        state.start_lap();
        state
    }

    /// Clears per-lap state. The triangle counter and draw elevation carry over.
    fn start_lap(&mut self) {
        self.orientation = Orientation::default();
        self.control_points = ControlPoints::initial(&self.options);
        self.ribbon.start_at(Point2::origin());
        self.hit_mask.clear_all();
        self.movement_mask = LaneMask::with_lanes_on(self.options.lane_count());
    }

    fn min_elevation(&self) -> f64 {
        self.current_elevation + ELEVATION_OFFSET
    }

    fn accepts(&self, distance: f64) -> bool {
        !self.options.filter_enabled() || distance > self.options.filter_distance()
    }

    /// Applies a geographic fix. Returns `true` if it was accepted.
    fn apply_fix(&mut self, fix: GeoCoordinate, world: &RwLock<VoxelWorld>) -> bool {
        let Some(reference) = self.orientation.reference else {
            self.orientation.begin(fix);
            return true;
        };
        let distance = reference.distance_to(&fix);
        if !self.accepts(distance) {
            return false;
        }
        let direction = direction_of(reference.azimuth_to(&fix));
        let target = self.orientation.position + direction * distance;
        self.advance(target, direction, distance, world);
        self.orientation.reference = Some(fix);
        true
    }

    /// Applies a plane movement. Returns `true` if it was accepted.
    fn apply_point(&mut self, target: Point2, world: &RwLock<VoxelWorld>) -> bool {
        let Some(dir) = direction(&self.orientation.position, &target) else {
            return false;
        };
        let distance = (target - self.orientation.position).norm();
        if !self.accepts(distance) {
            return false;
        }
        self.advance(target, dir, distance, world);
        true
    }

    fn advance(
        &mut self,
        target: Point2,
        direction: Vector2,
        distance: f64,
        world: &RwLock<VoxelWorld>,
    ) {
        self.hit_mask.clear_all();
        write_world(world).update_center_voxel(&target);
        self.control_points = ControlPoints::build(target, direction, &self.options);

        {
            let world = read_world(world);
            for cp in self.control_points.points() {
                let query = world.intersects(
                    &cp.position,
                    self.triangle_counter,
                    self.options.lane_lengths(),
                );
                self.current_elevation = self.current_elevation.max(query.elevation);
                if query.hit && query.painted && self.movement_mask.get(cp.lane) {
                    self.hit_mask.set(cp.lane);
                }
            }
        }

        let stroke = self.options.stroke();
        let mut world = write_world(world);
        let mut sink = WorldSink {
            world: &mut world,
            counter: &mut self.triangle_counter,
            hit: &self.hit_mask,
            app: &self.movement_mask,
            elevation: self.current_elevation + TRIANGLE_ELEVATION_STEP,
            classifier: &self.control_points,
        };
        self.ribbon.insert_point(target, stroke, &mut sink);
        drop(world);

        self.orientation.advance(target, direction, distance);
        debug!(
            x = target.x,
            y = target.y,
            triangles = self.triangle_counter,
            "position advanced"
        );
    }

    /// Diffs the hit mask against the published one and publishes it.
    fn publish(&mut self) -> Vec<LaneChange> {
        let changes = self
            .published_mask
            .changes(&self.hit_mask)
            .map(|(lane, value)| LaneChange { lane, value })
            .collect();
        self.published_mask = self.hit_mask;
        changes
    }

    fn update(&self, changed: bool, lap_reset: bool, lane_changes: Vec<LaneChange>) -> PositionUpdate {
        PositionUpdate {
            changed,
            lap_reset,
            position: self.orientation.position,
            hit_mask: self.hit_mask,
            lane_changes,
        }
    }

    /// Movement mask for a stored record, or an empty one if it does not
    /// match the configured lanes.
    fn replay_mask(&self, record: &PathRecord) -> LaneMask {
        let lanes = self.options.lane_count();
        if record.lane_count != lanes {
            warn!(
                stored = record.lane_count,
                configured = lanes,
                "stored lane count differs, replaying without lane information"
            );
            return LaneMask::new();
        }
        LaneMask::from_bytes(&record.movement_mask, lanes).unwrap_or_else(|err| {
            warn!(%err, "stored movement mask rejected");
            LaneMask::new()
        })
    }
}

fn read_world(world: &RwLock<VoxelWorld>) -> RwLockReadGuard<'_, VoxelWorld> {
    world.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_world(world: &RwLock<VoxelWorld>) -> RwLockWriteGuard<'_, VoxelWorld> {
    world.write().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks one moving object and detects where its ribbon revisits itself.
///
/// The tracking state mutex is held for a whole update, so readers see the
/// state either before or after it. The world lock is taken after the state
/// mutex and only around voxel queries or mutation.
#[derive(Debug)]
pub struct Tracker {
    state: Mutex<TrackingState>,
    world: RwLock<VoxelWorld>,
}

impl Tracker {
    /// Creates a tracker with an empty world.
    ///
    /// # Errors
    ///
    /// Returns an error if the world shape in `options` is invalid.
    pub fn new(options: TrackerOptions) -> Result<Self> {
        let world = VoxelWorld::new(*options.world())?;
        Ok(Self {
            state: Mutex::new(TrackingState::new(options)),
            world: RwLock::new(world),
        })
    }

    /// Processes a geographic fix.
    ///
    /// A fix farther than the lap-reset distance from the previous one
    /// starts a new lap at the plane origin; the fix then counts as the
    /// first of that lap. Fixes closer than the movement filter threshold to
    /// the current reference are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`](crate::error::GeoError) for
    /// out-of-range or non-finite coordinates.
    pub fn update_position(&self, fix: GeoCoordinate) -> Result<PositionUpdate> {
        let fix = fix.validated()?;
        let mut state = self.lock_state();

        let lap_distance = state.options.lap_reset_distance();
        let lap_reset = state
            .previous_fix
            .is_some_and(|prev| prev.distance_to(&fix) > lap_distance);
        if lap_reset {
            info!(
                latitude = fix.latitude,
                longitude = fix.longitude,
                "position jump, starting a new lap"
            );
            state.start_lap();
        }
        state.previous_fix = Some(fix);

        let changed = state.apply_fix(fix, &self.world);
        let lane_changes = state.publish();
        Ok(state.update(changed, lap_reset, lane_changes))
    }

    /// Moves directly to a plane point, bypassing geographic conversion.
    pub fn advance_to(&self, target: Point2) -> PositionUpdate {
        let mut state = self.lock_state();
        let changed = state.apply_point(target, &self.world);
        let lane_changes = state.publish();
        state.update(changed, false, lane_changes)
    }

    /// Replays stored fixes, holding the tracking lock throughout.
    ///
    /// Lap resets are not detected and no lane changes are published. Each
    /// record's movement mask is installed before its fix is applied.
    pub fn bulk_load(&self, records: &[PathRecord]) -> LoadSummary {
        let mut state = self.lock_state();
        info!(records = records.len(), "bulk load started");

        let start = state.orientation.position;
        let mut summary = LoadSummary {
            replayed: 0,
            skipped: 0,
            previous_position: start,
            position: start,
            min_elevation: state.min_elevation(),
        };
        for record in records {
            if !record.coordinate.is_valid() {
                warn!(
                    latitude = record.coordinate.latitude,
                    longitude = record.coordinate.longitude,
                    "skipping stored fix with invalid coordinate"
                );
                summary.skipped += 1;
                continue;
            }
            state.movement_mask = state.replay_mask(record);
            let before = state.orientation.position;
            if state.apply_fix(record.coordinate, &self.world) {
                summary.previous_position = before;
            }
            state.previous_fix = Some(record.coordinate);
            summary.replayed += 1;
        }
        summary.position = state.orientation.position;
        summary.min_elevation = state.min_elevation();

        info!(
            replayed = summary.replayed,
            skipped = summary.skipped,
            triangles = state.triangle_counter,
            "bulk load finished"
        );
        summary
    }

    /// Turns one lane of the movement mask on or off.
    ///
    /// Returns `false`, changing nothing, for lanes outside the configured count.
    pub fn set_lane_state(&self, lane: usize, on: bool) -> bool {
        let mut state = self.lock_state();
        if lane >= state.options.lane_count() {
            return false;
        }
        state.movement_mask.assign(lane, on);
        true
    }

    /// Replaces the movement mask.
    pub fn set_movement_mask(&self, mask: LaneMask) {
        self.lock_state().movement_mask = mask;
    }

    /// Installs new options.
    ///
    /// Both masks are zeroed, the movement mask is rebuilt with every lane
    /// on and the control points are re-derived at the current position. A
    /// changed world shape replaces the world, dropping all triangles.
    ///
    /// # Errors
    ///
    /// Returns an error if the new world shape is invalid.
    pub fn reconfigure(&self, options: TrackerOptions) -> Result<()> {
        let mut state = self.lock_state();
        if options.world() != state.options.world() {
            let world = VoxelWorld::new(*options.world())?;
            *write_world(&self.world) = world;
            info!("world shape changed, spatial index rebuilt");
        }
        state.options = options;
        state.hit_mask.clear_all();
        state.movement_mask = LaneMask::with_lanes_on(state.options.lane_count());
        let control_points = ControlPoints::build(
            state.orientation.position,
            state.orientation.direction,
            &state.options,
        );
        state.control_points = control_points;
        Ok(())
    }

    /// Current orientation, control points and masks in one consistent view.
    ///
    /// With `clear_changed` the `changed` flag is reset after it is read.
    pub fn orientation(&self, clear_changed: bool) -> OrientationReport {
        let mut state = self.lock_state();
        let report = OrientationReport {
            orientation: state.orientation.clone(),
            control_points: state.control_points.clone(),
            hit_mask: state.hit_mask,
            movement_mask: state.movement_mask,
            min_elevation: state.min_elevation(),
        };
        if clear_changed {
            state.orientation.changed = false;
        }
        report
    }

    #[must_use]
    pub fn options(&self) -> TrackerOptions {
        self.lock_state().options.clone()
    }

    #[must_use]
    pub fn control_points(&self) -> ControlPoints {
        self.lock_state().control_points.clone()
    }

    #[must_use]
    pub fn hit_mask(&self) -> LaneMask {
        self.lock_state().hit_mask
    }

    #[must_use]
    pub fn movement_mask(&self) -> LaneMask {
        self.lock_state().movement_mask
    }

    /// Number of triangles committed so far.
    #[must_use]
    pub fn triangle_counter(&self) -> u32 {
        self.lock_state().triangle_counter
    }

    /// Triangles of the newest, still revisable ribbon segment.
    #[must_use]
    pub fn provisional_triangles(&self) -> Vec<Triangle2> {
        self.lock_state().ribbon.provisional_triangles()
    }

    /// Commits the provisional segment. Returns the number of triangles committed.
    pub fn finish_path(&self) -> u32 {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let before = state.triangle_counter;
        let mut world = write_world(&self.world);
        let mut sink = WorldSink {
            world: &mut world,
            counter: &mut state.triangle_counter,
            hit: &state.hit_mask,
            app: &state.movement_mask,
            elevation: state.current_elevation + TRIANGLE_ELEVATION_STEP,
            classifier: &state.control_points,
        };
        state.ribbon.promote(&mut sink);
        state.triangle_counter - before
    }

    /// Drops the provisional segment so the next point replaces it.
    pub fn withdraw_provisional(&self) -> bool {
        self.lock_state().ribbon.withdraw().is_some()
    }

    /// Runs `f` with read access to the voxel world, e.g. for rendering.
    ///
    /// The read lock is held only for the duration of `f`. Updates take the
    /// state mutex before the world lock, so `f` must not call back into this
    /// tracker; anything it needs from the tracking state should be fetched
    /// before or after.
    pub fn with_world<R>(&self, f: impl FnOnce(&VoxelWorld) -> R) -> R {
        f(&read_world(&self.world))
    }

    /// Drops every voxel and triangle.
    pub fn reset_world(&self) {
        write_world(&self.world).clear();
        info!("spatial index cleared");
    }

    #[must_use]
    pub fn snapshot(&self) -> TrackerSnapshot {
        let state = self.lock_state();
        TrackerSnapshot {
            ribbon: state.ribbon.snapshot(),
            orientation: state.orientation.clone(),
            hit_mask: state.hit_mask,
            movement_mask: state.movement_mask,
            published_mask: state.published_mask,
            triangle_counter: state.triangle_counter,
            current_elevation: state.current_elevation,
            previous_fix: state.previous_fix,
        }
    }

    /// Restores a snapshot and re-derives the control points from it.
    pub fn restore(&self, snapshot: TrackerSnapshot) {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        state.ribbon.restore(snapshot.ribbon);
        state.control_points = ControlPoints::build(
            snapshot.orientation.position,
            snapshot.orientation.direction,
            &state.options,
        );
        state.orientation = snapshot.orientation;
        state.hit_mask = snapshot.hit_mask;
        state.movement_mask = snapshot.movement_mask;
        state.published_mask = snapshot.published_mask;
        state.triangle_counter = snapshot.triangle_counter;
        state.current_elevation = snapshot.current_elevation;
        state.previous_fix = snapshot.previous_fix;
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const BASE: GeoCoordinate = GeoCoordinate {
        latitude: 45.0,
        longitude: 7.0,
    };

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn north(metres: f64) -> GeoCoordinate {
        GeoCoordinate::new(
            BASE.latitude + (metres / EARTH_MEAN_RADIUS).to_degrees(),
            BASE.longitude,
        )
    }

    fn three_lanes() -> TrackerOptions {
        TrackerOptions::new(&[1.0, 1.0, 1.0])
            .unwrap()
            .with_minimal_triangle_offset(0)
    }

    fn tracker() -> Tracker {
        init_tracing();
        Tracker::new(three_lanes()).unwrap()
    }

    /// Up the y axis and back across the first segment.
    fn cross_back(tracker: &Tracker) -> PositionUpdate {
        assert!(!tracker.advance_to(Point2::new(0.0, 0.0)).changed);
        assert!(tracker.advance_to(Point2::new(0.0, 1.0)).changed);
        assert!(tracker.advance_to(Point2::new(0.0, 2.0)).changed);
        tracker.advance_to(Point2::new(0.0, 0.5))
    }

    #[test]
    fn crossing_reports_middle_lane_hit() {
        let tracker = tracker();
        let update = cross_back(&tracker);

        assert!(update.changed);
        assert!(update.hit_mask.get(1));
        assert!(update
            .lane_changes
            .contains(&LaneChange { lane: 1, value: true }));

        let report = tracker.orientation(false);
        assert!(report.min_elevation > BASE_ELEVATION + ELEVATION_OFFSET);
        assert_abs_diff_eq!(
            report.min_elevation,
            BASE_ELEVATION + TRIANGLE_ELEVATION_STEP + 2.0 * ELEVATION_OFFSET,
            epsilon = 1e-12
        );
    }

    #[test]
    fn leaving_the_crossing_turns_lanes_off() {
        let tracker = tracker();
        cross_back(&tracker);
        let update = tracker.advance_to(Point2::new(0.0, -3.0));
        assert!(update.hit_mask.is_empty());
        assert!(update
            .lane_changes
            .contains(&LaneChange { lane: 1, value: false }));
        assert!(update.lane_changes.iter().all(|c| !c.value));
    }

    #[test]
    fn disabled_lane_is_not_flagged() {
        let tracker = tracker();
        assert!(tracker.set_lane_state(1, false));
        assert!(!tracker.set_lane_state(3, true));
        let update = cross_back(&tracker);
        assert!(!update.hit_mask.get(1));
    }

    #[test]
    fn fresh_triangles_never_hit_with_default_offset() {
        init_tracing();
        let tracker = Tracker::new(TrackerOptions::new(&[1.0, 1.0, 1.0]).unwrap()).unwrap();
        let update = cross_back(&tracker);
        assert!(update.hit_mask.is_empty());
        assert!(update.lane_changes.is_empty());
    }

    #[test]
    fn movement_filter_ignores_jitter() {
        let tracker = tracker();
        let first = tracker.update_position(BASE).unwrap();
        assert!(first.changed);
        assert_eq!(first.position, Point2::origin());
        assert!(tracker.orientation(true).orientation.changed);

        tracker.update_position(north(1.0)).unwrap();
        let counter = tracker.triangle_counter();
        let provisional = tracker.provisional_triangles();

        let jitter = tracker.update_position(north(1.1)).unwrap();
        assert!(!jitter.changed);
        assert!(jitter.lane_changes.is_empty());
        assert_eq!(tracker.triangle_counter(), counter);
        assert_eq!(tracker.provisional_triangles(), provisional);
        assert_abs_diff_eq!(jitter.position.y, 1.0, epsilon = 1e-6);

        let moved = tracker.update_position(north(3.0)).unwrap();
        assert!(moved.changed);
        assert_abs_diff_eq!(moved.position.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(moved.position.y, 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(tracker.orientation(false).orientation.bearing, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn invalid_fix_is_rejected() {
        let tracker = tracker();
        assert!(tracker
            .update_position(GeoCoordinate::new(95.0, 0.0))
            .is_err());
    }

    #[test]
    fn lap_reset_rearms_state() {
        let tracker = tracker();
        for metres in [0.0, 1.0, 2.0, 0.5] {
            tracker.update_position(north(metres)).unwrap();
        }
        assert!(!tracker.hit_mask().is_empty());
        tracker.set_lane_state(0, false);
        let counter = tracker.triangle_counter();
        assert!(counter > 0);

        let jump = tracker.update_position(north(40.0)).unwrap();
        assert!(jump.lap_reset);
        assert!(jump.changed);
        assert!(jump.hit_mask.is_empty());
        assert_eq!(jump.position, Point2::origin());
        assert!(jump.lane_changes.iter().all(|c| !c.value));

        let report = tracker.orientation(false);
        assert_eq!(report.control_points, ControlPoints::initial(&three_lanes()));
        assert_eq!(report.movement_mask, LaneMask::with_lanes_on(3));
        assert!(tracker.provisional_triangles().is_empty());
        assert_eq!(tracker.triangle_counter(), counter);
    }

    #[test]
    fn bulk_load_replays_with_stored_masks() {
        let tracker = tracker();
        let records: Vec<PathRecord> = [0.0, 1.0, 2.0, 0.5]
            .iter()
            .map(|m| PathRecord {
                coordinate: north(*m),
                movement_mask: vec![0b111],
                lane_count: 3,
            })
            .collect();
        let summary = tracker.bulk_load(&records);
        assert_eq!(summary.replayed, 4);
        assert_abs_diff_eq!(summary.previous_position.y, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(summary.position.y, 0.5, epsilon = 1e-6);
        assert!(tracker.hit_mask().get(1));
        assert!(summary.min_elevation > BASE_ELEVATION + ELEVATION_OFFSET);
    }

    #[test]
    fn bulk_load_mismatched_lane_count_drops_lane_information() {
        let tracker = tracker();
        let mut records: Vec<PathRecord> = [0.0, 1.0, 2.0, 0.5]
            .iter()
            .map(|m| PathRecord {
                coordinate: north(*m),
                movement_mask: vec![0b1_1111],
                lane_count: 5,
            })
            .collect();
        records.push(PathRecord {
            coordinate: GeoCoordinate::new(f64::NAN, 0.0),
            movement_mask: vec![0b111],
            lane_count: 3,
        });
        let summary = tracker.bulk_load(&records);
        assert_eq!(summary.replayed, 4);
        assert_eq!(summary.skipped, 1);
        assert!(tracker.hit_mask().is_empty());
        assert!(tracker.movement_mask().is_empty());
        assert!(tracker.triangle_counter() > 0);
    }

    #[test]
    fn reconfigure_resets_masks_and_lanes() {
        let tracker = tracker();
        cross_back(&tracker);
        let options = TrackerOptions::new(&[0.5, 0.5])
            .unwrap()
            .with_minimal_triangle_offset(0);
        tracker.reconfigure(options.clone()).unwrap();

        let report = tracker.orientation(false);
        assert!(report.hit_mask.is_empty());
        assert_eq!(report.movement_mask, LaneMask::with_lanes_on(2));
        assert_eq!(
            report.control_points,
            ControlPoints::build(Point2::new(0.0, 0.5), report.orientation.direction, &options)
        );
        // Same world shape: triangles survive.
        assert!(tracker.with_world(|w| w.containers().next().is_some()));

        let moved = options.with_world(crate::spatial::WorldParams {
            extent: 2560.0,
            ..crate::spatial::WorldParams::default()
        });
        tracker.reconfigure(moved.unwrap()).unwrap();
        assert!(tracker.with_world(|w| w.containers().next().is_none()));
    }

    #[test]
    fn finish_and_withdraw_provisional_segment() {
        let tracker = tracker();
        tracker.advance_to(Point2::new(2.0, 0.0));
        assert_eq!(tracker.provisional_triangles().len(), 2);
        assert!(tracker.withdraw_provisional());
        assert!(tracker.provisional_triangles().is_empty());
        assert!(!tracker.withdraw_provisional());

        tracker.advance_to(Point2::new(4.0, 0.0));
        assert_eq!(tracker.finish_path(), 2);
        assert_eq!(tracker.triangle_counter(), 2);
        assert_eq!(tracker.finish_path(), 0);
        assert_eq!(tracker.with_world(VoxelWorld::listed_count), 2);
    }

    #[test]
    fn snapshot_restores_into_fresh_tracker() {
        let a = tracker();
        for metres in [0.0, 1.0, 2.0] {
            a.update_position(north(metres)).unwrap();
        }
        let snapshot = a.snapshot();

        let b = tracker();
        b.restore(snapshot.clone());
        assert_eq!(b.snapshot(), snapshot);
        assert_eq!(b.control_points(), a.control_points());

        let ua = a.update_position(north(4.0)).unwrap();
        let ub = b.update_position(north(4.0)).unwrap();
        assert_eq!(ua.position, ub.position);
        assert_eq!(a.provisional_triangles(), b.provisional_triangles());
        assert_eq!(a.triangle_counter(), b.triangle_counter());
    }

    #[test]
    fn reset_world_drops_triangles() {
        let tracker = tracker();
        cross_back(&tracker);
        assert!(tracker.with_world(VoxelWorld::listed_count) > 0);
        tracker.reset_world();
        assert_eq!(tracker.with_world(VoxelWorld::listed_count), 0);
        assert_eq!(tracker.with_world(VoxelWorld::voxel_count), 1);
    }

    #[test]
    fn world_readers_run_alongside_updates() {
        let tracker = tracker();
        let before = tracker.with_world(VoxelWorld::listed_count);
        // No guard outlives the closure, so the update can take the write lock.
        tracker.update_position(north(0.0)).unwrap();

        std::thread::scope(|scope| {
            let reader = scope.spawn(|| {
                (0..200)
                    .map(|_| tracker.with_world(VoxelWorld::listed_count))
                    .max()
                    .unwrap_or(0)
            });
            for step in 1..=20 {
                tracker.update_position(north(f64::from(step))).unwrap();
            }
            assert!(reader.join().unwrap() >= before);
        });
        assert!(tracker.with_world(VoxelWorld::listed_count) > before);
        assert!(tracker.triangle_counter() > 0);
    }
}
