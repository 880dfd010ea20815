use crate::geometry::PolySegment;
use crate::math::{vec2_eq, Point2};

use super::joint::{EdgePair, Joint};
use super::stroke_style::StrokeStyle;
use super::{Triangle2, TriangleSink};

/// Whether a ribbon segment's triangles have reached the sink yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentState {
    /// Still revisable; drawn from [`RibbonBuilder::provisional_triangles`].
    Provisional,
    /// Emitted through the sink, never touched again.
    Committed,
}

/// The newest ribbon segment together with the edge points its quad starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RibbonSegment {
    pub poly: PolySegment,
    pub start: EdgePair,
    pub state: SegmentState,
}

impl RibbonSegment {
    /// The quad as two triangles ending at `end`.
    #[must_use]
    pub fn quad(&self, end: EdgePair) -> [Triangle2; 2] {
        let (start1, start2) = self.start;
        let (end1, end2) = end;
        [[start1, start2, end1], [end1, start2, end2]]
    }

    /// The segment's own far edge points.
    #[must_use]
    pub fn natural_end(&self) -> EdgePair {
        (self.poly.edge1.b, self.poly.edge2.b)
    }
}

/// Resumable generator state.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RibbonState {
    /// Last accepted path point.
    pub last_point: Option<Point2>,
    /// The newest segment, always provisional while present.
    pub pending: Option<RibbonSegment>,
    /// Start edge points kept after a withdrawal so the ribbon stays closed.
    pub carry_start: Option<EdgePair>,
}

/// Incremental ribbon mesher.
///
/// The newest segment stays provisional. It is committed, with its final
/// joint geometry, when the next point arrives or on [`promote`](Self::promote).
/// Joint fans are committed before the quad they follow.
#[derive(Debug, Clone, Default)]
pub struct RibbonBuilder {
    state: RibbonState,
}

impl RibbonBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted path point.
    #[must_use]
    pub fn last_point(&self) -> Option<Point2> {
        self.state.last_point
    }

    /// The provisional segment, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&RibbonSegment> {
        self.state.pending.as_ref()
    }

    /// Appends a path point.
    ///
    /// A point equal to the previous one is ignored. Returns `true` when a new
    /// provisional segment was created.
    pub fn insert_point<S: TriangleSink + ?Sized>(
        &mut self,
        point: Point2,
        style: StrokeStyle,
        sink: &mut S,
    ) -> bool {
        let Some(last) = self.state.last_point else {
            self.state.last_point = Some(point);
            return false;
        };
        if vec2_eq(&last, &point) {
            return false;
        }
        let Some(poly) = PolySegment::new(last, point, style.half_thickness()) else {
            return false;
        };

        let start = match self.state.pending.take() {
            Some(prev) => match Joint::between(&prev.poly, &poly) {
                Some(joint) => {
                    for tri in joint.fan {
                        sink.commit(tri);
                    }
                    Self::commit_segment(&prev, joint.end, sink);
                    joint.next_start
                }
                None => {
                    Self::commit_segment(&prev, prev.natural_end(), sink);
                    (poly.edge1.a, poly.edge2.a)
                }
            },
            None => self
                .state
                .carry_start
                .take()
                .unwrap_or((poly.edge1.a, poly.edge2.a)),
        };

        self.state.pending = Some(RibbonSegment {
            poly,
            start,
            state: SegmentState::Provisional,
        });
        self.state.last_point = Some(point);
        true
    }

    /// Feeds every point of `points` in order, committing all but the final segment.
    ///
    /// Returns the number of segments created.
    pub fn create_path<S: TriangleSink + ?Sized>(
        &mut self,
        points: &[Point2],
        style: StrokeStyle,
        sink: &mut S,
    ) -> usize {
        let mut created = 0;
        for point in points {
            if self.insert_point(*point, style, sink) {
                created += 1;
            }
        }
        created
    }

    /// Commits the provisional segment with its own far edge as the end.
    ///
    /// The next inserted point starts a fresh segment without a joint.
    pub fn promote<S: TriangleSink + ?Sized>(&mut self, sink: &mut S) -> Option<RibbonSegment> {
        let mut seg = self.state.pending.take()?;
        Self::commit_segment(&seg, seg.natural_end(), sink);
        seg.state = SegmentState::Committed;
        self.state.carry_start = None;
        Some(seg)
    }

    /// Drops the provisional segment and rewinds to its start point.
    pub fn withdraw(&mut self) -> Option<RibbonSegment> {
        let seg = self.state.pending.take()?;
        self.state.last_point = Some(seg.poly.center.a);
        self.state.carry_start = Some(seg.start);
        Some(seg)
    }

    /// Triangles of the provisional segment, for drawing only.
    #[must_use]
    pub fn provisional_triangles(&self) -> Vec<Triangle2> {
        self.state
            .pending
            .as_ref()
            .map(|seg| seg.quad(seg.natural_end()).to_vec())
            .unwrap_or_default()
    }

    /// Forgets every point and segment.
    pub fn reset(&mut self) {
        self.state = RibbonState::default();
    }

    /// Resets and seeds `point` as the first path point.
    pub fn start_at(&mut self, point: Point2) {
        self.state = RibbonState {
            last_point: Some(point),
            ..RibbonState::default()
        };
    }

    #[must_use]
    pub fn snapshot(&self) -> RibbonState {
        self.state.clone()
    }

    pub fn restore(&mut self, state: RibbonState) {
        self.state = state;
    }

    fn commit_segment<S: TriangleSink + ?Sized>(seg: &RibbonSegment, end: EdgePair, sink: &mut S) {
        for tri in seg.quad(end) {
            sink.commit(tri);
        }
    }
}
