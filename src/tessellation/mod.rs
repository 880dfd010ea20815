pub mod joint;
pub mod ribbon;
mod stroke_style;

pub use joint::{triangle_fan, EdgePair, Joint, MIN_JOINT_ANGLE};
pub use ribbon::{RibbonBuilder, RibbonSegment, RibbonState, SegmentState};
pub use stroke_style::StrokeStyle;

use crate::math::Point2;

/// A planar triangle given by its three corners.
pub type Triangle2 = [Point2; 3];

/// Destination for committed triangles.
///
/// Every committed triangle passes through exactly one `commit` call, which
/// makes the sink the single place to number triangles and index them.
pub trait TriangleSink {
    fn commit(&mut self, triangle: Triangle2);
}

impl TriangleSink for Vec<Triangle2> {
    fn commit(&mut self, triangle: Triangle2) {
        self.push(triangle);
    }
}
