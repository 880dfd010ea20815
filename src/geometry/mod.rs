pub mod segment;

pub use segment::{LineSegment, PolySegment};
