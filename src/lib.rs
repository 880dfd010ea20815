pub mod error;
pub mod geometry;
pub mod mask;
pub mod math;
pub mod spatial;
pub mod tessellation;
pub mod tracking;

pub use error::{LanetraceError, Result};
