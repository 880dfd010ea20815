use thiserror::Error;

/// Top-level error type for the lane tracing engine.
#[derive(Debug, Error)]
pub enum LanetraceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Errors raised while validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one lane is required")]
    NoLanes,

    #[error("lane {lane} has invalid length {value}")]
    InvalidLaneLength { lane: usize, value: f64 },

    #[error("parameter {parameter} = {value} is invalid: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid world shape: {0}")]
    WorldShape(String),
}

/// Errors related to lane masks.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("mask has {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("lane {lane} is out of range for {count} lanes")]
    LaneOutOfRange { lane: usize, count: usize },
}

/// Errors related to geographic input.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Convenience type alias for results using [`LanetraceError`].
pub type Result<T> = std::result::Result<T, LanetraceError>;
