use thiserror::Error;

/// Errors raised when validating or loading a [SimConfig](crate::SimConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("speed variation must lie in [0, 1), got {0}")]
    SpeedVariation(f64),
    #[error("the density table must contain at least one interval")]
    EmptyDensityTable,
    #[error("the vehicle kind table must contain at least one entry")]
    NoVehicleKinds,
    #[error("the {direction} approach has no lanes")]
    NoLanes { direction: crate::Direction },
    #[error("removal bounds are inverted: {min} > {max}")]
    InvertedBounds { min: f64, max: f64 },
    #[error("simulation speed range is inverted: {min} > {max}")]
    InvertedSpeedRange { min: f64, max: f64 },
    #[cfg(feature = "serde")]
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}
