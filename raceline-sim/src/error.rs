//! Error types for track construction and configuration validation.
use thiserror::Error;

/// Errors raised when track geometry cannot define a drivable corridor.
#[derive(Debug, Error, PartialEq)]
pub enum TrackError {
    #[error("{boundary} boundary needs at least {min} vertices (got {got})")]
    TooFewVertices {
        boundary: &'static str,
        min: usize,
        got: usize,
    },
    #[error("{boundary} boundary vertex {index} is not finite")]
    NonFiniteVertex {
        boundary: &'static str,
        index: usize,
    },
    #[error("{boundary} boundary collapses to {segments} non-degenerate segments (need {min})")]
    CollapsedCycle {
        boundary: &'static str,
        segments: usize,
        min: usize,
    },
    #[error("start pose ({x:.2}, {y:.2}, heading {heading:.2}) is not finite")]
    NonFiniteStart { x: f64, y: f64, heading: f64 },
}

/// Errors raised when simulation configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min:.4} (got {value:.4})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be greater than {min:.4} (got {value:.4})")]
    NotAbove {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.4} and {max:.4} (got {value:.4})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("speed floor {min:.2} must be below speed ceiling {max:.2}")]
    SpeedBounds { min: f64, max: f64 },
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Top-level error for constructing a simulation.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
