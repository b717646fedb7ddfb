//! Raceline Simulation Engine
//!
//! Deterministic 2D driving simulation for evolving vehicle controllers.
//! Vehicles follow a bicycle model, sense walls through a fan of ray casts,
//! and accrue fitness for sustained speed. Rendering and the learning
//! algorithm live outside this crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod fitness;
pub mod generation;
pub mod geometry;
pub mod numbers;
pub mod policy;
pub mod raycast;
pub mod sensors;
pub mod track;
pub mod vehicle;

// Re-export commonly used types
pub use config::{KinematicsConfig, RewardConfig, SensorConfig, SimConfig};
pub use constants::{ACTION_SIZE, OBSERVATION_SIZE, SENSOR_COUNT};
pub use error::{ConfigError, SimError, TrackError};
pub use fitness::{FitnessAccumulator, FitnessEvaluator};
pub use generation::{
    AbortSignal, CrashEvents, EndReason, EntrantSummary, FixedClock, GenerationOutcome,
    GenerationRunner, GenerationSession, StopCondition, TickClock, TickReport,
};
pub use geometry::{Boundary, Point, WallSegment, WallStore};
pub use policy::{
    DecisionFunction, DirectionalInput, HumanPolicy, InputDevice, LearnedPolicy, Observation,
    PolicyProvider, discretize,
};
pub use raycast::{RayHit, cast, cast_hit};
pub use sensors::{SensorArray, SensorRay};
pub use track::{StartPose, Track, TrackLayout};
pub use vehicle::{ControlInput, CrashCause, StepOutcome, Vehicle, VehicleStatus};
