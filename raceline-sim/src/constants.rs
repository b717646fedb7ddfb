//! Centralized tuning constants for the raceline simulation.
//!
//! These are the defaults behind [`crate::config::SimConfig`]. Structural
//! values (sensor count, fan geometry) are not configurable.

// Kinematics ---------------------------------------------------------------
pub(crate) const THROTTLE_GAIN: f64 = 0.07;
pub(crate) const DRAG_RATE: f64 = 0.02;
pub(crate) const STEER_GAIN: f64 = 0.0045;
pub(crate) const STEER_DECAY: f64 = 0.004;
pub(crate) const SPEED_MIN: f64 = 10.0;
pub(crate) const SPEED_MAX: f64 = 40.0;
pub(crate) const STEER_LIMIT: f64 = 0.75;
pub(crate) const DISTANCE_SCALE: f64 = 0.005;
pub(crate) const VEHICLE_LENGTH: f64 = 20.0;
pub(crate) const INITIAL_SPEED: f64 = 20.0;

// Sensors ------------------------------------------------------------------
pub const SENSOR_COUNT: usize = 5;
pub(crate) const SENSOR_FAN_START_DEG: f64 = -135.0;
pub(crate) const SENSOR_FAN_STEP_DEG: f64 = 45.0;
pub(crate) const PROXIMITY_THRESHOLD: f64 = 5.0;

// Reward -------------------------------------------------------------------
pub(crate) const REWARD_SCALE: f64 = 10_000.0;
pub(crate) const CRASH_PENALTY: f64 = 10.0;

// Policy -------------------------------------------------------------------
pub(crate) const LEARNED_OUTPUT_THRESHOLD: f64 = 0.5;
pub(crate) const LEARNED_IMPULSE: f64 = 2.0;

/// Observation width fed to decision functions: speed, steering, five sensors.
pub const OBSERVATION_SIZE: usize = 2 + SENSOR_COUNT;
/// Decision function output width: throttle, steering.
pub const ACTION_SIZE: usize = 2;

// Geometry -----------------------------------------------------------------
pub(crate) const MIN_CYCLE_VERTICES: usize = 3;
pub(crate) const BOUNDS_EPSILON: f64 = 1e-9;
