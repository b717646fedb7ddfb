//! Static tuning configuration supplied once at startup.
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::ConfigError;

/// Gains, clamps and scales for the two-point bicycle model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicsConfig {
    #[serde(default = "KinematicsConfig::default_throttle_gain")]
    pub throttle_gain: f64,
    #[serde(default = "KinematicsConfig::default_drag_rate")]
    pub drag_rate: f64,
    #[serde(default = "KinematicsConfig::default_steer_gain")]
    pub steer_gain: f64,
    /// Self-centering rate applied to the steering angle every tick.
    #[serde(default = "KinematicsConfig::default_steer_decay")]
    pub steer_decay: f64,
    #[serde(default = "KinematicsConfig::default_speed_min")]
    pub speed_min: f64,
    #[serde(default = "KinematicsConfig::default_speed_max")]
    pub speed_max: f64,
    #[serde(default = "KinematicsConfig::default_steer_limit")]
    pub steer_limit: f64,
    /// Converts a raw tick delta into travelled distance and elapsed time.
    #[serde(default = "KinematicsConfig::default_distance_scale")]
    pub distance_scale: f64,
    #[serde(default = "KinematicsConfig::default_vehicle_length")]
    pub vehicle_length: f64,
    #[serde(default = "KinematicsConfig::default_initial_speed")]
    pub initial_speed: f64,
}

impl KinematicsConfig {
    const fn default_throttle_gain() -> f64 {
        constants::THROTTLE_GAIN
    }

    const fn default_drag_rate() -> f64 {
        constants::DRAG_RATE
    }

    const fn default_steer_gain() -> f64 {
        constants::STEER_GAIN
    }

    const fn default_steer_decay() -> f64 {
        constants::STEER_DECAY
    }

    const fn default_speed_min() -> f64 {
        constants::SPEED_MIN
    }

    const fn default_speed_max() -> f64 {
        constants::SPEED_MAX
    }

    const fn default_steer_limit() -> f64 {
        constants::STEER_LIMIT
    }

    const fn default_distance_scale() -> f64 {
        constants::DISTANCE_SCALE
    }

    const fn default_vehicle_length() -> f64 {
        constants::VEHICLE_LENGTH
    }

    const fn default_initial_speed() -> f64 {
        constants::INITIAL_SPEED
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("kinematics.throttle_gain", self.throttle_gain),
            ("kinematics.drag_rate", self.drag_rate),
            ("kinematics.steer_gain", self.steer_gain),
            ("kinematics.steer_decay", self.steer_decay),
        ] {
            min_violation(field, 0.0, value)?;
        }
        for (field, value) in [
            ("kinematics.speed_min", self.speed_min),
            ("kinematics.steer_limit", self.steer_limit),
            ("kinematics.distance_scale", self.distance_scale),
            ("kinematics.vehicle_length", self.vehicle_length),
        ] {
            not_above(field, 0.0, value)?;
        }
        if !self.speed_max.is_finite() || self.speed_min >= self.speed_max {
            return Err(ConfigError::SpeedBounds {
                min: self.speed_min,
                max: self.speed_max,
            });
        }
        let speed = self.initial_speed;
        if speed <= self.speed_min || !speed.is_finite() || speed > self.speed_max {
            return Err(ConfigError::RangeViolation {
                field: "kinematics.initial_speed",
                min: self.speed_min,
                max: self.speed_max,
                value: speed,
            });
        }
        Ok(())
    }
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            throttle_gain: Self::default_throttle_gain(),
            drag_rate: Self::default_drag_rate(),
            steer_gain: Self::default_steer_gain(),
            steer_decay: Self::default_steer_decay(),
            speed_min: Self::default_speed_min(),
            speed_max: Self::default_speed_max(),
            steer_limit: Self::default_steer_limit(),
            distance_scale: Self::default_distance_scale(),
            vehicle_length: Self::default_vehicle_length(),
            initial_speed: Self::default_initial_speed(),
        }
    }
}

/// Sensor tuning. The fan geometry itself is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Readings below this distance count as a collision.
    #[serde(default = "SensorConfig::default_proximity_threshold")]
    pub proximity_threshold: f64,
}

impl SensorConfig {
    const fn default_proximity_threshold() -> f64 {
        constants::PROXIMITY_THRESHOLD
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: Self::default_proximity_threshold(),
        }
    }
}

/// Fitness accrual and crash penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "RewardConfig::default_reward_scale")]
    pub reward_scale: f64,
    #[serde(default = "RewardConfig::default_crash_penalty")]
    pub crash_penalty: f64,
}

impl RewardConfig {
    const fn default_reward_scale() -> f64 {
        constants::REWARD_SCALE
    }

    const fn default_crash_penalty() -> f64 {
        constants::CRASH_PENALTY
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            reward_scale: Self::default_reward_scale(),
            crash_penalty: Self::default_crash_penalty(),
        }
    }
}

/// Complete simulation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SimConfig {
    #[serde(default)]
    pub kinematics: KinematicsConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub reward: RewardConfig,
}

impl SimConfig {
    /// Parse a configuration document held in memory. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values fail validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every bound the simulation relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.kinematics.validate()?;
        min_violation(
            "sensors.proximity_threshold",
            0.0,
            self.sensors.proximity_threshold,
        )?;
        not_above("reward.reward_scale", 0.0, self.reward.reward_scale)?;
        min_violation("reward.crash_penalty", 0.0, self.reward.crash_penalty)?;
        Ok(())
    }
}

fn min_violation(field: &'static str, min: f64, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(ConfigError::MinViolation { field, min, value })
    }
}

fn not_above(field: &'static str, min: f64, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > min {
        Ok(())
    } else {
        Err(ConfigError::NotAbove { field, min, value })
    }
}
