//! Vehicle state and the two-point bicycle integrator.
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::geometry::{Point, WallSegment};
use crate::numbers::sanitize_dt;
use crate::sensors::SensorArray;
use crate::track::StartPose;

/// Why a vehicle stopped for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    /// Speed fell to the clamp floor.
    Stall,
    /// A sensor reading dropped below the proximity threshold.
    Collision,
}

impl CrashCause {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stall => "stall",
            Self::Collision => "collision",
        }
    }
}

/// Lifecycle state. `Crashed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    Alive,
    Crashed(CrashCause),
}

/// Control deltas for one tick. Components are usually in `{-1, 0, 1}` for
/// human input or `{-2, 0, 2}` for learned policies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlInput {
    pub throttle: f64,
    pub steer: f64,
}

impl ControlInput {
    #[must_use]
    pub const fn new(throttle: f64, steer: f64) -> Self {
        Self { throttle, steer }
    }

    /// Replace non-finite components with zero.
    #[must_use]
    pub const fn sanitized(self) -> Self {
        Self {
            throttle: if self.throttle.is_finite() {
                self.throttle
            } else {
                0.0
            },
            steer: if self.steer.is_finite() {
                self.steer
            } else {
                0.0
            },
        }
    }
}

/// What a single call to [`Vehicle::integrate`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The vehicle had already crashed; nothing changed.
    Inactive,
    /// The vehicle moved and is still alive.
    Moved { scaled_dt: f64, avg_speed: f64 },
    /// The vehicle crashed during this tick.
    Crashed(CrashCause),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    position: Point,
    heading: f64,
    steer_angle: f64,
    speed: f64,
    elapsed: f64,
    avg_speed: f64,
    distance_travelled: f64,
    status: VehicleStatus,
    sensors: SensorArray,
}

impl Vehicle {
    /// Place a vehicle at `start` with readings already taken from that pose.
    #[must_use]
    pub fn spawn(start: StartPose, config: &SimConfig, walls: &[WallSegment]) -> Self {
        let position = start.position();
        let mut sensors = SensorArray::new(position);
        sensors.recompute(position, start.heading, walls);
        Self {
            position,
            heading: start.heading,
            steer_angle: 0.0,
            speed: config.kinematics.initial_speed,
            elapsed: 0.0,
            avg_speed: 0.0,
            distance_travelled: 0.0,
            status: VehicleStatus::Alive,
            sensors,
        }
    }

    /// Advance one tick of `dt` raw time units under `control`.
    ///
    /// Does nothing once the vehicle has crashed.
    pub fn integrate(
        &mut self,
        control: ControlInput,
        dt: f64,
        walls: &[WallSegment],
        config: &SimConfig,
    ) -> StepOutcome {
        if self.is_crashed() {
            return StepOutcome::Inactive;
        }
        let k = &config.kinematics;
        let dt = sanitize_dt(dt);
        let control = control.sanitized();

        self.speed += control.throttle * k.throttle_gain * dt;
        self.speed -= k.drag_rate * dt;
        self.steer_angle += control.steer * k.steer_gain * dt;
        self.steer_angle = decay_toward_zero(self.steer_angle, k.steer_decay * dt);

        self.speed = self.speed.clamp(k.speed_min, k.speed_max);
        self.steer_angle = self.steer_angle.clamp(-k.steer_limit, k.steer_limit);
        if self.speed <= k.speed_min {
            self.speed = k.speed_min;
            self.crash(CrashCause::Stall);
            return StepOutcome::Crashed(CrashCause::Stall);
        }

        let scaled_dt = dt * k.distance_scale;
        let travel = self.speed * scaled_dt;
        let axis = Point::from_angle(self.heading);
        let wheel = Point::from_angle(self.heading + self.steer_angle);
        let half_length = k.vehicle_length / 2.0;

        let front = self.position + axis * half_length + wheel * travel;
        let back = self.position - axis * half_length + axis * travel;
        let next = front.midpoint(back);
        self.distance_travelled += self.position.distance(next);
        self.position = next;
        self.heading = (front.y - back.y).atan2(front.x - back.x);

        let previous_elapsed = self.elapsed;
        self.elapsed += scaled_dt;
        self.avg_speed = if self.elapsed > 0.0 {
            previous_elapsed.mul_add(self.avg_speed, self.speed * scaled_dt) / self.elapsed
        } else {
            self.speed
        };

        self.sensors.recompute(self.position, self.heading, walls);
        if self.sensors.any_below(config.sensors.proximity_threshold) {
            self.crash(CrashCause::Collision);
            return StepOutcome::Crashed(CrashCause::Collision);
        }

        StepOutcome::Moved {
            scaled_dt,
            avg_speed: self.avg_speed,
        }
    }

    /// Transition to `Crashed`. Returns `false` if the vehicle had already crashed.
    pub fn crash(&mut self, cause: CrashCause) -> bool {
        if self.is_crashed() {
            return false;
        }
        self.status = VehicleStatus::Crashed(cause);
        true
    }

    #[must_use]
    pub const fn is_crashed(&self) -> bool {
        matches!(self.status, VehicleStatus::Crashed(_))
    }

    #[must_use]
    pub const fn status(&self) -> VehicleStatus {
        self.status
    }

    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub const fn heading(&self) -> f64 {
        self.heading
    }

    #[must_use]
    pub const fn steer_angle(&self) -> f64 {
        self.steer_angle
    }

    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Scaled simulated time this vehicle has been moving.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[must_use]
    pub const fn avg_speed(&self) -> f64 {
        self.avg_speed
    }

    #[must_use]
    pub const fn distance_travelled(&self) -> f64 {
        self.distance_travelled
    }

    #[must_use]
    pub const fn sensors(&self) -> &SensorArray {
        &self.sensors
    }
}

/// Move `value` toward zero by `amount` without crossing it.
fn decay_toward_zero(value: f64, amount: f64) -> f64 {
    if value > 0.0 {
        (value - amount).max(0.0)
    } else if value < 0.0 {
        (value + amount).min(0.0)
    } else {
        value
    }
}
