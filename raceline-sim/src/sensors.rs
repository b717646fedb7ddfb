//! Forward-facing fan of distance sensors attached to a vehicle.
use serde::Serialize;

use crate::constants::{SENSOR_COUNT, SENSOR_FAN_START_DEG, SENSOR_FAN_STEP_DEG};
use crate::geometry::{Point, WallSegment};
use crate::numbers::{usize_to_f64, wrap_angle};
use crate::raycast;

/// A single distance sensor. Endpoint and length are rebuilt every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorRay {
    offset: f64,
    endpoint: Point,
    length: f64,
}

impl SensorRay {
    /// Angular offset from the vehicle heading, in radians.
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    #[must_use]
    pub const fn endpoint(&self) -> Point {
        self.endpoint
    }

    /// Distance from the vehicle to the nearest wall along this ray.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }
}

/// Five rays spanning -90 to +90 degrees around the heading in 45 degree steps,
/// ordered front-left to front-right.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorArray {
    rays: [SensorRay; SENSOR_COUNT],
}

impl SensorArray {
    /// Fresh array with every ray collapsed onto `origin`.
    #[must_use]
    pub fn new(origin: Point) -> Self {
        let rays = std::array::from_fn(|index| SensorRay {
            offset: wrap_angle(fan_offset_degrees(index).to_radians()),
            endpoint: origin,
            length: 0.0,
        });
        Self { rays }
    }

    /// Re-cast every ray from the given pose against the walls.
    pub fn recompute(&mut self, position: Point, heading: f64, walls: &[WallSegment]) {
        for ray in &mut self.rays {
            let angle = wrap_angle(heading + ray.offset);
            ray.endpoint = raycast::cast(position, angle, walls);
            ray.length = position.distance(ray.endpoint);
        }
    }

    #[must_use]
    pub const fn rays(&self) -> &[SensorRay; SENSOR_COUNT] {
        &self.rays
    }

    #[must_use]
    pub fn lengths(&self) -> [f64; SENSOR_COUNT] {
        std::array::from_fn(|index| self.rays[index].length)
    }

    #[must_use]
    pub fn min_length(&self) -> f64 {
        self.rays
            .iter()
            .map(SensorRay::length)
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether any reading is strictly below `threshold`.
    #[must_use]
    pub fn any_below(&self, threshold: f64) -> bool {
        self.rays.iter().any(|ray| ray.length < threshold)
    }
}

fn fan_offset_degrees(index: usize) -> f64 {
    SENSOR_FAN_STEP_DEG.mul_add(usize_to_f64(index + 1), SENSOR_FAN_START_DEG)
}
