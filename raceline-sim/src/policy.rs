//! Controllers that turn a vehicle's observation into control deltas.
//!
//! Human and learned drivers implement the same [`PolicyProvider`]
//! capability; the simulation never distinguishes between them.
use serde::{Deserialize, Serialize};

use crate::constants::{
    ACTION_SIZE, LEARNED_IMPULSE, LEARNED_OUTPUT_THRESHOLD, OBSERVATION_SIZE, SENSOR_COUNT,
};
use crate::vehicle::{ControlInput, Vehicle};

/// What a policy sees each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub speed: f64,
    pub steer_angle: f64,
    pub sensors: [f64; SENSOR_COUNT],
}

impl Observation {
    #[must_use]
    pub fn of(vehicle: &Vehicle) -> Self {
        Self {
            speed: vehicle.speed(),
            steer_angle: vehicle.steer_angle(),
            sensors: vehicle.sensors().lengths(),
        }
    }

    /// Flatten as `(speed, steer_angle, sensor0..sensor4)`.
    #[must_use]
    pub fn to_array(&self) -> [f64; OBSERVATION_SIZE] {
        let mut out = [0.0; OBSERVATION_SIZE];
        out[0] = self.speed;
        out[1] = self.steer_angle;
        out[2..].copy_from_slice(&self.sensors);
        out
    }
}

/// Policy interface shared by human and automated drivers.
pub trait PolicyProvider {
    /// Name used for logging/report output.
    fn name(&self) -> &str;

    /// Produce the control deltas for the current tick.
    fn control_input(&mut self, observation: &Observation) -> ControlInput;
}

impl<P: PolicyProvider + ?Sized> PolicyProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn control_input(&mut self, observation: &Observation) -> ControlInput {
        (**self).control_input(observation)
    }
}

/// Discrete directional keys held during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectionalInput {
    pub accelerate: bool,
    pub brake: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionalInput {
    /// Map held keys onto unit control deltas. Opposing keys cancel.
    #[must_use]
    pub fn to_control(self) -> ControlInput {
        let throttle = f64::from(i8::from(self.accelerate) - i8::from(self.brake));
        let steer = f64::from(i8::from(self.right) - i8::from(self.left));
        ControlInput::new(throttle, steer)
    }
}

/// Source of directional input, e.g. a keyboard poller or a scripted replay.
pub trait InputDevice {
    fn poll(&mut self) -> DirectionalInput;
}

impl<F> InputDevice for F
where
    F: FnMut() -> DirectionalInput,
{
    fn poll(&mut self) -> DirectionalInput {
        self()
    }
}

/// A vehicle steered by a person through an [`InputDevice`].
#[derive(Debug, Clone)]
pub struct HumanPolicy<D> {
    device: D,
}

impl<D: InputDevice> HumanPolicy<D> {
    #[must_use]
    pub const fn new(device: D) -> Self {
        Self { device }
    }
}

impl<D: InputDevice> PolicyProvider for HumanPolicy<D> {
    fn name(&self) -> &str {
        "human"
    }

    fn control_input(&mut self, _observation: &Observation) -> ControlInput {
        self.device.poll().to_control()
    }
}

/// Externally supplied decision function (for example a trained network).
pub trait DecisionFunction {
    fn activate(&mut self, inputs: &[f64; OBSERVATION_SIZE]) -> [f64; ACTION_SIZE];
}

impl<F> DecisionFunction for F
where
    F: FnMut(&[f64; OBSERVATION_SIZE]) -> [f64; ACTION_SIZE],
{
    fn activate(&mut self, inputs: &[f64; OBSERVATION_SIZE]) -> [f64; ACTION_SIZE] {
        self(inputs)
    }
}

/// A vehicle driven by a decision function whose outputs are thresholded
/// into impulses of `-2`, `0` or `2`.
#[derive(Debug, Clone)]
pub struct LearnedPolicy<F> {
    name: String,
    decide: F,
}

impl<F: DecisionFunction> LearnedPolicy<F> {
    #[must_use]
    pub fn new(name: impl Into<String>, decide: F) -> Self {
        Self {
            name: name.into(),
            decide,
        }
    }
}

impl<F: DecisionFunction> PolicyProvider for LearnedPolicy<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn control_input(&mut self, observation: &Observation) -> ControlInput {
        let [throttle, steer] = self.decide.activate(&observation.to_array());
        ControlInput::new(discretize(throttle), discretize(steer))
    }
}

/// Threshold a raw output at +/-0.5 into one of `{-2, 0, 2}`.
#[must_use]
pub fn discretize(output: f64) -> f64 {
    if output > LEARNED_OUTPUT_THRESHOLD {
        LEARNED_IMPULSE
    } else if output < -LEARNED_OUTPUT_THRESHOLD {
        -LEARNED_IMPULSE
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> Observation {
        Observation {
            speed: 12.0,
            steer_angle: -0.25,
            sensors: [1.0, 2.0, 3.0, 4.0, 5.0],
        }
    }

    #[test]
    fn observation_flattens_in_order() {
        assert_eq!(
            observation().to_array(),
            [12.0, -0.25, 1.0, 2.0, 3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn discretize_thresholds_at_half() {
        assert!((discretize(0.51) - 2.0).abs() < f64::EPSILON);
        assert!((discretize(-0.51) + 2.0).abs() < f64::EPSILON);
        assert!(discretize(0.5).abs() < f64::EPSILON);
        assert!(discretize(-0.5).abs() < f64::EPSILON);
        assert!(discretize(0.0).abs() < f64::EPSILON);
        assert!(discretize(f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn human_keys_map_to_unit_deltas() {
        let mut keys = DirectionalInput {
            accelerate: true,
            left: true,
            ..DirectionalInput::default()
        };
        let mut policy = HumanPolicy::new(move || keys);
        assert_eq!(
            policy.control_input(&observation()),
            ControlInput::new(1.0, -1.0)
        );
        assert_eq!(policy.name(), "human");

        keys.brake = true;
        keys.right = true;
        assert_eq!(keys.to_control(), ControlInput::new(0.0, 0.0));
        let braking = DirectionalInput {
            brake: true,
            right: true,
            ..DirectionalInput::default()
        };
        assert_eq!(braking.to_control(), ControlInput::new(-1.0, 1.0));
    }

    #[test]
    fn learned_policy_sees_full_observation() {
        let mut seen = Vec::new();
        let mut policy = LearnedPolicy::new("recorder", |inputs: &[f64; OBSERVATION_SIZE]| {
            seen.push(*inputs);
            [0.9, -0.1]
        });
        let control = policy.control_input(&observation());
        assert_eq!(control, ControlInput::new(2.0, 0.0));
        assert_eq!(policy.name(), "recorder");
        drop(policy);
        assert_eq!(seen, vec![[12.0, -0.25, 1.0, 2.0, 3.0, 4.0, 5.0]]);
    }

    #[test]
    fn boxed_policies_dispatch_dynamically() {
        let mut policies: Vec<Box<dyn PolicyProvider>> = vec![
            Box::new(HumanPolicy::new(|| DirectionalInput {
                accelerate: true,
                ..DirectionalInput::default()
            })),
            Box::new(LearnedPolicy::new("coast", |_: &[f64; OBSERVATION_SIZE]| [0.0, 0.0])),
        ];
        let controls: Vec<ControlInput> = policies
            .iter_mut()
            .map(|p| p.control_input(&observation()))
            .collect();
        assert_eq!(
            controls,
            vec![ControlInput::new(1.0, 0.0), ControlInput::default()]
        );
    }
}
