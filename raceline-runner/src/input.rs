use raceline_sim::{DirectionalInput, InputDevice};

/// Scripted input device that reports the same held keys every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeldKeys {
    keys: DirectionalInput,
}

impl HeldKeys {
    pub const fn new(keys: DirectionalInput) -> Self {
        Self { keys }
    }

    /// Accelerator held down, nothing else.
    pub const fn accelerate() -> Self {
        Self::new(DirectionalInput {
            accelerate: true,
            brake: false,
            left: false,
            right: false,
        })
    }
}

impl InputDevice for HeldKeys {
    fn poll(&mut self) -> DirectionalInput {
        self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raceline_sim::{ControlInput, HumanPolicy, Observation, PolicyProvider};

    #[test]
    fn held_accelerator_drives_full_throttle() {
        let mut policy = HumanPolicy::new(HeldKeys::accelerate());
        let observation = Observation {
            speed: 20.0,
            steer_angle: 0.0,
            sensors: [50.0; 5],
        };
        assert_eq!(
            policy.control_input(&observation),
            ControlInput::new(1.0, 0.0)
        );
        assert_eq!(policy.name(), "human");
    }

    #[test]
    fn default_device_is_idle() {
        let mut keys = HeldKeys::default();
        assert_eq!(keys.poll(), DirectionalInput::default());
    }
}
