//! Reward accrual for a vehicle over its lifetime.
use serde::Serialize;

use crate::config::RewardConfig;
use crate::vehicle::StepOutcome;

/// Running fitness of one vehicle. Starts at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FitnessAccumulator {
    value: f64,
    penalized: bool,
}

impl FitnessAccumulator {
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub const fn penalized(&self) -> bool {
        self.penalized
    }
}

/// Applies the reward policy to tick outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessEvaluator {
    reward: RewardConfig,
}

impl FitnessEvaluator {
    #[must_use]
    pub const fn new(reward: RewardConfig) -> Self {
        Self { reward }
    }

    /// Reward sustained average speed: `avg_speed^2 * scaled_dt / reward_scale`.
    pub fn accrue(&self, fitness: &mut FitnessAccumulator, scaled_dt: f64, avg_speed: f64) {
        if fitness.penalized {
            return;
        }
        fitness.value += avg_speed * avg_speed * scaled_dt / self.reward.reward_scale;
    }

    /// Subtract the crash penalty. Applied at most once per accumulator.
    pub fn penalize_crash(&self, fitness: &mut FitnessAccumulator) -> bool {
        if fitness.penalized {
            return false;
        }
        fitness.penalized = true;
        fitness.value -= self.reward.crash_penalty;
        true
    }

    /// Fold one tick's outcome into the accumulator.
    pub fn record(&self, fitness: &mut FitnessAccumulator, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Inactive => {}
            StepOutcome::Moved {
                scaled_dt,
                avg_speed,
            } => self.accrue(fitness, scaled_dt, avg_speed),
            StepOutcome::Crashed(_) => {
                self.penalize_crash(fitness);
            }
        }
    }
}

impl Default for FitnessEvaluator {
    fn default() -> Self {
        Self::new(RewardConfig::default())
    }
}
