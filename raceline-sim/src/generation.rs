//! Lockstep simulation of one generation of vehicle/policy pairs.
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use twox_hash::XxHash64;

use crate::config::SimConfig;
use crate::error::SimError;
use crate::fitness::{FitnessAccumulator, FitnessEvaluator};
use crate::geometry::{Point, WallSegment};
use crate::policy::{Observation, PolicyProvider};
use crate::track::{Track, TrackLayout};
use crate::vehicle::{StepOutcome, Vehicle, VehicleStatus};

/// Indices of vehicles that crashed during one tick.
pub type CrashEvents = SmallVec<[usize; 4]>;

/// Supplies the time delta for each tick.
pub trait TickClock {
    fn next_dt(&mut self) -> f64;
}

/// Constant time delta, no waiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock {
    dt: f64,
}

impl FixedClock {
    #[must_use]
    pub const fn new(dt: f64) -> Self {
        Self { dt }
    }
}

impl TickClock for FixedClock {
    fn next_dt(&mut self) -> f64 {
        self.dt
    }
}

/// Shared flag used to stop a running generation early.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-generation tick budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StopCondition {
    pub max_ticks: Option<u64>,
}

impl StopCondition {
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { max_ticks: None }
    }

    #[must_use]
    pub const fn max_ticks(ticks: u64) -> Self {
        Self {
            max_ticks: Some(ticks),
        }
    }

    const fn reached(&self, ticks: u64) -> bool {
        match self.max_ticks {
            Some(max) => ticks >= max,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Every vehicle crashed.
    AllCrashed,
    /// The tick budget ran out with vehicles still alive.
    TickBudget,
    /// An external abort arrived.
    Aborted,
}

impl EndReason {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AllCrashed => "all crashed",
            Self::TickBudget => "tick budget",
            Self::Aborted => "aborted",
        }
    }
}

/// Result of advancing every live vehicle by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub alive: usize,
    pub crashed: CrashEvents,
}

#[derive(Debug, Clone)]
struct Entrant {
    vehicle: Vehicle,
    fitness: FitnessAccumulator,
    crash_tick: Option<u64>,
}

/// Vehicles of a single generation, advanced in lockstep.
///
/// Policies are passed to [`GenerationSession::tick`] in the same order as
/// the vehicles were created; entrant `i` is always driven by policy `i`.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    generation: u64,
    entrants: Vec<Entrant>,
    ticks: u64,
    alive: usize,
}

impl GenerationSession {
    /// Spawn `population` vehicles on the track's start pose.
    #[must_use]
    pub fn new(generation: u64, population: usize, track: &Track, config: &SimConfig) -> Self {
        let walls = track.walls().segments();
        let entrants = (0..population)
            .map(|_| Entrant {
                vehicle: Vehicle::spawn(track.start(), config, walls),
                fitness: FitnessAccumulator::default(),
                crash_tick: None,
            })
            .collect();
        Self {
            generation,
            entrants,
            ticks: 0,
            alive: population,
        }
    }

    /// Advance every live vehicle once, in entrant order.
    ///
    /// `policies` must hold exactly one policy per vehicle.
    pub fn tick<P: PolicyProvider>(
        &mut self,
        policies: &mut [P],
        dt: f64,
        walls: &[WallSegment],
        config: &SimConfig,
        evaluator: &FitnessEvaluator,
    ) -> TickReport {
        debug_assert_eq!(
            policies.len(),
            self.entrants.len(),
            "one policy per vehicle"
        );
        self.ticks += 1;
        let mut crashed = CrashEvents::new();

        let pairs = self.entrants.iter_mut().zip(policies.iter_mut());
        for (index, (entrant, policy)) in pairs.enumerate() {
            if entrant.vehicle.is_crashed() {
                continue;
            }
            let observation = Observation::of(&entrant.vehicle);
            let control = policy.control_input(&observation);
            let outcome = entrant.vehicle.integrate(control, dt, walls, config);
            evaluator.record(&mut entrant.fitness, outcome);

            if let StepOutcome::Crashed(cause) = outcome {
                entrant.crash_tick = Some(self.ticks);
                self.alive = self.alive.saturating_sub(1);
                crashed.push(index);
                log::debug!(
                    "generation {} tick {}: {} #{index} crashed ({}), fitness {:.4}",
                    self.generation,
                    self.ticks,
                    policy.name(),
                    cause.label(),
                    entrant.fitness.value()
                );
            }
        }

        TickReport {
            tick: self.ticks,
            alive: self.alive,
            crashed,
        }
    }

    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub const fn alive(&self) -> usize {
        self.alive
    }

    #[must_use]
    pub fn vehicle(&self, index: usize) -> Option<&Vehicle> {
        self.entrants.get(index).map(|e| &e.vehicle)
    }

    #[must_use]
    pub fn fitness(&self) -> Vec<f64> {
        self.entrants.iter().map(|e| e.fitness.value()).collect()
    }

    /// Close the session and summarize each entrant.
    #[must_use]
    pub fn finish<P: PolicyProvider>(
        self,
        policies: &[P],
        end_reason: EndReason,
    ) -> GenerationOutcome {
        let entrants = self
            .entrants
            .into_iter()
            .enumerate()
            .map(|(index, entrant)| EntrantSummary {
                policy: policies
                    .get(index)
                    .map_or_else(String::new, |p| p.name().to_string()),
                fitness: entrant.fitness.value(),
                status: entrant.vehicle.status(),
                crash_tick: entrant.crash_tick,
                avg_speed: entrant.vehicle.avg_speed(),
                distance_travelled: entrant.vehicle.distance_travelled(),
                final_position: entrant.vehicle.position(),
                final_heading: entrant.vehicle.heading(),
            })
            .collect();
        GenerationOutcome {
            generation: self.generation,
            ticks: self.ticks,
            end_reason,
            entrants,
        }
    }
}

/// Final state of one vehicle/policy pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrantSummary {
    pub policy: String,
    pub fitness: f64,
    pub status: VehicleStatus,
    pub crash_tick: Option<u64>,
    pub avg_speed: f64,
    pub distance_travelled: f64,
    pub final_position: Point,
    pub final_heading: f64,
}

/// Everything a generation produced, in input policy order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutcome {
    pub generation: u64,
    pub ticks: u64,
    pub end_reason: EndReason,
    pub entrants: Vec<EntrantSummary>,
}

impl GenerationOutcome {
    /// One fitness value per input policy, same order.
    #[must_use]
    pub fn fitness(&self) -> Vec<f64> {
        self.entrants.iter().map(|e| e.fitness).collect()
    }

    #[must_use]
    pub fn crashed_count(&self) -> usize {
        self.entrants
            .iter()
            .filter(|e| matches!(e.status, VehicleStatus::Crashed(_)))
            .count()
    }

    /// Index and summary of the fittest entrant.
    #[must_use]
    pub fn best(&self) -> Option<(usize, &EntrantSummary)> {
        self.entrants
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.fitness.total_cmp(&b.fitness))
    }

    /// Stable hash over fitness values and final poses.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write_u64(self.generation);
        hasher.write_u64(self.ticks);
        for entrant in &self.entrants {
            hasher.write_u64(entrant.fitness.to_bits());
            hasher.write_u64(entrant.final_position.x.to_bits());
            hasher.write_u64(entrant.final_position.y.to_bits());
            hasher.write_u64(entrant.final_heading.to_bits());
            hasher.write_u64(entrant.crash_tick.unwrap_or(u64::MAX));
        }
        hasher.finish()
    }
}

/// Drives whole generations to completion and hands back fitness.
#[derive(Debug, Clone)]
pub struct GenerationRunner {
    config: SimConfig,
    track: Track,
    evaluator: FitnessEvaluator,
    stop: StopCondition,
    abort: AbortSignal,
    generation: u64,
}

impl GenerationRunner {
    /// Build a runner over an already frozen track.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: SimConfig, track: Track) -> Result<Self, SimError> {
        config.validate()?;
        let evaluator = FitnessEvaluator::new(config.reward.clone());
        Ok(Self {
            config,
            track,
            evaluator,
            stop: StopCondition::unbounded(),
            abort: AbortSignal::new(),
            generation: 0,
        })
    }

    /// Build a runner straight from a layout description.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout or configuration is invalid.
    pub fn from_layout(config: SimConfig, layout: &TrackLayout) -> Result<Self, SimError> {
        let track = layout.build()?;
        Self::new(config, track)
    }

    #[must_use]
    pub const fn with_stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    #[must_use]
    pub fn with_abort_signal(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    #[must_use]
    pub const fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    /// Index the next generation will run under.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn track(&self) -> &Track {
        &self.track
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub const fn stop_condition(&self) -> StopCondition {
        self.stop
    }

    /// Simulate one generation and return one fitness per policy, in order.
    pub fn run_generation<P: PolicyProvider>(
        &mut self,
        policies: &mut [P],
        clock: &mut dyn TickClock,
    ) -> Vec<f64> {
        self.run_generation_detailed(policies, clock).fitness()
    }

    /// Like [`GenerationRunner::run_generation`], keeping the full outcome.
    pub fn run_generation_detailed<P: PolicyProvider>(
        &mut self,
        policies: &mut [P],
        clock: &mut dyn TickClock,
    ) -> GenerationOutcome {
        let generation = self.generation;
        self.generation += 1;

        let walls = self.track.walls().segments();
        let mut session =
            GenerationSession::new(generation, policies.len(), &self.track, &self.config);
        log::info!(
            "generation {generation}: starting {} vehicles",
            policies.len()
        );

        let end_reason = loop {
            if session.alive() == 0 {
                break EndReason::AllCrashed;
            }
            if self.abort.is_raised() {
                break EndReason::Aborted;
            }
            if self.stop.reached(session.ticks()) {
                break EndReason::TickBudget;
            }
            let dt = clock.next_dt();
            let report = session.tick(policies, dt, walls, &self.config, &self.evaluator);
            log::trace!(
                "generation {generation} tick {}: {} alive",
                report.tick,
                report.alive
            );
        };

        log::info!(
            "generation {generation}: ended after {} ticks ({}), {} still alive",
            session.ticks(),
            end_reason.label(),
            session.alive()
        );
        session.finish(policies, end_reason)
    }
}
