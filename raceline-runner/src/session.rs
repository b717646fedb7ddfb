use anyhow::{Context, Result, bail};
use raceline_sim::{
    AbortSignal, EndReason, FixedClock, GenerationRunner, SimConfig, StopCondition, TrackLayout,
};
use std::path::Path;

use crate::pacing::PacedClock;
use crate::population::{PopulationSpec, build_population};
use crate::reports::{GenerationRecord, RunReport};

/// Fully resolved inputs for one runner invocation.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config: SimConfig,
    pub layout: TrackLayout,
    pub population: PopulationSpec,
    pub generations: u64,
    pub max_ticks: Option<u64>,
    pub dt: f64,
    pub ticks_per_second: f64,
    pub verify_determinism: bool,
}

impl RunSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            bail!(
                "--dt must be a positive number of milliseconds (got {})",
                self.dt
            );
        }
        if self.ticks_per_second.is_nan() || self.ticks_per_second < 0.0 {
            bail!("--fps must not be negative (got {})", self.ticks_per_second);
        }
        if self.population.entrants() == 0 {
            bail!("--population must be at least 1 unless --baseline is set");
        }
        Ok(())
    }
}

/// Parse an optional simulation config file, falling back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    SimConfig::from_json(&text).with_context(|| format!("invalid config in {}", path.display()))
}

/// Parse an optional track layout file, falling back to the built-in circuit.
pub fn load_layout(path: Option<&Path>) -> Result<TrackLayout> {
    let Some(path) = path else {
        return TrackLayout::load_from_static().context("built-in circuit is malformed");
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    TrackLayout::from_json(&text).with_context(|| format!("invalid track in {}", path.display()))
}

/// Evaluate every requested generation, stopping early once `abort` is raised.
pub fn run_session(settings: &RunSettings, abort: &AbortSignal) -> Result<RunReport> {
    settings.validate()?;
    let stop = StopCondition {
        max_ticks: settings.max_ticks,
    };
    let mut runner = GenerationRunner::from_layout(settings.config.clone(), &settings.layout)
        .context("failed to set up the simulation")?
        .with_stop_condition(stop)
        .with_abort_signal(abort.clone());
    // Replays run on their own runner so the generation indices stay aligned.
    let mut shadow = settings
        .verify_determinism
        .then(|| runner.clone().with_abort_signal(AbortSignal::new()));
    let mut clock = PacedClock::new(settings.dt, settings.ticks_per_second);
    if let Some(period) = clock.period() {
        log::info!("pacing ticks every {period:?}");
    }

    let mut records = Vec::new();
    let mut aborted = false;
    for _ in 0..settings.generations {
        if abort.is_raised() {
            aborted = true;
            break;
        }
        let generation = runner.generation();
        let mut policies = build_population(&settings.population, generation);
        let outcome = runner.run_generation_detailed(&mut policies, &mut clock);
        let ended_early = outcome.end_reason == EndReason::Aborted;

        let deterministic = match shadow.as_mut() {
            Some(shadow) if !ended_early => {
                let mut replay = build_population(&settings.population, generation);
                let check =
                    shadow.run_generation_detailed(&mut replay, &mut FixedClock::new(settings.dt));
                let matched = check.digest() == outcome.digest();
                if !matched {
                    log::error!(
                        "generation {generation}: replay digest {:016x} != {:016x}",
                        check.digest(),
                        outcome.digest()
                    );
                }
                Some(matched)
            }
            _ => None,
        };

        records.push(GenerationRecord::from_outcome(&outcome, deterministic));
        if ended_early {
            log::warn!(
                "generation {generation} aborted after {} ticks",
                outcome.ticks
            );
            aborted = true;
            break;
        }
    }

    Ok(RunReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        seed: settings.population.seed,
        entrants_per_generation: settings.population.entrants(),
        dt: settings.dt,
        max_ticks: settings.max_ticks,
        aborted,
        generations: records,
    })
}
