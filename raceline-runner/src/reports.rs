use anyhow::Result;
use colored::Colorize;
use raceline_sim::numbers::usize_to_f64;
use raceline_sim::{EndReason, EntrantSummary, GenerationOutcome};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Summary of one evaluated generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRecord {
    pub generation: u64,
    pub ticks: u64,
    pub end_reason: EndReason,
    pub entrants: usize,
    pub crashed: usize,
    pub best_fitness: f64,
    pub best_policy: String,
    pub mean_fitness: f64,
    pub worst_fitness: f64,
    pub digest: String,
    /// `None` unless the generation was replayed for comparison.
    pub deterministic: Option<bool>,
    pub fitness: Vec<f64>,
    pub details: Vec<EntrantSummary>,
}

impl GenerationRecord {
    pub fn from_outcome(outcome: &GenerationOutcome, deterministic: Option<bool>) -> Self {
        let fitness = outcome.fitness();
        let (best_fitness, best_policy) = outcome
            .best()
            .map_or((0.0, String::new()), |(_, e)| (e.fitness, e.policy.clone()));
        let worst_fitness = fitness.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let mean_fitness = if fitness.is_empty() {
            0.0
        } else {
            fitness.iter().sum::<f64>() / usize_to_f64(fitness.len())
        };
        Self {
            generation: outcome.generation,
            ticks: outcome.ticks,
            end_reason: outcome.end_reason,
            entrants: outcome.entrants.len(),
            crashed: outcome.crashed_count(),
            best_fitness,
            best_policy,
            mean_fitness,
            worst_fitness,
            digest: format!("{:016x}", outcome.digest()),
            deterministic,
            fitness,
            details: outcome.entrants.clone(),
        }
    }
}

/// Everything a runner invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub seed: u64,
    pub entrants_per_generation: usize,
    pub dt: f64,
    pub max_ticks: Option<u64>,
    pub aborted: bool,
    pub generations: Vec<GenerationRecord>,
}

impl RunReport {
    pub fn determinism_failures(&self) -> usize {
        self.generations
            .iter()
            .filter(|g| g.deterministic == Some(false))
            .count()
    }
}

pub fn generate_console_report<W: Write>(
    out: &mut W,
    report: &RunReport,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Generation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;
    writeln!(out, "Seed: {}", report.seed)?;
    writeln!(
        out,
        "Entrants per generation: {}",
        report.entrants_per_generation
    )?;
    writeln!(out, "Tick dt: {} ms", report.dt)?;
    writeln!(out, "Generated at: {}", report.generated_at)?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for record in &report.generations {
        let reason = match record.end_reason {
            EndReason::AllCrashed => record.end_reason.label().yellow(),
            EndReason::TickBudget => record.end_reason.label().green(),
            EndReason::Aborted => record.end_reason.label().red(),
        };
        writeln!(
            out,
            "{} - {} ticks, {}",
            format!("Generation {}", record.generation).bold(),
            record.ticks,
            reason
        )?;
        writeln!(
            out,
            "   Best: {} ({})",
            format!("{:.4}", record.best_fitness).green(),
            record.best_policy
        )?;
        writeln!(out, "   Mean: {:.4}", record.mean_fitness)?;
        writeln!(
            out,
            "   Worst: {}",
            format!("{:.4}", record.worst_fitness).red()
        )?;
        writeln!(out, "   Crashed: {}/{}", record.crashed, record.entrants)?;
        writeln!(out, "   Digest: {}", record.digest)?;
        match record.deterministic {
            Some(true) => writeln!(out, "   Determinism: {}", "✅ replay matched".green())?,
            Some(false) => writeln!(out, "   Determinism: {}", "❌ replay diverged".red())?,
            None => {}
        }
        writeln!(out)?;
    }

    if report.aborted {
        writeln!(
            out,
            "{}",
            "⚠️  Run aborted; the last generation holds partial fitness.".yellow()
        )?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write>(out: &mut W, report: &RunReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write>(out: &mut W, report: &RunReport) -> Result<()> {
    writeln!(out, "# Raceline Generation Results\n")?;
    writeln!(out, "- **Generated at**: {}", report.generated_at)?;
    writeln!(out, "- **Seed**: {}", report.seed)?;
    writeln!(
        out,
        "- **Entrants per generation**: {}",
        report.entrants_per_generation
    )?;
    writeln!(out, "- **Tick dt**: {} ms", report.dt)?;
    if report.aborted {
        writeln!(out, "- **Aborted**: yes")?;
    }
    writeln!(out)?;

    if report.generations.is_empty() {
        writeln!(out, "_No generations completed._")?;
        return Ok(());
    }

    writeln!(
        out,
        "| Generation | Ticks | End | Best | Mean | Worst | Crashed | Replay |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|")?;
    for record in &report.generations {
        let replay = match record.deterministic {
            Some(true) => "✅",
            Some(false) => "❌",
            None => "-",
        };
        writeln!(
            out,
            "| {} | {} | {} | {:.4} | {:.4} | {:.4} | {}/{} | {} |",
            record.generation,
            record.ticks,
            record.end_reason.label(),
            record.best_fitness,
            record.mean_fitness,
            record.worst_fitness,
            record.crashed,
            record.entrants,
            replay
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use raceline_sim::{CrashCause, Point, VehicleStatus};

    fn entrant(policy: &str, fitness: f64, crashed: bool) -> EntrantSummary {
        EntrantSummary {
            policy: policy.to_string(),
            fitness,
            status: if crashed {
                VehicleStatus::Crashed(CrashCause::Collision)
            } else {
                VehicleStatus::Alive
            },
            crash_tick: crashed.then_some(12),
            avg_speed: 21.5,
            distance_travelled: 80.0,
            final_position: Point::new(10.0, 20.0),
            final_heading: 0.5,
        }
    }

    fn sample_outcome() -> GenerationOutcome {
        GenerationOutcome {
            generation: 3,
            ticks: 40,
            end_reason: EndReason::TickBudget,
            entrants: vec![
                entrant("net-3-0", -9.5, true),
                entrant("net-3-1", 2.0, false),
                entrant("human", 0.5, false),
            ],
        }
    }

    fn sample_report(deterministic: Option<bool>) -> RunReport {
        RunReport {
            generated_at: "2026-01-01T00:00:00+00:00".to_string(),
            seed: 1337,
            entrants_per_generation: 3,
            dt: 16.0,
            max_ticks: Some(40),
            aborted: false,
            generations: vec![GenerationRecord::from_outcome(&sample_outcome(), deterministic)],
        }
    }

    #[test]
    fn record_summarizes_fitness() {
        let record = GenerationRecord::from_outcome(&sample_outcome(), None);
        assert_eq!(record.best_policy, "net-3-1");
        assert!((record.best_fitness - 2.0).abs() < f64::EPSILON);
        assert!((record.worst_fitness + 9.5).abs() < f64::EPSILON);
        assert!((record.mean_fitness + 7.0 / 3.0).abs() < 1e-12);
        assert_eq!(record.crashed, 1);
        assert_eq!(record.fitness, vec![-9.5, 2.0, 0.5]);
        assert_eq!(record.digest.len(), 16);
    }

    #[test]
    fn empty_outcome_reports_zeroes() {
        let outcome = GenerationOutcome {
            generation: 0,
            ticks: 0,
            end_reason: EndReason::AllCrashed,
            entrants: Vec::new(),
        };
        let record = GenerationRecord::from_outcome(&outcome, None);
        assert!(record.best_policy.is_empty());
        assert!(record.mean_fitness.abs() < f64::EPSILON);
        assert!(record.worst_fitness.abs() < f64::EPSILON);
    }

    #[test]
    fn determinism_failures_count_mismatches_only() {
        assert_eq!(sample_report(Some(false)).determinism_failures(), 1);
        assert_eq!(sample_report(Some(true)).determinism_failures(), 0);
        assert_eq!(sample_report(None).determinism_failures(), 0);
    }

    #[test]
    fn json_report_contains_fitness_vector() {
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &sample_report(None)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["generations"][0]["fitness"][1], 2.0);
        assert_eq!(value["generations"][0]["end_reason"], "TickBudget");
        assert_eq!(value["seed"], 1337);
    }

    #[test]
    fn markdown_report_renders_table() {
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &sample_report(Some(true))).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("# Raceline Generation Results"));
        assert!(text.contains("| 3 | 40 | tick budget |"));
        assert!(text.contains("✅"));
    }

    #[test]
    fn markdown_report_handles_no_generations() {
        let mut report = sample_report(None);
        report.generations.clear();
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("No generations completed"));
    }

    #[test]
    fn console_report_mentions_each_generation() {
        let mut report = sample_report(Some(false));
        report.aborted = true;
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &report, Duration::from_millis(5)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Generation 3"));
        assert!(text.contains("net-3-1"));
        assert!(text.contains("replay diverged"));
        assert!(text.contains("Run aborted"));
    }
}
