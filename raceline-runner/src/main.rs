mod input;
mod network;
mod pacing;
mod population;
mod reports;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use raceline_sim::AbortSignal;

use pacing::REFERENCE_TICK_RATE;
use population::PopulationSpec;
use reports::RunReport;
use session::{RunSettings, load_config, load_layout, run_session};

#[derive(Debug, Parser)]
#[command(name = "raceline-runner", version = "0.1.0")]
#[command(about = "Evaluate populations of driving policies on the raceline circuit")]
struct Args {
    /// Number of generations to evaluate
    #[arg(long, default_value_t = 1)]
    generations: u64,

    /// Networks per generation
    #[arg(long, default_value_t = 20)]
    population: usize,

    /// Seed for network weights
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Tick budget per generation (0 disables the budget)
    #[arg(long, default_value_t = 2000)]
    max_ticks: u64,

    /// Simulated milliseconds per tick
    #[arg(long, default_value_t = 16.0)]
    dt: f64,

    /// Wall-clock tick rate cap (0 runs unpaced)
    #[arg(long, default_value_t = 0.0)]
    fps: f64,

    /// Pace ticks at the circuit's reference rate; overrides --fps
    #[arg(long)]
    realtime: bool,

    /// Hidden units in each generated network
    #[arg(long, default_value_t = 6)]
    hidden: usize,

    /// Append a scripted driver that holds the accelerator
    #[arg(long)]
    baseline: bool,

    /// Replay each generation and fail if the digests differ
    #[arg(long)]
    verify_determinism: bool,

    /// Simulation config JSON (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Track layout JSON (built-in circuit when omitted)
    #[arg(long)]
    track: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    announce_banner();

    let settings = build_settings(&args)?;
    let abort = AbortSignal::new();
    listen_for_interrupt(abort.clone());

    let start_time = Instant::now();
    let report = tokio::task::spawn_blocking(move || run_session(&settings, &abort))
        .await
        .context("simulation task failed")??;

    write_reports(&args, &report, start_time)?;

    let failures = report.determinism_failures();
    if failures > 0 {
        eprintln!(
            "{}",
            format!("❌ {failures} generation(s) diverged on replay").red()
        );
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_level);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn announce_banner() {
    eprintln!("{}", "🏎️  Raceline Generation Runner".bright_cyan().bold());
    eprintln!("{}", "================================".cyan());
}

fn build_settings(args: &Args) -> Result<RunSettings> {
    let config = load_config(args.config.as_deref())?;
    let layout = load_layout(args.track.as_deref())?;
    let ticks_per_second = if args.realtime {
        REFERENCE_TICK_RATE
    } else {
        args.fps
    };
    let settings = RunSettings {
        config,
        layout,
        population: PopulationSpec {
            seed: args.seed,
            size: args.population,
            hidden: args.hidden,
            baseline: args.baseline,
        },
        generations: args.generations,
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
        dt: args.dt,
        ticks_per_second,
        verify_determinism: args.verify_determinism,
    };
    settings.validate()?;
    Ok(settings)
}

fn listen_for_interrupt(abort: AbortSignal) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!(
                    "{}",
                    "⏹️  Interrupt received, finishing the current generation".yellow()
                );
                abort.raise();
            }
            Err(err) => log::error!("failed to listen for Ctrl-C: {err}"),
        }
    });
}

fn write_reports(args: &Args, report: &RunReport, start_time: Instant) -> Result<()> {
    let mut sink = report_sink(args.output.as_deref())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut sink, report)?,
        "markdown" => reports::generate_markdown_report(&mut sink, report)?,
        _ => {
            let elapsed = start_time.elapsed();
            reports::generate_console_report(&mut sink, report, elapsed)?;
            writeln!(sink, "🏁 Total time: {elapsed:?}")?;
        }
    }

    sink.flush()?;
    Ok(())
}

/// Buffered destination for the rendered report: stdout unless `--output` names a file.
fn report_sink(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(stdout().lock())));
    };
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    log::info!("writing report to {}", path.display());
    Ok(Box::new(BufWriter::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::GenerationRecord;
    use raceline_sim::{EndReason, GenerationOutcome};

    fn base_args() -> Args {
        Args {
            generations: 1,
            population: 2,
            seed: 1337,
            max_ticks: 50,
            dt: 16.0,
            fps: 0.0,
            realtime: false,
            hidden: 3,
            baseline: false,
            verify_determinism: false,
            config: None,
            track: None,
            report: "json".to_string(),
            output: None,
            verbose: false,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("raceline-main-{label}-{}", std::process::id()))
    }

    fn empty_report() -> RunReport {
        RunReport {
            generated_at: "2026-01-01T00:00:00+00:00".to_string(),
            seed: 1337,
            entrants_per_generation: 0,
            dt: 16.0,
            max_ticks: None,
            aborted: false,
            generations: vec![GenerationRecord::from_outcome(
                &GenerationOutcome {
                    generation: 0,
                    ticks: 0,
                    end_reason: EndReason::AllCrashed,
                    entrants: Vec::new(),
                },
                None,
            )],
        }
    }

    #[test]
    fn args_parse_defaults() {
        let args = Args::parse_from(["raceline-runner"]);
        assert_eq!(args.population, 20);
        assert_eq!(args.seed, 1337);
        assert_eq!(args.max_ticks, 2000);
        assert!((args.dt - 16.0).abs() < f64::EPSILON);
        assert_eq!(args.hidden, 6);
        assert_eq!(args.report, "console");
    }

    #[test]
    fn zero_max_ticks_disables_budget() {
        let args = Args {
            max_ticks: 0,
            ..base_args()
        };
        let settings = build_settings(&args).unwrap();
        assert_eq!(settings.max_ticks, None);
        assert_eq!(build_settings(&base_args()).unwrap().max_ticks, Some(50));
    }

    #[test]
    fn realtime_overrides_fps() {
        let args = Args {
            fps: 30.0,
            realtime: true,
            ..base_args()
        };
        let settings = build_settings(&args).unwrap();
        assert!((settings.ticks_per_second - REFERENCE_TICK_RATE).abs() < f64::EPSILON);
    }

    #[test]
    fn build_settings_rejects_bad_dt() {
        let args = Args {
            dt: -1.0,
            ..base_args()
        };
        assert!(build_settings(&args).is_err());
    }

    #[test]
    fn write_reports_emits_json() {
        let path = temp_path("json");
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &empty_report(), Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("\"generations\""));
    }

    #[test]
    fn write_reports_emits_console_summary() {
        let path = temp_path("console");
        let args = Args {
            report: "console".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &empty_report(), Instant::now()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Generation Summary"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn report_sink_defaults_to_stdout() {
        let mut sink = report_sink(None).unwrap();
        sink.write_all(b"ok\n").unwrap();
        sink.flush().unwrap();
    }

    #[test]
    fn report_sink_names_unwritable_paths() {
        let path = Path::new("/nonexistent/raceline/report.json");
        let Err(err) = report_sink(Some(path)) else {
            panic!("expected an error for {}", path.display());
        };
        assert!(format!("{err:#}").contains("failed to create"));
    }
}
