//! rotorwatch: poll loop over synthetic machine telemetry.
//!
//! Each cycle synthesizes one frame, extracts features and prints the
//! diagnostic verdict, the way a gateway would for a live sensor.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rotorwatch_core::config::RotorwatchConfig;
use rotorwatch_core::observe::{init_logging, LogLevel};
use rotorwatch_core::types::{FaultType, HealthState};
use rotorwatch_sim::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "rotorwatch")]
#[command(about = "Condition monitoring for rotating machinery over synthetic telemetry")]
#[command(version)]
struct Args {
    /// Configuration file; defaults to the standard search path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one fault scenario and print a verdict per frame
    Run {
        /// Fault to inject: none, bearing-wear or rotor-unbalance
        #[arg(long, default_value = "bearing-wear")]
        scenario: FaultType,

        /// Number of frames to process
        #[arg(long, default_value = "100")]
        frames: usize,

        /// Fault onset, seconds
        #[arg(long, default_value = "0")]
        onset: f64,

        /// Seconds from onset to full severity
        #[arg(long, default_value = "100")]
        ramp: f64,

        /// Noise seed, overrides the configuration
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Cycle through the scripted 200 s demonstration schedule
    Demo {
        /// Number of 1-frame cycles to run
        #[arg(long, default_value = "200")]
        cycles: usize,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Write labeled feature rows as JSON lines
    Dataset {
        /// Number of rows
        #[arg(long, default_value = "300")]
        count: usize,

        /// Seed, overrides the configuration
        #[arg(long)]
        seed: Option<u64>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print configuration as YAML
    Config {
        /// Print the built-in defaults instead of the loaded configuration
        #[arg(long)]
        example: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned columns for terminals
    Table,
    /// One JSON object per cycle
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if args.verbose {
        config.logging.level = LogLevel::Debug;
    }
    init_logging(&config.logging);

    match args.command {
        Command::Run {
            scenario,
            frames,
            onset,
            ramp,
            seed,
            format,
        } => {
            if let Some(seed) = seed {
                config.synthesis.seed = seed;
            }
            let scenario = FaultScenario::ramp(scenario, onset, ramp)?;
            run_scenario(&config, &scenario, frames, format)
        }
        Command::Demo { cycles, format } => run_demo(&config, cycles, format),
        Command::Dataset { count, seed, out } => {
            if let Some(seed) = seed {
                config.synthesis.seed = seed;
            }
            write_dataset(&config, count, out.as_deref())
        }
        Command::Config { example } => {
            let yaml = if example {
                RotorwatchConfig::example_yaml()
            } else {
                config.to_yaml()?
            };
            print!("{}", yaml);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RotorwatchConfig> {
    let config = match path {
        Some(path) => RotorwatchConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RotorwatchConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn run_scenario(
    config: &RotorwatchConfig,
    scenario: &FaultScenario,
    frames: usize,
    format: OutputFormat,
) -> Result<()> {
    let mut pipeline = MonitoringPipeline::from_config(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    tracing::info!(
        fault = %scenario.fault_type,
        onset = scenario.onset_time,
        frames,
        seed = config.synthesis.seed,
        "Starting run"
    );

    if format == OutputFormat::Table {
        writeln!(out, "{}", table_header(None))?;
    }

    let mut first_alarm: Option<u64> = None;
    let mut worst = HealthState::Nominal;
    for _ in 0..frames {
        let report = pipeline.step(scenario)?;
        let state = report.verdict.health_state;
        if state > HealthState::Nominal && first_alarm.is_none() {
            first_alarm = Some(report.frame_index);
        }
        worst = worst.max(state);
        emit(&mut out, &report, None, format)?;
    }

    tracing::info!(
        final_state = %pipeline.health_state(),
        worst = %worst,
        first_alarm = first_alarm.map(|frame| frame as i64).unwrap_or(-1),
        "Run complete"
    );
    Ok(())
}

fn run_demo(config: &RotorwatchConfig, cycles: usize, format: OutputFormat) -> Result<()> {
    let schedule = DemoSchedule::default();
    let mut pipeline = MonitoringPipeline::from_config(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if format == OutputFormat::Table {
        writeln!(out, "{}", table_header(Some("phase")))?;
    }

    let mut phase = None;
    for _ in 0..cycles {
        let t = pipeline.elapsed();
        let current = schedule.phase_at(t);
        if phase != Some(current) {
            tracing::info!(phase = %current, t, "Demo phase");
            phase = Some(current);
        }
        let report = pipeline.step(&schedule.scenario_at(t))?;
        emit(&mut out, &report, Some(current), format)?;
    }
    Ok(())
}

fn write_dataset(config: &RotorwatchConfig, count: usize, path: Option<&Path>) -> Result<()> {
    let rows = DatasetGenerator::from_config(config)?.generate(count)?;

    let written = match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_jsonl(&rows, BufWriter::new(file))?
        }
        None => write_jsonl(&rows, io::stdout().lock())?,
    };

    tracing::info!(
        rows = written,
        out = path.map(|p| p.display().to_string()).unwrap_or_else(|| "-".into()),
        "Dataset written"
    );
    Ok(())
}

fn table_header(extra: Option<&str>) -> String {
    let mut line = format!("{:>5} {:>8} {:>5} ", "frame", "t", "sev");
    if let Some(extra) = extra {
        line.push_str(&format!("{:<15} ", extra));
    }
    line.push_str("verdict");
    line
}

fn emit<W: Write>(
    out: &mut W,
    report: &CycleReport,
    phase: Option<DemoPhase>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            let mut line = format!(
                "{:>5} {:>8.1} {:>5.2} ",
                report.frame_index, report.start_time, report.severity
            );
            if let Some(phase) = phase {
                line.push_str(&format!("{:<15} ", phase.as_str()));
            }
            line.push_str(&report.verdict.summary());
            writeln!(out, "{}", line)?;
            if report.verdict.is_alarm() {
                for reason in &report.verdict.explanation {
                    writeln!(out, "{:>22}- {}", "", reason)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from([
            "rotorwatch",
            "run",
            "--scenario",
            "rotor-unbalance",
            "--frames",
            "20",
            "--format",
            "json",
        ]);
        match args.command {
            Command::Run {
                scenario,
                frames,
                format,
                ..
            } => {
                assert_eq!(scenario, FaultType::RotorUnbalance);
                assert_eq!(frames, 20);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_scenario() {
        assert!(Args::try_parse_from(["rotorwatch", "run", "--scenario", "gearbox"]).is_err());
    }

    #[test]
    fn test_table_row() {
        let config = RotorwatchConfig::default();
        let mut pipeline = MonitoringPipeline::from_config(&config).unwrap();
        let report = pipeline.step(&FaultScenario::healthy()).unwrap();

        let mut buf = Vec::new();
        emit(&mut buf, &report, None, OutputFormat::Table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("nominal"));
        assert_eq!(text.lines().count(), 1);
    }
}
