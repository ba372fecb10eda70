//! CLI entrypoint for the deadlock toolkit harness.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use deadlock_core::ResourceGraph;
use deadlock_harness::structured_log::{LogEmitter, validate_log_file};
use deadlock_harness::{HarnessConfig, InvariantPolicy, Scenario, ScenarioRunner, render};

/// Resource-allocation analysis tooling.
#[derive(Debug, Parser)]
#[command(name = "deadlock-harness")]
#[command(about = "Banker's safety check, deadlock detection and recovery over scenario files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse one scenario: safety, deadlock detection, optional recovery.
    Analyze {
        /// Scenario JSON path.
        #[arg(long)]
        scenario: PathBuf,
        /// Reclaim the victim's resources if a deadlock is found.
        #[arg(long)]
        recover: bool,
        /// Report format.
        #[arg(long, value_enum, default_value = "markdown")]
        format: Format,
        /// Output path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Structured JSONL log path (if omitted, logs go to stderr).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Invariant policy; overrides DEADLOCK_TOOLKIT_MODE.
        #[arg(long, value_enum)]
        mode: Option<InvariantPolicy>,
    },
    /// Export the resource-allocation graph as Graphviz DOT.
    Render {
        /// Scenario JSON path.
        #[arg(long)]
        scenario: PathBuf,
        /// Output path (if omitted, prints to stdout).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check every scenario's `expect` block in a directory.
    Verify {
        /// Directory containing scenario JSON files.
        #[arg(long, default_value = "tests/scenarios")]
        dir: PathBuf,
        /// Output report path (markdown; a `.json` sibling is also written).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log path (if omitted, logs go to stderr).
        #[arg(long)]
        log: Option<PathBuf>,
        /// Invariant policy; overrides DEADLOCK_TOOLKIT_MODE.
        #[arg(long, value_enum)]
        mode: Option<InvariantPolicy>,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        #[arg(long)]
        log: PathBuf,
    },
}

fn run_id() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("run-{secs}")
}

fn emitter(path: Option<&Path>, config: &HarnessConfig) -> std::io::Result<LogEmitter> {
    let run_id = run_id();
    let emitter = match path {
        Some(path) => LogEmitter::to_file(path, "harness", &run_id)?,
        None => LogEmitter::to_stderr("harness", &run_id),
    };
    Ok(emitter.with_min_level(config.min_log_level))
}

fn write_output(output: Option<&Path>, content: &str) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            scenario,
            recover,
            format,
            output,
            log,
            mode,
        } => {
            let config = HarnessConfig::from_env().with_mode(mode);
            let mut log = emitter(log.as_deref(), &config)?;
            let file = Scenario::from_file(&scenario)?;
            let report = ScenarioRunner::new(config).analyze(&file, recover, &mut log)?;
            log.flush()?;
            let rendered = match format {
                Format::Markdown => report.to_markdown(),
                Format::Json => report.to_json(),
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Command::Render { scenario, output } => {
            let file = Scenario::from_file(&scenario)?;
            let (state, _) = file.scenario.build_state()?;
            let dot = render::to_dot(&ResourceGraph::from_state(&state));
            write_output(output.as_deref(), &dot)?;
        }
        Command::Verify {
            dir,
            report,
            log,
            mode,
        } => {
            eprintln!("Verifying scenarios in {}", dir.display());
            let config = HarnessConfig::from_env().with_mode(mode);
            let mut log = emitter(log.as_deref(), &config)?;
            let files = Scenario::load_dir(&dir)?;
            if files.is_empty() {
                return Err(format!("No scenario JSON files found in {}", dir.display()).into());
            }
            let summary = ScenarioRunner::new(config).verify_all(&files, &mut log);
            log.flush()?;

            eprintln!(
                "Verification complete: total={}, passed={}, failed={}",
                summary.total, summary.passed, summary.failed
            );
            if let Some(report_path) = report {
                std::fs::write(&report_path, summary.to_markdown())?;
                std::fs::write(
                    report_path.with_extension("json"),
                    serde_json::to_string_pretty(&summary)?,
                )?;
                eprintln!("Wrote report to {}", report_path.display());
            }
            if !summary.all_passed() {
                return Err("Scenario verification failed".into());
            }
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for err in &errors {
                eprintln!("{err}");
            }
            eprintln!("{lines} line(s), {} error(s)", errors.len());
            if !errors.is_empty() {
                return Err("Structured log validation failed".into());
            }
        }
    }

    Ok(())
}
