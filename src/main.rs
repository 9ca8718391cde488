//! sweepmap CLI - convergence tables from training-session logs
//!
//! Command-line entry point. The library does the parsing and aggregation;
//! this binary owns every side effect:
//!
//! 1. Config: sweepmap.toml / pyproject.toml `[tool.sweepmap]`
//! 2. Input: read the captured log (file or stdin), decode lossily, strip `\r`
//! 3. Results: walk the results directory for JSON artifacts
//! 4. Output: render the report to stdout, diagnostics to stderr

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sweepmap::config::Config;
use sweepmap::extraction::SessionParser;
use sweepmap::grid::{GridAggregator, GridTable};
use sweepmap::rendering::{render_best_configs, render_grid, Palette, RunTable};
use sweepmap::results::ResultStore;
use sweepmap::types::{RunRecord, RunStatus};

/// Convergence tables from training-session logs and run result files
///
/// Examples:
///   screen-dump | sweepmap summary            # Summarize sessions from stdin
///   sweepmap summary --log screens.log        # Summarize a captured log
///   sweepmap grid --log screens.log -d results
#[derive(Parser, Debug)]
#[command(name = "sweepmap")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Project root (where sweepmap.toml / pyproject.toml are looked up)
    #[arg(short, long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Every parsed session, sorted by iterations, with status counts
    Summary {
        /// Captured session log; `-` or omitted reads stdin
        #[arg(short, long, value_name = "FILE")]
        log: Option<PathBuf>,

        /// Only show runs with this status (can be repeated)
        #[arg(short, long)]
        status: Vec<RunStatus>,

        /// Print records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Fewest iterations to converge per solver, perturbations and scale
    Grid {
        /// Captured session log for runs still in progress
        #[arg(short, long, value_name = "FILE")]
        log: Option<PathBuf>,

        /// Directory of per-run JSON result files
        #[arg(short = 'd', long, value_name = "DIR")]
        results: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = run(&cli)?;
    print!("{}", output);

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the selected report and return its text.
fn run(cli: &Cli) -> Result<String> {
    let config = Config::load(&cli.root);
    tracing::debug!("sweepmap v{}\n{}", env!("CARGO_PKG_VERSION"), config.display_summary());

    let palette = Palette::new(!cli.no_color);

    match &cli.command {
        Command::Summary { log, status, json } => {
            let log_path = log.as_deref().or(config.log.as_deref());
            let text = read_log(log_path)?;
            let mut records = SessionParser::new().parse(&text);
            if !status.is_empty() {
                records.retain(|r| status.contains(&r.status));
            }

            if *json {
                render_json(&records)
            } else {
                Ok(RunTable::build(&records).render(&palette))
            }
        }
        Command::Grid { log, results } => {
            let results_dir = results
                .as_deref()
                .or(config.results.as_deref())
                .context("No results directory: pass --results or set `results` in sweepmap.toml")?;
            let store = ResultStore::load_dir(results_dir, &config)?;

            let sessions = match log.as_deref().or(config.log.as_deref()) {
                Some(path) => SessionParser::new().parse(&read_log(Some(path))?),
                None => {
                    tracing::info!("no session log given, grid shows result files only");
                    Vec::new()
                }
            };

            let grid = GridAggregator::from_sources(store.into_records(), sessions);
            let table = GridTable::build(&grid);
            Ok(format!(
                "{}\n{}",
                render_grid(&table, &palette),
                render_best_configs(&grid, &palette)
            ))
        }
    }
}

/// Read a log from `path` (or stdin for `None`/`-`), tolerating invalid UTF-8.
fn read_log(path: Option<&Path>) -> Result<String> {
    let bytes = match path {
        Some(p) if p != Path::new("-") => {
            std::fs::read(p).with_context(|| format!("Failed to read log '{}'", p.display()))?
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read log from stdin")?;
            buf
        }
    };
    Ok(decode_log(&bytes))
}

/// Lossy UTF-8 decode with carriage returns removed.
fn decode_log(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\r', "")
}

/// Records in summary order as a JSON array.
fn render_json(records: &[RunRecord]) -> Result<String> {
    let mut sorted: Vec<&RunRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.effective_iterations());
    let mut json = serde_json::to_string_pretty(&sorted).context("Failed to serialize records")?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "screen -ls output\n\
        ------------------------------\n\
        Session: 123.SOLV_1SPSA_lr0.01_pert8_scale2\n\
        status converged iters 400\n\
        Final loss (after training): 0.023\n\
        Total training time: 55.2\n\
        ------------------------------\n\
        Session: 124.SOLV_1SPSA_lr0.02_pert8_scale2\n\
        Iteration 500/1000 Train Loss: 0.4\n";

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_cli_parse_summary_defaults() {
        let cli = cli(&["sweepmap", "summary"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(!cli.no_color);
        match cli.command {
            Command::Summary { log, status, json } => {
                assert_eq!(log, None);
                assert!(status.is_empty());
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_status_filter() {
        let cli = cli(&["sweepmap", "summary", "-s", "converged", "--status", "still_training"]);
        match cli.command {
            Command::Summary { status, .. } => {
                assert_eq!(status, vec![RunStatus::Converged, RunStatus::StillTraining]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["sweepmap", "summary", "-s", "success"]).is_err());
    }

    #[test]
    fn test_cli_parse_grid_with_global_flags() {
        let cli = cli(&["sweepmap", "grid", "--log", "s.log", "-d", "results", "--no-color", "-v"]);
        assert!(cli.no_color);
        assert!(cli.verbose);
        match cli.command {
            Command::Grid { log, results } => {
                assert_eq!(log, Some(PathBuf::from("s.log")));
                assert_eq!(results, Some(PathBuf::from("results")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_decode_log_strips_carriage_returns_and_bad_bytes() {
        let text = decode_log(b"Iteration 1/2\r\n\xffTrain Loss: 0.5\r\n");
        assert_eq!(text, "Iteration 1/2\n\u{fffd}Train Loss: 0.5\n");
    }

    #[test]
    fn test_run_summary_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let log = dir.path().join("screens.log");
        std::fs::write(&log, LOG)?;

        let root = dir.path().to_string_lossy().into_owned();
        let log_arg = log.to_string_lossy().into_owned();
        let output = run(&cli(&["sweepmap", "-r", &root, "--no-color", "summary", "-l", &log_arg]))?;

        let lines: Vec<_> = output.lines().collect();
        assert!(lines[1].starts_with("400"));
        assert!(lines[2].starts_with("500"));
        assert!(output.contains("converged: 1"));
        assert!(output.contains("still_training: 1"));
        assert!(output.contains("total: 2"));
        Ok(())
    }

    #[test]
    fn test_run_summary_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let log = dir.path().join("screens.log");
        std::fs::write(&log, LOG)?;

        let root = dir.path().to_string_lossy().into_owned();
        let log_arg = log.to_string_lossy().into_owned();
        let output = run(&cli(&["sweepmap", "-r", &root, "summary", "-l", &log_arg, "--json"]))?;

        let parsed: serde_json::Value = serde_json::from_str(&output)?;
        let records = parsed.as_array().expect("array");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["status"], "converged");
        assert_eq!(records[0]["iterations"], 400);
        assert_eq!(records[1]["status"], "still_training");
        Ok(())
    }

    #[test]
    fn test_run_grid_prefers_result_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let log = dir.path().join("screens.log");
        std::fs::write(&log, LOG)?;

        let results = dir.path().join("results");
        std::fs::create_dir(&results)?;
        std::fs::write(
            results.join("run_a.json"),
            r#"{"args": {"solver": "1SPSA", "num_perturbations": 8, "hidden_size": 256,
                "learning_rate": 0.01}, "status": "completed", "iters": 300}"#,
        )?;
        std::fs::write(
            results.join("run_b.json"),
            r#"{"args": {"solver": "BPTT", "num_perturbations": 1, "hidden_size": 128},
                "status": "training", "iters": 9}"#,
        )?;

        let root = dir.path().to_string_lossy().into_owned();
        let log_arg = log.to_string_lossy().into_owned();
        let results_arg = results.to_string_lossy().into_owned();
        let output = run(&cli(&[
            "sweepmap", "-r", &root, "--no-color", "grid", "-l", &log_arg, "-d", &results_arg,
        ]))?;

        let spsa_row = output
            .lines()
            .find(|l| l.starts_with("1SPSA (n=8)"))
            .expect("1SPSA row");
        assert!(spsa_row.contains("300"));
        assert!(!spsa_row.contains("500*"));

        let bptt_row = output.lines().find(|l| l.starts_with("BPTT")).expect("BPTT row");
        assert!(!bptt_row.contains('9'));
        assert!(output.contains("Best configs:"));
        Ok(())
    }

    #[test]
    fn test_run_grid_requires_results_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        assert!(run(&cli(&["sweepmap", "-r", &root, "grid"])).is_err());
    }
}
