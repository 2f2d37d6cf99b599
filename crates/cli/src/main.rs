//! optibench: batch runner for max-cut heuristics.
//!
//! Loads the experiment config, discovers instance files under the input
//! root, runs every registered algorithm on every instance through the
//! worker pool, and appends one CSV row per completed unit. Command-line
//! flags override individual config values for quick one-off runs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};

use optibench_core::{Algorithm, ExperimentConfig, load_dotenv};
use optibench_engine::Experiment;
use optibench_solvers::{GreedyCut, RandomSearch};

// ── CLI ─────────────────────────────────────────────────────────────

/// Benchmark harness for max-cut heuristics over edge-list instance files.
#[derive(Parser, Debug)]
#[command(name = "optibench", version, about)]
struct Cli {
    /// Path to optibench.toml config file.
    #[arg(long, env = "OPTIBENCH_CONFIG", default_value = "config/optibench.toml")]
    config: String,

    /// Experiment name; the output file is <output dir>/<experiment>.csv.
    #[arg(short, long)]
    experiment: Option<String>,

    /// Run units one at a time on the main thread.
    #[arg(short, long)]
    sequential: bool,

    /// Upper bound on worker threads.
    #[arg(short = 'n', long)]
    cores: Option<usize>,

    /// Percentage of available cores the pool may use.
    #[arg(short = 'p', long)]
    core_percent: Option<u8>,

    /// Directory scanned recursively for instance files.
    #[arg(short, long)]
    instances: Option<PathBuf>,

    /// Directory the result CSV is written to.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seed shared by every work unit.
    #[arg(short = 'r', long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Soft per-unit time budget in seconds.
    #[arg(long)]
    time_budget_secs: Option<u64>,

    /// Comma-separated algorithm ids to run.
    #[arg(short, long, default_value = "greedy,random")]
    algorithms: String,

    /// Write the run summary as pretty JSON to this file.
    #[arg(long, value_name = "PATH")]
    summary_json: Option<PathBuf>,
}

fn apply_overrides(config: &mut ExperimentConfig, cli: &Cli) {
    if let Some(experiment) = &cli.experiment {
        config.experiment = experiment.clone();
    }
    if cli.sequential {
        config.pool.sequential = true;
    }
    if let Some(cores) = cli.cores {
        config.pool.cores = cores;
    }
    if let Some(percent) = cli.core_percent {
        config.pool.core_percent = percent;
    }
    if let Some(secs) = cli.time_budget_secs {
        config.pool.time_budget_secs = Some(secs);
    }
    if let Some(root) = &cli.instances {
        config.input.root = root.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
}

// ── Algorithm roster ────────────────────────────────────────────────

/// Resolve a comma-separated id list against the built-in solvers.
fn parse_algorithms(spec: &str) -> anyhow::Result<Vec<Arc<dyn Algorithm>>> {
    let mut algorithms: Vec<Arc<dyn Algorithm>> = Vec::new();
    for id in spec.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        match id {
            "greedy" => algorithms.push(Arc::new(GreedyCut::new())),
            "random" => algorithms.push(Arc::new(RandomSearch::new())),
            other => bail!("unknown algorithm '{other}', expected greedy or random"),
        }
    }
    if algorithms.is_empty() {
        bail!("no algorithms selected");
    }
    Ok(algorithms)
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    let config_missing = !std::path::Path::new(&cli.config).exists();
    let mut config = if config_missing {
        ExperimentConfig::from_toml("")?
    } else {
        ExperimentConfig::from_file(&cli.config)
            .with_context(|| format!("failed to load config from {}", cli.config))?
    };
    apply_overrides(&mut config, &cli);
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log.level.clone())),
        )
        .init();

    if config_missing {
        warn!("Config file {} not found, using defaults", cli.config);
    } else {
        info!("Loaded config from {}", cli.config);
    }

    let mut experiment = Experiment::new(config);
    for algorithm in parse_algorithms(&cli.algorithms)? {
        experiment.register_algorithm(algorithm);
    }

    let summary = experiment.run()?;
    info!(
        "Results written to {}",
        experiment.config().output_path().display()
    );
    if summary.failed > 0 {
        warn!("{} of {} units failed", summary.failed, summary.submitted);
    }
    if let Some(path) = &cli.summary_json {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        info!("Summary written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_resolves_known_ids() {
        let algorithms = parse_algorithms("greedy, random").unwrap();
        assert_eq!(algorithms.len(), 2);
        assert_eq!(algorithms[0].id(), "greedy");
        assert_eq!(algorithms[1].id(), "random");
    }

    #[test]
    fn roster_rejects_unknown_ids() {
        let err = parse_algorithms("greedy,annealing").unwrap_err();
        assert!(err.to_string().contains("annealing"), "got: {err}");
    }

    #[test]
    fn roster_rejects_empty_spec() {
        assert!(parse_algorithms(" , ").is_err());
    }

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::parse_from([
            "optibench",
            "--experiment",
            "tuning",
            "-s",
            "-n",
            "4",
            "-p",
            "50",
            "-i",
            "graphs",
            "-o",
            "out",
            "-r",
            "7",
            "-l",
            "debug",
            "--time-budget-secs",
            "30",
        ]);
        let mut config = ExperimentConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.experiment, "tuning");
        assert!(config.pool.sequential);
        assert_eq!(config.pool.cores, 4);
        assert_eq!(config.pool.core_percent, 50);
        assert_eq!(config.pool.time_budget_secs, Some(30));
        assert_eq!(config.input.root, PathBuf::from("graphs"));
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.seed, 7);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn defaults_leave_config_untouched() {
        let cli = Cli::parse_from(["optibench"]);
        let mut config = ExperimentConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.experiment, "experiment");
        assert!(!config.pool.sequential);
        assert_eq!(config.seed, 42);
    }
}
