use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Run-level metrics assembled over one experiment. Workers record
/// per-algorithm stats while units execute; the orchestrator fills in the
/// totals after the pool drains.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentMetrics {
    /// Unique id of this run.
    pub run_id: String,
    /// Experiment name, also the output file stem.
    pub experiment: String,
    pub started_at: DateTime<Utc>,
    /// Worker threads the pool was sized to.
    pub workers: usize,
    /// Discovered instance files.
    pub instances: usize,
    /// Registered algorithms.
    pub algorithms: usize,
    /// Units created (instances x algorithms).
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
    /// Units skipped after a cancellation request.
    pub skipped: usize,
    /// Rows lost to sink I/O failures.
    pub sink_errors: usize,
    pub interrupted: bool,
    pub wall_seconds: f64,
    /// Per-algorithm outcomes keyed by algorithm id.
    pub per_algorithm: HashMap<String, AlgorithmStats>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AlgorithmStats {
    pub runs: usize,
    pub failures: usize,
    pub best_objective: Option<f64>,
    pub mean_elapsed_seconds: f64,
}

impl ExperimentMetrics {
    pub fn new(run_id: impl Into<String>, experiment: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            experiment: experiment.into(),
            started_at: Utc::now(),
            workers: 0,
            instances: 0,
            algorithms: 0,
            submitted: 0,
            completed: 0,
            failed: 0,
            skipped: 0,
            sink_errors: 0,
            interrupted: false,
            wall_seconds: 0.0,
            per_algorithm: HashMap::new(),
        }
    }

    /// Record a completed unit.
    pub fn record_success(&mut self, algorithm_id: &str, objective: f64, elapsed: Duration) {
        let stats = self
            .per_algorithm
            .entry(algorithm_id.to_string())
            .or_default();
        stats.runs += 1;
        // Incremental mean: new_avg = prev_avg + (value - prev_avg) / count
        let secs = elapsed.as_secs_f64();
        stats.mean_elapsed_seconds += (secs - stats.mean_elapsed_seconds) / stats.runs as f64;
        stats.best_objective = Some(match stats.best_objective {
            Some(best) if best >= objective => best,
            _ => objective,
        });
    }

    /// Record a failed unit.
    pub fn record_failure(&mut self, algorithm_id: &str) {
        self.per_algorithm
            .entry(algorithm_id.to_string())
            .or_default()
            .failures += 1;
    }

    pub fn record_sink_error(&mut self) {
        self.sink_errors += 1;
    }
}
