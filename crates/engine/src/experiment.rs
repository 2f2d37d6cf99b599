//! Experiment orchestration.
//!
//! An [`Experiment`] owns the run plan: discover instance files under the
//! input root, cross them with the registered algorithms into work units,
//! submit everything to a worker pool, and drain. The returned
//! [`ExperimentMetrics`] summarizes the run; per-unit results land in the
//! CSV sink as they complete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use optibench_core::{Algorithm, EdgeListLoader, ExperimentConfig, InstanceLoader};

use crate::discover::discover_instances;
use crate::error::EngineError;
use crate::metrics::ExperimentMetrics;
use crate::pool::{RunContext, WorkerPool};
use crate::sink::ResultSink;
use crate::unit::WorkUnit;

pub struct Experiment {
    config: ExperimentConfig,
    loader: Arc<dyn InstanceLoader>,
    algorithms: Vec<Arc<dyn Algorithm>>,
    cancel: Arc<AtomicBool>,
}

impl Experiment {
    /// Experiment over edge-list instance files.
    pub fn new(config: ExperimentConfig) -> Self {
        Self::with_loader(config, Arc::new(EdgeListLoader))
    }

    /// Experiment with a custom instance loader.
    pub fn with_loader(config: ExperimentConfig, loader: Arc<dyn InstanceLoader>) -> Self {
        Self {
            config,
            loader,
            algorithms: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Adds an algorithm to the run plan. Each registered algorithm runs
    /// once per discovered instance file.
    pub fn register_algorithm(&mut self, algorithm: Arc<dyn Algorithm>) {
        info!("Registered algorithm: {}", algorithm.id());
        self.algorithms.push(algorithm);
    }

    /// Cooperative stop handle. Setting the flag lets in-flight units finish
    /// while everything still queued is skipped. The flag is cleared every
    /// time [`Experiment::run`] starts, so a run after a cancelled one
    /// executes the full plan again.
    pub fn cancel_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs the full plan and blocks until every submitted unit is terminal.
    ///
    /// Unit-level faults (unreadable instances, algorithm errors, panics)
    /// are recorded and do not abort the run; only setup problems such as a
    /// missing input root or an unwritable sink surface as errors.
    pub fn run(&self) -> Result<ExperimentMetrics, EngineError> {
        self.cancel.store(false, Ordering::Relaxed);
        let run_id = Uuid::new_v4().to_string();
        let workers = self.config.effective_workers();
        let started = Instant::now();

        let files = discover_instances(&self.config.input.root)?;
        if files.is_empty() {
            warn!(
                "No instance files found under {}",
                self.config.input.root.display()
            );
        }
        if self.algorithms.is_empty() {
            warn!("No algorithms registered; nothing to run");
        }
        info!(
            "Experiment '{}' starting (run {}): {} instances x {} algorithms, {} workers",
            self.config.experiment,
            run_id,
            files.len(),
            self.algorithms.len(),
            workers
        );

        let sink = ResultSink::create(
            self.config.output_path(),
            self.config.output.delimiter,
            self.config.output.decimal,
        )?;
        sink.write_header()?;

        let metrics = Arc::new(RwLock::new(ExperimentMetrics::new(
            run_id,
            self.config.experiment.clone(),
        )));
        let ctx = Arc::new(RunContext::new(
            Arc::clone(&self.loader),
            Arc::new(sink),
            Arc::clone(&metrics),
        ));
        let mut pool = WorkerPool::open(&self.config.pool, ctx, Arc::clone(&self.cancel))?;

        let time_budget = self.config.pool.time_budget();
        for file in &files {
            for algorithm in &self.algorithms {
                let unit = WorkUnit::new(file, Arc::clone(algorithm), self.config.seed)
                    .with_time_budget(time_budget);
                pool.submit(unit);
            }
        }
        let submitted = pool.submitted();
        let report = pool.drain();

        let mut summary = match metrics.write() {
            Ok(mut guard) => {
                guard.workers = workers;
                guard.instances = files.len();
                guard.algorithms = self.algorithms.len();
                guard.submitted = submitted;
                guard.completed = report.completed;
                guard.failed = report.failed;
                guard.skipped = report.skipped;
                guard.interrupted = report.interrupted;
                guard.clone()
            }
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        summary.wall_seconds = started.elapsed().as_secs_f64();

        if summary.interrupted {
            warn!(
                "Experiment '{}' interrupted: {} completed, {} skipped",
                self.config.experiment, summary.completed, summary.skipped
            );
        } else {
            info!(
                "Experiment '{}' finished in {:.2}s: {} completed, {} failed",
                self.config.experiment, summary.wall_seconds, summary.completed, summary.failed
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use optibench_core::{InputConfig, OutputConfig};

    use super::*;

    fn config_in(dir: &std::path::Path) -> ExperimentConfig {
        ExperimentConfig {
            input: InputConfig {
                root: dir.join("instances"),
            },
            output: OutputConfig {
                dir: dir.join("results"),
                ..OutputConfig::default()
            },
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn cancel_signal_is_shared() {
        let dir = tempfile::TempDir::new().unwrap();
        let experiment = Experiment::new(config_in(dir.path()));
        let handle = experiment.cancel_signal();
        handle.store(true, Ordering::Relaxed);
        assert!(experiment.cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn missing_input_root_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let experiment = Experiment::new(config_in(dir.path()));
        let err = experiment.run().unwrap_err();
        assert!(matches!(err, EngineError::InputRoot(_)), "got: {err}");
    }
}
