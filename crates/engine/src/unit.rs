//! Execution of a single work unit.
//!
//! Each unit walks `Pending -> Loading -> Running -> {Succeeded, Failed}`.
//! A load failure short-circuits straight to Failed without touching the
//! algorithm. The monotonic timer wraps only the algorithm-run phase. Every
//! fault inside the unit, including panics, is converted into a
//! [`UnitOutcome::Failed`] here and never reaches the worker thread.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use optibench_core::{Algorithm, InstanceLoader, LoadError, SolveError};

use crate::row::ResultRow;

/// Terminal failure reason of one unit.
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error("instance load failed: {0}")]
    Load(#[from] LoadError),
    #[error("algorithm failed: {0}")]
    Algorithm(#[from] SolveError),
    #[error("panicked: {0}")]
    Panicked(String),
}

/// One (input file, algorithm) pairing scheduled for execution. Immutable
/// once constructed; consumed exactly once by the pool.
pub struct WorkUnit {
    path: PathBuf,
    algorithm: Arc<dyn Algorithm>,
    seed: u64,
    time_budget: Option<Duration>,
}

#[derive(Debug)]
pub struct UnitFailure {
    pub algorithm_id: String,
    pub path: PathBuf,
    pub error: UnitError,
}

#[derive(Debug)]
pub enum UnitOutcome {
    Completed(ResultRow),
    Failed(UnitFailure),
}

impl WorkUnit {
    pub fn new(path: impl Into<PathBuf>, algorithm: Arc<dyn Algorithm>, seed: u64) -> Self {
        Self {
            path: path.into(),
            algorithm,
            seed,
            time_budget: None,
        }
    }

    /// Forward a soft per-unit budget to the algorithm's bounded entry point.
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn algorithm_id(&self) -> &str {
        self.algorithm.id()
    }

    /// Runs the unit to a terminal state.
    pub fn execute(&self, loader: &dyn InstanceLoader) -> UnitOutcome {
        match self.try_execute(loader) {
            Ok(row) => UnitOutcome::Completed(row),
            Err(error) => UnitOutcome::Failed(UnitFailure {
                algorithm_id: self.algorithm.id().to_string(),
                path: self.path.clone(),
                error,
            }),
        }
    }

    fn try_execute(&self, loader: &dyn InstanceLoader) -> Result<ResultRow, UnitError> {
        let instance = run_caught(|| loader.load(&self.path).map_err(UnitError::from))?;

        let started = Instant::now();
        let solution = run_caught(|| {
            let result = match self.time_budget {
                Some(budget) => self.algorithm.run_bounded(&instance, self.seed, budget),
                None => self.algorithm.run(&instance, self.seed),
            };
            result.map_err(UnitError::from)
        })?;
        let elapsed = started.elapsed();

        debug!(
            "Unit {} on {} completed in {:?}",
            self.algorithm.id(),
            instance.name(),
            elapsed
        );
        Ok(ResultRow {
            algorithm_id: self.algorithm.id().to_string(),
            instance_name: instance.name().to_string(),
            objective_value: solution.objective_value(),
            elapsed,
        })
    }
}

fn run_caught<T>(f: impl FnOnce() -> Result<T, UnitError>) -> Result<T, UnitError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(UnitError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
