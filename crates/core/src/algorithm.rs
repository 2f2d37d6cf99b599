use std::time::Duration;

use crate::instance::ProblemInstance;
use crate::solution::Solution;

/// Error type for algorithm execution.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("algorithm failed: {0}")]
    Failed(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A pluggable optimization algorithm.
///
/// One instance may serve many work units concurrently, so implementations
/// must be stateless or internally re-entrant; per-run state belongs in
/// locals seeded from the `seed` argument.
pub trait Algorithm: Send + Sync {
    /// Identifier used in result rows, logs and metrics.
    fn id(&self) -> &str;

    /// Solve `instance` deterministically for the given seed.
    fn run(&self, instance: &ProblemInstance, seed: u64) -> Result<Solution, SolveError>;

    /// Solve with a soft time budget. The default ignores the budget and
    /// delegates to [`Algorithm::run`]; honoring it is up to the
    /// implementation, and the engine never kills a unit that overruns.
    fn run_bounded(
        &self,
        instance: &ProblemInstance,
        seed: u64,
        budget: Duration,
    ) -> Result<Solution, SolveError> {
        let _ = budget;
        self.run(instance, seed)
    }
}

impl std::fmt::Debug for dyn Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Algorithm").field("id", &self.id()).finish()
    }
}
