//! Random sampling baseline for max-cut.

use std::time::{Duration, Instant};

use optibench_core::{Algorithm, ProblemInstance, SolveError, Solution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_SAMPLES: usize = 200;

/// Keeps the best of `samples` uniformly random assignments. The bounded
/// variant stops sampling once the budget is spent but always draws at
/// least one sample so a solution is returned.
pub struct RandomSearch {
    id: String,
    samples: usize,
}

impl RandomSearch {
    pub fn new() -> Self {
        Self {
            id: "random".into(),
            samples: DEFAULT_SAMPLES,
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            samples: DEFAULT_SAMPLES,
        }
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    fn sample(
        &self,
        instance: &ProblemInstance,
        seed: u64,
        budget: Option<Duration>,
    ) -> Result<Solution, SolveError> {
        if self.samples == 0 {
            return Err(SolveError::InvalidParameter(
                "samples must be at least 1".into(),
            ));
        }
        let started = Instant::now();
        let n = instance.vertex_count();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut best: Option<Solution> = None;

        for drawn in 0..self.samples {
            if drawn > 0 {
                if let Some(limit) = budget {
                    if started.elapsed() >= limit {
                        break;
                    }
                }
            }
            let assignment: Vec<bool> = (0..n).map(|_| rng.gen()).collect();
            let candidate = Solution::new(instance, assignment);
            match &best {
                Some(b) if b.objective_value() >= candidate.objective_value() => {}
                _ => best = Some(candidate),
            }
        }

        best.ok_or_else(|| SolveError::Failed("no samples drawn".into()))
    }
}

impl Default for RandomSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for RandomSearch {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, instance: &ProblemInstance, seed: u64) -> Result<Solution, SolveError> {
        self.sample(instance, seed, None)
    }

    fn run_bounded(
        &self,
        instance: &ProblemInstance,
        seed: u64,
        budget: Duration,
    ) -> Result<Solution, SolveError> {
        self.sample(instance, seed, Some(budget))
    }
}
