//! Greedy construction for max-cut.
//!
//! Vertices are visited in a seeded random order and each is placed on the
//! side that cuts more weight against the vertices already placed, with
//! random tie-breaks. Single pass, deterministic per (instance, seed).

use optibench_core::{Algorithm, ProblemInstance, SolveError, Solution};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub struct GreedyCut {
    id: String,
}

impl GreedyCut {
    pub fn new() -> Self {
        Self { id: "greedy".into() }
    }

    /// Same algorithm under a different id, so one solver type can appear
    /// several times in a single run.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for GreedyCut {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for GreedyCut {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, instance: &ProblemInstance, seed: u64) -> Result<Solution, SolveError> {
        let n = instance.vertex_count();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);

        let mut assignment = vec![false; n];
        let mut placed = vec![false; n];
        for &v in &order {
            let mut gain_true = 0.0;
            let mut gain_false = 0.0;
            for &(u, w) in instance.neighbors(v) {
                if placed[u] {
                    if assignment[u] {
                        gain_false += w;
                    } else {
                        gain_true += w;
                    }
                }
            }
            assignment[v] = if gain_true > gain_false {
                true
            } else if gain_false > gain_true {
                false
            } else {
                rng.gen()
            };
            placed[v] = true;
        }

        Ok(Solution::new(instance, assignment))
    }
}
