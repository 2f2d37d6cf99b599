//! Candidate solutions and their objective values.

use crate::instance::ProblemInstance;

/// A two-sided vertex assignment with its cut weight, computed once on
/// construction. Larger objective values are better.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    assignment: Vec<bool>,
    objective: f64,
}

impl Solution {
    pub fn new(instance: &ProblemInstance, assignment: Vec<bool>) -> Self {
        let objective = instance.cut_weight(&assignment);
        Self {
            assignment,
            objective,
        }
    }

    /// The total weight crossing the cut.
    pub fn objective_value(&self) -> f64 {
        self.objective
    }

    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }
}
