//! Result rows and their delimited-text encoding.

use std::time::Duration;

use optibench_core::DecimalSeparator;

/// Column order of the output table.
pub const RESULT_COLUMNS: [&str; 4] = [
    "algorithm_id",
    "instance_name",
    "objective_value",
    "elapsed_seconds",
];

/// One completed work unit. Elapsed time covers the algorithm-run phase
/// only, never instance loading.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub algorithm_id: String,
    pub instance_name: String,
    pub objective_value: f64,
    pub elapsed: Duration,
}

impl ResultRow {
    /// Serialize in column order under the given decimal convention.
    pub fn to_fields(&self, decimal: DecimalSeparator) -> [String; 4] {
        [
            self.algorithm_id.clone(),
            self.instance_name.clone(),
            format_float(self.objective_value, decimal),
            format_float(self.elapsed.as_secs_f64(), decimal),
        ]
    }

    /// Parse fields written by [`ResultRow::to_fields`]. `None` when the
    /// field count or the numeric fields don't match the convention, or the
    /// elapsed field is not a finite non-negative number of seconds.
    pub fn parse(fields: &[&str], decimal: DecimalSeparator) -> Option<Self> {
        let [algorithm_id, instance_name, objective, elapsed] = fields else {
            return None;
        };
        Some(Self {
            algorithm_id: (*algorithm_id).to_string(),
            instance_name: (*instance_name).to_string(),
            objective_value: parse_float(objective, decimal)?,
            elapsed: Duration::try_from_secs_f64(parse_float(elapsed, decimal)?).ok()?,
        })
    }
}

pub(crate) fn format_float(value: f64, decimal: DecimalSeparator) -> String {
    let text = value.to_string();
    match decimal {
        DecimalSeparator::Point => text,
        DecimalSeparator::Comma => text.replace('.', ","),
    }
}

fn parse_float(text: &str, decimal: DecimalSeparator) -> Option<f64> {
    let normalized = match decimal {
        DecimalSeparator::Point => text.to_string(),
        DecimalSeparator::Comma => text.replace(',', "."),
    };
    normalized.parse().ok()
}
