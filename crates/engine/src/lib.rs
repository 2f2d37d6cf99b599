//! Batch execution engine: instance discovery, the worker pool, the CSV
//! result sink, and experiment orchestration on top of `optibench-core`.

pub mod discover;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod pool;
pub mod row;
pub mod sink;
pub mod unit;

pub use discover::discover_instances;
pub use error::EngineError;
pub use experiment::Experiment;
pub use metrics::{AlgorithmStats, ExperimentMetrics};
pub use pool::{DrainReport, RunContext, WorkerPool};
pub use row::{RESULT_COLUMNS, ResultRow};
pub use sink::{ResultSink, SinkError};
pub use unit::{UnitError, UnitFailure, UnitOutcome, WorkUnit};
