use std::path::PathBuf;

use thiserror::Error;

use crate::sink::SinkError;

/// Run-level failures that abort an experiment before or between units.
/// Per-unit faults never surface here; they end as failure records.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("input root {} is not a directory", .0.display())]
    InputRoot(PathBuf),
    #[error("result sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("worker pool error: {0}")]
    Pool(String),
}
