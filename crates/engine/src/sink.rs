//! Concurrency-safe append-only CSV output.
//!
//! All workers of a run share one [`ResultSink`]. Every append writes one
//! complete line under the sink mutex and flushes before releasing it, so
//! rows never interleave and previously written rows survive a failed
//! append. The destination is opened in append mode and existing content is
//! never truncated.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use optibench_core::DecimalSeparator;
use thiserror::Error;

use crate::row::{RESULT_COLUMNS, ResultRow};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink lock poisoned: {0}")]
    Poisoned(String),
}

pub struct ResultSink {
    path: PathBuf,
    delimiter: char,
    decimal: DecimalSeparator,
    state: Mutex<SinkState>,
}

struct SinkState {
    writer: BufWriter<File>,
    header_written: bool,
}

impl ResultSink {
    /// Opens `path` for appending, creating the file and any missing parent
    /// directories. A destination that already has content keeps it and is
    /// treated as already carrying a header.
    pub fn create(
        path: impl AsRef<Path>,
        delimiter: char,
        decimal: DecimalSeparator,
    ) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let has_content = file.metadata()?.len() > 0;
        Ok(Self {
            path,
            delimiter,
            decimal,
            state: Mutex::new(SinkState {
                writer: BufWriter::new(file),
                header_written: has_content,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the column header exactly once per destination. Safe to call
    /// from any number of threads; later calls are no-ops, as is the first
    /// call on a resumed file.
    pub fn write_header(&self) -> Result<(), SinkError> {
        let mut state = self.lock()?;
        if state.header_written {
            return Ok(());
        }
        let fields: Vec<String> = RESULT_COLUMNS.iter().map(|c| c.to_string()).collect();
        let line = self.encode_line(&fields);
        state.writer.write_all(line.as_bytes())?;
        state.writer.flush()?;
        state.header_written = true;
        Ok(())
    }

    /// Appends one row. Thread-safe; each call produces exactly one complete
    /// line. An I/O failure is returned to the caller and leaves earlier
    /// rows intact.
    pub fn append(&self, row: &ResultRow) -> Result<(), SinkError> {
        let fields = row.to_fields(self.decimal);
        let line = self.encode_line(&fields);
        let mut state = self.lock()?;
        state.writer.write_all(line.as_bytes())?;
        state.writer.flush()?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, SinkState>, SinkError> {
        self.state
            .lock()
            .map_err(|e| SinkError::Poisoned(e.to_string()))
    }

    fn encode_line(&self, fields: &[String]) -> String {
        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            push_field(&mut line, field, self.delimiter);
        }
        line.push('\n');
        line
    }
}

/// Quotes a field when it contains the delimiter, a quote or a line break,
/// doubling embedded quotes.
fn push_field(line: &mut String, field: &str, delimiter: char) {
    let needs_quoting = field
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');
    if !needs_quoting {
        line.push_str(field);
        return;
    }
    line.push('"');
    for c in field.chars() {
        if c == '"' {
            line.push('"');
        }
        line.push(c);
    }
    line.push('"');
}
