//! Host-visible error records.
//!
//! Operation entry points push one [`ErrorRecord`] per failure so the host
//! can tell which sub-step failed without inspecting the returned error.

use std::fmt;
use std::sync::Mutex;

use crate::error::{ConnectorError, ErrorKind};

/// Sub-step of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validate,
    Resolve,
    Transport,
    Parse,
    Reference,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::Resolve => "resolve",
            Stage::Transport => "transport",
            Stage::Parse => "parse",
            Stage::Reference => "reference",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub operation: &'static str,
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorRecord {
    pub fn from_error(operation: &'static str, err: &ConnectorError) -> Self {
        Self {
            operation,
            stage: err.stage(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed during {}: {}", self.operation, self.stage, self.message)
    }
}

/// Thread-safe stack of error records.
#[derive(Debug, Default)]
pub struct ErrorStack {
    records: Mutex<Vec<ErrorRecord>>,
}

impl ErrorStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: ErrorRecord) {
        self.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn last(&self) -> Option<ErrorRecord> {
        self.lock().last().cloned()
    }

    /// Snapshot of every record, oldest first.
    pub fn records(&self) -> Vec<ErrorRecord> {
        self.lock().clone()
    }

    /// Removes and returns every record, oldest first.
    pub fn drain(&self) -> Vec<ErrorRecord> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ErrorRecord>> {
        // A poisoned stack still holds valid records.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}
