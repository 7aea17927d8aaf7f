use std::path::PathBuf;
use thiserror::Error;

use crate::models::LogField;

/// sysexits-style process exit codes
pub mod exit_code {
    pub const OK: i32 = 0;
    pub const USAGE: i32 = 64;
    pub const DATA_ERR: i32 = 65;
    pub const NO_INPUT: i32 = 66;
    pub const SOFTWARE: i32 = 70;
    pub const IO_ERR: i32 = 74;
}

/// Failure to build a line grammar
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid grammar pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("grammar pattern is missing capture group '{}'", .0.capture_name())]
    MissingCapture(LogField),
}

/// Errors raised by the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// A matched line carried a non-integer value in a numeric field
    #[error("field '{}' is not an integer: '{value}'", .field.capture_name())]
    InvalidField { field: LogField, value: String },

    /// Nothing was ingested, so there is nothing to summarise
    #[error("no log line matched the combined+ format")]
    EmptyLog,
}

/// Errors surfaced by a full report run
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{} file not found or not readable: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while reading line {line_number}: {source}")]
    Io {
        line_number: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("failed to write report: {0}")]
    Output(String),
}

impl ReportError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::FileAccess { .. } => exit_code::NO_INPUT,
            ReportError::Io { .. } => exit_code::IO_ERR,
            ReportError::Aggregate(AggregateError::EmptyLog) => exit_code::DATA_ERR,
            // InvalidField never escapes the run loop
            ReportError::Aggregate(AggregateError::InvalidField { .. }) => exit_code::SOFTWARE,
            ReportError::Output(_) => exit_code::IO_ERR,
        }
    }
}
