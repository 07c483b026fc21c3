//! Error types shared by both pipelines.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading names, talking to the registry,
/// or writing output.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source file could not be opened at all.
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV writer or reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input had no header row.
    #[error("{0} appears to be empty or invalid")]
    EmptyInput(PathBuf),

    /// Missing or malformed configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Contract artifact missing, unreadable, or lacking the expected function.
    #[error("Contract interface error: {0}")]
    Interface(String),

    /// Registry endpoint unreachable during startup.
    #[error("Registry connection failed: {0}")]
    Connection(String),

    /// A single ownership lookup failed.
    #[error("Registry lookup failed: {0}")]
    Lookup(String),

    /// A single ownership lookup did not answer in time.
    #[error("Registry lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The user interrupted the run.
    #[error("Operation cancelled by user, no output written")]
    Interrupted,

    /// Malformed value in a previously written output file.
    #[error("Malformed record at line {line}: {reason}")]
    Record { line: u64, reason: String },
}
