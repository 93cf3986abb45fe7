//! Error types for joiner-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while joining tables
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read the key candidate config
    #[error("failed to read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config is not a JSON list of strings
    #[error("config '{path}' is not a list of key column names: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Config parsed but names no usable candidate
    #[error("config '{path}' does not name any key column")]
    NoKeyCandidates { path: PathBuf },

    /// Failed to read an input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error while expanding inputs
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// No header column matched any key candidate
    #[error("no key column found in '{path}' matching keys: {candidates:?}")]
    KeyNotFound {
        path: PathBuf,
        candidates: Vec<String>,
    },

    /// Fewer than two input files to merge
    #[error("provide at least two CSV files to merge (got {found})")]
    TooFewInputs { found: usize },

    /// Output file could not be created
    #[error("failed to create output '{path}': {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be written
    #[error("failed to write output '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
