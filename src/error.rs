//! Error types for lifedash operations.
//!
//! Only genuine failures live here. Empty filter results, undersized
//! regression samples, degenerate fits, and malformed numeric cells are
//! ordinary outcomes and are modelled as values in the modules that
//! produce them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for lifedash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading data or driving a dashboard session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Error importing CSV data.
    #[error("CSV import error at line {line}: {reason}")]
    CsvImport {
        /// Line number where the error occurred.
        line: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// A column required to build records is absent from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// The dataset load task failed before producing a dataset.
    #[error("Dataset load failed: {path}: {reason}")]
    DatasetLoad {
        /// Path of the source file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// `Start` was requested while playback is already running.
    #[error("Playback is already running at year {year}; stop it before starting again")]
    PlaybackAlreadyRunning {
        /// Year currently shown by the running playback.
        year: i32,
    },

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
