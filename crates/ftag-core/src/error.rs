//! Error types for ftagweight

use thiserror::Error;

/// ftagweight error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error (bad config, bad calibration file, non-finite kinematics)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A calibration handle required for evaluation was never resolved
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The calibration provider could not supply a scale factor
    #[error("Calibration lookup error: {0}")]
    Lookup(String),

    /// Per-jet input sequences disagree in length
    #[error("Shape error: `{what}` has length {got}, expected {expected}")]
    Shape {
        /// Name of the offending input sequence.
        what: &'static str,
        /// Expected length (number of jets).
        expected: usize,
        /// Actual length.
        got: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
