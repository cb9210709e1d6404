//! Error types for the cybercrime classifier.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! is [`ClassifierError`].
//!
//! Not every failure is an error. Text that cannot be normalized into enough
//! tokens is reported as `None` by the
//! [`TextNormalizer`](crate::analysis::normalizer::TextNormalizer), and a
//! weak prediction is reported as `"Unknown"` with confidence `0.0`. The
//! variants below are the failures that callers have to react to.
//!
//! # Examples
//!
//! ```
//! use cybercrime_classifier::error::{ClassifierError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ClassifierError::invalid_config("min_token_count must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

use crate::dataset::TaxonomyLevel;

/// The main error type for classifier operations.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// I/O errors (dataset files, model bundles, resource files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Too little data survived filtering or preprocessing to train.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A prediction was requested for a taxonomy level that has no model.
    #[error("Model for {level} is not trained")]
    ModelNotReady { level: TaxonomyLevel },

    /// A label or code outside the fitted label space.
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// Analysis-related errors (char filters, tokenization, filters).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Invalid configuration values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid arguments passed to a training or inference routine.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// CSV parsing errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary model bundle serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with [`ClassifierError`].
pub type Result<T> = std::result::Result<T, ClassifierError>;

impl ClassifierError {
    /// Create a new insufficient data error.
    pub fn insufficient_data<S: Into<String>>(msg: S) -> Self {
        ClassifierError::InsufficientData(msg.into())
    }

    /// Create a new model-not-ready error for a taxonomy level.
    pub fn model_not_ready(level: TaxonomyLevel) -> Self {
        ClassifierError::ModelNotReady { level }
    }

    /// Create a new unknown label error.
    pub fn unknown_label<S: Into<String>>(msg: S) -> Self {
        ClassifierError::UnknownLabel(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        ClassifierError::Analysis(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ClassifierError::InvalidConfig(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        ClassifierError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ClassifierError::Other(msg.into())
    }
}
