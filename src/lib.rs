//! # Cybercrime Classifier
//!
//! Classifies free-text crime report narratives into a two-level taxonomy
//! (category and sub-category).
//!
//! ## Features
//!
//! - Deterministic narrative cleaning with stop words, lemmatization and n-grams
//! - Rare-class filtering with a catch-all `Unknown` class
//! - TF-IDF features and a bootstrap random forest per taxonomy level
//! - Grid search with stratified cross-validation
//! - Confidence-gated predictions
//! - Model bundles on disk

pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ml;

pub mod prelude {
    pub use crate::analysis::{LinguisticResources, TextNormalizer};
    pub use crate::classifier::CrimeClassifier;
    pub use crate::config::ClassifierConfig;
    pub use crate::dataset::{Dataset, DatasetLoader, Record, TaxonomyLevel};
    pub use crate::error::{ClassifierError, Result};
    pub use crate::ml::{LevelPrediction, Prediction};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
