//! Model training and inference.
//!
//! The building blocks, leaves first:
//!
//! - [`sparse`], [`vectorizer`]: TF-IDF features over word n-grams
//! - [`tree`], [`forest`]: CART trees and a bootstrap random forest
//! - [`pipeline`]: a vectorizer and a forest fitted together
//! - [`split`], [`metrics`], [`search`]: stratified validation and grid search
//! - [`balance`], [`label`]: rare-class filtering and label encoding
//! - [`trainer`], [`error_analysis`], [`model`]: per-level training and bundles
//! - [`predictor`]: confidence-gated inference

pub mod balance;
pub mod error_analysis;
pub mod forest;
pub mod label;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod predictor;
pub mod search;
pub mod sparse;
pub mod split;
pub mod trainer;
pub mod tree;
pub mod vectorizer;

pub use balance::{ClassBalancer, ClassStats, DistributionReport};
pub use error_analysis::{ConfusionPair, ErrorAnalyzer, ErrorSummary};
pub use label::{LabelCodec, LabelSpace};
pub use metrics::{ClassificationReport, ConfusionMatrix};
pub use model::{Evaluation, ModelMetadata, TrainedModel};
pub use pipeline::TextPipeline;
pub use predictor::{LevelPrediction, Prediction, Predictor};
pub use search::{GridSearch, Hyperparameters, SearchResult};
pub use trainer::{LabeledTexts, ModelTrainer};
pub use vectorizer::TfIdfVectorizer;
