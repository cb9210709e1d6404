//! Configuration for training and prediction.
//!
//! [`ClassifierConfig`] gathers every tunable of the classifier in one
//! serde-serializable structure. A JSON file only needs to name the fields
//! it changes:
//!
//! ```json
//! {
//!   "balance": { "min_samples_per_class": 5 },
//!   "prediction": { "confidence_threshold": 0.4 }
//! }
//! ```
//!
//! # Examples
//!
//! ```
//! use cybercrime_classifier::config::ClassifierConfig;
//!
//! let config = ClassifierConfig::default();
//! assert_eq!(config.preprocess.min_token_count, 3);
//! assert_eq!(config.forest.n_estimators, 200);
//! assert_eq!(config.prediction.confidence_threshold, 0.3);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Top-level classifier configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Text normalization settings.
    pub preprocess: PreprocessConfig,
    /// Rare-class filtering settings.
    pub balance: BalanceConfig,
    /// TF-IDF vectorizer settings.
    pub vectorizer: VectorizerConfig,
    /// Random forest settings.
    pub forest: ForestConfig,
    /// Hyperparameter search settings.
    pub search: SearchConfig,
    /// Hold-out validation settings.
    pub validation: ValidationConfig,
    /// Inference settings.
    pub prediction: PredictionConfig,
}

impl ClassifierConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ClassifierError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ClassifierConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.preprocess.min_token_count == 0 {
            return Err(ClassifierError::invalid_config(
                "preprocess.min_token_count must be positive",
            ));
        }
        if self.balance.min_samples_per_class == 0 {
            return Err(ClassifierError::invalid_config(
                "balance.min_samples_per_class must be positive",
            ));
        }

        self.vectorizer.validate()?;
        self.forest.validate()?;
        self.search.validate()?;

        if !(self.validation.test_size > 0.0 && self.validation.test_size < 1.0) {
            return Err(ClassifierError::invalid_config(format!(
                "validation.test_size must be in (0, 1), got {}",
                self.validation.test_size
            )));
        }
        if !(0.0..=1.0).contains(&self.prediction.confidence_threshold) {
            return Err(ClassifierError::invalid_config(format!(
                "prediction.confidence_threshold must be in [0, 1], got {}",
                self.prediction.confidence_threshold
            )));
        }

        Ok(())
    }
}

/// Text normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Normalized texts with fewer tokens are unusable.
    pub min_token_count: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { min_token_count: 3 }
    }
}

/// Rare-class filtering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Labels with fewer samples are dropped.
    pub min_samples_per_class: usize,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            min_samples_per_class: 2,
        }
    }
}

/// TF-IDF vectorizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Keep only the most frequent terms (`None` keeps all).
    pub max_features: Option<usize>,
    /// Smallest and largest word n-gram size.
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in.
    pub max_df: f64,
    /// Regex selecting the words of a document.
    pub token_pattern: String,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: Some(10_000),
            ngram_range: (1, 3),
            min_df: 2,
            max_df: 0.95,
            token_pattern: r"\b\w+\b".to_string(),
        }
    }
}

impl VectorizerConfig {
    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || max_n < min_n {
            return Err(ClassifierError::invalid_config(format!(
                "vectorizer.ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        if self.max_features == Some(0) {
            return Err(ClassifierError::invalid_config(
                "vectorizer.max_features must be positive",
            ));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(ClassifierError::invalid_config(format!(
                "vectorizer.max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        regex::Regex::new(&self.token_pattern).map_err(|e| {
            ClassifierError::invalid_config(format!("vectorizer.token_pattern is invalid: {e}"))
        })?;
        Ok(())
    }
}

/// How samples of each class are weighted during tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    /// Every sample has weight 1.
    Uniform,
    /// `n_samples / (n_classes * count(class))`, uniform for a single class.
    Balanced,
}

/// Number of features examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `sqrt(n_features)`, at least one.
    Sqrt,
    /// `log2(n_features)`, at least one.
    Log2,
    /// Every feature.
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` features.
    pub fn resolve(&self, n_features: usize) -> usize {
        let count = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::All => n_features,
        };
        count.clamp(1, n_features.max(1))
    }
}

/// Random forest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Maximum tree depth (`None` grows until leaves are pure).
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split.
    pub min_samples_split: usize,
    /// Minimum samples in each leaf.
    pub min_samples_leaf: usize,
    /// Features examined per split.
    pub max_features: MaxFeatures,
    /// Draw a bootstrap sample for every tree.
    pub bootstrap: bool,
    /// Seed of the forest's random number generator.
    pub seed: u64,
    /// Class weighting scheme.
    pub class_weight: ClassWeight,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: Some(20),
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl ForestConfig {
    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ClassifierError::invalid_config(
                "forest.n_estimators must be positive",
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ClassifierError::invalid_config(
                "forest.max_depth must be positive",
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ClassifierError::invalid_config(
                "forest.min_samples_split must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ClassifierError::invalid_config(
                "forest.min_samples_leaf must be positive",
            ));
        }
        Ok(())
    }
}

/// Values tried by the grid search. Empty lists keep the base value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    /// Candidate tree depths.
    pub max_depth: Vec<Option<usize>>,
    /// Candidate minimum split sizes.
    pub min_samples_split: Vec<usize>,
    /// Candidate forest sizes.
    pub n_estimators: Vec<usize>,
    /// Candidate vocabulary caps.
    pub max_features: Vec<Option<usize>>,
    /// Candidate n-gram ranges.
    pub ngram_range: Vec<(usize, usize)>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            max_depth: vec![Some(10), Some(20), None],
            min_samples_split: vec![2, 5],
            n_estimators: vec![100, 200],
            max_features: vec![Some(5_000), Some(10_000)],
            ngram_range: vec![(1, 2), (1, 3)],
        }
    }
}

impl ParamGrid {
    /// A grid with no alternatives: only the base configuration is tried.
    pub fn empty() -> Self {
        Self {
            max_depth: Vec::new(),
            min_samples_split: Vec::new(),
            n_estimators: Vec::new(),
            max_features: Vec::new(),
            ngram_range: Vec::new(),
        }
    }
}

/// Hyperparameter search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Run the grid search; otherwise the base configuration is fitted.
    pub enabled: bool,
    /// Number of stratified cross-validation folds.
    pub cv_folds: usize,
    /// Candidate values.
    pub grid: ParamGrid,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cv_folds: 5,
            grid: ParamGrid::default(),
        }
    }
}

impl SearchConfig {
    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(ClassifierError::invalid_config(
                "search.cv_folds must be at least 2",
            ));
        }
        if self.grid.n_estimators.contains(&0) {
            return Err(ClassifierError::invalid_config(
                "search.grid.n_estimators must be positive",
            ));
        }
        if self.grid.min_samples_split.iter().any(|&s| s < 2) {
            return Err(ClassifierError::invalid_config(
                "search.grid.min_samples_split must be at least 2",
            ));
        }
        if self.grid.max_depth.contains(&Some(0)) || self.grid.max_features.contains(&Some(0)) {
            return Err(ClassifierError::invalid_config(
                "search.grid depths and vocabulary caps must be positive",
            ));
        }
        if self
            .grid
            .ngram_range
            .iter()
            .any(|&(min_n, max_n)| min_n == 0 || max_n < min_n)
        {
            return Err(ClassifierError::invalid_config(
                "search.grid.ngram_range entries must satisfy 1 <= min <= max",
            ));
        }
        Ok(())
    }
}

/// Hold-out validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fraction of the training data held out when no test set is given.
    pub test_size: f64,
    /// Seed of the stratified split.
    pub seed: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Predictions with a lower top probability are reported as Unknown.
    pub confidence_threshold: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.balance.min_samples_per_class, 2);
        assert_eq!(config.vectorizer.max_features, Some(10_000));
        assert_eq!(config.vectorizer.ngram_range, (1, 3));
        assert_eq!(config.vectorizer.min_df, 2);
        assert_eq!(config.forest.max_depth, Some(20));
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.search.cv_folds, 5);
        assert_eq!(config.validation.test_size, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = ClassifierConfig::from_json_str(
            r#"{"balance": {"min_samples_per_class": 5}, "forest": {"max_depth": null}}"#,
        )
        .unwrap();

        assert_eq!(config.balance.min_samples_per_class, 5);
        assert_eq!(config.forest.max_depth, None);
        assert_eq!(config.forest.n_estimators, 200);
        assert_eq!(config.preprocess.min_token_count, 3);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ClassifierConfig::default();
        config.prediction.confidence_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ClassifierError::InvalidConfig(_))
        ));

        let mut config = ClassifierConfig::default();
        config.vectorizer.ngram_range = (2, 1);
        assert!(config.validate().is_err());

        let mut config = ClassifierConfig::default();
        config.search.cv_folds = 1;
        assert!(config.validate().is_err());

        assert!(ClassifierConfig::from_json_str(r#"{"forest": {"n_estimators": 0}}"#).is_err());
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(100), 10);
        assert_eq!(MaxFeatures::Sqrt.resolve(0), 1);
        assert_eq!(MaxFeatures::Log2.resolve(1), 1);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
    }
}
