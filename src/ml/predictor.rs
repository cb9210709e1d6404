//! Confidence-gated inference over the per-level models.
//!
//! The predictor normalizes a raw narrative once and scores it with the
//! model of each taxonomy level. A level whose best class probability falls
//! below the confidence threshold answers `"Unknown"` with confidence `0.0`.
//! Levels are isolated from each other: a failure at one level is logged
//! and only degrades that level.
//!
//! ```text
//! raw text ──> TextNormalizer ──None──> Unknown / 0.0 at both levels
//!                   │
//!                   └─Some──> category model ──────> gate ──> category
//!                        └──> sub_category model ──> gate ──> sub_category
//! ```

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::TextNormalizer;
use crate::dataset::{TaxonomyLevel, UNKNOWN_LABEL};
use crate::error::{ClassifierError, Result};
use crate::ml::forest::argmax;
use crate::ml::model::TrainedModel;

/// Default minimum confidence for a non-Unknown answer.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// The answer of one taxonomy level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPrediction {
    pub label: String,
    pub confidence: f64,
}

impl LevelPrediction {
    /// The `"Unknown"` answer with confidence `0.0`.
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

/// Classification of one narrative at both taxonomy levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub category: String,
    pub category_confidence: f64,
    pub sub_category: String,
    pub sub_category_confidence: f64,
}

impl Prediction {
    /// Unknown at both levels.
    pub fn unknown() -> Self {
        Self::from_levels(LevelPrediction::unknown(), LevelPrediction::unknown())
    }

    pub fn from_levels(category: LevelPrediction, sub_category: LevelPrediction) -> Self {
        Self {
            category: category.label,
            category_confidence: category.confidence,
            sub_category: sub_category.label,
            sub_category_confidence: sub_category.confidence,
        }
    }

    /// The answer at `level`.
    pub fn level(&self, level: TaxonomyLevel) -> LevelPrediction {
        match level {
            TaxonomyLevel::Category => LevelPrediction {
                label: self.category.clone(),
                confidence: self.category_confidence,
            },
            TaxonomyLevel::SubCategory => LevelPrediction {
                label: self.sub_category.clone(),
                confidence: self.sub_category_confidence,
            },
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.2}) / {} ({:.2})",
            self.category, self.category_confidence, self.sub_category, self.sub_category_confidence
        )
    }
}

/// Serves predictions from trained per-level models.
#[derive(Debug, Clone)]
pub struct Predictor {
    normalizer: TextNormalizer,
    threshold: f64,
    models: BTreeMap<TaxonomyLevel, TrainedModel>,
}

impl Predictor {
    /// Create a predictor with no models.
    pub fn new(normalizer: TextNormalizer, threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ClassifierError::invalid_config(format!(
                "confidence_threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(Self {
            normalizer,
            threshold,
            models: BTreeMap::new(),
        })
    }

    /// Install the model of its level, replacing any previous one.
    pub fn set_model(&mut self, model: TrainedModel) {
        self.models.insert(model.level(), model);
    }

    pub fn with_model(mut self, model: TrainedModel) -> Self {
        self.set_model(model);
        self
    }

    pub fn model(&self, level: TaxonomyLevel) -> Option<&TrainedModel> {
        self.models.get(&level)
    }

    pub fn has_model(&self, level: TaxonomyLevel) -> bool {
        self.models.contains_key(&level)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Classify a raw narrative at both levels.
    ///
    /// Never fails: unusable text and failing levels answer `"Unknown"`.
    pub fn predict(&self, raw: &str) -> Prediction {
        let Some(normalized) = self.normalizer.normalize(raw) else {
            debug!("Unusable narrative, answering Unknown");
            return Prediction::unknown();
        };

        let answer = |level: TaxonomyLevel| match self.predict_normalized(level, &normalized) {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!("Prediction failed for {level}: {e}");
                LevelPrediction::unknown()
            }
        };

        Prediction::from_levels(answer(TaxonomyLevel::Category), answer(TaxonomyLevel::SubCategory))
    }

    /// Classify many raw narratives in parallel.
    pub fn predict_batch<S: AsRef<str> + Sync>(&self, raw: &[S]) -> Vec<Prediction> {
        raw.par_iter().map(|text| self.predict(text.as_ref())).collect()
    }

    /// Classify a raw narrative at one level, surfacing errors.
    pub fn predict_level(&self, level: TaxonomyLevel, raw: &str) -> Result<LevelPrediction> {
        if !self.has_model(level) {
            return Err(ClassifierError::model_not_ready(level));
        }
        match self.normalizer.normalize(raw) {
            Some(normalized) => self.predict_normalized(level, &normalized),
            None => Ok(LevelPrediction::unknown()),
        }
    }

    /// Classify already-normalized text at one level.
    pub fn predict_normalized(&self, level: TaxonomyLevel, normalized: &str) -> Result<LevelPrediction> {
        let model = self
            .models
            .get(&level)
            .ok_or_else(|| ClassifierError::model_not_ready(level))?;

        let proba = model.predict_proba(normalized)?;
        if proba.is_empty() {
            return Err(ClassifierError::other(format!("Empty probability vector for {level}")));
        }
        let (code, confidence) = argmax(&proba);

        if confidence < self.threshold {
            return Ok(LevelPrediction::unknown());
        }
        Ok(LevelPrediction {
            label: model.labels().decode(code as u32)?.to_string(),
            confidence,
        })
    }
}
