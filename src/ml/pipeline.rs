//! Vectorizer + forest pipeline.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ForestConfig, VectorizerConfig};
use crate::error::{ClassifierError, Result};
use crate::ml::forest::{RandomForest, argmax};
use crate::ml::vectorizer::TfIdfVectorizer;

/// A fitted text classification pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPipeline {
    vectorizer: TfIdfVectorizer,
    forest: RandomForest,
    n_classes: usize,
}

impl TextPipeline {
    /// Fit a vectorizer and a forest on normalized texts.
    pub fn fit(
        vectorizer_config: VectorizerConfig,
        forest_config: ForestConfig,
        texts: &[String],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<Self> {
        if texts.len() != labels.len() {
            return Err(ClassifierError::invalid_argument(format!(
                "Length mismatch: {} texts, {} labels",
                texts.len(),
                labels.len()
            )));
        }

        let mut vectorizer = TfIdfVectorizer::new(vectorizer_config)?;
        let features = vectorizer.fit_transform(texts)?;

        let mut forest = RandomForest::new(forest_config);
        forest.fit(&features, labels, n_classes, vectorizer.vocabulary_size())?;

        debug!(
            "Fitted pipeline: {} samples, {} features, {} trees",
            texts.len(),
            vectorizer.vocabulary_size(),
            forest.n_trees()
        );

        Ok(Self {
            vectorizer,
            forest,
            n_classes,
        })
    }

    /// Class probabilities of one normalized text.
    pub fn predict_proba(&self, text: &str) -> Result<Vec<f64>> {
        self.forest.predict_proba(&self.vectorizer.transform(text))
    }

    /// Most probable class of one normalized text.
    pub fn predict(&self, text: &str) -> Result<usize> {
        Ok(argmax(&self.predict_proba(text)?).0)
    }

    /// Predict many texts in parallel.
    pub fn predict_batch(&self, texts: &[String]) -> Result<Vec<usize>> {
        texts.par_iter().map(|t| self.predict(t)).collect()
    }

    /// Number of classes the pipeline scores.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// The fitted vectorizer.
    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    /// The fitted forest.
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}
