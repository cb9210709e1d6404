//! Trained per-level models and their on-disk bundles.
//!
//! A bundle holds everything needed to serve one taxonomy level: the fitted
//! pipeline, the [`LabelSpace`] its codes refer to, the chosen
//! hyperparameters and the validation diagnostics. Codes are meaningless
//! without their label space, so the two are never stored apart.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::dataset::TaxonomyLevel;
use crate::error::{ClassifierError, Result};
use crate::ml::error_analysis::ErrorSummary;
use crate::ml::label::LabelSpace;
use crate::ml::metrics::ClassificationReport;
use crate::ml::pipeline::TextPipeline;
use crate::ml::search::Hyperparameters;

/// Bundle format version.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Provenance of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Unique model id.
    pub id: String,
    /// Bundle format version.
    pub format_version: u32,
    /// Crate version that trained the model.
    pub crate_version: String,
    pub trained_at: DateTime<Utc>,
    /// Rows the final pipeline was fitted on.
    pub n_train_samples: usize,
    /// Rows the validation report was computed on.
    pub n_validation_samples: usize,
    /// Mean cross-validated weighted F1 of the chosen parameters, if searched.
    pub cv_score: Option<f64>,
}

impl ModelMetadata {
    pub fn new(n_train_samples: usize, n_validation_samples: usize, cv_score: Option<f64>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            format_version: MODEL_FORMAT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: Utc::now(),
            n_train_samples,
            n_validation_samples,
            cv_score,
        }
    }
}

/// Validation diagnostics of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub report: ClassificationReport,
    pub errors: ErrorSummary,
}

/// A fitted model for one taxonomy level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    level: TaxonomyLevel,
    pipeline: TextPipeline,
    labels: LabelSpace,
    params: Hyperparameters,
    evaluation: Option<Evaluation>,
    metadata: ModelMetadata,
}

impl TrainedModel {
    pub fn new(
        level: TaxonomyLevel,
        pipeline: TextPipeline,
        labels: LabelSpace,
        params: Hyperparameters,
        evaluation: Option<Evaluation>,
        metadata: ModelMetadata,
    ) -> Result<Self> {
        if pipeline.n_classes() != labels.len() {
            return Err(ClassifierError::invalid_argument(format!(
                "Pipeline scores {} classes but the label space has {}",
                pipeline.n_classes(),
                labels.len()
            )));
        }
        Ok(Self {
            level,
            pipeline,
            labels,
            params,
            evaluation,
            metadata,
        })
    }

    pub fn level(&self) -> TaxonomyLevel {
        self.level
    }

    pub fn pipeline(&self) -> &TextPipeline {
        &self.pipeline
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    pub fn params(&self) -> &Hyperparameters {
        &self.params
    }

    /// Validation report and confusion pairs, when a validation set existed.
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Class probabilities of a normalized text, indexed by label code.
    pub fn predict_proba(&self, normalized: &str) -> Result<Vec<f64>> {
        self.pipeline.predict_proba(normalized)
    }

    /// Write the bundle to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        info!("Saved {} model {} to {}", self.level, self.metadata.id, path.display());
        Ok(())
    }

    /// Read a bundle written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let model: TrainedModel = bincode::deserialize_from(reader)?;

        if model.metadata.format_version != MODEL_FORMAT_VERSION {
            return Err(ClassifierError::invalid_config(format!(
                "{} has bundle format {}, expected {}",
                path.display(),
                model.metadata.format_version,
                MODEL_FORMAT_VERSION
            )));
        }
        if model.pipeline.n_classes() != model.labels.len() {
            return Err(ClassifierError::other(format!(
                "{} is corrupt: pipeline and label space disagree",
                path.display()
            )));
        }

        info!(
            "Loaded {} model {} ({} labels) from {}",
            model.level,
            model.metadata.id,
            model.labels.len(),
            path.display()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::{ForestConfig, VectorizerConfig};
    use crate::ml::pipeline::tests::corpus;

    fn fitted() -> TrainedModel {
        // The corpus codes fraud as 0; the label space sorts "Hacking" first.
        let (texts, labels) = corpus();
        let labels: Vec<usize> = labels.iter().map(|&l| 1 - l).collect();
        let forest = ForestConfig {
            n_estimators: 10,
            ..ForestConfig::default()
        };
        let vectorizer = VectorizerConfig::default();
        let params = Hyperparameters::from_configs(&vectorizer, &forest);
        let space = LabelSpace::from_labels(["Hacking", "Online Financial Fraud"]);
        let pipeline = TextPipeline::fit(vectorizer, forest, &texts, &labels, space.len()).unwrap();

        TrainedModel::new(
            TaxonomyLevel::Category,
            pipeline,
            space,
            params,
            None,
            ModelMetadata::new(texts.len(), 0, None),
        )
        .unwrap()
    }

    #[test]
    fn test_label_space_must_match() {
        let (texts, labels) = corpus();
        let vectorizer = VectorizerConfig::default();
        let forest = ForestConfig {
            n_estimators: 3,
            ..ForestConfig::default()
        };
        let params = Hyperparameters::from_configs(&vectorizer, &forest);
        let pipeline = TextPipeline::fit(vectorizer, forest, &texts, &labels, 2).unwrap();

        let result = TrainedModel::new(
            TaxonomyLevel::Category,
            pipeline,
            LabelSpace::from_labels(["Hacking", "Online Financial Fraud"]),
            params,
            None,
            ModelMetadata::new(texts.len(), 0, None),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let model = fitted();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("category.model");

        model.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();

        assert_eq!(loaded.level(), TaxonomyLevel::Category);
        assert_eq!(loaded.labels(), model.labels());
        assert_eq!(loaded.metadata(), model.metadata());

        let text = "upi fraud money debited account";
        assert_eq!(
            loaded.predict_proba(text).unwrap(),
            model.predict_proba(text).unwrap()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = TrainedModel::load(dir.path().join("missing.model"));
        assert!(matches!(result, Err(ClassifierError::Io(_))));
    }
}
