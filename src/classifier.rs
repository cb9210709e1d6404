//! The two-level crime report classifier.
//!
//! [`CrimeClassifier`] ties the pieces together:
//!
//! ```text
//! Dataset ──> ClassBalancer ──> TextNormalizer ──> LabelCodec ──┬─> ModelTrainer (category)
//!                                                               └─> ModelTrainer (sub_category)
//! ```
//!
//! The two levels are trained independently and share nothing but the
//! normalized texts. At inference time the [`Predictor`] answers both
//! levels from one normalization of the narrative.
//!
//! # Examples
//!
//! ```no_run
//! use cybercrime_classifier::analysis::LinguisticResources;
//! use cybercrime_classifier::classifier::CrimeClassifier;
//! use cybercrime_classifier::config::ClassifierConfig;
//! use cybercrime_classifier::dataset::DatasetLoader;
//!
//! let resources = LinguisticResources::english().shared();
//! let mut classifier = CrimeClassifier::new(ClassifierConfig::default(), resources).unwrap();
//!
//! let train = DatasetLoader::new().load("train.csv").unwrap();
//! classifier.train(train, None).unwrap();
//! classifier.save("models").unwrap();
//!
//! let prediction = classifier.predict("I received a phishing email and lost money");
//! println!("{prediction}");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use rayon::prelude::*;

use crate::analysis::normalizer::TextNormalizer;
use crate::analysis::resources::LinguisticResources;
use crate::config::ClassifierConfig;
use crate::dataset::{Dataset, Record, TaxonomyLevel};
use crate::error::{ClassifierError, Result};
use crate::ml::balance::{ClassBalancer, DistributionReport};
use crate::ml::label::{LabelCodec, LabelSpace};
use crate::ml::model::TrainedModel;
use crate::ml::predictor::{LevelPrediction, Prediction, Predictor};
use crate::ml::trainer::{LabeledTexts, ModelTrainer};

/// File extension of model bundles.
pub const MODEL_EXTENSION: &str = "model";

/// Path of the bundle for `level` inside `dir`.
pub fn model_path<P: AsRef<Path>>(dir: P, level: TaxonomyLevel) -> PathBuf {
    dir.as_ref().join(format!("{level}.{MODEL_EXTENSION}"))
}

/// A record that survived preprocessing, with its label codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub record: Record,
    pub normalized_text: String,
    pub category_code: u32,
    pub sub_category_code: u32,
}

impl ProcessedRecord {
    /// The code at `level`.
    pub fn code(&self, level: TaxonomyLevel) -> u32 {
        match level {
            TaxonomyLevel::Category => self.category_code,
            TaxonomyLevel::SubCategory => self.sub_category_code,
        }
    }
}

/// Trains, persists and serves the per-level models.
#[derive(Debug, Clone)]
pub struct CrimeClassifier {
    config: ClassifierConfig,
    predictor: Predictor,
}

impl CrimeClassifier {
    /// Create an untrained classifier.
    pub fn new(config: ClassifierConfig, resources: Arc<LinguisticResources>) -> Result<Self> {
        config.validate()?;
        let normalizer =
            TextNormalizer::new(resources)?.with_min_token_count(config.preprocess.min_token_count)?;
        let predictor = Predictor::new(normalizer, config.prediction.confidence_threshold)?;
        Ok(Self { config, predictor })
    }

    /// Load the bundles in `dir` with the default configuration.
    pub fn load<P: AsRef<Path>>(dir: P, resources: Arc<LinguisticResources>) -> Result<Self> {
        Self::new(ClassifierConfig::default(), resources)?.with_models_from(dir)
    }

    /// Load the bundles in `dir` into this classifier.
    ///
    /// A missing bundle leaves its level untrained; a directory without any
    /// bundle is an error.
    pub fn with_models_from<P: AsRef<Path>>(mut self, dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        for level in TaxonomyLevel::ALL {
            let path = model_path(dir, level);
            if !path.exists() {
                warn!("No {} model at {}", level, path.display());
                continue;
            }
            let model = TrainedModel::load(&path)?;
            if model.level() != level {
                return Err(ClassifierError::invalid_config(format!(
                    "{} holds a {} model",
                    path.display(),
                    model.level()
                )));
            }
            self.predictor.set_model(model);
        }

        if !TaxonomyLevel::ALL.iter().any(|&l| self.is_trained(l)) {
            return Err(ClassifierError::model_not_ready(TaxonomyLevel::Category));
        }
        Ok(self)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        self.predictor.normalizer()
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn model(&self, level: TaxonomyLevel) -> Option<&TrainedModel> {
        self.predictor.model(level)
    }

    pub fn is_trained(&self, level: TaxonomyLevel) -> bool {
        self.predictor.has_model(level)
    }

    /// Class distribution reports of `dataset` at both levels.
    pub fn stats(&self, dataset: &Dataset) -> Vec<DistributionReport> {
        ClassBalancer::new(self.config.balance.min_samples_per_class).distribution(dataset)
    }

    /// Filter rare classes and normalize narratives.
    ///
    /// Returns the surviving records paired with their normalized text.
    pub fn preprocess(&self, dataset: Dataset) -> Result<Vec<(Record, String)>> {
        let filtered = ClassBalancer::new(self.config.balance.min_samples_per_class).filter(dataset)?;
        let total = filtered.len();

        info!("Preprocessing {} narratives...", total);
        let rows = self.normalize_records(filtered.into_records());
        info!("Dropped {} unusable narratives", total - rows.len());

        let required = 2 * self.config.balance.min_samples_per_class;
        if rows.len() < required {
            return Err(ClassifierError::insufficient_data(format!(
                "{} usable samples after preprocessing, at least {} required",
                rows.len(),
                required
            )));
        }
        Ok(rows)
    }

    /// Train both levels, validating on `held_out` when given.
    ///
    /// Each level is trained on its own; the models of earlier runs are
    /// replaced only when both levels succeed.
    pub fn train(&mut self, train: Dataset, held_out: Option<Dataset>) -> Result<()> {
        let rows = self.preprocess(train)?;
        let held_out = held_out.map(|dataset| self.normalize_records(dataset.into_records()));

        let spaces: Vec<LabelSpace> = TaxonomyLevel::ALL
            .iter()
            .map(|&level| LabelCodec::new(level).fit(rows.iter().map(|(r, _)| r.label(level))))
            .collect();
        let processed = rows
            .into_iter()
            .map(|(record, normalized_text)| {
                Ok(ProcessedRecord {
                    category_code: spaces[0].encode(&record.category)?,
                    sub_category_code: spaces[1].encode(&record.sub_category)?,
                    record,
                    normalized_text,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let texts: Vec<String> = processed.iter().map(|p| p.normalized_text.clone()).collect();

        let mut models = Vec::with_capacity(TaxonomyLevel::ALL.len());
        for (level, space) in TaxonomyLevel::ALL.into_iter().zip(&spaces) {
            info!("Training {level} model...");
            let codes: Vec<u32> = processed.iter().map(|p| p.code(level)).collect();
            let held_out = held_out.as_deref().map(|rows| encode_held_out(rows, level, space));

            let held_out_data = match &held_out {
                Some((texts, codes)) => Some(LabeledTexts::new(texts, codes)?),
                None => None,
            };
            let model = ModelTrainer::new(level, self.config.clone()).train(
                LabeledTexts::new(&texts, &codes)?,
                space,
                held_out_data,
            )?;
            models.push(model);
        }

        for model in models {
            self.predictor.set_model(model);
        }
        info!("Training complete");
        Ok(())
    }

    /// Classify a raw narrative. Never fails; see [`Predictor::predict`].
    pub fn predict(&self, raw: &str) -> Prediction {
        self.predictor.predict(raw)
    }

    /// Classify many raw narratives in parallel.
    pub fn predict_batch<S: AsRef<str> + Sync>(&self, raw: &[S]) -> Vec<Prediction> {
        self.predictor.predict_batch(raw)
    }

    /// Classify a raw narrative at one level, surfacing errors.
    pub fn predict_level(&self, level: TaxonomyLevel, raw: &str) -> Result<LevelPrediction> {
        self.predictor.predict_level(level, raw)
    }

    /// Write one bundle per trained level into `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        let mut saved = 0;
        fs::create_dir_all(dir)?;
        for level in TaxonomyLevel::ALL {
            if let Some(model) = self.model(level) {
                model.save(model_path(dir, level))?;
                saved += 1;
            }
        }
        if saved == 0 {
            return Err(ClassifierError::model_not_ready(TaxonomyLevel::Category));
        }
        Ok(())
    }

    fn normalize_records(&self, records: Vec<Record>) -> Vec<(Record, String)> {
        let normalizer = self.predictor.normalizer();
        records
            .into_par_iter()
            .filter_map(|record| {
                let normalized = normalizer.normalize(&record.narrative)?;
                Some((record, normalized))
            })
            .collect()
    }
}

/// Encode held-out rows with the training label space, skipping labels the
/// space does not know.
fn encode_held_out(
    rows: &[(Record, String)],
    level: TaxonomyLevel,
    space: &LabelSpace,
) -> (Vec<String>, Vec<u32>) {
    let mut texts = Vec::with_capacity(rows.len());
    let mut codes = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for (record, normalized) in rows {
        match space.encode(record.label(level)) {
            Ok(code) => {
                texts.push(normalized.clone());
                codes.push(code);
            }
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(
            "Skipped {} held-out rows with {} labels unseen in training",
            skipped, level
        );
    }
    (texts, codes)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::ParamGrid;
    use crate::dataset::UNKNOWN_LABEL;

    fn config() -> ClassifierConfig {
        let mut config = ClassifierConfig::default();
        config.forest.n_estimators = 15;
        config.forest.min_samples_split = 2;
        config.forest.min_samples_leaf = 1;
        config.search.grid = ParamGrid::empty();
        config.search.cv_folds = 3;
        config
    }

    fn dataset() -> Dataset {
        let mut records = Vec::new();
        for i in 0..8 {
            records.push(Record::new(
                format!("Money debited from my bank account through UPI fraud link {i}"),
                "Online Financial Fraud",
                "UPI Related Frauds",
            ));
            records.push(Record::new(
                format!("My instagram account was hacked and the password changed {i}"),
                "Hacking",
                "Social Media Account Hacking",
            ));
        }
        records.push(Record::new("ok", "Hacking", "Social Media Account Hacking"));
        records.push(Record::new("One odd report about lottery prizes", "Lottery", "Lottery Scam"));
        Dataset::from_records(records)
    }

    fn classifier() -> CrimeClassifier {
        CrimeClassifier::new(config(), LinguisticResources::english().shared()).unwrap()
    }

    #[test]
    fn test_preprocess_drops_rare_and_unusable() {
        let rows = classifier().preprocess(dataset()).unwrap();
        assert_eq!(rows.len(), 16);
        assert!(rows.iter().all(|(r, _)| r.category != "Lottery"));
    }

    #[test]
    fn test_train_and_predict() {
        let mut classifier = classifier();
        classifier.train(dataset(), None).unwrap();

        assert!(classifier.is_trained(TaxonomyLevel::Category));
        assert!(classifier.is_trained(TaxonomyLevel::SubCategory));

        let labels = classifier.model(TaxonomyLevel::Category).unwrap().labels();
        assert!(labels.contains(UNKNOWN_LABEL));
        assert!(!labels.contains("Lottery"));

        let prediction = classifier.predict("Someone hacked my instagram account and changed the password");
        assert_eq!(prediction.category, "Hacking");
        assert_eq!(prediction.sub_category, "Social Media Account Hacking");
        assert!(prediction.category_confidence >= 0.3);

        assert_eq!(classifier.predict("ok"), Prediction::unknown());
    }

    #[test]
    fn test_save_and_load() {
        let mut trained = classifier();
        trained.train(dataset(), None).unwrap();
        let dir = TempDir::new().unwrap();
        trained.save(dir.path()).unwrap();

        assert!(model_path(dir.path(), TaxonomyLevel::Category).exists());
        assert!(model_path(dir.path(), TaxonomyLevel::SubCategory).exists());

        let loaded = CrimeClassifier::load(dir.path(), LinguisticResources::english().shared()).unwrap();
        let text = "UPI fraud, money debited from bank account";
        assert_eq!(loaded.predict(text), trained.predict(text));
    }

    #[test]
    fn test_save_untrained() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            classifier().save(dir.path()),
            Err(ClassifierError::ModelNotReady { .. })
        ));
    }

    #[test]
    fn test_held_out_with_unseen_label() {
        let mut classifier = classifier();
        let held_out = Dataset::from_records(vec![
            Record::new("UPI fraud money debited from account", "Online Financial Fraud", "UPI Related Frauds"),
            Record::new("Ransomware encrypted all office files", "Ransomware", "Ransomware Attack"),
        ]);

        classifier.train(dataset(), Some(held_out)).unwrap();

        // The lone known held-out row is evaluated, not balanced away.
        let model = classifier.model(TaxonomyLevel::Category).unwrap();
        assert_eq!(model.metadata().n_validation_samples, 1);
        assert_eq!(model.metadata().n_train_samples, 16);
    }
}
