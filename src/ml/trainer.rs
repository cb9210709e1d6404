//! Model training for one taxonomy level.
//!
//! [`ModelTrainer::train`] takes normalized texts and their label codes and
//! produces a [`TrainedModel`]:
//!
//! 1. Choose the rows to fit on and the rows to validate on. With an
//!    explicit held-out set every training row is used for fitting;
//!    otherwise a stratified split keeps `test_size` of each class aside.
//! 2. Pick hyperparameters by cross-validated grid search on the fitting
//!    rows (skipped when disabled or when no class can fill two folds).
//! 3. Refit the winning pipeline on all fitting rows.
//! 4. Report per-class metrics and the most common confusions on the
//!    validation rows.

use log::{info, warn};

use crate::config::ClassifierConfig;
use crate::dataset::TaxonomyLevel;
use crate::error::{ClassifierError, Result};
use crate::ml::error_analysis::ErrorAnalyzer;
use crate::ml::label::LabelSpace;
use crate::ml::metrics::ClassificationReport;
use crate::ml::model::{Evaluation, ModelMetadata, TrainedModel};
use crate::ml::pipeline::TextPipeline;
use crate::ml::search::{GridSearch, Hyperparameters};
use crate::ml::split::{StratifiedKFold, stratified_split};

/// Normalized texts with their label codes.
#[derive(Debug, Clone, Copy)]
pub struct LabeledTexts<'a> {
    pub texts: &'a [String],
    pub codes: &'a [u32],
}

impl<'a> LabeledTexts<'a> {
    pub fn new(texts: &'a [String], codes: &'a [u32]) -> Result<Self> {
        if texts.len() != codes.len() {
            return Err(ClassifierError::invalid_argument(format!(
                "Length mismatch: {} texts, {} codes",
                texts.len(),
                codes.len()
            )));
        }
        Ok(Self { texts, codes })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    fn labels(&self) -> Vec<usize> {
        self.codes.iter().map(|&c| c as usize).collect()
    }
}

/// Trains the pipeline of one taxonomy level.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    level: TaxonomyLevel,
    config: ClassifierConfig,
}

impl ModelTrainer {
    pub fn new(level: TaxonomyLevel, config: ClassifierConfig) -> Self {
        Self { level, config }
    }

    pub fn level(&self) -> TaxonomyLevel {
        self.level
    }

    /// Train on `data`, validating on `held_out` when given.
    pub fn train(
        &self,
        data: LabeledTexts<'_>,
        labels: &LabelSpace,
        held_out: Option<LabeledTexts<'_>>,
    ) -> Result<TrainedModel> {
        let required = 2 * self.config.balance.min_samples_per_class;
        if data.len() < required {
            return Err(ClassifierError::insufficient_data(format!(
                "{} usable rows for {}, at least {} required",
                data.len(),
                self.level,
                required
            )));
        }
        if let Some(&code) = data.codes.iter().find(|&&c| c as usize >= labels.len()) {
            return Err(ClassifierError::unknown_label(format!(
                "code {code} is out of range for {} labels",
                labels.len()
            )));
        }

        let (fit_texts, fit_labels, valid_texts, valid_labels) = match held_out {
            Some(held_out) => {
                info!(
                    "Training {} model on all {} rows, validating on {} held-out rows",
                    self.level,
                    data.len(),
                    held_out.len()
                );
                (
                    data.texts.to_vec(),
                    data.labels(),
                    held_out.texts.to_vec(),
                    held_out.labels(),
                )
            }
            None => {
                let all_labels = data.labels();
                let split = stratified_split(
                    &all_labels,
                    self.config.validation.test_size,
                    self.config.validation.seed,
                )?;
                info!(
                    "Training {} model on {} rows, validating on {} rows",
                    self.level,
                    split.train.len(),
                    split.test.len()
                );
                let pick_texts = |idx: &[usize]| -> Vec<String> {
                    idx.iter().map(|&i| data.texts[i].clone()).collect()
                };
                let pick_labels =
                    |idx: &[usize]| -> Vec<usize> { idx.iter().map(|&i| all_labels[i]).collect() };
                (
                    pick_texts(&split.train),
                    pick_labels(&split.train),
                    pick_texts(&split.test),
                    pick_labels(&split.test),
                )
            }
        };

        let n_classes = labels.len();
        let (params, cv_score) = self.select_params(&fit_texts, &fit_labels, n_classes)?;
        let (vectorizer, forest) = params.apply(&self.config.vectorizer, &self.config.forest);
        let pipeline = TextPipeline::fit(vectorizer, forest, &fit_texts, &fit_labels, n_classes)?;

        let evaluation = if valid_texts.is_empty() {
            warn!("No validation rows for {}; skipping evaluation", self.level);
            None
        } else {
            let predicted = pipeline.predict_batch(&valid_texts)?;
            let report = ClassificationReport::compute(&valid_labels, &predicted, labels)?;
            info!("Classification report for {}:", self.level);
            for line in report.to_string().lines() {
                info!("{line}");
            }
            let errors = ErrorAnalyzer::new().analyze(&valid_labels, &predicted, labels)?;
            errors.log();
            Some(Evaluation { report, errors })
        };

        TrainedModel::new(
            self.level,
            pipeline,
            labels.clone(),
            params,
            evaluation,
            ModelMetadata::new(fit_texts.len(), valid_texts.len(), cv_score),
        )
    }

    fn select_params(
        &self,
        texts: &[String],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<(Hyperparameters, Option<f64>)> {
        let base = Hyperparameters::from_configs(&self.config.vectorizer, &self.config.forest);
        let search = &self.config.search;
        if !search.enabled {
            return Ok((base, None));
        }
        if StratifiedKFold::effective_splits(labels, search.cv_folds).is_none() {
            warn!(
                "Too few samples per class to cross-validate {}; using the base parameters",
                self.level
            );
            return Ok((base, None));
        }

        info!("Running grid search for {}", self.level);
        let result = GridSearch::new(search.grid.clone(), search.cv_folds).run(
            texts,
            labels,
            n_classes,
            &self.config.vectorizer,
            &self.config.forest,
        )?;
        Ok((result.best_params, Some(result.best_score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamGrid;

    fn small_config() -> ClassifierConfig {
        let mut config = ClassifierConfig::default();
        config.forest.n_estimators = 10;
        config.forest.min_samples_split = 2;
        config.forest.min_samples_leaf = 1;
        config.search.grid = ParamGrid {
            max_depth: vec![Some(10), None],
            ..ParamGrid::empty()
        };
        config.search.cv_folds = 3;
        config
    }

    fn data() -> (Vec<String>, Vec<u32>, LabelSpace) {
        let labels = LabelSpace::from_labels(["Hacking", "Online Financial Fraud"]);
        let mut texts = Vec::new();
        let mut codes = Vec::new();
        for i in 0..10 {
            texts.push(format!("upi fraud money debited bank transfer{i}"));
            codes.push(1);
            texts.push(format!("account hacked password changed login profile{i}"));
            codes.push(0);
        }
        (texts, codes, labels)
    }

    #[test]
    fn test_train_with_split() {
        let (texts, codes, labels) = data();
        let trainer = ModelTrainer::new(TaxonomyLevel::Category, small_config());

        let model = trainer
            .train(LabeledTexts::new(&texts, &codes).unwrap(), &labels, None)
            .unwrap();

        assert_eq!(model.metadata().n_train_samples, 16);
        assert_eq!(model.metadata().n_validation_samples, 4);
        assert!(model.metadata().cv_score.is_some());
        assert_eq!(model.params().max_depth, Some(10));

        let evaluation = model.evaluation().unwrap();
        assert_eq!(evaluation.report.accuracy, 1.0);
        assert_eq!(evaluation.errors.errors, 0);
    }

    #[test]
    fn test_train_with_held_out() {
        let (texts, codes, labels) = data();
        let mut config = small_config();
        config.search.enabled = false;
        let trainer = ModelTrainer::new(TaxonomyLevel::Category, config);

        let held_texts = vec![
            "upi fraud money debited".to_string(),
            "account hacked password changed".to_string(),
        ];
        let held_codes = vec![1, 0];

        let model = trainer
            .train(
                LabeledTexts::new(&texts, &codes).unwrap(),
                &labels,
                Some(LabeledTexts::new(&held_texts, &held_codes).unwrap()),
            )
            .unwrap();

        assert_eq!(model.metadata().n_train_samples, 20);
        assert_eq!(model.metadata().n_validation_samples, 2);
        assert!(model.metadata().cv_score.is_none());
        assert_eq!(model.evaluation().unwrap().report.accuracy, 1.0);
    }

    #[test]
    fn test_too_few_rows() {
        let labels = LabelSpace::from_labels(["Hacking"]);
        let texts = vec!["account hacked password".to_string()];
        let codes = vec![0];
        let trainer = ModelTrainer::new(TaxonomyLevel::Category, ClassifierConfig::default());

        let result = trainer.train(LabeledTexts::new(&texts, &codes).unwrap(), &labels, None);
        assert!(matches!(result, Err(ClassifierError::InsufficientData(_))));
    }

    #[test]
    fn test_code_out_of_range() {
        let labels = LabelSpace::from_labels(["Hacking"]);
        let texts = vec!["a b c".to_string(); 4];
        let codes = vec![0, 1, 5, 0];
        let trainer = ModelTrainer::new(TaxonomyLevel::Category, ClassifierConfig::default());

        let result = trainer.train(LabeledTexts::new(&texts, &codes).unwrap(), &labels, None);
        assert!(matches!(result, Err(ClassifierError::UnknownLabel(_))));
    }
}
