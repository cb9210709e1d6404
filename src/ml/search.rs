//! Exhaustive hyperparameter search with stratified cross-validation.
//!
//! Every combination of the [`ParamGrid`] is scored by the mean weighted F1
//! over stratified folds. Candidates are enumerated with the last parameter
//! varying fastest:
//!
//! ```text
//! max_depth × min_samples_split × n_estimators × max_features × ngram_range
//! ```
//!
//! The best mean score wins and ties go to the earlier candidate. A fold that
//! fails to fit (for example because no term survives the document frequency
//! bounds) scores NaN, and a candidate with any NaN fold ranks last.

use std::fmt;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ForestConfig, ParamGrid, VectorizerConfig};
use crate::error::{ClassifierError, Result};
use crate::ml::metrics::weighted_f1;
use crate::ml::pipeline::TextPipeline;
use crate::ml::split::StratifiedKFold;

/// The searched hyperparameters of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Maximum tree depth.
    pub max_depth: Option<usize>,
    /// Minimum samples to split a node.
    pub min_samples_split: usize,
    /// Number of trees.
    pub n_estimators: usize,
    /// Vocabulary cap.
    pub max_features: Option<usize>,
    /// Word n-gram range.
    pub ngram_range: (usize, usize),
}

impl Hyperparameters {
    /// Read the searched values from base configurations.
    pub fn from_configs(vectorizer: &VectorizerConfig, forest: &ForestConfig) -> Self {
        Self {
            max_depth: forest.max_depth,
            min_samples_split: forest.min_samples_split,
            n_estimators: forest.n_estimators,
            max_features: vectorizer.max_features,
            ngram_range: vectorizer.ngram_range,
        }
    }

    /// Override base configurations with these values.
    pub fn apply(
        &self,
        vectorizer: &VectorizerConfig,
        forest: &ForestConfig,
    ) -> (VectorizerConfig, ForestConfig) {
        let vectorizer = VectorizerConfig {
            max_features: self.max_features,
            ngram_range: self.ngram_range,
            ..vectorizer.clone()
        };
        let forest = ForestConfig {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            n_estimators: self.n_estimators,
            ..forest.clone()
        };
        (vectorizer, forest)
    }
}

impl fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_none = |v: Option<usize>| v.map_or("None".to_string(), |v| v.to_string());
        write!(
            f,
            "max_depth={}, min_samples_split={}, n_estimators={}, max_features={}, ngram_range=({}, {})",
            or_none(self.max_depth),
            self.min_samples_split,
            self.n_estimators,
            or_none(self.max_features),
            self.ngram_range.0,
            self.ngram_range.1
        )
    }
}

/// Enumerate grid candidates. Empty grid axes keep the base value.
pub fn candidates(grid: &ParamGrid, base: &Hyperparameters) -> Vec<Hyperparameters> {
    fn axis<T: Clone>(values: &[T], base: T) -> Vec<T> {
        if values.is_empty() { vec![base] } else { values.to_vec() }
    }

    let depths = axis(&grid.max_depth, base.max_depth);
    let splits = axis(&grid.min_samples_split, base.min_samples_split);
    let estimators = axis(&grid.n_estimators, base.n_estimators);
    let vocab_caps = axis(&grid.max_features, base.max_features);
    let ngrams = axis(&grid.ngram_range, base.ngram_range);

    let mut out = Vec::new();
    for &max_depth in &depths {
        for &min_samples_split in &splits {
            for &n_estimators in &estimators {
                for &max_features in &vocab_caps {
                    for &ngram_range in &ngrams {
                        out.push(Hyperparameters {
                            max_depth,
                            min_samples_split,
                            n_estimators,
                            max_features,
                            ngram_range,
                        });
                    }
                }
            }
        }
    }
    out
}

/// Cross-validation result of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// The evaluated hyperparameters.
    pub params: Hyperparameters,
    /// Weighted F1 of every fold (NaN for failed folds).
    pub fold_scores: Vec<f64>,
    /// Mean of `fold_scores`.
    pub mean_score: f64,
}

/// Outcome of a grid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The winning hyperparameters.
    pub best_params: Hyperparameters,
    /// Mean cross-validated weighted F1 of the winner.
    pub best_score: f64,
    /// Number of folds used.
    pub n_splits: usize,
    /// All candidates in grid order.
    pub candidates: Vec<CandidateScore>,
}

/// Grid search over pipeline hyperparameters.
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    cv_folds: usize,
}

impl GridSearch {
    /// Create a search over `grid` with `cv_folds` folds.
    pub fn new(grid: ParamGrid, cv_folds: usize) -> Self {
        Self { grid, cv_folds }
    }

    /// Score every candidate and pick the best one.
    ///
    /// The fold count is reduced when the largest class has fewer members
    /// than `cv_folds`; `InsufficientData` is returned when not even two
    /// folds are possible or every candidate fails.
    pub fn run(
        &self,
        texts: &[String],
        labels: &[usize],
        n_classes: usize,
        vectorizer: &VectorizerConfig,
        forest: &ForestConfig,
    ) -> Result<SearchResult> {
        let n_splits = StratifiedKFold::effective_splits(labels, self.cv_folds).ok_or_else(|| {
            ClassifierError::insufficient_data(
                "Cross-validation needs a class with at least two samples",
            )
        })?;
        if n_splits < self.cv_folds {
            warn!(
                "Reducing cross-validation from {} to {} folds: the largest class has only {} members",
                self.cv_folds, n_splits, n_splits
            );
        }

        let folds = StratifiedKFold::new(n_splits)?.split(labels)?;
        let base = Hyperparameters::from_configs(vectorizer, forest);
        let candidates = candidates(&self.grid, &base);

        info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits",
            n_splits,
            candidates.len(),
            n_splits * candidates.len()
        );

        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..n_splits).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| {
                let (vectorizer, forest) = candidates[c].apply(vectorizer, forest);
                let fold = &folds[f];
                let train_texts: Vec<String> = fold.train.iter().map(|&i| texts[i].clone()).collect();
                let train_labels: Vec<usize> = fold.train.iter().map(|&i| labels[i]).collect();
                let test_texts: Vec<String> = fold.test.iter().map(|&i| texts[i].clone()).collect();
                let test_labels: Vec<usize> = fold.test.iter().map(|&i| labels[i]).collect();

                let score = TextPipeline::fit(vectorizer, forest, &train_texts, &train_labels, n_classes)
                    .and_then(|pipeline| pipeline.predict_batch(&test_texts))
                    .and_then(|predicted| weighted_f1(&test_labels, &predicted, n_classes));

                match score {
                    Ok(score) => score,
                    Err(e) => {
                        debug!("Candidate {} fold {} failed: {}", c, f, e);
                        f64::NAN
                    }
                }
            })
            .collect();

        let candidates: Vec<CandidateScore> = candidates
            .into_iter()
            .zip(scores.chunks(n_splits))
            .map(|(params, fold_scores)| {
                let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                debug!("[CV] {params}: mean weighted F1 {mean_score:.4}");
                CandidateScore {
                    params,
                    fold_scores: fold_scores.to_vec(),
                    mean_score,
                }
            })
            .collect();

        let best = candidates
            .iter()
            .filter(|c| !c.mean_score.is_nan())
            .fold(None::<&CandidateScore>, |best, c| match best {
                Some(b) if b.mean_score >= c.mean_score => Some(b),
                _ => Some(c),
            })
            .ok_or_else(|| {
                ClassifierError::insufficient_data("Every candidate configuration failed to fit")
            })?;

        info!("Best parameters: {} (weighted F1 {:.4})", best.params, best.mean_score);

        Ok(SearchResult {
            best_params: best.params.clone(),
            best_score: best.mean_score,
            n_splits,
            candidates,
        })
    }
}
