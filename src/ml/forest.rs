//! Bootstrap random forest.
//!
//! Every tree is grown on its own bootstrap sample with its own random
//! stream. Per-tree seeds are drawn up front from the forest seed, so the
//! fitted forest does not depend on how rayon schedules the trees.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ClassWeight, ForestConfig};
use crate::error::{ClassifierError, Result};
use crate::ml::sparse::SparseVector;
use crate::ml::tree::{DecisionTree, TreeParams};

/// Random forest classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_classes: usize,
    class_weights: Vec<f64>,
}

impl RandomForest {
    /// Create an unfitted forest.
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_classes: 0,
            class_weights: Vec::new(),
        }
    }

    /// The configuration of this forest.
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Per-class weights computed by the last `fit`.
    pub fn class_weights(&self) -> &[f64] {
        &self.class_weights
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Whether `fit` has run.
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fit the forest on labelled rows.
    pub fn fit(
        &mut self,
        features: &[SparseVector],
        labels: &[usize],
        n_classes: usize,
        n_features: usize,
    ) -> Result<()> {
        self.config.validate()?;
        if features.is_empty() {
            return Err(ClassifierError::insufficient_data(
                "Cannot fit a forest on zero samples",
            ));
        }
        if features.len() != labels.len() {
            return Err(ClassifierError::invalid_argument(format!(
                "Length mismatch: {} feature rows, {} labels",
                features.len(),
                labels.len()
            )));
        }

        let class_weights = balanced_class_weights(labels, n_classes, self.config.class_weight);
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(n_features),
        };

        let mut seed_rng = StdRng::seed_from_u64(self.config.seed);
        let seeds: Vec<u64> = (0..self.config.n_estimators)
            .map(|_| seed_rng.random())
            .collect();

        debug!(
            "Growing {} trees on {} samples ({} features, {} per split) using {} threads",
            seeds.len(),
            features.len(),
            n_features,
            params.max_features,
            rayon::current_num_threads()
        );

        let n_samples = features.len();
        let bootstrap = self.config.bootstrap;
        let trees = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut weights: Vec<f64> = if bootstrap {
                    let mut counts = vec![0.0; n_samples];
                    for _ in 0..n_samples {
                        counts[rng.random_range(0..n_samples)] += 1.0;
                    }
                    counts
                } else {
                    vec![1.0; n_samples]
                };
                for (weight, &label) in weights.iter_mut().zip(labels) {
                    *weight *= class_weights.get(label).copied().unwrap_or(1.0);
                }

                DecisionTree::fit(
                    features, labels, &weights, n_classes, n_features, &params, &mut rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.n_classes = n_classes;
        self.class_weights = class_weights;
        Ok(())
    }

    /// Mean class probabilities over all trees.
    pub fn predict_proba(&self, features: &SparseVector) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(ClassifierError::other("Random forest is not fitted"));
        }

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (total, p) in proba.iter_mut().zip(tree.predict_proba(features)) {
                *total += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }

    /// Most probable class (lowest class on ties).
    pub fn predict(&self, features: &SparseVector) -> Result<usize> {
        let proba = self.predict_proba(features)?;
        Ok(argmax(&proba).0)
    }

    /// Predict many rows in parallel.
    pub fn predict_batch(&self, rows: &[SparseVector]) -> Result<Vec<usize>> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }
}

/// Index and value of the maximum; the first index wins ties.
pub fn argmax(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (idx, value)| {
            if value > best.1 { (idx, value) } else { best }
        })
}

/// `n_samples / (n_present_classes * count(c))` per class.
///
/// Uniform weights are returned for [`ClassWeight::Uniform`] or when fewer
/// than two classes are present.
pub fn balanced_class_weights(labels: &[usize], n_classes: usize, scheme: ClassWeight) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        if label < n_classes {
            counts[label] += 1;
        }
    }
    let present = counts.iter().filter(|&&c| c > 0).count();

    if scheme == ClassWeight::Uniform || present < 2 {
        return vec![1.0; n_classes];
    }

    let n_samples = labels.len() as f64;
    counts
        .iter()
        .map(|&count| {
            if count == 0 {
                1.0
            } else {
                n_samples / (present as f64 * count as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> (Vec<SparseVector>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let jitter = i as f64 * 0.01;
            features.push(SparseVector::from_pairs(vec![(0, 0.9 + jitter), (2, 0.1)]));
            labels.push(0);
            features.push(SparseVector::from_pairs(vec![(1, 0.9 + jitter), (2, 0.1)]));
            labels.push(1);
        }
        (features, labels)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_estimators: 10,
            max_depth: Some(5),
            min_samples_split: 2,
            min_samples_leaf: 1,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_fit_and_predict() {
        let (features, labels) = toy_data();
        let mut forest = RandomForest::new(small_config());
        forest.fit(&features, &labels, 3, 3).unwrap();

        assert_eq!(forest.n_trees(), 10);
        let class0 = SparseVector::from_pairs(vec![(0, 1.0)]);
        let class1 = SparseVector::from_pairs(vec![(1, 1.0)]);
        assert_eq!(forest.predict(&class0).unwrap(), 0);
        assert_eq!(forest.predict(&class1).unwrap(), 1);

        let proba = forest.predict_proba(&class0).unwrap();
        assert_eq!(proba.len(), 3);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(proba[2], 0.0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (features, labels) = toy_data();
        let probe = SparseVector::from_pairs(vec![(0, 0.5), (1, 0.5)]);

        let mut a = RandomForest::new(small_config());
        a.fit(&features, &labels, 2, 3).unwrap();
        let mut b = RandomForest::new(small_config());
        b.fit(&features, &labels, 2, 3).unwrap();

        assert_eq!(a.predict_proba(&probe).unwrap(), b.predict_proba(&probe).unwrap());
    }

    #[test]
    fn test_unfitted_forest() {
        let forest = RandomForest::new(ForestConfig::default());
        assert!(!forest.is_fitted());
        assert!(forest.predict_proba(&SparseVector::new()).is_err());
    }

    #[test]
    fn test_balanced_class_weights() {
        let labels = vec![0, 0, 0, 1];
        let weights = balanced_class_weights(&labels, 3, ClassWeight::Balanced);
        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[1] - 2.0).abs() < 1e-12);
        assert_eq!(weights[2], 1.0);

        assert_eq!(balanced_class_weights(&[1, 1], 2, ClassWeight::Balanced), vec![1.0, 1.0]);
        assert_eq!(balanced_class_weights(&labels, 2, ClassWeight::Uniform), vec![1.0, 1.0]);
    }

    #[test]
    fn test_argmax_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), (1, 0.4));
        assert_eq!(argmax(&[]).0, 0);
    }
}
