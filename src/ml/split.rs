//! Stratified data splitting.
//!
//! [`stratified_split`] holds out a seeded, class-proportional validation
//! set. [`StratifiedKFold`] assigns every sample to one of `k` folds so that
//! each fold keeps the class proportions, without shuffling: samples of a
//! class are dealt to folds in their original order.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{ClassifierError, Result};

/// Indices of a train / test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    /// Training sample indices, ascending.
    pub train: Vec<usize>,
    /// Test sample indices, ascending.
    pub test: Vec<usize>,
}

/// Split sample indices into train and test, stratified by `labels`.
///
/// The test side receives `ceil(test_size * n)` samples in total. Train and
/// test quotas are distributed over the classes in proportion to their size;
/// slots left over after flooring go to the classes with the largest
/// remainders, ties broken by the seeded generator. Classes with a single
/// sample stay on the train side.
pub fn stratified_split(labels: &[usize], test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ClassifierError::invalid_argument(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(idx);
    }

    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    let mut classes = Vec::with_capacity(by_class.len());
    for (_, members) in by_class {
        if members.len() < 2 {
            train.extend(members);
        } else {
            classes.push(members);
        }
    }

    let n_splittable: usize = classes.iter().map(Vec::len).sum();
    let n_test = ((labels.len() as f64 * test_size).ceil() as usize).min(n_splittable);
    let n_train = n_splittable - n_test;

    let mut rng = StdRng::seed_from_u64(seed);
    let counts: Vec<usize> = classes.iter().map(Vec::len).collect();
    let train_quota = approximate_mode(&counts, n_train, &mut rng);
    let remaining: Vec<usize> = counts
        .iter()
        .zip(&train_quota)
        .map(|(&count, &quota)| count - quota)
        .collect();
    let test_quota = approximate_mode(&remaining, n_test, &mut rng);

    for ((mut members, n_train_class), n_test_class) in
        classes.into_iter().zip(train_quota).zip(test_quota)
    {
        members.shuffle(&mut rng);
        train.extend_from_slice(&members[..n_train_class]);
        test.extend_from_slice(&members[n_train_class..n_train_class + n_test_class]);
    }

    if test.is_empty() || train.is_empty() {
        return Err(ClassifierError::insufficient_data(format!(
            "Cannot split {} samples into train and test sets",
            labels.len()
        )));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

/// Draw `n_draws` items from classes of the given sizes, as close to
/// proportional as possible. Never allocates more than a class holds.
fn approximate_mode(counts: &[usize], n_draws: usize, rng: &mut StdRng) -> Vec<usize> {
    let total: usize = counts.iter().sum();
    if total == 0 || n_draws == 0 {
        return vec![0; counts.len()];
    }

    let continuous: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 * n_draws as f64 / total as f64)
        .collect();
    let mut quota: Vec<usize> = continuous.iter().map(|c| c.floor() as usize).collect();
    let mut need = n_draws.saturating_sub(quota.iter().sum());

    let remainders: Vec<f64> = continuous
        .iter()
        .zip(&quota)
        .map(|(&c, &q)| c - q as f64)
        .collect();
    let mut levels = remainders.clone();
    levels.sort_by(|a, b| b.total_cmp(a));
    levels.dedup();

    for level in levels {
        if need == 0 {
            break;
        }
        let mut tied: Vec<usize> = (0..counts.len())
            .filter(|&i| remainders[i] == level && quota[i] < counts[i])
            .collect();
        tied.shuffle(rng);
        for &i in tied.iter().take(need) {
            quota[i] += 1;
        }
        need -= tied.len().min(need);
    }

    quota
}

/// Stratified k-fold assignment without shuffling.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl StratifiedKFold {
    /// Create a splitter with `n_splits` folds.
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(ClassifierError::invalid_argument(format!(
                "n_splits must be at least 2, got {n_splits}"
            )));
        }
        Ok(Self { n_splits })
    }

    /// Number of folds.
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Largest usable fold count for `labels`, capped at `requested`.
    ///
    /// Folds must not outnumber the members of the largest class. Returns
    /// `None` when fewer than two folds are possible.
    pub fn effective_splits(labels: &[usize], requested: usize) -> Option<usize> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for &label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        let largest = counts.values().copied().max().unwrap_or(0);
        let splits = requested.min(largest);
        (splits >= 2).then_some(splits)
    }

    /// Fold id of every sample.
    pub fn test_folds(&self, labels: &[usize]) -> Result<Vec<usize>> {
        let n_samples = labels.len();
        if n_samples < self.n_splits {
            return Err(ClassifierError::insufficient_data(format!(
                "Cannot have {} folds with only {} samples",
                self.n_splits, n_samples
            )));
        }

        // Renumber classes by first appearance.
        let mut first_seen: Vec<usize> = Vec::new();
        let mut encoded = Vec::with_capacity(n_samples);
        for &label in labels {
            let class = match first_seen.iter().position(|&l| l == label) {
                Some(pos) => pos,
                None => {
                    first_seen.push(label);
                    first_seen.len() - 1
                }
            };
            encoded.push(class);
        }
        let n_classes = first_seen.len();

        let counts = {
            let mut counts = vec![0usize; n_classes];
            for &c in &encoded {
                counts[c] += 1;
            }
            counts
        };
        if counts.iter().all(|&c| c < self.n_splits) {
            return Err(ClassifierError::insufficient_data(format!(
                "n_splits={} cannot be greater than the number of members in each class",
                self.n_splits
            )));
        }

        // Deal the sorted labels round-robin to get per-fold class quotas.
        let mut sorted = encoded.clone();
        sorted.sort_unstable();
        let mut allocation = vec![vec![0usize; n_classes]; self.n_splits];
        for (pos, &class) in sorted.iter().enumerate() {
            allocation[pos % self.n_splits][class] += 1;
        }

        let mut folds = vec![0usize; n_samples];
        for class in 0..n_classes {
            let fold_ids = (0..self.n_splits)
                .flat_map(|fold| std::iter::repeat_n(fold, allocation[fold][class]));
            let members = encoded
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c == class)
                .map(|(idx, _)| idx);
            for (idx, fold) in members.zip(fold_ids) {
                folds[idx] = fold;
            }
        }

        Ok(folds)
    }

    /// Train / test indices of every fold.
    pub fn split(&self, labels: &[usize]) -> Result<Vec<SplitIndices>> {
        let folds = self.test_folds(labels)?;
        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&idx| folds[idx] == fold);
                SplitIndices { train, test }
            })
            .collect())
    }
}
