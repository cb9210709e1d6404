//! Classification metrics.
//!
//! Metrics are computed from a [`ConfusionMatrix`]. Undefined ratios
//! (precision of a class that was never predicted, recall of a class with no
//! true samples) are reported as 1.0. F1 is `2·TP / (support + predicted)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::ml::label::LabelSpace;

/// Value reported for undefined ratios.
const ZERO_DIVISION: f64 = 1.0;

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Number of classes.
    n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Build from parallel true / predicted class slices.
    pub fn from_predictions(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(ClassifierError::invalid_argument(format!(
                "Length mismatch: {} true labels, {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut matrix = Self::new(n_classes);
        for (&truth, &predicted) in y_true.iter().zip(y_pred) {
            if truth >= n_classes || predicted >= n_classes {
                return Err(ClassifierError::invalid_argument(format!(
                    "Class out of range for {n_classes} classes: ({truth}, {predicted})"
                )));
            }
            matrix.add(truth, predicted);
        }
        Ok(matrix)
    }

    /// Record one prediction.
    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        self.counts[truth * self.n_classes + predicted] += 1;
    }

    /// Count of samples of class `truth` predicted as `predicted`.
    pub fn get(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of recorded predictions.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Samples whose true class is `class`.
    pub fn support(&self, class: usize) -> usize {
        (0..self.n_classes).map(|j| self.get(class, j)).sum()
    }

    /// Samples predicted as `class`.
    pub fn predicted(&self, class: usize) -> usize {
        (0..self.n_classes).map(|i| self.get(i, class)).sum()
    }

    /// Fraction of correct predictions (0 when empty).
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.n_classes).map(|c| self.get(c, c)).sum();
        correct as f64 / total as f64
    }

    /// Metrics of one class.
    pub fn class_metrics(&self, class: usize) -> (f64, f64, f64) {
        let tp = self.get(class, class) as f64;
        let support = self.support(class) as f64;
        let predicted = self.predicted(class) as f64;

        let precision = if predicted == 0.0 { ZERO_DIVISION } else { tp / predicted };
        let recall = if support == 0.0 { ZERO_DIVISION } else { tp / support };
        let f1 = if support + predicted == 0.0 {
            ZERO_DIVISION
        } else {
            2.0 * tp / (support + predicted)
        };
        (precision, recall, f1)
    }

    /// Classes that occur as truth or prediction, ascending.
    pub fn observed_classes(&self) -> Vec<usize> {
        (0..self.n_classes)
            .filter(|&c| self.support(c) > 0 || self.predicted(c) > 0)
            .collect()
    }

    /// Support-weighted mean F1 over the observed classes.
    pub fn weighted_f1(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.observed_classes()
            .into_iter()
            .map(|c| self.support(c) as f64 * self.class_metrics(c).2)
            .sum::<f64>()
            / total as f64
    }
}

/// Support-weighted F1 of a prediction run.
pub fn weighted_f1(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Result<f64> {
    Ok(ConfusionMatrix::from_predictions(y_true, y_pred, n_classes)?.weighted_f1())
}

/// Precision, recall and F1 of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Class label.
    pub label: String,
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of true samples of the class.
    pub support: usize,
}

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    /// Mean precision.
    pub precision: f64,
    /// Mean recall.
    pub recall: f64,
    /// Mean F1.
    pub f1: f64,
    /// Total support.
    pub support: usize,
}

/// Per-class and averaged metrics of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Metrics of every observed class, in code order.
    pub classes: Vec<ClassMetrics>,
    /// Fraction of correct predictions.
    pub accuracy: f64,
    /// Unweighted mean over classes.
    pub macro_avg: AverageMetrics,
    /// Support-weighted mean over classes.
    pub weighted_avg: AverageMetrics,
}

impl ClassificationReport {
    /// Compute the report for codes of `labels`.
    pub fn compute(y_true: &[usize], y_pred: &[usize], labels: &LabelSpace) -> Result<Self> {
        let matrix = ConfusionMatrix::from_predictions(y_true, y_pred, labels.len())?;

        let classes = matrix
            .observed_classes()
            .into_iter()
            .map(|class| {
                let (precision, recall, f1) = matrix.class_metrics(class);
                Ok(ClassMetrics {
                    label: labels.decode(class as u32)?.to_string(),
                    precision,
                    recall,
                    f1,
                    support: matrix.support(class),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total = matrix.total();
        let n = classes.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
            support: total,
        };

        let weight = |value: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|c| c.support as f64 * value(c))
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
            support: total,
        };

        Ok(ClassificationReport {
            accuracy: matrix.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
        })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}
