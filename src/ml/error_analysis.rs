//! Misclassification diagnostics over a validation run.

use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::ml::label::LabelSpace;

/// Number of confusion pairs reported.
pub const TOP_CONFUSIONS: usize = 5;

/// A `(true, predicted)` label pair and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionPair {
    pub truth: String,
    pub predicted: String,
    pub count: usize,
}

/// Summary of the errors made on a validation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSummary {
    /// Number of validation samples.
    pub total: usize,
    /// Number of misclassified samples.
    pub errors: usize,
    /// Most frequent confusions, most common first.
    pub top_confusions: Vec<ConfusionPair>,
}

impl ErrorSummary {
    /// Emit the summary to the log.
    pub fn log(&self) {
        info!("Total misclassifications: {} of {}", self.errors, self.total);
        if self.top_confusions.is_empty() {
            return;
        }
        info!("Most common confusion pairs (true -> predicted):");
        for pair in &self.top_confusions {
            info!("  {} -> {}: {}", pair.truth, pair.predicted, pair.count);
        }
    }
}

/// Counts misclassified `(true, predicted)` pairs.
#[derive(Debug, Clone)]
pub struct ErrorAnalyzer {
    top_n: usize,
}

impl ErrorAnalyzer {
    pub fn new() -> Self {
        Self { top_n: TOP_CONFUSIONS }
    }

    /// Report the `top_n` most frequent pairs instead of five.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Summarize the errors of `y_pred` against `y_true`.
    ///
    /// Pairs with equal counts are ordered by true then predicted code, which
    /// is label order.
    pub fn analyze(&self, y_true: &[usize], y_pred: &[usize], labels: &LabelSpace) -> Result<ErrorSummary> {
        if y_true.len() != y_pred.len() {
            return Err(ClassifierError::invalid_argument(format!(
                "Length mismatch: {} true labels, {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut pairs: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for (&truth, &predicted) in y_true.iter().zip(y_pred) {
            if truth != predicted {
                *pairs.entry((truth, predicted)).or_insert(0) += 1;
            }
        }

        let errors = pairs.values().sum();
        let mut ranked: Vec<((usize, usize), usize)> = pairs.into_iter().collect();
        // Stable sort keeps the key order for equal counts.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let top_confusions = ranked
            .into_iter()
            .take(self.top_n)
            .map(|((truth, predicted), count)| {
                Ok(ConfusionPair {
                    truth: labels.decode(truth as u32)?.to_string(),
                    predicted: labels.decode(predicted as u32)?.to_string(),
                    count,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ErrorSummary {
            total: y_true.len(),
            errors,
            top_confusions,
        })
    }
}

impl Default for ErrorAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSpace {
        LabelSpace::from_labels(["Hacking", "Online Financial Fraud", "Ransomware"])
    }

    #[test]
    fn test_counts_and_order() {
        // 0 = Hacking, 1 = Online Financial Fraud, 2 = Ransomware, 3 = Unknown
        let y_true = [0, 0, 0, 1, 1, 2, 2, 3];
        let y_pred = [1, 1, 0, 0, 0, 3, 2, 3];

        let summary = ErrorAnalyzer::new().analyze(&y_true, &y_pred, &labels()).unwrap();

        assert_eq!(summary.total, 8);
        assert_eq!(summary.errors, 5);
        assert_eq!(summary.top_confusions.len(), 3);
        assert_eq!(summary.top_confusions[0].truth, "Hacking");
        assert_eq!(summary.top_confusions[0].predicted, "Online Financial Fraud");
        assert_eq!(summary.top_confusions[0].count, 2);
        assert_eq!(summary.top_confusions[1].truth, "Online Financial Fraud");
        assert_eq!(summary.top_confusions[2].predicted, "Unknown");
    }

    #[test]
    fn test_top_n_limit() {
        let y_true = [0, 1, 2, 3, 0, 1];
        let y_pred = [1, 2, 3, 0, 2, 3];

        let summary = ErrorAnalyzer::new()
            .with_top_n(2)
            .analyze(&y_true, &y_pred, &labels())
            .unwrap();

        assert_eq!(summary.errors, 6);
        assert_eq!(summary.top_confusions.len(), 2);
        assert_eq!(summary.top_confusions[0].truth, "Hacking");
        assert_eq!(summary.top_confusions[0].predicted, "Online Financial Fraud");
        assert_eq!(summary.top_confusions[1].predicted, "Ransomware");
    }

    #[test]
    fn test_no_errors() {
        let summary = ErrorAnalyzer::new().analyze(&[0, 1], &[0, 1], &labels()).unwrap();
        assert_eq!(summary.errors, 0);
        assert!(summary.top_confusions.is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ErrorAnalyzer::new().analyze(&[0, 1], &[0], &labels()).is_err());
    }
}
