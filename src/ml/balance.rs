//! Rare-class filtering.
//!
//! Labels with fewer than `min_count` samples cannot be learned or
//! stratified, so their records are dropped before training. Filtering runs
//! per level, category first; the sub-category counts are taken on the
//! records that survived the category pass.
//!
//! Before filtering, the dataset is guaranteed to contain the catch-all
//! label at every level: if it is missing, the canonical record
//! `("unknown case", "Unknown", "Unknown")` is appended.

use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Record, TaxonomyLevel, UNKNOWN_LABEL};
use crate::error::{ClassifierError, Result};

/// Number of most common classes listed in a distribution report.
pub const TOP_CLASSES: usize = 5;

/// Per-label sample counts of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStats {
    /// The level the counts belong to.
    pub level: TaxonomyLevel,
    /// Sample count per label.
    pub counts: BTreeMap<String, usize>,
}

impl ClassStats {
    /// Count the labels of `dataset` at `level`.
    pub fn from_dataset(dataset: &Dataset, level: TaxonomyLevel) -> Self {
        ClassStats {
            level,
            counts: dataset.label_counts(level),
        }
    }

    /// Sample count of `label` (0 if absent).
    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Whether `label` has at least `min_count` samples.
    pub fn is_retained(&self, label: &str, min_count: usize) -> bool {
        self.count(label) >= min_count
    }

    /// Labels ordered by count, most common first, ties by label.
    pub fn most_common(&self) -> Vec<(String, usize)> {
        let mut pairs: Vec<(String, usize)> =
            self.counts.iter().map(|(l, &c)| (l.clone(), c)).collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }
}

/// Summary of the class distribution of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionReport {
    /// The level described.
    pub level: TaxonomyLevel,
    /// Number of distinct labels.
    pub unique_classes: usize,
    /// Number of labels with exactly one sample.
    pub singleton_classes: usize,
    /// The most common labels with their counts.
    pub top_classes: Vec<(String, usize)>,
    /// Labels below the retention threshold with their counts.
    pub below_threshold: Vec<(String, usize)>,
}

impl DistributionReport {
    /// Build the report for `stats` under `min_count`.
    pub fn new(stats: &ClassStats, min_count: usize) -> Self {
        let most_common = stats.most_common();
        let below_threshold = most_common
            .iter()
            .filter(|(_, count)| *count < min_count)
            .cloned()
            .collect();

        DistributionReport {
            level: stats.level,
            unique_classes: stats.counts.len(),
            singleton_classes: stats.counts.values().filter(|&&c| c == 1).count(),
            top_classes: most_common.into_iter().take(TOP_CLASSES).collect(),
            below_threshold,
        }
    }

    /// Write the report to the log.
    pub fn log(&self) {
        info!("{} distribution:", self.level.as_str().to_uppercase());
        info!("Total unique classes: {}", self.unique_classes);
        info!("Classes with only one sample: {}", self.singleton_classes);
        info!("Top {} most common classes:", TOP_CLASSES);
        for (label, count) in &self.top_classes {
            info!("  {label}: {count}");
        }
        info!("Classes with less than minimum samples: {}", self.below_threshold.len());
        for (label, count) in &self.below_threshold {
            info!("  {label}: {count}");
        }
    }
}

/// Drops under-represented classes and injects the catch-all class.
#[derive(Debug, Clone)]
pub struct ClassBalancer {
    min_count: usize,
}

impl ClassBalancer {
    /// Create a balancer keeping labels with at least `min_count` samples.
    pub fn new(min_count: usize) -> Self {
        ClassBalancer { min_count }
    }

    /// The retention threshold.
    pub fn min_count(&self) -> usize {
        self.min_count
    }

    /// Distribution reports for both levels.
    pub fn distribution(&self, dataset: &Dataset) -> Vec<DistributionReport> {
        TaxonomyLevel::ALL
            .iter()
            .map(|&level| DistributionReport::new(&ClassStats::from_dataset(dataset, level), self.min_count))
            .collect()
    }

    /// Append the canonical Unknown record if any level lacks the label.
    pub fn ensure_unknown(&self, dataset: &mut Dataset) {
        for level in TaxonomyLevel::ALL {
            if !dataset.has_label(level, UNKNOWN_LABEL) {
                dataset.push(Record::unknown());
            }
        }
    }

    /// Inject the catch-all class, then drop rare classes level by level.
    pub fn filter(&self, mut dataset: Dataset) -> Result<Dataset> {
        self.ensure_unknown(&mut dataset);

        info!("Class distribution analysis:");
        for report in self.distribution(&dataset) {
            report.log();
        }

        info!("Filtering rare classes...");
        let original_len = dataset.len();
        for level in TaxonomyLevel::ALL {
            let stats = ClassStats::from_dataset(&dataset, level);
            dataset.retain(|record| stats.is_retained(record.label(level), self.min_count));
        }

        info!(
            "Removed {} samples with rare classes",
            original_len - dataset.len()
        );
        info!("Remaining samples: {}", dataset.len());

        if dataset.is_empty() {
            return Err(ClassifierError::insufficient_data(
                "No samples remaining after filtering rare classes. Consider lowering min_samples_per_class.",
            ));
        }

        info!("Class distribution after filtering:");
        for report in self.distribution(&dataset) {
            report.log();
        }

        Ok(dataset)
    }
}

impl Default for ClassBalancer {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        rows.iter()
            .enumerate()
            .map(|(i, (c, s))| Record::new(format!("narrative {i}"), *c, *s))
            .collect()
    }

    #[test]
    fn test_singleton_class_excluded() {
        let data = dataset(&[
            ("A", "a1"),
            ("A", "a1"),
            ("A", "a1"),
            ("B", "b1"),
            ("B", "b1"),
            ("C", "c1"),
        ]);

        let filtered = ClassBalancer::new(2).filter(data).unwrap();

        assert!(!filtered.has_label(TaxonomyLevel::Category, "C"));
        assert!(filtered.has_label(TaxonomyLevel::Category, "A"));
        assert!(filtered.has_label(TaxonomyLevel::Category, "B"));
        // The single synthetic Unknown record is itself below the threshold.
        assert!(!filtered.has_label(TaxonomyLevel::Category, UNKNOWN_LABEL));
        assert_eq!(filtered.len(), 5);
    }

    #[test]
    fn test_sequential_intersection() {
        // Category pass drops "C", which leaves sub-category "x" with one row.
        let data = dataset(&[
            ("A", "x"),
            ("C", "x"),
            ("A", "y"),
            ("A", "y"),
            ("B", "z"),
            ("B", "z"),
        ]);

        let filtered = ClassBalancer::new(2).filter(data).unwrap();

        assert!(!filtered.has_label(TaxonomyLevel::SubCategory, "x"));
        assert_eq!(filtered.len(), 4);
        for level in TaxonomyLevel::ALL {
            let stats = ClassStats::from_dataset(&filtered, level);
            assert!(stats.counts.values().all(|&c| c >= 2));
        }
    }

    #[test]
    fn test_natural_unknown_kept() {
        let data = dataset(&[
            ("Unknown", "Unknown"),
            ("Unknown", "Unknown"),
            ("A", "a"),
            ("A", "a"),
        ]);

        let filtered = ClassBalancer::new(2).filter(data).unwrap();

        assert_eq!(filtered.len(), 4);
        assert!(filtered.has_label(TaxonomyLevel::Category, UNKNOWN_LABEL));
    }

    #[test]
    fn test_zero_rows_after_filter() {
        let data = dataset(&[("A", "a"), ("B", "b"), ("C", "c")]);

        let result = ClassBalancer::new(5).filter(data);

        assert!(matches!(result, Err(ClassifierError::InsufficientData(_))));
    }

    #[test]
    fn test_ensure_unknown_appends_canonical_record_once() {
        let mut data = dataset(&[("A", "a")]);
        ClassBalancer::default().ensure_unknown(&mut data);

        assert_eq!(data.len(), 2);
        assert_eq!(data.records()[1], Record::unknown());
    }

    #[test]
    fn test_distribution_report() {
        let data = dataset(&[("A", "a"), ("A", "a"), ("B", "b"), ("C", "a")]);
        let reports = ClassBalancer::new(2).distribution(&data);

        let category = &reports[0];
        assert_eq!(category.level, TaxonomyLevel::Category);
        assert_eq!(category.unique_classes, 3);
        assert_eq!(category.singleton_classes, 2);
        assert_eq!(category.top_classes[0], ("A".to_string(), 2));
        assert_eq!(
            category.below_threshold,
            vec![("B".to_string(), 1), ("C".to_string(), 1)]
        );

        let sub_category = &reports[1];
        assert_eq!(sub_category.top_classes[0], ("a".to_string(), 3));
    }
}
