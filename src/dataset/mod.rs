//! Crime-report records and datasets.
//!
//! A [`Record`] is one labelled narrative. Each record carries a label for
//! both levels of the taxonomy, addressed by [`TaxonomyLevel`].

pub mod loader;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ClassifierError, Result};

pub use loader::{DatasetFormat, DatasetLoader};

/// Label used for the catch-all class.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Narrative of the synthetic catch-all record.
pub const UNKNOWN_NARRATIVE: &str = "unknown case";

/// The two levels of the crime taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyLevel {
    /// Top-level crime category.
    Category,
    /// Fine-grained sub-category.
    SubCategory,
}

impl TaxonomyLevel {
    /// Both levels, in processing order.
    pub const ALL: [TaxonomyLevel; 2] = [TaxonomyLevel::Category, TaxonomyLevel::SubCategory];

    /// Column / field name of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomyLevel::Category => "category",
            TaxonomyLevel::SubCategory => "sub_category",
        }
    }

    /// The label of `record` at this level.
    pub fn label<'a>(&self, record: &'a Record) -> &'a str {
        match self {
            TaxonomyLevel::Category => &record.category,
            TaxonomyLevel::SubCategory => &record.sub_category,
        }
    }
}

impl fmt::Display for TaxonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyLevel {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "category" => Ok(TaxonomyLevel::Category),
            "sub_category" | "subcategory" | "sub-category" => Ok(TaxonomyLevel::SubCategory),
            other => Err(ClassifierError::invalid_argument(format!(
                "Unknown taxonomy level: {other}"
            ))),
        }
    }
}

/// A labelled crime report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Free-text narrative as submitted.
    #[serde(
        rename = "crimeaditionalinfo",
        alias = "text",
        alias = "narrative",
        default,
        deserialize_with = "deserialize_text"
    )]
    pub narrative: String,

    /// Category label.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub category: String,

    /// Sub-category label.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub sub_category: String,
}

impl Record {
    /// Create a new record.
    pub fn new<N, C, S>(narrative: N, category: C, sub_category: S) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        S: Into<String>,
    {
        Record {
            narrative: narrative.into(),
            category: category.into(),
            sub_category: sub_category.into(),
        }
    }

    /// The canonical catch-all record, labelled Unknown at both levels.
    pub fn unknown() -> Self {
        Record::new(UNKNOWN_NARRATIVE, UNKNOWN_LABEL, UNKNOWN_LABEL)
    }

    /// The label at `level`.
    pub fn label(&self, level: TaxonomyLevel) -> &str {
        level.label(self)
    }
}

/// Accepts any scalar and keeps its string representation; null becomes "".
fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// An in-memory collection of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dataset from records.
    pub fn from_records(records: Vec<Record>) -> Self {
        Dataset { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in load order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Iterate over records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Append a record.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Whether any record carries `label` at `level`.
    pub fn has_label(&self, level: TaxonomyLevel, label: &str) -> bool {
        self.records.iter().any(|r| r.label(level) == label)
    }

    /// Per-label record counts at `level`, ordered by label.
    pub fn label_counts(&self, level: TaxonomyLevel) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.label(level).to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Keep only the records for which `keep` returns true.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Record) -> bool,
    {
        self.records.retain(keep);
    }

    /// Consume the dataset and return its records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Dataset::from_records(iter.into_iter().collect())
    }
}

impl IntoIterator for Dataset {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
