//! Label encoding.
//!
//! Each taxonomy level gets its own [`LabelSpace`]: the sorted set of
//! labels that survived filtering, with dense codes `0..N`. The catch-all
//! label `"Unknown"` is always a member, so a model can always fall back
//! to it.

use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::dataset::{TaxonomyLevel, UNKNOWN_LABEL};
use crate::error::{ClassifierError, Result};

/// Ordered label set with dense integer codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpace {
    /// Labels sorted by byte order; a label's code is its index.
    labels: Vec<String>,
}

impl LabelSpace {
    /// Build a label space from observed labels. `"Unknown"` is added.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels: Vec<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .chain(std::iter::once(UNKNOWN_LABEL.to_string()))
            .collect();
        labels.sort();
        labels.dedup();

        LabelSpace { labels }
    }

    /// Code of `label`.
    pub fn encode(&self, label: &str) -> Result<u32> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .map(|idx| idx as u32)
            .map_err(|_| ClassifierError::unknown_label(format!("'{label}' is not in the label space")))
    }

    /// Label of `code`.
    pub fn decode(&self, code: u32) -> Result<&str> {
        self.labels
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                ClassifierError::unknown_label(format!(
                    "code {code} is out of range for {} labels",
                    self.labels.len()
                ))
            })
    }

    /// Whether `label` is a member.
    pub fn contains(&self, label: &str) -> bool {
        self.encode(label).is_ok()
    }

    /// Code of the `"Unknown"` label.
    pub fn unknown_code(&self) -> u32 {
        // Always present: inserted by `from_labels`.
        self.encode(UNKNOWN_LABEL).unwrap_or(0)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the space is empty. Never true for a fitted space.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All labels in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl fmt::Display for LabelSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.labels.join(", "))
    }
}

/// Fits the label space of one taxonomy level.
#[derive(Debug, Clone, Copy)]
pub struct LabelCodec {
    level: TaxonomyLevel,
}

impl LabelCodec {
    /// Create a codec for `level`.
    pub fn new(level: TaxonomyLevel) -> Self {
        LabelCodec { level }
    }

    /// The level this codec encodes.
    pub fn level(&self) -> TaxonomyLevel {
        self.level
    }

    /// Fit a label space over the observed labels.
    pub fn fit<I, S>(&self, labels: I) -> LabelSpace
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let space = LabelSpace::from_labels(labels);
        info!("Number of unique {}s: {}", self.level, space.len());
        space
    }

    /// Fit a label space and encode the same labels in one pass.
    pub fn fit_transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<(LabelSpace, Vec<u32>)> {
        let space = self.fit(labels.iter().map(|l| l.as_ref()));
        let codes = labels
            .iter()
            .map(|l| space.encode(l.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok((space, codes))
    }
}
