//! WordNet-style noun lemmatizer.
//!
//! Lemmatization works like WordNet's `morphy` for nouns:
//!
//! 1. Irregular plurals are looked up in an exception table
//!    ("children" → "child").
//! 2. Otherwise the regular detachment rules are tried
//!    (`s → ""`, `ses → s`, `ves → f`, `xes → x`, `zes → z`, `ches → ch`,
//!    `shes → sh`, `men → man`, `ies → y`).
//!
//! When the [`LemmaDictionary`] carries a vocabulary, a rule result is only
//! accepted if the vocabulary contains it, and the shortest accepted form
//! wins. Without a vocabulary a conservative subset of the rules is applied
//! directly: words ending in `ss`, `us` or `is` are left alone, `zes` only
//! loses its `es` after a double `z`, and the `ves`/`men` rules are disabled,
//! since they cannot be validated.
//!
//! # Examples
//!
//! ```
//! use cybercrime_classifier::analysis::token_filter::lemma::Lemmatizer;
//! use cybercrime_classifier::analysis::token_filter::lemma::WordNetLemmatizer;
//!
//! let lemmatizer = WordNetLemmatizer::default();
//!
//! assert_eq!(lemmatizer.lemmatize("transactions"), "transaction");
//! assert_eq!(lemmatizer.lemmatize("companies"), "company");
//! assert_eq!(lemmatizer.lemmatize("loss"), "loss");
//! ```

use std::sync::Arc;

use crate::analysis::resources::LemmaDictionary;
use crate::analysis::token_filter::lemma::Lemmatizer;

/// Regular noun detachment rules, in WordNet order.
const NOUN_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

/// Suffixes that look plural but usually are not.
const NON_PLURAL_ENDINGS: &[&str] = &["ss", "us", "is"];

/// Noun lemmatizer backed by a [`LemmaDictionary`].
#[derive(Debug, Clone)]
pub struct WordNetLemmatizer {
    dictionary: Arc<LemmaDictionary>,
}

impl WordNetLemmatizer {
    /// Create a lemmatizer over a shared dictionary.
    pub fn new(dictionary: Arc<LemmaDictionary>) -> Self {
        WordNetLemmatizer { dictionary }
    }

    /// Lemmatize with the vocabulary check enabled.
    fn lemmatize_validated(&self, word: &str) -> String {
        let mut best: Option<String> = None;
        let mut consider = |candidate: String| {
            if self.dictionary.contains(&candidate)
                && best.as_ref().is_none_or(|b| candidate.len() < b.len())
            {
                best = Some(candidate);
            }
        };

        consider(word.to_string());
        for (suffix, replacement) in NOUN_RULES {
            if let Some(stem) = word.strip_suffix(suffix) {
                consider(format!("{stem}{replacement}"));
            }
        }

        best.unwrap_or_else(|| word.to_string())
    }

    /// Lemmatize with the unvalidated, conservative rule subset.
    fn lemmatize_heuristic(&self, word: &str) -> String {
        if word.chars().count() <= 3 || NON_PLURAL_ENDINGS.iter().any(|e| word.ends_with(e)) {
            return word.to_string();
        }

        if let Some(stem) = word.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{stem}y");
            }
        }

        for suffix in ["sses", "ches", "shes", "xes", "zzes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }

        match word.strip_suffix('s') {
            Some(stem) => stem.to_string(),
            None => word.to_string(),
        }
    }
}

impl Default for WordNetLemmatizer {
    fn default() -> Self {
        Self::new(Arc::new(LemmaDictionary::english()))
    }
}

impl Lemmatizer for WordNetLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        if let Some(base) = self.dictionary.exception(word) {
            return base.to_string();
        }

        if self.dictionary.has_vocabulary() {
            self.lemmatize_validated(word)
        } else {
            self.lemmatize_heuristic(word)
        }
    }

    fn name(&self) -> &'static str {
        "wordnet"
    }
}
