//! TF-IDF vectorizer over word n-grams.
//!
//! Documents are split into words with a token regex, expanded into word
//! n-grams, and weighted with raw term frequency times smoothed inverse
//! document frequency:
//!
//! ```text
//! idf(t) = ln((1 + N) / (1 + df(t))) + 1
//! ```
//!
//! Each row is scaled to unit Euclidean norm. The vocabulary keeps only
//! terms with `min_df <= df(t) <= max_df * N`, capped to the `max_features`
//! terms with the highest corpus frequency (ties by term order). Feature
//! indices follow the sorted vocabulary.

use std::collections::HashMap;
use std::fmt;

use ahash::AHashMap;
use log::debug;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::VectorizerConfig;
use crate::error::{ClassifierError, Result};
use crate::ml::sparse::SparseVector;

/// TF-IDF vectorizer for normalized narratives.
#[derive(Clone, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    config: VectorizerConfig,
    /// Compiled `config.token_pattern`.
    #[serde(with = "regex_serde")]
    token_regex: Regex,
    /// Term -> feature index.
    vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per feature index.
    idf: Vec<f64>,
    /// Number of documents seen by `fit`.
    n_documents: usize,
}

impl fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("ngram_range", &self.config.ngram_range)
            .field("max_features", &self.config.max_features)
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        config.validate()?;
        let token_regex = Regex::new(&config.token_pattern)
            .map_err(|e| ClassifierError::invalid_config(format!("Invalid token pattern: {e}")))?;

        Ok(Self {
            config,
            token_regex,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            n_documents: 0,
        })
    }

    /// The configuration this vectorizer was built with.
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Split a document into its terms: words, then word n-grams.
    pub fn analyze(&self, document: &str) -> Vec<String> {
        let lowered = document.to_lowercase();
        let words: Vec<&str> = self
            .token_regex
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .collect();

        let (min_n, max_n) = self.config.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(words.len()) {
            for window in words.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Learn the vocabulary and IDF weights.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        let n_documents = documents.len();
        if n_documents == 0 {
            return Err(ClassifierError::insufficient_data(
                "Cannot fit a vectorizer on zero documents",
            ));
        }

        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();
        let mut corpus_frequency: AHashMap<String, usize> = AHashMap::new();

        let analyzed: Vec<Vec<String>> = documents.par_iter().map(|d| self.analyze(d)).collect();
        for terms in analyzed {
            let mut counts: AHashMap<String, usize> = AHashMap::new();
            for term in terms {
                *counts.entry(term).or_insert(0) += 1;
            }
            for (term, count) in counts {
                *corpus_frequency.entry(term.clone()).or_insert(0) += count;
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(ClassifierError::insufficient_data(
                "Empty vocabulary: the documents contain no terms",
            ));
        }

        let max_doc_count = self.config.max_df * n_documents as f64;
        if max_doc_count < self.config.min_df as f64 {
            return Err(ClassifierError::insufficient_data(format!(
                "max_df corresponds to {max_doc_count:.1} documents, fewer than min_df = {}",
                self.config.min_df
            )));
        }

        let mut terms: Vec<String> = document_frequency
            .iter()
            .filter(|&(_, &df)| df >= self.config.min_df && df as f64 <= max_doc_count)
            .map(|(term, _)| term.clone())
            .collect();
        terms.sort();

        if let Some(limit) = self.config.max_features {
            if terms.len() > limit {
                // Stable sort keeps term order among equal frequencies.
                terms.sort_by(|a, b| corpus_frequency[b].cmp(&corpus_frequency[a]));
                terms.truncate(limit);
                terms.sort();
            }
        }

        if terms.is_empty() {
            return Err(ClassifierError::insufficient_data(
                "After pruning, no terms remain. Try a lower min_df or a higher max_df.",
            ));
        }

        let idf = terms
            .iter()
            .map(|term| {
                let df = document_frequency[term] as f64;
                ((1.0 + n_documents as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect();
        self.idf = idf;
        self.n_documents = n_documents;

        debug!(
            "Fitted vectorizer on {} documents: {} features",
            n_documents,
            self.vocabulary.len()
        );

        Ok(())
    }

    /// Transform a document into an L2-normalized TF-IDF vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let pairs = self
            .analyze(document)
            .into_iter()
            .filter_map(|term| self.vocabulary.get(&term).map(|&idx| (idx, self.idf[idx])));

        let mut vector = SparseVector::from_pairs(pairs);
        vector.l2_normalize();
        vector
    }

    /// Transform many documents in parallel.
    pub fn transform_batch(&self, documents: &[String]) -> Vec<SparseVector> {
        documents.par_iter().map(|d| self.transform(d)).collect()
    }

    /// Fit, then transform the same documents.
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        Ok(self.transform_batch(documents))
    }

    /// Whether `fit` has run.
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Number of features.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Feature index of `term`.
    pub fn feature_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// IDF weight of `term`.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.feature_index(term).map(|idx| self.idf[idx])
    }

    /// Terms in feature-index order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            names[idx] = term.clone();
        }
        names
    }
}

mod regex_serde {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(regex.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Regex, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Regex::new(&pattern).map_err(serde::de::Error::custom)
    }
}
