//! Linguistic resources used by the narrative normalizer.
//!
//! A [`LinguisticResources`] handle bundles the stop word set and the lemma
//! dictionary. It is built once, either from the built-in English data or
//! from a resource directory, and shared immutably (behind an [`Arc`]) by
//! every normalizer that needs it.
//!
//! A resource directory may contain:
//!
//! ```text
//! stopwords.txt          one stop word per line (required)
//! lemma_exceptions.tsv   "inflected<TAB>lemma" per line (optional)
//! lemma_vocabulary.txt   one valid noun lemma per line (optional)
//! ```
//!
//! Blank lines and lines starting with `#` are ignored in all three files.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::analysis::token_filter::stop::{DEFAULT_NARRATIVE_STOP_WORDS_SET, DOMAIN_FILLER_WORDS};
use crate::error::{ClassifierError, Result};

/// File name of the stop word list inside a resource directory.
pub const STOP_WORDS_FILE: &str = "stopwords.txt";

/// File name of the lemma exception table inside a resource directory.
pub const LEMMA_EXCEPTIONS_FILE: &str = "lemma_exceptions.tsv";

/// File name of the lemma vocabulary inside a resource directory.
pub const LEMMA_VOCABULARY_FILE: &str = "lemma_vocabulary.txt";

/// Irregular English noun plurals.
const ENGLISH_NOUN_EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("mice", "mouse"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("lives", "life"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("thieves", "thief"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("data", "datum"),
];

/// Exception table and optional vocabulary for noun lemmatization.
#[derive(Debug, Clone, Default)]
pub struct LemmaDictionary {
    exceptions: HashMap<String, String>,
    vocabulary: Option<HashSet<String>>,
}

impl LemmaDictionary {
    /// Built-in English exceptions, no vocabulary.
    pub fn english() -> Self {
        LemmaDictionary {
            exceptions: ENGLISH_NOUN_EXCEPTIONS
                .iter()
                .map(|&(word, lemma)| (word.to_string(), lemma.to_string()))
                .collect(),
            vocabulary: None,
        }
    }

    /// Add or override exception entries.
    pub fn with_exceptions<I>(mut self, exceptions: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.exceptions.extend(exceptions);
        self
    }

    /// Attach a vocabulary that rule-based lemmas are validated against.
    pub fn with_vocabulary<I>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.vocabulary = Some(words.into_iter().collect());
        self
    }

    /// Look up an irregular form.
    pub fn exception(&self, word: &str) -> Option<&str> {
        self.exceptions.get(word).map(String::as_str)
    }

    /// Whether a vocabulary is attached.
    pub fn has_vocabulary(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Whether the vocabulary contains `word`. Always false without one.
    pub fn contains(&self, word: &str) -> bool {
        self.vocabulary
            .as_ref()
            .is_some_and(|vocabulary| vocabulary.contains(word))
    }

    /// Number of exception entries.
    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }

    /// Number of vocabulary entries (0 without a vocabulary).
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, HashSet::len)
    }
}

/// Immutable bundle of stop words and lemma data.
#[derive(Debug, Clone)]
pub struct LinguisticResources {
    stop_words: Arc<HashSet<String>>,
    lemmas: Arc<LemmaDictionary>,
}

impl LinguisticResources {
    /// Create resources from explicit parts.
    pub fn new(stop_words: HashSet<String>, lemmas: LemmaDictionary) -> Self {
        LinguisticResources {
            stop_words: Arc::new(stop_words),
            lemmas: Arc::new(lemmas),
        }
    }

    /// Built-in English stop words, domain fillers and noun exceptions.
    pub fn english() -> Self {
        Self::new(
            DEFAULT_NARRATIVE_STOP_WORDS_SET.clone(),
            LemmaDictionary::english(),
        )
    }

    /// Load resources from a directory.
    ///
    /// The courtesy fillers are always part of the stop word set, whatever
    /// `stopwords.txt` contains. Exceptions from `lemma_exceptions.tsv` are
    /// merged over the built-in table.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let stop_words_path = dir.join(STOP_WORDS_FILE);
        let mut stop_words: HashSet<String> = read_lines(&stop_words_path)?
            .into_iter()
            .map(|line| line.to_lowercase())
            .collect();
        stop_words.extend(DOMAIN_FILLER_WORDS.iter().map(|s| s.to_string()));

        let mut lemmas = LemmaDictionary::english();

        let exceptions_path = dir.join(LEMMA_EXCEPTIONS_FILE);
        if exceptions_path.exists() {
            let mut entries = Vec::new();
            for (line_no, line) in read_lines(&exceptions_path)?.into_iter().enumerate() {
                let mut fields = line.split('\t');
                match (fields.next(), fields.next()) {
                    (Some(word), Some(lemma)) if !lemma.trim().is_empty() => {
                        entries.push((word.trim().to_lowercase(), lemma.trim().to_lowercase()));
                    }
                    _ => {
                        return Err(ClassifierError::invalid_config(format!(
                            "Malformed entry {} in {}: expected 'word<TAB>lemma'",
                            line_no + 1,
                            exceptions_path.display()
                        )));
                    }
                }
            }
            lemmas = lemmas.with_exceptions(entries);
        }

        let vocabulary_path = dir.join(LEMMA_VOCABULARY_FILE);
        if vocabulary_path.exists() {
            let words = read_lines(&vocabulary_path)?
                .into_iter()
                .map(|line| line.to_lowercase());
            lemmas = lemmas.with_vocabulary(words);
        }

        info!(
            "Loaded linguistic resources from {}: {} stop words, {} lemma exceptions, {} vocabulary entries",
            dir.display(),
            stop_words.len(),
            lemmas.exception_count(),
            lemmas.vocabulary_size()
        );

        Ok(Self::new(stop_words, lemmas))
    }

    /// Wrap in an [`Arc`] for sharing.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The stop word set.
    pub fn stop_words(&self) -> &Arc<HashSet<String>> {
        &self.stop_words
    }

    /// The lemma dictionary.
    pub fn lemmas(&self) -> &Arc<LemmaDictionary> {
        &self.lemmas
    }
}

impl Default for LinguisticResources {
    fn default() -> Self {
        Self::english()
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        ClassifierError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read resource file '{}': {}", path.display(), e),
        ))
    })?;

    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    debug!("Read {} entries from {}", lines.len(), path.display());

    Ok(lines)
}
