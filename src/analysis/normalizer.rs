//! Narrative normalizer.
//!
//! Turns a raw, user-submitted crime report into the space-separated token
//! string the vectorizer is trained on:
//!
//! ```text
//! lowercase → strip URLs / e-mails / phone numbers → collapse whitespace
//!   → keep [a-zA-Z\s!?.] → tokenize → stop words → length ≥ 3
//!   → lemmatize → append bigrams and trigrams → join
//! ```
//!
//! Text that ends up with fewer than `min_token_count` tokens is unusable and
//! reported as `None`. Normalization never fails: internal errors are logged
//! and also reported as `None`.
//!
//! # Examples
//!
//! ```
//! use cybercrime_classifier::analysis::normalizer::TextNormalizer;
//! use cybercrime_classifier::analysis::resources::LinguisticResources;
//!
//! let normalizer = TextNormalizer::new(LinguisticResources::english().shared()).unwrap();
//!
//! let text = normalizer.normalize("Lost money in a UPI scam").unwrap();
//! assert_eq!(text, "lost money upi scam lost_money money_upi upi_scam lost_money_upi money_upi_scam");
//!
//! assert_eq!(normalizer.normalize("ok"), None);
//! ```

use std::fmt::{self, Display};
use std::sync::Arc;

use log::error;

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::char_filter::{LowercaseCharFilter, PatternReplaceCharFilter};
use crate::analysis::resources::LinguisticResources;
use crate::analysis::token_filter::{
    LemmaFilter, MinLengthFilter, ShingleFilter, StopFilter, WordNetLemmatizer,
};
use crate::analysis::tokenizer::RegexTokenizer;
use crate::error::{ClassifierError, Result};

/// URLs, with or without a scheme.
pub const URL_PATTERN: &str = r"http\S+|www\S+";

/// Anything that looks like an e-mail address.
pub const EMAIL_PATTERN: &str = r"\S+@\S+";

/// Long digit runs and NANP-style phone numbers.
pub const PHONE_PATTERN: &str = r"\+?\d{10,}|\+?\d{3}[-\s]?\d{3}[-\s]?\d{4}";

/// Runs of whitespace.
pub const WHITESPACE_PATTERN: &str = r"\s+";

/// Every character except ASCII letters, whitespace and `!?.`.
pub const DISALLOWED_CHARS_PATTERN: &str = r"[^a-zA-Z\s!?.]";

/// Default minimum number of output tokens for usable text.
pub const DEFAULT_MIN_TOKEN_COUNT: usize = 3;

/// Minimum length of a word token, in characters.
pub const MIN_WORD_CHARS: usize = 3;

/// Deterministic narrative cleaner and tokenizer.
#[derive(Clone)]
pub struct TextNormalizer {
    analyzer: PipelineAnalyzer,
    resources: Arc<LinguisticResources>,
    min_token_count: usize,
}

impl TextNormalizer {
    /// Build a normalizer over shared linguistic resources.
    pub fn new(resources: Arc<LinguisticResources>) -> Result<Self> {
        let analyzer = PipelineAnalyzer::new(Arc::new(RegexTokenizer::words_and_punctuation()?))
            .add_char_filter(Arc::new(LowercaseCharFilter::new()))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::remove(URL_PATTERN)?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::remove(EMAIL_PATTERN)?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::remove(PHONE_PATTERN)?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::new(
                WHITESPACE_PATTERN,
                " ",
            )?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::remove(
                DISALLOWED_CHARS_PATTERN,
            )?))
            .add_filter(Arc::new(StopFilter::from_shared(Arc::clone(
                resources.stop_words(),
            ))))
            .add_filter(Arc::new(MinLengthFilter::new(MIN_WORD_CHARS)))
            .add_filter(Arc::new(LemmaFilter::with_lemmatizer(Box::new(
                WordNetLemmatizer::new(Arc::clone(resources.lemmas())),
            ))))
            .add_filter(Arc::new(ShingleFilter::default()))
            .with_name("narrative");

        Ok(TextNormalizer {
            analyzer,
            resources,
            min_token_count: DEFAULT_MIN_TOKEN_COUNT,
        })
    }

    /// Set the minimum number of output tokens.
    pub fn with_min_token_count(mut self, min_token_count: usize) -> Result<Self> {
        if min_token_count == 0 {
            return Err(ClassifierError::invalid_config(
                "min_token_count must be positive",
            ));
        }
        self.min_token_count = min_token_count;
        Ok(self)
    }

    /// Minimum number of output tokens for usable text.
    pub fn min_token_count(&self) -> usize {
        self.min_token_count
    }

    /// The linguistic resources this normalizer was built with.
    pub fn resources(&self) -> &Arc<LinguisticResources> {
        &self.resources
    }

    /// Normalize a narrative. `None` means the text is unusable.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        match self.tokens(raw) {
            Ok(tokens) if tokens.len() >= self.min_token_count => Some(tokens.join(" ")),
            Ok(_) => None,
            Err(e) => {
                error!("Error preprocessing text: {e}");
                None
            }
        }
    }

    /// Normalize any displayable value by its string representation.
    pub fn normalize_display<T: Display + ?Sized>(&self, raw: &T) -> Option<String> {
        self.normalize(&raw.to_string())
    }

    /// Run the pipeline and return the output tokens, including n-grams.
    pub fn tokens(&self, raw: &str) -> Result<Vec<String>> {
        Ok(self.analyzer.analyze(raw)?.map(|token| token.text).collect())
    }

    /// Run only the character-level cleaning steps.
    pub fn clean(&self, raw: &str) -> String {
        self.analyzer.clean(raw)
    }
}

impl fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("analyzer", &self.analyzer)
            .field("min_token_count", &self.min_token_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(LinguisticResources::english().shared()).unwrap()
    }

    #[test]
    fn test_phishing_narrative() {
        let text = normalizer()
            .normalize("I lost money in a phishing email scam from a fake bank.")
            .unwrap();
        let tokens: Vec<&str> = text.split(' ').collect();

        for word in ["lost", "money", "phishing", "email", "scam", "fake", "bank"] {
            assert!(tokens.contains(&word), "missing {word}");
        }
        assert!(tokens.contains(&"phishing_email"));
        assert!(tokens.contains(&"phishing_email_scam"));
        assert!(!tokens.contains(&"from"));
        assert!(!tokens.contains(&"."));
        // 7 unigrams + 6 bigrams + 5 trigrams
        assert_eq!(tokens.len(), 18);
    }

    #[test]
    fn test_unusable_text() {
        let normalizer = normalizer();
        assert_eq!(normalizer.normalize("ok"), None);
        assert_eq!(normalizer.normalize(""), None);
        assert_eq!(normalizer.normalize("please help me sir"), None);
        assert_eq!(normalizer.normalize("fraud"), None);
    }

    #[test]
    fn test_ellipsis_survives() {
        assert_eq!(
            normalizer().normalize("scammed..."),
            Some("scammed ... scammed_...".to_string())
        );
        assert_eq!(normalizer().normalize("scammed."), None);
    }

    #[test]
    fn test_two_words_are_enough() {
        // Two unigrams plus their bigram make three tokens.
        assert_eq!(
            normalizer().normalize("card cloned"),
            Some("card cloned card_cloned".to_string())
        );
    }

    #[test]
    fn test_contact_details_removed() {
        let normalizer = normalizer();
        assert_eq!(
            normalizer.clean("Call +919876543210 or mail a.b@fraud.in, see www.fake.com now"),
            "call or mail see now"
        );
        assert_eq!(normalizer.clean("Dial 555-123-4567 today"), "dial today");
    }

    #[test]
    fn test_lemmatization_applied() {
        let text = normalizer()
            .normalize("multiple transactions debited from accounts")
            .unwrap();
        assert!(text.starts_with("multiple transaction debited account"));
    }

    #[test]
    fn test_deterministic() {
        let normalizer = normalizer();
        let raw = "Someone hacked my Instagram account and is asking for ransom!!";
        assert_eq!(normalizer.normalize(raw), normalizer.normalize(raw));
    }

    #[test]
    fn test_normalize_display() {
        let normalizer = normalizer();
        assert_eq!(normalizer.normalize_display(&12345), None);
        assert_eq!(
            normalizer.normalize_display("fake loan app"),
            Some("fake loan app fake_loan loan_app fake_loan_app".to_string())
        );
    }

    #[test]
    fn test_min_token_count() {
        let strict = normalizer().with_min_token_count(7).unwrap();
        assert_eq!(strict.normalize("fake loan app"), None);
        assert!(normalizer().with_min_token_count(0).is_err());
    }
}
