//! Word shingle filter.
//!
//! Short reports carry most of their signal in compound phrases ("credit
//! card", "fake customer care"). The shingle filter keeps every unigram and
//! appends the joined n-grams of adjacent tokens after them:
//!
//! ```text
//! [lost, money, upi]  →  [lost, money, upi, lost_money, money_upi, lost_money_upi]
//! ```

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::{ClassifierError, Result};

/// A filter that appends joined n-grams of adjacent tokens to the stream.
#[derive(Clone, Debug)]
pub struct ShingleFilter {
    min_size: usize,
    max_size: usize,
    separator: String,
}

impl ShingleFilter {
    /// Create a shingle filter producing n-grams of `min_size..=max_size` tokens.
    pub fn new(min_size: usize, max_size: usize) -> Result<Self> {
        if min_size < 2 || max_size < min_size {
            return Err(ClassifierError::analysis(format!(
                "Invalid shingle sizes: min={min_size}, max={max_size}"
            )));
        }

        Ok(ShingleFilter {
            min_size,
            max_size,
            separator: "_".to_string(),
        })
    }

    /// Set the separator used to join tokens.
    pub fn with_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.separator = separator.into();
        self
    }
}

impl Default for ShingleFilter {
    /// Bigrams and trigrams joined with `_`.
    fn default() -> Self {
        ShingleFilter {
            min_size: 2,
            max_size: 3,
            separator: "_".to_string(),
        }
    }
}

impl Filter for ShingleFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let mut output: Vec<Token> = tokens.collect();
        let words = output.clone();

        // All bigrams first, then all trigrams.
        for size in self.min_size..=self.max_size {
            for window in words.windows(size) {
                let text = window
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(&self.separator);
                let first = &window[0];
                let last = &window[size - 1];
                output.push(
                    Token::with_offsets(text, first.position, first.start_offset, last.end_offset)
                        .with_position_length(size),
                );
            }
        }

        Ok(Box::new(output.into_iter()))
    }

    fn name(&self) -> &'static str {
        "shingle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(filter: &ShingleFilter, words: &[&str]) -> Vec<String> {
        let tokens: Vec<Token> = words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(*w, i))
            .collect();
        filter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_bigrams_and_trigrams_follow_unigrams() {
        let filter = ShingleFilter::default();
        assert_eq!(
            texts(&filter, &["lost", "money", "upi"]),
            vec![
                "lost",
                "money",
                "upi",
                "lost_money",
                "money_upi",
                "lost_money_upi"
            ]
        );
    }

    #[test]
    fn test_short_streams() {
        let filter = ShingleFilter::default();
        assert_eq!(texts(&filter, &["scam"]), vec!["scam"]);
        assert_eq!(
            texts(&filter, &["scam", "call"]),
            vec!["scam", "call", "scam_call"]
        );
        assert!(texts(&filter, &[]).is_empty());
    }

    #[test]
    fn test_position_length() {
        let filter = ShingleFilter::new(2, 2).unwrap().with_separator(" ");
        let tokens = vec![Token::new("fake", 0), Token::new("loan", 1)];
        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result[2].text, "fake loan");
        assert_eq!(result[2].position, 0);
        assert_eq!(result[2].position_length, 2);
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(ShingleFilter::new(1, 3).is_err());
        assert!(ShingleFilter::new(3, 2).is_err());
    }
}
