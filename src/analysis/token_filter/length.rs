//! Minimum length filter.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that drops tokens shorter than a minimum number of characters.
///
/// Punctuation tokens and two-letter fragments left over from cleaning
/// ("rs", "ok", "!") are removed by this filter.
#[derive(Clone, Debug)]
pub struct MinLengthFilter {
    min_len: usize,
}

impl MinLengthFilter {
    /// Create a filter keeping tokens with at least `min_len` characters.
    pub fn new(min_len: usize) -> Self {
        MinLengthFilter { min_len }
    }

    /// Minimum number of characters a token needs to survive.
    pub fn min_len(&self) -> usize {
        self.min_len
    }
}

impl Default for MinLengthFilter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Filter for MinLengthFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let min_len = self.min_len;
        let filtered_tokens: Vec<Token> = tokens
            .filter(|token| token.char_len() >= min_len)
            .collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "min_length"
    }
}
