//! Tokenizer implementations for text analysis.
//!
//! A tokenizer is the step of the pipeline that turns cleaned text into a
//! [`TokenStream`]. Narratives are split with a [`RegexTokenizer`] that emits
//! word runs and keeps sentence punctuation as separate tokens.
//!
//! # Examples
//!
//! ```
//! use cybercrime_classifier::analysis::tokenizer::Tokenizer;
//! use cybercrime_classifier::analysis::tokenizer::RegexTokenizer;
//!
//! let tokenizer = RegexTokenizer::new().unwrap();
//! let tokens: Vec<_> = tokenizer.tokenize("account hacked").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod regex;

pub use regex::RegexTokenizer;
