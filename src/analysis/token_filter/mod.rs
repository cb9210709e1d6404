//! Token filter implementations for token transformation.
//!
//! Filters run after the tokenizer, in the order they were added to the
//! analyzer:
//!
//! ```text
//! Tokenizer → Stop Words → Min Length → Lemmatizer → Shingles
//! ```
//!
//! # Available Filters
//!
//! - [`stop::StopFilter`] - Removes stop words and courtesy fillers
//! - [`length::MinLengthFilter`] - Removes tokens that are too short
//! - [`lemma::LemmaFilter`] - Reduces words to their dictionary form
//! - [`shingle::ShingleFilter`] - Appends joined word n-grams

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod length;
pub mod lemma;
pub mod shingle;
pub mod stop;

pub use length::MinLengthFilter;
pub use lemma::{LemmaFilter, Lemmatizer, WordNetLemmatizer};
pub use shingle::ShingleFilter;
pub use stop::StopFilter;
