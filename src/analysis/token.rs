//! Token types for the narrative analysis pipeline.
//!
//! A [`Token`] is the unit that flows from the tokenizer through the token
//! filters. Shingle tokens produced by n-gram augmentation span several
//! positions, which is recorded in `position_length`:
//!
//! ```text
//! Input: "lost money phishing"
//!
//!   Position 0: "lost"                  (pos_len=1)
//!   Position 1: "money"                 (pos_len=1)
//!   Position 2: "phishing"              (pos_len=1)
//!   Position 0: "lost_money"            (pos_len=2)
//!   Position 1: "money_phishing"        (pos_len=2)
//!   Position 0: "lost_money_phishing"   (pos_len=3)
//! ```
//!
//! # Examples
//!
//! ```
//! use cybercrime_classifier::analysis::token::Token;
//!
//! let token = Token::with_offsets("scam", 2, 10, 14);
//! assert_eq!(token.text, "scam");
//! assert_eq!(token.position, 2);
//! assert_eq!(token.position_length, 1);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single unit of text produced by tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the original token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the cleaned text
    pub start_offset: usize,

    /// The byte offset where this token ends in the cleaned text
    pub end_offset: usize,

    /// How many positions this token spans (default: 1).
    ///
    /// Word shingles joined from `n` adjacent tokens span `n` positions.
    pub position_length: usize,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset: 0,
            end_offset: 0,
            position_length: 1,
        }
    }

    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
            position_length: 1,
        }
    }

    /// Clone this token with updated text.
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        let mut token = self.clone();
        token.text = text.into();
        token
    }

    /// Set the position length.
    pub fn with_position_length(mut self, length: usize) -> Self {
        self.position_length = length;
        self
    }

    /// Length of the token text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A token stream represents a sequence of tokens from the analysis pipeline.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;
