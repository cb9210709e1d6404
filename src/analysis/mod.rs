//! Text analysis for crime-report narratives.
//!
//! The analysis module turns raw narratives into token strings:
//!
//! - [`char_filter`] rewrites raw text (lowercasing, contact-detail removal)
//! - [`tokenizer`] splits the cleaned text into tokens
//! - [`token_filter`] drops, lemmatizes and combines tokens
//! - [`analyzer`] chains the three into a pipeline
//! - [`normalizer`] configures the pipeline used for training and prediction
//! - [`resources`] holds the stop word and lemma data the pipeline uses

pub mod analyzer;
pub mod char_filter;
pub mod normalizer;
pub mod resources;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use normalizer::TextNormalizer;
pub use resources::{LemmaDictionary, LinguisticResources};
pub use token::{Token, TokenStream};
