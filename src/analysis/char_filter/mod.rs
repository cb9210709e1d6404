//! Char filters that rewrite raw text before it reaches the tokenizer.
//!
//! Narrative cleaning is mostly destructive string rewriting: lowercasing,
//! removing URLs, e-mail addresses and phone numbers, collapsing whitespace
//! and dropping characters the classifier has no use for. Each of those steps
//! is a [`CharFilter`], applied in order by the
//! [`PipelineAnalyzer`](crate::analysis::analyzer::PipelineAnalyzer).
//!
//! # Available Filters
//!
//! - [`lowercase::LowercaseCharFilter`] - Unicode-aware lowercasing
//! - [`pattern_replace::PatternReplaceCharFilter`] - Regex-based replacement
//!
//! # Examples
//!
//! ```
//! use cybercrime_classifier::analysis::char_filter::CharFilter;
//! use cybercrime_classifier::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
//!
//! let filter = PatternReplaceCharFilter::new(r"\s+", " ").unwrap();
//! assert_eq!(filter.filter("card   was\tcloned"), "card was cloned");
//! ```

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text and return the rewritten text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod lowercase;
pub mod pattern_replace;

pub use lowercase::LowercaseCharFilter;
pub use pattern_replace::PatternReplaceCharFilter;
