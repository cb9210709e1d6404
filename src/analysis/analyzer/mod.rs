//! Analyzers that combine char filters, a tokenizer and token filters.

#[allow(clippy::module_inception)]
pub mod analyzer;
pub mod pipeline;

pub use analyzer::Analyzer;
pub use pipeline::PipelineAnalyzer;
