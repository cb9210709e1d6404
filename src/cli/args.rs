//! Command line argument parsing for the classifier CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::dataset::TaxonomyLevel;

/// cybercrime-classifier - classify crime report narratives
#[derive(Parser, Debug, Clone)]
#[command(name = "cybercrime-classifier")]
#[command(about = "Train and run a two-level classifier for crime report narratives")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ClassifierArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "CYBERCRIME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory with stopwords.txt and optional lemma files
    #[arg(long, value_name = "DIR", env = "CYBERCRIME_RESOURCES")]
    pub resources: Option<PathBuf>,

    /// Worker threads (default: number of CPUs)
    #[arg(short = 'j', long, env = "CYBERCRIME_THREADS")]
    pub threads: Option<usize>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ClassifierArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n + 1,
            }
        }
    }

    /// Number of worker threads to use.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train both models and save them
    Train(TrainArgs),

    /// Classify narratives with saved models
    Predict(PredictArgs),

    /// Show the class distribution of a dataset
    Stats(StatsArgs),

    /// Show how narratives are normalized
    Normalize(NormalizeArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Training dataset (CSV, JSON or JSON Lines)
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Held-out test dataset; without it 20% of the training data is held out
    #[arg(short, long, value_name = "TEST_DATASET")]
    pub test: Option<PathBuf>,

    /// Directory to write the model bundles to
    #[arg(short, long, default_value = "models")]
    pub model_dir: PathBuf,

    /// CSV field delimiter
    #[arg(short, long, default_value = ",")]
    pub delimiter: char,

    /// Skip the grid search and fit the configured parameters
    #[arg(long)]
    pub no_search: bool,
}

/// Arguments for prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Narratives to classify
    #[arg(value_name = "TEXT")]
    pub texts: Vec<String>,

    /// File with one narrative per line
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory holding the model bundles
    #[arg(short, long, default_value = "models")]
    pub model_dir: PathBuf,

    /// Only classify at this level and report its errors
    #[arg(short, long)]
    pub level: Option<TaxonomyLevel>,
}

/// Arguments for dataset statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Dataset to inspect
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// CSV field delimiter
    #[arg(short, long, default_value = ",")]
    pub delimiter: char,

    /// Retention threshold (default: from the configuration)
    #[arg(long)]
    pub min_samples: Option<usize>,
}

/// Arguments for normalization
#[derive(Parser, Debug, Clone)]
pub struct NormalizeArgs {
    /// Narratives to normalize
    #[arg(value_name = "TEXT")]
    pub texts: Vec<String>,

    /// File with one narrative per line
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_train_args() {
        let args = ClassifierArgs::try_parse_from([
            "cybercrime-classifier",
            "train",
            "train.csv",
            "--test",
            "test.csv",
            "--no-search",
        ])
        .unwrap();

        if let Command::Train(train) = args.command {
            assert_eq!(train.dataset, PathBuf::from("train.csv"));
            assert_eq!(train.test, Some(PathBuf::from("test.csv")));
            assert_eq!(train.model_dir, PathBuf::from("models"));
            assert!(train.no_search);
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_predict_args() {
        let args = ClassifierArgs::try_parse_from([
            "cybercrime-classifier",
            "--format",
            "json",
            "predict",
            "I lost money to a UPI scam",
            "--level",
            "sub_category",
        ])
        .unwrap();

        assert_eq!(args.output_format, OutputFormat::Json);
        if let Command::Predict(predict) = args.command {
            assert_eq!(predict.texts.len(), 1);
            assert_eq!(predict.level, Some(TaxonomyLevel::SubCategory));
        } else {
            panic!("Expected Predict command");
        }
    }

    #[test]
    fn test_verbosity() {
        let args = ClassifierArgs::try_parse_from(["cybercrime-classifier", "-vv", "normalize", "text"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args = ClassifierArgs::try_parse_from(["cybercrime-classifier", "-q", "normalize", "text"]).unwrap();
        assert_eq!(args.verbosity(), 0);

        let args = ClassifierArgs::try_parse_from(["cybercrime-classifier", "normalize", "text"]).unwrap();
        assert_eq!(args.verbosity(), 1);
    }

    #[test]
    fn test_thread_count() {
        let args =
            ClassifierArgs::try_parse_from(["cybercrime-classifier", "-j", "3", "stats", "data.csv"]).unwrap();
        assert_eq!(args.thread_count(), 3);
    }
}
