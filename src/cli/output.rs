//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{ClassifierArgs, OutputFormat};
use crate::dataset::TaxonomyLevel;
use crate::error::Result;
use crate::ml::balance::DistributionReport;
use crate::ml::error_analysis::ConfusionPair;
use crate::ml::predictor::{LevelPrediction, Prediction};
use crate::ml::search::Hyperparameters;

/// Types that can be printed for a human reader.
pub trait HumanOutput {
    /// Render as lines of text.
    fn render_human(&self) -> String;
}

/// Result of training one level.
#[derive(Debug, Serialize, Deserialize)]
pub struct LevelTrainingResult {
    pub level: TaxonomyLevel,
    pub model_id: String,
    pub labels: usize,
    pub train_samples: usize,
    pub validation_samples: usize,
    pub params: Hyperparameters,
    pub cv_score: Option<f64>,
    pub accuracy: Option<f64>,
    pub weighted_f1: Option<f64>,
    pub errors: Option<usize>,
    pub top_confusions: Vec<ConfusionPair>,
}

/// Result structure for training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingResult {
    pub model_dir: String,
    pub duration_ms: u64,
    pub levels: Vec<LevelTrainingResult>,
}

/// One classified narrative.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub text: String,
    #[serde(flatten)]
    pub prediction: Prediction,
}

/// One narrative classified at a single level.
#[derive(Debug, Serialize, Deserialize)]
pub struct LevelPredictionOutput {
    pub text: String,
    pub level: TaxonomyLevel,
    #[serde(flatten)]
    pub prediction: Option<LevelPrediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result structure for prediction.
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResults {
    pub predictions: Vec<PredictionOutput>,
}

/// Result structure for single-level prediction.
#[derive(Debug, Serialize, Deserialize)]
pub struct LevelPredictionResults {
    pub predictions: Vec<LevelPredictionOutput>,
}

/// Dataset statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetStats {
    pub path: String,
    pub records: usize,
    pub min_samples_per_class: usize,
    pub levels: Vec<DistributionReport>,
}

/// One normalized narrative.
#[derive(Debug, Serialize, Deserialize)]
pub struct NormalizedText {
    pub text: String,
    pub normalized: Option<String>,
}

/// Result structure for normalization.
#[derive(Debug, Serialize, Deserialize)]
pub struct NormalizeResults {
    pub items: Vec<NormalizedText>,
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &ClassifierArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: HumanOutput>(message: &str, result: &T, args: &ClassifierArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }
    print!("{}", result.render_human());
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &ClassifierArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

impl HumanOutput for TrainingResult {
    fn render_human(&self) -> String {
        let mut out = String::new();
        for level in &self.levels {
            out.push_str(&format!("{}\n", level.level.as_str().to_uppercase()));
            out.push_str(&format!("  Model:             {}\n", level.model_id));
            out.push_str(&format!("  Labels:            {}\n", level.labels));
            out.push_str(&format!(
                "  Samples:           {} train, {} validation\n",
                level.train_samples, level.validation_samples
            ));
            out.push_str(&format!("  Parameters:        {}\n", level.params));
            out.push_str(&format!("  CV weighted F1:    {}\n", format_optional(level.cv_score)));
            out.push_str(&format!("  Accuracy:          {}\n", format_optional(level.accuracy)));
            out.push_str(&format!("  Weighted F1:       {}\n", format_optional(level.weighted_f1)));
            if let Some(errors) = level.errors {
                out.push_str(&format!("  Misclassified:     {errors}\n"));
            }
            for pair in &level.top_confusions {
                out.push_str(&format!(
                    "    {} -> {}: {}\n",
                    pair.truth, pair.predicted, pair.count
                ));
            }
            out.push('\n');
        }
        out.push_str(&format!(
            "Models saved to {} in {:.2}s\n",
            self.model_dir,
            self.duration_ms as f64 / 1000.0
        ));
        out
    }
}

impl HumanOutput for PredictionResults {
    fn render_human(&self) -> String {
        let mut out = String::new();
        for (i, item) in self.predictions.iter().enumerate() {
            let p = &item.prediction;
            out.push_str(&format!("[{}] {}\n", i + 1, item.text));
            out.push_str(&format!(
                "    Category:     {} ({:.2})\n",
                p.category, p.category_confidence
            ));
            out.push_str(&format!(
                "    Sub-category: {} ({:.2})\n",
                p.sub_category, p.sub_category_confidence
            ));
        }
        out
    }
}

impl HumanOutput for LevelPredictionResults {
    fn render_human(&self) -> String {
        let mut out = String::new();
        for (i, item) in self.predictions.iter().enumerate() {
            out.push_str(&format!("[{}] {}\n", i + 1, item.text));
            match (&item.prediction, &item.error) {
                (Some(p), _) => out.push_str(&format!(
                    "    {}: {} ({:.2})\n",
                    item.level, p.label, p.confidence
                )),
                (None, Some(e)) => out.push_str(&format!("    {}: error: {e}\n", item.level)),
                (None, None) => {}
            }
        }
        out
    }
}

impl HumanOutput for DatasetStats {
    fn render_human(&self) -> String {
        let mut out = format!(
            "{}: {} records (minimum {} samples per class)\n\n",
            self.path, self.records, self.min_samples_per_class
        );
        for report in &self.levels {
            out.push_str(&format!("{}\n", report.level.as_str().to_uppercase()));
            out.push_str(&format!("  Unique classes:    {}\n", report.unique_classes));
            out.push_str(&format!("  Singleton classes: {}\n", report.singleton_classes));
            out.push_str("  Most common:\n");
            for (label, count) in &report.top_classes {
                out.push_str(&format!("    {label}: {count}\n"));
            }
            out.push_str(&format!(
                "  Below threshold:   {}\n",
                report.below_threshold.len()
            ));
            for (label, count) in &report.below_threshold {
                out.push_str(&format!("    {label}: {count}\n"));
            }
            out.push('\n');
        }
        out
    }
}

impl HumanOutput for NormalizeResults {
    fn render_human(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            out.push_str(&format!("{}\n", item.text));
            match &item.normalized {
                Some(normalized) => out.push_str(&format!("  => {normalized}\n")),
                None => out.push_str("  => (unusable)\n"),
            }
        }
        out
    }
}
