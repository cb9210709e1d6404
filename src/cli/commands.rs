//! Command implementations for the classifier CLI.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::analysis::normalizer::TextNormalizer;
use crate::analysis::resources::LinguisticResources;
use crate::classifier::CrimeClassifier;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::ClassifierConfig;
use crate::dataset::{DatasetLoader, TaxonomyLevel};
use crate::error::{ClassifierError, Result};

/// Execute a CLI command.
pub fn execute_command(args: ClassifierArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args.clone(), &args),
        Command::Predict(predict_args) => predict(predict_args.clone(), &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
        Command::Normalize(normalize_args) => normalize(normalize_args.clone(), &args),
    }
}

/// Load the configuration file, or the defaults.
fn load_config(cli_args: &ClassifierArgs) -> Result<ClassifierConfig> {
    match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ClassifierConfig::load(path)
        }
        None => Ok(ClassifierConfig::default()),
    }
}

/// Load linguistic resources from the resource directory, or the built-in set.
fn load_resources(cli_args: &ClassifierArgs) -> Result<Arc<LinguisticResources>> {
    match &cli_args.resources {
        Some(dir) => {
            info!("Loading linguistic resources from {}", dir.display());
            Ok(LinguisticResources::load(dir)?.shared())
        }
        None => Ok(LinguisticResources::english().shared()),
    }
}

/// Collect narratives from positional arguments and an optional input file.
fn collect_texts(texts: &[String], input: Option<&Path>) -> Result<Vec<String>> {
    let mut collected = texts.to_vec();
    if let Some(path) = input {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                collected.push(line);
            }
        }
    }
    if collected.is_empty() {
        return Err(ClassifierError::invalid_argument(
            "No input text. Pass narratives as arguments or use --input.",
        ));
    }
    Ok(collected)
}

/// Train both levels and save the bundles.
fn train(args: TrainArgs, cli_args: &ClassifierArgs) -> Result<()> {
    let mut config = load_config(cli_args)?;
    if args.no_search {
        config.search.enabled = false;
    }
    let loader = DatasetLoader::new().with_delimiter(args.delimiter);

    let start_time = Instant::now();
    let train_data = loader.load(&args.dataset)?;
    let test_data = match &args.test {
        Some(path) => Some(loader.load(path)?),
        None => None,
    };

    let mut classifier = CrimeClassifier::new(config, load_resources(cli_args)?)?;
    classifier.train(train_data, test_data)?;
    classifier.save(&args.model_dir)?;

    let mut levels = Vec::new();
    for level in TaxonomyLevel::ALL {
        let model = classifier
            .model(level)
            .ok_or_else(|| ClassifierError::model_not_ready(level))?;
        let evaluation = model.evaluation();
        levels.push(LevelTrainingResult {
            level,
            model_id: model.metadata().id.clone(),
            labels: model.labels().len(),
            train_samples: model.metadata().n_train_samples,
            validation_samples: model.metadata().n_validation_samples,
            params: model.params().clone(),
            cv_score: model.metadata().cv_score,
            accuracy: evaluation.map(|e| e.report.accuracy),
            weighted_f1: evaluation.map(|e| e.report.weighted_avg.f1),
            errors: evaluation.map(|e| e.errors.errors),
            top_confusions: evaluation
                .map(|e| e.errors.top_confusions.clone())
                .unwrap_or_default(),
        });
    }

    output_result(
        "Training completed",
        &TrainingResult {
            model_dir: args.model_dir.to_string_lossy().to_string(),
            duration_ms: start_time.elapsed().as_millis() as u64,
            levels,
        },
        cli_args,
    )
}

/// Classify narratives with saved models.
fn predict(args: PredictArgs, cli_args: &ClassifierArgs) -> Result<()> {
    let texts = collect_texts(&args.texts, args.input.as_deref())?;
    let classifier = CrimeClassifier::new(load_config(cli_args)?, load_resources(cli_args)?)?
        .with_models_from(&args.model_dir)?;

    match args.level {
        Some(level) => {
            let predictions = texts
                .into_iter()
                .map(|text| match classifier.predict_level(level, &text) {
                    Ok(prediction) => LevelPredictionOutput {
                        text,
                        level,
                        prediction: Some(prediction),
                        error: None,
                    },
                    Err(e) => LevelPredictionOutput {
                        text,
                        level,
                        prediction: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();
            output_result(
                "Predictions",
                &LevelPredictionResults { predictions },
                cli_args,
            )
        }
        None => {
            let predictions = classifier
                .predict_batch(&texts)
                .into_iter()
                .zip(texts)
                .map(|(prediction, text)| PredictionOutput { text, prediction })
                .collect();
            output_result("Predictions", &PredictionResults { predictions }, cli_args)
        }
    }
}

/// Show the class distribution of a dataset.
fn show_stats(args: StatsArgs, cli_args: &ClassifierArgs) -> Result<()> {
    let mut config = load_config(cli_args)?;
    if let Some(min_samples) = args.min_samples {
        config.balance.min_samples_per_class = min_samples;
    }

    let dataset = DatasetLoader::new()
        .with_delimiter(args.delimiter)
        .load(&args.dataset)?;
    let records = dataset.len();
    let classifier = CrimeClassifier::new(config, load_resources(cli_args)?)?;

    output_result(
        "Dataset statistics",
        &DatasetStats {
            path: args.dataset.to_string_lossy().to_string(),
            records,
            min_samples_per_class: classifier.config().balance.min_samples_per_class,
            levels: classifier.stats(&dataset),
        },
        cli_args,
    )
}

/// Show how narratives are normalized.
fn normalize(args: NormalizeArgs, cli_args: &ClassifierArgs) -> Result<()> {
    let config = load_config(cli_args)?;
    let texts = collect_texts(&args.texts, args.input.as_deref())?;
    let normalizer = TextNormalizer::new(load_resources(cli_args)?)?
        .with_min_token_count(config.preprocess.min_token_count)?;

    let items = texts
        .into_iter()
        .map(|text| NormalizedText {
            normalized: normalizer.normalize(&text),
            text,
        })
        .collect();

    output_result("Normalized narratives", &NormalizeResults { items }, cli_args)
}
