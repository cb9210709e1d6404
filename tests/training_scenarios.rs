//! End-to-end training and prediction scenarios.

use std::fs;
use std::path::Path;

use cybercrime_classifier::classifier::{CrimeClassifier, model_path};
use cybercrime_classifier::config::ParamGrid;
use cybercrime_classifier::dataset::UNKNOWN_LABEL;
use cybercrime_classifier::ml::{ClassBalancer, LabelCodec};
use cybercrime_classifier::prelude::*;
use tempfile::TempDir;

const FRAUD: &[&str] = &[
    "Money was debited from my bank account after I clicked a UPI payment link",
    "Fraudster sent a UPI collect request and money was debited from my account",
    "I paid through UPI to a fake seller and the money was never refunded",
    "Unknown person took money through UPI by asking me to scan a QR code",
    "UPI transaction fraud, amount debited twice from my bank account",
    "Caller posing as bank officer took money through a UPI request",
    "Received fake UPI payment screenshot and lost money to the buyer",
    "Money transferred through UPI to a fraud customer care number",
];

const HACKING: &[&str] = &[
    "My Instagram account was hacked and the password was changed",
    "Someone hacked my Facebook account and is posting from my profile",
    "Email account hacked, the attacker changed my password and recovery phone",
    "My WhatsApp account was hacked after sharing an OTP with a stranger",
    "Hacker took over my Twitter account and changed the login password",
    "Gmail account hacked, password reset without my permission",
    "Unknown login to my Facebook account, hacked and profile picture changed",
    "Instagram profile hacked and the hacker is messaging my friends",
];

fn config() -> ClassifierConfig {
    let mut config = ClassifierConfig::default();
    config.forest.n_estimators = 20;
    config.forest.min_samples_split = 2;
    config.forest.min_samples_leaf = 1;
    config.search.cv_folds = 3;
    config.search.grid = ParamGrid {
        max_depth: vec![Some(10), None],
        ..ParamGrid::empty()
    };
    config
}

fn training_records() -> Vec<Record> {
    let mut records = Vec::new();
    for text in FRAUD {
        records.push(Record::new(*text, "Online Financial Fraud", "UPI Related Frauds"));
    }
    for text in HACKING {
        records.push(Record::new(*text, "Hacking", "Social Media Account Hacking"));
    }
    records
}

fn write_csv(path: &Path, records: &[Record]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer
        .write_record(["category", "sub_category", "crimeaditionalinfo"])
        .unwrap();
    for record in records {
        writer
            .write_record([&record.category, &record.sub_category, &record.narrative])
            .unwrap();
    }
    writer.flush().unwrap();
}

fn classifier() -> CrimeClassifier {
    CrimeClassifier::new(config(), LinguisticResources::english().shared()).unwrap()
}

#[test]
fn test_train_from_csv_and_predict() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("train.csv");
    let mut records = training_records();
    records.push(Record::new("Won a lottery prize by text message", "Lottery Fraud", "Lottery Scam"));
    write_csv(&path, &records);

    let dataset = DatasetLoader::new().load(&path).unwrap();
    assert_eq!(dataset.len(), 17);

    let mut classifier = classifier();
    classifier.train(dataset, None).unwrap();

    // The singleton class never reaches the label space.
    for level in TaxonomyLevel::ALL {
        let labels = classifier.model(level).unwrap().labels();
        assert!(labels.contains(UNKNOWN_LABEL));
        assert!(!labels.contains("Lottery Fraud"));
        assert!(!labels.contains("Lottery Scam"));
        assert_eq!(labels.len(), 3);
    }

    let prediction = classifier.predict("My Facebook account got hacked and the password changed");
    assert_eq!(prediction.category, "Hacking");
    assert_eq!(prediction.sub_category, "Social Media Account Hacking");

    let prediction = classifier.predict("Money debited from bank account through a UPI request");
    assert_eq!(prediction.category, "Online Financial Fraud");
    assert_eq!(prediction.sub_category, "UPI Related Frauds");
}

#[test]
fn test_unusable_text_predicts_unknown() {
    let mut classifier = classifier();
    classifier.train(Dataset::from_records(training_records()), None).unwrap();

    let prediction = classifier.predict("ok");
    assert_eq!(prediction.category, "Unknown");
    assert_eq!(prediction.category_confidence, 0.0);
    assert_eq!(prediction.sub_category, "Unknown");
    assert_eq!(prediction.sub_category_confidence, 0.0);
}

#[test]
fn test_confidence_gate_holds_for_every_prediction() {
    let mut classifier = classifier();
    classifier.train(Dataset::from_records(training_records()), None).unwrap();
    let threshold = classifier.config().prediction.confidence_threshold;

    let texts = [
        "Money debited through UPI and account hacked",
        "Lottery winner message asking for processing fee",
        "Profile hacked, password changed",
        "Fake UPI refund request debited money",
        "random words about weather and cricket scores",
    ];
    for prediction in classifier.predict_batch(&texts) {
        for level in TaxonomyLevel::ALL {
            let answer = prediction.level(level);
            if answer.confidence < threshold {
                assert_eq!(answer.label, UNKNOWN_LABEL);
            }
            if answer.label != UNKNOWN_LABEL {
                assert!(answer.confidence >= threshold);
            }
        }
    }
}

#[test]
fn test_nothing_survives_filtering() {
    let records = vec![
        Record::new("Lost money in lottery scam messages", "Lottery", "Lottery Scam"),
        Record::new("Someone hacked my account and password", "Hacking", "Email Hacking"),
        Record::new("Harassed with obscene messages online", "Harassment", "Cyber Stalking"),
    ];

    let result = classifier().train(Dataset::from_records(records), None);
    assert!(matches!(result, Err(ClassifierError::InsufficientData(_))));

    let balancer = ClassBalancer::new(2);
    let result = balancer.filter(Dataset::from_records(vec![Record::new("a b c", "X", "Y")]));
    assert!(matches!(result, Err(ClassifierError::InsufficientData(_))));
}

#[test]
fn test_too_few_usable_rows() {
    let records = vec![
        Record::new("ok", "Hacking", "Email Hacking"),
        Record::new("hi", "Hacking", "Email Hacking"),
        Record::new("Email account hacked and password changed", "Hacking", "Email Hacking"),
    ];

    let result = classifier().train(Dataset::from_records(records), None);
    assert!(matches!(result, Err(ClassifierError::InsufficientData(_))));
}

#[test]
fn test_label_round_trip() {
    let codec = LabelCodec::new(TaxonomyLevel::SubCategory);
    let space = codec.fit(["UPI Related Frauds", "Email Hacking", "UPI Related Frauds"]);

    for label in space.labels() {
        let code = space.encode(label).unwrap();
        assert_eq!(space.decode(code).unwrap(), label);
    }
    assert!(matches!(
        space.encode("Ransomware Attack"),
        Err(ClassifierError::UnknownLabel(_))
    ));
    assert!(matches!(space.decode(99), Err(ClassifierError::UnknownLabel(_))));
}

#[test]
fn test_save_and_reload_models() {
    let dir = TempDir::new().unwrap();
    let mut trained = classifier();
    trained
        .train(Dataset::from_records(training_records()), None)
        .unwrap();
    trained.save(dir.path()).unwrap();

    let loaded = CrimeClassifier::load(dir.path(), LinguisticResources::english().shared()).unwrap();
    for text in FRAUD.iter().chain(HACKING) {
        assert_eq!(loaded.predict(text), trained.predict(text));
    }

    // Without the sub-category bundle only that level degrades.
    fs::remove_file(model_path(dir.path(), TaxonomyLevel::SubCategory)).unwrap();
    let partial = CrimeClassifier::load(dir.path(), LinguisticResources::english().shared()).unwrap();
    let prediction = partial.predict(HACKING[0]);
    assert_eq!(prediction.category, "Hacking");
    assert_eq!(prediction.sub_category, UNKNOWN_LABEL);
    assert_eq!(prediction.sub_category_confidence, 0.0);
    assert!(matches!(
        partial.predict_level(TaxonomyLevel::SubCategory, HACKING[0]),
        Err(ClassifierError::ModelNotReady { .. })
    ));
}

#[test]
fn test_held_out_evaluation() {
    let held_out = Dataset::from_records(vec![
        Record::new(
            "UPI payment link debited money from my bank account",
            "Online Financial Fraud",
            "UPI Related Frauds",
        ),
        Record::new(
            "Instagram account hacked and password changed by someone",
            "Hacking",
            "Social Media Account Hacking",
        ),
    ]);

    let mut classifier = classifier();
    classifier
        .train(Dataset::from_records(training_records()), Some(held_out))
        .unwrap();

    let model = classifier.model(TaxonomyLevel::Category).unwrap();
    assert_eq!(model.metadata().n_train_samples, 16);
    assert_eq!(model.metadata().n_validation_samples, 2);
    let evaluation = model.evaluation().unwrap();
    assert_eq!(evaluation.report.classes.len(), 2);
    assert_eq!(evaluation.errors.total, 2);
}
