//! Integration tests for narrative normalization.

use std::fs;

use cybercrime_classifier::analysis::{LinguisticResources, TextNormalizer};
use cybercrime_classifier::prelude::*;
use tempfile::TempDir;

fn normalizer() -> TextNormalizer {
    TextNormalizer::new(LinguisticResources::english().shared()).unwrap()
}

#[test]
fn test_phishing_report_with_contact_details() {
    let raw = "Please help, I lost $500 to a phishing email from fake-bank@scam.com, call me at 555-123-4567";
    let normalized = normalizer().normalize(raw).unwrap();
    let tokens: Vec<&str> = normalized.split(' ').collect();

    for word in ["lost", "phishing", "email", "phishing_email", "lost_phishing_email"] {
        assert!(tokens.contains(&word), "missing {word} in {normalized}");
    }
    for word in ["please", "help", "com", "555", "4567", "500"] {
        assert!(!tokens.contains(&word), "unexpected {word} in {normalized}");
    }
    assert!(!normalized.contains('@'));
}

#[test]
fn test_short_text_is_unusable() {
    let normalizer = normalizer();
    assert_eq!(normalizer.normalize("ok"), None);
    assert_eq!(normalizer.normalize("   "), None);
    assert_eq!(normalizer.normalize("thanks sir!!!"), None);
}

#[test]
fn test_normalization_is_deterministic() {
    let normalizer = normalizer();
    let raw = "Someone hacked my Facebook account and posted obscene pictures of me";
    let first = normalizer.normalize(raw);
    for _ in 0..5 {
        assert_eq!(normalizer.normalize(raw), first);
    }
    assert_eq!(normalizer.clone().normalize(raw), first);
}

#[test]
fn test_non_string_input() {
    let normalizer = normalizer();
    // Digits are stripped, so a bare number is unusable.
    assert_eq!(normalizer.normalize_display(&9876543210u64), None);
    assert_eq!(normalizer.normalize_display(&3.5f64), None);
}

#[test]
fn test_plural_nouns_are_lemmatized() {
    let normalized = normalizer()
        .normalize("Fraudsters sent messages about lottery prizes")
        .unwrap();
    let tokens: Vec<&str> = normalized.split(' ').collect();
    assert!(tokens.contains(&"fraudster"));
    assert!(tokens.contains(&"message"));
    assert!(tokens.contains(&"prize"));
}

#[test]
fn test_custom_resources_from_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("stopwords.txt"), "the\nmy\nwas\n").unwrap();
    fs::write(dir.path().join("lemma_exceptions.tsv"), "# word\tlemma\noctopi\toctopus\n").unwrap();

    let resources = LinguisticResources::load(dir.path()).unwrap().shared();
    let normalizer = TextNormalizer::new(resources).unwrap();

    let normalized = normalizer.normalize("octopi ate my wires").unwrap();
    let tokens: Vec<&str> = normalized.split(' ').collect();
    assert!(tokens.contains(&"octopus"));
    assert!(tokens.contains(&"wire"));
    assert!(!tokens.contains(&"my"));
}

#[test]
fn test_min_token_count_is_configurable() {
    let strict = normalizer().with_min_token_count(10).unwrap();
    assert_eq!(strict.normalize("card cloned"), None);
    assert!(normalizer().with_min_token_count(0).is_err());

    let error = normalizer().with_min_token_count(0).unwrap_err();
    assert!(matches!(error, ClassifierError::InvalidConfig(_)));
}
