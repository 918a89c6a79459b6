//! Settings files and environment overrides

use std::io::Write;
use trends_router::config::{ClassifierMode, Settings};

#[test]
fn test_settings_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "classifier:\n  mode: keyword\nstructured:\n  enabled: false\nsemantic:\n  collection: trends_eu\n  top_k: 12"
    )
    .unwrap();

    let settings = Settings::from_file(file.path()).unwrap();

    assert_eq!(settings.classifier.mode, ClassifierMode::Keyword);
    assert!(!settings.structured.enabled);
    assert_eq!(settings.semantic.collection, "trends_eu");
    assert_eq!(settings.semantic.top_k, 12);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::from_file(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_settings_invalid_yaml_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "semantic: [not, a, mapping").unwrap();
    assert!(Settings::from_file(file.path()).is_err());
}

#[test]
fn test_env_overrides_file_values() {
    let mut settings = Settings::from_yaml("semantic:\n  qdrant_url: http://file:6333\n").unwrap();
    settings
        .apply_env(|key| match key {
            "QDRANT_URL" => Some("http://env:6333".to_string()),
            "TRENDS_TABLE" => Some("trending".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(settings.semantic.qdrant_url, "http://env:6333");
    assert_eq!(settings.structured.table_name, "trending");
}
