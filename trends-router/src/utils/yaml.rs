//! YAML utilities for extraction and parsing of model replies

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use super::text::extract_fenced;

/// Extract YAML content from markdown code blocks or raw text
///
/// Handles:
/// - ```yaml blocks
/// - Generic ``` blocks
/// - Raw YAML text
/// - Removes leading document separator (---)
pub fn extract_yaml(text: &str) -> String {
    let yaml = extract_fenced(text, "yaml").unwrap_or_else(|| text.trim().to_string());
    clean_yaml(&yaml)
}

/// Clean YAML by removing document separators and normalizing whitespace
pub fn clean_yaml(yaml: &str) -> String {
    yaml.trim_start_matches("---").trim().to_string()
}

/// Parse YAML string into a typed structure
///
/// The error carries a short preview of the offending content, which is
/// what ends up in "Classification failed: ..." reasoning strings.
pub fn parse_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T> {
    serde_yaml::from_str(yaml).with_context(|| {
        let preview: String = yaml.chars().take(120).collect();
        format!("Failed to parse YAML (preview: {:?})", preview)
    })
}
