//! Router configuration
//!
//! [`Settings`] is built once at startup and handed to constructors; nothing
//! reads configuration lazily afterwards.
//!
//! Resolution order:
//! 1. Built-in defaults
//! 2. YAML file (`--config`, or `trends-router.yaml` in the working directory)
//! 3. Environment variables (after loading `.env` with dotenv)
//!
//! # Example
//!
//! ```yaml
//! classifier:
//!   mode: keyword
//! structured:
//!   db_path: ./data/youtube_trends.db
//!   table_name: videos
//! semantic:
//!   qdrant_url: http://localhost:6333
//!   collection: youtube_trends
//!   top_k: 5
//! synthesis:
//!   narrative: false
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "trends-router.yaml";

/// Which classifier strategy the router uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    /// Language-model classification
    Model,
    /// Rule-based keyword scoring
    Keyword,
}

impl std::str::FromStr for ClassifierMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "model" | "llm" => Ok(ClassifierMode::Model),
            "keyword" | "rules" | "simple" => Ok(ClassifierMode::Keyword),
            other => anyhow::bail!(
                "Unknown classifier mode '{}' (expected model or keyword)",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub mode: ClassifierMode,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::Model,
        }
    }
}

/// SQLite-backed structured engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredSettings {
    pub enabled: bool,
    pub db_path: PathBuf,
    pub table_name: String,
    /// Rows rendered into an answer before truncating
    pub max_rows: usize,
}

impl Default for StructuredSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: PathBuf::from("./data/youtube_trends.db"),
            table_name: "videos".to_string(),
            max_rows: 50,
        }
    }
}

/// Qdrant-backed semantic engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticSettings {
    pub enabled: bool,
    pub qdrant_url: String,
    pub collection: String,
    pub top_k: usize,
    /// OpenAI-compatible base URL serving `/embeddings`
    pub embedding_endpoint: String,
    pub embedding_model: String,
    /// Name of the environment variable holding the embedding API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for SemanticSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            qdrant_url: "http://localhost:6333".to_string(),
            collection: "youtube_trends".to_string(),
            top_k: 5,
            embedding_endpoint: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SemanticSettings {
    /// Look up the embedding API key in the environment
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    /// Ask the model to merge hybrid answers into one narrative
    pub narrative: bool,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self { narrative: true }
    }
}

/// Complete router configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub classifier: ClassifierSettings,
    pub structured: StructuredSettings,
    pub semantic: SemanticSettings,
    pub synthesis: SynthesisSettings,
}

impl Settings {
    /// Load settings from file and environment
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read a YAML settings file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("TRENDS_CLASSIFIER") {
            self.classifier.mode = mode.parse()?;
        }
        if let Some(db_path) = lookup("TRENDS_DB_PATH") {
            self.structured.db_path = PathBuf::from(db_path);
        }
        if let Some(table) = lookup("TRENDS_TABLE") {
            self.structured.table_name = table;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.semantic.qdrant_url = url;
        }
        if let Some(collection) = lookup("QDRANT_COLLECTION") {
            self.semantic.collection = collection;
        }
        if let Some(top_k) = lookup("TRENDS_TOP_K") {
            self.semantic.top_k = top_k
                .trim()
                .parse()
                .with_context(|| format!("TRENDS_TOP_K must be a number, got '{}'", top_k))?;
        }
        if let Some(endpoint) = lookup("OPENAI_BASE_URL") {
            self.semantic.embedding_endpoint = endpoint;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.semantic.embedding_model = model;
        }
        Ok(())
    }

    /// Reject configurations the router cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.structured.enabled && !self.semantic.enabled {
            anyhow::bail!("At least one engine (structured or semantic) must be enabled");
        }
        if !(1..=100).contains(&self.semantic.top_k) {
            anyhow::bail!("semantic.top_k must be between 1 and 100, got {}", self.semantic.top_k);
        }
        if self.structured.max_rows == 0 {
            anyhow::bail!("structured.max_rows must be at least 1");
        }
        if self.structured.table_name.trim().is_empty()
            || !self
                .structured
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            anyhow::bail!(
                "structured.table_name must be a plain identifier, got '{}'",
                self.structured.table_name
            );
        }
        Ok(())
    }
}
