//! Engine capabilities consumed by the routing workflow
//!
//! The workflow only knows the two traits defined here. Concrete backends
//! live in [`sqlite`] (structured) and [`qdrant`] (semantic).

pub mod qdrant;
pub mod sqlite;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use trends_router_sdk::async_trait;

pub use qdrant::QdrantEngine;
pub use sqlite::SqliteEngine;

/// Answer used whenever a semantic search comes back with no hits
pub const NO_RESULTS_MESSAGE: &str = "No relevant videos found for your query.";

/// Metadata filters for semantic search (payload field -> exact value)
pub type SearchFilters = BTreeMap<String, serde_json::Value>;

/// The two backing engines a query can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Structured,
    Semantic,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Structured => "structured",
            EngineKind::Semantic => "semantic",
        }
    }

    /// Human label used in log events and error strings
    pub fn label(&self) -> &'static str {
        match self {
            EngineKind::Structured => "Structured engine",
            EngineKind::Semantic => "Semantic engine",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors an engine can report instead of an answer
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0} not available")]
    Unavailable(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("{0}")]
    Backend(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Model error: {0}")]
    Model(String),
}

impl EngineError {
    pub fn model(err: anyhow::Error) -> Self {
        EngineError::Model(format!("{:#}", err))
    }
}

/// One ranked item from the semantic engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoHit {
    pub rank: usize,
    pub score: f64,
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub category: String,
    pub views: u64,
    pub likes: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Successful structured engine output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    pub answer: String,
    /// SQL actually executed, when the backend exposes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl StructuredAnswer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sql: None,
        }
    }
}

/// Successful semantic engine output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticAnswer {
    pub answer: String,
    pub results: Vec<VideoHit>,
}

/// Self-description of an engine, surfaced by system info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineCapabilities {
    pub name: String,
    pub kind: EngineKind,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// Answers aggregation, filtering and ranking questions over tabular data
#[async_trait]
pub trait StructuredQueryEngine: Send + Sync {
    async fn process_query(&self, query: &str) -> Result<StructuredAnswer, EngineError>;

    fn capabilities(&self) -> EngineCapabilities;
}

/// Answers similarity and content questions over embedded records
#[async_trait]
pub trait SemanticQueryEngine: Send + Sync {
    async fn process_query(
        &self,
        query: &str,
        filters: Option<&SearchFilters>,
    ) -> Result<SemanticAnswer, EngineError>;

    fn capabilities(&self) -> EngineCapabilities;
}

/// Plain-text summary of ranked hits, used when no model writes one
pub fn summarize_hits(hits: &[VideoHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let mut lines = vec![format!("Found {} relevant videos:", hits.len())];
    for hit in hits.iter().take(5) {
        lines.push(format!(
            "{}. {} by {} ({} views)",
            hit.rank,
            hit.title,
            hit.channel,
            group_thousands(hit.views)
        ));
    }
    lines.join("\n")
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
