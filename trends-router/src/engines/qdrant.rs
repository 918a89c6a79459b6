//! Semantic engine backed by a Qdrant collection
//!
//! Queries are embedded through an OpenAI-compatible `/embeddings` endpoint
//! and searched with Qdrant's REST API. Payload filters map to `must`
//! conditions. With a model attached, the answer is written from the top
//! hits; otherwise it is the plain hit summary.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use trends_router_sdk::async_trait;

use super::{
    group_thousands, summarize_hits, EngineCapabilities, EngineError, EngineKind, SearchFilters,
    SemanticAnswer, SemanticQueryEngine, VideoHit, NO_RESULTS_MESSAGE,
};
use crate::config::SemanticSettings;
use crate::llm::{LanguageModel, ModelRequest};

const CURATOR_SYSTEM_PROMPT: &str = "You are a YouTube content curator. \
You recommend videos from search results in a friendly, concise way.";

/// Hits shown to the model when it writes the answer
const ANSWER_HITS: usize = 5;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f64,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

pub struct QdrantEngine {
    client: reqwest::Client,
    qdrant_url: String,
    collection: String,
    top_k: usize,
    embedding_endpoint: String,
    embedding_model: String,
    api_key: Option<String>,
    model: Option<Arc<dyn LanguageModel>>,
}

impl QdrantEngine {
    pub fn new(settings: &SemanticSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            qdrant_url: settings.qdrant_url.trim_end_matches('/').to_string(),
            collection: settings.collection.clone(),
            top_k: settings.top_k,
            embedding_endpoint: settings.embedding_endpoint.trim_end_matches('/').to_string(),
            embedding_model: settings.embedding_model.clone(),
            api_key: settings.api_key(),
            model: None,
        })
    }

    /// Let `model` write answers from the retrieved hits
    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    async fn answer_for(&self, query: &str, hits: &[VideoHit]) -> String {
        if hits.is_empty() {
            return NO_RESULTS_MESSAGE.to_string();
        }
        let Some(model) = &self.model else {
            return summarize_hits(hits);
        };

        let listing = hits
            .iter()
            .take(ANSWER_HITS)
            .map(|hit| {
                format!(
                    "{}. {} by {} [{}] ({} views, {} likes, relevance {:.2})",
                    hit.rank,
                    hit.title,
                    hit.channel,
                    hit.category,
                    group_thousands(hit.views),
                    group_thousands(hit.likes),
                    hit.score
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "User Query: {}\n\nRelevant Videos Found:\n{}\n\n\
             Answer the query using these videos. \
             Mention the most relevant ones and why they match.",
            query, listing
        );
        let request = ModelRequest::new(
            "semantic",
            "Video Curator",
            "Writing semantic answer",
            CURATOR_SYSTEM_PROMPT,
            prompt,
        );

        match model.complete(request).await {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            _ => summarize_hits(hits),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let url = format!("{}/embeddings", self.embedding_endpoint);
        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.embedding_model,
            input: vec![text],
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Backend(format!(
                "Embedding API error {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EngineError::Backend("Empty response from embedding API".to_string()))
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<VideoHit>, EngineError> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.qdrant_url, self.collection
        );

        let mut body = json!({
            "vector": vector,
            "limit": self.top_k,
            "with_payload": true,
        });
        if let Some(filter) = filters.and_then(build_filter) {
            body["filter"] = filter;
        }

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Backend(format!("Qdrant error {}: {}", status, text)));
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed
            .result
            .into_iter()
            .enumerate()
            .map(|(i, point)| {
                hit_from_payload(i + 1, point.score, point.payload.unwrap_or_default())
            })
            .collect())
    }
}

#[async_trait]
impl SemanticQueryEngine for QdrantEngine {
    async fn process_query(
        &self,
        query: &str,
        filters: Option<&SearchFilters>,
    ) -> Result<SemanticAnswer, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidQuery("Query cannot be empty".to_string()));
        }

        let vector = self.embed(query).await?;
        let results = self.search(vector, filters).await?;

        let answer = self.answer_for(query, &results).await;
        Ok(SemanticAnswer { answer, results })
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            name: "QdrantEngine".to_string(),
            kind: EngineKind::Semantic,
            description: format!(
                "Semantic search over the '{}' collection (top {})",
                self.collection, self.top_k
            ),
            capabilities: vec![
                "Semantic similarity search".to_string(),
                "Content-based recommendations".to_string(),
                "Topic discovery".to_string(),
                "Metadata filters (category, channel, country)".to_string(),
            ],
        }
    }
}

/// Translate payload filters into a Qdrant `must` filter
///
/// Scalars become `match.value`, arrays `match.any`, and objects (e.g.
/// `{"gte": 1000}`) a `range` condition.
pub fn build_filter(filters: &SearchFilters) -> Option<Value> {
    if filters.is_empty() {
        return None;
    }

    let must: Vec<Value> = filters
        .iter()
        .map(|(key, value)| match value {
            Value::Array(values) => json!({ "key": key, "match": { "any": values } }),
            Value::Object(range) => json!({ "key": key, "range": range }),
            other => json!({ "key": key, "match": { "value": other } }),
        })
        .collect();

    Some(json!({ "must": must }))
}

/// Build a ranked hit from a point payload, tolerating the column names
/// used by the relational export (`channel_title`, `category_name`)
pub fn hit_from_payload(rank: usize, score: f64, payload: Map<String, Value>) -> VideoHit {
    let text = |keys: &[&str], default: &str| {
        keys.iter()
            .find_map(|k| payload.get(*k).and_then(Value::as_str))
            .unwrap_or(default)
            .to_string()
    };
    let count = |key: &str| {
        payload
            .get(key)
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
            .unwrap_or(0)
    };

    let tags = match payload.get("tags") {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(joined)) => joined.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    };

    VideoHit {
        rank,
        score: (score * 10_000.0).round() / 10_000.0,
        video_id: text(&["video_id"], "unknown"),
        title: text(&["title"], "No title"),
        channel: text(&["channel", "channel_title"], "Unknown channel"),
        category: text(&["category", "category_name"], "Unknown"),
        views: count("views"),
        likes: count("likes"),
        tags: tags.into_iter().take(5).collect(),
    }
}
