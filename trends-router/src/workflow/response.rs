//! Per-engine results and the final response returned to callers

use serde::{Deserialize, Serialize};

use crate::engines::{EngineKind, SemanticAnswer, StructuredAnswer, VideoHit, NO_RESULTS_MESSAGE};
use crate::router::{QueryType, RoutingDecision};

/// Outcome of one engine invocation within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResult {
    pub engine: EngineKind,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<VideoHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EngineResult {
    pub fn structured(answer: StructuredAnswer) -> Self {
        Self {
            engine: EngineKind::Structured,
            success: true,
            answer: Some(answer.answer),
            results: None,
            sql: answer.sql,
            error: None,
        }
    }

    /// Successful semantic result; an empty hit list gets the fixed
    /// no-results answer whatever the engine wrote
    pub fn semantic(answer: SemanticAnswer) -> Self {
        let text = if answer.results.is_empty() {
            NO_RESULTS_MESSAGE.to_string()
        } else {
            answer.answer
        };
        Self {
            engine: EngineKind::Semantic,
            success: true,
            answer: Some(text),
            results: Some(answer.results),
            sql: None,
            error: None,
        }
    }

    pub fn failed(engine: EngineKind, error: impl Into<String>) -> Self {
        Self {
            engine,
            success: false,
            answer: None,
            results: None,
            sql: None,
            error: Some(error.into()),
        }
    }

    /// The answer on success, `"Error: <error>"` otherwise
    pub fn display_text(&self) -> String {
        if self.success {
            self.answer.clone().unwrap_or_default()
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub agents_used: Vec<EngineKind>,
    pub query_type: QueryType,
    pub confidence: f64,
}

impl ResponseMetadata {
    pub fn from_routing(routing: Option<&RoutingDecision>) -> Self {
        match routing {
            Some(decision) => Self {
                agents_used: decision.agents.clone(),
                query_type: decision.query_type(),
                confidence: decision.classification.confidence,
            },
            None => Self::unrouted(),
        }
    }

    pub fn unrouted() -> Self {
        Self {
            agents_used: Vec::new(),
            query_type: QueryType::Unknown,
            confidence: 0.0,
        }
    }
}

/// What a caller gets back for every query, success or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    pub query: String,
    pub answer: String,
    pub success: bool,
    pub metadata: ResponseMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_result: Option<EngineResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_result: Option<EngineResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl FinalResponse {
    /// Response for runs that never reached synthesis (rejected or fatal)
    pub fn failure(query: &str, answer: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            answer: answer.into(),
            success: false,
            metadata: ResponseMetadata::unrouted(),
            structured_result: None,
            semantic_result: None,
            error: Some(error.into()),
            routing: None,
            processing_time_ms: None,
        }
    }

    /// Response for an error that escaped the workflow
    pub fn fatal(query: &str, message: &str) -> Self {
        Self::failure(query, format!("An error occurred: {}", message), message)
    }
}
