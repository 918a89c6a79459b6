//! Query classification and routing
//!
//! A [`QueryClassifier`] turns a raw question into a [`Classification`];
//! [`routing_for`] maps that classification onto the engines to run. The
//! mapping is a pure function of the classification type:
//!
//! | type | engines | strategy |
//! |---|---|---|
//! | structured | structured | single_agent |
//! | semantic | semantic | single_agent |
//! | hybrid | structured, semantic | multi_agent_sequential |
//! | unknown | none | fallback |

pub mod keyword;
pub mod model;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use trends_router_sdk::async_trait;

use crate::engines::EngineKind;

pub use keyword::KeywordClassifier;
pub use model::ModelClassifier;

/// Category a query falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Structured,
    Semantic,
    Hybrid,
    Unknown,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Structured => "structured",
            QueryType::Semantic => "semantic",
            QueryType::Hybrid => "hybrid",
            QueryType::Unknown => "unknown",
        }
    }

    /// Parse a type name, accepting the SQL/vector aliases models like to use
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "structured" | "sql" => Some(QueryType::Structured),
            "semantic" | "vector" => Some(QueryType::Semantic),
            "hybrid" | "both" => Some(QueryType::Hybrid),
            "unknown" => Some(QueryType::Unknown),
            _ => None,
        }
    }

    /// Engines to invoke, in execution order
    pub fn engines(&self) -> Vec<EngineKind> {
        match self {
            QueryType::Structured => vec![EngineKind::Structured],
            QueryType::Semantic => vec![EngineKind::Semantic],
            QueryType::Hybrid => vec![EngineKind::Structured, EngineKind::Semantic],
            QueryType::Unknown => Vec::new(),
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        match self {
            QueryType::Structured | QueryType::Semantic => ExecutionStrategy::SingleAgent,
            QueryType::Hybrid => ExecutionStrategy::MultiAgentSequential,
            QueryType::Unknown => ExecutionStrategy::Fallback,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the routed engines are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    SingleAgent,
    /// Both engines, structured first; could run in parallel but does not
    MultiAgentSequential,
    /// No engine applies
    Fallback,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::SingleAgent => "single_agent",
            ExecutionStrategy::MultiAgentSequential => "multi_agent_sequential",
            ExecutionStrategy::Fallback => "fallback",
        }
    }
}

/// Judgment about which engine(s) should answer a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub confidence: f64,
    pub reasoning: String,
    pub suggested_agent: String,
}

impl Classification {
    /// The degraded result used whenever classification cannot be trusted
    pub fn failed(cause: impl fmt::Display) -> Self {
        Self {
            query_type: QueryType::Unknown,
            confidence: 0.0,
            reasoning: format!("Classification failed: {}", cause),
            suggested_agent: "none".to_string(),
        }
    }

    /// Check the shape every classifier must produce
    pub fn validate(&self) -> Result<(), String> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} is outside [0, 1]", self.confidence));
        }
        if self.reasoning.trim().is_empty() {
            return Err("reasoning is empty".to_string());
        }
        if self.suggested_agent.trim().is_empty() {
            return Err("suggested_agent is empty".to_string());
        }
        Ok(())
    }
}

/// Engines to run for one query, derived from its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub query: String,
    pub classification: Classification,
    pub agents: Vec<EngineKind>,
    pub execution_strategy: ExecutionStrategy,
}

impl RoutingDecision {
    pub fn query_type(&self) -> QueryType {
        self.classification.query_type
    }

    pub fn uses(&self, engine: EngineKind) -> bool {
        self.agents.contains(&engine)
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.as_str().to_string()).collect()
    }
}

/// Map a classification onto engines and a strategy
pub fn routing_for(query: &str, classification: Classification) -> RoutingDecision {
    let query_type = classification.query_type;
    RoutingDecision {
        query: query.to_string(),
        classification,
        agents: query_type.engines(),
        execution_strategy: query_type.strategy(),
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("malformed classification: {0}")]
    MalformedClassification(String),

    #[error("classifier error: {0}")]
    Classifier(String),
}

/// Pluggable classification capability
///
/// Implementations may fail; [`QueryClassifier::route`] turns failures and
/// malformed output into a [`RoutingError`].
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(&self, query: &str) -> anyhow::Result<Classification>;

    fn name(&self) -> &str;
}

/// Classifier strategies sharing one contract
#[derive(Clone)]
pub enum QueryClassifier {
    /// Language-model judgment; failures degrade to `unknown`
    Model(ModelClassifier),
    /// Rule-based keyword scoring with capped confidence
    Keyword(KeywordClassifier),
    /// Externally supplied classifier
    Custom(Arc<dyn Classify>),
}

impl QueryClassifier {
    pub fn strategy_name(&self) -> &str {
        match self {
            QueryClassifier::Model(_) => "model",
            QueryClassifier::Keyword(_) => "keyword",
            QueryClassifier::Custom(inner) => inner.name(),
        }
    }

    /// Classify a query
    ///
    /// Model and keyword strategies never fail. A custom classifier's error
    /// is returned as-is.
    pub async fn classify(&self, query: &str) -> anyhow::Result<Classification> {
        match self {
            QueryClassifier::Model(model) => Ok(model.classify(query).await),
            QueryClassifier::Keyword(keyword) => Ok(keyword.classify(query)),
            QueryClassifier::Custom(inner) => inner.classify(query).await,
        }
    }

    /// Classify and derive the routing decision
    pub async fn route(&self, query: &str) -> Result<RoutingDecision, RoutingError> {
        let classification = self
            .classify(query)
            .await
            .map_err(|e| RoutingError::Classifier(format!("{:#}", e)))?;
        classification
            .validate()
            .map_err(RoutingError::MalformedClassification)?;
        Ok(routing_for(query, classification))
    }
}

impl fmt::Debug for QueryClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryClassifier({})", self.strategy_name())
    }
}
