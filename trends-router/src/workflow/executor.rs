//! The orchestrator: runs one workflow per query

use anyhow::{anyhow, Result};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use trends_router_sdk::{
    log_agent_complete, log_agent_failed, log_agent_start, log_response_ready, log_routed,
    log_routing_failed, log_run_failed, log_run_start, log_stage,
};
use uuid::Uuid;

use super::response::{EngineResult, FinalResponse};
use super::state::{next_stage, Stage, WorkflowState};
use super::synthesize::ResponseSynthesizer;
use crate::engines::{
    EngineCapabilities, EngineError, EngineKind, SearchFilters, SemanticQueryEngine,
    StructuredQueryEngine,
};
use crate::router::{QueryClassifier, RoutingDecision, RoutingError};

/// Introspection snapshot returned by [`Orchestrator::system_info`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub orchestrator: String,
    pub classifier: String,
    pub narrative_synthesis: bool,
    pub engines: Vec<EngineCapabilities>,
    pub unavailable: Vec<EngineKind>,
}

/// Routes queries to the configured engines and synthesizes the answer
///
/// Cheap to share behind an `Arc`; every call to
/// [`process_query`](Self::process_query) builds its own [`WorkflowState`].
pub struct Orchestrator {
    classifier: QueryClassifier,
    structured: Option<Arc<dyn StructuredQueryEngine>>,
    semantic: Option<Arc<dyn SemanticQueryEngine>>,
    synthesizer: ResponseSynthesizer,
}

impl Orchestrator {
    pub fn new(classifier: QueryClassifier) -> Self {
        Self {
            classifier,
            structured: None,
            semantic: None,
            synthesizer: ResponseSynthesizer::new(),
        }
    }

    pub fn with_structured(mut self, engine: Arc<dyn StructuredQueryEngine>) -> Self {
        self.structured = Some(engine);
        self
    }

    pub fn with_semantic(mut self, engine: Arc<dyn SemanticQueryEngine>) -> Self {
        self.semantic = Some(engine);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: ResponseSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub async fn process_query(&self, query: &str) -> FinalResponse {
        self.process_query_with_filters(query, None).await
    }

    /// Answer a query, passing `filters` to the semantic engine
    ///
    /// Always returns a response. Empty queries are rejected before
    /// classification. Anything that escapes the workflow, panics included,
    /// becomes an `"An error occurred: ..."` response.
    pub async fn process_query_with_filters(
        &self,
        query: &str,
        filters: Option<SearchFilters>,
    ) -> FinalResponse {
        if query.trim().is_empty() {
            return FinalResponse::failure(
                query,
                "Please provide a question to answer.",
                "Invalid query: query cannot be empty",
            );
        }

        let started = Instant::now();
        let run_id = Uuid::new_v4();
        log_run_start!(run_id, query);

        let outcome = AssertUnwindSafe(self.run(run_id, query, filters))
            .catch_unwind()
            .await;

        let mut response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let message = format!("{:#}", e);
                log_run_failed!(run_id, message);
                FinalResponse::fatal(query, &message)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                log_run_failed!(run_id, message);
                FinalResponse::fatal(query, &message)
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        response.processing_time_ms = Some(elapsed_ms);
        log_response_ready!(
            run_id,
            response.success,
            response
                .metadata
                .agents_used
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            elapsed_ms
        );
        response
    }

    /// Classify and route without running any engine
    pub async fn get_routing_info(&self, query: &str) -> Result<RoutingDecision, RoutingError> {
        self.classifier.route(query).await
    }

    pub fn system_info(&self) -> SystemInfo {
        let mut engines = Vec::new();
        let mut unavailable = Vec::new();

        match &self.structured {
            Some(engine) => engines.push(engine.capabilities()),
            None => unavailable.push(EngineKind::Structured),
        }
        match &self.semantic {
            Some(engine) => engines.push(engine.capabilities()),
            None => unavailable.push(EngineKind::Semantic),
        }

        SystemInfo {
            orchestrator: "TrendsRouter".to_string(),
            classifier: self.classifier.strategy_name().to_string(),
            narrative_synthesis: self.synthesizer.has_narrator(),
            engines,
            unavailable,
        }
    }

    async fn run(
        &self,
        run_id: Uuid,
        query: &str,
        filters: Option<SearchFilters>,
    ) -> Result<FinalResponse> {
        let mut state = WorkflowState::new(run_id, query, filters);
        let mut stage = Stage::Route;

        loop {
            state.enter(stage)?;
            log_stage!(run_id, stage);

            match stage {
                Stage::Route => self.route(&mut state).await,
                Stage::StructuredAgent => {
                    let result = self.run_structured(&state).await;
                    state.set_result(result);
                }
                Stage::SemanticAgent => {
                    let result = self.run_semantic(&state).await;
                    state.set_result(result);
                }
                Stage::Synthesize => {
                    let response = self.synthesizer.synthesize(&state).await;
                    state.set_final(response)?;
                }
                Stage::End => {
                    // Reached straight from Route: nothing ran, apologize
                    if !state.has_final() {
                        let response = self.synthesizer.synthesize(&state).await;
                        state.set_final(response)?;
                    }
                    break;
                }
            }

            stage = next_stage(stage, &state);
        }

        state
            .into_final()
            .ok_or_else(|| anyhow!("workflow ended without a final answer"))
    }

    async fn route(&self, state: &mut WorkflowState) {
        match self.classifier.route(&state.query).await {
            Ok(decision) => {
                log_routed!(
                    state.run_id,
                    decision.query_type(),
                    decision.classification.confidence,
                    decision.agent_names(),
                    decision.execution_strategy.as_str()
                );
                state.routing = Some(decision);
            }
            Err(e) => {
                log_routing_failed!(state.run_id, e);
                state.error = Some(format!("Routing failed: {}", e));
            }
        }
    }

    async fn run_structured(&self, state: &WorkflowState) -> EngineResult {
        let kind = EngineKind::Structured;
        let Some(engine) = &self.structured else {
            return unavailable(state, kind);
        };

        log_agent_start!(state.run_id, kind.label(), "Answering structured query");
        let call = AssertUnwindSafe(engine.process_query(&state.query))
            .catch_unwind()
            .await;
        let result = match call {
            Ok(Ok(answer)) => EngineResult::structured(answer),
            Ok(Err(e)) => EngineResult::failed(kind, e.to_string()),
            Err(panic) => EngineResult::failed(kind, panicked(panic.as_ref())),
        };
        log_engine_outcome(state, &result);
        result
    }

    async fn run_semantic(&self, state: &WorkflowState) -> EngineResult {
        let kind = EngineKind::Semantic;
        let Some(engine) = &self.semantic else {
            return unavailable(state, kind);
        };

        log_agent_start!(state.run_id, kind.label(), "Running semantic search");
        let call = AssertUnwindSafe(engine.process_query(&state.query, state.filters.as_ref()))
            .catch_unwind()
            .await;
        let result = match call {
            Ok(Ok(answer)) => EngineResult::semantic(answer),
            Ok(Err(e)) => EngineResult::failed(kind, e.to_string()),
            Err(panic) => EngineResult::failed(kind, panicked(panic.as_ref())),
        };
        log_engine_outcome(state, &result);
        result
    }
}

fn unavailable(state: &WorkflowState, kind: EngineKind) -> EngineResult {
    let error = EngineError::Unavailable(kind.label().to_string()).to_string();
    log_agent_failed!(state.run_id, kind.label(), error);
    EngineResult::failed(kind, error)
}

fn log_engine_outcome(state: &WorkflowState, result: &EngineResult) {
    let agent = result.engine.label();
    match &result.error {
        None => {
            log_agent_complete!(state.run_id, agent, result.display_text());
        }
        Some(error) => {
            log_agent_failed!(state.run_id, agent, error);
        }
    }
}

fn panicked(payload: &(dyn Any + Send)) -> String {
    format!("engine panicked: {}", panic_message(payload))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
