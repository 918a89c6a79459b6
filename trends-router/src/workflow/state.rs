//! Workflow stages, transitions and per-run state

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::response::{EngineResult, FinalResponse};
use crate::engines::{EngineKind, SearchFilters};
use crate::router::RoutingDecision;

/// Longest legal path: Route, StructuredAgent, SemanticAgent, Synthesize, End
pub const MAX_STAGES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Route,
    StructuredAgent,
    SemanticAgent,
    Synthesize,
    End,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Route => "route",
            Stage::StructuredAgent => "structured_agent",
            Stage::SemanticAgent => "semantic_agent",
            Stage::Synthesize => "synthesize",
            Stage::End => "end",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Corruption of a run's state. Always fatal for that run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("final answer already set")]
    FinalAnswerAlreadySet,

    #[error("workflow exceeded {0} stages")]
    StepLimitExceeded(usize),
}

/// Everything one query execution accumulates
///
/// Owned by a single run and never shared.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub run_id: Uuid,
    pub query: String,
    pub filters: Option<SearchFilters>,
    pub routing: Option<RoutingDecision>,
    pub structured_result: Option<EngineResult>,
    pub semantic_result: Option<EngineResult>,
    pub error: Option<String>,
    final_response: Option<FinalResponse>,
    visited: Vec<Stage>,
}

impl WorkflowState {
    pub fn new(run_id: Uuid, query: impl Into<String>, filters: Option<SearchFilters>) -> Self {
        Self {
            run_id,
            query: query.into(),
            filters,
            routing: None,
            structured_result: None,
            semantic_result: None,
            error: None,
            final_response: None,
            visited: Vec::new(),
        }
    }

    /// Record entry into `stage`
    pub fn enter(&mut self, stage: Stage) -> Result<(), StateError> {
        if self.visited.len() >= MAX_STAGES {
            return Err(StateError::StepLimitExceeded(MAX_STAGES));
        }
        self.visited.push(stage);
        Ok(())
    }

    pub fn visited(&self) -> &[Stage] {
        &self.visited
    }

    pub fn routes_to(&self, engine: EngineKind) -> bool {
        self.routing
            .as_ref()
            .map(|d| d.uses(engine))
            .unwrap_or(false)
    }

    pub fn set_result(&mut self, result: EngineResult) {
        match result.engine {
            EngineKind::Structured => self.structured_result = Some(result),
            EngineKind::Semantic => self.semantic_result = Some(result),
        }
    }

    /// Store the final response; a second call is an error
    pub fn set_final(&mut self, response: FinalResponse) -> Result<(), StateError> {
        if self.final_response.is_some() {
            return Err(StateError::FinalAnswerAlreadySet);
        }
        self.final_response = Some(response);
        Ok(())
    }

    pub fn has_final(&self) -> bool {
        self.final_response.is_some()
    }

    pub fn into_final(self) -> Option<FinalResponse> {
        self.final_response
    }
}

/// Transition table of the workflow
pub fn next_stage(stage: Stage, state: &WorkflowState) -> Stage {
    match stage {
        Stage::Route => match &state.routing {
            Some(decision) if decision.uses(EngineKind::Structured) => Stage::StructuredAgent,
            Some(decision) if decision.uses(EngineKind::Semantic) => Stage::SemanticAgent,
            _ => Stage::End,
        },
        Stage::StructuredAgent => {
            if state.routes_to(EngineKind::Semantic) && state.semantic_result.is_none() {
                Stage::SemanticAgent
            } else {
                Stage::Synthesize
            }
        }
        Stage::SemanticAgent => Stage::Synthesize,
        Stage::Synthesize | Stage::End => Stage::End,
    }
}
