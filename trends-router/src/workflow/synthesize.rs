//! Merge engine results into a [`FinalResponse`]

use anyhow::{bail, Result};
use std::sync::Arc;
use trends_router_sdk::log_synthesis_fallback;

use super::response::{EngineResult, FinalResponse, ResponseMetadata};
use super::state::WorkflowState;
use crate::llm::{LanguageModel, ModelRequest};

/// Answer when no engine produced a result
pub const APOLOGY_MESSAGE: &str = "I couldn't process your query. Please try rephrasing.";

const NARRATOR_SYSTEM_PROMPT: &str =
    "You are a YouTube trends analyst. You merge analysis results into one clear answer.";

#[derive(Clone, Default)]
pub struct ResponseSynthesizer {
    narrator: Option<Arc<dyn LanguageModel>>,
}

impl ResponseSynthesizer {
    /// Synthesizer that always concatenates hybrid results
    pub fn new() -> Self {
        Self { narrator: None }
    }

    /// Synthesizer that asks `model` to merge two successful results
    pub fn with_narrator(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            narrator: Some(model),
        }
    }

    pub fn has_narrator(&self) -> bool {
        self.narrator.is_some()
    }

    pub async fn synthesize(&self, state: &WorkflowState) -> FinalResponse {
        let structured = state.structured_result.as_ref();
        let semantic = state.semantic_result.as_ref();

        let (answer, success) = match (structured, semantic) {
            (Some(only), None) | (None, Some(only)) => (only.display_text(), only.success),
            (Some(s), Some(v)) => (self.merge(state, s, v).await, s.success || v.success),
            (None, None) => (APOLOGY_MESSAGE.to_string(), false),
        };

        let error = state.error.clone().or_else(|| {
            if success {
                None
            } else {
                engine_errors(structured, semantic)
            }
        });

        FinalResponse {
            query: state.query.clone(),
            answer,
            success,
            metadata: ResponseMetadata::from_routing(state.routing.as_ref()),
            structured_result: state.structured_result.clone(),
            semantic_result: state.semantic_result.clone(),
            error,
            routing: state.routing.clone(),
            processing_time_ms: None,
        }
    }

    async fn merge(
        &self,
        state: &WorkflowState,
        structured: &EngineResult,
        semantic: &EngineResult,
    ) -> String {
        let structured_text = structured.display_text();
        let semantic_text = semantic.display_text();
        let fallback = concatenate(&structured_text, &semantic_text);

        let narrator = match &self.narrator {
            Some(model) if structured.success && semantic.success => model,
            _ => return fallback,
        };

        match narrate(&**narrator, state, &structured_text, &semantic_text).await {
            Ok(narrative) => narrative,
            Err(e) => {
                log_synthesis_fallback!(state.run_id, format!("{:#}", e));
                fallback
            }
        }
    }
}

/// Deterministic hybrid answer used when no narrative is available
pub fn concatenate(structured: &str, semantic: &str) -> String {
    format!(
        "Structured Analysis: {}\n\nSemantic Search: {}",
        structured, semantic
    )
}

async fn narrate(
    model: &dyn LanguageModel,
    state: &WorkflowState,
    structured: &str,
    semantic: &str,
) -> Result<String> {
    let prompt = format!(
        r#"Synthesize the following results into a coherent, helpful response.

User Query: {query}

Structured Data Analysis:
{structured}

Semantic Search Results:
{semantic}

Provide a unified response that:
1. Combines insights from both sources
2. Answers the user's question comprehensively
3. Highlights key findings
4. Keeps it concise and natural"#,
        query = state.query,
        structured = structured,
        semantic = semantic
    );

    let request = ModelRequest::new(
        state.run_id.to_string(),
        "Narrator",
        "Merge hybrid results",
        NARRATOR_SYSTEM_PROMPT,
        prompt,
    );
    let narrative = model.complete(request).await?;
    if narrative.trim().is_empty() {
        bail!("narrator returned an empty answer");
    }
    Ok(narrative.trim().to_string())
}

fn engine_errors(
    structured: Option<&EngineResult>,
    semantic: Option<&EngineResult>,
) -> Option<String> {
    let errors: Vec<String> = [structured, semantic]
        .into_iter()
        .flatten()
        .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {}", r.engine.label(), e)))
        .collect();
    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}
