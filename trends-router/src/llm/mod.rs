//! Language model capability shared by the classifier, the SQL engine and
//! the hybrid narrator
//!
//! Everything that prompts a model goes through [`LanguageModel`], so tests
//! can swap in a scripted model and the binary can use [`ClaudeModel`].

pub mod claude;

use anyhow::Result;
use trends_router_sdk::async_trait;

pub use claude::ClaudeModel;

/// A single prompt sent to a language model
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Task ID used to tag log events (usually the run id)
    pub task_id: String,
    /// Agent name (for logging)
    pub agent_name: String,
    /// Description of what this call is doing
    pub description: String,
    /// System prompt framing the model's role
    pub system_prompt: String,
    /// Prompt to send to the model
    pub prompt: String,
}

impl ModelRequest {
    /// Create a new model request
    pub fn new(
        task_id: impl Into<String>,
        agent_name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            agent_name: agent_name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
        }
    }
}

/// Text completion capability
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run the request and return the full text of the reply
    async fn complete(&self, request: ModelRequest) -> Result<String>;

    /// Short identifier shown in system info
    fn name(&self) -> &str;
}
