//! Claude-backed [`LanguageModel`] with stream handling

use anyhow::Result;
use claude_agent_sdk::{query, ClaudeAgentOptions, ContentBlock, Message};
use futures::{Stream, StreamExt};
use trends_router_sdk::{
    async_trait, log_agent_complete, log_agent_failed, log_agent_message, log_agent_start,
};

use super::{LanguageModel, ModelRequest};
use crate::utils::truncate_chars;

/// Language model that runs prompts through the Claude agent SDK
#[derive(Debug, Clone)]
pub struct ClaudeModel {
    name: String,
}

impl ClaudeModel {
    pub fn new() -> Self {
        Self {
            name: "claude".to_string(),
        }
    }
}

impl Default for ClaudeModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for ClaudeModel {
    async fn complete(&self, request: ModelRequest) -> Result<String> {
        log_agent_start!(&request.task_id, &request.agent_name, &request.description);

        let options = ClaudeAgentOptions::builder()
            .system_prompt(request.system_prompt.clone())
            .build();

        let stream = query(&request.prompt, Some(options)).await.map_err(|e| {
            log_agent_failed!(&request.task_id, &request.agent_name, e.to_string());
            e
        })?;

        match handle_stream(stream, &request.task_id, &request.agent_name).await {
            Ok(response) if response.trim().is_empty() => {
                let error = "model returned an empty reply";
                log_agent_failed!(&request.task_id, &request.agent_name, error);
                anyhow::bail!(error)
            }
            Ok(response) => {
                log_agent_complete!(
                    &request.task_id,
                    &request.agent_name,
                    format!("{} chars", response.len())
                );
                Ok(response)
            }
            Err(e) => {
                log_agent_failed!(&request.task_id, &request.agent_name, e.to_string());
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Collect the text blocks of an agent stream
///
/// Text is logged as agent messages; tool use is logged by name only.
/// Stops at the first `Result` message.
async fn handle_stream(
    stream: impl Stream<Item = claude_agent_sdk::error::Result<Message>>,
    task_id: &str,
    agent_name: &str,
) -> Result<String> {
    let mut response_text = String::new();
    let mut stream = Box::pin(stream);

    while let Some(message) = stream.next().await {
        match message? {
            Message::Assistant { message, .. } => {
                for block in &message.content {
                    match block {
                        ContentBlock::Text { text } => {
                            log_agent_message!(task_id, agent_name, truncate_chars(text, 200));
                            response_text.push_str(text);
                        }
                        ContentBlock::ToolUse { name, .. } => {
                            log_agent_message!(
                                task_id,
                                agent_name,
                                format!("🔧 Using tool: {}", name)
                            );
                        }
                        _ => {}
                    }
                }
            }
            Message::Result { .. } => break,
            _ => {}
        }
    }

    Ok(response_text)
}
