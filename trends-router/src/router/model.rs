//! Language-model classifier

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::sync::Arc;

use super::{Classification, QueryType};
use crate::llm::{LanguageModel, ModelRequest};
use crate::utils::{extract_yaml, parse_yaml};

const SYSTEM_PROMPT: &str = "You are an intelligent query router for a YouTube trends analysis system. \
You classify user questions and reply with YAML only.";

const CATEGORY_GUIDE: &str = r#"Classify the query into exactly one of these types:

1. structured - analytical questions over the tabular dataset:
   aggregations (count, sum, average, max, min), filtering by attributes
   (category, channel, date ranges), ranking (top N, bottom N), statistics,
   comparisons between groups, trends over time.
   Examples:
   - "Which category has the most videos?"
   - "Top 10 channels by views"
   - "Average likes for Gaming category"
   - "Videos trending for more than 5 days"
   - "Compare views between Music and Sports"

2. semantic - content questions answered by similarity search:
   recommendations, topic search, conceptual or exploratory questions.
   Examples:
   - "Find videos about cooking tutorials"
   - "Videos similar to tech reviews"
   - "Content related to fitness and wellness"
   - "Search for motivational content"
   - "Videos discussing climate change"

3. hybrid - questions that need both:
   semantic search combined with statistical filters or aggregations.
   Examples:
   - "Find popular gaming videos about Minecraft"
   - "Most viewed videos about cooking in the last month"
   - "Top educational content about programming"

4. unknown - unclear or out-of-scope questions."#;

#[derive(Debug, Deserialize)]
struct ModelReply {
    query_type: String,
    confidence: f64,
    reasoning: String,
    suggested_agent: AgentField,
}

/// `suggested_agent` as a single name or a list of engines
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AgentField {
    One(String),
    Many(Vec<String>),
}

impl AgentField {
    fn joined(self) -> String {
        match self {
            AgentField::One(name) => name.trim().to_string(),
            AgentField::Many(names) => names
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Classifier that asks a [`LanguageModel`] for a YAML verdict
///
/// Never fails: model errors and malformed replies degrade to an `unknown`
/// classification with zero confidence.
#[derive(Clone)]
pub struct ModelClassifier {
    model: Arc<dyn LanguageModel>,
}

impl ModelClassifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn classify(&self, query: &str) -> Classification {
        match self.try_classify(query).await {
            Ok(classification) => classification,
            Err(e) => Classification::failed(format!("{:#}", e)),
        }
    }

    async fn try_classify(&self, query: &str) -> Result<Classification> {
        let request = ModelRequest::new(
            "router",
            "Query Router",
            "Classify query",
            SYSTEM_PROMPT,
            build_prompt(query),
        );
        let reply = self
            .model
            .complete(request)
            .await
            .context("Model call failed")?;
        parse_reply(&reply)
    }
}

fn build_prompt(query: &str) -> String {
    format!(
        r#"{guide}

Query: {query}

Respond with a YAML mapping and nothing else. Wrap every string value in
double quotes:

```yaml
query_type: "structured | semantic | hybrid | unknown"
confidence: 0.0 to 1.0
reasoning: "one sentence explaining the choice"
suggested_agent: "which engine(s) should answer"
```"#,
        guide = CATEGORY_GUIDE,
        query = query
    )
}

/// Parse and validate a model reply
///
/// Strict YAML is tried first. Replies that are not valid YAML, such as an
/// unquoted reasoning sentence containing `": "`, are read line by line.
pub fn parse_reply(reply: &str) -> Result<Classification> {
    let yaml = extract_yaml(reply);
    let raw: ModelReply = match parse_yaml(&yaml) {
        Ok(raw) => raw,
        Err(strict) => lenient_reply(&yaml).ok_or(strict)?,
    };

    let query_type = QueryType::parse(&raw.query_type)
        .ok_or_else(|| anyhow!("unknown query type '{}'", raw.query_type))?;

    let classification = Classification {
        query_type,
        confidence: raw.confidence,
        reasoning: raw.reasoning.trim().to_string(),
        suggested_agent: raw.suggested_agent.joined(),
    };
    classification.validate().map_err(|e| anyhow!(e))?;
    Ok(classification)
}

/// Line-wise `key: value` reading, split on the first colon
///
/// `suggested_agent` may be a flow list (`[a, b]`) or block list items
/// (`- a`) on the following lines. Returns `None` unless all four keys are
/// present and the confidence is a number.
fn lenient_reply(yaml: &str) -> Option<ModelReply> {
    let mut query_type = None;
    let mut confidence = None;
    let mut reasoning = None;
    let mut agents: Option<Vec<String>> = None;
    let mut last_key = "";

    for line in yaml.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(item) = line.strip_prefix("- ") {
            if last_key == "suggested_agent" {
                agents.get_or_insert_with(Vec::new).push(unquote(item).to_string());
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            "query_type" => query_type = Some(unquote(value).to_string()),
            "confidence" => confidence = unquote(value).parse::<f64>().ok(),
            "reasoning" => reasoning = Some(unquote(value).to_string()),
            "suggested_agent" => {
                let listed = value
                    .strip_prefix('[')
                    .and_then(|v| v.strip_suffix(']'))
                    .unwrap_or(value);
                agents = Some(
                    listed
                        .split(',')
                        .map(|a| unquote(a.trim()).to_string())
                        .filter(|a| !a.is_empty())
                        .collect(),
                );
            }
            _ => {}
        }
        last_key = key;
    }

    Some(ModelReply {
        query_type: query_type?,
        confidence: confidence?,
        reasoning: reasoning?,
        suggested_agent: AgentField::Many(agents?),
    })
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value)
}
