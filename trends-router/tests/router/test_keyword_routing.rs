//! Keyword classifier routing over realistic questions

use trends_router::engines::EngineKind;
use trends_router::router::{ExecutionStrategy, KeywordClassifier, QueryClassifier, QueryType};

async fn route(query: &str) -> (QueryType, Vec<EngineKind>, ExecutionStrategy) {
    let decision = QueryClassifier::Keyword(KeywordClassifier::new())
        .route(query)
        .await
        .unwrap();
    (decision.query_type(), decision.agents, decision.execution_strategy)
}

#[tokio::test]
async fn test_analytical_questions_go_structured() {
    for query in [
        "How many videos are in the Music category?",
        "Which category has the most videos?",
        "What is the average number of likes?",
        "Compare views between Music and Sports",
    ] {
        let (query_type, agents, strategy) = route(query).await;
        assert_eq!(query_type, QueryType::Structured, "{}", query);
        assert_eq!(agents, vec![EngineKind::Structured]);
        assert_eq!(strategy, ExecutionStrategy::SingleAgent);
    }
}

#[tokio::test]
async fn test_discovery_questions_go_semantic() {
    for query in [
        "Find videos about cooking tutorials",
        "Show me content related to fitness",
        "Recommend something similar to tech reviews",
    ] {
        let (query_type, agents, _) = route(query).await;
        assert_eq!(query_type, QueryType::Semantic, "{}", query);
        assert_eq!(agents, vec![EngineKind::Semantic]);
    }
}

#[tokio::test]
async fn test_balanced_question_goes_hybrid() {
    let (query_type, agents, strategy) = route("Search the top Minecraft uploads").await;
    assert_eq!(query_type, QueryType::Hybrid);
    assert_eq!(agents, vec![EngineKind::Structured, EngineKind::Semantic]);
    assert_eq!(strategy, ExecutionStrategy::MultiAgentSequential);
}

#[tokio::test]
async fn test_keyword_routing_is_deterministic() {
    let first = route("Find the most popular cooking videos").await;
    let second = route("Find the most popular cooking videos").await;
    assert_eq!(first, second);
}
