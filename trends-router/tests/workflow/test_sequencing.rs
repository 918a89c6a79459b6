//! Engine ordering and stage transitions

use super::common::*;
use trends_router::engines::EngineKind;
use trends_router::router::QueryType;

#[tokio::test]
async fn test_hybrid_runs_structured_before_semantic() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::answering(&log, "Gaming has 1,204 videos"),
        MockSemantic::answering(&log, "Found 1 relevant videos:", vec![sample_hit(1, "Minecraft")]),
    );

    let response = orchestrator
        .process_query("Top gaming videos about Minecraft")
        .await;

    assert_eq!(
        log.entries(),
        vec![
            "structured:start".to_string(),
            "structured:end:Top gaming videos about Minecraft".to_string(),
            "semantic:start".to_string(),
            "semantic:end".to_string(),
        ]
    );
    assert_eq!(
        response.metadata.agents_used,
        vec![EngineKind::Structured, EngineKind::Semantic]
    );
    assert!(response.success);
}

#[tokio::test]
async fn test_structured_only_never_calls_semantic() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Structured,
        MockStructured::answering(&log, "42 videos"),
        MockSemantic::answering(&log, "unused", vec![]),
    );

    let response = orchestrator.process_query("Count the videos").await;

    assert!(log.entries().iter().all(|e| e.starts_with("structured:")));
    assert!(response.semantic_result.is_none());
    assert!(response.structured_result.is_some());
}

#[tokio::test]
async fn test_semantic_only_never_calls_structured() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Semantic,
        MockStructured::answering(&log, "unused"),
        MockSemantic::answering(&log, "Found 1 relevant videos:", vec![sample_hit(1, "Pasta")]),
    );

    let response = orchestrator.process_query("Videos similar to tech reviews").await;

    assert_eq!(log.entries(), vec!["semantic:start", "semantic:end"]);
    assert!(response.structured_result.is_none());
}

#[tokio::test]
async fn test_unknown_calls_no_engine() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Unknown,
        MockStructured::answering(&log, "unused"),
        MockSemantic::answering(&log, "unused", vec![]),
    );

    orchestrator.process_query("What is the meaning of life?").await;

    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_routing_info_does_not_run_engines() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::answering(&log, "unused"),
        MockSemantic::answering(&log, "unused", vec![]),
    );

    let decision = orchestrator
        .get_routing_info("Most viewed cooking videos")
        .await
        .unwrap();

    assert_eq!(decision.query_type(), QueryType::Hybrid);
    assert_eq!(decision.execution_strategy.as_str(), "multi_agent_sequential");
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_idempotent_routing_metadata() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::answering(&log, "a"),
        MockSemantic::answering(&log, "b", vec![sample_hit(1, "Pasta")]),
    );

    let first = orchestrator.process_query("Top cooking content").await;
    let second = orchestrator.process_query("Top cooking content").await;

    assert_eq!(first.metadata.agents_used, second.metadata.agents_used);
    assert_eq!(first.metadata.query_type, second.metadata.query_type);
    assert_eq!(first.answer, second.answer);
}

#[tokio::test]
async fn test_concurrent_queries_are_isolated() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Structured,
        MockStructured::answering(&log, "42 videos"),
        MockSemantic::answering(&log, "unused", vec![]),
    );

    let queries = ["one", "two", "three"];
    let responses =
        futures::future::join_all(queries.iter().map(|q| orchestrator.process_query(q))).await;

    for (query, response) in queries.iter().zip(&responses) {
        assert_eq!(response.query, *query);
        assert_eq!(response.answer, "42 videos");
    }
    assert_eq!(log.entries().len(), 6);
}
