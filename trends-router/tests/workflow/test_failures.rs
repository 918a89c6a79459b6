//! Degraded paths: engine, routing, synthesis and fatal failures

use super::common::*;
use std::sync::Arc;
use trends_router::engines::EngineKind;
use trends_router::router::{ModelClassifier, QueryClassifier, QueryType};
use trends_router::workflow::{Orchestrator, ResponseSynthesizer, APOLOGY_MESSAGE};

#[tokio::test]
async fn test_hybrid_structured_fails_semantic_succeeds() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::failing(&log, "boom"),
        MockSemantic::answering(
            &log,
            "Found 1 relevant videos:\n1. Pasta Night",
            vec![sample_hit(1, "Pasta Night")],
        ),
    );

    let response = orchestrator.process_query("Top pasta videos").await;

    assert!(response.success);
    assert!(response.answer.contains("Pasta Night"));
    assert!(response.answer.contains("Error: boom"));
    assert!(log.entries().contains(&"semantic:start".to_string()));
    assert_eq!(response.structured_result.unwrap().error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_hybrid_both_fail() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::failing(&log, "database locked"),
        MockSemantic::failing(&log, "qdrant unreachable"),
    );

    let response = orchestrator.process_query("Top pasta videos").await;

    assert!(!response.success);
    assert_eq!(
        response.answer,
        "Structured Analysis: Error: database locked\n\nSemantic Search: Error: qdrant unreachable"
    );
    let error = response.error.unwrap();
    assert!(error.contains("database locked"));
    assert!(error.contains("qdrant unreachable"));
}

#[tokio::test]
async fn test_structured_failure_single_engine() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Structured,
        MockStructured::failing(&log, "no such column: views"),
        MockSemantic::answering(&log, "unused", vec![]),
    );

    let response = orchestrator.process_query("Average views").await;

    assert!(!response.success);
    assert_eq!(response.answer, "Error: no such column: views");
    assert_eq!(response.metadata.agents_used, vec![EngineKind::Structured]);
}

#[tokio::test]
async fn test_engine_panic_becomes_failed_result() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::with(&log, Behavior::Panic),
        MockSemantic::answering(&log, "Found 1 relevant videos:", vec![sample_hit(1, "Pasta")]),
    );

    let response = orchestrator.process_query("Top pasta videos").await;

    assert!(response.success);
    let structured = response.structured_result.unwrap();
    assert!(!structured.success);
    assert!(structured.error.unwrap().contains("structured engine exploded"));
    assert!(response.semantic_result.unwrap().success);
}

#[tokio::test]
async fn test_missing_engine_reports_not_available() {
    let orchestrator =
        Orchestrator::new(QueryClassifier::Custom(FixedClassifier::new(QueryType::Structured)));

    let response = orchestrator.process_query("Count the videos").await;

    assert!(!response.success);
    assert_eq!(response.answer, "Error: Structured engine not available");
    assert_eq!(orchestrator.system_info().unavailable.len(), 2);
}

#[tokio::test]
async fn test_routing_error_ends_with_apology() {
    let log = CallLog::default();
    let orchestrator =
        Orchestrator::new(QueryClassifier::Custom(Arc::new(BrokenClassifier::Errors)))
            .with_structured(MockStructured::answering(&log, "unused"));

    let response = orchestrator.process_query("Count the videos").await;

    assert_eq!(response.answer, APOLOGY_MESSAGE);
    assert!(!response.success);
    assert!(response
        .error
        .unwrap()
        .starts_with("Routing failed: classifier error: classifier offline"));
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_model_classifier_failure_degrades_to_unknown() {
    let log = CallLog::default();
    let model = CannedModel::failing("model overloaded");
    let classifier = QueryClassifier::Model(ModelClassifier::new(model.clone()));
    let orchestrator = Orchestrator::new(classifier)
        .with_structured(MockStructured::answering(&log, "unused"))
        .with_semantic(MockSemantic::answering(&log, "unused", vec![]));

    let decision = orchestrator.get_routing_info("Count the videos").await.unwrap();
    assert_eq!(decision.query_type(), QueryType::Unknown);
    assert_eq!(decision.classification.confidence, 0.0);
    assert!(decision
        .classification
        .reasoning
        .starts_with("Classification failed:"));

    let response = orchestrator.process_query("Count the videos").await;
    assert_eq!(response.answer, APOLOGY_MESSAGE);
    assert!(response.metadata.agents_used.is_empty());
    assert!(log.entries().is_empty());
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_model_classifier_garbage_reply_degrades() {
    let model = CannedModel::replying("Sure! This looks like a great question.");
    let classifier = QueryClassifier::Model(ModelClassifier::new(model));

    let decision = classifier.route("Top 10 channels").await.unwrap();

    assert_eq!(decision.query_type(), QueryType::Unknown);
    assert!(decision.agents.is_empty());
}

#[tokio::test]
async fn test_narrator_failure_falls_back_to_concatenation() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::answering(&log, "a"),
        MockSemantic::answering(&log, "b", vec![sample_hit(1, "Pasta")]),
    )
    .with_synthesizer(ResponseSynthesizer::with_narrator(CannedModel::failing("timeout")));

    let response = orchestrator.process_query("Top pasta videos").await;

    assert!(response.success);
    assert_eq!(response.answer, "Structured Analysis: a\n\nSemantic Search: b");
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_panic_escaping_workflow_is_fatal_response() {
    let orchestrator =
        Orchestrator::new(QueryClassifier::Custom(Arc::new(BrokenClassifier::Panics)));

    let response = orchestrator.process_query("Count the videos").await;

    assert!(!response.success);
    assert_eq!(response.answer, "An error occurred: classifier state corrupted");
    assert_eq!(response.error.as_deref(), Some("classifier state corrupted"));
    assert!(response.processing_time_ms.is_some());
}
