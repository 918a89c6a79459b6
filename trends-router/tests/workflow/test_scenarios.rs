//! End-to-end query scenarios with mocked engines

use super::common::*;
use serde_json::json;
use std::sync::Arc;
use trends_router::engines::{SearchFilters, NO_RESULTS_MESSAGE};
use trends_router::router::{KeywordClassifier, ModelClassifier, QueryClassifier, QueryType};
use trends_router::workflow::{Orchestrator, ResponseSynthesizer, APOLOGY_MESSAGE};

fn keyword_orchestrator(
    structured: Arc<MockStructured>,
    semantic: Arc<MockSemantic>,
) -> Orchestrator {
    Orchestrator::new(QueryClassifier::Keyword(KeywordClassifier::new()))
        .with_structured(structured)
        .with_semantic(semantic)
}

#[tokio::test]
async fn test_how_many_videos_passthrough() {
    let log = CallLog::default();
    let orchestrator = keyword_orchestrator(
        MockStructured::answering(&log, "42 videos"),
        MockSemantic::answering(&log, "unused", vec![]),
    );

    let response = orchestrator.process_query("How many videos are there?").await;

    assert_eq!(response.answer, "42 videos");
    assert_eq!(response.metadata.query_type, QueryType::Structured);
    assert!(response.success);
    assert!(response.processing_time_ms.is_some());
    assert!(response.routing.is_some());
}

#[tokio::test]
async fn test_model_reply_with_colon_and_agent_list_routes() {
    let log = CallLog::default();
    let model = CannedModel::replying(
        "query_type: hybrid\nconfidence: 0.8\n\
         reasoning: Two needs: ranking by views and topic search\n\
         suggested_agent: [structured, semantic]",
    );
    let orchestrator = Orchestrator::new(QueryClassifier::Model(ModelClassifier::new(model)))
        .with_structured(MockStructured::answering(&log, "Gaming leads"))
        .with_semantic(MockSemantic::answering(&log, "Found 1", vec![sample_hit(1, "Minecraft")]));

    let response = orchestrator.process_query("Most viewed Minecraft videos").await;

    assert_eq!(response.metadata.query_type, QueryType::Hybrid);
    assert_eq!(response.metadata.confidence, 0.8);
    assert!(response.success);
    assert_eq!(log.entries().len(), 4);
}

#[tokio::test]
async fn test_find_cooking_videos_no_results() {
    let log = CallLog::default();
    let orchestrator = keyword_orchestrator(
        MockStructured::answering(&log, "unused"),
        MockSemantic::answering(&log, "", vec![]),
    );

    let response = orchestrator.process_query("find cooking videos").await;

    assert_eq!(response.answer, NO_RESULTS_MESSAGE);
    assert_eq!(response.metadata.query_type, QueryType::Semantic);
    assert!(response.success);
}

#[tokio::test]
async fn test_empty_query_rejected_before_classification() {
    let log = CallLog::default();
    let classifier = FixedClassifier::new(QueryType::Structured);
    let orchestrator = Orchestrator::new(QueryClassifier::Custom(classifier.clone()))
        .with_structured(MockStructured::answering(&log, "42 videos"));

    for query in ["", "   \n\t"] {
        let response = orchestrator.process_query(query).await;
        assert!(!response.success);
        assert!(response.error.as_deref().unwrap_or_default().contains("empty"));
        assert!(!response.answer.is_empty());
    }

    assert_eq!(classifier.calls(), 0);
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_unknown_gets_apology() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Unknown,
        MockStructured::answering(&log, "unused"),
        MockSemantic::answering(&log, "unused", vec![]),
    );

    let response = orchestrator.process_query("Tell me a joke").await;

    assert_eq!(response.answer, APOLOGY_MESSAGE);
    assert!(response.metadata.agents_used.is_empty());
    assert_eq!(response.metadata.query_type, QueryType::Unknown);
    assert!(!response.success);
}

#[tokio::test]
async fn test_every_query_type_answers() {
    for query_type in [
        QueryType::Structured,
        QueryType::Semantic,
        QueryType::Hybrid,
        QueryType::Unknown,
    ] {
        let log = CallLog::default();
        let orchestrator = orchestrator_for(
            query_type,
            MockStructured::answering(&log, "structured answer"),
            MockSemantic::answering(&log, "semantic answer", vec![sample_hit(1, "Pasta")]),
        );

        let response = orchestrator.process_query("some question").await;

        assert!(!response.answer.is_empty(), "{:?}", query_type);
        assert_eq!(response.metadata.query_type, query_type);
        assert_eq!(response.metadata.confidence, 0.9);
    }
}

#[tokio::test]
async fn test_hybrid_without_narrator_concatenates() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::answering(&log, "Gaming leads with 1,204 videos"),
        MockSemantic::answering(&log, "Found 1 relevant videos:", vec![sample_hit(1, "Minecraft")]),
    );

    let response = orchestrator.process_query("Popular Minecraft videos").await;

    assert_eq!(
        response.answer,
        "Structured Analysis: Gaming leads with 1,204 videos\n\nSemantic Search: Found 1 relevant videos:"
    );
    assert!(response.success);
}

#[tokio::test]
async fn test_hybrid_with_narrator() {
    let log = CallLog::default();
    let narrator = CannedModel::replying("Minecraft content dominates the Gaming category.");
    let orchestrator = orchestrator_for(
        QueryType::Hybrid,
        MockStructured::answering(&log, "a"),
        MockSemantic::answering(&log, "b", vec![sample_hit(1, "Minecraft")]),
    )
    .with_synthesizer(ResponseSynthesizer::with_narrator(narrator.clone()));

    let response = orchestrator.process_query("Popular Minecraft videos").await;

    assert_eq!(response.answer, "Minecraft content dominates the Gaming category.");
    assert_eq!(narrator.calls(), 1);
}

#[tokio::test]
async fn test_filters_reach_semantic_engine() {
    let log = CallLog::default();
    let semantic =
        MockSemantic::answering(&log, "Found 1 relevant videos:", vec![sample_hit(1, "Pasta")]);
    let orchestrator = orchestrator_for(
        QueryType::Semantic,
        MockStructured::answering(&log, "unused"),
        semantic.clone(),
    );

    let mut filters = SearchFilters::new();
    filters.insert("category".to_string(), json!("Howto & Style"));
    orchestrator
        .process_query_with_filters("pasta recipes", Some(filters.clone()))
        .await;

    assert_eq!(*semantic.seen_filters.lock().unwrap(), Some(filters));
}

#[tokio::test]
async fn test_response_serializes_for_callers() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Semantic,
        MockStructured::answering(&log, "unused"),
        MockSemantic::answering(&log, "Found 1 relevant videos:", vec![sample_hit(1, "Pasta")]),
    );

    let response = orchestrator.process_query("pasta").await;
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["metadata"]["query_type"], "semantic");
    assert_eq!(json["metadata"]["agents_used"], json!(["semantic"]));
    assert_eq!(json["semantic_result"]["results"][0]["title"], "Pasta");
    assert_eq!(json["routing"]["execution_strategy"], "single_agent");
}

#[tokio::test]
async fn test_system_info_lists_engines() {
    let log = CallLog::default();
    let orchestrator = orchestrator_for(
        QueryType::Semantic,
        MockStructured::answering(&log, "unused"),
        MockSemantic::answering(&log, "unused", vec![]),
    );

    let info = orchestrator.system_info();

    assert_eq!(info.classifier, "fixed");
    assert_eq!(info.engines.len(), 2);
    assert!(info.unavailable.is_empty());
    assert!(!info.narrative_synthesis);
}
