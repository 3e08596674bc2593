//! HTTP backend tests against real listeners on ephemeral ports

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use rag_orchestrator::config::{BackendMode, RagConfig, ServiceEndpoint};
use rag_orchestrator::error::StageError;
use rag_orchestrator::orchestrator::CallPolicy;
use rag_orchestrator::providers::{
    GenerationProvider, HttpGenerator, HttpRetriever, RetrievalProvider,
};
use rag_orchestrator::server::RagServer;
use rag_orchestrator::types::FailedStage;
use rag_orchestrator::{
    ContextItem, GenerationError, Query, QueryOrchestrator, QueryOutcome, RetrievalError,
};
use serde_json::{json, Value};

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// The orchestrator's own router in mock mode, serving `/v1/retrieve` and `/v1/generate`
async fn spawn_mock_services() -> SocketAddr {
    let mut config = RagConfig::default();
    config.backend = BackendMode::Mock;
    spawn(RagServer::new(config).unwrap().router()).await
}

/// An address nothing is listening on
async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

fn http_retriever(addr: SocketAddr, timeout_secs: u64) -> HttpRetriever {
    HttpRetriever::new(&base_url(addr), Duration::from_secs(timeout_secs)).unwrap()
}

fn http_generator(addr: SocketAddr, timeout_secs: u64) -> HttpGenerator {
    HttpGenerator::new(&base_url(addr), Duration::from_secs(timeout_secs)).unwrap()
}

#[tokio::test]
async fn test_http_retriever_against_mock_service() {
    let addr = spawn_mock_services().await;
    let retriever = http_retriever(addr, 5);

    let documents = retriever.retrieve("refund policy", 2).await.unwrap();

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].id, "mock_doc_001");
    assert!(documents[0].relevance_score >= documents[1].relevance_score);
    assert!(documents[0].content.contains("refund policy"));
}

#[tokio::test]
async fn test_http_generator_against_mock_service() {
    let addr = spawn_mock_services().await;
    let generator = http_generator(addr, 5);
    let context = vec![ContextItem {
        doc_id: "doc_1".to_string(),
        content: "Refunds are issued within 30 days.".to_string(),
    }];

    let result = generator.generate("refund policy", &context).await.unwrap();

    assert!(result.answer_text.contains("refund policy"));
    assert!(result.answer_text.contains("1 context items"));
}

#[tokio::test]
async fn test_connection_refused_is_unavailable() {
    let addr = closed_port().await;

    let err = http_retriever(addr, 5).retrieve("q", 3).await.unwrap_err();
    assert!(matches!(err, RetrievalError::Unavailable(_)));

    let err = http_generator(addr, 5).generate("q", &[]).await.unwrap_err();
    assert!(matches!(err, GenerationError::Unavailable(_)));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let router = Router::new().route(
        "/v1/retrieve",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "index offline") }),
    );
    let addr = spawn(router).await;
    let retriever = http_retriever(addr, 5);

    let err = retriever.retrieve("q", 3).await.unwrap_err();

    match err {
        RetrievalError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "index offline");
        }
        other => panic!("expected Status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_shape_is_malformed() {
    let router = Router::new().route(
        "/v1/generate",
        post(|| async { Json(json!({"text": "no response field"})) }),
    );
    let addr = spawn(router).await;
    let generator = http_generator(addr, 5);

    let err = generator.generate("q", &[]).await.unwrap_err();

    assert!(matches!(err, GenerationError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_invalid_document_is_malformed() {
    let router = Router::new().route(
        "/v1/retrieve",
        post(|| async {
            Json(json!({"documents": [{"doc_id": "", "content": "x", "score": 0.5}]}))
        }),
    );
    let addr = spawn(router).await;
    let retriever = http_retriever(addr, 5);

    let err = retriever.retrieve("q", 3).await.unwrap_err();

    assert!(matches!(err, RetrievalError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_service_results_are_sorted_and_truncated() {
    let router = Router::new().route(
        "/v1/retrieve",
        post(|| async {
            Json(json!({"documents": [
                {"doc_id": "low", "content": "c", "score": 0.1},
                {"doc_id": "high", "content": "a", "score": 0.9},
                {"doc_id": "mid", "content": "b", "score": 0.5}
            ]}))
        }),
    );
    let addr = spawn(router).await;
    let retriever = http_retriever(addr, 5);

    let documents = retriever.retrieve("q", 2).await.unwrap();

    let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["high", "mid"]);
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let router = Router::new().route(
        "/v1/retrieve",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"documents": []}))
        }),
    );
    let addr = spawn(router).await;
    let retriever = http_retriever(addr, 1);

    let err = retriever.retrieve("q", 3).await.unwrap_err();

    assert!(matches!(err, RetrievalError::Timeout(_)));
}

#[tokio::test]
async fn test_orchestrator_degrades_when_retrieval_is_down() {
    let down = closed_port().await;
    let services = spawn_mock_services().await;

    let orchestrator = QueryOrchestrator::new(
        Arc::new(http_retriever(down, 5)),
        Arc::new(http_generator(services, 5)),
    );

    let outcome = orchestrator
        .process_query(&Query::new("What is the refund policy?"))
        .await
        .unwrap();

    assert!(matches!(outcome, QueryOutcome::RetrievalFailed { .. }));
    let result = outcome.into_result();
    assert!(!result.answer.is_empty());
    assert!(result.sources.is_empty());
    assert_eq!(result.metadata.degraded, Some(FailedStage::Retrieval));
    let error = result.metadata.error.unwrap();
    assert_eq!(error, "retrieval service unavailable");
    assert!(!error.contains("127.0.0.1"));
}

#[tokio::test]
async fn test_orchestrator_timeout_keeps_sources() {
    let services = spawn_mock_services().await;
    let slow = spawn(Router::new().route(
        "/v1/generate",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"response": "too late"}))
        }),
    ))
    .await;

    let orchestrator = QueryOrchestrator::new(
        Arc::new(http_retriever(services, 5)),
        Arc::new(http_generator(slow, 30)),
    )
    .with_policies(
        CallPolicy::default(),
        CallPolicy::default().with_timeout(Duration::from_millis(100)),
    );

    let outcome = orchestrator
        .process_query(&Query::new("refund policy").with_limit(2))
        .await
        .unwrap();

    match &outcome {
        QueryOutcome::GenerationFailed { error, .. } => {
            assert!(matches!(error, GenerationError::Timeout(_)));
        }
        other => panic!("expected GenerationFailed, got {:?}", other.failed_stage()),
    }
    assert_eq!(outcome.result().sources.len(), 2);
}

#[tokio::test]
async fn test_end_to_end_http_backend() {
    let services = spawn_mock_services().await;

    let mut config = RagConfig::default();
    config.backend = BackendMode::Http;
    config.retrieval = ServiceEndpoint::at(base_url(services), 5);
    config.generation = ServiceEndpoint::at(base_url(services), 5);
    let orchestrator_addr = spawn(RagServer::new(config).unwrap().router()).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/v1/query", orchestrator_addr))
        .json(&json!({"query": "What is the refund policy?", "limit": 2}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .contains("What is the refund policy?"));
    assert_eq!(body["sources"].as_array().unwrap().len(), 2);
    assert_eq!(body["sources"][0]["doc_id"], "mock_doc_001");
    assert_eq!(body["meta"]["cache_hit"], false);
    assert!(body["meta"].get("error").is_none());
}

#[tokio::test]
async fn test_default_endpoints_follow_configured_port() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = RagConfig::default();
    config
        .apply_env(|key| (key == "RAG_PORT").then(|| addr.port().to_string()))
        .unwrap();
    assert_eq!(config.backend, BackendMode::Http);

    let router = RagServer::new(config).unwrap().router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let body: Value = reqwest::Client::new()
        .post(format!("http://{}/v1/query", addr))
        .json(&json!({"query": "refund policy", "limit": 2}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(body["meta"].get("error").is_none(), "unexpected error: {}", body["meta"]);
    assert_eq!(body["sources"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_oversized_response_is_malformed() {
    let router = Router::new().route(
        "/v1/retrieve",
        post(|| async {
            let content = "x".repeat(4096);
            Json(json!({"documents": [{"doc_id": "big", "content": content, "score": 0.5}]}))
        }),
    );
    let addr = spawn(router).await;
    let retriever = http_retriever(addr, 5).with_max_response_bytes(1024);

    let err = retriever.retrieve("q", 3).await.unwrap_err();

    match err {
        RetrievalError::MalformedResponse(msg) => assert!(msg.contains("1024 bytes")),
        other => panic!("expected MalformedResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn test_large_error_body_is_truncated() {
    let router = Router::new().route(
        "/v1/generate",
        post(|| async { (StatusCode::BAD_GATEWAY, "e".repeat(100_000)) }),
    );
    let addr = spawn(router).await;

    let err = http_generator(addr, 5).generate("q", &[]).await.unwrap_err();

    match &err {
        GenerationError::Status { status, body } => {
            assert_eq!(*status, 502);
            assert_eq!(body.chars().count(), 201);
        }
        other => panic!("expected Status, got {:?}", other),
    }
    assert_eq!(err.summary(), "generation service returned HTTP 502");
}
