//! Common test utilities for retrieval testing

use std::sync::Once;

use medinote_common::RetrievalConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

/// Initialize logging for tests
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Retrieval config pointing both Qdrant and Ollama at one mock server
pub fn retrieval_config(server: &MockServer) -> RetrievalConfig {
    RetrievalConfig {
        qdrant_url: server.uri(),
        ollama_url: server.uri(),
        timeout_secs: 5,
        ..RetrievalConfig::default()
    }
}

/// Answer every embedding request with a fixed small vector
pub async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": [0.1, 0.2, 0.3]})))
        .mount(server)
        .await;
}

/// Qdrant search response with one point per payload
pub fn qdrant_points(payloads: &[Value]) -> ResponseTemplate {
    let result: Vec<Value> = payloads
        .iter()
        .enumerate()
        .map(|(i, payload)| json!({"id": i, "version": 1, "score": 0.5, "payload": payload}))
        .collect();
    ResponseTemplate::new(200).set_body_json(json!({"result": result, "status": "ok", "time": 0.001}))
}
