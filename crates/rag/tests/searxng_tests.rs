//! SearXNG client against a mock instance

mod common;

use common::init_test_logging;
use medinote_common::ProviderError;
use medinote_rag::{SearXNGClient, WebSearch};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, max_results: usize) -> SearXNGClient {
    SearXNGClient::new(server.uri(), 5, max_results, vec!["duckduckgo".to_string(), "bing".to_string()]).unwrap()
}

#[tokio::test]
async fn test_search_sends_json_format_and_engines() {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "독감 백신 2025"))
        .and(query_param("format", "json"))
        .and(query_param("engines", "duckduckgo,bing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "독감 백신 2025",
            "number_of_results": 3,
            "results": [
                {"url": "https://kdca.example/a", "title": "2025 독감 백신", "content": "접종 일정", "engine": "bing", "score": 2.5},
                {"url": "https://kdca.example/a", "title": "duplicate", "content": "dup"},
                {"url": "https://news.example/b", "title": "백신 뉴스"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server, 5).search("독감 백신 2025", 5).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title.as_deref(), Some("2025 독감 백신"));
    assert_eq!(results[0].snippet.as_deref(), Some("접종 일정"));
    assert_eq!(results[0].score, Some(2.5));
    assert_eq!(results[1].url.as_deref(), Some("https://news.example/b"));
    assert_eq!(results[1].snippet, None);
}

#[tokio::test]
async fn test_search_respects_top_k_and_client_cap() {
    init_test_logging();
    let server = MockServer::start().await;
    let results: Vec<_> = (0..10)
        .map(|i| json!({"url": format!("https://e.example/{}", i), "title": format!("r{}", i)}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": results})))
        .mount(&server)
        .await;

    assert_eq!(client(&server, 5).search("q", 3).await.unwrap().len(), 3);
    assert_eq!(client(&server, 4).search("q", 10).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_search_error_status() {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server, 5).search("q", 5).await.unwrap_err();
    assert!(matches!(err, ProviderError::Http { status: 502, .. }));
}

#[tokio::test]
async fn test_health_check() {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(client(&server, 5).health_check().await.is_ok());
}
