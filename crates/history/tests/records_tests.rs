//! Backend record client against a mock Medinote backend

use medinote_common::{ProviderError, RecordsConfig};
use medinote_history::{BackendRecordClient, PersonalRecords, RecordCategory, UserRecordService};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> BackendRecordClient {
    BackendRecordClient::new(&RecordsConfig {
        backend_url: format!("{}/", server.uri()),
        timeout_secs: 5,
    })
    .unwrap()
}

async fn mount(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("X-User-Id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_sends_user_header() {
    let server = MockServer::start().await;
    mount(&server, "/health/allergy", json!([{"allergy_name": "페니실린"}])).await;

    let value = client(&server)
        .fetch(RecordCategory::Allergies, "42")
        .await
        .unwrap();
    assert_eq!(value, json!([{"allergy_name": "페니실린"}]));
}

#[tokio::test]
async fn test_not_found_is_empty_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
        .mount(&server)
        .await;

    let value = client(&server).fetch(RecordCategory::Profile, "42").await.unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&server)
        .await;

    let err = client(&server).fetch(RecordCategory::Visits, "42").await.unwrap_err();
    assert!(matches!(err, ProviderError::Http { status: 500, .. }));
}

#[tokio::test]
async fn test_collect_decodes_all_categories() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/health",
        json!({"birth": "1985-05-05", "gender": "F", "blood_type": "A", "height": 160, "weight": 52}),
    )
    .await;
    mount(&server, "/health/allergy", json!([])).await;
    mount(&server, "/health/chronic", json!([{"disease_name": "고혈압", "note": "2019년 진단"}])).await;
    mount(&server, "/health/acute", json!([])).await;
    mount(
        &server,
        "/drug",
        json!([{"med_name": "아모잘탄", "dosage_form": "정", "dose": 1, "unit": "정", "schedule": "아침"}]),
    )
    .await;
    mount(&server, "/prescription", json!([])).await;
    mount(
        &server,
        "/visits",
        json!([{"hospital": "서울내과", "dept": "내과", "diagnosis_name": "고혈압", "date": "2024-02-01"}]),
    )
    .await;

    let records = PersonalRecords::collect(&client(&server), "42").await.unwrap();

    let profile = records.profile.as_ref().unwrap();
    assert_eq!(profile.height.as_deref(), Some("160"));
    assert!(records.allergies.is_empty());
    assert_eq!(records.chronic[0].disease_name.as_deref(), Some("고혈압"));
    assert_eq!(records.medications[0].dose.as_deref(), Some("1"));
    assert_eq!(records.visits[0].hospital.as_deref(), Some("서울내과"));
    assert!(!records.is_empty());
}

#[tokio::test]
async fn test_collect_stops_on_first_failure() {
    let server = MockServer::start().await;
    mount(&server, "/health", json!({})).await;
    Mock::given(method("GET"))
        .and(path("/health/allergy"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health/chronic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = PersonalRecords::collect(&client(&server), "42").await;
    assert!(result.is_err());
}
