use medinote_common::config::SystemConfig;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_load_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("medinote.toml");

    let config_content = r#"
[llm]
base_url = "http://localhost:11434/v1"
model = "qwen2.5:7b"
api_key = "local"
temperature = 0.3

[retrieval]
qdrant_url = "http://qdrant:6333"
pool_size = 40
top_k = 4

[web_search]
endpoint = "http://searxng:8080"
engines = ["google"]

[history]
database_url = "postgresql://localhost/medinote"

[server]
port = 9000
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = SystemConfig::from_file(&config_path).unwrap();

    assert_eq!(config.llm.model, "qwen2.5:7b");
    assert_eq!(config.llm.resolved_api_key().as_deref(), Some("local"));
    assert_eq!(config.retrieval.qdrant_url, "http://qdrant:6333");
    assert_eq!(config.retrieval.pool_size, 40);
    assert_eq!(config.retrieval.top_k, 4);
    // untouched fields keep their defaults
    assert_eq!(config.retrieval.interaction_collection, "interaction");
    assert_eq!(config.web_search.endpoint.as_deref(), Some("http://searxng:8080"));
    assert_eq!(config.web_search.rescue_results, 3);
    assert_eq!(config.server.bind_address(), "0.0.0.0:9000");
}

#[test]
fn test_empty_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").unwrap();

    let config = SystemConfig::from_file(&config_path).unwrap();

    assert_eq!(config.confidence.medium_threshold, 0.4);
    assert_eq!(config.confidence.high_threshold, 0.6);
    assert_eq!(config.confidence.web_rescue_threshold, 0.15);
    assert_eq!(config.confidence.scored_window, 3);
    assert_eq!(config.retrieval.pool_size, 50);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.history.recent_turns, 20);
    assert!(config.history.database_url.is_none());
    assert!(config.web_search.endpoint.is_none());
    assert_eq!(config.server.port, 8001);
}

#[test]
fn test_config_validation_rejects_unordered_thresholds() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("invalid.toml");

    fs::write(
        &config_path,
        r#"
[confidence]
medium_threshold = 0.7
high_threshold = 0.5
"#,
    )
    .unwrap();

    let result = SystemConfig::from_file(&config_path);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("web_rescue"));
}

#[test]
fn test_config_validation_rejects_zero_window() {
    let mut config = SystemConfig::default();
    config.confidence.scored_window = 0;

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("scored_window"));
}

#[test]
fn test_config_validation_rejects_top_k_above_pool() {
    let mut config = SystemConfig::default();
    config.retrieval.top_k = 60;

    assert!(config.validate().is_err());
}

#[test]
fn test_missing_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let result = SystemConfig::from_file(temp_dir.path().join("nope.toml"));
    assert!(result.unwrap_err().to_string().contains("Failed to read config file"));
}

#[test]
fn test_load_or_default_without_path() {
    let config = SystemConfig::load_or_default(None).unwrap();
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert!(config.validate().is_ok());
}
