use super::*;
use crate::config::EmbeddingConfig;

fn test_config() -> Config {
    Config {
        embedding: EmbeddingConfig {
            protocol: "http".to_string(),
            host: "test-host".to_string(),
            port: 1234,
            model: "test-model".to_string(),
        },
        ..Config::default()
    }
}

#[test]
fn client_configuration() {
    let client = OllamaClient::new(&test_config()).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
}

#[test]
fn base_url_override() {
    let client = OllamaClient::new(&test_config())
        .expect("Failed to create client")
        .with_base_url(Url::parse("http://127.0.0.1:9999").expect("valid url"));

    assert_eq!(client.base_url.port(), Some(9999));
    assert_eq!(client.model(), "test-model");
}

#[test]
fn embed_request_serialization() {
    let request = EmbedRequest {
        model: "test-model".to_string(),
        prompt: "Which planet is fourth from the Sun?".to_string(),
    };

    let json = serde_json::to_string(&request).expect("should serialize");
    assert!(json.contains("\"model\":\"test-model\""));
    assert!(json.contains("fourth from the Sun"));
}

#[test]
fn embed_response_parsing() {
    let response: EmbedResponse =
        serde_json::from_str(r#"{"embedding":[0.1,0.2,0.3]}"#).expect("should parse");

    assert_eq!(response.embedding, vec![0.1, 0.2, 0.3]);
}
