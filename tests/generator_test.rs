// tests/generator_test.rs
use release_cycle::commit_message::{CommitMessageGenerator, OllamaGenerator};
use release_cycle::config::CommitMessageConfig;
use release_cycle::{ReleaseError, Result};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The generator is blocking, so it runs off the async test runtime
async fn generate(endpoint: String, diff: &'static str) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let config = CommitMessageConfig {
            use_generator: true,
            endpoint,
            timeout_secs: 5,
            ..CommitMessageConfig::default()
        };
        OllamaGenerator::new(&config)?.generate(diff)
    })
    .await
    .expect("generator thread panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generates_message_from_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "llama3", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3",
            "response": "  Added a public greeting function.\n",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = generate(server.uri(), "+pub fn greet() {}").await.unwrap();
    assert_eq!(message, "Added a public greeting function.");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_prompt_carries_the_diff() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
        .mount(&server)
        .await;

    generate(server.uri(), "+pub struct Widget;").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["prompt"]
        .as_str()
        .unwrap()
        .contains("+pub struct Widget;"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_external_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let err = generate(server.uri(), "diff").await.unwrap_err();
    assert!(matches!(err, ReleaseError::ExternalService(_)));
    assert!(err.to_string().contains("model not loaded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_response_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "   " })))
        .mount(&server)
        .await;

    assert!(generate(server.uri(), "diff").await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = generate(server.uri(), "diff").await.unwrap_err();
    assert!(err.to_string().contains("Invalid response body"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_service_is_an_error() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let err = generate(uri, "diff").await.unwrap_err();
    assert!(matches!(err, ReleaseError::ExternalService(_)));
}
