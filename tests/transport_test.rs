use std::sync::Arc;

use seo_audit_batch::config::Config;
use seo_audit_batch::error::ApiError;
use seo_audit_batch::infrastructure::HttpTransport;
use seo_audit_batch::services::LlmService;
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        llm_api_key: "test-key".to_string(),
        llm_api_base_url: server.uri(),
        ..Config::default()
    }
}

fn llm_for(server: &MockServer) -> LlmService {
    let config = config_for(server);
    let transport = HttpTransport::new(&config).expect("创建传输层失败");
    LlmService::new(&config, Arc::new(transport))
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

#[tokio::test]
async fn sends_bearer_key_and_returns_trimmed_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-3.5-turbo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Score: 80  \n")))
        .expect(1)
        .mount(&server)
        .await;

    let content = assert_ok!(llm_for(&server).send_to_llm("hola", Some("sistema")).await);
    assert_eq!(content, "Score: 80");
}

#[tokio::test]
async fn throttled_response_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let err = llm_for(&server).send_to_llm("hola", None).await.unwrap_err();
    assert_eq!(err, ApiError::RateLimited { retry_after: Some(7) });
    assert!(err.is_transient());
}

#[tokio::test]
async fn server_error_keeps_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": {"message": "overloaded"}})),
        )
        .mount(&server)
        .await;

    let err = llm_for(&server).send_to_llm("hola", None).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::BadStatus {
            status: 500,
            message: Some("overloaded".to_string())
        }
    );
    assert!(!err.is_transient());
}

#[tokio::test]
async fn rejected_key_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = llm_for(&server).send_to_llm("hola", None).await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized { status: 401 });
}

#[tokio::test]
async fn missing_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = llm_for(&server).send_to_llm("hola", None).await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedPayload(_)));
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let config = Config {
        llm_api_key: "test-key".to_string(),
        llm_api_base_url: "http://127.0.0.1:9".to_string(),
        ..Config::default()
    };
    let transport = HttpTransport::new(&config).unwrap();
    let llm = LlmService::new(&config, Arc::new(transport));

    let err = llm.send_to_llm("hola", None).await.unwrap_err();
    assert!(err.is_transient());
}
