//! Integration tests for the chat-completions client against a mock server.

use parley_core::{ChatMessage, CompletionOptions, LLMProvider};
use parley_providers::OpenAIProvider;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OpenAIProvider {
    OpenAIProvider::new("test-key".to_string())
        .with_base_url(server.uri())
        .with_retry_delays(Vec::new())
}

fn options() -> CompletionOptions {
    CompletionOptions {
        model: "gpt-4".to_string(),
        temperature: 0.5,
        max_tokens: 256,
    }
}

#[tokio::test]
async fn test_chat_parses_content_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "temperature": 0.5,
            "max_tokens": 256,
            "messages": [
                {"role": "system", "content": "Be Kemal."},
                {"role": "user", "content": "Merhaba"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Merhaba! Nasılsın?"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = [ChatMessage::system("Be Kemal."), ChatMessage::user("Merhaba")];
    let response = provider(&server)
        .chat(&messages, &options())
        .await
        .expect("Failed to chat");

    assert_eq!(response.content, "Merhaba! Nasılsın?");
    let usage = response.usage.expect("usage should be parsed");
    assert_eq!(usage.prompt_tokens, 12);
    assert_eq!(usage.completion_tokens, 5);
    assert_eq!(usage.total_tokens, 17);
}

#[tokio::test]
async fn test_chat_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server)
        .chat(&[ChatMessage::user("Merhaba")], &options())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_chat_retries_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Tekrar merhaba"}}]
        })))
        .mount(&server)
        .await;

    let response = provider(&server)
        .with_retry_delays(vec![std::time::Duration::from_millis(10)])
        .chat(&[ChatMessage::user("Merhaba")], &options())
        .await
        .expect("Failed to chat after retry");

    assert_eq!(response.content, "Tekrar merhaba");
    assert!(response.usage.is_none());
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = provider(&server)
        .chat(&[ChatMessage::user("Merhaba")], &options())
        .await;

    let err = result.expect_err("missing content should fail");
    assert!(err.to_string().contains("missing content"));
}

#[tokio::test]
async fn test_chat_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server)
        .with_retry_delays(vec![std::time::Duration::from_millis(10); 2])
        .chat(&[ChatMessage::user("Merhaba")], &options())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_chat_retries_rate_limits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Sonunda!"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .with_retry_delays(vec![std::time::Duration::from_millis(10); 2])
        .chat(&[ChatMessage::user("Merhaba")], &options())
        .await
        .expect("Failed to chat after rate limit");

    assert_eq!(response.content, "Sonunda!");
}

#[tokio::test]
async fn test_chat_does_not_retry_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server)
        .with_retry_delays(vec![std::time::Duration::from_millis(10); 2])
        .chat(&[ChatMessage::user("Merhaba")], &options())
        .await;

    assert!(result.is_err());
}
