//! # Vision Provider Tests
//!
//! Runs the OpenAI-compatible and Gemini providers against a `wiremock` server
//! and checks how their failures surface through the `FieldExtractor`.

mod common;

use common::{fields, setup_tracing};
use docfield::{
    providers::ai::{gemini::GeminiProvider, openai::OpenAiProvider},
    DocfieldError, FieldExtractor, PageImage,
};
use serde_json::json;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::{
    matchers::{body_partial_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const CHAT_PATH: &str = "/v1/chat/completions";

fn page_image() -> PageImage {
    PageImage {
        png: vec![0x89, b'P', b'N', b'G'],
        width: 10,
        height: 10,
    }
}

fn openai_extractor(server: &MockServer, timeout: Duration) -> FieldExtractor {
    let provider = OpenAiProvider::new(
        format!("{}{CHAT_PATH}", server.uri()),
        Some("sk-test".to_string()),
        "gpt-5-nano".to_string(),
        timeout,
    )
    .unwrap();
    FieldExtractor::new(Box::new(provider))
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

#[tokio::test]
async fn test_openai_extraction_round_trip() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    let content = "```json\n{\"invoice_number\": {\"value\": \"INV-2024-001\", \"confidence\": 0.98}, \"date\": null}\n```";
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-5-nano",
            "max_completion_tokens": 4000,
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(content)))
        .expect(1)
        .mount(&server)
        .await;
    let extractor = openai_extractor(&server, Duration::from_secs(5));

    // --- 2. Act ---
    let extracted = extractor
        .extract_fields(&page_image(), &fields(&["invoice_number", "date"]))
        .await
        .unwrap();

    // --- 3. Assert ---
    assert_eq!(extracted.len(), 1);
    assert_eq!(extracted[0].field_name, "invoice_number");
    assert_eq!(extracted[0].value, "INV-2024-001");
    assert_eq!(extracted[0].confidence, 0.98);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user_parts = body["messages"][1]["content"].as_array().unwrap();
    assert!(user_parts[0]["text"]
        .as_str()
        .unwrap()
        .contains(r#""invoice_number", "date""#));
    assert!(user_parts[1]["image_url"]["url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_openai_rate_limit_is_upstream_unavailable() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = openai_extractor(&server, Duration::from_secs(5))
        .extract_fields(&page_image(), &fields(&["date"]))
        .await
        .unwrap_err();

    match err {
        DocfieldError::UpstreamUnavailable(detail) => assert!(detail.contains("429")),
        other => panic!("expected UpstreamUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_timeout_is_upstream_unavailable() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply("{}"))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let err = openai_extractor(&server, Duration::from_millis(100))
        .extract_fields(&page_image(), &fields(&["date"]))
        .await
        .unwrap_err();

    assert!(matches!(err, DocfieldError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_openai_stalled_reply_body_is_upstream_unavailable() {
    // --- 1. Arrange ---
    setup_tracing();
    // Headers arrive at once, then the body stops short of its content-length.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 64 * 1024];
        let _ = socket.read(&mut request).await;
        let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 1000\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(br#"{"choices": [{"mess"#).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });
    let provider = OpenAiProvider::new(
        format!("http://{address}{CHAT_PATH}"),
        None,
        "gpt-5-nano".to_string(),
        Duration::from_millis(500),
    )
    .unwrap();
    let extractor = FieldExtractor::new(Box::new(provider));

    // --- 2. Act ---
    let err = extractor
        .extract_fields(&page_image(), &fields(&["date"]))
        .await
        .unwrap_err();

    // --- 3. Assert ---
    assert!(
        matches!(err, DocfieldError::UpstreamUnavailable(_)),
        "expected UpstreamUnavailable, got {err:?}"
    );
    server.abort();
}

#[tokio::test]
async fn test_openai_empty_or_undecodable_reply_is_invalid() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = openai_extractor(&server, Duration::from_secs(5))
        .extract_fields(&page_image(), &fields(&["date"]))
        .await
        .unwrap_err();
    assert!(matches!(err, DocfieldError::ModelResponseInvalid(_)));

    server.reset().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = openai_extractor(&server, Duration::from_secs(5))
        .extract_fields(&page_image(), &fields(&["date"]))
        .await
        .unwrap_err();
    assert!(matches!(err, DocfieldError::ModelResponseInvalid(_)));
}

#[tokio::test]
async fn test_gemini_extraction_and_language_detection() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    let endpoint = "/v1beta/models/gemini-2.0-flash:generateContent";
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(query_param("key", "g-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"amount\": {\"value\": 1250.5, \"confidence\": 0.9}}" }] }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(query_param("key", "g-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Vietnamese" }] } }]
        })))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(
        Some(format!("{}{endpoint}", server.uri())),
        "g-key".to_string(),
        "gemini-2.0-flash".to_string(),
        Duration::from_secs(5),
    )
    .unwrap();
    let extractor = FieldExtractor::new(Box::new(provider));

    // --- 2. Act ---
    let extracted = extractor
        .extract_fields(&page_image(), &fields(&["amount"]))
        .await
        .unwrap();
    let language = extractor.detect_language(&page_image()).await.unwrap();

    // --- 3. Assert ---
    assert_eq!(extracted.len(), 1);
    assert_eq!(extracted[0].value, "1250.5");
    assert_eq!(language, "vi");
}
