//! Integration tests for the remote model gateway against a mock server

use futures::StreamExt;
use wiremock::matchers::{header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docuchat::attachments::Attachment;
use docuchat::config::GatewayConfig;
use docuchat::error::DocuchatError;
use docuchat::gateway::types::FinishReason;
use docuchat::gateway::{ChatContext, Content, ModelGateway};

fn test_gateway(server: &MockServer) -> ModelGateway {
    let config = GatewayConfig {
        api_base: server.uri(),
        model: "test-model".to_string(),
        ..GatewayConfig::default()
    };
    ModelGateway::new(&config).unwrap()
}

#[tokio::test]
async fn test_upload_two_phase_protocol() {
    let server = MockServer::start().await;
    let session_url = format!("{}/upload-session/abc", server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .and(query_param("key", "k1"))
        .and(header("x-goog-upload-protocol", "resumable"))
        .and(header("x-goog-upload-command", "start"))
        .and(header("x-goog-upload-header-content-length", "11"))
        .and(header("x-goog-upload-header-content-type", "text/plain"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-goog-upload-url", session_url.as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/abc"))
        .and(headers("x-goog-upload-command", vec!["upload", "finalize"]))
        .and(header("x-goog-upload-offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "file": {"uri": "files/abc123", "mimeType": "text/plain"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let attachment = Attachment::new("notes.txt", &b"hello world"[..]);

    let mut reports = Vec::new();
    let stored = gateway
        .upload("k1", &attachment, |sent, total| reports.push((sent, total)))
        .await
        .unwrap();

    assert_eq!(stored.uri, "files/abc123");
    assert_eq!(stored.mime_type, "text/plain");

    // Progress starts at zero, ends at the full size, and never goes back.
    assert_eq!(reports.first(), Some(&(0, 11)));
    assert_eq!(reports.last(), Some(&(11, 11)));
    assert!(reports.windows(2).all(|pair| pair[0].0 <= pair[1].0));
}

#[tokio::test]
async fn test_upload_initiation_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let attachment = Attachment::new("notes.txt", &b"hello"[..]);

    let err = gateway
        .upload("k1", &attachment, |_, _| {})
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Upload error"), "got: {message}");
    assert!(message.contains("500"), "got: {message}");
}

#[tokio::test]
async fn test_upload_initiation_without_session_url_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let attachment = Attachment::new("notes.txt", &b"hello"[..]);

    let err = gateway
        .upload("k1", &attachment, |_, _| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no upload session URL"));
}

#[tokio::test]
async fn test_upload_transfer_failure_is_fatal() {
    let server = MockServer::start().await;
    let session_url = format!("{}/upload-session/xyz", server.uri());

    Mock::given(method("POST"))
        .and(path("/upload/v1beta/files"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-goog-upload-url", session_url.as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload-session/xyz"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let attachment = Attachment::new("notes.txt", &b"hello"[..]);

    let err = gateway
        .upload("k1", &attachment, |_, _| {})
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("transfer"), "got: {message}");
    assert!(message.contains("503"), "got: {message}");
}

#[tokio::test]
async fn test_stream_turn_yields_deltas_in_arrival_order() {
    let server = MockServer::start().await;

    let sse_body = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"The report \"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"covers Q3\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\".\"}]},\"finishReason\":\"STOP\"}],\"usageMetadata\":{\"promptTokenCount\":12,\"candidatesTokenCount\":6,\"totalTokenCount\":18}}\n\n",
    );

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(query_param("key", "k1"))
        .and(wiremock::matchers::body_partial_json(serde_json::json!({
            "generationConfig": {"maxOutputTokens": 8192}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let context = ChatContext::new();
    let content = Content::user_text("Summarize");

    let stream = gateway.stream_turn("k1", &context, &content).await.unwrap();
    let deltas: Vec<_> = stream
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|delta| delta.unwrap())
        .collect();

    assert_eq!(deltas.len(), 3);
    let joined: String = deltas.iter().map(|delta| delta.text.as_str()).collect();
    assert_eq!(joined, "The report covers Q3.");
    assert_eq!(deltas[2].finish_reason, Some(FinishReason::Stop));
    assert_eq!(deltas[2].usage.unwrap().total, 18);
}

#[tokio::test]
async fn test_stream_turn_maps_401_to_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let context = ChatContext::new();
    let content = Content::user_text("hi");

    let err = gateway
        .stream_turn("bad", &context, &content)
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err.downcast_ref::<DocuchatError>(),
        Some(DocuchatError::Authentication(_))
    ));
}

#[tokio::test]
async fn test_stream_turn_surfaces_other_failures_as_gateway_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let err = gateway
        .stream_turn("k1", &ChatContext::new(), &Content::user_text("hi"))
        .await
        .err()
        .unwrap();
    assert!(matches!(
        err.downcast_ref::<DocuchatError>(),
        Some(DocuchatError::Gateway(_))
    ));
}

#[tokio::test]
async fn test_count_tokens_returns_estimate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:countTokens"))
        .and(query_param("key", "k1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"totalTokens": 42})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let total = gateway
        .count_tokens("k1", &ChatContext::new(), &Content::user_text("Summarize"))
        .await
        .unwrap();
    assert_eq!(total, 42);
}

#[tokio::test]
async fn test_count_tokens_failure_is_an_error_for_the_caller_to_ignore() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:countTokens"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = test_gateway(&server);
    let result = gateway
        .count_tokens("k1", &ChatContext::new(), &Content::user_text("hi"))
        .await;
    assert!(result.is_err());
}
