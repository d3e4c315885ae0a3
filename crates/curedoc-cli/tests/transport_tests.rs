mod fixtures;

use curedoc_cli::{ImageFile, ReqwestTransport};
use curedoc_client::types::AnswerRequest;
use curedoc_client::{ClientError, Dispatcher};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scan() -> ImageFile {
    ImageFile {
        name: "scan.png".to_string(),
        mime: "image/png".to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

#[tokio::test]
async fn test_ask_sends_query_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({"query": "persistent cough"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "How long has it lasted?",
            "followups": ["How many days?"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(ReqwestTransport::new(), fixtures::config_for(&server));
    let reply = dispatcher.ask("persistent cough").await.unwrap();
    assert_eq!(reply.followups, vec!["How many days?".to_string()]);
}

#[tokio::test]
async fn test_answer_sends_parallel_lists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .and(body_json(json!({
            "query": "cough",
            "followups": ["How many days?", "Any fever?"],
            "responses": ["five", "no"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "s-42",
            "final_solution": "Likely viral, rest and fluids.",
            "pdf_download": "/download/pdf/s-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(ReqwestTransport::new(), fixtures::config_for(&server));
    let request = AnswerRequest {
        query: "cough".to_string(),
        followups: vec!["How many days?".to_string(), "Any fever?".to_string()],
        responses: vec!["five".to_string(), "no".to_string()],
    };
    let reply = dispatcher.answer(&request).await.unwrap();
    assert_eq!(reply.session_id, "s-42");
    assert_eq!(reply.pdf_download.as_deref(), Some("/download/pdf/s-42"));
}

#[tokio::test]
async fn test_upload_is_multipart_with_prompt_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains(r#"name="image"; filename="scan.png""#))
        .and(body_string_contains(r#"name="prompt""#))
        .and(body_string_contains(r#"name="query""#))
        .and(body_string_contains("is this a fracture?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "img-7",
            "result": "No fracture visible."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(ReqwestTransport::new(), fixtures::config_for(&server));
    let reply = dispatcher.upload(&scan(), Some("is this a fracture?")).await.unwrap();
    assert_eq!(reply.session_id, "img-7");
    assert_eq!(reply.pdf_download, None);
}

#[tokio::test]
async fn test_upload_without_prompt_sends_only_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "img-8",
            "result": "ok"
        })))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(ReqwestTransport::new(), fixtures::config_for(&server));
    dispatcher.upload(&scan(), None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    assert!(body.contains(r#"name="image""#));
    assert!(!body.contains(r#"name="prompt""#));
    assert!(!body.contains(r#"name="query""#));
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Unsupported file type"})))
        .mount(&server)
        .await;

    let dispatcher = Dispatcher::new(ReqwestTransport::new(), fixtures::config_for(&server));
    let err = dispatcher.upload(&scan(), None).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 400, .. }));
    assert_eq!(err.server_message(), Some("Unsupported file type"));
}

#[tokio::test]
async fn test_fetch_bytes_checks_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/pdf/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/pdf/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Session not found"})))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let bytes = transport
        .fetch_bytes(&format!("{}/download/pdf/s-1", server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-1.4".to_vec());

    let err = transport
        .fetch_bytes(&format!("{}/download/pdf/missing", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.server_message(), Some("Session not found"));
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let dispatcher = Dispatcher::new(
        ReqwestTransport::new(),
        curedoc_client::ClientConfig::new("http://127.0.0.1:9"),
    );
    let err = dispatcher.ask("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}
