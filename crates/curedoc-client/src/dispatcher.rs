use async_trait::async_trait;
use curedoc_types::{AnswerRequest, AnswerResponse, AskRequest, AskResponse, ErrorBody, UploadResponse};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Raw HTTP reply handed back by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Carries requests to the CureBot service.
///
/// Only network-level failures are errors here; status codes and bodies
/// are interpreted by [`Dispatcher`]. Futures need not be `Send` since the
/// browser runs everything on one thread.
#[async_trait(?Send)]
pub trait Transport {
    /// Platform handle for an image picked by the user
    type Image;

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply, ClientError>;

    /// Multipart upload with an `image` part and, when given, `prompt` and
    /// `query` parts carrying the same text
    async fn post_image(&self, url: &str, image: &Self::Image, prompt: Option<&str>) -> Result<HttpReply, ClientError>;
}

/// The remote operations, used to pick the error turn shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ask,
    Upload,
    Answer,
}

impl Operation {
    /// Assistant turn shown when this operation fails
    pub fn error_turn(&self, error: &ClientError) -> String {
        match self {
            Operation::Ask => {
                "Sorry, I encountered an error processing your request. Please try again.".to_string()
            }
            Operation::Answer => "Sorry, there was an error processing your answers.".to_string(),
            Operation::Upload => {
                let detail = match error {
                    ClientError::Network(msg) => msg.as_str(),
                    other => other.server_message().unwrap_or("Failed to analyze image"),
                };
                format!("Error: {}", detail)
            }
        }
    }
}

/// Issues the remote operations, one round trip each, no retries
pub struct Dispatcher<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn ask(&self, query: &str) -> Result<AskResponse, ClientError> {
        let body = to_json(&AskRequest { query: query.to_string() })?;
        log::debug!("POST /ask ({} chars)", query.len());

        let reply = self.transport.post_json(&self.config.endpoint("ask"), &body).await;
        decode(reply, Operation::Ask)
    }

    pub async fn upload(&self, image: &T::Image, prompt: Option<&str>) -> Result<UploadResponse, ClientError> {
        let prompt = prompt.map(str::trim).filter(|p| !p.is_empty());
        log::debug!("POST /upload (prompt: {})", prompt.is_some());

        let reply = self
            .transport
            .post_image(&self.config.endpoint("upload"), image, prompt)
            .await;
        decode(reply, Operation::Upload)
    }

    pub async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, ClientError> {
        let body = to_json(request)?;
        log::debug!("POST /answer ({} follow-ups)", request.followups.len());

        let reply = self.transport.post_json(&self.config.endpoint("answer"), &body).await;
        decode(reply, Operation::Answer)
    }
}

fn to_json<B: serde::Serialize>(body: &B) -> Result<serde_json::Value, ClientError> {
    serde_json::to_value(body).map_err(|e| ClientError::Malformed(e.to_string()))
}

fn decode<R: DeserializeOwned>(reply: Result<HttpReply, ClientError>, op: Operation) -> Result<R, ClientError> {
    let reply = reply.map_err(|e| {
        log::error!("{:?} request failed: {}", op, e);
        e
    })?;

    if !reply.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&reply.body).ok().map(|b| b.error);
        log::warn!("{:?} returned HTTP {}: {:?}", op, reply.status, message);
        return Err(ClientError::Status { status: reply.status, message });
    }

    serde_json::from_str(&reply.body).map_err(|e| {
        log::warn!("{:?} returned an unexpected body: {}", op, e);
        ClientError::Malformed(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    /// Answers every request with the same reply and records the URL and body
    struct CannedTransport {
        reply: Result<HttpReply, String>,
        seen: RefCell<Vec<(String, serde_json::Value)>>,
    }

    impl CannedTransport {
        fn replying(status: u16, body: serde_json::Value) -> Self {
            Self {
                reply: Ok(HttpReply::new(status, body.to_string())),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn reply(&self) -> Result<HttpReply, ClientError> {
            self.reply.clone().map_err(ClientError::Network)
        }
    }

    #[async_trait(?Send)]
    impl Transport for CannedTransport {
        type Image = String;

        async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpReply, ClientError> {
            self.seen.borrow_mut().push((url.to_string(), body.clone()));
            self.reply()
        }

        async fn post_image(&self, url: &str, image: &String, prompt: Option<&str>) -> Result<HttpReply, ClientError> {
            self.seen
                .borrow_mut()
                .push((url.to_string(), json!({ "image": image, "prompt": prompt })));
            self.reply()
        }
    }

    #[tokio::test]
    async fn test_ask_posts_query() {
        let transport = CannedTransport::replying(200, json!({"response": "rest", "followups": ["How long?"]}));
        let dispatcher = Dispatcher::new(transport, ClientConfig::default());

        let reply = dispatcher.ask("headache").await.unwrap();
        assert_eq!(reply.response, "rest");
        assert_eq!(reply.followups, vec!["How long?".to_string()]);

        let seen = dispatcher.transport.seen.borrow();
        assert_eq!(seen[0].0, "http://localhost:5009/ask");
        assert_eq!(seen[0].1, json!({"query": "headache"}));
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let transport = CannedTransport::replying(400, json!({"error": "No image uploaded"}));
        let dispatcher = Dispatcher::new(transport, ClientConfig::default());

        let err = dispatcher.upload(&"scan.png".to_string(), None).await.unwrap_err();
        assert_eq!(err.server_message(), Some("No image uploaded"));
        assert_eq!(Operation::Upload.error_turn(&err), "Error: No image uploaded");
    }

    #[tokio::test]
    async fn test_blank_prompt_is_not_sent() {
        let transport = CannedTransport::replying(200, json!({"session_id": "s", "result": "ok"}));
        let dispatcher = Dispatcher::new(transport, ClientConfig::default());

        dispatcher.upload(&"scan.png".to_string(), Some("   ")).await.unwrap();
        let seen = dispatcher.transport.seen.borrow();
        assert_eq!(seen[0].1["prompt"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let transport = CannedTransport::replying(200, json!({"unexpected": true}));
        let dispatcher = Dispatcher::new(transport, ClientConfig::default());

        let err = dispatcher.ask("q").await.unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let dispatcher = Dispatcher::new(CannedTransport::failing("connection refused"), ClientConfig::default());

        let err = dispatcher.ask("q").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(
            Operation::Ask.error_turn(&err),
            "Sorry, I encountered an error processing your request. Please try again."
        );
        assert_eq!(Operation::Upload.error_turn(&err), "Error: connection refused");
    }

    #[test]
    fn test_upload_error_without_server_message() {
        let err = ClientError::Status { status: 500, message: None };
        assert_eq!(Operation::Upload.error_turn(&err), "Error: Failed to analyze image");
        assert_eq!(
            Operation::Answer.error_turn(&err),
            "Sorry, there was an error processing your answers."
        );
    }
}
