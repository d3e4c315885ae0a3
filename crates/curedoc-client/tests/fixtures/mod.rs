use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use curedoc_client::{ClientConfig, ClientError, ClientState, Dispatcher, HttpReply, MemoryStore, Transport};
use serde_json::Value;

/// A request the scripted transport received
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRequest {
    pub url: String,
    pub body: Value,
}

/// Transport that plays back queued replies in order
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<HttpReply, ClientError>>>,
    pub seen: RefCell<Vec<SeenRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_json(self, status: u16, body: Value) -> Self {
        self.replies
            .borrow_mut()
            .push_back(Ok(HttpReply::new(status, body.to_string())));
        self
    }

    pub fn then_network_error(self, message: &str) -> Self {
        self.replies
            .borrow_mut()
            .push_back(Err(ClientError::Network(message.to_string())));
        self
    }

    pub fn request_count(&self) -> usize {
        self.seen.borrow().len()
    }

    fn next(&self, url: &str, body: Value) -> Result<HttpReply, ClientError> {
        self.seen.borrow_mut().push(SeenRequest { url: url.to_string(), body });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Network("no scripted reply left".to_string())))
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    type Image = String;

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, ClientError> {
        self.next(url, body.clone())
    }

    async fn post_image(&self, url: &str, image: &String, prompt: Option<&str>) -> Result<HttpReply, ClientError> {
        self.next(url, serde_json::json!({ "image": image, "prompt": prompt }))
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 14, 5, 9).unwrap()
}

pub fn fresh_client(transport: ScriptedTransport) -> (Dispatcher<ScriptedTransport>, ClientState<MemoryStore>) {
    let config = ClientConfig::default();
    let state = ClientState::load(MemoryStore::new(), &config).expect("memory store never fails");
    (Dispatcher::new(transport, config), state)
}
