use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::models::message::Message;
use crate::providers::base::{Provider, Usage};

/// A recorded completion request: system prompt and visible history
pub type Request = (String, Vec<Message>);

/// A mock provider that returns pre-configured responses for testing
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Result<Message, String>>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Like [`MockProvider::new`] but any entry may be a failure
    pub fn with_results(responses: Vec<Result<Message, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<(Message, Usage)> {
        self.requests
            .lock()
            .unwrap()
            .push((system.to_string(), messages.to_vec()));

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            return Ok((Message::assistant(), Usage::default()));
        }
        match responses.remove(0) {
            Ok(message) => Ok((message, Usage::new(Some(1), Some(1), Some(2)))),
            Err(e) => Err(anyhow!(e)),
        }
    }
}
