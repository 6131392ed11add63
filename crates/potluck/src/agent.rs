use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::message::Message;
use crate::providers::base::Provider;
use crate::team::TeamMessage;

/// A participant in a team conversation: given the history so far, produce the next message
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique name of the participant, used as the message source
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Produce the next message. `history` holds every message of the run so far,
    /// starting with the task.
    async fn reply(&self, history: &[TeamMessage]) -> Result<TeamMessage>;
}

/// Agent integrates a chat completion provider with a fixed set of instructions
pub struct AssistantAgent {
    name: String,
    description: String,
    system_message: String,
    provider: Arc<dyn Provider>,
}

impl AssistantAgent {
    pub fn new<N, S>(name: N, system_message: S, provider: Arc<dyn Provider>) -> Self
    where
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: "An agent that provides assistance.".to_string(),
            system_message: system_message.into(),
            provider,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn system_message(&self) -> &str {
        &self.system_message
    }

    /// The model sees its own earlier turns as assistant messages and
    /// everybody else's as named user messages
    fn model_context(&self, history: &[TeamMessage]) -> Vec<Message> {
        history
            .iter()
            .map(|entry| {
                if entry.source == self.name {
                    Message::assistant().with_text(entry.message.text())
                } else {
                    Message::user()
                        .with_text(entry.message.text())
                        .with_name(&entry.source)
                }
            })
            .collect()
    }
}

#[async_trait]
impl Agent for AssistantAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn reply(&self, history: &[TeamMessage]) -> Result<TeamMessage> {
        let context = self.model_context(history);
        tracing::debug!(agent = %self.name, messages = context.len(), "requesting completion");

        let (message, usage) = self
            .provider
            .complete(&self.system_message, &context)
            .await
            .with_context(|| format!("{} failed to produce a reply", self.name))?;

        Ok(TeamMessage::new(&self.name, message.with_name(&self.name)).with_usage(usage))
    }
}
