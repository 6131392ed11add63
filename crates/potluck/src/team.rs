use anyhow::{anyhow, Result};
use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::agent::Agent;
use crate::models::message::Message;
use crate::providers::base::Usage;
use crate::termination::TerminationCondition;

/// Source recorded on the task message that opens every run
pub const TASK_SOURCE: &str = "user";

/// One entry of a team conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMessage {
    pub source: String,
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl TeamMessage {
    pub fn new<S: Into<String>>(source: S, message: Message) -> Self {
        Self {
            source: source.into(),
            message,
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The team's turn cap was reached
    MaxTurns(usize),
    /// A termination condition fired with this message
    Condition(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MaxTurns(turns) => write!(f, "Maximum number of turns {} reached.", turns),
            StopReason::Condition(message) => f.write_str(message),
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub messages: Vec<TeamMessage>,
    pub stop_reason: StopReason,
}

impl TaskResult {
    /// Messages written by participants, without the task
    pub fn replies(&self) -> impl Iterator<Item = &TeamMessage> {
        self.messages.iter().filter(|m| m.source != TASK_SOURCE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TeamEvent {
    Message(TeamMessage),
    Finished(TaskResult),
}

/// Participants take turns in a fixed order, each seeing the full history
pub struct RoundRobinTeam {
    participants: Vec<Arc<dyn Agent>>,
    max_turns: usize,
    termination: Option<Box<dyn TerminationCondition>>,
}

impl RoundRobinTeam {
    pub fn new(participants: Vec<Arc<dyn Agent>>, max_turns: usize) -> Result<Self> {
        if participants.is_empty() {
            return Err(anyhow!("A team needs at least one participant"));
        }
        if max_turns == 0 {
            return Err(anyhow!("max_turns must be greater than zero"));
        }
        let mut names = HashSet::new();
        for participant in &participants {
            if !names.insert(participant.name()) || participant.name() == TASK_SOURCE {
                return Err(anyhow!("Duplicate or reserved participant name: {}", participant.name()));
            }
        }

        Ok(Self {
            participants,
            max_turns,
            termination: None,
        })
    }

    /// Allow the run to end before the turn cap
    pub fn with_termination<T: TerminationCondition + 'static>(mut self, condition: T) -> Self {
        self.termination = Some(Box::new(condition));
        self
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|p| p.name())
    }

    /// Run the team on a task, yielding each message as soon as it exists.
    ///
    /// The stream opens with the task message and ends with
    /// [`TeamEvent::Finished`]. If a turn fails the error is yielded and the
    /// stream ends; messages already yielded are not withdrawn.
    pub fn run_stream(&mut self, task: &str) -> BoxStream<'_, Result<TeamEvent>> {
        let task = TeamMessage::new(TASK_SOURCE, Message::user().with_text(task));

        Box::pin(try_stream! {
            if let Some(condition) = self.termination.as_mut() {
                condition.reset();
            }

            let mut history = vec![task.clone()];
            yield TeamEvent::Message(task.clone());

            let mut stop_reason = self
                .termination
                .as_mut()
                .and_then(|condition| condition.check(std::slice::from_ref(&task)))
                .map(StopReason::Condition);

            let mut turn = 0;
            let stop_reason = loop {
                if let Some(reason) = stop_reason.take() {
                    break reason;
                }
                if turn >= self.max_turns {
                    break StopReason::MaxTurns(self.max_turns);
                }

                let speaker = Arc::clone(&self.participants[turn % self.participants.len()]);
                tracing::debug!(turn, speaker = speaker.name(), "taking turn");
                let reply = speaker.reply(&history).await?;
                turn += 1;

                history.push(reply.clone());
                yield TeamEvent::Message(reply.clone());

                stop_reason = self
                    .termination
                    .as_mut()
                    .and_then(|condition| condition.check(std::slice::from_ref(&reply)))
                    .map(StopReason::Condition);
            };

            tracing::debug!(%stop_reason, messages = history.len(), "run finished");
            yield TeamEvent::Finished(TaskResult {
                messages: history,
                stop_reason,
            });
        })
    }

    /// Run the team to completion and return the result
    pub async fn run(&mut self, task: &str) -> Result<TaskResult> {
        let mut stream = self.run_stream(task);
        while let Some(event) = stream.next().await {
            if let TeamEvent::Finished(result) = event? {
                return Ok(result);
            }
        }
        Err(anyhow!("Team stream ended without a result"))
    }
}
