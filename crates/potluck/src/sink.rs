//! Destinations for a team's message stream.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use console::style;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::io::{self, Write};

use crate::providers::base::Usage;
use crate::team::{TaskResult, TeamEvent, TeamMessage};

/// Consumes a team's event stream as it is produced
#[async_trait]
pub trait MessageSink: Send {
    /// Called once per message, in stream order
    fn on_message(&mut self, message: &TeamMessage) -> Result<()>;

    /// Called once the run is complete
    fn on_finished(&mut self, _result: &TaskResult) -> Result<()> {
        Ok(())
    }

    /// Drain the stream into this sink. Returns only once the stream is
    /// exhausted; a stream error is returned after every earlier message has
    /// been delivered.
    async fn consume<'a>(
        &mut self,
        mut stream: BoxStream<'a, Result<TeamEvent>>,
    ) -> Result<TaskResult> {
        let mut finished = None;
        while let Some(event) = stream.next().await {
            match event? {
                TeamEvent::Message(message) => self.on_message(&message)?,
                TeamEvent::Finished(result) => {
                    self.on_finished(&result)?;
                    finished = Some(result);
                }
            }
        }
        finished.ok_or_else(|| anyhow!("Stream ended before the run finished"))
    }
}

/// Renders each message under a header naming its source
pub struct Console<W: Write + Send> {
    writer: W,
    styled: bool,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            writer: io::stdout(),
            styled: console::colors_enabled(),
        }
    }
}

impl<W: Write + Send> Console<W> {
    /// A console without terminal styling
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            styled: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub fn render_header<W: Write>(writer: &mut W, source: &str, styled: bool) -> io::Result<()> {
    let header = format!("---------- {} ----------", source);
    writeln!(writer, "{}", style(header).bold().cyan().force_styling(styled))
}

pub fn render_summary<W: Write>(writer: &mut W, result: &TaskResult, styled: bool) -> io::Result<()> {
    let mut usage = Usage::default();
    for message in &result.messages {
        if let Some(message_usage) = &message.usage {
            usage.accumulate(message_usage);
        }
    }

    writeln!(
        writer,
        "{}",
        style(format!("Stop reason: {}", result.stop_reason))
            .dim()
            .force_styling(styled)
    )?;
    if let (Some(input), Some(output)) = (usage.input_tokens, usage.output_tokens) {
        writeln!(
            writer,
            "{}",
            style(format!(
                "Total prompt tokens: {}, total completion tokens: {}",
                input, output
            ))
            .dim()
            .force_styling(styled)
        )?;
    }
    Ok(())
}

impl<W: Write + Send> MessageSink for Console<W> {
    fn on_message(&mut self, message: &TeamMessage) -> Result<()> {
        render_header(&mut self.writer, &message.source, self.styled)?;
        writeln!(self.writer, "{}", message.message.text().trim())?;
        self.writer.flush()?;
        Ok(())
    }

    fn on_finished(&mut self, result: &TaskResult) -> Result<()> {
        render_summary(&mut self.writer, result, self.styled)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every delivered message in memory
#[derive(Debug, Default)]
pub struct Transcript {
    pub messages: Vec<TeamMessage>,
}

impl MessageSink for Transcript {
    fn on_message(&mut self, message: &TeamMessage) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use crate::team::StopReason;

    fn events(fail_after_first: bool) -> BoxStream<'static, Result<TeamEvent>> {
        let task = TeamMessage::new("user", Message::user().with_text("Plan dinner"));
        let reply = TeamMessage::new("planner", Message::assistant().with_text("  Steak.\n"))
            .with_usage(Usage::new(Some(7), Some(3), Some(10)));
        let last: Result<TeamEvent> = if fail_after_first {
            Err(anyhow!("backend failed"))
        } else {
            Ok(TeamEvent::Finished(TaskResult {
                messages: vec![task.clone(), reply.clone()],
                stop_reason: StopReason::MaxTurns(1),
            }))
        };
        Box::pin(futures::stream::iter(vec![
            Ok(TeamEvent::Message(task)),
            Ok(TeamEvent::Message(reply)),
            last,
        ]))
    }

    #[tokio::test]
    async fn test_console_renders_transcript() -> Result<()> {
        let mut console = Console::new(Vec::new());
        let result = console.consume(events(false)).await?;
        assert_eq!(result.stop_reason, StopReason::MaxTurns(1));

        let output = String::from_utf8(console.into_inner())?;
        assert_eq!(
            output,
            "---------- user ----------\n\
             Plan dinner\n\
             ---------- planner ----------\n\
             Steak.\n\
             Stop reason: Maximum number of turns 1 reached.\n\
             Total prompt tokens: 7, total completion tokens: 3\n"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_console_keeps_output_before_error() {
        let mut console = Console::new(Vec::new());
        let err = console.consume(events(true)).await.unwrap_err();
        assert!(err.to_string().contains("backend failed"));

        let output = String::from_utf8(console.into_inner()).unwrap();
        assert!(output.contains("---------- planner ----------\nSteak.\n"));
        assert!(!output.contains("Stop reason"));
    }

    #[tokio::test]
    async fn test_transcript_collects_messages() -> Result<()> {
        let mut transcript = Transcript::default();
        transcript.consume(events(false)).await?;
        let sources: Vec<_> = transcript.messages.iter().map(|m| m.source.as_str()).collect();
        assert_eq!(sources, vec!["user", "planner"]);
        Ok(())
    }
}
