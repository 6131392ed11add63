use anyhow::{anyhow, Result};
use bat::PrettyPrinter;
use potluck::sink::{render_header, render_summary, MessageSink};
use potluck::team::{TaskResult, TeamMessage};
use std::io::{self, Write};

/// Console sink that highlights each reply as markdown
pub struct MarkdownConsole {
    styled: bool,
}

impl MarkdownConsole {
    pub fn new() -> Self {
        Self {
            styled: console::colors_enabled(),
        }
    }
}

impl Default for MarkdownConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for MarkdownConsole {
    fn on_message(&mut self, message: &TeamMessage) -> Result<()> {
        let mut stdout = io::stdout();
        render_header(&mut stdout, &message.source, self.styled)?;
        stdout.flush()?;

        let content = format!("{}\n", message.message.text().trim());
        PrettyPrinter::new()
            .input_from_bytes(content.as_bytes())
            .language("markdown")
            .colored_output(self.styled)
            .print()
            .map_err(|e| anyhow!("Failed to render message: {}", e))?;
        Ok(())
    }

    fn on_finished(&mut self, result: &TaskResult) -> Result<()> {
        let mut stdout = io::stdout();
        render_summary(&mut stdout, result, self.styled)?;
        stdout.flush()?;
        Ok(())
    }
}
