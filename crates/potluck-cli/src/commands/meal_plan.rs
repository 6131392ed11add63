use anyhow::{Context, Result};
use potluck::configuration::ChatSettings;
use potluck::meal_plan::run_meal_plan;
use potluck::sink::Console;

use crate::render::MarkdownConsole;

pub async fn execute(plain: bool) -> Result<()> {
    let settings = ChatSettings::load().context("Chat deployment is not configured")?;

    cliclack::intro(console::style(" potluck ").on_cyan().black())?;
    let result = if plain {
        run_meal_plan(settings, &mut Console::stdout()).await?
    } else {
        run_meal_plan(settings, &mut MarkdownConsole::new()).await?
    };
    cliclack::outro(format!("{} replies", result.replies().count()))?;
    Ok(())
}
