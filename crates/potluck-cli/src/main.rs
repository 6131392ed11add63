use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current temperature in a city
    Weather {
        /// City name, e.g. "New York"
        city: String,
    },

    /// Let a meal planner and a groceries shopper plan a weekend together
    #[command(name = "meal-plan")]
    MealPlan {
        /// Print replies as plain text instead of highlighted markdown
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the transcript on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Weather { city } => commands::weather::execute(&city).await,
        Command::MealPlan { plain } => commands::meal_plan::execute(plain).await,
    }
}
