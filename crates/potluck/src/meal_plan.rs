//! The weekend meal planning conversation: a planner proposes, a shopper lists ingredients.
use anyhow::{Context, Result};
use indoc::indoc;
use std::sync::Arc;

use crate::agent::{Agent, AssistantAgent};
use crate::configuration::ChatSettings;
use crate::providers::azure::AzureOpenAiProvider;
use crate::providers::base::Provider;
use crate::sink::MessageSink;
use crate::team::{RoundRobinTeam, TaskResult};

pub const MEAL_PLANNER: &str = "meal_planner";
pub const GROCERIES_SHOPPER: &str = "groceries_shopper";

/// One reply from each agent, then stop
pub const MAX_TURNS: usize = 2;

pub const MEAL_PLANNER_SYSTEM_MESSAGE: &str = indoc! {"
    You are helpful AI assistant, specialist in creating nutritious and delicious meal plans.
    You are a culinary enthusiast dedicated to promoting healthy eating habits, you have extensive knowledge of nutrition and a passion for crafting delightful meals.
    Your meal plan will include breakfast, lunch and dinner with nutritional information for each meal.
    You will not plan for snacks.
"};

pub const GROCERIES_SHOPPER_SYSTEM_MESSAGE: &str = indoc! {"
    You are helpful AI assistant, specialist in making sure that all ingredients are readily available for cooking.
    You are a meticulous organizer with a keen eye for detail, you excel at sourcing high-quality ingredients and ensuring the pantry is always stocked.
    You will wait for meal_planner to create meal plan, and then you will create a comprehensive shopping list with quantities and specific items needed for the weekend meal plan.
"};

pub const TASK: &str = indoc! {"
    Create a weekend meal plan for 55 years adult that balances nutrition and taste. One day it will be 'pasta' day, the other day will be 'stake' day.
"};

/// The planner speaks first, the shopper second
pub fn build_team(provider: Arc<dyn Provider>) -> Result<RoundRobinTeam> {
    let meal_planner: Arc<dyn Agent> = Arc::new(
        AssistantAgent::new(MEAL_PLANNER, MEAL_PLANNER_SYSTEM_MESSAGE, Arc::clone(&provider))
            .with_description("Creates nutritious breakfast, lunch and dinner plans."),
    );
    let groceries_shopper: Arc<dyn Agent> = Arc::new(
        AssistantAgent::new(GROCERIES_SHOPPER, GROCERIES_SHOPPER_SYSTEM_MESSAGE, provider)
            .with_description("Turns a meal plan into a shopping list."),
    );

    RoundRobinTeam::new(vec![meal_planner, groceries_shopper], MAX_TURNS)
}

/// Run the conversation on an already built provider
pub async fn run_with_provider<S: MessageSink>(
    provider: Arc<dyn Provider>,
    sink: &mut S,
) -> Result<TaskResult> {
    provider
        .authorize()
        .await
        .context("Failed to obtain credentials for the chat deployment")?;

    let mut team = build_team(provider)?;
    sink.consume(team.run_stream(TASK)).await
}

/// Build the chat client from settings and stream the conversation into `sink`.
///
/// Configuration and credential problems are reported before any message
/// reaches the sink.
pub async fn run_meal_plan<S: MessageSink>(settings: ChatSettings, sink: &mut S) -> Result<TaskResult> {
    let config = settings
        .into_provider_config()
        .context("Invalid chat deployment configuration")?;
    tracing::debug!(deployment = %config.deployment, model = %config.model, "configured chat client");

    let provider: Arc<dyn Provider> = Arc::new(AzureOpenAiProvider::new(config)?);
    run_with_provider(provider, sink).await
}
