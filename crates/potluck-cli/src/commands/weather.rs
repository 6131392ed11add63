use anyhow::{Context, Result};
use cliclack::spinner;
use console::style;
use potluck::configuration::WeatherSettings;
use potluck::weather::WeatherClient;

pub async fn execute(city: &str) -> Result<()> {
    let config = WeatherSettings::load()
        .context("The weather lookup needs API_NINJAS_API_KEY")?
        .into_config();
    let client = WeatherClient::new(config)?;

    let spin = spinner();
    spin.start(format!("looking up {}", city));
    let result = client.get_weather(city).await;
    spin.stop("");

    let sentence = result.with_context(|| format!("Could not get the weather for {}", city))?;
    println!("{}", style(sentence).bold());
    Ok(())
}
