//! Current temperature for a city, via a geocoding lookup and a weather lookup.
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Number, Value};
use thiserror::Error;

pub const DEFAULT_WEATHER_HOST: &str = "https://api.api-ninjas.com";

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather provider rejected the API key: {0}")]
    Auth(StatusCode),

    #[error("Weather provider returned {status}: {body}")]
    Provider { status: StatusCode, body: String },

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Could not parse weather provider response: {0}")]
    Parse(String),
}

pub type WeatherResult<T> = Result<T, WeatherError>;

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub host: String,
    pub api_key: String,
}

impl WeatherConfig {
    pub fn new(host: String, api_key: String) -> Self {
        Self { host, api_key }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

pub struct WeatherClient {
    client: Client,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> WeatherResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.host.trim_end_matches('/'), path);
        self.client.get(url).header("X-Api-Key", &self.config.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> WeatherResult<Value> {
        let response = request.send().await?;
        let body = check_status(response).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }

    /// Resolve a city name to the coordinates of the provider's first match
    pub async fn geocode(&self, city: &str) -> WeatherResult<Coordinates> {
        tracing::debug!(city, "geocoding");
        let body = self.send(self.get("/v1/city").query(&[("name", city)])).await?;

        let records: Vec<Coordinates> =
            serde_json::from_value(body).map_err(|e| WeatherError::Parse(e.to_string()))?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::CityNotFound(city.to_string()))
    }

    /// Current temperature at the coordinates, exactly as the provider reports it
    pub async fn temperature(&self, coordinates: Coordinates) -> WeatherResult<Number> {
        tracing::debug!(?coordinates, "fetching weather");
        let request = self.get("/v1/weather").query(&[
            ("lat", coordinates.latitude),
            ("lon", coordinates.longitude),
        ]);
        let body = self.send(request).await?;

        match body.get("temp") {
            Some(Value::Number(temp)) => Ok(temp.clone()),
            Some(other) => Err(WeatherError::Parse(format!("temp is not a number: {}", other))),
            None => Err(WeatherError::Parse("missing field `temp`".to_string())),
        }
    }

    pub async fn get_weather(&self, city: &str) -> WeatherResult<String> {
        let coordinates = self.geocode(city).await?;
        let temp = self.temperature(coordinates).await?;
        Ok(format!("Current temperature in {} is {} degrees", city, temp))
    }
}

async fn check_status(response: Response) -> WeatherResult<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            Err(WeatherError::Auth(status))
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "weather provider request failed");
            Err(WeatherError::Provider { status, body })
        }
    }
}
