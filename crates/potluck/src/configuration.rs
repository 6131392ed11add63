//! Settings read from environment variables (optionally seeded from a `.env` file).
use config::{Config, Environment};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::providers::configs::{AzureAuth, AzureOpenAiProviderConfig};
use crate::providers::token::{
    ClientSecretCredential, StaticToken, COGNITIVE_SERVICES_SCOPE, DEFAULT_AUTHORITY_HOST,
};
use crate::weather::{WeatherConfig, DEFAULT_WEATHER_HOST};

const CHAT_PREFIX: &str = "AZURE_OPENAI";
const ENTRA_PREFIX: &str = "AZURE";
const WEATHER_PREFIX: &str = "API_NINJAS";

/// Explicit variables used instead of the process environment
pub type EnvMap = HashMap<String, String>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{env_var}' is required but not set.")]
    MissingEnvVar { env_var: String },

    #[error("No credential configured for Azure OpenAI: set AZURE_OPENAI_API_KEY or AZURE_OPENAI_AD_TOKEN, or provide AZURE_TENANT_ID with AZURE_CLIENT_ID and AZURE_CLIENT_SECRET")]
    MissingCredential,

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

fn to_env_var(prefix: &str, field: &str) -> String {
    format!("{}_{}", prefix, field.to_uppercase())
}

fn load<T: DeserializeOwned>(prefix: &str, source: Option<&EnvMap>) -> Result<T, ConfigError> {
    // Values stay strings; typed fields are converted on deserialize.
    let mut environment = Environment::with_prefix(prefix).prefix_separator("_");
    if let Some(map) = source {
        environment = environment.source(Some(
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        ));
    }

    let config = Config::builder().add_source(environment).build()?;

    match config.try_deserialize() {
        Ok(settings) => Ok(settings),
        Err(err) => {
            tracing::debug!("Configuration error: {:?}", &err);

            let error_str = err.to_string();
            if error_str.starts_with("missing field") {
                // Extract field name from error message "missing field `endpoint`"
                let field = error_str
                    .trim_start_matches("missing field `")
                    .trim_end_matches('`');
                Err(ConfigError::MissingEnvVar {
                    env_var: to_env_var(prefix, field),
                })
            } else if let config::ConfigError::NotFound(field) = &err {
                Err(ConfigError::MissingEnvVar {
                    env_var: to_env_var(prefix, field),
                })
            } else {
                Err(ConfigError::Other(err))
            }
        }
    }
}

fn require(prefix: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingEnvVar {
            env_var: to_env_var(prefix, field),
        });
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct EntraSettings {
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    authority_host: Option<String>,
}

/// Chat deployment settings, from `AZURE_OPENAI_*` plus the `AZURE_*` client credentials
#[derive(Debug, Deserialize)]
pub struct ChatSettings {
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub ad_token: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
    #[serde(skip)]
    entra: EntraSettings,
}

impl ChatSettings {
    /// Read the process environment, after loading `.env` if present
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::build(None)
    }

    pub fn from_source(source: &EnvMap) -> Result<Self, ConfigError> {
        Self::build(Some(source))
    }

    fn build(source: Option<&EnvMap>) -> Result<Self, ConfigError> {
        let mut settings: ChatSettings = load(CHAT_PREFIX, source)?;
        require(CHAT_PREFIX, "endpoint", &settings.endpoint)?;
        require(CHAT_PREFIX, "deployment", &settings.deployment)?;
        require(CHAT_PREFIX, "api_version", &settings.api_version)?;
        settings.entra = load(ENTRA_PREFIX, source)?;
        Ok(settings)
    }

    /// Pick the credential: static key, then pre-obtained token, then client credentials
    fn auth(&self) -> Result<AzureAuth, ConfigError> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(&self.api_key) {
            return Ok(AzureAuth::ApiKey(key));
        }
        if let Some(token) = non_empty(&self.ad_token) {
            return Ok(AzureAuth::Bearer(Arc::new(StaticToken::new(token))));
        }

        let entra = &self.entra;
        match (
            non_empty(&entra.tenant_id),
            non_empty(&entra.client_id),
            non_empty(&entra.client_secret),
        ) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                let authority = non_empty(&entra.authority_host)
                    .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
                Ok(AzureAuth::Bearer(Arc::new(ClientSecretCredential::new(
                    &authority,
                    &tenant_id,
                    client_id,
                    client_secret,
                    COGNITIVE_SERVICES_SCOPE,
                ))))
            }
            _ => Err(ConfigError::MissingCredential),
        }
    }

    pub fn into_provider_config(self) -> Result<AzureOpenAiProviderConfig, ConfigError> {
        let auth = self.auth()?;
        let mut config =
            AzureOpenAiProviderConfig::new(self.endpoint, self.deployment, self.api_version, auth);
        if let Some(model) = self.model.filter(|m| !m.trim().is_empty()) {
            config.model = model;
        }
        config.temperature = self.temperature;
        config.max_tokens = self.max_tokens;
        Ok(config)
    }
}

fn default_weather_host() -> String {
    DEFAULT_WEATHER_HOST.to_string()
}

/// Weather provider settings, from `API_NINJAS_*`
#[derive(Debug, Deserialize)]
pub struct WeatherSettings {
    pub api_key: String,
    #[serde(default = "default_weather_host")]
    pub host: String,
}

impl WeatherSettings {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::build(None)
    }

    pub fn from_source(source: &EnvMap) -> Result<Self, ConfigError> {
        Self::build(Some(source))
    }

    fn build(source: Option<&EnvMap>) -> Result<Self, ConfigError> {
        let settings: WeatherSettings = load(WEATHER_PREFIX, source)?;
        require(WEATHER_PREFIX, "api_key", &settings.api_key)?;
        Ok(settings)
    }

    pub fn into_config(self) -> WeatherConfig {
        WeatherConfig::new(self.host, self.api_key)
    }
}
