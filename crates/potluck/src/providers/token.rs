use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

/// Audience requested for Azure OpenAI bearer tokens
pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Tokens this close to expiry are treated as expired, capped at half the token lifetime
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Supplies short-lived bearer tokens for a remote service
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// A token obtained out of band, forwarded as is
pub struct StaticToken(String);

impl StaticToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
struct TokenData {
    access_token: String,
    refresh_at: DateTime<Utc>,
}

impl TokenData {
    fn new(access_token: String, expires_in: i64) -> Self {
        let expires_in = expires_in.max(0);
        let margin = EXPIRY_MARGIN_SECS.min(expires_in / 2);
        Self {
            access_token,
            refresh_at: Utc::now() + Duration::seconds(expires_in - margin),
        }
    }

    fn is_fresh(&self) -> bool {
        self.refresh_at > Utc::now()
    }
}

/// OAuth2 client credentials grant against a Microsoft Entra tenant.
///
/// The token is cached in memory for the lifetime of this value and only
/// requested again once it is about to expire.
pub struct ClientSecretCredential {
    client: Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: Mutex<Option<TokenData>>,
}

impl ClientSecretCredential {
    pub fn new(
        authority_host: &str,
        tenant_id: &str,
        client_id: String,
        client_secret: String,
        scope: &str,
    ) -> Self {
        let token_endpoint = format!(
            "{}/{}/oauth2/v2.0/token",
            authority_host.trim_end_matches('/'),
            tenant_id
        );
        Self {
            client: Client::new(),
            token_endpoint,
            client_id,
            client_secret,
            scope: scope.to_string(),
            cache: Mutex::new(None),
        }
    }

    async fn request_token(&self) -> Result<TokenData> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        tracing::debug!(endpoint = %self.token_endpoint, "requesting bearer token");
        let resp = self
            .client
            .post(&self.token_endpoint)
            .form(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_text = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Failed to obtain bearer token ({}): {}",
                status,
                err_text
            ));
        }

        let token_response: Value = resp.json().await?;
        let access_token = token_response
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("access_token not found in token response"))?
            .to_string();

        let expires_in = token_response
            .get("expires_in")
            .and_then(|v| v.as_i64().or_else(|| v.as_str()?.parse().ok()))
            .unwrap_or(3600);

        Ok(TokenData::new(access_token, expires_in))
    }
}

#[async_trait]
impl TokenProvider for ClientSecretCredential {
    async fn token(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;
        if let Some(token_data) = cache.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token_data.access_token.clone());
        }

        let token_data = self.request_token().await?;
        let access_token = token_data.access_token.clone();
        *cache = Some(token_data);
        Ok(access_token)
    }
}
