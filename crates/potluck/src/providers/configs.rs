use std::sync::Arc;

use super::token::TokenProvider;

/// How requests to the chat deployment are authenticated
#[derive(Clone)]
pub enum AzureAuth {
    /// Static key sent in the `api-key` header
    ApiKey(String),
    /// Bearer token fetched from a token provider before each request
    Bearer(Arc<dyn TokenProvider>),
}

impl std::fmt::Debug for AzureAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AzureAuth::ApiKey(_) => f.write_str("ApiKey(***)"),
            AzureAuth::Bearer(_) => f.write_str("Bearer(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiProviderConfig {
    pub endpoint: String,
    pub deployment: String,
    pub model: String,
    pub api_version: String,
    pub auth: AzureAuth,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl AzureOpenAiProviderConfig {
    pub fn new(endpoint: String, deployment: String, api_version: String, auth: AzureAuth) -> Self {
        Self {
            endpoint,
            model: deployment.clone(),
            deployment,
            api_version,
            auth,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}
