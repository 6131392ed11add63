use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use super::base::{Provider, Usage};
use super::configs::{AzureAuth, AzureOpenAiProviderConfig};
use super::utils::{get_usage, messages_to_openai_spec, openai_response_to_message};
use crate::models::message::Message;

/// Chat completions served from an Azure OpenAI deployment
pub struct AzureOpenAiProvider {
    client: Client,
    config: AzureOpenAiProviderConfig,
}

impl AzureOpenAiProvider {
    pub fn new(config: AzureOpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AzureOpenAiProviderConfig {
        &self.config
    }

    async fn with_auth(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config.auth {
            AzureAuth::ApiKey(key) => Ok(request.header("api-key", key)),
            AzureAuth::Bearer(provider) => {
                let token = provider.token().await?;
                Ok(request.bearer_auth(token))
            }
        }
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = self.config.completions_url();
        tracing::debug!(%url, "sending chat completion request");

        let request = self.with_auth(self.client.post(&url)).await?;
        let response = request.json(&payload).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                Err(anyhow!("Authentication rejected by {}: {}", url, status))
            }
            status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let err_text = response.text().await.unwrap_or_default();
                tracing::warn!(%status, body = %err_text, "chat completion request failed");
                Err(anyhow!("Request failed: {}: {}", status, err_text))
            }
        }
    }
}

#[async_trait]
impl Provider for AzureOpenAiProvider {
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<(Message, Usage)> {
        let mut messages_array = vec![json!({ "role": "system", "content": system })];
        messages_array.extend(messages_to_openai_spec(messages));

        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_array,
        });
        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }
        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }

        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("Azure OpenAI API error: {}", error));
        }

        let message = openai_response_to_message(&response)?;
        let usage = get_usage(&response).unwrap_or_default();

        Ok((message, usage))
    }

    async fn authorize(&self) -> Result<()> {
        if let AzureAuth::Bearer(provider) = &self.config.auth {
            provider.token().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::token::StaticToken;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(text: &str) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        })
    }

    fn config(server: &MockServer, auth: AzureAuth) -> AzureOpenAiProviderConfig {
        AzureOpenAiProviderConfig::new(
            server.uri(),
            "meal-gpt".to_string(),
            "2024-06-01".to_string(),
            auth,
        )
    }

    #[tokio::test]
    async fn test_complete_with_api_key() -> Result<()> {
        let server = MockServer::start().await;

        let system = "You are a helpful assistant.";
        let expected_request_body = json!({
            "model": "meal-gpt",
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": "Hello", "name": "user"}
            ]
        });

        Mock::given(method("POST"))
            .and(path("/openai/deployments/meal-gpt/chat/completions"))
            .and(query_param("api-version", "2024-06-01"))
            .and(header("api-key", "test_key"))
            .and(body_json(expected_request_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hello!")))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            AzureOpenAiProvider::new(config(&server, AzureAuth::ApiKey("test_key".to_string())))?;
        let messages = vec![Message::user().with_text("Hello").with_name("user")];
        let (reply, usage) = provider.complete(system, &messages).await?;

        assert_eq!(reply.text(), "Hello!");
        assert_eq!(usage.total_tokens, Some(27));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_with_bearer_token() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer entra-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Hi")))
            .expect(1)
            .mount(&server)
            .await;

        let auth = AzureAuth::Bearer(Arc::new(StaticToken::new("entra-token")));
        let provider = AzureOpenAiProvider::new(config(&server, auth))?;
        provider.authorize().await?;
        let (reply, _) = provider
            .complete("system", &[Message::user().with_text("Hi?")])
            .await?;
        assert_eq!(reply.text(), "Hi");
        Ok(())
    }

    #[tokio::test]
    async fn test_optional_parameters_are_sent() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(wiremock::matchers::body_partial_json(
                json!({"temperature": 0.5, "max_tokens": 256}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config(&server, AzureAuth::ApiKey("k".to_string()));
        config.temperature = Some(0.5);
        config.max_tokens = Some(256);
        let provider = AzureOpenAiProvider::new(config)?;
        provider
            .complete("system", &[Message::user().with_text("go")])
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad deployment"))
            .mount(&server)
            .await;

        let provider =
            AzureOpenAiProvider::new(config(&server, AzureAuth::ApiKey("k".to_string()))).unwrap();
        let err = provider
            .complete("system", &[Message::user().with_text("go")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad deployment"));
    }

    #[tokio::test]
    async fn test_error_object_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"error": {"code": "content_filter", "message": "filtered"}}),
            ))
            .mount(&server)
            .await;

        let provider =
            AzureOpenAiProvider::new(config(&server, AzureAuth::ApiKey("k".to_string()))).unwrap();
        let err = provider
            .complete("system", &[Message::user().with_text("go")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("content_filter"));
    }
}
