use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use super::base::Usage;
use crate::models::message::Message;
use crate::models::role::Role;

/// Convert internal messages to the OpenAI chat completion message spec.
///   participant names travel in the `name` field, which only accepts
///   `[a-zA-Z0-9_-]`, so anything else is replaced with an underscore
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let mut converted = json!({
                "role": message.role,
                "content": message.content,
            });
            if let Some(name) = &message.name {
                converted["name"] = json!(sanitize_name(name));
            }
            converted
        })
        .collect()
}

/// Convert an OpenAI chat completion response to an internal message
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No choices in completion response"))?;

    let text = original
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    Ok(Message {
        role: Role::Assistant,
        name: None,
        created: chrono::Utc::now().timestamp(),
        content: text.to_string(),
    })
}

pub fn get_usage(data: &Value) -> Result<Usage> {
    let usage = data
        .get("usage")
        .ok_or_else(|| anyhow!("No usage data in response"))?;

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Ok(Usage::new(input_tokens, output_tokens, total_tokens))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}
