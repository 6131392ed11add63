use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// Fold another usage report into this one. Counts that neither side
    /// reported stay unknown.
    pub fn accumulate(&mut self, other: &Usage) {
        fn add(a: Option<i32>, b: Option<i32>) -> Option<i32> {
            match (a, b) {
                (None, None) => None,
                (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
            }
        }
        self.input_tokens = add(self.input_tokens, other.input_tokens);
        self.output_tokens = add(self.output_tokens, other.output_tokens);
        self.total_tokens = add(self.total_tokens, other.total_tokens);
    }
}

/// Base trait for chat completion backends
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next message given a system prompt and the visible history
    async fn complete(&self, system: &str, messages: &[Message]) -> Result<(Message, Usage)>;

    /// Resolve credentials ahead of the first completion so that a bad
    /// configuration fails before any output is produced
    async fn authorize(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_serialization() -> Result<()> {
        let usage = Usage::new(Some(10), Some(20), Some(30));
        let serialized = serde_json::to_string(&usage)?;
        let deserialized: Usage = serde_json::from_str(&serialized)?;
        assert_eq!(usage, deserialized);

        let json_value: serde_json::Value = serde_json::from_str(&serialized)?;
        assert_eq!(json_value["input_tokens"], json!(10));
        assert_eq!(json_value["output_tokens"], json!(20));
        assert_eq!(json_value["total_tokens"], json!(30));

        Ok(())
    }

    #[test]
    fn test_usage_accumulate() {
        let mut total = Usage::default();
        total.accumulate(&Usage::new(Some(10), Some(5), Some(15)));
        total.accumulate(&Usage::new(Some(3), None, Some(3)));
        assert_eq!(total, Usage::new(Some(13), Some(5), Some(18)));

        let mut unknown = Usage::default();
        unknown.accumulate(&Usage::default());
        assert_eq!(unknown, Usage::default());
    }
}
