use super::role::Role;
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    /// Identity of the author when several participants share one role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created: i64,
    pub content: String,
}

impl Message {
    /// Create a new empty user message with the current timestamp
    pub fn user() -> Self {
        Message {
            role: Role::User,
            name: None,
            created: Utc::now().timestamp(),
            content: String::new(),
        }
    }

    /// Create a new empty assistant message with the current timestamp
    pub fn assistant() -> Self {
        Message {
            role: Role::Assistant,
            name: None,
            created: Utc::now().timestamp(),
            content: String::new(),
        }
    }

    /// Append text to the message
    pub fn with_text<S: AsRef<str>>(mut self, text: S) -> Self {
        self.content.push_str(text.as_ref());
        self
    }

    /// Attribute the message to a named participant
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders() {
        let message = Message::user()
            .with_text("Hello, ")
            .with_text("planner")
            .with_name("user");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.text(), "Hello, planner");
        assert_eq!(message.name.as_deref(), Some("user"));
    }

    #[test]
    fn test_serialization_skips_missing_name() -> anyhow::Result<()> {
        let message = Message::assistant().with_text("Done");
        let value = serde_json::to_value(&message)?;
        assert_eq!(value["role"], json!("assistant"));
        assert_eq!(value["content"], json!("Done"));
        assert!(value.get("name").is_none());
        Ok(())
    }
}
