use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The author role of a message as understood by chat completion APIs
pub enum Role {
    User,
    Assistant,
}
