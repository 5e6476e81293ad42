use std::fmt;

use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Who authored a conversation entry. Spellings match the chat completions
/// wire format so entries can be replayed to a backend as-is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => return "system",
            Role::User => return "user",
            Role::Assistant => return "assistant",
            Role::Tool => return "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.as_str());
    }
}
