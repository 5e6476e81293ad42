use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::Role;
use super::ToolCall;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.to_string(),
            tool_calls: None,
            tool_call_id: None,
        };
    }

    /// The assistant half of a tool exchange, carrying the call itself.
    pub fn new_tool_call(call: &ToolCall) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            text: "".to_string(),
            tool_calls: Some(vec![call.clone()]),
            tool_call_id: None,
        };
    }

    /// The tool half of a tool exchange, holding the result payload as JSON
    /// text so it can be replayed to a backend verbatim.
    pub fn new_tool_result(call: &ToolCall, result: &Value) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            role: Role::Tool,
            text: result.to_string(),
            tool_calls: None,
            tool_call_id: Some(call.id.to_string()),
        };
    }

    pub fn append(&mut self, text: &str) {
        self.text += text;
    }
}
