#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use chrono::Local;
use chrono::SecondsFormat;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::json;
use serde_json::Value;

use super::Message;
use super::Role;
use super::ToolCall;
use super::WidgetNode;

/// An append-only transcript for one chat session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: &str) -> Conversation {
        return Conversation {
            id: id.to_string(),
            created_at: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            messages: vec![],
        };
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Appends the call and its result as one paired entry. The two halves
    /// always land adjacent, there is no path that records one without the
    /// other.
    pub fn record_tool_exchange(&mut self, call: &ToolCall, result: &Value) {
        self.messages.push(Message::new_tool_call(call));
        self.messages.push(Message::new_tool_result(call, result));
    }

    /// Serializes the transcript to chat completions wire messages, with the
    /// given system prompt in front. Tool call arguments travel as JSON text
    /// per the wire format.
    pub fn to_wire(&self, system_prompt: &str) -> Vec<Value> {
        let mut wire = vec![json!({
            "role": Role::System,
            "content": system_prompt,
        })];

        for message in &self.messages {
            if let Some(calls) = &message.tool_calls {
                let entries = calls
                    .iter()
                    .map(|call| {
                        return json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name.to_string(),
                                "arguments": call.arguments.to_string(),
                            }
                        });
                    })
                    .collect::<Vec<Value>>();

                wire.push(json!({
                    "role": Role::Assistant,
                    "content": "",
                    "tool_calls": entries,
                }));
                continue;
            }

            if let Some(call_id) = &message.tool_call_id {
                wire.push(json!({
                    "role": Role::Tool,
                    "tool_call_id": call_id,
                    "content": message.text,
                }));
                continue;
            }

            wire.push(json!({
                "role": message.role,
                "content": message.text,
            }));
        }

        return wire;
    }
}

/// One renderable entry in a rebuilt session, either a plain text bubble or a
/// finished widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SessionNode {
    Text { role: Role, text: String },
    Widget { node: WidgetNode },
}

/// The UI view of a session, as served to a page reloading mid-conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub created_at: String,
    pub nodes: Vec<SessionNode>,
}
