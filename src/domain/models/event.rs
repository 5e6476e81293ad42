use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ToolName;
use super::WidgetNode;

/// Everything the dispatcher can emit while answering one submission. Events
/// are forwarded to the page as server-sent events in the order they are
/// produced here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatEvent {
    Session { id: String },
    Delta { text: String },
    WidgetPending { id: String, tool: ToolName },
    Widget { node: WidgetNode },
    Caption { id: String, text: String },
    ErrorCard { message: String },
    Done,
}

impl ChatEvent {
    /// The SSE event name the payload travels under.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::Session { .. } => return "session",
            ChatEvent::Delta { .. } => return "delta",
            ChatEvent::WidgetPending { .. } => return "widget-pending",
            ChatEvent::Widget { .. } => return "widget",
            ChatEvent::Caption { .. } => return "caption",
            ChatEvent::ErrorCard { .. } => return "error-card",
            ChatEvent::Done => return "done",
        }
    }
}
