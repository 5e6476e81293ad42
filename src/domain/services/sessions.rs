#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::models::Conversation;
use crate::domain::models::Message;
use crate::domain::models::SessionNode;
use crate::domain::models::SessionSnapshot;
use crate::domain::models::ToolCall;
use crate::domain::models::ToolName;
use crate::domain::models::WidgetEmbed;
use crate::domain::models::WidgetNode;
use crate::infrastructure::widgets::WidgetManager;

static SESSIONS: Lazy<Sessions> = Lazy::new(Sessions::new);

/// In-memory conversation store. Sessions live for the lifetime of the
/// process and are addressed by short ids handed to the page.
pub struct Sessions {
    store: DashMap<String, Conversation>,
}

impl Default for Sessions {
    fn default() -> Sessions {
        return Sessions::new();
    }
}

impl Sessions {
    pub fn new() -> Sessions {
        return Sessions {
            store: DashMap::new(),
        };
    }

    pub fn global() -> &'static Sessions {
        return &SESSIONS;
    }

    pub fn create_id() -> String {
        return Uuid::new_v4()
            .to_string()
            .split('-')
            .enumerate()
            .filter_map(|(idx, str)| {
                if idx > 1 {
                    return None;
                }
                return Some(str);
            })
            .collect::<Vec<&str>>()
            .join("-");
    }

    /// Resolves the session a submission belongs to, creating one when the
    /// page sends no id or an id this process has never seen.
    pub fn ensure(&self, id: Option<String>) -> String {
        if let Some(id) = id {
            if !id.is_empty() {
                self.store
                    .entry(id.to_string())
                    .or_insert_with(|| return Conversation::new(&id));
                return id;
            }
        }

        let id = Sessions::create_id();
        self.store.insert(id.to_string(), Conversation::new(&id));
        return id;
    }

    pub fn exists(&self, id: &str) -> bool {
        return self.store.contains_key(id);
    }

    pub fn append(&self, id: &str, message: Message) {
        if let Some(mut conversation) = self.store.get_mut(id) {
            conversation.append(message);
        }
    }

    pub fn record_tool_exchange(&self, id: &str, call: &ToolCall, result: &Value) {
        if let Some(mut conversation) = self.store.get_mut(id) {
            conversation.record_tool_exchange(call, result);
        }
    }

    /// A point-in-time copy of the transcript, safe to serialize or walk
    /// while other submissions mutate the store.
    pub fn conversation(&self, id: &str) -> Option<Conversation> {
        return self.store.get(id).map(|conversation| {
            return conversation.clone();
        });
    }

    /// Rebuilds the renderable view of a session from its recorded entries,
    /// pairing each tool call with the result that follows it. Error cards
    /// are never recorded, so they do not reappear here.
    pub fn snapshot(&self, id: &str) -> Option<SessionSnapshot> {
        let conversation = self.conversation(id)?;

        let messages = conversation.messages();
        let mut nodes: Vec<SessionNode> = vec![];

        for (idx, message) in messages.iter().enumerate() {
            if let Some(calls) = &message.tool_calls {
                let result = messages
                    .get(idx + 1)
                    .filter(|next| return next.tool_call_id.is_some())
                    .map(|next| return next.text.to_string())
                    .unwrap_or_default();

                if let Some(call) = calls.first() {
                    if let Some(node) = rebuild_widget(call, &result) {
                        nodes.push(SessionNode::Widget { node });
                    }
                }
                continue;
            }

            if message.tool_call_id.is_some() {
                continue;
            }

            if !message.text.is_empty() {
                nodes.push(SessionNode::Text {
                    role: message.role,
                    text: message.text.to_string(),
                });
            }
        }

        return Some(SessionSnapshot {
            id: conversation.id.to_string(),
            created_at: conversation.created_at.to_string(),
            nodes,
        });
    }
}

fn rebuild_widget(call: &ToolCall, result: &str) -> Option<WidgetNode> {
    if call.name == ToolName::ShowSearchResults {
        let recorded: Value = serde_json::from_str(result).ok()?;
        let answer = recorded["answer"].as_str().unwrap_or_default().to_string();
        let summary = recorded["summary"].as_str().unwrap_or_default().to_string();

        return Some(WidgetNode::new(
            call.name,
            WidgetEmbed::SearchResults { answer, summary },
        ));
    }

    return WidgetManager::build(call)
        .ok()
        .map(|(embed, _)| return WidgetNode::new(call.name, embed));
}
