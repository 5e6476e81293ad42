#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ChatEvent;
use crate::domain::models::CompletionOutcome;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::ToolCall;
use crate::domain::models::ToolName;
use crate::domain::models::WidgetEmbed;
use crate::domain::models::WidgetNode;
use crate::domain::services::prompts;
use crate::domain::services::CaptionService;
use crate::domain::services::Sessions;
use crate::infrastructure::search::SearchClient;
use crate::infrastructure::widgets::WidgetManager;

pub struct ChatService {}

impl ChatService {
    /// Runs one user submission end to end: records the turn, streams the
    /// completion, and dispatches whichever tool the model selects. Backend
    /// and tool failures surface as error cards rather than errors, and the
    /// stream always closes with a done event.
    pub async fn submit(
        backend: &BackendBox,
        search: &SearchClient,
        sessions: &Sessions,
        session_id: &str,
        text: &str,
        tx: &mpsc::UnboundedSender<ChatEvent>,
    ) -> Result<()> {
        sessions.append(session_id, Message::new(Role::User, text));

        if !backend.has_credentials() {
            tx.send(ChatEvent::ErrorCard {
                message: missing_key_card(backend.name().credential_env()),
            })?;
            tx.send(ChatEvent::Done)?;
            return Ok(());
        }

        let conversation = match sessions.conversation(session_id) {
            Some(conversation) => conversation,
            None => {
                tx.send(ChatEvent::Done)?;
                return Ok(());
            }
        };

        let prompt = BackendPrompt::new(
            Config::get(ConfigKey::Model),
            conversation.to_wire(prompts::SYSTEM_PROMPT),
            ToolName::menu(search.is_enabled()),
        );

        let outcome = match backend.stream_completion(prompt, tx).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = ?err, "completion request failed");
                tx.send(ChatEvent::ErrorCard {
                    message: failure_card(backend.name().credential_env(), &err),
                })?;
                tx.send(ChatEvent::Done)?;
                return Ok(());
            }
        };

        match outcome {
            CompletionOutcome::Message(reply) => {
                if !reply.is_empty() {
                    sessions.append(session_id, Message::new(Role::Assistant, &reply));
                }
            }
            CompletionOutcome::ToolCall(call) => {
                let res =
                    ChatService::dispatch_tool(backend, search, sessions, session_id, call, tx)
                        .await;

                if let Err(err) = res {
                    tracing::error!(error = ?err, "tool dispatch failed");
                    tx.send(ChatEvent::ErrorCard {
                        message: format!("Error: {err}"),
                    })?;
                }
            }
        }

        tx.send(ChatEvent::Done)?;
        return Ok(());
    }

    /// Renders the selected tool: placeholder first, then the finished widget
    /// once the arguments parse and the exchange is recorded, then the
    /// caption. Nothing is recorded when the arguments are rejected.
    async fn dispatch_tool(
        backend: &BackendBox,
        search: &SearchClient,
        sessions: &Sessions,
        session_id: &str,
        call: ToolCall,
        tx: &mpsc::UnboundedSender<ChatEvent>,
    ) -> Result<()> {
        let node_id = Uuid::new_v4().to_string();
        tx.send(ChatEvent::WidgetPending {
            id: node_id.to_string(),
            tool: call.name,
        })?;

        let (embed, result) = build_widget(search, &call).await?;

        sessions.record_tool_exchange(session_id, &call, &result);

        tx.send(ChatEvent::Widget {
            node: WidgetNode {
                id: node_id.to_string(),
                tool: call.name,
                embed,
            },
        })?;

        // Search cards carry their own text and are not captioned.
        if call.name != ToolName::ShowSearchResults {
            let caption = CaptionService::generate(backend, sessions, session_id, &call).await;
            if !caption.is_empty() {
                tx.send(ChatEvent::Caption {
                    id: node_id,
                    text: caption,
                })?;
            }
        }

        return Ok(());
    }
}

fn missing_key_card(key: &str) -> String {
    return format!("{key} is missing. Pass it using the appropriate environment variable. Try restarting the application if you recently changed your environment variables.");
}

/// Backend failures that mention the credential key collapse into the same
/// card the upfront check produces.
fn failure_card(key: &str, err: &anyhow::Error) -> String {
    let text = format!("{err:?}");
    if text.contains(key) {
        return missing_key_card(key);
    }

    return format!("The backend failed with the following error: {text}");
}

/// Search builds its widget from live results, everything else builds from
/// the call arguments alone.
async fn build_widget(search: &SearchClient, call: &ToolCall) -> Result<(WidgetEmbed, Value)> {
    if call.name != ToolName::ShowSearchResults {
        return WidgetManager::build(call);
    }

    let query = call.arguments["query"].as_str().unwrap_or_default();
    if query.is_empty() {
        bail!("invalid arguments for {name}", name = call.name);
    }

    let results = search.search(query).await?;
    let embed = WidgetEmbed::SearchResults {
        answer: results.answer.to_string(),
        summary: results.summary.to_string(),
    };

    return Ok((embed, serde_json::to_value(&results)?));
}
