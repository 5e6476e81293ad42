#[cfg(test)]
#[path = "captions_test.rs"]
mod tests;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ToolCall;
use crate::domain::models::ToolName;
use crate::domain::services::prompts;
use crate::domain::services::Sessions;

pub struct CaptionService {}

impl CaptionService {
    /// Generates the commentary shown under a finished widget. The request
    /// carries the full transcript, recorded tool exchange included, so the
    /// model sees what it just rendered. Failures are swallowed, a widget
    /// with no caption still renders.
    pub async fn generate(
        backend: &BackendBox,
        sessions: &Sessions,
        session_id: &str,
        call: &ToolCall,
    ) -> String {
        if call.name == ToolName::ShowTrendlyneWidget {
            return prompts::trendlyne_caption(&call.arguments);
        }

        let conversation = match sessions.conversation(session_id) {
            Some(conversation) => conversation,
            None => return String::new(),
        };

        let messages = conversation.to_wire(&prompts::caption_system_prompt(call));
        let prompt = BackendPrompt::new(CaptionService::model(), messages, vec![]);

        match backend.completion(prompt).await {
            Ok(text) => return text,
            Err(err) => {
                tracing::debug!(error = ?err, "caption request failed");
                return String::new();
            }
        }
    }

    /// Captions read their own model key so a cheaper model can caption while
    /// a stronger one converses.
    fn model() -> String {
        let model = Config::get(ConfigKey::CaptionModel);
        if !model.is_empty() {
            return model;
        }

        return Config::get(ConfigKey::Model);
    }
}
