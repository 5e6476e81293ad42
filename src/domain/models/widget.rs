use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::ToolName;

/// Everything the chat page needs to mount a third-party embed. The server
/// never renders widgets itself, it only ships these descriptors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WidgetEmbed {
    TradingView {
        script_url: String,
        options: Value,
    },
    Trendlyne {
        get_url: String,
        theme: String,
        script_url: String,
    },
    SearchResults {
        answer: String,
        summary: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WidgetNode {
    pub id: String,
    pub tool: ToolName,
    pub embed: WidgetEmbed,
}

impl WidgetNode {
    pub fn new(tool: ToolName, embed: WidgetEmbed) -> WidgetNode {
        return WidgetNode {
            id: Uuid::new_v4().to_string(),
            tool,
            embed,
        };
    }
}
