#[cfg(test)]
#[path = "trendlyne_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::domain::models::WidgetEmbed;

const WIDGET_SCRIPT_URL: &str = "https://cdn-static.trendlyne.com/static/js/webwidgets/tl-widgets.js";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WidgetType {
    Swot,
    Technical,
    Qvt,
    Checklist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendlyneArgs {
    pub stock_symbol: String,
    pub widget_type: WidgetType,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    return "light".to_string();
}

/// Trendlyne identifies stocks without the exchange prefix models tend to
/// produce, so a leading `BSE:` or `NSE:` is dropped.
fn clean_stock_symbol(symbol: &str) -> &str {
    for prefix in ["BSE:", "NSE:"] {
        if let Some(stripped) = symbol.strip_prefix(prefix) {
            return stripped;
        }
    }

    return symbol;
}

pub fn widget_url(widget_type: WidgetType, symbol: &str) -> String {
    let cleaned = clean_stock_symbol(symbol);
    return format!("https://trendlyne.com/web-widget/{widget_type}-widget/Inter/{cleaned}/?posCol=00A25B&primaryCol=006AFF&negCol=EB3B00&neuCol=F7941E");
}

pub fn widget(args: &TrendlyneArgs) -> WidgetEmbed {
    return WidgetEmbed::Trendlyne {
        get_url: widget_url(args.widget_type, &args.stock_symbol),
        theme: args.theme.to_string(),
        script_url: WIDGET_SCRIPT_URL.to_string(),
    };
}
