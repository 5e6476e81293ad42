#[cfg(test)]
#[path = "tool_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::json;
use serde_json::Value;
use strum::EnumIter;
use strum::IntoEnumIterator;
use uuid::Uuid;

/// The fixed menu of tools offered to the model. Each variant maps to one
/// widget the chat page knows how to render.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, EnumIter, strum::Display)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ToolName {
    ShowStockChart,
    ShowStockPrice,
    ShowStockFinancials,
    ShowStockNews,
    ShowStockScreener,
    ShowMarketOverview,
    ShowMarketHeatmap,
    #[strum(serialize = "showETFHeatmap")]
    #[serde(rename = "showETFHeatmap")]
    ShowEtfHeatmap,
    ShowTrendingStocks,
    ShowTrendlyneWidget,
    ShowSearchResults,
}

impl ToolName {
    pub fn parse(text: &str) -> Option<ToolName> {
        return ToolName::iter().find(|name| return name.to_string() == text);
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::ShowStockChart => return "Show a stock chart of a given stock. Optionally show 2 or more stocks. Use this to show the chart to the user.",
            ToolName::ShowStockPrice => return "Show the price of a given stock. Use this to show the price and price history to the user.",
            ToolName::ShowStockFinancials => return "Show the financials of a given stock. Use this to show the financials to the user.",
            ToolName::ShowStockNews => return "This tool shows the latest news and events for a stock or cryptocurrency.",
            ToolName::ShowStockScreener => return "This tool shows a generic stock screener which can be used to find new stocks based on financial or technical parameters.",
            ToolName::ShowMarketOverview => return "This tool shows an overview of today's stock, futures, bond, and forex market performance including change values, Open, High, Low, and Close values.",
            ToolName::ShowMarketHeatmap => return "This tool shows a heatmap of today's stock market performance across sectors. It is preferred over showMarketOverview if asked specifically about the stock market.",
            ToolName::ShowEtfHeatmap => return "This tool shows a heatmap of today's ETF performance across sectors and asset classes. It is preferred over showMarketOverview if asked specifically about the ETF market.",
            ToolName::ShowTrendingStocks => return "This tool shows the daily top trending stocks including the top five gaining, losing, and most active stocks based on today's performance.",
            ToolName::ShowTrendlyneWidget => return "Displays a Trendlyne widget for a specific stock symbol and widget type.",
            ToolName::ShowSearchResults => return "Search the web for information on a given topic when no other tool matches the request.",
        }
    }

    fn parameters(&self) -> Value {
        match self {
            ToolName::ShowStockChart => {
                return json!({
                    "type": "object",
                    "properties": {
                        "symbol": {
                            "type": "string",
                            "description": "The name or symbol of the stock or currency. e.g. DOGE/PAYTM/INR."
                        },
                        "comparisonSymbols": {
                            "type": "array",
                            "description": "Optional list of symbols to compare. e.g. [\"BSE:PAYTM\", \"BSE:SWIGGY\"]",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "symbol": { "type": "string" },
                                    "position": { "type": "string", "enum": ["SameScale"] }
                                },
                                "required": ["symbol", "position"]
                            },
                            "default": []
                        }
                    },
                    "required": ["symbol"]
                });
            }
            ToolName::ShowStockPrice | ToolName::ShowStockFinancials | ToolName::ShowStockNews => {
                return json!({
                    "type": "object",
                    "properties": {
                        "symbol": {
                            "type": "string",
                            "description": "The name or symbol of the stock or currency. e.g. DOGE/PAYTM/INR."
                        }
                    },
                    "required": ["symbol"]
                });
            }
            ToolName::ShowTrendlyneWidget => {
                return json!({
                    "type": "object",
                    "properties": {
                        "stockSymbol": {
                            "type": "string",
                            "description": "The stock symbol, e.g., SWIGGY"
                        },
                        "widgetType": {
                            "type": "string",
                            "enum": ["swot", "technical", "qvt", "checklist"],
                            "description": "The type of widget to display"
                        },
                        "theme": {
                            "type": "string",
                            "description": "The theme for the widget. Defaults to \"light\".",
                            "default": "light"
                        }
                    },
                    "required": ["stockSymbol", "widgetType"]
                });
            }
            ToolName::ShowSearchResults => {
                return json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query string, e.g., \"latest news on stock market\"."
                        }
                    },
                    "required": ["query"]
                });
            }
            _ => {
                return json!({
                    "type": "object",
                    "properties": {}
                });
            }
        }
    }

    pub fn schema(&self) -> Value {
        return json!({
            "type": "function",
            "function": {
                "name": self.to_string(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        });
    }

    /// The tool list sent with every completion request. Web search needs a
    /// separate API credential, so it is only offered when one is configured.
    pub fn menu(include_search: bool) -> Vec<Value> {
        return ToolName::iter()
            .filter(|name| return include_search || *name != ToolName::ShowSearchResults)
            .map(|name| return name.schema())
            .collect();
    }
}

/// A single tool selection streamed back by the model, with its arguments
/// already decoded from the accumulated JSON fragments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: ToolName,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: ToolName, arguments: Value) -> ToolCall {
        return ToolCall {
            id: Uuid::new_v4().to_string(),
            name,
            arguments,
        };
    }
}
