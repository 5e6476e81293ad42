pub mod tradingview;
pub mod trendlyne;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use serde_json::json;
use serde_json::Value;

use crate::domain::models::ToolCall;
use crate::domain::models::ToolName;
use crate::domain::models::WidgetEmbed;

pub struct WidgetManager {}

impl WidgetManager {
    /// Builds the embed descriptor for a tool call, along with the normalized
    /// argument payload recorded as the tool result. Fails when the call
    /// arguments do not match the tool's schema.
    pub fn build(call: &ToolCall) -> Result<(WidgetEmbed, Value)> {
        match call.name {
            ToolName::ShowStockChart => {
                let args: tradingview::StockChartArgs = parse_args(call)?;
                let result = serde_json::to_value(&args)?;
                return Ok((tradingview::stock_chart(&args), result));
            }
            ToolName::ShowStockPrice => {
                let args: tradingview::SymbolArgs = parse_args(call)?;
                let result = serde_json::to_value(&args)?;
                return Ok((tradingview::stock_price(&args), result));
            }
            ToolName::ShowStockFinancials => {
                let args: tradingview::SymbolArgs = parse_args(call)?;
                let result = serde_json::to_value(&args)?;
                return Ok((tradingview::stock_financials(&args), result));
            }
            ToolName::ShowStockNews => {
                let args: tradingview::SymbolArgs = parse_args(call)?;
                let result = serde_json::to_value(&args)?;
                return Ok((tradingview::stock_news(&args), result));
            }
            ToolName::ShowStockScreener => {
                return Ok((tradingview::stock_screener(), json!({})));
            }
            ToolName::ShowMarketOverview => {
                return Ok((tradingview::market_overview(), json!({})));
            }
            ToolName::ShowMarketHeatmap => {
                return Ok((tradingview::market_heatmap(), json!({})));
            }
            ToolName::ShowEtfHeatmap => {
                return Ok((tradingview::etf_heatmap(), json!({})));
            }
            ToolName::ShowTrendingStocks => {
                return Ok((tradingview::trending_stocks(), json!({})));
            }
            ToolName::ShowTrendlyneWidget => {
                let args: trendlyne::TrendlyneArgs = parse_args(call)?;
                let result = serde_json::to_value(&args)?;
                return Ok((trendlyne::widget(&args), result));
            }
            ToolName::ShowSearchResults => {
                bail!("showSearchResults builds from live results, not from arguments")
            }
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> Result<T> {
    return serde_json::from_value(call.arguments.clone())
        .with_context(|| return format!("invalid arguments for {}", call.name));
}
