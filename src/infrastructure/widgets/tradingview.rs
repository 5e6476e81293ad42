#[cfg(test)]
#[path = "tradingview_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::WidgetEmbed;

const EMBED_BASE_URL: &str = "https://s3.tradingview.com/external-embedding";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSymbol {
    pub symbol: String,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChartArgs {
    pub symbol: String,
    #[serde(default)]
    pub comparison_symbols: Vec<ComparisonSymbol>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolArgs {
    pub symbol: String,
}

fn theme() -> String {
    return Config::get(ConfigKey::WidgetTheme);
}

fn embed(script: &str, options: Value) -> WidgetEmbed {
    return WidgetEmbed::TradingView {
        script_url: format!("{EMBED_BASE_URL}/{script}"),
        options,
    };
}

pub fn stock_chart(args: &StockChartArgs) -> WidgetEmbed {
    let compare_symbols = args
        .comparison_symbols
        .iter()
        .map(|entry| {
            return json!({
                "symbol": entry.symbol,
                "position": entry.position,
            });
        })
        .collect::<Vec<Value>>();

    return embed(
        "embed-widget-advanced-chart.js",
        json!({
            "autosize": true,
            "symbol": args.symbol,
            "compareSymbols": compare_symbols,
            "interval": "D",
            "timezone": "Etc/UTC",
            "theme": theme(),
            "style": "1",
            "locale": "en",
            "allow_symbol_change": true,
        }),
    );
}

pub fn stock_price(args: &SymbolArgs) -> WidgetEmbed {
    return embed(
        "embed-widget-symbol-overview.js",
        json!({
            "symbols": [[args.symbol]],
            "chartOnly": false,
            "colorTheme": theme(),
            "autosize": true,
            "showVolume": false,
            "hideDateRanges": false,
            "hideMarketStatus": false,
            "hideSymbolLogo": false,
            "scalePosition": "right",
            "scaleMode": "Normal",
            "locale": "en",
        }),
    );
}

pub fn stock_financials(args: &SymbolArgs) -> WidgetEmbed {
    return embed(
        "embed-widget-financials.js",
        json!({
            "symbol": args.symbol,
            "colorTheme": theme(),
            "displayMode": "regular",
            "isTransparent": false,
            "autosize": true,
            "locale": "en",
        }),
    );
}

pub fn stock_news(args: &SymbolArgs) -> WidgetEmbed {
    return embed(
        "embed-widget-timeline.js",
        json!({
            "feedMode": "symbol",
            "symbol": args.symbol,
            "colorTheme": theme(),
            "isTransparent": false,
            "displayMode": "regular",
            "autosize": true,
            "locale": "en",
        }),
    );
}

pub fn stock_screener() -> WidgetEmbed {
    return embed(
        "embed-widget-screener.js",
        json!({
            "defaultColumn": "overview",
            "defaultScreen": "most_capitalized",
            "market": "india",
            "showToolbar": true,
            "colorTheme": theme(),
            "autosize": true,
            "locale": "en",
        }),
    );
}

pub fn market_overview() -> WidgetEmbed {
    return embed(
        "embed-widget-market-overview.js",
        json!({
            "colorTheme": theme(),
            "dateRange": "12M",
            "showChart": true,
            "isTransparent": false,
            "showSymbolLogo": true,
            "showFloatingTooltip": false,
            "autosize": true,
            "locale": "en",
        }),
    );
}

pub fn market_heatmap() -> WidgetEmbed {
    return embed(
        "embed-widget-stock-heatmap.js",
        json!({
            "exchanges": [],
            "dataSource": "SENSEX",
            "grouping": "sector",
            "blockSize": "market_cap_basic",
            "blockColor": "change",
            "colorTheme": theme(),
            "hasTopBar": false,
            "isZoomEnabled": true,
            "hasSymbolTooltip": true,
            "autosize": true,
            "locale": "en",
        }),
    );
}

pub fn etf_heatmap() -> WidgetEmbed {
    return embed(
        "embed-widget-etf-heatmap.js",
        json!({
            "dataSource": "AllUSEtf",
            "grouping": "asset_class",
            "blockSize": "aum",
            "blockColor": "change",
            "colorTheme": theme(),
            "hasTopBar": false,
            "isZoomEnabled": true,
            "hasSymbolTooltip": true,
            "autosize": true,
            "locale": "en",
        }),
    );
}

pub fn trending_stocks() -> WidgetEmbed {
    return embed(
        "embed-widget-hotlists.js",
        json!({
            "exchange": "BSE",
            "colorTheme": theme(),
            "dateRange": "12M",
            "showChart": true,
            "showSymbolLogo": false,
            "showFloatingTooltip": false,
            "autosize": true,
            "locale": "en",
        }),
    );
}
