use anyhow::Result;
use serde_json::json;

use super::SearchClient;

#[tokio::test]
async fn it_summarizes_search_results() -> Result<()> {
    let body = json!({
        "answerBox": {"snippet": "The SENSEX closed 1.2% higher today."},
        "organic": [
            {"title": "Market wrap", "link": "https://example.com/market-wrap"},
            {"title": "SENSEX today", "link": "https://example.com/sensex"},
            {"title": "Top gainers", "link": "https://example.com/gainers"},
            {"title": "Ignored", "link": "https://example.com/fourth"},
        ],
    })
    .to_string();

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/search")
        .match_header("X-API-KEY", "abc")
        .match_body(mockito::Matcher::Json(json!({
            "q": "how did the stock market do today",
            "hl": "en",
            "gl": "in",
        })))
        .with_status(200)
        .with_body(body)
        .create();

    let client = SearchClient::new(server.url(), "abc".to_string());
    let results = client.search("how did the stock market do today").await?;
    mock.assert();

    assert_eq!(results.answer, "The SENSEX closed 1.2% higher today.");
    assert_eq!(results.urls.len(), 3);
    insta::assert_snapshot!(results.summary, @r###"
    1. https://example.com/market-wrap
    2. https://example.com/sensex
    3. https://example.com/gainers
    "###);

    return Ok(());
}

#[tokio::test]
async fn it_falls_back_when_nothing_matches() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/search")
        .with_status(200)
        .with_body("{}")
        .create();

    let client = SearchClient::new(server.url(), "abc".to_string());
    let results = client.search("gibberish query").await?;
    mock.assert();

    assert_eq!(results.answer, "No direct answer found.");
    assert!(results.urls.is_empty());
    assert_eq!(results.summary, "No results found.");

    return Ok(());
}

#[tokio::test]
async fn it_fails_without_a_token() {
    let client = SearchClient::new("http://localhost:9".to_string(), "".to_string());
    let res = client.search("anything").await;

    assert!(res.is_err());
}

#[tokio::test]
async fn it_fails_on_server_errors() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", "/search").with_status(500).create();

    let client = SearchClient::new(server.url(), "abc".to_string());
    let res = client.search("anything").await;
    mock.assert();

    assert!(res.is_err());
}
