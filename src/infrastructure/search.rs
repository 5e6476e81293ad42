#[cfg(test)]
#[path = "search_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SearchRequest {
    q: String,
    hl: String,
    gl: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct AnswerBoxResponse {
    #[serde(default)]
    snippet: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct OrganicResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SearchResponse {
    #[serde(default, rename = "answerBox")]
    answer_box: Option<AnswerBoxResponse>,
    #[serde(default)]
    organic: Vec<OrganicResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub answer: String,
    pub urls: Vec<String>,
    pub summary: String,
}

pub struct SearchClient {
    url: String,
    token: String,
}

impl Default for SearchClient {
    fn default() -> SearchClient {
        return SearchClient {
            url: Config::get(ConfigKey::SerpURL),
            token: Config::get(ConfigKey::SerpToken),
        };
    }
}

impl SearchClient {
    pub fn new(url: String, token: String) -> SearchClient {
        return SearchClient { url, token };
    }

    /// The search tool only joins the tool menu when a Serper token is
    /// configured.
    pub fn is_enabled(&self) -> bool {
        return !self.token.is_empty();
    }

    /// Runs one web search and condenses it to a direct answer plus the top
    /// result links.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        if self.token.is_empty() {
            bail!("Serper token is not defined");
        }

        let req = SearchRequest {
            q: query.to_string(),
            hl: "en".to_string(),
            gl: "in".to_string(),
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/search", url = self.url))
            .header("X-API-KEY", &self.token)
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make search request to Serper"
            );
            bail!("Failed to make search request to Serper");
        }

        let sres = res.json::<SearchResponse>().await?;

        let answer = sres
            .answer_box
            .map(|answer_box| return answer_box.snippet)
            .filter(|snippet| return !snippet.is_empty())
            .unwrap_or_else(|| return "No direct answer found.".to_string());

        let urls = sres
            .organic
            .iter()
            .take(3)
            .map(|result| return result.link.to_string())
            .collect::<Vec<String>>();

        let summary = if urls.is_empty() {
            "No results found.".to_string()
        } else {
            urls.iter()
                .enumerate()
                .map(|(idx, url)| return format!("{}. {url}", idx + 1))
                .collect::<Vec<String>>()
                .join("\n")
        };

        return Ok(SearchResults {
            answer,
            urls,
            summary,
        });
    }
}
