#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;

use super::ChatEvent;
use super::ToolCall;

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Groq,
    OpenAI,
}

impl BackendName {
    pub fn parse(text: &str) -> Option<BackendName> {
        return BackendName::iter().find(|name| return name.to_string() == text);
    }

    /// The model consumed when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendName::Groq => return "llama3-70b-8192",
            BackendName::OpenAI => return "gpt-4o",
        }
    }

    /// The environment variable holding the backend's API token, named in
    /// error cards when the token is missing.
    pub fn credential_env(&self) -> &'static str {
        match self {
            BackendName::Groq => return "GROQ_API_KEY",
            BackendName::OpenAI => return "OPENAI_API_KEY",
        }
    }
}

/// One fully assembled completion request, wire messages included.
#[derive(Clone, Debug)]
pub struct BackendPrompt {
    pub model: String,
    pub messages: Vec<Value>,
    pub tools: Vec<Value>,
}

impl BackendPrompt {
    pub fn new(model: String, messages: Vec<Value>, tools: Vec<Value>) -> BackendPrompt {
        return BackendPrompt {
            model,
            messages,
            tools,
        };
    }
}

/// How a completion finished, a plain text reply or a tool selection.
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionOutcome {
    Message(String),
    ToolCall(ToolCall),
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// True when an API token is configured. The dispatcher checks this
    /// before making any request so missing credentials surface as an error
    /// card instead of a failed call.
    fn has_credentials(&self) -> bool;

    /// Used at startup to verify all configurations are available to work with
    /// the backend.
    async fn health_check(&self) -> Result<()>;

    /// Provides all available models for the backend.
    async fn list_models<'a>(&'a self) -> Result<Vec<String>>;

    /// Requests a streamed completion from the backend. Text fragments are
    /// passed through the channel as they arrive, while tool call fragments
    /// are accumulated until the stream finishes. The returned outcome is the
    /// assembled result either way.
    async fn stream_completion<'a>(
        &self,
        prompt: BackendPrompt,
        tx: &'a mpsc::UnboundedSender<ChatEvent>,
    ) -> Result<CompletionOutcome>;

    /// Requests a single blocking completion, used for widget captions where
    /// nothing is streamed to the page.
    async fn completion(&self, prompt: BackendPrompt) -> Result<String>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
