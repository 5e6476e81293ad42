#[cfg(test)]
#[path = "groq_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use uuid::Uuid;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ChatEvent;
use crate::domain::models::CompletionOutcome;
use crate::domain::models::ToolCall;
use crate::domain::models::ToolName;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Model {
    id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModelListResponse {
    data: Vec<Model>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ToolCallFunctionResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ToolCallDeltaResponse {
    index: usize,
    #[serde(default)]
    id: String,
    #[serde(default)]
    function: ToolCallFunctionResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallDeltaResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    delta: CompletionDeltaResponse,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoiceResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageChoiceResponse {
    message: MessageResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageCompletionResponse {
    choices: Vec<MessageChoiceResponse>,
}

/// Accumulates one tool call from the argument fragments spread across
/// stream chunks.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl PendingToolCall {
    fn merge(&mut self, delta: &ToolCallDeltaResponse) {
        if !delta.id.is_empty() {
            self.id = delta.id.to_string();
        }
        if !delta.function.name.is_empty() {
            self.name = delta.function.name.to_string();
        }
        self.arguments += &delta.function.arguments;
    }

    fn into_tool_call(self) -> Result<ToolCall> {
        let name = match ToolName::parse(&self.name) {
            Some(name) => name,
            None => bail!(format!("model selected unknown tool '{}'", self.name)),
        };

        let arguments: Value = if self.arguments.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&self.arguments)?
        };

        let id = if self.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            self.id
        };

        return Ok(ToolCall {
            id,
            name,
            arguments,
        });
    }
}

fn should_retry(res: &Result<reqwest::Response, reqwest::Error>) -> bool {
    return match res {
        Ok(res) => res.status().is_server_error(),
        Err(_) => true,
    };
}

pub struct Groq {
    url: String,
    token: String,
    timeout: String,
}

impl Default for Groq {
    fn default() -> Groq {
        return Groq {
            url: Config::get(ConfigKey::GroqURL),
            token: Config::get(ConfigKey::GroqToken),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for Groq {
    fn name(&self) -> BackendName {
        return BackendName::Groq;
    }

    fn has_credentials(&self) -> bool {
        return !self.token.is_empty();
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Groq URL is not defined");
        }
        if self.token.is_empty() {
            bail!("Groq token is not defined");
        }

        // The hosted API serves nothing useful at the index. When pointed at
        // the real service, skip the check rather than failing on a 404.
        if self.url == "https://api.groq.com/openai" {
            return Ok(());
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if res.is_err() {
            tracing::error!(error = ?res.unwrap_err(), "Groq is not reachable");
            bail!("Groq is not reachable");
        }

        let status = res?.status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "Groq health check failed");
            bail!("Groq health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models<'a>(&'a self) -> Result<Vec<String>> {
        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?
            .json::<ModelListResponse>()
            .await?;

        let mut models: Vec<String> = res
            .data
            .iter()
            .map(|model| {
                return model.id.to_string();
            })
            .collect();

        models.sort();

        return Ok(models);
    }

    #[allow(clippy::implicit_return)]
    async fn stream_completion<'a>(
        &self,
        prompt: BackendPrompt,
        tx: &'a mpsc::UnboundedSender<ChatEvent>,
    ) -> Result<CompletionOutcome> {
        let req = CompletionRequest {
            model: prompt.model,
            messages: prompt.messages,
            tools: prompt.tools,
            stream: true,
        };

        let builder = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req);
        let retry_builder = builder.try_clone();

        let mut call_res = builder.send().await;
        if should_retry(&call_res) {
            if let Some(retry) = retry_builder {
                tracing::warn!("retrying completion request to Groq");
                call_res = retry.send().await;
            }
        }

        let res = call_res?;
        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Groq"
            );
            bail!("Failed to make completion request to Groq");
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        let mut last_message = "".to_string();
        let mut pending_calls: Vec<PendingToolCall> = vec![];
        let mut finish_reason = "".to_string();

        while let Some(line) = lines_reader.next_line().await? {
            let mut cleaned_line = line.trim().to_string();
            if cleaned_line.starts_with("data:") {
                cleaned_line = cleaned_line.split_off(5).trim().to_string();
            }
            if cleaned_line.is_empty() {
                continue;
            }
            if cleaned_line == "[DONE]" {
                break;
            }

            let gres: CompletionResponse = serde_json::from_str(&cleaned_line)?;
            tracing::debug!(body = ?gres, "Completion response");
            if gres.choices.is_empty() {
                continue;
            }

            let choice = &gres.choices[0];
            if let Some(reason) = &choice.finish_reason {
                finish_reason = reason.to_string();
            }

            for delta in &choice.delta.tool_calls {
                while pending_calls.len() <= delta.index {
                    pending_calls.push(PendingToolCall::default());
                }
                pending_calls[delta.index].merge(delta);
            }

            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    last_message += content;
                    tx.send(ChatEvent::Delta {
                        text: content.to_string(),
                    })?;
                }
            }
        }

        if finish_reason == "tool_calls" || !pending_calls.is_empty() {
            // The dispatcher honors a single tool per reply, so only the
            // first selection counts.
            let pending = match pending_calls.into_iter().next() {
                Some(pending) => pending,
                None => bail!("Groq reported a tool call but sent none"),
            };

            return Ok(CompletionOutcome::ToolCall(pending.into_tool_call()?));
        }

        return Ok(CompletionOutcome::Message(last_message));
    }

    #[allow(clippy::implicit_return)]
    async fn completion(&self, prompt: BackendPrompt) -> Result<String> {
        let req = CompletionRequest {
            model: prompt.model,
            messages: prompt.messages,
            tools: prompt.tools,
            stream: false,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Groq"
            );
            bail!("Failed to make completion request to Groq");
        }

        let gres = res.json::<MessageCompletionResponse>().await?;
        let content = gres
            .choices
            .first()
            .and_then(|choice| return choice.message.content.clone())
            .unwrap_or_default();

        return Ok(content.trim().to_string());
    }
}
