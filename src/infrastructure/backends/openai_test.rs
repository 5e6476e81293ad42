use anyhow::bail;
use anyhow::Result;
use serde_json::json;
use test_utils::sse_completion_body;
use tokio::sync::mpsc;

use super::CompletionChoiceResponse;
use super::CompletionDeltaResponse;
use super::CompletionResponse;
use super::MessageChoiceResponse;
use super::MessageCompletionResponse;
use super::MessageResponse;
use super::Model;
use super::ModelListResponse;
use super::OpenAI;
use super::ToolCallDeltaResponse;
use super::ToolCallFunctionResponse;
use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ChatEvent;
use crate::domain::models::CompletionOutcome;
use crate::domain::models::ToolName;

impl OpenAI {
    fn with_url(url: String) -> OpenAI {
        return OpenAI {
            url,
            token: "abc".to_string(),
            timeout: "200".to_string(),
        };
    }
}

fn to_delta(event: Option<ChatEvent>) -> Result<String> {
    let text = match event.unwrap() {
        ChatEvent::Delta { text } => text,
        _ => bail!("Wrong type from recv"),
    };

    return Ok(text);
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(200).create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(500).create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_lists_models() -> Result<()> {
    let body = serde_json::to_string(&ModelListResponse {
        data: vec![
            Model {
                id: "gpt-4o".to_string(),
            },
            Model {
                id: "gpt-4o-mini".to_string(),
            },
        ],
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1/models")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.list_models().await?;
    mock.assert();

    assert_eq!(res, vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_streams_completions() -> Result<()> {
    let first_chunk = CompletionResponse {
        choices: vec![CompletionChoiceResponse {
            delta: CompletionDeltaResponse {
                content: Some("Hello ".to_string()),
                tool_calls: vec![],
            },
            finish_reason: None,
        }],
    };
    let second_chunk = CompletionResponse {
        choices: vec![CompletionChoiceResponse {
            delta: CompletionDeltaResponse {
                content: Some("World".to_string()),
                tool_calls: vec![],
            },
            finish_reason: None,
        }],
    };

    let body = sse_completion_body(&[
        serde_json::to_string(&first_chunk)?,
        serde_json::to_string(&second_chunk)?,
    ]);

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let prompt = BackendPrompt::new(
        "gpt-4o".to_string(),
        vec![json!({"role": "user", "content": "Say hi to the world"})],
        vec![],
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<ChatEvent>();

    let backend = OpenAI::with_url(server.url());
    let outcome = backend.stream_completion(prompt, &tx).await?;
    mock.assert();

    assert_eq!(
        outcome,
        CompletionOutcome::Message("Hello World".to_string())
    );
    assert_eq!(to_delta(rx.recv().await)?, "Hello ");
    assert_eq!(to_delta(rx.recv().await)?, "World");

    return Ok(());
}

#[tokio::test]
async fn it_streams_tool_calls() -> Result<()> {
    let opener = CompletionResponse {
        choices: vec![CompletionChoiceResponse {
            delta: CompletionDeltaResponse {
                content: None,
                tool_calls: vec![ToolCallDeltaResponse {
                    index: 0,
                    id: "call_xyz789".to_string(),
                    function: ToolCallFunctionResponse {
                        name: "showTrendlyneWidget".to_string(),
                        arguments: "".to_string(),
                    },
                }],
            },
            finish_reason: None,
        }],
    };
    let arguments = CompletionResponse {
        choices: vec![CompletionChoiceResponse {
            delta: CompletionDeltaResponse {
                content: None,
                tool_calls: vec![ToolCallDeltaResponse {
                    index: 0,
                    id: "".to_string(),
                    function: ToolCallFunctionResponse {
                        name: "".to_string(),
                        arguments: "{\"stockSymbol\":\"SWIGGY\",\"widgetType\":\"swot\"}"
                            .to_string(),
                    },
                }],
            },
            finish_reason: Some("tool_calls".to_string()),
        }],
    };

    let body = sse_completion_body(&[
        serde_json::to_string(&opener)?,
        serde_json::to_string(&arguments)?,
    ]);

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let prompt = BackendPrompt::new(
        "gpt-4o".to_string(),
        vec![json!({"role": "user", "content": "SWOT analysis for SWIGGY"})],
        ToolName::menu(false),
    );

    let (tx, _rx) = mpsc::unbounded_channel::<ChatEvent>();

    let backend = OpenAI::with_url(server.url());
    let outcome = backend.stream_completion(prompt, &tx).await?;
    mock.assert();

    let call = match outcome {
        CompletionOutcome::ToolCall(call) => call,
        _ => bail!("Wrong outcome type"),
    };
    assert_eq!(call.id, "call_xyz789");
    assert_eq!(call.name, ToolName::ShowTrendlyneWidget);
    assert_eq!(
        call.arguments,
        json!({"stockSymbol": "SWIGGY", "widgetType": "swot"})
    );

    return Ok(());
}

#[tokio::test]
async fn it_retries_failed_completion_requests() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .expect(2)
        .create();

    let prompt = BackendPrompt::new(
        "gpt-4o".to_string(),
        vec![json!({"role": "user", "content": "Hello"})],
        vec![],
    );

    let (tx, _rx) = mpsc::unbounded_channel::<ChatEvent>();

    let backend = OpenAI::with_url(server.url());
    let res = backend.stream_completion(prompt, &tx).await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_completes_captions() -> Result<()> {
    let body = serde_json::to_string(&MessageCompletionResponse {
        choices: vec![MessageChoiceResponse {
            message: MessageResponse {
                content: Some("Here is the SWOT analysis for SWIGGY.".to_string()),
            },
        }],
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let prompt = BackendPrompt::new(
        "gpt-4o".to_string(),
        vec![json!({"role": "system", "content": "Describe the widget."})],
        vec![],
    );

    let backend = OpenAI::with_url(server.url());
    let res = backend.completion(prompt).await?;
    mock.assert();

    assert_eq!(res, "Here is the SWOT analysis for SWIGGY.");

    return Ok(());
}
