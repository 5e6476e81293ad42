use std::sync::Arc;
use std::sync::Mutex;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use super::ChatService;
use crate::domain::models::Backend;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::ChatEvent;
use crate::domain::models::CompletionOutcome;
use crate::domain::models::Role;
use crate::domain::models::ToolCall;
use crate::domain::models::ToolName;
use crate::domain::models::WidgetEmbed;
use crate::domain::services::Sessions;
use crate::infrastructure::search::SearchClient;

struct TestBackend {
    credentials: bool,
    deltas: Vec<String>,
    outcome: Option<CompletionOutcome>,
    failure: String,
    caption: Option<String>,
    prompts: Arc<Mutex<Vec<BackendPrompt>>>,
    caption_requests: Arc<Mutex<Vec<BackendPrompt>>>,
}

impl TestBackend {
    fn new(outcome: Option<CompletionOutcome>) -> TestBackend {
        return TestBackend {
            credentials: true,
            deltas: vec![],
            outcome,
            failure: "stream exploded".to_string(),
            caption: Some(String::new()),
            prompts: Arc::new(Mutex::new(vec![])),
            caption_requests: Arc::new(Mutex::new(vec![])),
        };
    }
}

#[async_trait]
impl Backend for TestBackend {
    fn name(&self) -> BackendName {
        return BackendName::Groq;
    }

    fn has_credentials(&self) -> bool {
        return self.credentials;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models<'a>(&'a self) -> Result<Vec<String>> {
        return Ok(vec![]);
    }

    #[allow(clippy::implicit_return)]
    async fn stream_completion<'a>(
        &self,
        prompt: BackendPrompt,
        tx: &'a mpsc::UnboundedSender<ChatEvent>,
    ) -> Result<CompletionOutcome> {
        self.prompts.lock().unwrap().push(prompt);

        for delta in &self.deltas {
            tx.send(ChatEvent::Delta {
                text: delta.to_string(),
            })?;
        }

        match &self.outcome {
            Some(outcome) => return Ok(outcome.clone()),
            None => bail!("{failure}", failure = self.failure),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn completion(&self, prompt: BackendPrompt) -> Result<String> {
        self.caption_requests.lock().unwrap().push(prompt);
        match &self.caption {
            Some(text) => return Ok(text.to_string()),
            None => bail!("caption exploded"),
        }
    }
}

async fn run(backend: TestBackend, search: &SearchClient, text: &str) -> (Vec<ChatEvent>, Sessions, String) {
    let sessions = Sessions::new();
    let id = sessions.ensure(None);

    let boxed: BackendBox = Box::new(backend);
    let (tx, mut rx) = mpsc::unbounded_channel::<ChatEvent>();

    ChatService::submit(&boxed, search, &sessions, &id, text, &tx)
        .await
        .unwrap();
    drop(tx);

    let mut events = vec![];
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    return (events, sessions, id);
}

fn offline_search() -> SearchClient {
    return SearchClient::new("http://localhost".to_string(), String::new());
}

#[tokio::test]
async fn it_replies_with_text() {
    let mut backend = TestBackend::new(Some(CompletionOutcome::Message(
        "Hello! Ask me about BSE stocks.".to_string(),
    )));
    backend.deltas = vec!["Hello! ".to_string(), "Ask me about BSE stocks.".to_string()];
    let prompts = backend.prompts.clone();

    let (events, sessions, id) = run(backend, &offline_search(), "Hi there").await;

    assert_eq!(
        events,
        vec![
            ChatEvent::Delta {
                text: "Hello! ".to_string()
            },
            ChatEvent::Delta {
                text: "Ask me about BSE stocks.".to_string()
            },
            ChatEvent::Done,
        ]
    );

    let messages = sessions.conversation(&id).unwrap().messages().to_vec();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].text, "Hi there");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].text, "Hello! Ask me about BSE stocks.");

    // Search is not configured, so the menu carries the ten widget tools.
    let sent = prompts.lock().unwrap();
    assert_eq!(sent[0].tools.len(), 10);
    assert_eq!(sent[0].messages[0]["role"], "system");
}

#[tokio::test]
async fn it_renders_widgets_and_captions() {
    let call = ToolCall::new(ToolName::ShowStockPrice, json!({"symbol": "BSE:PAYTM"}));
    let mut backend = TestBackend::new(Some(CompletionOutcome::ToolCall(call)));
    backend.caption = Some("The price of PAYTM is above.".to_string());
    let caption_requests = backend.caption_requests.clone();

    let (events, sessions, id) = run(backend, &offline_search(), "Price of PAYTM?").await;

    assert_eq!(events.len(), 4);
    assert_eq!(events[0].name(), "widget-pending");
    assert_eq!(events[1].name(), "widget");
    assert_eq!(events[2].name(), "caption");
    assert_eq!(events[3], ChatEvent::Done);

    let pending_id = match &events[0] {
        ChatEvent::WidgetPending { id, tool } => {
            assert_eq!(*tool, ToolName::ShowStockPrice);
            id.to_string()
        }
        event => panic!("unexpected event: {event:?}"),
    };

    match &events[1] {
        ChatEvent::Widget { node } => {
            assert_eq!(node.id, pending_id);
            assert!(matches!(node.embed, WidgetEmbed::TradingView { .. }));
        }
        event => panic!("unexpected event: {event:?}"),
    }

    match &events[2] {
        ChatEvent::Caption { id, text } => {
            assert_eq!(*id, pending_id);
            assert_eq!(text, "The price of PAYTM is above.");
        }
        event => panic!("unexpected event: {event:?}"),
    }

    // The transcript holds the user turn plus the paired exchange. Captions
    // are page furniture and are never recorded.
    let messages = sessions.conversation(&id).unwrap().messages().to_vec();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].tool_calls.as_ref().unwrap().len(), 1);
    assert_eq!(
        messages[2].tool_call_id,
        Some(messages[1].tool_calls.as_ref().unwrap()[0].id.to_string())
    );

    // The caption request already carried the recorded pair.
    let requests = caption_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let wire = &requests[0].messages;
    assert_eq!(wire.len(), 4);
    assert!(wire[2]["tool_calls"].is_array());
    assert_eq!(wire[3]["role"], "tool");
}

#[tokio::test]
async fn it_renders_error_cards_when_credentials_missing() {
    let mut backend = TestBackend::new(None);
    backend.credentials = false;
    let prompts = backend.prompts.clone();

    let (events, sessions, id) = run(backend, &offline_search(), "Price of PAYTM?").await;

    assert_eq!(
        events,
        vec![
            ChatEvent::ErrorCard {
                message: "GROQ_API_KEY is missing. Pass it using the appropriate environment variable. Try restarting the application if you recently changed your environment variables.".to_string()
            },
            ChatEvent::Done,
        ]
    );

    // The user turn is kept, nothing was sent to the backend.
    let messages = sessions.conversation(&id).unwrap().messages().to_vec();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_skips_empty_captions() {
    let call = ToolCall::new(ToolName::ShowMarketOverview, json!({}));
    let mut backend = TestBackend::new(Some(CompletionOutcome::ToolCall(call)));
    backend.caption = None;

    let (events, sessions, id) = run(backend, &offline_search(), "How is the market?").await;

    let names = events
        .iter()
        .map(|event| return event.name())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["widget-pending", "widget", "done"]);

    // The exchange is still recorded even though the caption failed.
    assert_eq!(sessions.conversation(&id).unwrap().messages().len(), 3);
}

#[tokio::test]
async fn it_rejects_invalid_tool_arguments() {
    let call = ToolCall::new(ToolName::ShowStockChart, json!({"bogus": true}));
    let mut backend = TestBackend::new(Some(CompletionOutcome::ToolCall(call)));
    backend.caption = Some("unused".to_string());
    let caption_requests = backend.caption_requests.clone();

    let (events, sessions, id) = run(backend, &offline_search(), "Chart something").await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].name(), "widget-pending");
    match &events[1] {
        ChatEvent::ErrorCard { message } => {
            assert!(message.starts_with("Error: invalid arguments for showStockChart"));
        }
        event => panic!("unexpected event: {event:?}"),
    }
    assert_eq!(events[2], ChatEvent::Done);

    // Rejected calls leave no trace and never request a caption.
    assert_eq!(sessions.conversation(&id).unwrap().messages().len(), 1);
    assert!(caption_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn it_surfaces_backend_failures() {
    let backend = TestBackend::new(None);

    let (events, sessions, id) = run(backend, &offline_search(), "Hi there").await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        ChatEvent::ErrorCard { message } => {
            assert!(message.starts_with("The backend failed with the following error:"));
        }
        event => panic!("unexpected event: {event:?}"),
    }
    assert_eq!(events[1], ChatEvent::Done);

    assert_eq!(sessions.conversation(&id).unwrap().messages().len(), 1);
}

#[tokio::test]
async fn it_rewrites_failures_naming_the_credential() {
    let mut backend = TestBackend::new(None);
    backend.failure = "the server rejected the GROQ_API_KEY".to_string();

    let (events, _sessions, _id) = run(backend, &offline_search(), "Hi there").await;

    assert_eq!(events.len(), 2);
    match &events[0] {
        ChatEvent::ErrorCard { message } => {
            assert!(message.starts_with("GROQ_API_KEY is missing."));
        }
        event => panic!("unexpected event: {event:?}"),
    }
    assert_eq!(events[1], ChatEvent::Done);
}

#[tokio::test]
async fn it_renders_search_results() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/search")
        .match_header("X-API-KEY", "abc")
        .with_status(200)
        .with_body(
            json!({
                "answerBox": {"snippet": "The Sensex closed at a record high."},
                "organic": [
                    {"title": "Story one", "link": "https://example.com/one"},
                    {"title": "Story two", "link": "https://example.com/two"},
                ],
            })
            .to_string(),
        )
        .create();

    let search = SearchClient::new(server.url(), "abc".to_string());

    let call = ToolCall::new(ToolName::ShowSearchResults, json!({"query": "sensex today"}));
    let backend = TestBackend::new(Some(CompletionOutcome::ToolCall(call)));
    let prompts = backend.prompts.clone();
    let caption_requests = backend.caption_requests.clone();

    let (events, sessions, id) = run(backend, &search, "What happened on the markets today?").await;
    mock.assert();

    // Search cards are never captioned, the card already carries its text.
    let names = events
        .iter()
        .map(|event| return event.name())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["widget-pending", "widget", "done"]);
    assert!(caption_requests.lock().unwrap().is_empty());

    match &events[1] {
        ChatEvent::Widget { node } => match &node.embed {
            WidgetEmbed::SearchResults { answer, summary } => {
                assert_eq!(answer, "The Sensex closed at a record high.");
                assert!(summary.contains("https://example.com/one"));
            }
            embed => panic!("unexpected embed: {embed:?}"),
        },
        event => panic!("unexpected event: {event:?}"),
    }

    // With a token configured the search tool joins the menu.
    assert_eq!(prompts.lock().unwrap()[0].tools.len(), 11);

    // The recorded result carries the links so reloads can rebuild the card.
    let messages = sessions.conversation(&id).unwrap().messages().to_vec();
    assert_eq!(messages.len(), 3);
    assert!(messages[2].text.contains("example.com/one"));
}

#[tokio::test]
async fn it_surfaces_search_failures() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/search")
        .with_status(500)
        .with_body("{}")
        .create();

    let search = SearchClient::new(server.url(), "abc".to_string());

    let call = ToolCall::new(ToolName::ShowSearchResults, json!({"query": "sensex today"}));
    let backend = TestBackend::new(Some(CompletionOutcome::ToolCall(call)));

    let (events, sessions, id) = run(backend, &search, "What happened today?").await;
    mock.assert();

    let names = events
        .iter()
        .map(|event| return event.name())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["widget-pending", "error-card", "done"]);

    assert_eq!(sessions.conversation(&id).unwrap().messages().len(), 1);
}
