#[cfg(test)]
#[path = "server_test.rs"]
mod tests;

use anyhow::Context;
use anyhow::Result;
use axum::body::Body;
use axum::extract::Path;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use futures::stream;
use futures::Stream;
use rust_embed::RustEmbed;
use serde_derive::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::ChatEvent;
use crate::domain::services::ChatService;
use crate::domain::services::Sessions;
use crate::infrastructure::backends::BackendManager;
use crate::infrastructure::search::SearchClient;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    session_id: Option<String>,
    message: String,
}

fn current_backend() -> Result<BackendBox> {
    let name = BackendName::parse(&Config::get(ConfigKey::Backend))
        .context("no known backend is configured")?;
    return BackendManager::get(name);
}

fn serve_asset(path: &str) -> Response {
    match Assets::get(path) {
        Some(file) => {
            return Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, file.metadata.mimetype())
                .body(Body::from(file.data.to_vec()))
                .unwrap_or_else(|_| return StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
        None => return StatusCode::NOT_FOUND.into_response(),
    }
}

async fn chat_page() -> Response {
    return serve_asset("index.html");
}

async fn asset(Path(path): Path<String>) -> Response {
    return serve_asset(&path);
}

async fn health() -> Json<serde_json::Value> {
    return Json(json!({
        "status": "ok",
        "backend": Config::get(ConfigKey::Backend),
        "model": Config::get(ConfigKey::Model),
        "version": env!("CARGO_PKG_VERSION"),
    }));
}

async fn models() -> Response {
    let backend = match current_backend() {
        Ok(backend) => backend,
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    match backend.list_models().await {
        Ok(models) => return Json(models).into_response(),
        Err(err) => {
            tracing::error!(error = ?err, "failed to list models");
            return (StatusCode::BAD_GATEWAY, err.to_string()).into_response();
        }
    }
}

async fn session(Path(id): Path<String>) -> Response {
    match Sessions::global().snapshot(&id) {
        Some(snapshot) => return Json(snapshot).into_response(),
        None => return StatusCode::NOT_FOUND.into_response(),
    }
}

fn event_stream(
    rx: mpsc::UnboundedReceiver<ChatEvent>,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    return stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        let sse = Event::default().event(event.name()).json_data(&event);
        return Some((sse, rx));
    });
}

/// Answers one submission as a server-sent event stream. The stream opens
/// with the resolved session id and closes after the done event, when the
/// dispatch task hangs up its sender.
async fn chat(Json(req): Json<ChatRequest>) -> Response {
    if req.message.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "message is empty").into_response();
    }

    let backend = match current_backend() {
        Ok(backend) => backend,
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    let session_id = Sessions::global().ensure(req.session_id);

    let (tx, rx) = mpsc::unbounded_channel::<ChatEvent>();
    let _ = tx.send(ChatEvent::Session {
        id: session_id.to_string(),
    });

    tokio::spawn(async move {
        let search = SearchClient::default();
        let res = ChatService::submit(
            &backend,
            &search,
            Sessions::global(),
            &session_id,
            &req.message,
            &tx,
        )
        .await;

        if let Err(err) = res {
            tracing::error!(error = ?err, "chat submission failed");
        }
    });

    return Sse::new(event_stream(rx))
        .keep_alive(KeepAlive::default())
        .into_response();
}

fn router() -> Router {
    return Router::new()
        .route("/", get(chat_page))
        .route("/assets/{*path}", get(asset))
        .route("/api/health", get(health))
        .route("/api/models", get(models))
        .route("/api/sessions/{id}", get(session))
        .route("/api/chat", post(chat));
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

pub async fn start() -> Result<()> {
    let backend = current_backend()?;

    if Config::get(ConfigKey::Model).is_empty() {
        Config::set(ConfigKey::Model, backend.name().default_model());
    }

    // A failed check is worth knowing about, but the server still starts so
    // missing credentials can surface in the page as error cards.
    if let Err(err) = backend.health_check().await {
        tracing::warn!(error = ?err, "backend health check failed");
    }

    let addr = format!(
        "{host}:{port}",
        host = Config::get(ConfigKey::Host),
        port = Config::get(ConfigKey::Port)
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| return format!("failed to bind {addr}"))?;

    tracing::info!(addr = addr, "server listening");
    println!("Stockchat is listening on http://{addr}");

    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    return Ok(());
}
