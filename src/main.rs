use axum::{
  extract::ws::{Message, WebSocket},
  extract::{Path, Query, State, WebSocketUpgrade},
  http::{Method, StatusCode},
  response::IntoResponse,
  routing::{get, post},
  Json, Router,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod engine;
mod protocol;
mod session;

use session::Session;

#[derive(Clone)]
struct AppState {
  sessions: Arc<DashMap<String, Arc<Session>>>,
  debug_commands: bool,
}

#[derive(Debug, Serialize)]
struct OkResponse {
  ok: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
  ok: bool,
  error: String,
}

#[derive(Debug, Deserialize)]
struct DebugHitQuery {
  session: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let debug_commands = env::var("ENABLE_DEBUG_COMMANDS")
    .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE"))
    .unwrap_or(false);

  let state = AppState {
    sessions: Arc::new(DashMap::new()),
    debug_commands,
  };

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any);

  let mut app: Router<AppState> = Router::new()
    .route("/api/health", get(health))
    .route("/api/session/:name", get(ws_handler))
    .layer(cors);

  if debug_commands {
    app = app.route("/api/debug/hit", post(debug_hit));
  }

  let app: Router = app.with_state(state);

  let port: u16 = env::var("PORT")
    .ok()
    .and_then(|value| value.parse().ok())
    .unwrap_or(8787);

  let address = format!("0.0.0.0:{port}");
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address).await?;
  axum::serve(listener, app).await?;

  Ok(())
}

impl AppState {
  fn session(&self, name: String) -> Arc<Session> {
    match self.sessions.entry(name) {
      dashmap::mapref::entry::Entry::Occupied(entry) => entry.get().clone(),
      dashmap::mapref::entry::Entry::Vacant(entry) => {
        let session = Arc::new(Session::new());
        entry.insert(session.clone());
        session
      }
    }
  }
}

async fn health() -> impl IntoResponse {
  Json(OkResponse { ok: true })
}

async fn debug_hit(
  State(state): State<AppState>,
  Query(params): Query<DebugHitQuery>,
) -> impl IntoResponse {
  if !state.debug_commands {
    return (
      StatusCode::FORBIDDEN,
      Json(ErrorResponse {
        ok: false,
        error: "Debug commands disabled".to_string(),
      }),
    )
      .into_response();
  }

  let session_name = params.session.unwrap_or_else(|| "main".to_string());
  let session = state.session(session_name);
  if session.debug_hit().await {
    Json(OkResponse { ok: true }).into_response()
  } else {
    (
      StatusCode::CONFLICT,
      Json(ErrorResponse {
        ok: false,
        error: "Game is not active".to_string(),
      }),
    )
      .into_response()
  }
}

async fn ws_handler(
  ws: WebSocketUpgrade,
  Path(name): Path<String>,
  State(state): State<AppState>,
) -> impl IntoResponse {
  let trimmed = name.trim();
  let session_name = if trimmed.is_empty() { "main" } else { trimmed }.to_string();
  let session = state.session(session_name);
  ws.on_upgrade(move |socket| handle_socket(socket, session))
}

async fn handle_socket(socket: WebSocket, session: Arc<Session>) {
  let (mut sender, mut receiver) = socket.split();
  let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
  let client_id = session.add_client(tx).await;

  let send_task = tokio::spawn(async move {
    while let Some(payload) = rx.recv().await {
      if sender.send(Message::Binary(payload)).await.is_err() {
        break;
      }
    }
  });

  while let Some(result) = receiver.next().await {
    let Ok(message) = result else { break };
    match message {
      Message::Binary(data) => {
        session.handle_binary_message(&client_id, &data).await;
      }
      Message::Text(text) => {
        session.handle_text_message(&client_id, &text).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }

  session.remove_client(&client_id).await;
  send_task.abort();
}
