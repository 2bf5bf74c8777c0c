//! Dashboard and chat HTTP server.
//!
//! Serves the single-page dashboard and a small JSON API over the chat
//! sessions and the retrievers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Dashboard + chat page |
//! | `GET`  | `/health` | Status, version, and generator availability |
//! | `GET`  | `/api/dashboard` | Static dashboard widgets |
//! | `GET`  | `/api/sessions` | Chat history, newest first |
//! | `POST` | `/api/sessions` | Start a new chat |
//! | `GET`  | `/api/sessions/{id}` | Full transcript of one chat |
//! | `POST` | `/api/sessions/{id}/messages` | Send a message, get the assistant's reply |
//! | `POST` | `/api/search` | Raw retrieval results for a query |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "content must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! A failed answer is not an HTTP error: the reply is a degraded assistant
//! turn with `"degraded": true`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::app::App;
use crate::chat::{Conversation, SessionSummary};
use crate::config::Config;
use crate::dashboard::{Dashboard, DASHBOARD};
use crate::models::ChatTurn;
use crate::retrieve::Retrieval;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// One chat. `live` is held for a whole turn, generation included, so
/// turns on a session run one at a time. Readers use `snapshot`, the state
/// after the last completed turn, and never wait on generation.
struct Session {
    live: Mutex<Conversation>,
    snapshot: RwLock<Conversation>,
}

impl Session {
    fn new(convo: Conversation) -> Arc<Self> {
        Arc::new(Self {
            snapshot: RwLock::new(convo.clone()),
            live: Mutex::new(convo),
        })
    }

    fn snapshot(&self) -> Conversation {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn summary(&self) -> SessionSummary {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .summary()
    }

    fn publish(&self, convo: &Conversation) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = convo.clone();
    }
}

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    app: Arc<App>,
    sessions: Arc<Mutex<HashMap<Uuid, Arc<Session>>>>,
}

impl AppState {
    /// Wrap `app`, restoring any persisted transcripts.
    pub fn new(app: Arc<App>) -> anyhow::Result<Self> {
        let mut sessions = HashMap::new();
        if let Some(transcripts) = app.transcripts() {
            for convo in transcripts.load_all()? {
                sessions.insert(convo.id, Session::new(convo));
            }
            tracing::info!(
                sessions = sessions.len(),
                dir = %transcripts.dir().display(),
                "restored chat history"
            );
        }
        Ok(Self {
            app,
            sessions: Arc::new(Mutex::new(sessions)),
        })
    }

    async fn session(&self, id: &str) -> Result<Arc<Session>, AppError> {
        let id = Uuid::parse_str(id).map_err(|_| bad_request(format!("invalid session id: {}", id)))?;
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("no session with id: {}", id)))
    }
}

/// Build the router. Exposed separately from [`serve`] so callers can bind
/// their own listener.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/dashboard", get(handle_dashboard))
        .route(
            "/api/sessions",
            get(handle_list_sessions).post(handle_create_session),
        )
        .route("/api/sessions/{id}", get(handle_get_session))
        .route("/api/sessions/{id}/messages", post(handle_post_message))
        .route("/api/search", post(handle_search))
        .layer(cors)
        .with_state(state)
}

/// `foundry serve`: open the app and serve it.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let app = Arc::new(App::open(config.clone()).await?);
    serve(app).await
}

/// Serve on `[server].bind` until Ctrl-C, then close the store.
pub async fn serve(app: Arc<App>) -> anyhow::Result<()> {
    let bind_addr = app.config().server.bind.clone();
    let state = AppState::new(app.clone())?;

    if let Some(warning) = app.startup_warning() {
        println!("⚠️  {}", warning);
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("Foundry dashboard listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    app.shutdown().await;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Error type that converts into an `{ "error": { code, message } }` response.
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!(error = %format!("{:#}", err), "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: format!("{:#}", err),
    }
}

// ============ Pages ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    generator: GeneratorHealth,
}

#[derive(Serialize)]
struct GeneratorHealth {
    model: String,
    available: bool,
    warning: Option<String>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let warning = state.app.generator_warning().await;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        generator: GeneratorHealth {
            model: state.app.assistant().generator().model_name().to_string(),
            available: warning.is_none(),
            warning,
        },
    })
}

#[derive(Serialize)]
struct DashboardResponse {
    #[serde(flatten)]
    dashboard: Dashboard,
    warning: Option<String>,
}

async fn handle_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        dashboard: DASHBOARD,
        warning: state.app.generator_warning().await,
    })
}

// ============ Sessions ============

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummary>,
}

async fn handle_list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let mut sessions: Vec<SessionSummary> = state
        .sessions
        .lock()
        .await
        .values()
        .map(|s| s.summary())
        .collect();
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Json(SessionListResponse { sessions })
}

async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<Conversation>) {
    let convo = Conversation::new();
    state
        .sessions
        .lock()
        .await
        .insert(convo.id, Session::new(convo.clone()));
    (StatusCode::CREATED, Json(convo))
}

async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, AppError> {
    let session = state.session(&id).await?;
    Ok(Json(session.snapshot()))
}

#[derive(Deserialize)]
struct MessageRequest {
    content: String,
}

#[derive(Serialize)]
struct MessageResponse {
    reply: ChatTurn,
    session: SessionSummary,
}

async fn handle_post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.content.trim().is_empty() {
        return Err(bad_request("content must not be empty"));
    }

    let session = state.session(&id).await?;
    let mut convo = session.live.lock().await;

    let reply = convo
        .submit(state.app.assistant(), &req.content)
        .await
        .cloned()
        .ok_or_else(|| bad_request("content must not be empty"))?;

    session.publish(&convo);

    if let Some(transcripts) = state.app.transcripts() {
        if let Err(e) = transcripts.persist(convo.clone()).await {
            tracing::warn!(session = %convo.id, error = %format!("{:#}", e), "failed to save transcript");
        }
    }

    Ok(Json(MessageResponse {
        reply,
        session: convo.summary(),
    }))
}

// ============ Search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    dataset: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<Retrieval>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let retrievers = state.app.assistant().retrievers();
    let results = match req.dataset.as_deref() {
        Some(name) => {
            let retriever = retrievers
                .get(name)
                .ok_or_else(|| not_found(format!("no dataset named: {}", name)))?;
            vec![Retrieval {
                dataset: name.to_string(),
                results: retriever.retrieve(&req.query).await.map_err(internal)?,
            }]
        }
        None => retrievers
            .retrieve_all(&req.query)
            .await
            .map_err(internal)?,
    };

    Ok(Json(SearchResponse { results }))
}
