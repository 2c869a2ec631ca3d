//! REST API server for the finance buddy
//!
//! Exposes the chat transcript, task checklist and profile over HTTP.
//! Every body is wrapped in the [`ApiResponse`] envelope.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::chat::ChatSession;
use crate::conversation::ConversationService;
use crate::error::BuddyError;
use crate::profile::{FinancialProfile, ProfileField};
use crate::storage::{KeyValueStore, MessageStore, ProfileStore, TaskStore};
use crate::tasks::{TaskBoard, TaskProgress};
use crate::models::Task;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldEditRequest {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct TaskBoardView<'a> {
    pub tasks: &'a [Task],
    pub progress: TaskProgress,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn failure(error: &BuddyError) -> ApiResult {
    let status = match error {
        BuddyError::TaskNotFound(_) | BuddyError::UnknownProfileField(_) => StatusCode::NOT_FOUND,
        BuddyError::InvalidProfileValue { .. } | BuddyError::InvalidProfile(_) => {
            StatusCode::BAD_REQUEST
        }
        BuddyError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }
    (status, Json(ApiResponse::error(error.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub chat: Arc<Mutex<ChatSession>>,
    pub tasks: Arc<Mutex<TaskBoard>>,
    pub profiles: ProfileStore,
}

impl ApiState {
    /// Open the transcript and checklist over shared slots.
    pub async fn open(service: Arc<ConversationService>, slots: Arc<dyn KeyValueStore>) -> Self {
        let profiles = service.profiles().clone();
        let chat = ChatSession::open(service, MessageStore::messages(slots.clone())).await;
        let tasks = TaskBoard::open(TaskStore::tasks(slots)).await;

        Self {
            chat: Arc::new(Mutex::new(chat)),
            tasks: Arc::new(Mutex::new(tasks)),
            profiles,
        }
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoints
/// =============================

async fn list_messages(State(state): State<ApiState>) -> ApiResult {
    let chat = state.chat.lock().await;
    ok(chat.messages())
}

async fn send_message(
    State(state): State<ApiState>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult {
    let mut chat = state.chat.lock().await;

    match chat.send(&req.text).await {
        Some(reply) => {
            info!(is_error = reply.is_error, "Chat turn completed");
            ok(reply)
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Message text is required".into())),
        ),
    }
}

/// =============================
/// Task Endpoints
/// =============================

async fn list_tasks(State(state): State<ApiState>) -> ApiResult {
    let board = state.tasks.lock().await;
    ok(TaskBoardView {
        tasks: board.tasks(),
        progress: board.progress(),
    })
}

async fn toggle_task(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    let mut board = state.tasks.lock().await;

    match board.toggle(&id).await {
        Ok(task) => ok(task),
        Err(e) => failure(&e),
    }
}

/// =============================
/// Profile Endpoints
/// =============================

fn if_match(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::IF_MATCH).and_then(|v| v.to_str().ok())
}

/// Profile body tagged with its current `ETag`.
fn profile_response(profile: FinancialProfile) -> Response {
    let etag = profile.etag();
    (StatusCode::OK, [(header::ETAG, etag)], Json(ApiResponse::success(profile))).into_response()
}

async fn get_profile(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let profile = state.profiles.load().await;
    let etag = profile.etag();

    // Weak comparison: a `W/` prefix still matches.
    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|tags| {
            tags.split(',')
                .map(|tag| tag.trim().trim_start_matches("W/"))
                .any(|tag| tag == "*" || tag == etag)
        });
    if not_modified {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    profile_response(profile)
}

async fn replace_profile(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let profile = match FinancialProfile::from_json(body) {
        Ok(profile) => profile,
        Err(e) => return failure(&e).into_response(),
    };

    match state.profiles.modify(if_match(&headers), |_| profile).await {
        Ok(profile) => {
            info!("Profile replaced");
            profile_response(profile)
        }
        Err(e) => failure(&e).into_response(),
    }
}

async fn merge_profile(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let updates = match FinancialProfile::from_json(body) {
        Ok(updates) => updates,
        Err(e) => return failure(&e).into_response(),
    };

    match state
        .profiles
        .modify(if_match(&headers), |current| current.merge(updates))
        .await
    {
        Ok(profile) => profile_response(profile),
        Err(e) => failure(&e).into_response(),
    }
}

async fn edit_profile_field(
    State(state): State<ApiState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    Json(req): Json<FieldEditRequest>,
) -> Response {
    let edit = match path
        .parse::<ProfileField>()
        .and_then(|field| field.parse_input(&req.value))
    {
        Ok(edit) => edit,
        Err(e) => return failure(&e).into_response(),
    };

    let result = state
        .profiles
        .modify(if_match(&headers), |mut profile| {
            profile.apply(edit);
            profile
        })
        .await;

    match result {
        Ok(profile) => {
            info!(field = %path, "Profile field edited");
            profile_response(profile)
        }
        Err(e) => failure(&e).into_response(),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/messages", get(list_messages))
        .route("/api/chat", post(send_message))
        .route("/api/tasks", get(list_tasks))
        .route("/api/tasks/:id/toggle", post(toggle_task))
        .route(
            "/api/profile",
            get(get_profile).put(replace_profile).patch(merge_profile),
        )
        .route("/api/profile/fields/:path", put(edit_profile_field))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
