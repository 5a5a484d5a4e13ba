// HTTP request handlers
use crate::application::dataset_source::SourceError;
use crate::application::ingest::{IngestError, SAMPLE_CSV, SAMPLE_FILENAME, decode_upload};
use crate::application::session::Session;
use crate::domain::alarm::AlarmEvent;
use crate::domain::dashboard::DashboardView;
use crate::domain::dataset::DatasetEntry;
use crate::domain::filter::FilterSpec;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no active session; log in first")]
    NoSession,

    #[error("{0}")]
    BadRequest(String),

    #[error("dataset {0} not found")]
    UnknownDataset(String),

    #[error("no active dataset to simulate")]
    NoActiveDataset,

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NoSession => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownDataset(_) => StatusCode::NOT_FOUND,
            ApiError::NoActiveDataset => StatusCode::CONFLICT,
            ApiError::Ingest(IngestError::UnsupportedFile { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::Ingest(IngestError::Unreadable { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Source(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn session(state: &AppState) -> Result<Arc<Session>, ApiError> {
    state.sessions.current().await.ok_or(ApiError::NoSession)
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub username: String,
    pub active_dataset_id: Option<String>,
    pub history_len: usize,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub history: Vec<DatasetEntry>,
}

#[derive(Serialize)]
pub struct SimulationStatus {
    pub running: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionInfo>, ApiError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".to_string()));
    }

    let session = state.sessions.login(username.to_string()).await;
    let history = session.history().await;
    Ok(Json(SessionInfo {
        username: session.username().to_string(),
        active_dataset_id: session.active().await.map(|entry| entry.id),
        history_len: history.len(),
    }))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.sessions.logout().await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::UNAUTHORIZED
    }
}

pub async fn list_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = session(&state).await?;
    Ok(Json(HistoryResponse {
        history: session.history().await,
    }))
}

/// Accept a multipart `file` field holding CSV text
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DatasetEntry>), ApiError> {
    let session = session(&state).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|_| IngestError::Unreadable {
            filename: filename.clone(),
        })?;
        let content = decode_upload(&filename, &bytes)?;

        let entry = session.upload(&filename, &content).await?;
        return Ok((StatusCode::CREATED, Json(entry)));
    }

    Err(ApiError::BadRequest("no file provided".to_string()))
}

pub async fn ingest_sample(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<DatasetEntry>), ApiError> {
    let session = session(&state).await?;
    let entry = session.upload(SAMPLE_FILENAME, SAMPLE_CSV).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn activate_dataset(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    let session = session(&state).await?;
    if session.select(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::UnknownDataset(id))
    }
}

pub async fn get_filter(State(state): State<Arc<AppState>>) -> Result<Json<FilterSpec>, ApiError> {
    let session = session(&state).await?;
    Ok(Json(session.filter().await))
}

pub async fn put_filter(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<FilterSpec>,
) -> Result<Json<FilterSpec>, ApiError> {
    let session = session(&state).await?;
    session.set_filter(filter.clone()).await;
    Ok(Json(filter))
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, ApiError> {
    let session = session(&state).await?;
    Ok(Json(session.dashboard().await))
}

pub async fn start_simulation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SimulationStatus>, ApiError> {
    let session = session(&state).await?;
    if !session.start_simulation().await {
        return Err(ApiError::NoActiveDataset);
    }
    Ok(Json(SimulationStatus { running: true }))
}

pub async fn stop_simulation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SimulationStatus>, ApiError> {
    let session = session(&state).await?;
    session.stop_simulation().await;
    Ok(Json(SimulationStatus { running: false }))
}

pub async fn list_alarms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AlarmEvent>>, ApiError> {
    let session = session(&state).await?;
    Ok(Json(session.alarms().await))
}

pub async fn reset_alarms(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let session = session(&state).await?;
    session.reset_alarms().await;
    Ok(StatusCode::NO_CONTENT)
}
