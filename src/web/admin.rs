use super::ErrorResponse;
use super::extract::AdminSession;
use super::state::AppState;
use crate::core::CvError;
use crate::cv::drafts::Removal;
use crate::cv::{
    CollectionPayload, ContactMessage, DashboardStats, PersonalInfo, ThemePalette, palettes,
};
use crate::reconcile::{EditedCollection, OrderedRecord, ReconcileOutcome};
use crate::storage::{ObjectCategory, ObjectStoreError, StoredObject};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, CvError> {
    let session = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
    }))
}

pub async fn logout(State(state): State<AppState>, session: AdminSession) -> StatusCode {
    state.auth.logout(session.token()).await;
    state.drafts.drop_session(session.token()).await;
    StatusCode::NO_CONTENT
}

// ============================================================================
// Dashboard, profile, theme, inbox
// ============================================================================

pub async fn dashboard(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<DashboardStats>, CvError> {
    Ok(Json(state.repo.dashboard().await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<PersonalInfo>, CvError> {
    let info = state.repo.personal_info().await?;
    Ok(Json(info.unwrap_or_default()))
}

pub async fn put_profile(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(info): Json<PersonalInfo>,
) -> Result<Json<PersonalInfo>, CvError> {
    Ok(Json(state.repo.save_personal_info(info).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeRequest {
    pub theme_name: String,
}

pub async fn get_theme(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Json<ThemePalette> {
    Json(state.repo.theme().await)
}

pub async fn put_theme(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(request): Json<ThemeRequest>,
) -> Result<Json<ThemePalette>, CvError> {
    Ok(Json(state.repo.save_theme(&request.theme_name).await?))
}

pub async fn list_themes(_session: AdminSession) -> Json<&'static [ThemePalette]> {
    Json(palettes())
}

pub async fn contacts(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<Vec<ContactMessage>>, CvError> {
    Ok(Json(state.repo.contacts().await?))
}

// ============================================================================
// Uploads
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub category: ObjectCategory,
    pub filename: String,
    pub data_url: String,
}

impl From<ObjectStoreError> for CvError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::InvalidDataUrl(_)
            | ObjectStoreError::UnsupportedType(_)
            | ObjectStoreError::TooLarge { .. } => CvError::validation("dataUrl", err.to_string()),
            ObjectStoreError::Io(e) => CvError::Upload(e.to_string()),
        }
    }
}

pub async fn upload(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(request): Json<UploadRequest>,
) -> Result<(StatusCode, Json<StoredObject>), CvError> {
    let stored = state
        .objects
        .put_data_url(request.category, &request.filename, &request.data_url)
        .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

// ============================================================================
// Ordered collections
// ============================================================================

/// Routes for one ordered collection, nested under `/api/admin/{collection}`.
pub fn collection_routes<T: CollectionPayload>() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(list::<T>).put(save::<T>))
        // `draft` never names a record, see `collections::DRAFT_SEGMENT`.
        .route("/:id", delete(delete_record::<T>))
        .route("/draft", post(load_draft::<T>).get(get_draft::<T>))
        .route("/draft/items", post(append_item::<T>))
        .route(
            "/draft/items/:index",
            put(replace_item::<T>).delete(remove_item::<T>),
        )
        .route("/draft/move", post(move_item::<T>))
        .route("/draft/save", post(save_draft::<T>))
}

async fn list<T: CollectionPayload>(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<Vec<OrderedRecord<T>>>, CvError> {
    Ok(Json(state.repo.load_collection::<T>().await?))
}

/// Saves a whole edited list in one request.
async fn save<T: CollectionPayload>(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(records): Json<Vec<OrderedRecord<T>>>,
) -> Result<Json<ReconcileOutcome<T>>, CvError> {
    Ok(Json(state.repo.save_collection(records).await?))
}

async fn delete_record<T: CollectionPayload>(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, CvError> {
    state.repo.delete_record::<T>(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_draft<T: CollectionPayload>(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<EditedCollection<T>>, CvError> {
    Ok(Json(state.drafts.load::<T>(&state.repo, session.token()).await?))
}

async fn get_draft<T: CollectionPayload>(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<EditedCollection<T>>, CvError> {
    Ok(Json(state.drafts.get::<T>(session.token()).await?))
}

async fn append_item<T: CollectionPayload>(
    State(state): State<AppState>,
    session: AdminSession,
    Json(payload): Json<T>,
) -> Result<(StatusCode, Json<EditedCollection<T>>), CvError> {
    let draft = state.drafts.append(session.token(), payload).await?;
    Ok((StatusCode::CREATED, Json(draft)))
}

async fn replace_item<T: CollectionPayload>(
    State(state): State<AppState>,
    session: AdminSession,
    Path(index): Path<usize>,
    Json(payload): Json<T>,
) -> Result<Json<EditedCollection<T>>, CvError> {
    Ok(Json(state.drafts.replace(session.token(), index, payload).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveQuery {
    #[serde(default)]
    pub immediate: bool,
}

#[derive(Serialize)]
struct DeleteFailure<T> {
    #[serde(flatten)]
    error: ErrorResponse,
    draft: EditedCollection<T>,
}

async fn remove_item<T: CollectionPayload>(
    State(state): State<AppState>,
    session: AdminSession,
    Path(index): Path<usize>,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<Removal<T>>, Response> {
    match state
        .drafts
        .remove::<T>(&state.repo, session.token(), index, query.immediate)
        .await
    {
        Ok(removal) => Ok(Json(removal)),
        Err(err @ CvError::Delete(_)) => {
            let draft = state
                .drafts
                .get::<T>(session.token())
                .await
                .map_err(IntoResponse::into_response)?;
            let body = DeleteFailure {
                error: ErrorResponse::from(&err),
                draft,
            };
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response())
        }
        Err(err) => Err(err.into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

async fn move_item<T: CollectionPayload>(
    State(state): State<AppState>,
    session: AdminSession,
    Json(request): Json<MoveRequest>,
) -> Result<Json<EditedCollection<T>>, CvError> {
    Ok(Json(
        state
            .drafts
            .move_item::<T>(session.token(), request.from, request.to)
            .await?,
    ))
}

async fn save_draft<T: CollectionPayload>(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<ReconcileOutcome<T>>, CvError> {
    let outcome = state.drafts.save::<T>(&state.repo, session.token()).await?;
    info!(collection = T::COLLECTION, records = outcome.records.len(), "draft saved");
    Ok(Json(outcome))
}
