use super::state::AppState;
use crate::core::{CvError, Language};
use crate::cv::{
    ContactMessage, CvData, CvSnapshot, NewContactMessage, ThemePalette, render_print_html,
};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn get_cv(State(state): State<AppState>) -> Result<Json<CvData>, CvError> {
    Ok(Json(state.repo.load_cv().await?))
}

async fn snapshot(state: &AppState, lang: &str) -> Result<CvSnapshot, CvError> {
    let lang: Language = lang.parse()?;
    let data = state.repo.load_cv().await?;
    CvSnapshot::flatten(&data, lang)
        .ok_or_else(|| CvError::NotFound("the CV has no personal info yet".into()))
}

pub async fn get_cv_lang(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> Result<Json<CvSnapshot>, CvError> {
    Ok(Json(snapshot(&state, &lang).await?))
}

pub async fn get_theme(State(state): State<AppState>) -> Json<ThemePalette> {
    Json(state.repo.theme().await)
}

pub async fn theme_css(State(state): State<AppState>) -> impl IntoResponse {
    let css = state.repo.theme().await.to_css();
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css)
}

/// Print-ready CV. Serving it counts as a download.
pub async fn print_cv(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> Result<Html<String>, CvError> {
    let cv = snapshot(&state, &lang).await?;
    let palette = state.repo.theme().await;
    let html = render_print_html(&cv, &palette);

    if state.track_stats {
        if let Err(err) = state.repo.record_download().await {
            warn!(error = %err, "download was served but not counted");
        }
    }
    Ok(Html(html))
}

pub async fn record_view(State(state): State<AppState>) -> Result<StatusCode, CvError> {
    if state.track_stats {
        state.repo.record_view().await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_contact(
    State(state): State<AppState>,
    Json(message): Json<NewContactMessage>,
) -> Result<(StatusCode, Json<ContactMessage>), CvError> {
    let contact = state.repo.submit_contact(message).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}
