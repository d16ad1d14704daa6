//! HTTP surface: public read path, admin API and error mapping.

pub mod admin;
pub mod extract;
pub mod public;
pub mod router;
pub mod state;

pub use extract::AdminSession;
pub use router::build_router;
pub use state::AppState;

use crate::auth::LOGIN_ROUTE;
use crate::core::{CvError, FieldError};
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<&'static str>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
            fields: None,
            login: None,
        }
    }
}

pub fn status_and_code(err: &CvError) -> (StatusCode, &'static str) {
    match err {
        CvError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
        CvError::Fetch(_) => (StatusCode::SERVICE_UNAVAILABLE, "fetch_error"),
        CvError::Persistence(_) => (StatusCode::SERVICE_UNAVAILABLE, "persistence_error"),
        CvError::Delete(_) => (StatusCode::SERVICE_UNAVAILABLE, "delete_error"),
        CvError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        CvError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
        CvError::Upload(_) => (StatusCode::BAD_GATEWAY, "upload_error"),
        CvError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

impl From<&CvError> for ErrorResponse {
    fn from(err: &CvError) -> Self {
        let (_, code) = status_and_code(err);
        match err {
            CvError::Validation(errors) => Self {
                fields: Some(errors.fields().to_vec()),
                ..Self::new("validation failed", code)
            },
            CvError::Unauthorized(message) => Self {
                login: Some(LOGIN_ROUTE),
                ..Self::new(message.clone(), code)
            },
            CvError::Config(_) => Self::new("internal server error", code),
            other => Self::new(other.to_string(), code),
        }
    }
}

impl IntoResponse for CvError {
    fn into_response(self) -> Response {
        let (status, _) = status_and_code(&self);
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let mut response = (status, Json(ErrorResponse::from(&self))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValidationErrors;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (CvError::validation("company", "required"), 422),
            (CvError::Fetch("x".into()), 503),
            (CvError::Persistence("x".into()), 503),
            (CvError::Delete("x".into()), 503),
            (CvError::NotFound("x".into()), 404),
            (CvError::Unauthorized("x".into()), 401),
        ];
        for (err, status) in cases {
            assert_eq!(status_and_code(&err).0.as_u16(), status, "{err}");
        }
    }

    #[test]
    fn validation_body_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.push("experiences[0].company", "L'entreprise est requise.");
        let body = serde_json::to_value(ErrorResponse::from(&CvError::Validation(errors))).unwrap();
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["fields"][0]["field"], "experiences[0].company");
        assert!(body.get("login").is_none());
    }

    #[test]
    fn unauthorized_sets_challenge_header() {
        let response = CvError::Unauthorized("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
