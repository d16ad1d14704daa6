use super::state::AppState;
use crate::auth::{LOGIN_ROUTE, Session};
use crate::core::CvError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// An authenticated admin, resolved from `Authorization: Bearer <token>`.
///
/// Every admin handler takes one; there is no ambient "current user".
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl AdminSession {
    pub fn token(&self) -> &str {
        &self.0.token
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = CvError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            CvError::Unauthorized(format!("missing bearer token, sign in at {LOGIN_ROUTE}"))
        })?;

        match state.auth.validate(token).await {
            Ok(session) => Ok(AdminSession(session)),
            Err(err) => {
                state.drafts.drop_session(token).await;
                Err(err)
            }
        }
    }
}
