use crate::core::{CvError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

pub const LOGIN_ROUTE: &str = "/api/admin/login";

/// An authenticated admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Single-account authentication manager
///
/// Verifies the admin password against a bcrypt hash and hands out bearer
/// tokens that expire after a fixed time to live.
pub struct AuthManager {
    username: String,
    password_hash: String,
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl AuthManager {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>, ttl: Duration) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Hashes a password using bcrypt with the default cost factor
    pub fn hash_password(password: &str) -> Result<String> {
        Self::hash_password_with_cost(password, bcrypt::DEFAULT_COST)
    }

    pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String> {
        bcrypt::hash(password, cost).map_err(|e| CvError::Config(format!("failed to hash password: {e}")))
    }

    /// Verifies password against bcrypt hash
    ///
    /// A malformed hash never matches.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Runs the bcrypt check on the blocking pool.
    async fn password_matches(&self, password: &str) -> bool {
        let password = password.to_string();
        let hash = self.password_hash.clone();
        tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash))
            .await
            .unwrap_or(false)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username != self.username || !self.password_matches(password).await {
            warn!(%username, "rejected admin login");
            return Err(CvError::Unauthorized("invalid username or password".into()));
        }

        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            username: self.username.clone(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        info!(%username, expires_at = %session.expires_at, "admin logged in");
        Ok(session)
    }

    /// Resolves a bearer token to its session. Expired sessions are forgotten.
    pub async fn validate(&self, token: &str) -> Result<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(session) if !session.is_expired(now) => return Ok(session.clone()),
                Some(_) => {}
                None => {
                    return Err(CvError::Unauthorized(format!(
                        "unknown session, sign in at {LOGIN_ROUTE}"
                    )));
                }
            }
        }
        self.sessions.write().await.remove(token);
        Err(CvError::Unauthorized(format!(
            "session expired, sign in again at {LOGIN_ROUTE}"
        )))
    }

    /// Ends a session. Returns false if the token was not active.
    pub async fn logout(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token).is_some();
        if removed {
            info!("admin logged out");
        }
        removed
    }

    /// Removes every expired session and returns their tokens.
    pub async fn purge_expired(&self) -> Vec<String> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .values()
            .filter(|s| s.is_expired(now))
            .map(|s| s.token.clone())
            .collect();
        for token in &expired {
            sessions.remove(token);
        }
        expired
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}
