#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use cvfolio::auth::AuthManager;
use cvfolio::cv::CvRepository;
use cvfolio::storage::{DocumentStore, LocalObjectStore, MemoryDocumentStore};
use cvfolio::web::{AppState, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN: &str = "admin";
pub const PASSWORD: &str = "s3cret-passphrase";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _uploads: TempDir,
}

pub fn app() -> TestApp {
    app_with_store(Arc::new(MemoryDocumentStore::new()))
}

pub fn app_with_store(store: Arc<dyn DocumentStore>) -> TestApp {
    let uploads = TempDir::new().expect("temp dir");
    let hash = AuthManager::hash_password_with_cost(PASSWORD, 4).expect("hash");
    let auth = AuthManager::new(ADMIN, hash, chrono::Duration::minutes(30));
    let objects = LocalObjectStore::new(uploads.path(), "/uploads");

    let state = AppState::new(CvRepository::new(store), Arc::new(auth), Arc::new(objects))
        .uploads_dir(uploads.path());
    TestApp {
        router: build_router(state.clone()),
        state,
        _uploads: uploads,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        if self.text.is_empty() {
            return Value::Null;
        }
        serde_json::from_str(&self.text).expect("body should be valid JSON")
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    payload: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match payload {
        Some(payload) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("request should build");

    let response = app.clone().oneshot(request).await.expect("response expected");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");
    Reply {
        status,
        headers,
        text: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

pub async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Method::GET, uri, None, None).await
}

pub async fn login(app: &Router) -> String {
    let reply = send(
        app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({ "username": ADMIN, "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
    reply.json()["token"]
        .as_str()
        .expect("token should be a string")
        .to_string()
}

pub fn profile() -> Value {
    json!({
        "name": { "fr": "Camille Martin", "en": "Camille Martin" },
        "title": { "fr": "Ingénieure logicielle", "en": "Software engineer" },
        "avatar": "",
        "summary": {
            "fr": "Développe des services web fiables depuis dix ans.",
            "en": "Building reliable web services for ten years."
        },
        "contact": {
            "email": "camille@example.com",
            "phone": "+33 6 12 34 56 78",
            "location": "Lyon"
        },
        "socials": { "github": "https://github.com/camille", "linkedin": "", "website": "" }
    })
}

pub fn experience(company: &str) -> Value {
    json!({
        "position": { "fr": "Développeuse", "en": "Developer" },
        "company": company,
        "duration": "2020 - 2024",
        "description": { "fr": "Services backend.", "en": "Backend services." },
        "technologies": ["Rust", "PostgreSQL"]
    })
}
