mod common;

use axum::http::{Method, StatusCode, header};
use common::{app, app_with_store, experience, get, login, profile, send};
use cvfolio::cv::palettes;
use cvfolio::storage::{FlakyStore, MemoryDocumentStore};
use serde_json::{Value, json};
use std::sync::Arc;

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

fn companies(records: &Value) -> Vec<&str> {
    records
        .as_array()
        .expect("array of records")
        .iter()
        .map(|r| r["company"].as_str().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    let app = app();

    let reply = get(&app.router, "/api/admin/dashboard").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.headers[header::WWW_AUTHENTICATE], "Bearer");
    let body = reply.json();
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(body["login"], "/api/admin/login");

    let reply = send(
        &app.router,
        Method::GET,
        "/api/admin/dashboard",
        Some("not-a-session"),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_refused() {
    let app = app();
    let reply = send(
        &app.router,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({ "username": common::ADMIN, "password": "guess" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.json().get("token").is_none());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = app();
    let token = login(&app.router).await;

    let reply = send(&app.router, Method::GET, "/api/admin/dashboard", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!({ "views": 0, "downloads": 0, "contacts": 0 }));

    let reply = send(&app.router, Method::POST, "/api/admin/logout", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let reply = send(&app.router, Method::GET, "/api/admin/dashboard", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_is_validated_then_published() {
    let app = app();
    let token = login(&app.router).await;

    let mut invalid = profile();
    invalid["name"]["fr"] = json!("");
    invalid["contact"]["email"] = json!("camille");
    let reply = send(&app.router, Method::PUT, "/api/admin/profile", Some(&token), Some(invalid)).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<String> = reply.json()["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, vec!["name.fr", "contact.email"]);

    let reply = send(&app.router, Method::PUT, "/api/admin/profile", Some(&token), Some(profile())).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
    assert_eq!(reply.json()["title"]["en"], "Software engineer");

    let public = get(&app.router, "/api/cv").await.json();
    assert_eq!(public["personalInfo"]["name"]["fr"], "Camille Martin");
}

#[tokio::test]
async fn theme_must_come_from_the_catalog() {
    let app = app();
    let token = login(&app.router).await;

    let reply = send(
        &app.router,
        Method::PUT,
        "/api/admin/theme",
        Some(&token),
        Some(json!({ "themeName": "Neon Chaos" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.json()["fields"][0]["field"], "themeName");

    let chosen = &palettes()[1].name;
    let reply = send(
        &app.router,
        Method::PUT,
        "/api/admin/theme",
        Some(&token),
        Some(json!({ "themeName": chosen })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
    assert_eq!(get(&app.router, "/api/theme").await.json()["name"], *chosen);

    let catalog = send(&app.router, Method::GET, "/api/admin/themes", Some(&token), None).await;
    assert_eq!(catalog.json().as_array().unwrap().len(), palettes().len());
}

#[tokio::test]
async fn draft_flow_saves_in_list_order() {
    let app = app();
    let token = login(&app.router).await;
    let t = Some(token.as_str());

    let reply = send(&app.router, Method::POST, "/api/admin/experiences/draft", t, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!([]));

    for company in ["Acme", "Globex", "Initech"] {
        let reply = send(
            &app.router,
            Method::POST,
            "/api/admin/experiences/draft/items",
            t,
            Some(experience(company)),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text);
    }

    let reply = send(
        &app.router,
        Method::POST,
        "/api/admin/experiences/draft/move",
        t,
        Some(json!({ "from": 2, "to": 0 })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(companies(&reply.json()), vec!["Initech", "Acme", "Globex"]);

    // Nothing reaches the store before save.
    let stored = send(&app.router, Method::GET, "/api/admin/experiences", t, None).await;
    assert_eq!(stored.json(), json!([]));

    let reply = send(&app.router, Method::POST, "/api/admin/experiences/draft/save", t, None).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
    let outcome = reply.json();
    assert_eq!(outcome["created"].as_array().unwrap().len(), 3);
    assert_eq!(companies(&outcome["records"]), vec!["Initech", "Acme", "Globex"]);
    let orders: Vec<u64> = outcome["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["order"].as_u64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);

    let public = get(&app.router, "/api/cv").await.json();
    assert_eq!(companies(&public["experiences"]), vec!["Initech", "Acme", "Globex"]);

    // Reorder and delete through a second draft.
    send(&app.router, Method::POST, "/api/admin/experiences/draft", t, None).await;
    let reply = send(&app.router, Method::DELETE, "/api/admin/experiences/draft/items/1", t, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["deletedFromStore"], false);
    send(
        &app.router,
        Method::POST,
        "/api/admin/experiences/draft/move",
        t,
        Some(json!({ "from": 1, "to": 0 })),
    )
    .await;
    let reply = send(&app.router, Method::POST, "/api/admin/experiences/draft/save", t, None).await;
    let outcome = reply.json();
    assert_eq!(outcome["deleted"].as_array().unwrap().len(), 1);
    assert_eq!(companies(&outcome["records"]), vec!["Globex", "Initech"]);
}

#[tokio::test]
async fn invalid_rows_block_the_whole_save() {
    let app = app();
    let token = login(&app.router).await;
    let t = Some(token.as_str());

    let mut broken = experience("");
    broken["technologies"] = json!([" ", ""]);
    let reply = send(
        &app.router,
        Method::PUT,
        "/api/admin/experiences",
        t,
        Some(json!([experience("Acme"), broken])),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = reply.json();
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"experiences[1].company"), "{fields:?}");
    assert!(fields.contains(&"experiences[1].technologies"), "{fields:?}");

    let stored = send(&app.router, Method::GET, "/api/admin/experiences", t, None).await;
    assert_eq!(stored.json(), json!([]));
}

#[tokio::test]
async fn edits_without_a_draft_are_not_found() {
    let app = app();
    let token = login(&app.router).await;

    let reply = send(
        &app.router,
        Method::POST,
        "/api/admin/projects/draft/save",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_range_index_is_a_validation_error() {
    let app = app();
    let token = login(&app.router).await;
    let t = Some(token.as_str());

    send(&app.router, Method::POST, "/api/admin/experiences/draft", t, None).await;
    let reply = send(
        &app.router,
        Method::PUT,
        "/api/admin/experiences/draft/items/4",
        t,
        Some(experience("Acme")),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.json()["fields"][0]["field"], "index");
}

#[tokio::test]
async fn immediate_removal_deletes_from_the_store() {
    let app = app();
    let token = login(&app.router).await;
    let t = Some(token.as_str());

    let saved = send(
        &app.router,
        Method::PUT,
        "/api/admin/experiences",
        t,
        Some(json!([experience("Acme"), experience("Globex")])),
    )
    .await;
    assert_eq!(saved.status, StatusCode::OK, "{}", saved.text);

    send(&app.router, Method::POST, "/api/admin/experiences/draft", t, None).await;
    let reply = send(
        &app.router,
        Method::DELETE,
        "/api/admin/experiences/draft/items/0?immediate=true",
        t,
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text);
    let body = reply.json();
    assert_eq!(body["deletedFromStore"], true);
    assert_eq!(body["removed"]["company"], "Acme");

    let stored = send(&app.router, Method::GET, "/api/admin/experiences", t, None).await;
    assert_eq!(companies(&stored.json()), vec!["Globex"]);
}

#[tokio::test]
async fn failed_immediate_removal_reports_the_draft() {
    let store = Arc::new(FlakyStore::new(MemoryDocumentStore::new()));
    let app = app_with_store(store.clone());
    let token = login(&app.router).await;
    let t = Some(token.as_str());

    send(
        &app.router,
        Method::PUT,
        "/api/admin/education",
        t,
        Some(json!([{
            "degree": { "fr": "Master", "en": "MSc" },
            "institution": "INSA Lyon",
            "duration": "2015 - 2017",
            "description": { "fr": "Informatique.", "en": "Computer science." }
        }])),
    )
    .await;
    send(&app.router, Method::POST, "/api/admin/education/draft", t, None).await;

    store.fail_next_commits(1);
    let reply = send(
        &app.router,
        Method::DELETE,
        "/api/admin/education/draft/items/0?immediate=true",
        t,
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    let body = reply.json();
    assert_eq!(body["code"], "delete_error");
    assert_eq!(body["draft"], json!([]));

    // The record is still stored.
    let stored = send(&app.router, Method::GET, "/api/admin/education", t, None).await;
    assert_eq!(stored.json().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn direct_delete_is_idempotent() {
    let app = app();
    let token = login(&app.router).await;
    let t = Some(token.as_str());

    let saved = send(
        &app.router,
        Method::PUT,
        "/api/admin/experiences",
        t,
        Some(json!([experience("Acme"), experience("Globex")])),
    )
    .await;
    assert_eq!(saved.status, StatusCode::OK, "{}", saved.text);
    let id = saved.json()["records"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/admin/experiences/{id}");

    let reply = send(&app.router, Method::DELETE, &uri, t, None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT, "{}", reply.text);
    let stored = send(&app.router, Method::GET, "/api/admin/experiences", t, None).await;
    assert_eq!(companies(&stored.json()), vec!["Globex"]);

    // Already gone.
    let reply = send(&app.router, Method::DELETE, &uri, t, None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    let stored = send(&app.router, Method::GET, "/api/admin/experiences", t, None).await;
    assert_eq!(companies(&stored.json()), vec!["Globex"]);
}

#[tokio::test]
async fn failed_direct_delete_is_a_delete_error() {
    let store = Arc::new(FlakyStore::new(MemoryDocumentStore::new()));
    let app = app_with_store(store.clone());
    let token = login(&app.router).await;
    let t = Some(token.as_str());

    let saved = send(
        &app.router,
        Method::PUT,
        "/api/admin/experiences",
        t,
        Some(json!([experience("Acme")])),
    )
    .await;
    let id = saved.json()["records"][0]["id"].as_str().unwrap().to_string();

    store.fail_next_commits(1);
    let reply = send(
        &app.router,
        Method::DELETE,
        &format!("/api/admin/experiences/{id}"),
        t,
        None,
    )
    .await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply.json()["code"], "delete_error");

    let stored = send(&app.router, Method::GET, "/api/admin/experiences", t, None).await;
    assert_eq!(companies(&stored.json()), vec!["Acme"]);
}

#[tokio::test]
async fn draft_is_a_reserved_record_id() {
    let app = app();
    let token = login(&app.router).await;
    let t = Some(token.as_str());

    let mut row = experience("Acme");
    row["id"] = json!("draft");
    let reply = send(&app.router, Method::PUT, "/api/admin/experiences", t, Some(json!([row]))).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY, "{}", reply.text);
    assert_eq!(reply.json()["fields"][0]["field"], "experiences[0].id");

    let stored = send(&app.router, Method::GET, "/api/admin/experiences", t, None).await;
    assert_eq!(stored.json(), json!([]));
}

#[tokio::test]
async fn contacts_are_listed_newest_first() {
    let app = app();
    for name in ["First", "Second"] {
        let reply = send(
            &app.router,
            Method::POST,
            "/api/contact",
            None,
            Some(json!({
                "name": name,
                "email": "visitor@example.com",
                "message": "Hello, this is a message."
            })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let token = login(&app.router).await;
    let reply = send(&app.router, Method::GET, "/api/admin/contacts", Some(&token), None).await;
    let names: Vec<String> = reply
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"First".to_string()));

    let dashboard = send(&app.router, Method::GET, "/api/admin/dashboard", Some(&token), None).await;
    assert_eq!(dashboard.json()["contacts"], 2);
}

#[tokio::test]
async fn uploads_are_stored_and_served() {
    let app = app();
    let token = login(&app.router).await;

    let reply = send(
        &app.router,
        Method::POST,
        "/api/admin/uploads",
        Some(&token),
        Some(json!({ "category": "avatars", "filename": "Me Photo.png", "dataUrl": PIXEL })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text);
    let stored = reply.json();
    let url = stored["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/avatars/"), "{url}");
    assert_eq!(stored["contentType"], "image/png");

    let served = get(&app.router, &url).await;
    assert_eq!(served.status, StatusCode::OK);

    let reply = send(
        &app.router,
        Method::POST,
        "/api/admin/uploads",
        Some(&token),
        Some(json!({ "category": "projects", "filename": "a.txt", "dataUrl": "data:text/plain;base64,aGk=" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.json()["fields"][0]["field"], "dataUrl");
}
