//! End-to-end tests driving the real router against an in-memory database.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{DateTime, Utc};
use db::DBService;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{AppState, app_router};
use tower::ServiceExt;

const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";

async fn test_app() -> Router {
    let db = DBService::new_in_memory().await.unwrap();
    for (user, token) in [("alice", ALICE), ("bob", BOB)] {
        sqlx::query("INSERT INTO user (id, name, email, email_verified) VALUES ($1, $2, $3, 1)")
            .bind(user)
            .bind(user)
            .bind(format!("{user}@example.com"))
            .execute(&db.pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO session (id, token, user_id, expires_at)
             VALUES ($1, $2, $3, datetime('now', '+1 day'))",
        )
        .bind(format!("session-{user}"))
        .bind(token)
        .bind(user)
        .execute(&db.pool)
        .await
        .unwrap();
    }
    app_router(AppState::new(db, None))
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn data(body: &Value) -> &Value {
    &body["data"]
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn create_applies_defaults_and_round_trips() {
    let app = test_app().await;
    let (status, body) = request(
        &app,
        "POST",
        "/api/snippets",
        Some(ALICE),
        Some(json!({"content": "console.log(1)", "tags": "react, hooks"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created = data(&body);
    assert_eq!(created["title"], "untitled");
    assert_eq!(created["language"], "plaintext");
    assert_eq!(created["visibility"], "private");
    assert_eq!(created["tags"], json!(["react", "hooks"]));
    assert_eq!(created["starred"], false);
    assert!(timestamp(&created["created_at"]) <= timestamp(&created["updated_at"]));

    let id = created["id"].as_str().unwrap();
    let (status, body) = request(&app, "GET", &format!("/api/snippets/{id}"), Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["content"], "console.log(1)");
    assert_eq!(data(&body)["id"].as_str(), Some(id));
}

#[tokio::test]
async fn empty_content_is_rejected_and_nothing_persists() {
    let app = test_app().await;
    let (status, body) = request(
        &app,
        "POST",
        "/api/snippets",
        Some(ALICE),
        Some(json!({"content": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = request(&app, "GET", "/api/snippets", Some(ALICE), None).await;
    assert_eq!(data(&body).as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn update_refreshes_updated_at() {
    let app = test_app().await;
    let (_, body) = request(
        &app,
        "POST",
        "/api/snippets",
        Some(ALICE),
        Some(json!({"content": "x"})),
    )
    .await;
    let created_at = timestamp(&data(&body)["created_at"]);
    let first_updated = timestamp(&data(&body)["updated_at"]);
    let id = data(&body)["id"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/snippets/{id}"),
        Some(ALICE),
        Some(json!({"title": "renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["title"], "renamed");
    assert_eq!(data(&body)["content"], "x");
    assert_eq!(timestamp(&data(&body)["created_at"]), created_at);
    assert!(timestamp(&data(&body)["updated_at"]) > first_updated);
}

#[tokio::test]
async fn mutations_require_authentication() {
    let app = test_app().await;
    for (method, uri, body) in [
        ("POST", "/api/snippets", Some(json!({"content": "x"}))),
        ("GET", "/api/snippets", None),
        (
            "POST",
            "/api/snippets/00000000-0000-0000-0000-000000000000/star",
            Some(json!({"starred": true})),
        ),
        ("POST", "/api/folders", Some(json!({"title": "f"}))),
    ] {
        let (status, _) = request(&app, method, uri, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn starring_is_owner_only() {
    let app = test_app().await;
    let (_, body) = request(
        &app,
        "POST",
        "/api/snippets",
        Some(ALICE),
        Some(json!({"content": "x"})),
    )
    .await;
    let id = data(&body)["id"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/snippets/{id}/star"),
        Some(BOB),
        Some(json!({"starred": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/snippets/{id}/star"),
        Some(ALICE),
        Some(json!({"starred": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&app, "GET", "/api/snippets/starred", Some(ALICE), None).await;
    assert_eq!(data(&body).as_array().unwrap().len(), 1);
    let (_, body) = request(&app, "GET", "/api/snippets/starred", Some(BOB), None).await;
    assert_eq!(data(&body).as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn public_read_paths_honor_visibility() {
    let app = test_app().await;
    let (_, body) = request(
        &app,
        "POST",
        "/api/snippets",
        Some(ALICE),
        Some(json!({"content": "secret"})),
    )
    .await;
    let private_id = data(&body)["id"].as_str().unwrap().to_string();
    let (_, body) = request(
        &app,
        "POST",
        "/api/snippets",
        Some(ALICE),
        Some(json!({"content": "shared", "visibility": "public"})),
    )
    .await;
    let public_id = data(&body)["id"].as_str().unwrap().to_string();

    let (status, _) = request(&app, "GET", &format!("/api/snippets/{private_id}/public"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = request(&app, "GET", &format!("/api/snippets/{private_id}/visibility"), None, None).await;
    assert_eq!(data(&body), &json!(false));

    let (status, body) = request(&app, "GET", &format!("/api/snippets/{public_id}/public"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["content"], "shared");
    let (_, body) = request(&app, "GET", &format!("/api/snippets/{public_id}/visibility"), None, None).await;
    assert_eq!(data(&body), &json!(true));

    let (_, body) = request(
        &app,
        "GET",
        "/api/snippets/00000000-0000-0000-0000-000000000000/visibility",
        None,
        None,
    )
    .await;
    assert_eq!(data(&body), &json!(false));
}

#[tokio::test]
async fn search_is_public_only_and_case_sensitive() {
    let app = test_app().await;
    for (title, visibility) in [
        ("Rust iterators", "public"),
        ("rust lifetimes", "public"),
        ("Rust secrets", "private"),
    ] {
        request(
            &app,
            "POST",
            "/api/snippets",
            Some(ALICE),
            Some(json!({"content": "x", "title": title, "visibility": visibility})),
        )
        .await;
    }

    let (status, body) = request(&app, "GET", "/api/search?q=Rust", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = data(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Rust iterators"]);

    let (_, body) = request(&app, "GET", "/api/search", None, None).await;
    assert_eq!(data(&body).as_array().unwrap().len(), 0);
    let (_, body) = request(&app, "GET", "/api/search?q=", None, None).await;
    assert_eq!(data(&body).as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn deleting_a_folder_takes_the_subtree() {
    let app = test_app().await;
    let (_, body) = request(
        &app,
        "POST",
        "/api/folders",
        Some(ALICE),
        Some(json!({"title": "Work"})),
    )
    .await;
    let work = data(&body)["id"].as_str().unwrap().to_string();
    let (_, body) = request(
        &app,
        "POST",
        "/api/folders",
        Some(ALICE),
        Some(json!({"title": "Sub", "parent_id": work})),
    )
    .await;
    let sub = data(&body)["id"].as_str().unwrap().to_string();
    let (_, body) = request(
        &app,
        "POST",
        "/api/snippets",
        Some(ALICE),
        Some(json!({"title": "hello.js", "content": "console.log(1)", "folder_id": sub})),
    )
    .await;
    let snippet = data(&body)["id"].as_str().unwrap().to_string();

    let (status, _) = request(&app, "DELETE", &format!("/api/folders/{work}"), Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, "GET", &format!("/api/folders/{sub}"), Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = request(&app, "GET", &format!("/api/snippets/{snippet}"), Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reparenting_into_own_subtree_is_rejected() {
    let app = test_app().await;
    let (_, body) = request(
        &app,
        "POST",
        "/api/folders",
        Some(ALICE),
        Some(json!({"title": "root"})),
    )
    .await;
    let root = data(&body)["id"].as_str().unwrap().to_string();
    let (_, body) = request(
        &app,
        "POST",
        "/api/folders",
        Some(ALICE),
        Some(json!({"title": "child", "parent_id": root})),
    )
    .await;
    let child = data(&body)["id"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/folders/{root}"),
        Some(ALICE),
        Some(json!({"parent_id": child})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/api/folders/{root}"),
        Some(ALICE),
        Some(json!({"parent_id": root})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn snippet_folder_reference_must_be_owned() {
    let app = test_app().await;
    let (_, body) = request(
        &app,
        "POST",
        "/api/folders",
        Some(BOB),
        Some(json!({"title": "bobs"})),
    )
    .await;
    let bobs = data(&body)["id"].as_str().unwrap().to_string();

    let (status, _) = request(
        &app,
        "POST",
        "/api/snippets",
        Some(ALICE),
        Some(json!({"content": "x", "folder_id": bobs})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_endpoint_reports_the_caller() {
    let app = test_app().await;
    let (status, body) = request(&app, "GET", "/api/auth/session", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["id"], "alice");

    let (status, body) = request(&app, "GET", "/api/auth/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body), &Value::Null);
}

#[tokio::test]
async fn sign_out_invalidates_the_session() {
    let app = test_app().await;
    let (status, _) = request(&app, "POST", "/api/auth/signout", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, "GET", "/api/snippets", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_anonymous() {
    let app = test_app().await;
    let (status, body) = request(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body), &json!("ok"));
}
