mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{setup_db, test_config};
use learning_journal::db::entities::user;
use learning_journal::services::auth_service;
use learning_journal::web::create_axum_router;

async fn app() -> Router {
    create_axum_router(setup_db().await, Arc::new(test_config()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _, _) = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": email, "password": "password", "password_confirm": "password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn entry_body(title: &str, content: &str) -> Value {
    json!({
        "title": title,
        "time_spent": 2,
        "date_created": "17/05/2024",
        "content": content,
        "resources": "the book"
    })
}

fn tag_list(body: &Value) -> Vec<&str> {
    body["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health_check_responds() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_validates_input() {
    let app = app().await;

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": "email@email.com", "password": "password", "password_confirm": "different" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": "not-an-email", "password": "password", "password_confirm": "password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_twice_is_a_conflict() {
    let app = app().await;
    register_and_login(&app, "email@email.com").await;

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": "email@email.com", "password": "password", "password_confirm": "password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_sets_cookie_and_rejects_bad_password() {
    let app = app().await;
    register_and_login(&app, "email@email.com").await;

    let (status, cookie, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "email@email.com", "password": "password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "email@email.com");
    let cookie = cookie.unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "email@email.com", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "nobody@email.com", "password": "password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_accepts_bearer_token_or_cookie() {
    let app = app().await;
    let token = register_and_login(&app, "email@email.com").await;

    let (status, _, body) = send(&app, empty_request("GET", "/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "email@email.com");

    let request = Request::builder()
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, empty_request("GET", "/api/auth/me", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_cookie() {
    let app = app().await;

    let (status, cookie, body) = send(&app, empty_request("POST", "/api/auth/logout", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "You have been logged out");
    let cookie = cookie.unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn writes_require_authentication() {
    let app = app().await;

    let (status, _, _) = send(
        &app,
        json_request("POST", "/api/entries", None, entry_body("Title", "content")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        json_request("POST", "/api/tags", None, json!({ "name": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(&app, empty_request("GET", "/api/entries", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn new_entry_is_tagged_with_existing_tags() {
    let app = app().await;
    let token = register_and_login(&app, "email@email.com").await;

    for name in ["sets", "dictionaries"] {
        let (status, _, _) = send(
            &app,
            json_request("POST", "/api/tags", Some(&token), json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/entries",
            Some(&token),
            entry_body("Collections", "Learned about sets and maps today"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tag_list(&body), vec!["sets"]);
    assert_eq!(body["date_created"], "2024-05-17");
    assert_eq!(body["time_spent"], 2);

    let id = body["id"].as_i64().unwrap();
    let (status, _, body) =
        send(&app, empty_request("GET", &format!("/api/entries/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Collections");
    assert_eq!(tag_list(&body), vec!["sets"]);
}

#[tokio::test]
async fn new_tag_is_applied_to_existing_entries() {
    let app = app().await;
    let token = register_and_login(&app, "email@email.com").await;

    send(
        &app,
        json_request("POST", "/api/entries", Some(&token), entry_body("Plural", "all about maps")),
    )
    .await;
    send(
        &app,
        json_request("POST", "/api/entries", Some(&token), entry_body("Other", "sets only")),
    )
    .await;

    let (status, _, body) = send(
        &app,
        json_request("POST", "/api/tags", Some(&token), json!({ "name": "map" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tagged_entries"], 1);
    let tag_id = body["id"].as_i64().unwrap();

    let (status, _, body) = send(
        &app,
        empty_request("GET", &format!("/api/tags/{tag_id}/entries"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "Plural");

    let (status, _, body) = send(&app, empty_request("GET", "/api/tags", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": tag_id, "name": "map", "entryCount": 1 }]));
}

#[tokio::test]
async fn editing_entry_prunes_removed_tags() {
    let app = app().await;
    let token = register_and_login(&app, "email@email.com").await;

    for name in ["maps", "sets"] {
        send(
            &app,
            json_request("POST", "/api/tags", Some(&token), json!({ "name": name })),
        )
        .await;
    }
    let (_, _, body) = send(
        &app,
        json_request("POST", "/api/entries", Some(&token), entry_body("Collections", "maps and sets")),
    )
    .await;
    assert_eq!(tag_list(&body), vec!["maps", "sets"]);
    let id = body["id"].as_i64().unwrap();

    let (status, _, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/entries/{id}"),
            Some(&token),
            entry_body("Collections", "only maps now"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "only maps now");
    assert_eq!(tag_list(&body), vec!["maps"]);
}

#[tokio::test]
async fn other_users_cannot_edit_or_delete_entry() {
    let app = app().await;
    let owner = register_and_login(&app, "owner@email.com").await;
    let intruder = register_and_login(&app, "intruder@email.com").await;

    let (_, _, body) = send(
        &app,
        json_request("POST", "/api/entries", Some(&owner), entry_body("Mine", "private notes")),
    )
    .await;
    let id = body["id"].as_i64().unwrap();

    let (status, _, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/entries/{id}"),
            Some(&intruder),
            entry_body("Mine", "defaced"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app,
        empty_request("DELETE", &format!("/api/entries/{id}"), Some(&intruder)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app,
        empty_request("DELETE", &format!("/api/entries/{id}"), Some(&owner)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(
        &app,
        empty_request("GET", &format!("/api/entries/{id}"), Some(&owner)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicates_and_bad_input_are_rejected() {
    let app = app().await;
    let token = register_and_login(&app, "email@email.com").await;

    send(
        &app,
        json_request("POST", "/api/entries", Some(&token), entry_body("Title", "content")),
    )
    .await;
    let (status, _, _) = send(
        &app,
        json_request("POST", "/api/entries", Some(&token), entry_body("Title", "other")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &app,
        json_request("POST", "/api/tags", Some(&token), json!({ "name": "rust" })),
    )
    .await;
    let (status, _, _) = send(
        &app,
        json_request("POST", "/api/tags", Some(&token), json!({ "name": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut bad_date = entry_body("Dated", "content");
    bad_date["date_created"] = json!("May 17th");
    let (status, _, _) = send(
        &app,
        json_request("POST", "/api/entries", Some(&token), bad_date),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_tag_removes_it_from_entries() {
    let app = app().await;
    let token = register_and_login(&app, "email@email.com").await;

    let (_, _, tag) = send(
        &app,
        json_request("POST", "/api/tags", Some(&token), json!({ "name": "maps" })),
    )
    .await;
    let tag_id = tag["id"].as_i64().unwrap();
    let (_, _, entry) = send(
        &app,
        json_request("POST", "/api/entries", Some(&token), entry_body("Collections", "maps")),
    )
    .await;
    let id = entry["id"].as_i64().unwrap();

    let (status, _, _) = send(
        &app,
        empty_request("DELETE", &format!("/api/tags/{tag_id}"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = send(
        &app,
        empty_request("GET", &format!("/api/entries/{id}"), Some(&token)),
    )
    .await;
    assert!(tag_list(&body).is_empty());

    let (status, _, _) = send(
        &app,
        empty_request("DELETE", &format!("/api/tags/{tag_id}"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recent_entries_are_public_and_capped() {
    let app = app().await;
    let token = register_and_login(&app, "email@email.com").await;

    for i in 0..10 {
        send(
            &app,
            json_request(
                "POST",
                "/api/entries",
                Some(&token),
                entry_body(&format!("Entry {i}"), "content"),
            ),
        )
        .await;
    }

    let (status, _, body) = send(&app, empty_request("GET", "/api/entries/recent", None)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 8);
    assert_eq!(entries[0]["title"], "Entry 9");

    let (_, _, body) = send(&app, empty_request("GET", "/api/entries?limit=3", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn secure_cookie_when_configured() {
    let mut config = test_config();
    config.cookie_secure = true;
    let app = create_axum_router(setup_db().await, Arc::new(config));
    register_and_login(&app, "email@email.com").await;

    let (_, cookie, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "email@email.com", "password": "password" }),
        ),
    )
    .await;
    assert!(cookie.unwrap().contains("Secure"));
}

#[tokio::test]
async fn token_for_unknown_user_is_rejected() {
    let app = app().await;
    let ghost = user::Model {
        id: 999,
        email: "ghost@email.com".to_string(),
        password_hash: String::new(),
    };
    let token = auth_service::create_jwt_for_user(&ghost, &test_config().jwt_secret, 1)
        .unwrap()
        .token;

    let (status, _, _) = send(&app, empty_request("GET", "/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        json_request("POST", "/api/entries", Some(&token), entry_body("Orphan", "content")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
