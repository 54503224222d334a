//! HTTP API tests. Each test drives the router in process against its own
//! temporary database.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, Utc};

use common::{ALICE, BOB, Form, TestApp, png};
use themeshelf::auth::SESSION_COOKIE;
use themeshelf::store::Repository;

fn assert_error(response: &common::TestResponse, status: StatusCode, code: &str) {
    assert_eq!(
        response.status,
        status,
        "unexpected body: {}",
        String::from_utf8_lossy(&response.body)
    );
    let body = response.json();
    assert_eq!(body["code"], code);
    assert!(body["data"].is_null());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"OK");
}

#[tokio::test]
async fn test_commit_requires_authentication() {
    let app = TestApp::new();

    let response = app.commit(None, Form::commit("acme", 1, "body{}")).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "unauthenticated");
    assert!(response.headers.contains_key(header::WWW_AUTHENTICATE));

    let response = app
        .commit(Some("not-a-real-token"), Form::commit("acme", 1, "body{}"))
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "unauthenticated");

    assert!(app.store.get_theme("acme").unwrap().is_none());
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new();
    let expired = app
        .tokens
        .issue(ALICE, Utc::now() - Duration::seconds(1))
        .unwrap();

    let response = app.get_as("/api/v1/me", &expired).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "unauthenticated");
}

#[tokio::test]
async fn test_create_theme() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    let response = app
        .commit(Some(&token), Form::commit("acme", 1, "body{color:red}"))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.header(header::LOCATION), "/api/v1/themes/acme");

    let theme = &response.json()["data"];
    assert_eq!(theme["id"], "acme");
    assert_eq!(theme["latest_commit_version"], 1);
    assert_eq!(theme["latest_commit"]["content"], "body{color:red}");
    assert_eq!(theme["latest_commit"]["created_by"], ALICE);
    assert_eq!(theme["admins"], serde_json::json!([ALICE]));
}

#[tokio::test]
async fn test_stale_version_conflicts() {
    let app = TestApp::new();
    app.publish(ALICE, "acme", 1, "body{color:red}").await;
    let token = app.token_for(ALICE);

    let response = app
        .commit(Some(&token), Form::commit("acme", 1, "body{color:blue}"))
        .await;
    assert_error(&response, StatusCode::CONFLICT, "version_conflict");

    let theme = app.store.get_theme("acme").unwrap().unwrap();
    assert_eq!(theme.latest_commit.unwrap().content, "body{color:red}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_commits_of_same_version() {
    let app = TestApp::new();
    app.publish(ALICE, "acme", 1, "body{}").await;
    let token = app.token_for(ALICE);

    let (first, second) = tokio::join!(
        app.commit(
            Some(&token),
            Form::commit("acme", 2, "body{color:red}").file("preview", png(8, 8))
        ),
        app.commit(
            Some(&token),
            Form::commit("acme", 2, "body{color:blue}").file("preview", png(8, 8))
        ),
    );

    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let theme = app.store.get_theme("acme").unwrap().unwrap();
    assert_eq!(theme.latest_commit_version, Some(2));
    assert_eq!(theme.previews.len(), 1);
    assert_eq!(app.store.list_commits("acme").unwrap().len(), 2);
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    let app = TestApp::new();
    app.publish(ALICE, "acme", 1, "body{}").await;
    let token = app.token_for(BOB);

    let response = app
        .commit(Some(&token), Form::commit("acme", 2, "body{color:green}"))
        .await;
    assert_error(&response, StatusCode::FORBIDDEN, "forbidden");
    assert!(app.store.get_commit("acme", 2).unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_theme_needs_version_one() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    let response = app
        .commit(Some(&token), Form::commit("ghost", 2, "body{}"))
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_invalid_input() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    for theme_id in ["new", "commit", "x", "Upper"] {
        let response = app
            .commit(Some(&token), Form::commit(theme_id, 1, "body{}"))
            .await;
        assert_error(&response, StatusCode::BAD_REQUEST, "invalid_input");
    }

    let response = app
        .commit(Some(&token), Form::commit("acme", 1, "body{}").file("preview", b"GIF89a".to_vec()))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "invalid_input");

    let form = Form::default()
        .text("theme_id", "acme")
        .text("content", "body{}");
    let response = app.commit(Some(&token), form).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "invalid_input");

    let form = Form::default()
        .text("theme_id", "acme")
        .text("commit_id", "one");
    let response = app.commit(Some(&token), form).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "invalid_input");

    assert!(app.store.list_themes().unwrap().is_empty());
}

#[tokio::test]
async fn test_preview_quota() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    let mut form = Form::commit("acme", 1, "body{}");
    for i in 0..9 {
        form = form.file("preview", png(i + 1, 1));
    }
    let response = app.commit(Some(&token), form).await;

    assert_error(&response, StatusCode::UNPROCESSABLE_ENTITY, "quota_exceeded");
    assert!(app.store.get_theme("acme").unwrap().is_none());
}

#[tokio::test]
async fn test_preview_upload_and_download() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);
    let image = png(20, 10);

    let form = Form::commit("acme", 1, "body{}")
        .file("preview", image.clone())
        // An empty file input is ignored.
        .file("preview", Vec::new());
    let response = app.commit(Some(&token), form).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let previews = response.json()["data"]["previews"].clone();
    assert_eq!(previews.as_array().unwrap().len(), 1);
    let image_id = previews[0].as_str().unwrap().to_string();

    let response = app.get(&format!("/api/v1/images/{image_id}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "image/png");
    assert_eq!(
        response.header(header::CACHE_CONTROL),
        "max-age=2592000, immutable"
    );
    assert_eq!(&response.body[..], &image[..]);

    let stored = app.store.get_preview_image(&image_id).unwrap().unwrap();
    assert_eq!((stored.width, stored.height), (20, 10));

    let form = Form::commit("acme", 2, "body{}").text("remove_preview", &image_id);
    let response = app.commit(Some(&token), form).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.json()["data"]["previews"].as_array().unwrap().is_empty());

    let response = app.get(&format!("/api/v1/images/{image_id}")).await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_image_lookup_errors() {
    let app = TestApp::new();

    let response = app.get("/api/v1/images/not-a-uuid").await;
    assert_error(&response, StatusCode::BAD_REQUEST, "invalid_input");

    let response = app
        .get("/api/v1/images/67e55044-10b1-426f-9247-bb680e5fe0c8")
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_removing_foreign_preview_is_rejected() {
    let app = TestApp::new();
    let bob = app.token_for(BOB);
    let response = app
        .commit(Some(&bob), Form::commit("other", 1, "x").file("preview", png(2, 2)))
        .await;
    let foreign = response.json()["data"]["previews"][0]
        .as_str()
        .unwrap()
        .to_string();

    app.publish(ALICE, "acme", 1, "body{}").await;
    let alice = app.token_for(ALICE);
    let form = Form::commit("acme", 2, "body{}").text("remove_preview", &foreign);
    let response = app.commit(Some(&alice), form).await;

    assert_error(&response, StatusCode::BAD_REQUEST, "invalid_input");
    assert!(app.store.get_preview_image(&foreign).unwrap().is_some());
}

#[tokio::test]
async fn test_read_theme() {
    let app = TestApp::new();
    app.publish(ALICE, "acme", 1, "body{color:red}").await;
    app.publish(ALICE, "acme", 2, "body{color:blue}").await;

    let response = app.get("/api/v1/themes/acme").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["data"]["latest_commit_version"], 2);

    let response = app.get("/api/v1/themes/acme.json").await;
    assert_eq!(response.json()["data"]["id"], "acme");

    let response = app.get("/api/v1/themes/acme.css").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .header(header::CONTENT_TYPE)
            .starts_with("text/css")
    );
    assert_eq!(&response.body[..], b"body{color:blue}");

    let response = app.get("/api/v1/themes/missing").await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_commit_history() {
    let app = TestApp::new();
    app.publish(ALICE, "acme", 1, "body{color:red}").await;
    app.publish(ALICE, "acme", 2, "body{color:blue}").await;

    let response = app.get("/api/v1/themes/acme/commits").await;
    let commits = response.json()["data"].clone();
    let versions: Vec<i64> = commits
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["version"].as_i64().unwrap())
        .collect();
    assert_eq!(versions, vec![1, 2]);

    let response = app.get("/api/v1/themes/acme/commits/1").await;
    assert_eq!(response.json()["data"]["content"], "body{color:red}");

    let response = app.get("/api/v1/themes/acme/commits/1.css").await;
    assert_eq!(&response.body[..], b"body{color:red}");

    let response = app.get("/api/v1/themes/acme/commits/7").await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");

    let response = app.get("/api/v1/themes/acme/commits/latest").await;
    assert_error(&response, StatusCode::BAD_REQUEST, "invalid_input");

    let response = app.get("/api/v1/themes/ghost/commits").await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}

#[tokio::test]
async fn test_theme_listings() {
    let app = TestApp::new();
    app.publish(ALICE, "acme", 1, "a").await;
    app.publish(BOB, "zen", 1, "z").await;

    let response = app.get("/api/v1/themes").await;
    assert_eq!(response.json()["data"].as_array().unwrap().len(), 2);

    let response = app.get(&format!("/api/v1/users/{BOB}/themes")).await;
    let themes = response.json()["data"].clone();
    assert_eq!(themes.as_array().unwrap().len(), 1);
    assert_eq!(themes[0]["id"], "zen");

    let response = app.get_as("/api/v1/me", &app.token_for(ALICE)).await;
    let me = response.json()["data"].clone();
    assert_eq!(me["user_id"], ALICE);
    assert_eq!(me["themes"][0]["id"], "acme");
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = TestApp::new();
    let token = app.token_for(ALICE);

    let request = Request::get("/api/v1/me")
        .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["data"]["user_id"], ALICE);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new();

    let response = app
        .get("/login?server_name=example.org&token=valid")
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION), "/");

    let cookie = response.header(header::SET_COOKIE).to_string();
    assert!(cookie.contains("HttpOnly"));
    let token = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix(&format!("{SESSION_COOKIE}=")))
        .expect("session cookie")
        .to_string();

    let response = app.get_as("/api/v1/me", &token).await;
    assert_eq!(response.json()["data"]["user_id"], ALICE);
}

#[tokio::test]
async fn test_login_rejects_bad_assertion() {
    let app = TestApp::new();

    let response = app
        .get("/login?server_name=example.org&token=forged")
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "unauthenticated");
    assert!(!response.headers.contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn test_login_without_provider() {
    let app = TestApp::without_identity_provider();

    let response = app
        .get("/login?server_name=example.org&token=valid")
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "not_found");
}
