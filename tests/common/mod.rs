use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::{Duration, Utc};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use themeshelf::auth::{IdentityProvider, LoginAssertion, TokenCodec};
use themeshelf::config::AuthConfig;
use themeshelf::error::{Error, Result};
use themeshelf::server::{AppState, create_router};
use themeshelf::store::{SqliteStore, Store};

pub const ALICE: &str = "@alice:example.org";
pub const BOB: &str = "@bob:example.org";

const SECRET: &str = "integration-test-secret";
const BOUNDARY: &str = "themeshelf-test-boundary";

/// Accepts the assertion token "valid" and names the user after the server.
pub struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn resolve_user(&self, assertion: &LoginAssertion) -> Result<String> {
        if assertion.token == "valid" {
            Ok(format!("@alice:{}", assertion.server_name))
        } else {
            Err(Error::Unauthenticated)
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(&name)
            .unwrap_or_else(|| panic!("missing {name} header"))
            .to_str()
            .expect("header is ASCII")
    }
}

pub struct TestApp {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub tokens: TokenCodec,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(true)
    }

    pub fn without_identity_provider() -> Self {
        Self::build(false)
    }

    fn build(with_provider: bool) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(
            SqliteStore::new(temp_dir.path().join("themeshelf.db")).expect("open store"),
        );
        store.initialize().expect("initialize store");

        let auth = AuthConfig::new(SECRET);
        let tokens = TokenCodec::new(&auth).expect("token codec");

        let mut state = AppState::new(store.clone(), &auth)
            .expect("app state")
            .with_secure_cookies(false);
        if with_provider {
            state = state.with_identity_provider(Arc::new(FakeProvider));
        }

        Self {
            temp_dir,
            store,
            tokens,
            router: create_router(Arc::new(state)),
        }
    }

    pub fn token_for(&self, user_id: &str) -> String {
        self.tokens
            .issue(user_id, Utc::now() + Duration::hours(1))
            .expect("issue token")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_as(&self, uri: &str, token: &str) -> TestResponse {
        self.send(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn commit(&self, token: Option<&str>, form: Form) -> TestResponse {
        let mut request = Request::post("/api/v1/themes/commit").header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::from(form.encode())).unwrap())
            .await
    }

    /// Publishes `version` of `theme_id` as `user`, panicking unless it succeeds.
    pub async fn publish(&self, user: &str, theme_id: &str, version: i64, content: &str) -> Value {
        let token = self.token_for(user);
        let response = self
            .commit(Some(&token), Form::commit(theme_id, version, content))
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "publish failed: {}",
            String::from_utf8_lossy(&response.body)
        );
        response.json()["data"].clone()
    }
}

enum Part {
    Text(String, String),
    File(String, Vec<u8>),
}

/// A multipart/form-data body.
#[derive(Default)]
pub struct Form {
    parts: Vec<Part>,
}

impl Form {
    pub fn commit(theme_id: &str, version: i64, content: &str) -> Self {
        Self::default()
            .text("theme_id", theme_id)
            .text("commit_id", &version.to_string())
            .text("name", "Acme")
            .text("description", "A test theme")
            .text("content", content)
            .text("message", &format!("version {version}"))
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts
            .push(Part::Text(name.to_string(), value.to_string()));
        self
    }

    pub fn file(mut self, name: &str, data: Vec<u8>) -> Self {
        self.parts.push(Part::File(name.to_string(), data));
        self
    }

    fn encode(self) -> Vec<u8> {
        let mut body = Vec::new();
        for part in self.parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"upload\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let pixels = vec![0x40; (width * height * 3) as usize];
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
        .expect("encode png");
    buf
}
