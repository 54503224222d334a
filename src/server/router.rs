use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post},
};

use super::commit::{MAX_COMMIT_BODY, post_commit};
use super::{images, login, themes};
use crate::auth::{IdentityProvider, TokenCodec};
use crate::config::AuthConfig;
use crate::error::Result;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenCodec,
    pub session_lifetime: chrono::Duration,
    /// Whether session cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
    /// Verifies login assertions. `/login` answers 404 without one.
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: &AuthConfig) -> Result<Self> {
        Ok(Self {
            store,
            tokens: TokenCodec::new(auth)?,
            session_lifetime: auth.session_lifetime,
            secure_cookies: true,
            identity: None,
        })
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(themes::me))
        .route("/themes", get(themes::list_themes))
        .route(
            "/themes/commit",
            post(post_commit).layer(DefaultBodyLimit::max(MAX_COMMIT_BODY)),
        )
        .route("/themes/{id}", get(themes::get_theme))
        .route("/themes/{id}/commits", get(themes::list_commits))
        .route("/themes/{id}/commits/{version}", get(themes::get_commit))
        .route("/users/{user_id}/themes", get(themes::list_user_themes))
        .route("/images/{image_id}", get(images::get_image))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", get(login::login))
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
