use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect},
};
use chrono::Utc;

use crate::auth::{LoginAssertion, session_cookie};
use crate::server::AppState;
use crate::server::response::ApiError;

/// GET /login?server_name=&token= - Trades an identity provider assertion for a session cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(assertion): Query<LoginAssertion>,
) -> Result<impl IntoResponse, ApiError> {
    let provider = state
        .identity
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Login is not configured on this server"))?;

    let user_id = provider.resolve_user(&assertion).await.map_err(|e| {
        tracing::warn!(server_name = %assertion.server_name, "Login assertion rejected: {e}");
        ApiError::from(e)
    })?;

    let token = state
        .tokens
        .issue(&user_id, Utc::now() + state.session_lifetime)?;
    let cookie = session_cookie(&token, state.session_lifetime, state.secure_cookies);

    tracing::info!(user_id, "User logged in");

    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")))
}
