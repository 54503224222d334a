use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::TokenError;
use super::helpers::{TokenExtractionError, extract_token};
use crate::server::AppState;

/// Extractor that requires a valid session token. Holds the verified user id.
pub struct RequireUser(pub String);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingAuth => "Authentication required",
            AuthError::InvalidScheme => "Invalid authorization scheme",
            AuthError::InvalidToken => "Invalid token",
            AuthError::TokenExpired => "Token expired",
        };

        let body = json!({ "data": null, "error": message, "code": "unauthenticated" });

        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        response.headers_mut().insert(
            "WWW-Authenticate",
            HeaderValue::from_static("Bearer realm=\"themeshelf\""),
        );
        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw_token = extract_token(&parts.headers)
            .map_err(|e| match e {
                TokenExtractionError::InvalidScheme => AuthError::InvalidScheme,
            })?
            .ok_or(AuthError::MissingAuth)?;

        let user_id = state.tokens.verify(&raw_token).map_err(|e| {
            tracing::debug!("Rejected session token: {e:?}");
            match e {
                TokenError::Expired => AuthError::TokenExpired,
                TokenError::Malformed | TokenError::BadSignature => AuthError::InvalidToken,
            }
        })?;

        Ok(RequireUser(user_id))
    }
}
