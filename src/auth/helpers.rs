use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use chrono::Duration;

pub const SESSION_COOKIE: &str = "themeshelf_session";

#[derive(Debug, PartialEq, Eq)]
pub enum TokenExtractionError {
    InvalidScheme,
}

/// Finds the raw session token in a request.
/// The Authorization header wins over the session cookie when both are present.
/// Returns Ok(None) when the request carries no credentials at all.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, TokenExtractionError> {
    let auth_header = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());

    match auth_header {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(token.trim().to_string())),
            None => Err(TokenExtractionError::InvalidScheme),
        },
        None => Ok(extract_session_cookie(headers)),
    }
}

fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Builds the Set-Cookie value carrying a freshly issued token.
#[must_use]
pub fn session_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        max_age.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
