use serde::Serialize;

use crate::types::Theme;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub themes: Vec<Theme>,
}

/// Representation picked by a `.json` or `.css` suffix on the last path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Json,
    Css,
}

/// Splits a trailing `.json` / `.css` off a path segment.
#[must_use]
pub fn split_representation(segment: &str) -> (&str, Representation) {
    if let Some(value) = segment.strip_suffix(".json") {
        (value, Representation::Json)
    } else if let Some(value) = segment.strip_suffix(".css") {
        (value, Representation::Css)
    } else {
        (segment, Representation::Json)
    }
}
