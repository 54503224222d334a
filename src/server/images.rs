use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::server::AppState;
use crate::server::response::{ApiError, StoreOptionExt};
use crate::store::Repository;
use crate::themes::validation::parse_preview_id;

/// Preview ids are never reused, so clients may cache them for 30 days.
const IMAGE_CACHE_CONTROL: &str = "max-age=2592000, immutable";

/// GET /images/{image_id} - Raw preview image bytes
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(image_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_preview_id(&image_id)?;

    let image = state
        .store
        .get_preview_image(&id)?
        .or_not_found("Image not found")?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&image.mime_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(IMAGE_CACHE_CONTROL),
    );

    Ok((StatusCode::OK, headers, image.content).into_response())
}
