use axum::{
    Extension,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use tracing::warn;

use petitions_types::Capability;
use petitions_types::api::{Claims, UploadQuery};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{Json, Query, RawBody};
use crate::middleware::authorize;

/// POST /uploads?fileName=&prefix=: raw file body, forwarded to the bucket.
/// Returns the public URL to reference from a petition or profile.
pub async fn upload(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    RawBody(bytes): RawBody,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&claims, Capability::UploadFiles)?;

    let Some(storage) = state.storage.as_ref() else {
        warn!("Upload attempted but file storage is not configured");
        return Err(ApiError::Unavailable("file uploads are disabled on this server".into()));
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let uploaded = storage
        .upload(&query.file_name, content_type, bytes.to_vec(), query.prefix.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(uploaded)))
}
