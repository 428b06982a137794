use std::sync::Arc;

use axum::{extract::Multipart, http::StatusCode, Extension, Json};
use chrono::Utc;

use crate::{
    authentication::AuthUser,
    data_formats::{read_editor_upload, UploadResponse},
    errors::RequestError,
    storage::{editor_file_name, EDITOR_AREA},
    AppContext, JsonResponse,
};

/// Stores an image dropped into the rich-text editor and returns its public
/// URL in the shape the editor's upload adapter reads.
pub async fn upload_image(
    Extension(ctx): Extension<Arc<AppContext>>,
    user: AuthUser,
    multipart: Option<Multipart>,
) -> Result<JsonResponse<UploadResponse>, RequestError> {
    let file = match multipart {
        Some(multipart) => read_editor_upload(multipart).await?,
        None => None,
    };
    let file = match file {
        Some(file) => file,
        None => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(UploadResponse::missing_file()),
            ))
        }
    };

    let name = editor_file_name(&file.file_name, Utc::now().timestamp());
    let path = ctx.storage.put_as(EDITOR_AREA, &name, &file.bytes).await?;
    tracing::info!(user_id = user.id, %path, bytes = file.bytes.len(), "editor image stored");
    Ok((
        StatusCode::OK,
        Json(UploadResponse::uploaded(ctx.storage.url(&path))),
    ))
}
