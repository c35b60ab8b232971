use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info};

use crate::handlers::error::{internal_error, ApiError};
use crate::models::{
    DirectoryListResponse, FileMutationResponse, FileReadResponse, FileTreeResponse,
    FileWriteRequest,
};
use crate::services::ReadResult;
use crate::state::AppState;

/// Full project tree
pub async fn file_tree(State(state): State<AppState>) -> Result<Json<FileTreeResponse>, ApiError> {
    debug!("Project tree requested");
    let files = state.files.list_tree().await?;
    Ok(Json(FileTreeResponse {
        success: true,
        files,
    }))
}

/// Read a file, or list a directory one level deep
pub async fn file_read(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
) -> Result<Response, ApiError> {
    debug!("Read requested for '{}'", file_path);
    match state.files.read(&file_path).await? {
        ReadResult::File(file) => Ok(Json(FileReadResponse {
            success: true,
            content: file.content,
            stats: file.stats,
        })
        .into_response()),
        ReadResult::Directory(files) => Ok(Json(DirectoryListResponse {
            success: true,
            files,
        })
        .into_response()),
    }
}

/// Write a file, creating missing folders
pub async fn file_write(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
    payload: Result<Json<FileWriteRequest>, JsonRejection>,
) -> Result<Json<FileMutationResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        error!("Invalid write request for '{}': {}", file_path, e);
        internal_error(e.body_text())
    })?;

    let notice = state.files.write_file(&file_path, &request.content).await?;
    info!("File '{}' written via API", notice.file_path);
    Ok(Json(FileMutationResponse { success: true }))
}

/// Delete a file
pub async fn file_delete(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
) -> Result<Json<FileMutationResponse>, ApiError> {
    let notice = state.files.delete_file(&file_path).await?;
    info!("File '{}' deleted via API", notice.file_path);
    Ok(Json(FileMutationResponse { success: true }))
}
