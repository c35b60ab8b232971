use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Full project tree, dot entries and node_modules excluded
#[utoipa::path(
    get,
    path = "/api/files",
    responses(
        (status = 200, description = "Project tree", body = FileTreeResponse),
        (status = 500, description = "Tree could not be read", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn file_tree_doc() {}

/// Read a file, or list a directory one level deep
#[utoipa::path(
    get,
    path = "/api/file/{file_path}",
    params(("file_path" = String, Path, description = "Path relative to the project root")),
    responses(
        (status = 200, description = "File content, or DirectoryListResponse for a directory", body = FileReadResponse),
        (status = 403, description = "Path escapes the project root", body = ErrorResponse),
        (status = 413, description = "File exceeds the size limit", body = ErrorResponse),
        (status = 500, description = "Read failed", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn file_read_doc() {}

/// Write a file, creating missing folders
#[utoipa::path(
    post,
    path = "/api/file/{file_path}",
    params(("file_path" = String, Path, description = "Path relative to the project root")),
    request_body = FileWriteRequest,
    responses(
        (status = 200, description = "File written", body = FileMutationResponse),
        (status = 403, description = "Path escapes the project root", body = ErrorResponse),
        (status = 500, description = "Write failed", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn file_write_doc() {}

/// Delete a file
#[utoipa::path(
    delete,
    path = "/api/file/{file_path}",
    params(("file_path" = String, Path, description = "Path relative to the project root")),
    responses(
        (status = 200, description = "File deleted", body = FileMutationResponse),
        (status = 403, description = "Path escapes the project root", body = ErrorResponse),
        (status = 500, description = "Delete failed", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn file_delete_doc() {}

/// Realtime connection and room counts
#[utoipa::path(
    get,
    path = "/api/diagnostics",
    responses(
        (status = 200, description = "Current counts", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        file_tree_doc,
        file_read_doc,
        file_write_doc,
        file_delete_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            DiagnosticsResponse,
            FileKind,
            FileNode,
            FileStats,
            FileTreeResponse,
            FileReadResponse,
            DirectoryListResponse,
            FileWriteRequest,
            FileMutationResponse,
        )
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
