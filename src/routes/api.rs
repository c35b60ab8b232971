use crate::{
    handlers::{diagnostics, file_delete, file_read, file_tree, file_write},
    state::AppState,
};
use axum::{routing::get, Router};

/// Create API routes
pub fn create_api_routes() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/files", get(file_tree))
        .route(
            "/file/*file_path",
            get(file_read).post(file_write).delete(file_delete),
        )
        .route("/diagnostics", get(diagnostics))
}
