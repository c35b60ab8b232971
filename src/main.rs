use colabri_fs::{create_app, AppState, Config};
use std::panic;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Load configuration
    let config_result = Config::load();
    let log_filter = config_result
        .as_ref()
        .map(Config::log_filter)
        .unwrap_or_else(|_| Config::default().log_filter());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .init();

    info!("Starting server...");

    let config = config_result.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    let address = config.server_address();

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize project root: {}", e);
            std::process::exit(1);
        }
    };
    info!("📁 Serving project root {}", state.files.resolver().root().display());

    let app_routes = create_app(state);

    // Start the HTTP/API server
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);
    info!("❤️ Health check at http://{}/health", address);

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
