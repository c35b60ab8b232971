pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod websocket;
pub mod ws;

pub use config::Config;
pub use routes::create_app;
pub use state::AppState;
