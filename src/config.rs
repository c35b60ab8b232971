use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory every file operation is confined to. Defaults to the working directory.
    pub project_root: Option<PathBuf>,

    /// Largest file (in bytes) that will be loaded into memory
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Deepest folder level walked when building the project tree
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,

    /// Largest accepted request body (in bytes)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the project root to an absolute directory
    pub fn project_root(&self) -> Result<PathBuf, ConfigError> {
        let root = match &self.project_root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => std::env::current_dir()
                .map_err(ConfigError::WorkingDir)?
                .join(root),
            None => std::env::current_dir().map_err(ConfigError::WorkingDir)?,
        };
        if !root.is_dir() {
            return Err(ConfigError::InvalidRoot(root));
        }
        Ok(root)
    }

    /// Parsed list of allowed CORS origins, `None` when any origin is accepted
    pub fn cors_origin_list(&self) -> Option<Vec<String>> {
        self.cors_origins.as_ref().map(|origins| {
            origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    /// Default tracing directive when `RUST_LOG` is unset.
    /// Request-level HTTP tracing is only enabled in development.
    pub fn log_filter(&self) -> String {
        let level = &self.log_level;
        let http = if self.is_development() { "debug" } else { level.as_str() };
        format!("colabri_fs={level},tower_http={http},axum::rejection=trace,{level}")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            log_level: default_log_level(),
            project_root: None,
            max_file_size: default_max_file_size(),
            max_tree_depth: default_max_tree_depth(),
            max_body_size: default_max_body_size(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(#[from] envy::Error),
    #[error("Unable to determine working directory: {0}")]
    WorkingDir(std::io::Error),
    #[error("Project root '{}' is not a directory", .0.display())]
    InvalidRoot(PathBuf),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}

fn default_max_tree_depth() -> usize {
    32
}

fn default_max_body_size() -> usize {
    50 * 1024 * 1024
}
