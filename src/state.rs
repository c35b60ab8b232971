use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::services::{FileService, PathResolver};
use crate::ws::BroadcastRelay;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub files: FileService,
    pub relay: BroadcastRelay,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let root = config.project_root()?;
        let resolver =
            PathResolver::new(&root).map_err(|_| ConfigError::InvalidRoot(root.clone()))?;
        let relay = BroadcastRelay::new();
        let files = FileService::new(
            resolver,
            relay.clone(),
            config.max_file_size,
            config.max_tree_depth,
        );
        Ok(Self {
            config: Arc::new(config),
            files,
            relay,
        })
    }
}
