//! Application state.

use std::sync::Arc;

use tracing::info;

use vodup_storage::{MemoryStore, ObjectStore, R2Client};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Create new application state, picking the storage backend from config.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage: Arc<dyn ObjectStore> = match config.storage_backend.as_str() {
            "memory" => {
                info!("Using in-memory storage backend (objects are not durable)");
                Arc::new(MemoryStore::new())
            }
            _ => Arc::new(R2Client::from_env().await?),
        };

        Ok(Self { config, storage })
    }

    /// Build state around an existing store. Used by the test suites.
    pub fn with_store(config: ApiConfig, storage: Arc<dyn ObjectStore>) -> Self {
        Self { config, storage }
    }
}
