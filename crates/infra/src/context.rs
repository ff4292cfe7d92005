//! Per-session store context
//!
//! [`StoreContext`] is built once when a session starts and handed to
//! consumers by reference. It owns the configuration, the versioned store
//! and the reset service wired to the same backend.

use std::sync::Arc;

use flowstash_common::storage::{KeyValueStore, MemoryStore};
use flowstash_common::time::{Clock, SystemClock};
use flowstash_core::{FlowResetService, StoreSettings, VersionedStore};
use flowstash_domain::{Config, FlowStashError, Result};
use tracing::info;

use crate::database::SqliteStore;

/// Services of one session
#[derive(Debug, Clone)]
pub struct StoreContext {
    config: Config,
    store: Arc<VersionedStore>,
    reset: FlowResetService,
}

impl StoreContext {
    /// Validate `config` and open the backend it names
    ///
    /// A configured database path selects [`SqliteStore`]; otherwise data
    /// lives in a [`MemoryStore`]. Both honour the configured quota.
    ///
    /// # Errors
    /// Returns `FlowStashError::Config` for invalid configuration and
    /// `FlowStashError::Storage` when the database cannot be opened.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let backend = open_backend(&config)?;
        Ok(Self::with_backend(config, backend, Arc::new(SystemClock)))
    }

    /// Wire the services over an existing backend and clock
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store =
            Arc::new(VersionedStore::new(backend, clock, StoreSettings::from(&config.store)));
        let reset =
            FlowResetService::new(Arc::clone(&store), config.store.worker_token_key.clone());
        Self { config, store, reset }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }

    pub fn reset(&self) -> &FlowResetService {
        &self.reset
    }
}

fn open_backend(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let quota = config.store.quota_bytes;

    match &config.database.path {
        Some(path) => {
            let store = SqliteStore::open(path)
                .map_err(|e| FlowStashError::Storage(e.to_string()))?
                .with_quota(quota);
            Ok(Arc::new(store))
        }
        None => {
            info!(quota_bytes = ?quota, "using in-memory key-value store");
            let store = quota.map_or_else(MemoryStore::new, MemoryStore::with_quota);
            Ok(Arc::new(store))
        }
    }
}
