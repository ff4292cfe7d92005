//! Shared test helpers for `flowstash-core` integration tests.
//!
//! Every harness stacks a `FaultyStore` over a `MemoryStore` so tests can
//! inject backend failures, and stamps envelopes with a `MockClock`.

#![allow(dead_code)]

use std::sync::Arc;

use flowstash_common::storage::{KeyValueStore, MemoryStore};
use flowstash_common::testing::{FaultyStore, MockClock};
use flowstash_core::{FlowResetService, StoreSettings, VersionedStore};

/// Wall time the mock clock starts at (2024-01-01T00:00:00Z)
pub const START_MILLIS: u64 = 1_704_067_200_000;

pub struct Harness {
    pub backend: Arc<MemoryStore>,
    pub faulty: Arc<FaultyStore>,
    pub clock: MockClock,
    pub store: Arc<VersionedStore>,
    pub reset: FlowResetService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(MemoryStore::new())
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self::with_backend(MemoryStore::with_quota(quota_bytes))
    }

    fn with_backend(backend: MemoryStore) -> Self {
        let backend = Arc::new(backend);
        let faulty = Arc::new(FaultyStore::new(backend.clone()));
        let clock = MockClock::at_millis(START_MILLIS);
        let store = Arc::new(VersionedStore::new(
            faulty.clone(),
            Arc::new(clock.clone()),
            StoreSettings::default(),
        ));
        let reset = FlowResetService::with_default_worker_key(store.clone());
        Self { backend, faulty, clock, store, reset }
    }

    /// Write a raw value straight into the backend, bypassing envelopes
    pub fn put_raw(&self, key: &str, value: &str) {
        self.backend.set(key, value).unwrap();
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.backend.get(key).unwrap()
    }
}
