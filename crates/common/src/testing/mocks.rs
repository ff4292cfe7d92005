//! Mock implementations for storage testing
//!
//! [`FaultyStore`] wraps any [`KeyValueStore`] and fails selected operations
//! on demand, which is how write failures, quota pressure, disabled storage
//! and interrupted bulk deletes are exercised in tests.

// Allow missing panics docs - test utilities fail fast on poisoned locks
#![allow(clippy::missing_panics_doc)]

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// Which operations a [`FaultyStore`] should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Pass every call through
    #[default]
    None,
    /// Fail `set`
    Writes,
    /// Fail `remove`
    Removes,
    /// Fail every call, as if storage were disabled by the host
    Unavailable,
}

#[derive(Debug, Default)]
struct FaultState {
    mode: FailureMode,
    only_keys: HashSet<String>,
    removes_before_failure: Option<usize>,
}

/// Key-value store wrapper with injectable failures
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use flowstash_common::storage::{KeyValueStore, MemoryStore};
/// use flowstash_common::testing::{FailureMode, FaultyStore};
///
/// let store = FaultyStore::new(Arc::new(MemoryStore::new()));
/// store.set_mode(FailureMode::Writes);
/// assert!(store.set("key", "value").is_err());
///
/// store.set_mode(FailureMode::None);
/// assert!(store.set("key", "value").is_ok());
/// ```
pub struct FaultyStore {
    inner: Arc<dyn KeyValueStore>,
    state: Mutex<FaultState>,
}

impl fmt::Debug for FaultyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultyStore").field("inner", &self.inner).finish_non_exhaustive()
    }
}

impl FaultyStore {
    /// Wrap `inner`, initially passing every call through
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner, state: Mutex::new(FaultState::default()) }
    }

    /// Set the failure mode for all keys
    pub fn set_mode(&self, mode: FailureMode) {
        let mut state = self.state.lock().expect("fault state poisoned");
        state.mode = mode;
        state.only_keys.clear();
        state.removes_before_failure = None;
    }

    /// Fail calls matching `mode` only for the given keys
    pub fn fail_keys<I, S>(&self, mode: FailureMode, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.lock().expect("fault state poisoned");
        state.mode = mode;
        state.only_keys = keys.into_iter().map(Into::into).collect();
        state.removes_before_failure = None;
    }

    /// Let `count` removals succeed, then fail every following removal
    pub fn fail_removes_after(&self, count: usize) {
        let mut state = self.state.lock().expect("fault state poisoned");
        state.mode = FailureMode::Removes;
        state.only_keys.clear();
        state.removes_before_failure = Some(count);
    }

    /// The wrapped store, bypassing fault injection
    pub fn inner(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner
    }

    fn check(&self, op: FailureMode, key: Option<&str>) -> StorageResult<()> {
        let mut state = self.state.lock().expect("fault state poisoned");

        match state.mode {
            FailureMode::Unavailable => {
                return Err(StorageError::Unavailable("storage disabled".to_string()));
            }
            FailureMode::None => return Ok(()),
            mode if mode != op => return Ok(()),
            _ => {}
        }
        if let (Some(key), false) = (key, state.only_keys.is_empty()) {
            if !state.only_keys.contains(key) {
                return Ok(());
            }
        }
        if let Some(remaining) = state.removes_before_failure.as_mut() {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(());
            }
        }

        Err(StorageError::Backend(format!("injected {:?} failure", op)))
    }
}

impl KeyValueStore for FaultyStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check(FailureMode::None, Some(key))?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check(FailureMode::Writes, Some(key))?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.check(FailureMode::Removes, Some(key))?;
        self.inner.remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.check(FailureMode::None, None)?;
        self.inner.keys()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::mocks.
    use super::*;
    use crate::storage::MemoryStore;

    fn faulty() -> FaultyStore {
        FaultyStore::new(Arc::new(MemoryStore::new()))
    }

    /// Validates that `FailureMode::Writes` fails writes but not reads.
    #[test]
    fn test_write_failures() {
        let store = faulty();
        store.set("a", "1").unwrap();
        store.set_mode(FailureMode::Writes);

        assert!(store.set("a", "2").is_err());
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
    }

    /// Validates key-scoped failures.
    #[test]
    fn test_fail_only_selected_keys() {
        let store = faulty();
        store.fail_keys(FailureMode::Writes, ["locked"]);

        assert!(store.set("locked", "1").is_err());
        assert!(store.set("free", "1").is_ok());
    }

    /// Validates `fail_removes_after` lets the first removals through.
    ///
    /// Assertions:
    /// - Ensures the first two removals succeed.
    /// - Ensures the third removal fails.
    #[test]
    fn test_fail_removes_after() {
        let store = faulty();
        for key in ["a", "b", "c"] {
            store.set(key, "x").unwrap();
        }
        store.fail_removes_after(2);

        assert!(store.remove("a").is_ok());
        assert!(store.remove("b").is_ok());
        assert!(store.remove("c").is_err());
        assert_eq!(store.keys().unwrap(), vec!["c".to_string()]);
    }

    /// Validates that `FailureMode::Unavailable` fails every call.
    #[test]
    fn test_unavailable_fails_everything() {
        let store = faulty();
        store.set_mode(FailureMode::Unavailable);

        assert!(matches!(store.get("a"), Err(StorageError::Unavailable(_))));
        assert!(store.keys().is_err());
        assert!(store.remove("a").is_err());
    }
}
