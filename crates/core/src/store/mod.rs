//! Versioned, migratable, flow-scoped storage
//!
//! [`VersionedStore`] wraps every value in an [`Envelope`] before handing it
//! to a [`KeyValueStore`] backend. Reads are fail-soft: a value that does not
//! decode as an envelope is logged and treated as absent. Bulk operations
//! (`clear_all`, `get_flow_data`, export, expiry sweeps, stats) only ever
//! look at keys under the configured prefix, so co-tenant data in the same
//! backend is never touched.

pub mod error;
pub mod migration;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use flowstash_common::error::ErrorClassification;
use flowstash_common::storage::{entry_size, KeyValueStore};
use flowstash_common::time::Clock;
use flowstash_domain::constants::{
    AVAILABILITY_PROBE_NAME, DEFAULT_KEY_PREFIX, EXPORT_SCHEMA_VERSION,
};
use flowstash_domain::{
    Envelope, ExportDocument, FlowEntry, ImportReport, StoreConfig, StoreStats,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub use self::error::{StoreError, StoreResult};
pub use self::migration::{Migration, MigrationChain};

/// Namespace settings of a [`VersionedStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Prefix shared by every managed key
    pub prefix: String,
    /// Schema version written into export documents
    pub export_schema_version: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            export_schema_version: EXPORT_SCHEMA_VERSION,
        }
    }
}

impl From<&StoreConfig> for StoreSettings {
    fn from(config: &StoreConfig) -> Self {
        Self {
            prefix: config.key_prefix.clone(),
            export_schema_version: config.export_schema_version,
        }
    }
}

/// Envelope store over a synchronous key-value backend
pub struct VersionedStore {
    backend: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    settings: StoreSettings,
}

impl std::fmt::Debug for VersionedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedStore")
            .field("backend", &self.backend)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl VersionedStore {
    /// Create a store over `backend`, stamping envelopes with `clock`
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        settings: StoreSettings,
    ) -> Self {
        Self { backend, clock, settings }
    }

    /// Key prefix of the managed namespace
    pub fn prefix(&self) -> &str {
        &self.settings.prefix
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Build a managed key from a logical name, e.g. `tokens` -> `v8:tokens`
    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.settings.prefix, name)
    }

    /// Whether `key` lies in the managed namespace
    pub fn is_managed(&self, key: &str) -> bool {
        key.starts_with(&self.settings.prefix)
    }

    /// Current time in milliseconds since the epoch, from the injected clock
    pub fn now_ms(&self) -> u64 {
        self.clock.millis_since_epoch()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Write `data` under `key` at schema `version`, replacing any previous
    /// value
    ///
    /// # Errors
    /// `InvalidInput` for an empty key or a zero version; `Write` when the
    /// backend rejects the value (quota, disabled storage). A rejected write
    /// leaves the previous value in place.
    pub fn save(
        &self,
        key: &str,
        data: Value,
        version: u32,
        flow_key: Option<&str>,
    ) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidInput("key must not be empty".to_string()));
        }
        if version == 0 {
            return Err(StoreError::InvalidInput(format!(
                "version for '{key}' must be at least 1"
            )));
        }

        let envelope = Envelope::new(version, data, self.now_ms(), flow_key.map(str::to_string));
        self.write_envelope(key, &envelope)?;
        debug!(key, version, flow_key, "saved envelope");
        Ok(())
    }

    /// Serialize `value` and save it
    ///
    /// # Errors
    /// `Write` when `value` cannot be represented as JSON, otherwise as
    /// [`VersionedStore::save`].
    pub fn save_as<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        version: u32,
        flow_key: Option<&str>,
    ) -> StoreResult<()> {
        let data = serde_json::to_value(value)
            .map_err(|err| StoreError::Write { key: key.to_string(), source: err.into() })?;
        self.save(key, data, version, flow_key)
    }

    fn write_envelope(&self, key: &str, envelope: &Envelope) -> StoreResult<()> {
        let raw = envelope
            .encode()
            .map_err(|err| StoreError::Write { key: key.to_string(), source: err.into() })?;
        self.backend
            .set(key, &raw)
            .map_err(|source| StoreError::Write { key: key.to_string(), source })
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Read the payload under `key` without migrations
    ///
    /// # Errors
    /// Only backend failures; missing and corrupt values are `Ok(None)`.
    pub fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        self.load_with(key, &MigrationChain::new())
    }

    /// Read the payload under `key`, migrating it through `migrations`
    ///
    /// When at least one migration runs, the migrated envelope is written
    /// back (same flow tag, fresh timestamp) so later reads start from the
    /// final version.
    ///
    /// # Errors
    /// `Migration` when a step fails and `Write` when the write-back fails;
    /// in both cases the stored envelope keeps its old version.
    pub fn load_with(&self, key: &str, migrations: &MigrationChain) -> StoreResult<Option<Value>> {
        let Some(envelope) = self.load_envelope(key)? else {
            return Ok(None);
        };

        let from_version = envelope.version;
        let flow_key = envelope.flow_key;
        let outcome = migrations.run(envelope.data, from_version).map_err(|failure| {
            warn!(key, from = failure.from, to = failure.to, error = %failure.message, "migration failed");
            StoreError::Migration {
                key: key.to_string(),
                from: failure.from,
                to: failure.to,
                message: failure.message,
            }
        })?;

        if outcome.migrated() {
            debug!(key, from_version, to_version = outcome.version, "migrated envelope");
            self.save(key, outcome.data.clone(), outcome.version, flow_key.as_deref())
                .inspect_err(|err| {
                    warn!(key, error = %err, "failed to persist migrated envelope");
                })?;
        }

        Ok(Some(outcome.data))
    }

    /// Read and deserialize the payload under `key`
    ///
    /// A payload that does not match `T` is treated as absent.
    ///
    /// # Errors
    /// As [`VersionedStore::load_with`].
    pub fn load_as<T: DeserializeOwned>(
        &self,
        key: &str,
        migrations: &MigrationChain,
    ) -> StoreResult<Option<T>> {
        let Some(data) = self.load_with(key, migrations)? else {
            return Ok(None);
        };
        match serde_json::from_value(data) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "stored payload does not match requested type");
                Ok(None)
            }
        }
    }

    /// Read the whole envelope under `key`, unmigrated
    ///
    /// # Errors
    /// Only backend failures; missing and corrupt values are `Ok(None)`.
    pub fn load_envelope(&self, key: &str) -> StoreResult<Option<Envelope>> {
        let raw = self.backend.get(key).map_err(StoreError::from_read)?;
        Ok(raw.and_then(|raw| decode_logged(key, &raw)))
    }

    /// Whether `key` holds any value, corrupt or not
    ///
    /// # Errors
    /// Backend read failures.
    pub fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self.backend.get(key).map_err(StoreError::from_read)?.is_some())
    }

    // ------------------------------------------------------------------
    // Deletes
    // ------------------------------------------------------------------

    /// Delete `key`; deleting a missing key succeeds
    ///
    /// # Errors
    /// `Delete` when the backend refuses.
    pub fn clear(&self, key: &str) -> StoreResult<()> {
        self.backend
            .remove(key)
            .map_err(|source| StoreError::Delete { key: key.to_string(), source })?;
        debug!(key, "cleared key");
        Ok(())
    }

    /// Delete every managed key, returning how many were removed
    ///
    /// # Errors
    /// `PartialClear` with the number already deleted when a delete fails.
    pub fn clear_all(&self) -> StoreResult<usize> {
        let keys = self.get_all_keys()?;
        let cleared = self.clear_keys(keys.iter().map(String::as_str))?;
        info!(count = cleared, prefix = %self.settings.prefix, "cleared managed namespace");
        Ok(cleared)
    }

    fn clear_keys<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> StoreResult<usize> {
        let mut cleared = 0;
        for key in keys {
            self.clear(key).map_err(|err| StoreError::partial(cleared, err))?;
            cleared += 1;
        }
        Ok(cleared)
    }

    // ------------------------------------------------------------------
    // Enumeration
    // ------------------------------------------------------------------

    /// Every key under the prefix
    ///
    /// # Errors
    /// Backend enumeration failures.
    pub fn get_all_keys(&self) -> StoreResult<Vec<String>> {
        let keys = self.backend.keys().map_err(StoreError::from_read)?;
        Ok(keys.into_iter().filter(|key| self.is_managed(key)).collect())
    }

    /// Every managed key with its decoded envelope, `None` for corrupt ones
    ///
    /// Keys that disappear between enumeration and read are skipped.
    ///
    /// # Errors
    /// Backend failures.
    pub fn scan_entries(&self) -> StoreResult<Vec<(String, Option<Envelope>)>> {
        let mut entries = Vec::new();
        for key in self.get_all_keys()? {
            if let Some(raw) = self.backend.get(&key).map_err(StoreError::from_read)? {
                let envelope = decode_logged(&key, &raw);
                entries.push((key, envelope));
            }
        }
        Ok(entries)
    }

    /// Entries tagged with `flow_key`; corrupt entries are skipped
    ///
    /// # Errors
    /// Backend failures.
    pub fn get_flow_data(&self, flow_key: &str) -> StoreResult<Vec<FlowEntry>> {
        Ok(self
            .scan_entries()?
            .into_iter()
            .filter_map(|(key, envelope)| {
                envelope.filter(|e| e.belongs_to(flow_key)).map(|envelope| FlowEntry { key, envelope })
            })
            .collect())
    }

    /// Delete every entry tagged with `flow_key`
    ///
    /// Not atomic: keys deleted before a failure stay deleted.
    ///
    /// # Errors
    /// `PartialClear` with the number already deleted when a delete fails.
    pub fn clear_flow_data(&self, flow_key: &str) -> StoreResult<usize> {
        let entries = self.get_flow_data(flow_key)?;
        let cleared = self.clear_keys(entries.iter().map(|entry| entry.key.as_str()))?;
        info!(flow_key, count = cleared, "cleared flow data");
        Ok(cleared)
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Snapshot every managed key
    ///
    /// Values that parse as JSON are exported as-is, including envelopes
    /// that are otherwise corrupt; values that are not JSON are left out.
    ///
    /// # Errors
    /// Backend failures.
    pub fn export_document(&self) -> StoreResult<ExportDocument> {
        let mut data = BTreeMap::new();
        for key in self.get_all_keys()? {
            let Some(raw) = self.backend.get(&key).map_err(StoreError::from_read)? else {
                continue;
            };
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    data.insert(key, value);
                }
                Err(err) => warn!(key, error = %err, "skipping non-JSON value in export"),
            }
        }

        Ok(ExportDocument {
            version: self.settings.export_schema_version,
            exported_at: DateTime::<Utc>::from(self.clock.system_time()),
            data,
        })
    }

    /// Snapshot every managed key as a JSON document
    ///
    /// # Errors
    /// Backend or serialization failures.
    pub fn export_all(&self) -> StoreResult<String> {
        let document = self.export_document()?;
        info!(count = document.data.len(), "exported store");
        Ok(serde_json::to_string(&document)?)
    }

    /// Restore entries from an export document
    ///
    /// Each entry is written when `overwrite` is set or its key is absent.
    /// Entries outside the managed namespace and values that are not valid
    /// envelopes are skipped.
    ///
    /// # Errors
    /// `ImportFormat` when the document is not JSON, not an object, lacks a
    /// positive integer `version`, or lacks an object `data`. `Write` when a
    /// backend write fails; entries imported before it stay written.
    pub fn import_all(&self, json: &str, overwrite: bool) -> StoreResult<ImportReport> {
        let document: Value = serde_json::from_str(json)
            .map_err(|err| StoreError::ImportFormat(format!("not valid JSON: {err}")))?;
        let Some(root) = document.as_object() else {
            return Err(StoreError::ImportFormat("document must be a JSON object".to_string()));
        };
        match root.get("version").and_then(Value::as_u64) {
            Some(version) if version >= 1 => {}
            Some(_) => {
                return Err(StoreError::ImportFormat("version must be at least 1".to_string()))
            }
            None => return Err(StoreError::ImportFormat("missing version".to_string())),
        }
        let Some(entries) = root.get("data").and_then(Value::as_object) else {
            return Err(StoreError::ImportFormat("missing data object".to_string()));
        };

        let mut report = ImportReport::default();
        for (key, value) in entries {
            if !self.is_managed(key) {
                warn!(key, "skipping import entry outside managed namespace");
                report.skipped += 1;
                continue;
            }
            let envelope = match Envelope::from_value(value.clone()) {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(key, error = %err, "skipping invalid import entry");
                    report.skipped += 1;
                    continue;
                }
            };
            if !overwrite && self.has(key)? {
                debug!(key, "keeping existing value during import");
                report.skipped += 1;
                continue;
            }

            self.write_envelope(key, &envelope)?;
            report.imported += 1;
        }

        info!(imported = report.imported, skipped = report.skipped, overwrite, "imported store");
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Size, age and expiry
    // ------------------------------------------------------------------

    /// Sum of key and value lengths over managed keys, in bytes
    ///
    /// # Errors
    /// Backend failures.
    pub fn get_size(&self) -> StoreResult<usize> {
        let mut total = 0;
        for key in self.get_all_keys()? {
            if let Some(raw) = self.backend.get(&key).map_err(StoreError::from_read)? {
                total += entry_size(&key, &raw);
            }
        }
        Ok(total)
    }

    /// Milliseconds since `key` was written, `None` if absent or corrupt
    ///
    /// # Errors
    /// Backend failures.
    pub fn get_age(&self, key: &str) -> StoreResult<Option<u64>> {
        let now = self.now_ms();
        Ok(self.load_envelope(key)?.map(|envelope| envelope.age_ms(now)))
    }

    /// True when `key` is absent, corrupt or older than `max_age_ms`
    ///
    /// # Errors
    /// Backend failures.
    pub fn is_expired(&self, key: &str, max_age_ms: u64) -> StoreResult<bool> {
        Ok(self.get_age(key)?.map_or(true, |age| age > max_age_ms))
    }

    /// Delete every managed key that [`is_expired`](Self::is_expired)
    ///
    /// # Errors
    /// `PartialClear` with the number already deleted when a delete fails.
    pub fn cleanup_expired(&self, max_age_ms: u64) -> StoreResult<usize> {
        let now = self.now_ms();
        let expired: Vec<String> = self
            .scan_entries()?
            .into_iter()
            .filter(|(_, envelope)| {
                envelope.as_ref().map_or(true, |envelope| envelope.age_ms(now) > max_age_ms)
            })
            .map(|(key, _)| key)
            .collect();

        let cleared = self.clear_keys(expired.iter().map(String::as_str))?;
        if cleared > 0 {
            info!(count = cleared, max_age_ms, "removed expired entries");
        }
        Ok(cleared)
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// Probe the backend with a write/delete cycle on a sentinel key
    pub fn is_available(&self) -> bool {
        let probe = self.key(AVAILABILITY_PROBE_NAME);
        let result = self.backend.set(&probe, "1").and_then(|()| self.backend.remove(&probe));
        match result {
            Ok(()) => true,
            Err(err) => {
                if err.is_critical() {
                    error!(error = %err, severity = %err.severity(), "storage availability check failed");
                } else {
                    warn!(error = %err, retryable = err.is_retryable(), "storage availability check failed");
                }
                false
            }
        }
    }

    /// Key count, size, corrupt entries and per-flow counts
    ///
    /// # Errors
    /// Backend failures.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let mut stats = StoreStats::default();
        for key in self.get_all_keys()? {
            let Some(raw) = self.backend.get(&key).map_err(StoreError::from_read)? else {
                continue;
            };
            stats.key_count += 1;
            stats.total_bytes += entry_size(&key, &raw);
            match Envelope::decode(&raw) {
                Ok(envelope) => {
                    if let Some(flow_key) = envelope.flow_key {
                        *stats.flows.entry(flow_key).or_insert(0) += 1;
                    }
                }
                Err(_) => stats.corrupt_entries += 1,
            }
        }
        Ok(stats)
    }
}

fn decode_logged(key: &str, raw: &str) -> Option<Envelope> {
    match Envelope::decode(raw) {
        Ok(envelope) => Some(envelope),
        Err(err) => {
            warn!(key, error = %err, "treating corrupt envelope as absent");
            None
        }
    }
}
