//! Flow reset orchestration
//!
//! [`FlowResetService`] runs named, policy-driven bulk clears over a
//! [`VersionedStore`], one flow at a time. Failures are reported in the
//! returned [`ResetResult`] rather than as errors: a delete that fails stops
//! the operation, and `cleared` lists exactly what was removed before it.

pub mod policy;

use std::sync::Arc;

use flowstash_common::error::{ErrorClassification, ErrorSeverity};
use flowstash_domain::constants::DEFAULT_WORKER_TOKEN_KEY;
use flowstash_domain::{ResetCategory, ResetResult, ResetSummary};
use tracing::{error, info, warn};

use self::policy::{ResetDecision, ResetPolicy, WorkerTokenPolicy};
use crate::store::{StoreResult, VersionedStore};

/// Named reset operations scoped to one flow
#[derive(Debug, Clone)]
pub struct FlowResetService {
    store: Arc<VersionedStore>,
    worker_token_key: String,
}

/// Names accumulated while a policy runs
#[derive(Debug, Default)]
struct ResetProgress {
    cleared: Vec<String>,
    kept: Vec<String>,
}

impl ResetProgress {
    fn push_unique(list: &mut Vec<String>, name: String) {
        if !list.contains(&name) {
            list.push(name);
        }
    }

    fn cleared(&mut self, name: String) {
        Self::push_unique(&mut self.cleared, name);
    }

    fn kept(&mut self, name: String) {
        Self::push_unique(&mut self.kept, name);
    }
}

impl FlowResetService {
    /// Create a service that treats `worker_token_key` as the worker token
    pub fn new(store: Arc<VersionedStore>, worker_token_key: impl Into<String>) -> Self {
        Self { store, worker_token_key: worker_token_key.into() }
    }

    /// Create a service using the default worker token key
    pub fn with_default_worker_key(store: Arc<VersionedStore>) -> Self {
        Self::new(store, DEFAULT_WORKER_TOKEN_KEY)
    }

    pub fn store(&self) -> &Arc<VersionedStore> {
        &self.store
    }

    pub fn worker_token_key(&self) -> &str {
        &self.worker_token_key
    }

    /// Clear tokens, progress and flow state, keeping credentials
    ///
    /// With `keep_worker_token` the worker token and worker-related flow keys
    /// survive; without it both are cleared.
    pub fn reset_flow(&self, flow_key: &str, keep_worker_token: bool) -> ResetResult {
        self.execute(flow_key, &ResetPolicy::reset_flow(keep_worker_token))
    }

    /// Clear everything the flow owns; the worker token is not looked at
    pub fn full_reset(&self, flow_key: &str) -> ResetResult {
        self.execute(flow_key, &ResetPolicy::full_reset())
    }

    pub fn clear_tokens(&self, flow_key: &str) -> ResetResult {
        self.execute(flow_key, &ResetPolicy::clear_tokens())
    }

    /// Clear progress and flow session state, keeping credentials and tokens
    pub fn clear_session(&self, flow_key: &str) -> ResetResult {
        self.execute(flow_key, &ResetPolicy::clear_session())
    }

    pub fn clear_progress(&self, flow_key: &str) -> ResetResult {
        self.execute(flow_key, &ResetPolicy::clear_progress())
    }

    /// Clear the discovery cache and preferences
    pub fn clear_pingone_session(&self, flow_key: &str) -> ResetResult {
        self.execute(flow_key, &ResetPolicy::clear_pingone_session())
    }

    /// Run an arbitrary policy
    pub fn execute(&self, flow_key: &str, policy: &ResetPolicy) -> ResetResult {
        let mut progress = ResetProgress::default();

        match self.apply(flow_key, policy, &mut progress) {
            Ok(()) => {
                info!(
                    flow_key,
                    operation = policy.name,
                    cleared = progress.cleared.len(),
                    kept = progress.kept.len(),
                    "reset completed"
                );
                let message = if progress.cleared.is_empty() {
                    format!("Nothing to clear for {flow_key}")
                } else {
                    format!("Cleared {} for {flow_key}", progress.cleared.join(", "))
                };
                ResetResult {
                    success: true,
                    cleared: progress.cleared,
                    kept: progress.kept,
                    message,
                }
            }
            Err(err) => {
                let retryable = err.is_retryable();
                if err.severity() >= ErrorSeverity::Error {
                    error!(flow_key, operation = policy.name, retryable, error = %err, "reset failed");
                } else {
                    warn!(flow_key, operation = policy.name, retryable, error = %err, "reset failed");
                }
                ResetResult {
                    success: false,
                    cleared: progress.cleared,
                    kept: progress.kept,
                    message: format!("Reset of {flow_key} failed: {err}"),
                }
            }
        }
    }

    fn apply(
        &self,
        flow_key: &str,
        policy: &ResetPolicy,
        progress: &mut ResetProgress,
    ) -> StoreResult<()> {
        let prefix = self.store.prefix();

        for (key, envelope) in self.store.scan_entries()? {
            if key == self.worker_token_key {
                continue;
            }
            let logical_name = key.strip_prefix(prefix).unwrap_or(&key);
            match policy.decide(flow_key, &key, logical_name, envelope.as_ref()) {
                ResetDecision::Skip => {}
                ResetDecision::Keep(name) => progress.kept(name),
                ResetDecision::Clear(name) => {
                    self.store.clear(&key)?;
                    progress.cleared(name);
                }
            }
        }

        let worker_name = ResetCategory::WorkerToken.as_str().to_string();
        match policy.worker_token {
            WorkerTokenPolicy::Untouched => {}
            WorkerTokenPolicy::Keep => {
                if self.store.has(&self.worker_token_key)? {
                    progress.kept(worker_name);
                }
            }
            WorkerTokenPolicy::Clear => {
                if self.store.has(&self.worker_token_key)? {
                    self.store.clear(&self.worker_token_key)?;
                    progress.cleared(worker_name);
                }
            }
        }

        Ok(())
    }

    /// Probe what `flow_key` currently has stored
    ///
    /// # Errors
    /// Backend failures.
    pub fn get_reset_summary(&self, flow_key: &str) -> StoreResult<ResetSummary> {
        let prefix = self.store.prefix();
        let mut summary = ResetSummary::default();

        for (key, envelope) in self.store.scan_entries()? {
            if key == self.worker_token_key {
                continue;
            }
            let logical_name = key.strip_prefix(prefix).unwrap_or(&key);
            let tag = envelope.as_ref().and_then(|e| e.flow_key.as_deref());

            match ResetCategory::classify(logical_name) {
                Some(category) if tag.map_or(true, |tag| tag == flow_key) => summary.mark(category),
                Some(_) => {}
                None => {
                    if tag == Some(flow_key) && !logical_name.contains("worker") {
                        summary.has_session = true;
                    }
                }
            }
        }

        summary.has_worker_token = self.store.has(&self.worker_token_key)?;
        Ok(summary)
    }

    /// Bullet list of what is stored for `flow_key`
    ///
    /// # Errors
    /// Backend failures.
    pub fn get_reset_message(&self, flow_key: &str) -> StoreResult<String> {
        let summary = self.get_reset_summary(flow_key)?;
        Ok(render_summary(flow_key, &summary))
    }
}

fn render_summary(flow_key: &str, summary: &ResetSummary) -> String {
    if summary.is_empty() {
        return format!("Nothing is saved for {flow_key}.");
    }

    let items = [
        (summary.has_tokens, ResetCategory::Tokens.label()),
        (summary.has_session, "Session data"),
        (summary.has_progress, ResetCategory::StepProgress.label()),
        (summary.has_discovery, ResetCategory::Discovery.label()),
        (summary.has_preferences, ResetCategory::Preferences.label()),
        (summary.has_credentials, ResetCategory::Credentials.label()),
        (summary.has_worker_token, ResetCategory::WorkerToken.label()),
    ];

    let mut message = format!("Saved data for {flow_key}:");
    for (present, label) in items {
        if present {
            message.push_str("\n• ");
            message.push_str(label);
        }
    }
    message
}
