//! Reset policies
//!
//! Each named reset operation is a [`ResetPolicy`] value. The executor in
//! [`FlowResetService`](super::FlowResetService) scans managed keys and asks
//! the policy what to do with each one via [`ResetPolicy::decide`].

use flowstash_domain::ResetCategory::{Credentials, Discovery, Preferences, StepProgress, Tokens};
use flowstash_domain::{Envelope, ResetCategory};

/// What happens to the worker token key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerTokenPolicy {
    /// Not looked at and not reported
    Untouched,
    /// Preserved and reported in `kept` when present
    Keep,
    /// Deleted and reported in `cleared` when present
    Clear,
}

/// Decision for one scanned key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetDecision {
    Skip,
    /// Preserve and report under this name
    Keep(String),
    /// Delete and report under this name
    Clear(String),
}

/// Declarative description of one reset operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    pub name: &'static str,
    /// Categories cleared whenever in scope
    pub clear: &'static [ResetCategory],
    /// Categories preserved and reported
    pub keep: &'static [ResetCategory],
    /// Also clear every other key tagged with the flow
    pub sweep_flow_tagged: bool,
    /// Leave worker-related keys out of the sweep
    pub exempt_worker_related: bool,
    pub worker_token: WorkerTokenPolicy,
}

impl ResetPolicy {
    /// Clear tokens, progress and every flow-tagged key except credentials
    pub const fn reset_flow(keep_worker_token: bool) -> Self {
        Self {
            name: "reset_flow",
            clear: &[Tokens, StepProgress],
            keep: &[Credentials],
            sweep_flow_tagged: true,
            exempt_worker_related: keep_worker_token,
            worker_token: if keep_worker_token {
                WorkerTokenPolicy::Keep
            } else {
                WorkerTokenPolicy::Clear
            },
        }
    }

    /// Clear tokens, progress and every flow-tagged key
    pub const fn full_reset() -> Self {
        Self {
            name: "full_reset",
            clear: &[Tokens, StepProgress],
            keep: &[],
            sweep_flow_tagged: true,
            exempt_worker_related: false,
            worker_token: WorkerTokenPolicy::Untouched,
        }
    }

    pub const fn clear_tokens() -> Self {
        Self {
            name: "clear_tokens",
            clear: &[Tokens],
            keep: &[StepProgress, Credentials, Discovery, Preferences],
            sweep_flow_tagged: false,
            exempt_worker_related: true,
            worker_token: WorkerTokenPolicy::Keep,
        }
    }

    /// Clear progress and flow-tagged session state, keeping credentials
    /// and tokens
    pub const fn clear_session() -> Self {
        Self {
            name: "clear_session",
            clear: &[StepProgress],
            keep: &[Credentials, Tokens],
            sweep_flow_tagged: true,
            exempt_worker_related: true,
            worker_token: WorkerTokenPolicy::Keep,
        }
    }

    pub const fn clear_progress() -> Self {
        Self {
            name: "clear_progress",
            clear: &[StepProgress],
            keep: &[Tokens, Credentials, Discovery, Preferences],
            sweep_flow_tagged: false,
            exempt_worker_related: true,
            worker_token: WorkerTokenPolicy::Keep,
        }
    }

    /// Clear the PingOne discovery cache and preferences
    pub const fn clear_pingone_session() -> Self {
        Self {
            name: "clear_pingone_session",
            clear: &[Discovery, Preferences],
            keep: &[Tokens, StepProgress, Credentials],
            sweep_flow_tagged: false,
            exempt_worker_related: true,
            worker_token: WorkerTokenPolicy::Keep,
        }
    }

    /// Decide the fate of one managed key
    ///
    /// `logical_name` is the key without its prefix and `envelope` is
    /// `None` for corrupt values. Category keys are in scope when tagged with
    /// `flow_key` or untagged; other keys only when tagged with `flow_key`.
    ///
    /// Untagged and corrupt category keys are shared, so a reset of any flow
    /// clears them, including a flow that has never stored anything.
    pub fn decide(
        &self,
        flow_key: &str,
        key: &str,
        logical_name: &str,
        envelope: Option<&Envelope>,
    ) -> ResetDecision {
        let tag = envelope.and_then(|e| e.flow_key.as_deref());
        let tagged_here = tag == Some(flow_key);
        let worker_related = logical_name.contains("worker");
        let sweeps = self.sweep_flow_tagged
            && tagged_here
            && !(self.exempt_worker_related && worker_related);

        match ResetCategory::classify(logical_name) {
            Some(category) => {
                if tag.is_some() && !tagged_here {
                    return ResetDecision::Skip;
                }
                let name = category.as_str().to_string();
                if self.clear.contains(&category) {
                    ResetDecision::Clear(name)
                } else if self.keep.contains(&category) {
                    ResetDecision::Keep(name)
                } else if sweeps {
                    ResetDecision::Clear(name)
                } else {
                    ResetDecision::Skip
                }
            }
            None if sweeps => ResetDecision::Clear(key.to_string()),
            None if tagged_here && self.sweep_flow_tagged && worker_related => {
                ResetDecision::Keep(key.to_string())
            }
            None => ResetDecision::Skip,
        }
    }
}
