//! Reset taxonomy, results and summaries

use serde::{Deserialize, Serialize};

use crate::constants::KEY_SEGMENT_SEPARATOR;
use crate::impl_domain_status_conversions;

/// Fixed classification of stored keys used by reset policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetCategory {
    Tokens,
    StepProgress,
    Credentials,
    Discovery,
    Preferences,
    WorkerToken,
}

impl_domain_status_conversions!(ResetCategory {
    Tokens => "tokens",
    StepProgress => "step_progress",
    Credentials => "credentials",
    Discovery => "discovery",
    Preferences => "preferences",
    WorkerToken => "worker_token",
});

impl ResetCategory {
    /// Categories addressed through prefixed keys (everything except the
    /// worker token, which lives under one exact key)
    pub const KEYED: [Self; 5] =
        [Self::Tokens, Self::StepProgress, Self::Credentials, Self::Discovery, Self::Preferences];

    /// Stable name used in key segments and result lists
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::StepProgress => "step_progress",
            Self::Credentials => "credentials",
            Self::Discovery => "discovery",
            Self::Preferences => "preferences",
            Self::WorkerToken => "worker_token",
        }
    }

    /// Human-readable label for confirmation messages
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tokens => "Tokens",
            Self::StepProgress => "Step progress",
            Self::Credentials => "Credentials",
            Self::Discovery => "Discovery cache",
            Self::Preferences => "Preferences",
            Self::WorkerToken => "Worker token",
        }
    }

    /// Default key for this category under `prefix`, e.g. `v8:tokens`
    pub fn key(self, prefix: &str) -> String {
        format!("{}{}", prefix, self.as_str())
    }

    /// Classify a logical key name (the key without its prefix)
    ///
    /// The last `:`-separated segment decides, so `tokens` and
    /// `authz-code:tokens` are both token keys. `progress` is accepted as a
    /// short form of `step_progress`. The worker token is never classified
    /// this way.
    pub fn classify(logical_name: &str) -> Option<Self> {
        let segment = logical_name.rsplit(KEY_SEGMENT_SEPARATOR).next().unwrap_or(logical_name);
        match segment {
            "tokens" => Some(Self::Tokens),
            "step_progress" | "progress" => Some(Self::StepProgress),
            "credentials" => Some(Self::Credentials),
            "discovery" => Some(Self::Discovery),
            "preferences" => Some(Self::Preferences),
            _ => None,
        }
    }
}

/// Outcome of one reset operation
///
/// `cleared` and `kept` name categories for category keys and raw keys for
/// other flow-tagged entries, so a confirmation can be rendered without
/// re-deriving the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetResult {
    pub success: bool,
    pub cleared: Vec<String>,
    pub kept: Vec<String>,
    pub message: String,
}

impl ResetResult {
    /// Whether `name` was cleared
    pub fn cleared_contains(&self, name: &str) -> bool {
        self.cleared.iter().any(|entry| entry == name)
    }

    /// Whether `name` was reported as kept
    pub fn kept_contains(&self, name: &str) -> bool {
        self.kept.iter().any(|entry| entry == name)
    }
}

/// Read-only probe of what a flow currently has stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub has_tokens: bool,
    /// A flow-tagged entry outside the category taxonomy exists
    pub has_session: bool,
    pub has_progress: bool,
    pub has_discovery: bool,
    pub has_preferences: bool,
    pub has_credentials: bool,
    pub has_worker_token: bool,
}

impl ResetSummary {
    /// Whether nothing at all is stored for the flow
    pub const fn is_empty(&self) -> bool {
        !(self.has_tokens
            || self.has_session
            || self.has_progress
            || self.has_discovery
            || self.has_preferences
            || self.has_credentials
            || self.has_worker_token)
    }

    /// Record that a key of `category` is present
    pub fn mark(&mut self, category: ResetCategory) {
        match category {
            ResetCategory::Tokens => self.has_tokens = true,
            ResetCategory::StepProgress => self.has_progress = true,
            ResetCategory::Credentials => self.has_credentials = true,
            ResetCategory::Discovery => self.has_discovery = true,
            ResetCategory::Preferences => self.has_preferences = true,
            ResetCategory::WorkerToken => self.has_worker_token = true,
        }
    }
}
