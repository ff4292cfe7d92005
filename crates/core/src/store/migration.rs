//! Read-time schema migrations
//!
//! A [`Migration`] moves envelope data from one version to a strictly higher
//! one. A [`MigrationChain`] keeps its migrations sorted by
//! `(from_version, to_version)` and walks them from the stored version:
//! at each step the first migration whose `from_version` equals the current
//! version and whose `to_version` is higher is applied. Migrations that do
//! not advance the version are never selected, so a walk always terminates,
//! and when several migrations start at the same version the one with the
//! lowest `to_version` runs.

use std::fmt;

use serde_json::Value;

type MigrateFn = dyn Fn(Value) -> Result<Value, String> + Send + Sync;

/// One declared transformation between two envelope versions
pub struct Migration {
    from_version: u32,
    to_version: u32,
    migrate: Box<MigrateFn>,
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("from_version", &self.from_version)
            .field("to_version", &self.to_version)
            .finish_non_exhaustive()
    }
}

impl Migration {
    /// Declare a migration from `from_version` to `to_version`
    pub fn new<F>(from_version: u32, to_version: u32, migrate: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self { from_version, to_version, migrate: Box::new(migrate) }
    }

    /// Declare a migration that cannot fail
    pub fn infallible<F>(from_version: u32, to_version: u32, migrate: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::new(from_version, to_version, move |data| Ok(migrate(data)))
    }

    pub fn from_version(&self) -> u32 {
        self.from_version
    }

    pub fn to_version(&self) -> u32 {
        self.to_version
    }

    fn advances_from(&self, version: u32) -> bool {
        self.from_version == version && self.to_version > version
    }
}

/// Result of walking a chain over one payload
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    pub data: Value,
    pub version: u32,
    /// Number of migrations applied
    pub applied: usize,
}

impl MigrationOutcome {
    pub fn migrated(&self) -> bool {
        self.applied > 0
    }
}

/// A migration step that returned an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    pub from: u32,
    pub to: u32,
    pub message: String,
}

/// Ordered set of migrations supplied to a load
#[derive(Debug, Default)]
pub struct MigrationChain {
    migrations: Vec<Migration>,
}

impl MigrationChain {
    /// Empty chain: loads return data unchanged
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a migration, keeping the chain sorted
    #[must_use]
    pub fn with(mut self, migration: Migration) -> Self {
        self.push(migration);
        self
    }

    pub fn push(&mut self, migration: Migration) {
        self.migrations.push(migration);
        self.migrations.sort_by_key(|m| (m.from_version, m.to_version));
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Migrations that would run for data stored at `version`, in order
    pub fn plan(&self, version: u32) -> Vec<&Migration> {
        let mut steps = Vec::new();
        let mut current = version;
        while let Some(step) = self.next_step(current) {
            current = step.to_version;
            steps.push(step);
        }
        steps
    }

    /// Version data stored at `version` ends up at
    pub fn target_version(&self, version: u32) -> u32 {
        self.plan(version).last().map_or(version, |step| step.to_version)
    }

    /// Apply every applicable migration to `data`
    ///
    /// # Errors
    /// Returns the first failing step; nothing after it runs.
    pub fn run(&self, data: Value, version: u32) -> Result<MigrationOutcome, MigrationFailure> {
        let mut outcome = MigrationOutcome { data, version, applied: 0 };

        while let Some(step) = self.next_step(outcome.version) {
            outcome.data = (step.migrate)(outcome.data).map_err(|message| MigrationFailure {
                from: step.from_version,
                to: step.to_version,
                message,
            })?;
            outcome.version = step.to_version;
            outcome.applied += 1;
        }

        Ok(outcome)
    }

    fn next_step(&self, version: u32) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.advances_from(version))
    }
}

impl FromIterator<Migration> for MigrationChain {
    fn from_iter<I: IntoIterator<Item = Migration>>(iter: I) -> Self {
        let mut migrations: Vec<Migration> = iter.into_iter().collect();
        migrations.sort_by_key(|m| (m.from_version, m.to_version));
        Self { migrations }
    }
}
