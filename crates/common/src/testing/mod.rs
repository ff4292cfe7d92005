//! Testing utilities and helpers
//!
//! - **[`mocks`]**: [`FaultyStore`], a key-value store wrapper that injects
//!   failures on demand
//! - **[`time`]**: [`MockClock`] for deterministic timestamps and ages
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use flowstash_common::testing::MockClock;
//! use flowstash_common::Clock;
//!
//! let clock = MockClock::new();
//! let before = clock.millis_since_epoch();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.millis_since_epoch() - before, 5_000);
//! ```

pub mod mocks;
pub mod time;

pub use mocks::{FailureMode, FaultyStore};
pub use time::MockClock;
