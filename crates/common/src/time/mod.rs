//! Time abstractions
//!
//! Storage timestamps and entry ages are computed through the [`Clock`]
//! trait so that expiry logic can be driven deterministically in tests
//! (see `testing::MockClock`).

mod clock;

pub use clock::{Clock, SystemClock};
