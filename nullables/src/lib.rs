//! Nullable infrastructure for deterministic testing.
//!
//! All storage is abstracted behind the `tally-store` traits. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (clock, injected failures)
//! - Never touch the filesystem
//!
//! Usage: swap the LMDB stores for nullables in tests.

pub mod clock;
pub mod store;

pub use clock::NullClock;
pub use store::NullStore;
