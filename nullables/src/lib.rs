//! Nullable collaborators for deterministic wallet testing.
//!
//! The send engine's external dependencies (daemon, transaction
//! construction) are abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (canned errors, response gates)
//! - Never touch the network or real cryptography
//!
//! Usage: swap real implementations for nullables in tests.

pub mod construct;
pub mod daemon;

pub use construct::NullConstructor;
pub use daemon::NullDaemon;
