//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Counter tables (lock-striped sharded table, exact concurrent map)
//! - Reset scheduling (background thread, tokio runtime)
//! - Tracing integration (per-layer `Filter`)

pub mod exact;
pub mod layer;
pub mod scheduler;
pub mod sharded;
pub(crate) mod visitor;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a recording facility, a virtual-time
/// reset scheduler and a capturing tracing layer.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// tracing-sampler = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
