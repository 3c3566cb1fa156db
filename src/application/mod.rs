//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Counter strategy selection (sharded or exact)
//! - The sampling decorator and its shared core
//! - Configuration, construction errors and metrics
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement, plus the `Facility` trait that callers implement
//! for the logging pipeline being sampled.

pub mod config;
pub mod counters;
pub mod metrics;
pub mod ports;
pub mod sampler;
