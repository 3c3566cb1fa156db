//! Mock implementations for testing.
//!
//! This module provides test doubles for the sampler's collaborators,
//! enabling deterministic testing of sampling and reset behavior.

pub mod facility;
pub mod layer;
pub mod scheduler;

pub use facility::{RecordedEntry, RecordingFacility};
pub use layer::{CapturedEvent, MockCaptureLayer};
pub use scheduler::MockScheduler;
