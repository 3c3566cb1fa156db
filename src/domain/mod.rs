//! Domain layer - pure logic with no synchronization or I/O.
//!
//! This layer contains the core concepts of the sampler:
//! - Log entries and structured fields
//! - The slot placement hash
//! - The burst-then-every-Nth sampling policy
//!
//! All types in this layer are pure and easily testable.

pub mod entry;
pub mod hash;
pub mod policy;
