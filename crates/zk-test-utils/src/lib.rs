//! Shared test utilities for the znode-manager workspace
//!
//! Provides an in-memory [`MemoryStore`] with real coordination-service
//! semantics (parents, versions, sequential suffixes, recursive delete)
//! and a [`RecordingStore`] wrapper for asserting which store operations
//! an invocation issued. The [`InterferingStore`] wrapper simulates a
//! concurrent writer overwriting data between a mutation and its
//! read-back. Clones of any of them share state, so tests can keep a
//! handle for inspection after handing a clone to the code under test.

pub mod interfering;
pub mod memory;
pub mod recording;

pub use interfering::InterferingStore;
pub use memory::MemoryStore;
pub use recording::RecordingStore;
