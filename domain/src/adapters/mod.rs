//! Adapters that live inside the domain crate for convenience.
//!
//! The in-memory repository is the fast fake used by tests and local demos.
//! The MongoDB adapter lives in its own crate.

pub mod memory_repo;
