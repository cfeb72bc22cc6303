//! Durable bidirectional user ↔ topic directory.
//!
//! The sole persisted entity of the relay: which support-chat topic belongs
//! to which end-user. Backed by a single JSON snapshot with atomic writes.

mod store;

pub use store::{DirectorySnapshot, DirectoryStore};
