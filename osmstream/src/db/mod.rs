//! Batch interfaces to the persistent node and way stores.
//!
//! The processor only needs three operations from a backing store: insert
//! one, insert a batch and get by id. Identity and query semantics beyond
//! that are the store's concern, so everything else stays behind these two
//! traits. Node and way collections are deliberately separate interfaces;
//! backends are free to point both at the same engine.
//!
//! [`memory`] provides reference implementations used by tests and the
//! CLI's dry-run mode.

pub mod memory;

pub use memory::{MemoryNodeStore, MemoryWayStore};

use crate::model::{Node, Way};
use std::time::Duration;
use thiserror::Error;

/// External store failures.
#[derive(Debug, Error)]
pub enum DbError {
    /// A batch or single insert was rejected
    #[error("store rejected insert: {0}")]
    Insert(String),

    /// A read query failed (distinct from an absent id)
    #[error("store query failed: {0}")]
    Query(String),

    /// The per-operation timeout elapsed
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Persistent collection of tagged nodes.
///
/// Batch order must be preserved: elements are inserted in the order they
/// appear in the slice, and batches are applied in submission order.
pub trait NodeStore {
    fn insert_one(&mut self, node: &Node, timeout: Duration) -> Result<(), DbError>;
    fn insert_many(&mut self, nodes: &[Node], timeout: Duration) -> Result<(), DbError>;
    fn get_by_id(&self, id: i64, timeout: Duration) -> Result<Option<Node>, DbError>;
}

/// Persistent collection of assembled ways.
pub trait WayStore {
    fn insert_one(&mut self, way: &Way, timeout: Duration) -> Result<(), DbError>;
    fn insert_many(&mut self, ways: &[Way], timeout: Duration) -> Result<(), DbError>;
    fn get_by_id(&self, id: i64, timeout: Duration) -> Result<Option<Way>, DbError>;
}
