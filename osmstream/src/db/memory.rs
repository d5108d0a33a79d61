//! In-memory reference stores.
//!
//! Used by the integration tests and the CLI's dry-run ingest, and as the
//! template for real backends. Inserts keep submission order observable
//! through an insertion log so tests can assert on batch ordering.

use super::{DbError, NodeStore, WayStore};
use crate::model::{Node, Way};
use std::collections::BTreeMap;
use std::time::Duration;

/// In-memory node collection.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: BTreeMap<i64, Node>,
    insertion_order: Vec<i64>,
    batches: usize,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids in the order they were inserted.
    pub fn insertion_order(&self) -> &[i64] {
        &self.insertion_order
    }

    /// Number of `insert_many` calls observed.
    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl NodeStore for MemoryNodeStore {
    fn insert_one(&mut self, node: &Node, _timeout: Duration) -> Result<(), DbError> {
        self.insertion_order.push(node.id);
        self.nodes.insert(node.id, node.clone());
        Ok(())
    }

    fn insert_many(&mut self, nodes: &[Node], _timeout: Duration) -> Result<(), DbError> {
        self.batches += 1;
        for node in nodes {
            self.insertion_order.push(node.id);
            self.nodes.insert(node.id, node.clone());
        }
        Ok(())
    }

    fn get_by_id(&self, id: i64, _timeout: Duration) -> Result<Option<Node>, DbError> {
        Ok(self.nodes.get(&id).cloned())
    }
}

/// In-memory way collection.
#[derive(Debug, Default)]
pub struct MemoryWayStore {
    ways: BTreeMap<i64, Way>,
    insertion_order: Vec<i64>,
    batches: usize,
}

impl MemoryWayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ways.is_empty()
    }

    pub fn insertion_order(&self) -> &[i64] {
        &self.insertion_order
    }

    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl WayStore for MemoryWayStore {
    fn insert_one(&mut self, way: &Way, _timeout: Duration) -> Result<(), DbError> {
        self.insertion_order.push(way.id);
        self.ways.insert(way.id, way.clone());
        Ok(())
    }

    fn insert_many(&mut self, ways: &[Way], _timeout: Duration) -> Result<(), DbError> {
        self.batches += 1;
        for way in ways {
            self.insertion_order.push(way.id);
            self.ways.insert(way.id, way.clone());
        }
        Ok(())
    }

    fn get_by_id(&self, id: i64, _timeout: Duration) -> Result<Option<Way>, DbError> {
        Ok(self.ways.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tags;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[test]
    fn test_node_store_round_trip() {
        let mut store = MemoryNodeStore::new();
        let node = Node::new(7, 1.0, 2.0, Tags::new());

        store.insert_one(&node, TIMEOUT).unwrap();
        assert_eq!(store.get_by_id(7, TIMEOUT).unwrap(), Some(node));
        assert_eq!(store.get_by_id(8, TIMEOUT).unwrap(), None);
    }

    #[test]
    fn test_node_store_preserves_batch_order() {
        let mut store = MemoryNodeStore::new();
        let batch: Vec<Node> = [3i64, 1, 2]
            .iter()
            .map(|&id| Node::new(id, 0.0, 0.0, Tags::new()))
            .collect();

        store.insert_many(&batch, TIMEOUT).unwrap();
        assert_eq!(store.insertion_order(), &[3, 1, 2]);
        assert_eq!(store.batches(), 1);
    }

    #[test]
    fn test_way_store_round_trip() {
        let mut store = MemoryWayStore::new();
        let way = Way::new(5, vec![(0.0, 0.0), (1.0, 1.0)], Tags::new());

        store.insert_many(std::slice::from_ref(&way), TIMEOUT).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_id(5, TIMEOUT).unwrap(), Some(way));
    }
}
