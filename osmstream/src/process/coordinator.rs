//! Streaming PBF coordinator.
//!
//! Consumes the decoded element sequence exactly once, leaning on the PBF
//! ordering guarantee `Node* Way* Relation*`. During the node phase every
//! coordinate is appended to the store and tagged visible nodes are
//! batched to the node store. The first way is the barrier: the node batch
//! is flushed, the coordinate store finalized, and from then on the store
//! is only read. Each way resolves its references through the store (with
//! the fallback resolver covering absent ids), is assembled into a [`Way`]
//! and batched to the way store. The first relation terminates the pass.

use std::sync::Arc;

use tracing::{debug, info};

use super::error::ProcessError;
use super::progress::{CancelFlag, ProgressProbe};
use crate::config::ProcessConfig;
use crate::db::{NodeStore, WayStore};
use crate::model::{Node, Way};
use crate::pbf::{DecodeError, Element, ElementSource, NodeElement, WayElement};
use crate::resolver::{FallbackResolver, NodeResolver};
use crate::store::CoordinateStore;

/// Counts from a counting-only pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementCounts {
    pub nodes: u64,
    pub ways: u64,
    pub relations: u64,
}

/// Outcome of a processing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Node elements observed by the probe over the life of the processor
    pub nodes_seen: u64,
    /// Way elements observed by the probe over the life of the processor
    pub ways_seen: u64,
    /// True when the pass stopped on a cancellation request
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Nodes,
    Ways,
}

/// Counts the elements of a PBF stream without touching any store.
pub fn count_elements<S: ElementSource>(source: &mut S) -> Result<ElementCounts, DecodeError> {
    let mut counts = ElementCounts::default();
    while let Some(element) = source.next_element()? {
        match element {
            Element::Node(_) => counts.nodes += 1,
            Element::Way(_) => counts.ways += 1,
            Element::Relation { .. } => counts.relations += 1,
        }
    }
    Ok(counts)
}

/// Single-pass coordinator over a decoded OSM element stream.
///
/// All collaborators are injected: the coordinate store, the fallback
/// resolver for ids the store cannot serve, and the two persistent
/// collections. The processor owns its progress probe and cancellation
/// flag; both can be shared with observer threads before a pass starts.
pub struct PbfProcessor<'a> {
    config: ProcessConfig,
    store: &'a mut CoordinateStore,
    fallback: &'a dyn FallbackResolver,
    nodes: &'a mut dyn NodeStore,
    ways: &'a mut dyn WayStore,
    probe: Arc<ProgressProbe>,
    cancel: CancelFlag,
}

impl<'a> PbfProcessor<'a> {
    pub fn new(
        config: ProcessConfig,
        store: &'a mut CoordinateStore,
        fallback: &'a dyn FallbackResolver,
        nodes: &'a mut dyn NodeStore,
        ways: &'a mut dyn WayStore,
    ) -> Self {
        Self {
            config,
            store,
            fallback,
            nodes,
            ways,
            probe: Arc::new(ProgressProbe::new()),
            cancel: CancelFlag::new(),
        }
    }

    /// Shared handle to the progress counters.
    pub fn probe(&self) -> Arc<ProgressProbe> {
        Arc::clone(&self.probe)
    }

    /// Handle observers can use to request a cooperative stop.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Runs the complete pass: coordinate store, tagged nodes and ways in
    /// one sweep over the stream.
    pub fn run<S: ElementSource>(&mut self, source: &mut S) -> Result<ProcessSummary, ProcessError> {
        let mut phase = Phase::Nodes;
        let mut node_batch: Vec<Node> = Vec::with_capacity(self.config.batch_size());
        let mut way_batch: Vec<Way> = Vec::with_capacity(self.config.batch_size());
        let mut cancelled = false;

        loop {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping pass");
                cancelled = true;
                break;
            }

            let Some(element) = source.next_element()? else {
                break;
            };

            match element {
                Element::Node(node) => {
                    if phase == Phase::Ways {
                        return Err(ProcessError::Phase { id: node.id });
                    }
                    self.probe.record_node();
                    self.handle_node(node, &mut node_batch)?;
                }
                Element::Way(way) => {
                    self.probe.record_way();
                    if phase == Phase::Nodes {
                        self.enter_way_phase(&mut node_batch)?;
                        phase = Phase::Ways;
                    }
                    self.handle_way(way, &mut way_batch)?;
                }
                Element::Relation { .. } => break,
            }
        }

        self.flush_nodes(&mut node_batch)?;
        if phase == Phase::Nodes && !cancelled {
            self.store.finalize()?;
        }
        self.flush_ways(&mut way_batch)?;

        Ok(self.summary(cancelled))
    }

    /// Writes only the coordinate file.
    ///
    /// Every node coordinate is appended; the first non-node element
    /// finalizes the store and ends the pass. Tags and the external stores
    /// are untouched.
    pub fn write_coordinates<S: ElementSource>(
        &mut self,
        source: &mut S,
    ) -> Result<ProcessSummary, ProcessError> {
        let mut cancelled = false;

        loop {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping coordinate pass");
                cancelled = true;
                break;
            }

            match source.next_element()? {
                Some(Element::Node(node)) => {
                    self.probe.record_node();
                    self.write_coordinate(&node)?;
                }
                Some(Element::Way(_)) | Some(Element::Relation { .. }) | None => break,
            }
        }

        if !cancelled {
            self.store.finalize()?;
        }
        Ok(self.summary(cancelled))
    }

    /// Streams only tagged visible nodes to the node store.
    ///
    /// The coordinate store is not involved; the pass ends at the first
    /// non-node element.
    pub fn ingest_nodes<S: ElementSource>(
        &mut self,
        source: &mut S,
    ) -> Result<ProcessSummary, ProcessError> {
        let mut node_batch: Vec<Node> = Vec::with_capacity(self.config.batch_size());
        let mut cancelled = false;

        loop {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            match source.next_element()? {
                Some(Element::Node(node)) => {
                    self.probe.record_node();
                    self.batch_tagged_node(node, &mut node_batch)?;
                }
                Some(Element::Way(_)) | Some(Element::Relation { .. }) | None => break,
            }
        }

        self.flush_nodes(&mut node_batch)?;
        Ok(self.summary(cancelled))
    }

    /// Processes only ways against an already finalized coordinate store.
    ///
    /// Leading node elements are skipped; the first relation ends the
    /// pass.
    pub fn ingest_ways<S: ElementSource>(
        &mut self,
        source: &mut S,
    ) -> Result<ProcessSummary, ProcessError> {
        if !self.store.is_finalized() {
            return Err(ProcessError::Store(crate::store::StoreError::InvalidState(
                "way pass requires a finalized coordinate store",
            )));
        }

        let mut way_batch: Vec<Way> = Vec::with_capacity(self.config.batch_size());
        let mut cancelled = false;

        loop {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping way pass");
                cancelled = true;
                break;
            }

            match source.next_element()? {
                Some(Element::Node(_)) => self.probe.record_node(),
                Some(Element::Way(way)) => {
                    self.probe.record_way();
                    self.handle_way(way, &mut way_batch)?;
                }
                Some(Element::Relation { .. }) | None => break,
            }
        }

        self.flush_ways(&mut way_batch)?;
        Ok(self.summary(cancelled))
    }

    /// Node-phase handling: coordinate write plus tagged-node batching.
    fn handle_node(
        &mut self,
        element: NodeElement,
        batch: &mut Vec<Node>,
    ) -> Result<(), ProcessError> {
        self.write_coordinate(&element)?;
        self.batch_tagged_node(element, batch)
    }

    fn write_coordinate(&mut self, element: &NodeElement) -> Result<(), ProcessError> {
        self.store
            .write(element.id, element.lon, element.lat)
            .map_err(|source| ProcessError::NodeWrite {
                id: element.id,
                source,
            })
    }

    /// Adds the node to the batch when it is visible and keeps at least one
    /// tag after the noise filter; flushes a full batch.
    fn batch_tagged_node(
        &mut self,
        element: NodeElement,
        batch: &mut Vec<Node>,
    ) -> Result<(), ProcessError> {
        if !element.visible || element.tags.is_empty() {
            return Ok(());
        }

        let mut node = Node::new(element.id, element.lon, element.lat, element.tags);
        if !node.has_tags() {
            return Ok(());
        }
        node.make_geojson_feature();

        batch.push(node);
        if batch.len() >= self.config.batch_size() {
            self.flush_nodes(batch)?;
        }
        Ok(())
    }

    /// Node→Way barrier: flush pending nodes, then freeze the coordinate
    /// store. Runs exactly once per pass.
    fn enter_way_phase(&mut self, node_batch: &mut Vec<Node>) -> Result<(), ProcessError> {
        self.flush_nodes(node_batch)?;
        self.store.finalize()?;
        info!(
            nodes = self.probe.nodes_seen(),
            "node phase complete, coordinate store finalized"
        );
        Ok(())
    }

    /// Way-phase handling: resolve, assemble, batch.
    fn handle_way(&mut self, element: WayElement, batch: &mut Vec<Way>) -> Result<(), ProcessError> {
        if !element.visible {
            return Ok(());
        }

        let way = self.assemble_way(element)?;
        batch.push(way);
        if batch.len() >= self.config.batch_size() {
            self.flush_ways(batch)?;
        }
        Ok(())
    }

    /// Resolves every node reference of the way, in order, and derives the
    /// way's computed fields.
    fn assemble_way(&self, element: WayElement) -> Result<Way, ProcessError> {
        let resolver = NodeResolver::new(self.store, self.fallback);

        let mut geometry = Vec::with_capacity(element.node_ids.len());
        for node_id in &element.node_ids {
            geometry.push(resolver.resolve(*node_id)?);
        }

        let mut way = Way::new(element.id, geometry, element.tags);
        way.make_geojson_feature();
        Ok(way)
    }

    fn flush_nodes(&mut self, batch: &mut Vec<Node>) -> Result<(), ProcessError> {
        if batch.is_empty() {
            return Ok(());
        }
        debug!(count = batch.len(), "flushing node batch");
        self.nodes
            .insert_many(batch, self.config.store_timeout())
            .map_err(ProcessError::NodeStore)?;
        batch.clear();
        Ok(())
    }

    fn flush_ways(&mut self, batch: &mut Vec<Way>) -> Result<(), ProcessError> {
        if batch.is_empty() {
            return Ok(());
        }
        debug!(count = batch.len(), "flushing way batch");
        self.ways
            .insert_many(batch, self.config.store_timeout())
            .map_err(ProcessError::WayStore)?;
        batch.clear();
        Ok(())
    }

    fn summary(&self, cancelled: bool) -> ProcessSummary {
        ProcessSummary {
            nodes_seen: self.probe.nodes_seen(),
            ways_seen: self.probe.ways_seen(),
            cancelled,
        }
    }
}
