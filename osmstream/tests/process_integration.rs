//! End-to-end processing over a synthetic PBF element stream.

use std::time::Duration;

use osmstream::config::ProcessConfig;
use osmstream::db::{MemoryNodeStore, MemoryWayStore, NodeStore, WayStore};
use osmstream::model::{Tags, Way};
use osmstream::pbf::{Element, NodeElement, WayElement};
use osmstream::process::{PbfProcessor, ProcessError};
use osmstream::resolver::{FallbackError, FallbackResolver};
use osmstream::store::CoordinateStore;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Fallback that fails every request, proving the store served everything.
struct NoFallback;

impl FallbackResolver for NoFallback {
    fn resolve_node(&self, id: i64) -> Result<(f64, f64), FallbackError> {
        Err(FallbackError::MissingElement(id))
    }

    fn resolve_way(&self, id: i64) -> Result<Way, FallbackError> {
        Err(FallbackError::MissingElement(id))
    }
}

/// Fallback serving a fixed coordinate for any id.
struct FixedFallback(f64, f64);

impl FallbackResolver for FixedFallback {
    fn resolve_node(&self, _id: i64) -> Result<(f64, f64), FallbackError> {
        Ok((self.0, self.1))
    }

    fn resolve_way(&self, id: i64) -> Result<Way, FallbackError> {
        Err(FallbackError::MissingElement(id))
    }
}

fn plain_node(id: i64) -> Element {
    Element::Node(NodeElement {
        id,
        lon: -47.0 + id as f64 * 0.001,
        lat: -15.0 - id as f64 * 0.001,
        tags: Tags::new(),
        visible: true,
    })
}

fn tagged_node(id: i64, pairs: &[(&str, &str)]) -> Element {
    let Element::Node(mut node) = plain_node(id) else {
        unreachable!()
    };
    node.tags = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Element::Node(node)
}

fn visible_way(id: i64, refs: &[i64], pairs: &[(&str, &str)]) -> Element {
    Element::Way(WayElement {
        id,
        node_ids: refs.to_vec(),
        tags: pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        visible: true,
    })
}

/// Ten nodes (two genuinely tagged, one noise-only), one way over ids
/// {2, 5, 7}, one relation.
fn small_extract() -> Vec<Element> {
    let mut elements = Vec::new();
    for id in 1..=10i64 {
        elements.push(match id {
            2 => tagged_node(2, &[("name", "Praça Central"), ("amenity", "townhall")]),
            5 => tagged_node(5, &[("created_by", "editor")]),
            7 => tagged_node(7, &[("highway", "crossing")]),
            _ => plain_node(id),
        });
    }
    elements.push(visible_way(
        100,
        &[2, 5, 7],
        &[("highway", "residential"), ("source", "survey")],
    ));
    elements.push(Element::Relation { id: 900 });
    elements
}

#[test]
fn complete_pass_over_small_extract() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nodes.bin");

    let mut store = CoordinateStore::create(&path, 3).unwrap();
    let mut nodes = MemoryNodeStore::new();
    let mut ways = MemoryWayStore::new();

    let summary = {
        let mut processor = PbfProcessor::new(
            ProcessConfig::default(),
            &mut store,
            &NoFallback,
            &mut nodes,
            &mut ways,
        );
        processor.run(&mut small_extract().into_iter()).unwrap()
    };

    assert_eq!(summary.nodes_seen, 10);
    assert_eq!(summary.ways_seen, 1);
    assert!(!summary.cancelled);

    // Every node landed in the coordinate file, in ascending id order.
    assert_eq!(store.total_records(), 10);

    // Exactly the two tagged nodes survived the noise filter; the
    // noise-only node 5 was dropped silently.
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes.insertion_order(), &[2, 7]);
    let stored = nodes.get_by_id(2, TIMEOUT).unwrap().expect("node 2 stored");
    assert_eq!(stored.tags.len(), 2);
    assert!(stored.geojson.as_deref().unwrap().contains("\"Point\""));
    assert!(nodes.get_by_id(5, TIMEOUT).unwrap().is_none());

    // One way, geometry in reference order, each point equal to the
    // store's answer for the referenced id.
    assert_eq!(ways.len(), 1);
    let way = ways.get_by_id(100, TIMEOUT).unwrap().expect("way stored");
    assert_eq!(way.geometry.len(), 3);
    for (point, id) in way.geometry.iter().zip([2i64, 5, 7]) {
        let expected = store.lookup(id).unwrap().expect("ref resolves");
        assert_eq!(*point, expected);
    }

    assert!(!way.is_polygon);
    assert!(way.length_m > 0.0);
    assert_eq!(way.first, Some(way.geometry[0]));
    assert_eq!(way.last, Some(way.geometry[2]));
    assert_eq!(way.tags.len(), 1, "noise tag dropped from way");
    assert!(way.geojson.as_deref().unwrap().contains("\"LineString\""));

    let bbox = way.bbox.expect("bbox computed");
    for &(lon, lat) in &way.geometry {
        assert!(bbox.contains(lon, lat));
    }

    // The file survives a cold reopen with identical answers.
    store.close().unwrap();
    let reopened = CoordinateStore::open_for_query(&path).unwrap();
    assert_eq!(reopened.total_records(), 10);
    assert_eq!(
        reopened.lookup(7).unwrap(),
        Some((way.geometry[2].0, way.geometry[2].1))
    );
}

#[test]
fn invisible_node_is_stored_but_not_persisted() {
    let dir = TempDir::new().unwrap();
    let mut store = CoordinateStore::create(dir.path().join("nodes.bin"), 10).unwrap();
    let mut nodes = MemoryNodeStore::new();
    let mut ways = MemoryWayStore::new();

    let elements = vec![
        Element::Node(NodeElement {
            id: 1,
            lon: 1.0,
            lat: 1.0,
            tags: [("name".to_string(), "ghost".to_string())].into(),
            visible: false,
        }),
        visible_way(10, &[1], &[]),
    ];

    let mut processor = PbfProcessor::new(
        ProcessConfig::default(),
        &mut store,
        &NoFallback,
        &mut nodes,
        &mut ways,
    );
    processor.run(&mut elements.into_iter()).unwrap();

    // Invisible nodes still feed way geometry, they just never reach the
    // external store.
    assert!(nodes.is_empty());
    assert_eq!(store.lookup(1).unwrap(), Some((1.0, 1.0)));
    assert_eq!(ways.len(), 1);
}

#[test]
fn missing_reference_resolves_through_fallback() {
    let dir = TempDir::new().unwrap();
    let mut store = CoordinateStore::create(dir.path().join("nodes.bin"), 10).unwrap();
    let mut nodes = MemoryNodeStore::new();
    let mut ways = MemoryWayStore::new();

    let elements = vec![
        plain_node(1),
        plain_node(2),
        // Node 99 is never in the stream.
        visible_way(10, &[1, 99, 2], &[]),
    ];

    let fallback = FixedFallback(8.5, -3.25);
    let mut processor = PbfProcessor::new(
        ProcessConfig::default(),
        &mut store,
        &fallback,
        &mut nodes,
        &mut ways,
    );
    processor.run(&mut elements.into_iter()).unwrap();

    let way = ways.get_by_id(10, TIMEOUT).unwrap().expect("way stored");
    assert_eq!(way.geometry.len(), 3);
    assert_eq!(way.geometry[1], (8.5, -3.25));

    // The fallback answer is used directly, never written back.
    assert_eq!(store.total_records(), 2);
    assert_eq!(store.lookup(99).unwrap(), None);
}

#[test]
fn fallback_failure_aborts_the_pass() {
    let dir = TempDir::new().unwrap();
    let mut store = CoordinateStore::create(dir.path().join("nodes.bin"), 10).unwrap();
    let mut nodes = MemoryNodeStore::new();
    let mut ways = MemoryWayStore::new();

    let elements = vec![plain_node(1), visible_way(10, &[1, 99], &[])];

    let mut processor = PbfProcessor::new(
        ProcessConfig::default(),
        &mut store,
        &NoFallback,
        &mut nodes,
        &mut ways,
    );
    let result = processor.run(&mut elements.into_iter());

    assert!(matches!(
        result,
        Err(ProcessError::Resolver { id: 99, .. })
    ));
    assert!(ways.is_empty());
}

#[test]
fn cancellation_mid_stream_flushes_partial_batches() {
    let dir = TempDir::new().unwrap();
    let mut store = CoordinateStore::create(dir.path().join("nodes.bin"), 10).unwrap();
    let mut nodes = MemoryNodeStore::new();
    let mut ways = MemoryWayStore::new();

    // A source that trips the cancel flag while streaming.
    struct CancellingSource {
        inner: std::vec::IntoIter<Element>,
        cancel: osmstream::process::CancelFlag,
        after: usize,
        served: usize,
    }

    impl osmstream::pbf::ElementSource for CancellingSource {
        fn next_element(
            &mut self,
        ) -> Result<Option<Element>, osmstream::pbf::DecodeError> {
            self.served += 1;
            if self.served == self.after {
                self.cancel.cancel();
            }
            Ok(self.inner.next())
        }
    }

    let elements = vec![
        tagged_node(1, &[("name", "a")]),
        tagged_node(2, &[("name", "b")]),
        tagged_node(3, &[("name", "c")]),
        tagged_node(4, &[("name", "d")]),
    ];

    let summary = {
        let mut processor = PbfProcessor::new(
            ProcessConfig::default(),
            &mut store,
            &NoFallback,
            &mut nodes,
            &mut ways,
        );
        let mut source = CancellingSource {
            inner: elements.into_iter(),
            cancel: processor.cancel_flag(),
            after: 2,
            served: 0,
        };
        processor.run(&mut source).unwrap()
    };

    // The element being processed when the request arrived completes,
    // later ones are never pulled, and the partial batch is flushed.
    assert!(summary.cancelled);
    assert_eq!(summary.nodes_seen, 2);
    assert_eq!(nodes.len(), 2);
    assert!(!store.is_finalized());
}

#[test]
fn batches_flush_in_observation_order() {
    let dir = TempDir::new().unwrap();
    let mut store = CoordinateStore::create(dir.path().join("nodes.bin"), 10).unwrap();
    let mut nodes = MemoryNodeStore::new();
    let mut ways = MemoryWayStore::new();

    let mut elements: Vec<Element> = (1..=7)
        .map(|id| tagged_node(id, &[("name", "x")]))
        .collect();
    elements.push(visible_way(101, &[1, 2], &[]));
    elements.push(visible_way(102, &[3, 4], &[]));
    elements.push(visible_way(103, &[5], &[]));

    let mut processor = PbfProcessor::new(
        ProcessConfig::new().with_batch_size(3),
        &mut store,
        &NoFallback,
        &mut nodes,
        &mut ways,
    );
    processor.run(&mut elements.into_iter()).unwrap();

    assert_eq!(nodes.insertion_order(), &[1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(nodes.batches(), 3);
    assert_eq!(ways.insertion_order(), &[101, 102, 103]);
    assert_eq!(ways.batches(), 1);
}
