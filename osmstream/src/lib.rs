//! osmstream - streaming OpenStreetMap PBF ingestion
//!
//! This library turns a planet-scale `.osm.pbf` file into queryable node
//! and way collections without holding the node set in memory and without
//! a database round-trip per node reference. The key piece is the
//! [`store::CoordinateStore`]: an append-only binary file of sorted
//! `(id, lon, lat)` records searched through a two-level binary search, an
//! in-memory sparse index over every Nth record plus an on-disk search
//! inside the bracketed window.
//!
//! # High-Level API
//!
//! ```ignore
//! use osmstream::config::ProcessConfig;
//! use osmstream::pbf::PbfReader;
//! use osmstream::process::PbfProcessor;
//! use osmstream::resolver::OsmApiClient;
//! use osmstream::store::CoordinateStore;
//!
//! let config = ProcessConfig::default();
//! let mut store = CoordinateStore::create("nodes.bin", config.block_size())?;
//! let fallback = OsmApiClient::new()?;
//!
//! let mut processor =
//!     PbfProcessor::new(config, &mut store, &fallback, &mut nodes, &mut ways);
//! let summary = processor.run(&mut PbfReader::from_path("extract.osm.pbf")?)?;
//! ```

pub mod config;
pub mod coord;
pub mod db;
pub mod download;
pub mod geo;
pub mod logging;
pub mod model;
pub mod pbf;
pub mod process;
pub mod resolver;
pub mod store;

/// Version of the osmstream library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
