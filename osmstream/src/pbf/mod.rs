//! Decoded OSM element stream.
//!
//! The processor consumes elements through the [`ElementSource`] trait, one
//! element at a time, in the order the PBF format guarantees:
//! `Node* Way* Relation*`. [`PbfReader`](reader::PbfReader) adapts an
//! `.osm.pbf` file to this trait; tests feed synthetic element vectors
//! through the same seam.

mod reader;

pub use reader::PbfReader;

use crate::model::Tags;
use std::path::PathBuf;
use thiserror::Error;

/// A decoded OSM node element, before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeElement {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
    pub tags: Tags,
    pub visible: bool,
}

/// A decoded OSM way element with its raw node references.
#[derive(Debug, Clone, PartialEq)]
pub struct WayElement {
    pub id: i64,
    pub node_ids: Vec<i64>,
    pub tags: Tags,
    pub visible: bool,
}

/// One element of the decoded stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(NodeElement),
    Way(WayElement),
    /// Relations are out of scope; only their presence matters, as the
    /// terminator of the way phase.
    Relation { id: i64 },
}

/// PBF decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open OSM PBF file {path:?}")]
    Open {
        #[source]
        source: osmpbf::Error,
        path: PathBuf,
    },

    #[error("failed to decode OSM PBF data")]
    Decode(#[from] osmpbf::Error),
}

/// Pull interface over a decoded element sequence.
///
/// A source is consumed in a single pass; `Ok(None)` marks the end of the
/// stream.
pub trait ElementSource {
    fn next_element(&mut self) -> Result<Option<Element>, DecodeError>;
}

/// Lets tests and demos stream a prepared element vector.
impl ElementSource for std::vec::IntoIter<Element> {
    fn next_element(&mut self) -> Result<Option<Element>, DecodeError> {
        Ok(self.next())
    }
}
