//! File-backed PBF element source.
//!
//! Decodes an `.osm.pbf` file blob by blob with [`osmpbf`] and hands out
//! owned elements one at a time. Elements of the current primitive block
//! are buffered; the next blob is only decompressed once the buffer runs
//! dry, which keeps memory proportional to a single block regardless of
//! file size.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use osmpbf::{Blob, BlobDecode, BlobReader, PrimitiveBlock};
use tracing::debug;

use super::{DecodeError, Element, ElementSource, NodeElement, WayElement};
use crate::model::Tags;

/// Streaming decoder over an OSM PBF file.
pub struct PbfReader {
    blobs: BlobReader<BufReader<File>>,
    pending: VecDeque<Element>,
}

impl PbfReader {
    /// Opens a PBF file for a single decoding pass.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let blobs = BlobReader::from_path(path).map_err(|source| DecodeError::Open {
            source,
            path: path.to_path_buf(),
        })?;

        debug!(path = %path.display(), "opened PBF file");

        Ok(Self {
            blobs,
            pending: VecDeque::new(),
        })
    }

    fn buffer_block(&mut self, block: PrimitiveBlock) {
        for element in block.elements() {
            match element {
                osmpbf::Element::Node(node) => {
                    self.pending.push_back(Element::Node(NodeElement {
                        id: node.id(),
                        lon: node.lon(),
                        lat: node.lat(),
                        tags: collect_tags(node.tags()),
                        visible: node.info().visible(),
                    }));
                }
                osmpbf::Element::DenseNode(node) => {
                    self.pending.push_back(Element::Node(NodeElement {
                        id: node.id(),
                        lon: node.lon(),
                        lat: node.lat(),
                        tags: collect_tags(node.tags()),
                        visible: node.info().map_or(true, |info| info.visible()),
                    }));
                }
                osmpbf::Element::Way(way) => {
                    self.pending.push_back(Element::Way(WayElement {
                        id: way.id(),
                        node_ids: way.refs().collect(),
                        tags: collect_tags(way.tags()),
                        visible: way.info().visible(),
                    }));
                }
                osmpbf::Element::Relation(relation) => {
                    self.pending
                        .push_back(Element::Relation { id: relation.id() });
                }
            }
        }
    }

    fn decode_next_blob(&mut self, blob: Blob) -> Result<(), DecodeError> {
        match blob.decode()? {
            BlobDecode::OsmData(block) => self.buffer_block(block),
            // Header and unknown blobs carry no elements.
            BlobDecode::OsmHeader(_) | BlobDecode::Unknown(_) => {}
        }
        Ok(())
    }
}

impl ElementSource for PbfReader {
    fn next_element(&mut self) -> Result<Option<Element>, DecodeError> {
        loop {
            if let Some(element) = self.pending.pop_front() {
                return Ok(Some(element));
            }
            match self.blobs.next() {
                Some(blob) => self.decode_next_blob(blob?)?,
                None => return Ok(None),
            }
        }
    }
}

fn collect_tags<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Tags {
    pairs
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file_fails() {
        let result = PbfReader::from_path("/nonexistent/planet.osm.pbf");
        assert!(matches!(result, Err(DecodeError::Open { .. })));
    }
}
