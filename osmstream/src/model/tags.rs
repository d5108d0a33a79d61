//! Tag map handling shared by nodes and ways.

use std::collections::BTreeMap;

/// Ordered tag mapping of an OSM element.
pub type Tags = BTreeMap<String, String>;

/// Keys dropped from every persisted element.
///
/// These keys inflate storage, never participate in queries and duplicate
/// metadata kept elsewhere.
const NOISE_TAG_KEYS: [&str; 7] = [
    "source",
    "Source",
    "history",
    "converted_by",
    "created_by",
    "wikipedia",
    "wikidata",
];

/// Removes the noise keys from a tag map in place.
pub fn strip_noise_tags(tags: &mut Tags) {
    for key in NOISE_TAG_KEYS {
        tags.remove(key);
    }
}
