//! Tagged OSM node as persisted to the node store.

use super::geojson;
use super::tags::{strip_noise_tags, Tags};
use crate::coord::round7;

/// A point of interest: an OSM node that carries tags worth persisting.
///
/// Plain shape-only nodes never become `Node` values; their coordinates
/// live exclusively in the coordinate store.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    /// Longitude in degrees, rounded to 7 decimal places
    pub lon: f64,
    /// Latitude in degrees, rounded to 7 decimal places
    pub lat: f64,
    /// Tag mapping with noise keys already removed
    pub tags: Tags,
    /// Prebuilt GeoJSON feature, when requested
    pub geojson: Option<String>,
}

impl Node {
    /// Builds a node, rounding the coordinates and stripping noise tags.
    pub fn new(id: i64, lon: f64, lat: f64, mut tags: Tags) -> Self {
        strip_noise_tags(&mut tags);
        Self {
            id,
            lon: round7(lon),
            lat: round7(lat),
            tags,
            geojson: None,
        }
    }

    /// True when at least one tag survived the noise filter.
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Computes and caches the GeoJSON `Point` feature for this node.
    pub fn make_geojson_feature(&mut self) -> &str {
        if self.geojson.is_none() {
            self.geojson = Some(geojson::point_feature(self.id, self.lon, self.lat, &self.tags));
        }
        self.geojson.as_deref().expect("feature just cached")
    }
}
