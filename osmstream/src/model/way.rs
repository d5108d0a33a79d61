//! Assembled OSM way with resolved geometry.

use super::geojson;
use super::tags::{strip_noise_tags, Tags};
use crate::coord::round7;
use crate::geo::{great_circle_distance_m, BoundingBox};

/// An OSM way whose node references have been resolved to coordinates.
///
/// All derived fields (bounding box, polyline length, endpoints, polygon
/// flag) are computed once at construction from the resolved geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    /// True when the way closes back on its first point
    pub is_polygon: bool,
    /// Tag mapping with noise keys already removed
    pub tags: Tags,
    /// Resolved `(lon, lat)` sequence, one entry per node reference, in
    /// reference order
    pub geometry: Vec<(f64, f64)>,
    /// First coordinate pair, for endpoint joining
    pub first: Option<(f64, f64)>,
    /// Last coordinate pair, for endpoint joining
    pub last: Option<(f64, f64)>,
    /// Total polyline length in meters
    pub length_m: f64,
    /// Axis-aligned bounding box of the geometry
    pub bbox: Option<BoundingBox>,
    /// Prebuilt GeoJSON feature, when requested
    pub geojson: Option<String>,
}

impl Way {
    /// Builds a way from its resolved geometry, computing every derived
    /// field.
    ///
    /// Coordinates are rounded to the canonical 7 decimal places on
    /// capture, so the polygon test can compare pairs with plain float
    /// equality.
    pub fn new(id: i64, geometry: Vec<(f64, f64)>, mut tags: Tags) -> Self {
        strip_noise_tags(&mut tags);

        let geometry: Vec<(f64, f64)> = geometry
            .into_iter()
            .map(|(lon, lat)| (round7(lon), round7(lat)))
            .collect();

        let length_m = geometry
            .windows(2)
            .map(|pair| great_circle_distance_m(pair[0], pair[1]))
            .sum();

        Self {
            id,
            is_polygon: detect_polygon(&geometry),
            tags,
            first: geometry.first().copied(),
            last: geometry.last().copied(),
            length_m,
            bbox: BoundingBox::from_points(&geometry),
            geometry,
            geojson: None,
        }
    }

    /// Number of resolved points.
    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    /// True when the way has no resolved points.
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    /// Computes and caches the GeoJSON `LineString` feature for this way.
    pub fn make_geojson_feature(&mut self) -> &str {
        if self.geojson.is_none() {
            self.geojson = Some(geojson::line_string_feature(
                self.id,
                &self.geometry,
                &self.tags,
            ));
        }
        self.geojson.as_deref().expect("feature just cached")
    }
}

/// A way is a polygon when it has at least three distinct positions and its
/// first and last pairs are identical after rounding.
fn detect_polygon(geometry: &[(f64, f64)]) -> bool {
    if geometry.len() < 3 {
        return false;
    }
    geometry.first() == geometry.last()
}
