//! Geodesic helpers for way assembly.
//!
//! Distances use the great-circle formula with the WGS-84 ellipsoid radius
//! evaluated at the latitude of the segment's first point, matching the
//! precision expectations of map-length aggregation rather than full
//! geodesic (Vincenty) accuracy.

use serde::Serialize;

/// WGS-84 semi-major axis in meters.
pub const WGS84_SEMI_MAJOR_M: f64 = 6_378_137.0;

/// WGS-84 semi-minor axis in meters.
pub const WGS84_SEMI_MINOR_M: f64 = 6_356_752.314_245;

/// Earth radius in meters at the given latitude (radians) on the WGS-84
/// ellipsoid.
pub fn earth_radius_at(lat_rad: f64) -> f64 {
    let a = WGS84_SEMI_MAJOR_M;
    let b = WGS84_SEMI_MINOR_M;
    let cos = lat_rad.cos();
    let sin = lat_rad.sin();

    (((a * a * cos).powi(2) + (b * b * sin).powi(2)) / ((a * cos).powi(2) + (b * sin).powi(2)))
        .sqrt()
}

/// Great-circle distance in meters between two `(lon, lat)` points given in
/// degrees.
///
/// Degenerate inputs that drive `acos` out of its domain yield 0 meters.
pub fn great_circle_distance_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon_a, lat_a) = (a.0.to_radians(), a.1.to_radians());
    let (lon_b, lat_b) = (b.0.to_radians(), b.1.to_radians());

    let radius = earth_radius_at(lat_a);
    let meters =
        (lat_a.sin() * lat_b.sin() + lat_a.cos() * lat_b.cos() * (lon_a - lon_b).cos()).acos()
            * radius;

    if meters.is_nan() {
        0.0
    } else {
        meters
    }
}

/// Axis-aligned bounding box over `(lon, lat)` points in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Computes the bounding box of a point sequence.
    ///
    /// Returns `None` for an empty sequence.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (first_lon, first_lat) = *points.first()?;
        let mut bbox = BoundingBox {
            min_lon: first_lon,
            min_lat: first_lat,
            max_lon: first_lon,
            max_lat: first_lat,
        };

        for &(lon, lat) in &points[1..] {
            bbox.include(lon, lat);
        }

        Some(bbox)
    }

    /// Grows the box to cover the given point.
    pub fn include(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Returns true when the point lies inside or on the box boundary.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}
