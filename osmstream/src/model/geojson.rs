//! GeoJSON feature strings for nodes and ways.
//!
//! Features are prebuilt once per element and stored alongside it, so map
//! frontends can use persisted entities without a conversion step.

use super::tags::Tags;
use serde_json::json;

/// Builds a GeoJSON `Point` feature.
pub fn point_feature(id: i64, lon: f64, lat: f64, tags: &Tags) -> String {
    json!({
        "type": "Feature",
        "id": id.to_string(),
        "properties": tags,
        "geometry": {
            "type": "Point",
            "coordinates": [lon, lat],
        },
    })
    .to_string()
}

/// Builds a GeoJSON `LineString` feature from an ordered `(lon, lat)`
/// sequence.
pub fn line_string_feature(id: i64, coordinates: &[(f64, f64)], tags: &Tags) -> String {
    let coordinates: Vec<[f64; 2]> = coordinates.iter().map(|&(lon, lat)| [lon, lat]).collect();
    json!({
        "type": "Feature",
        "id": id.to_string(),
        "properties": tags,
        "geometry": {
            "type": "LineString",
            "coordinates": coordinates,
        },
    })
    .to_string()
}

/// Wraps prebuilt feature strings into a `FeatureCollection` document.
pub fn feature_collection(features: &[String]) -> String {
    format!(
        "{{\"type\":\"FeatureCollection\",\"features\":[{}]}}",
        features.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_feature_shape() {
        let mut tags = Tags::new();
        tags.insert("name".into(), "Praça da Sé".into());

        let feature = point_feature(273316, -46.633309, -23.550520, &tags);
        let value: serde_json::Value = serde_json::from_str(&feature).unwrap();

        assert_eq!(value["type"], "Feature");
        assert_eq!(value["id"], "273316");
        assert_eq!(value["properties"]["name"], "Praça da Sé");
        assert_eq!(value["geometry"]["type"], "Point");
        assert_eq!(value["geometry"]["coordinates"][0], -46.633309);
    }

    #[test]
    fn test_line_string_feature_preserves_order() {
        let coords = [(1.0, 2.0), (3.0, 4.0), (5.0, 6.0)];
        let feature = line_string_feature(7, &coords, &Tags::new());
        let value: serde_json::Value = serde_json::from_str(&feature).unwrap();

        let geometry = &value["geometry"]["coordinates"];
        assert_eq!(geometry.as_array().unwrap().len(), 3);
        assert_eq!(geometry[0][0], 1.0);
        assert_eq!(geometry[2][1], 6.0);
    }

    #[test]
    fn test_feature_collection_wraps_features() {
        let features = vec![
            point_feature(1, 0.0, 0.0, &Tags::new()),
            point_feature(2, 1.0, 1.0, &Tags::new()),
        ];
        let collection = feature_collection(&features);
        let value: serde_json::Value = serde_json::from_str(&collection).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 2);
    }
}
