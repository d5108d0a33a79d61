//! Fallback resolver backed by the OSM API v0.6.
//!
//! The API serves single elements as small XML documents, e.g.
//! `GET /api/0.6/node/273316`:
//!
//! ```xml
//! <osm version="0.6">
//!   <node id="273316" visible="true" lat="-23.5505200" lon="-46.6333090">
//!     <tag k="name" v="Praça da Sé"/>
//!   </node>
//! </osm>
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::http::{HttpClient, ReqwestClient};
use super::{FallbackError, FallbackResolver};
use crate::coord::round7;
use crate::model::{Tags, Way};

/// Public OSM API v0.6 endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://www.openstreetmap.org/api/0.6";

/// OSM API v0.6 client implementing [`FallbackResolver`].
pub struct OsmApiClient<C: HttpClient = ReqwestClient> {
    http: C,
    base_url: String,
}

impl OsmApiClient<ReqwestClient> {
    /// Creates a client against the public OSM API.
    pub fn new() -> Result<Self, FallbackError> {
        Ok(Self::with_client(ReqwestClient::new()?, DEFAULT_API_BASE_URL))
    }
}

impl<C: HttpClient> OsmApiClient<C> {
    /// Creates a client with a custom transport and base URL.
    pub fn with_client(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn fetch(&self, kind: &str, id: i64) -> Result<String, FallbackError> {
        let url = format!("{}/{}/{}", self.base_url, kind, id);
        let body = self.http.get(&url)?;
        String::from_utf8(body).map_err(|e| FallbackError::Parse(e.to_string()))
    }
}

impl<C: HttpClient> FallbackResolver for OsmApiClient<C> {
    fn resolve_node(&self, id: i64) -> Result<(f64, f64), FallbackError> {
        let xml = self.fetch("node", id)?;
        let node = parse_node_document(&xml)?.ok_or(FallbackError::MissingElement(id))?;
        Ok((round7(node.lon), round7(node.lat)))
    }

    fn resolve_way(&self, id: i64) -> Result<Way, FallbackError> {
        let xml = self.fetch("way", id)?;
        let parsed = parse_way_document(&xml)?.ok_or(FallbackError::MissingElement(id))?;

        let mut geometry = Vec::with_capacity(parsed.node_ids.len());
        for node_id in parsed.node_ids {
            geometry.push(self.resolve_node(node_id)?);
        }

        let mut way = Way::new(id, geometry, parsed.tags);
        way.make_geojson_feature();
        Ok(way)
    }
}

struct ParsedNode {
    lon: f64,
    lat: f64,
}

struct ParsedWay {
    node_ids: Vec<i64>,
    tags: Tags,
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, FallbackError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| FallbackError::Parse(e.to_string()))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| FallbackError::Parse(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required_f64(element: &BytesStart<'_>, name: &str) -> Result<f64, FallbackError> {
    let raw = attribute(element, name)?
        .ok_or_else(|| FallbackError::Parse(format!("missing {name} attribute")))?;
    raw.parse()
        .map_err(|_| FallbackError::Parse(format!("invalid {name} attribute: {raw}")))
}

fn parse_node_document(xml: &str) -> Result<Option<ParsedNode>, FallbackError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Err(e) => return Err(FallbackError::Parse(e.to_string())),
            Ok(Event::Eof) => return Ok(None),
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"node" => {
                return Ok(Some(ParsedNode {
                    lon: required_f64(&e, "lon")?,
                    lat: required_f64(&e, "lat")?,
                }));
            }
            Ok(_) => {}
        }
    }
}

fn parse_way_document(xml: &str) -> Result<Option<ParsedWay>, FallbackError> {
    let mut reader = Reader::from_str(xml);
    let mut seen_way = false;
    let mut node_ids = Vec::new();
    let mut tags = Tags::new();

    loop {
        match reader.read_event() {
            Err(e) => return Err(FallbackError::Parse(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"way" => seen_way = true,
                b"nd" => {
                    let raw = attribute(&e, "ref")?
                        .ok_or_else(|| FallbackError::Parse("nd without ref".into()))?;
                    let id = raw
                        .parse()
                        .map_err(|_| FallbackError::Parse(format!("invalid nd ref: {raw}")))?;
                    node_ids.push(id);
                }
                b"tag" => {
                    let key = attribute(&e, "k")?;
                    let value = attribute(&e, "v")?;
                    if let (Some(key), Some(value)) = (key, value) {
                        tags.insert(key, value);
                    }
                }
                _ => {}
            },
            Ok(_) => {}
        }
    }

    if !seen_way {
        return Ok(None);
    }
    Ok(Some(ParsedWay { node_ids, tags }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::http::tests::MockHttpClient;

    const NODE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="openstreetmap-cgimap">
 <node id="273316" visible="true" version="7" lat="-23.5505200" lon="-46.6333090">
  <tag k="name" v="Marco Zero"/>
 </node>
</osm>"#;

    const WAY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
 <way id="555" visible="true">
  <nd ref="11"/>
  <nd ref="12"/>
  <tag k="highway" v="residential"/>
  <tag k="created_by" v="editor"/>
 </way>
</osm>"#;

    fn small_node_xml(id: i64, lon: f64, lat: f64) -> String {
        format!(r#"<osm><node id="{id}" lat="{lat}" lon="{lon}"/></osm>"#)
    }

    #[test]
    fn test_resolve_node_parses_coordinates() {
        let http = MockHttpClient::default().with_response("http://api/node/273316", NODE_XML);
        let client = OsmApiClient::with_client(http, "http://api");

        let (lon, lat) = client.resolve_node(273316).unwrap();
        assert_eq!(lon, -46.6333090);
        assert_eq!(lat, -23.5505200);
    }

    #[test]
    fn test_resolve_node_http_failure() {
        let client = OsmApiClient::with_client(MockHttpClient::default(), "http://api");
        assert!(matches!(
            client.resolve_node(1),
            Err(FallbackError::Http(_))
        ));
    }

    #[test]
    fn test_resolve_node_without_node_element() {
        let http = MockHttpClient::default().with_response("http://api/node/9", "<osm></osm>");
        let client = OsmApiClient::with_client(http, "http://api");
        assert!(matches!(
            client.resolve_node(9),
            Err(FallbackError::MissingElement(9))
        ));
    }

    #[test]
    fn test_resolve_way_assembles_geometry() {
        let http = MockHttpClient::default()
            .with_response("http://api/way/555", WAY_XML)
            .with_response("http://api/node/11", &small_node_xml(11, 1.0, 2.0))
            .with_response("http://api/node/12", &small_node_xml(12, 3.0, 4.0));
        let client = OsmApiClient::with_client(http, "http://api");

        let way = client.resolve_way(555).unwrap();
        assert_eq!(way.geometry, vec![(1.0, 2.0), (3.0, 4.0)]);
        // Noise tags are stripped during assembly.
        assert_eq!(way.tags.len(), 1);
        assert!(way.tags.contains_key("highway"));
        assert!(way.geojson.is_some());
    }

    #[test]
    fn test_resolve_way_fails_on_missing_node() {
        let http = MockHttpClient::default().with_response("http://api/way/555", WAY_XML);
        let client = OsmApiClient::with_client(http, "http://api");
        assert!(client.resolve_way(555).is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_coordinates() {
        let xml = r#"<osm><node id="1" lat="abc" lon="1.0"/></osm>"#;
        assert!(matches!(
            parse_node_document(xml),
            Err(FallbackError::Parse(_))
        ));
    }
}
