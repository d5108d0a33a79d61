//! Domain model: persisted nodes and ways, tag handling, GeoJSON.

mod node;
mod way;

pub mod geojson;
pub mod tags;

pub use node::Node;
pub use tags::{strip_noise_tags, Tags};
pub use way::Way;
