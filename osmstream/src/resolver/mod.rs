//! Node resolution: coordinate store first, network fallback second.
//!
//! During the way phase every node reference is resolved through
//! [`NodeResolver`]: a store lookup that falls back to an injected
//! [`FallbackResolver`] when the id is absent from the coordinate file.
//! Fallback hits are logged and never written back to the store; misses
//! are expected to be rare enough (deleted or out-of-extract nodes) that
//! neither a negative nor an extra positive cache pays for itself.

mod http;
mod osm_api;

pub use http::{HttpClient, ReqwestClient, DEFAULT_HTTP_TIMEOUT};
pub use osm_api::{OsmApiClient, DEFAULT_API_BASE_URL};

use crate::model::Way;
use crate::store::{CoordinateStore, StoreError};
use thiserror::Error;
use tracing::info;

/// Failures of the fallback fetch itself.
#[derive(Debug, Error, Clone)]
pub enum FallbackError {
    /// Transport failure or non-success status (including timeouts)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The API answered but the payload was not understood
    #[error("failed to parse OSM API response: {0}")]
    Parse(String),

    /// The API answered without the requested element
    #[error("element {0} missing from OSM API response")]
    MissingElement(i64),
}

/// Black-box source for elements missing from the coordinate store.
///
/// `resolve_node` serves the way-assembly fast path; `resolve_way` is only
/// used outside the main pass.
pub trait FallbackResolver {
    fn resolve_node(&self, id: i64) -> Result<(f64, f64), FallbackError>;
    fn resolve_way(&self, id: i64) -> Result<Way, FallbackError>;
}

/// Errors surfaced by [`NodeResolver::resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Store I/O or format failure, always fatal for the pass
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The id was absent from the store and the fallback failed too
    #[error("fallback failed for node {id}: {source}")]
    Fallback {
        id: i64,
        #[source]
        source: FallbackError,
    },
}

/// Two-tier resolver over the coordinate store and a fallback source.
///
/// A store miss is not an error here; it only becomes one when the
/// fallback cannot supply the coordinate either.
pub struct NodeResolver<'a> {
    store: &'a CoordinateStore,
    fallback: &'a dyn FallbackResolver,
}

impl<'a> NodeResolver<'a> {
    pub fn new(store: &'a CoordinateStore, fallback: &'a dyn FallbackResolver) -> Self {
        Self { store, fallback }
    }

    /// Resolves a node id to its `(lon, lat)` pair.
    pub fn resolve(&self, id: i64) -> Result<(f64, f64), ResolveError> {
        if let Some(coordinates) = self.store.lookup(id)? {
            return Ok(coordinates);
        }

        info!(id, "node missing from coordinate store, fetching from fallback");
        self.fallback
            .resolve_node(id)
            .map_err(|source| ResolveError::Fallback { id, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct StubFallback {
        coordinate: Option<(f64, f64)>,
    }

    impl FallbackResolver for StubFallback {
        fn resolve_node(&self, id: i64) -> Result<(f64, f64), FallbackError> {
            self.coordinate.ok_or(FallbackError::MissingElement(id))
        }

        fn resolve_way(&self, id: i64) -> Result<Way, FallbackError> {
            Err(FallbackError::MissingElement(id))
        }
    }

    fn finalized_store(dir: &TempDir) -> CoordinateStore {
        let mut store = CoordinateStore::create(dir.path().join("nodes.bin"), 4).unwrap();
        store.write(10, 1.5, 2.5).unwrap();
        store.write(20, -1.5, -2.5).unwrap();
        store.finalize().unwrap();
        store
    }

    #[test]
    fn test_resolve_prefers_store() {
        let dir = TempDir::new().unwrap();
        let store = finalized_store(&dir);
        let fallback = StubFallback {
            coordinate: Some((99.0, 99.0)),
        };

        let resolver = NodeResolver::new(&store, &fallback);
        assert_eq!(resolver.resolve(10).unwrap(), (1.5, 2.5));
    }

    #[test]
    fn test_resolve_uses_fallback_on_miss() {
        let dir = TempDir::new().unwrap();
        let store = finalized_store(&dir);
        let fallback = StubFallback {
            coordinate: Some((7.0, 8.0)),
        };

        let resolver = NodeResolver::new(&store, &fallback);
        assert_eq!(resolver.resolve(15).unwrap(), (7.0, 8.0));
    }

    #[test]
    fn test_resolve_fails_when_both_miss() {
        let dir = TempDir::new().unwrap();
        let store = finalized_store(&dir);
        let fallback = StubFallback { coordinate: None };

        let resolver = NodeResolver::new(&store, &fallback);
        assert!(matches!(
            resolver.resolve(15),
            Err(ResolveError::Fallback { id: 15, .. })
        ));
    }

    #[test]
    fn test_resolve_does_not_write_back() {
        let dir = TempDir::new().unwrap();
        let store = finalized_store(&dir);
        let fallback = StubFallback {
            coordinate: Some((7.0, 8.0)),
        };

        let resolver = NodeResolver::new(&store, &fallback);
        resolver.resolve(15).unwrap();
        assert_eq!(store.total_records(), 2);
        assert_eq!(store.lookup(15).unwrap(), None);
    }
}
