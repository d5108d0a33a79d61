//! Error taxonomy of a processing pass.
//!
//! Every variant is fatal for the pass. A store lookup miss never appears
//! here: the coordinator absorbs it by consulting the fallback resolver and
//! only a fallback failure surfaces, as [`ProcessError::Resolver`].

use crate::db::DbError;
use crate::pbf::DecodeError;
use crate::resolver::{FallbackError, ResolveError};
use crate::store::StoreError;
use thiserror::Error;

/// Fatal failures of a PBF processing pass.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The PBF stream is unreadable
    #[error("PBF decode error: {0}")]
    Decoder(#[from] DecodeError),

    /// The PBF element order contract was violated
    #[error("unexpected node {id} after the way phase began")]
    Phase { id: i64 },

    /// Coordinate store read, finalize or format failure
    #[error("coordinate store error: {0}")]
    Store(#[from] StoreError),

    /// A node could not be appended to the coordinate store
    #[error("failed to write node {id} to the coordinate store: {source}")]
    NodeWrite {
        id: i64,
        #[source]
        source: StoreError,
    },

    /// The fallback resolver failed for a node absent from the store
    #[error("fallback resolver failed for node {id}: {source}")]
    Resolver {
        id: i64,
        #[source]
        source: FallbackError,
    },

    /// The external node store rejected an insert
    #[error("node store error: {0}")]
    NodeStore(#[source] DbError),

    /// The external way store rejected an insert
    #[error("way store error: {0}")]
    WayStore(#[source] DbError),
}

impl From<ResolveError> for ProcessError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Store(e) => ProcessError::Store(e),
            ResolveError::Fallback { id, source } => ProcessError::Resolver { id, source },
        }
    }
}
