//! Streaming PBF processing.
//!
//! # Architecture
//!
//! ```text
//! PBF decoder → PbfProcessor ─┬─ node phase: CoordinateStore writes,
//!                             │              tagged-node batches → NodeStore
//!                             └─ way phase:  node-ref resolution → Way
//!                                            assembly → batches → WayStore
//! ```
//!
//! The pass is strictly phased: the first decoded way finalizes the
//! coordinate store and the processor never writes a coordinate again.
//!
//! # Key components
//!
//! - [`PbfProcessor`] - the single-pass coordinator
//! - [`ProgressProbe`] - lock-free counters observers may poll
//! - [`CancelFlag`] - cooperative stop signal
//! - [`ProcessError`] - the fatal error taxonomy of a pass

mod coordinator;
mod error;
mod progress;

pub use coordinator::{count_elements, ElementCounts, PbfProcessor, ProcessSummary};
pub use error::ProcessError;
pub use progress::{CancelFlag, ProgressProbe};
