//! Replay sessions
//!
//! Connects a [`RecordSource`](crate::source::RecordSource) to one consumer
//! through the filter, ordering and batching stages.

mod errors;
mod session;
mod stats;

pub use errors::{is_peer_gone, ReplayError, ReplayResult};
pub use session::{ReplaySession, SessionOutcome, SessionReport};
pub use stats::PassStats;
