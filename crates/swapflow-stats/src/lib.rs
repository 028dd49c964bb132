//! Swapflow Stats: the read side of the pipeline.
//!
//! The aggregator turns range queries against the sink into per-token
//! snapshots; the publisher recomputes a snapshot on its own interval and
//! fans it out to subscribers over bounded channels.

pub mod aggregator;
pub mod publisher;
pub mod snapshot;

pub use aggregator::WindowAggregator;
pub use publisher::{PublisherHandle, StatsPublisher};
pub use snapshot::{StatsSnapshot, TokenStats};
