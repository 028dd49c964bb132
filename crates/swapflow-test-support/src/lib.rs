//! Shared test fakes and utilities for the Swapflow workspace.

mod clock;
mod outbox;
mod processor;
mod sink;
mod swaps;
mod window;

pub use clock::FixedClock;
pub use outbox::{FailingOutboxStore, InMemoryOutboxStore};
pub use processor::{FailingProcessor, RecordingProcessor};
pub use sink::{FailingSink, RecordingSink};
pub use swaps::make_swap;
pub use window::StubWindowSource;
