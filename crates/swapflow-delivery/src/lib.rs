//! Swapflow Delivery: the worker side of the outbox.
//!
//! Each worker is an independent timer loop that claims a batch from the
//! outbox store and forwards it to the sink inside the claim transaction.
//! Workers share nothing; the store's skip-locked claim keeps them apart.

pub mod backlog;
pub mod forwarder;
pub mod pool;
pub mod worker;

pub use backlog::{BacklogStatus, check_backlog, run_backlog_monitor};
pub use forwarder::SinkForwarder;
pub use pool::WorkerPool;
pub use worker::{TickOutcome, WorkerSettings, run_tick, run_worker};
