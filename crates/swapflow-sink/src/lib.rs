//! Swapflow Sink: VictoriaMetrics client.
//!
//! Delivered swaps are written through the CSV import endpoint, one line per
//! swap, and read back as `sum_over_time` / `count_over_time` range queries.

pub mod import;
pub mod query;
pub mod vm_client;

pub use vm_client::VmClient;
