//! Swapflow service: HTTP surface, configuration and process wiring shared by
//! the `swapflow-api` and `swapflow-worker` binaries.

pub mod config;
pub mod error;
pub mod routes;
pub mod shutdown;
pub mod state;
pub mod telemetry;
