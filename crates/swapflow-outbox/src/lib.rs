//! Swapflow Outbox: PostgreSQL implementation of the `OutboxStore` trait.
//!
//! Swaps and their outbox rows are written in one transaction. Delivery
//! workers claim rows with `FOR UPDATE SKIP LOCKED`, so any number of them can
//! poll the same backlog without waiting on each other.

pub mod pg_outbox_store;
pub mod queries;
