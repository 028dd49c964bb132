//! Swapflow Core: shared domain types and seams.
//!
//! This crate defines the swap event, the error taxonomy and the traits the
//! outbox store, the sink client and the stats layer meet at. It contains no
//! infrastructure code.

pub mod clock;
pub mod error;
pub mod outbox;
pub mod sink;
pub mod swap;
pub mod token;
pub mod window;
