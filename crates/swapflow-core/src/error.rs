//! Error taxonomy for the outbox pipeline.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::swap::SwapId;

/// Invalid swap input, rejected before anything is persisted.
#[derive(Debug, Error)]
pub enum SwapError {
    /// The token symbol is not one of the supported categories.
    #[error("unknown token: {0}")]
    UnknownToken(String),

    /// The identifier is not a valid canonical swap id.
    #[error("invalid swap id: {0}")]
    InvalidId(String),

    /// An amount was below zero.
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    /// An amount field is not a decimal number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Failure talking to the time-series sink, on push or on query.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink could not be reached, or the call was cut off by a timeout.
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// The sink answered but refused the request.
    #[error("sink rejected request (status {status}): {message}")]
    Rejected {
        /// HTTP status returned by the sink.
        status: u16,
        /// Error text from the response.
        message: String,
    },

    /// The response did not match the expected query schema.
    #[error("malformed sink response: {0}")]
    MalformedResponse(String),
}

impl SinkError {
    /// Prefixes the error message with the operation that produced it.
    #[must_use]
    pub fn context(self, operation: &str) -> Self {
        match self {
            Self::Unavailable(msg) => Self::Unavailable(format!("{operation}: {msg}")),
            Self::Rejected { status, message } => Self::Rejected {
                status,
                message: format!("{operation}: {message}"),
            },
            Self::MalformedResponse(msg) => {
                Self::MalformedResponse(format!("{operation}: {msg}"))
            }
        }
    }
}

/// Failure of an outbox store operation.
///
/// Lock contention between workers is not represented here: rows held by
/// another transaction are skipped, which is the normal outcome of a claim.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// Connection, query or transaction failure in the relational store.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A swap with this identifier has already been appended.
    #[error("duplicate swap id: {0}")]
    DuplicateKey(SwapId),

    /// A stored row could not be turned back into a swap.
    #[error("malformed outbox record: {0}")]
    MalformedRecord(String),

    /// The batch processor failed; the claim was rolled back.
    #[error("process: {0}")]
    Process(#[from] SinkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefixes_every_variant() {
        let unavailable = SinkError::Unavailable("connection refused".into()).context("volume");
        assert_eq!(unavailable.to_string(), "sink unavailable: volume: connection refused");

        let rejected = SinkError::Rejected {
            status: 422,
            message: "bad query".into(),
        }
        .context("tx count");
        match rejected {
            SinkError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "tx count: bad query");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }

        let malformed = SinkError::MalformedResponse("schema mismatch".into()).context("usd");
        assert_eq!(malformed.to_string(), "malformed sink response: usd: schema mismatch");
    }

    #[test]
    fn test_sink_error_converts_into_process_error() {
        let err: OutboxError = SinkError::Unavailable("timeout".into()).into();
        assert!(matches!(err, OutboxError::Process(SinkError::Unavailable(_))));
        assert_eq!(err.to_string(), "process: sink unavailable: timeout");
    }
}
