//! The swap domain event.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SwapError;
use crate::token::Token;

/// Fractional digits kept for every amount crossing a persistence or wire
/// boundary.
pub const AMOUNT_SCALE: u32 = 6;

/// Integer digits an amount may have; the stored columns are
/// `NUMERIC(30, 6)`.
pub const AMOUNT_INTEGER_DIGITS: u32 = 24;

/// Smallest amount that no longer fits [`AMOUNT_INTEGER_DIGITS`].
fn amount_limit() -> Decimal {
    Decimal::from_i128_with_scale(10_i128.pow(AMOUNT_INTEGER_DIGITS), 0)
}

/// Rounds `value` to [`AMOUNT_SCALE`] fractional digits, midpoints away from
/// zero.
#[must_use]
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Globally unique, time-sortable swap identifier.
///
/// Backed by a UUIDv7: the leading 48 bits hold the creation time in unix
/// milliseconds and the rest is random, so the canonical hyphenated form sorts
/// lexicographically by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapId(Uuid);

impl SwapId {
    /// Generates a fresh identifier stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an identifier read back from storage.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Creation time in unix milliseconds, decoded from the id prefix.
    #[must_use]
    pub fn timestamp_millis(&self) -> u64 {
        let b = self.0.as_bytes();
        u64::from_be_bytes([0, 0, b[0], b[1], b[2], b[3], b[4], b[5]])
    }
}

impl fmt::Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for SwapId {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| SwapError::InvalidId(format!("{s}: {e}")))
    }
}

/// The payload of a swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapData {
    /// Who made the swap.
    pub who: String,
    /// Token category.
    pub token: Token,
    /// Native token amount.
    pub amount: Decimal,
    /// Amount in USD.
    pub usd: Decimal,
    /// Buy (`true`) or sell (`false`).
    pub side: bool,
}

/// An immutable swap event.
///
/// Only its delivery state changes, and that lives in the outbox, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swap {
    id: SwapId,
    data: SwapData,
}

impl Swap {
    /// Creates a new swap with a freshly generated id. Amounts are rounded to
    /// [`AMOUNT_SCALE`] digits.
    ///
    /// # Errors
    ///
    /// Returns `SwapError::NegativeAmount` if either amount is below zero and
    /// `SwapError::InvalidAmount` if either has more than
    /// [`AMOUNT_INTEGER_DIGITS`] integer digits once rounded.
    pub fn new(data: SwapData) -> Result<Self, SwapError> {
        for amount in [data.amount, data.usd] {
            if amount < Decimal::ZERO {
                return Err(SwapError::NegativeAmount(amount));
            }
            if round_amount(amount) >= amount_limit() {
                return Err(SwapError::InvalidAmount(format!(
                    "{amount} exceeds {AMOUNT_INTEGER_DIGITS} integer digits"
                )));
            }
        }
        Ok(Self::reconstruct(SwapId::generate(), data))
    }

    /// Rebuilds a swap read back from storage.
    #[must_use]
    pub fn reconstruct(id: SwapId, data: SwapData) -> Self {
        let data = SwapData {
            amount: round_amount(data.amount),
            usd: round_amount(data.usd),
            ..data
        };
        Self { id, data }
    }

    /// The swap identifier.
    #[must_use]
    pub fn id(&self) -> SwapId {
        self.id
    }

    /// Who made the swap.
    #[must_use]
    pub fn who(&self) -> &str {
        &self.data.who
    }

    /// Token category.
    #[must_use]
    pub fn token(&self) -> Token {
        self.data.token
    }

    /// Native amount, at most [`AMOUNT_SCALE`] fractional digits.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.data.amount
    }

    /// USD amount, at most [`AMOUNT_SCALE`] fractional digits.
    #[must_use]
    pub fn usd(&self) -> Decimal {
        self.data.usd
    }

    /// Buy (`true`) or sell (`false`).
    #[must_use]
    pub fn side(&self) -> bool {
        self.data.side
    }
}
