//! Swap builders.

use std::str::FromStr;

use rust_decimal::Decimal;
use swapflow_core::swap::{Swap, SwapData};
use swapflow_core::token::Token;

/// Builds a swap for `token` with the given decimal amounts.
///
/// # Panics
///
/// Panics if an amount is not a valid non-negative decimal.
#[must_use]
pub fn make_swap(token: Token, amount: &str, usd: &str) -> Swap {
    Swap::new(SwapData {
        who: "tester".to_owned(),
        token,
        amount: Decimal::from_str(amount).expect("valid amount"),
        usd: Decimal::from_str(usd).expect("valid usd amount"),
        side: true,
    })
    .expect("non-negative amounts")
}
