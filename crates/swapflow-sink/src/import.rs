//! CSV bulk-import line format.

use std::fmt::Write as _;

use swapflow_core::swap::{Swap, round_amount};

/// Column roles for the CSV import endpoint: millisecond time, the token
/// label, then the native and USD amounts as two metrics.
pub const CSV_FORMAT: &str = "1:time:unix_ms,2:label:token,3:metric:amount,4:metric:amount_usd";

/// Metric name of the native amount column.
pub const AMOUNT_METRIC: &str = "amount";

/// Metric name of the USD amount column.
pub const AMOUNT_USD_METRIC: &str = "amount_usd";

/// Encodes a batch as newline-terminated CSV lines, preserving batch order.
#[must_use]
pub fn encode_batch(swaps: &[Swap]) -> String {
    let mut body = String::with_capacity(swaps.len() * 48);
    for swap in swaps {
        let _ = writeln!(
            body,
            "{},{},{},{}",
            swap.id().timestamp_millis(),
            swap.token(),
            round_amount(swap.amount()).normalize(),
            round_amount(swap.usd()).normalize(),
        );
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapflow_core::token::Token;
    use swapflow_test_support::make_swap;

    #[test]
    fn test_encode_batch_writes_one_line_per_swap_in_order() {
        // Arrange
        let swaps = vec![
            make_swap(Token::Btc, "0.500000", "12.25"),
            make_swap(Token::Eth, "1", "0.000001"),
            make_swap(Token::Btc, "2.1234567", "0"),
        ];

        // Act
        let body = encode_batch(&swaps);

        // Assert
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            format!("{},BTC,0.5,12.25", swaps[0].id().timestamp_millis())
        );
        assert_eq!(
            lines[1],
            format!("{},ETH,1,0.000001", swaps[1].id().timestamp_millis())
        );
        assert_eq!(
            lines[2],
            format!("{},BTC,2.123457,0", swaps[2].id().timestamp_millis())
        );
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_encode_empty_batch_is_empty() {
        assert!(encode_batch(&[]).is_empty());
    }
}
