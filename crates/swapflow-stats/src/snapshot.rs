//! Snapshot types sent to subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use swapflow_core::token::Token;
use swapflow_core::window::WindowStat;

/// Timestamp layout of a snapshot, e.g. `Mar  1 09:04:05.123`.
pub const TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S%.3f";

/// Stats of one token across every lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenStats {
    pub token: Token,
    pub w1m: WindowStat,
    pub w5m: WindowStat,
    pub w1h: WindowStat,
    pub w24h: WindowStat,
}

/// One published snapshot. Tokens whose queries failed are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub timestamp: String,
    pub by_token: Vec<TokenStats>,
}

impl StatsSnapshot {
    /// Builds a snapshot stamped with `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>, by_token: Vec<TokenStats>) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            by_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_timestamp_pads_day_and_keeps_milliseconds() {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 4, 5)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(123))
            .unwrap();

        let snapshot = StatsSnapshot::new(at, Vec::new());

        assert_eq!(snapshot.timestamp, "Mar  1 09:04:05.123");
    }

    #[test]
    fn test_snapshot_json_shape() {
        // Arrange
        let stat = WindowStat {
            volume: "1.5".into(),
            volume_usd: "30".into(),
            tx_count: "2".into(),
        };
        let snapshot = StatsSnapshot {
            timestamp: "Jan  1 00:00:00.000".into(),
            by_token: vec![TokenStats {
                token: Token::Kol,
                w1m: stat.clone(),
                w5m: stat,
                w1h: WindowStat::default(),
                w24h: WindowStat::default(),
            }],
        };

        // Act
        let value = serde_json::to_value(&snapshot).unwrap();

        // Assert
        let empty = json!({"volume": "", "volume_usd": "", "tx_count": ""});
        assert_eq!(
            value,
            json!({
                "timestamp": "Jan  1 00:00:00.000",
                "by_token": [{
                    "token": "KOL",
                    "w1m": {"volume": "1.5", "volume_usd": "30", "tx_count": "2"},
                    "w5m": {"volume": "1.5", "volume_usd": "30", "tx_count": "2"},
                    "w1h": empty,
                    "w24h": empty,
                }]
            })
        );
    }
}
