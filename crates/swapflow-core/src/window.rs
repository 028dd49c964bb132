//! Lookback windows and the stats derived over them.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Trailing interval a window stat is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookbackWindow {
    /// Last minute.
    OneMinute,
    /// Last five minutes.
    FiveMinutes,
    /// Last hour.
    OneHour,
    /// Last 24 hours.
    OneDay,
}

impl LookbackWindow {
    /// Every window a token's stats are computed for.
    pub const ALL: [LookbackWindow; 4] = [
        LookbackWindow::OneMinute,
        LookbackWindow::FiveMinutes,
        LookbackWindow::OneHour,
        LookbackWindow::OneDay,
    ];

    /// Duration literal used inside range selectors, e.g. `[5m]`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            LookbackWindow::OneMinute => "1m",
            LookbackWindow::FiveMinutes => "5m",
            LookbackWindow::OneHour => "1h",
            LookbackWindow::OneDay => "24h",
        }
    }

    /// Length of the window.
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            LookbackWindow::OneMinute => Duration::from_secs(60),
            LookbackWindow::FiveMinutes => Duration::from_secs(5 * 60),
            LookbackWindow::OneHour => Duration::from_secs(60 * 60),
            LookbackWindow::OneDay => Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregates for one token over one window.
///
/// Values are kept as the decimal strings the sink returned (normalized to
/// six fractional digits); an empty string means the sink had no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowStat {
    /// Summed native amount.
    pub volume: String,
    /// Summed USD amount.
    pub volume_usd: String,
    /// Number of swaps.
    pub tx_count: String,
}

impl WindowStat {
    /// Returns `true` when the sink had no data for any of the three values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volume.is_empty() && self.volume_usd.is_empty() && self.tx_count.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_durations() {
        let labels: Vec<&str> = LookbackWindow::ALL.iter().map(|w| w.label()).collect();
        assert_eq!(labels, ["1m", "5m", "1h", "24h"]);
        assert_eq!(LookbackWindow::OneDay.duration(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_default_window_stat_is_empty_and_serializes_as_strings() {
        let stat = WindowStat::default();

        assert!(stat.is_empty());
        assert_eq!(
            serde_json::to_value(&stat).unwrap(),
            serde_json::json!({"volume": "", "volume_usd": "", "tx_count": ""})
        );
    }
}
