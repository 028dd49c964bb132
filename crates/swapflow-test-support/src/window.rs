//! Test window source: canned `WindowSource` answers for stats tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use swapflow_core::error::SinkError;
use swapflow_core::sink::WindowSource;
use swapflow_core::token::Token;
use swapflow_core::window::{LookbackWindow, WindowStat};

/// A window source answering from a fixed table. Unknown pairs return an
/// empty stat; configured (token, window) pairs can be made to fail.
#[derive(Debug, Default)]
pub struct StubWindowSource {
    stats: HashMap<(Token, LookbackWindow), WindowStat>,
    failing: HashSet<(Token, LookbackWindow)>,
    calls: Mutex<Vec<(Token, LookbackWindow)>>,
}

impl StubWindowSource {
    /// Creates a source with no data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `(token, window)` with `stat`.
    #[must_use]
    pub fn with_stat(mut self, token: Token, window: LookbackWindow, stat: WindowStat) -> Self {
        self.stats.insert((token, window), stat);
        self
    }

    /// Makes queries for `(token, window)` fail.
    #[must_use]
    pub fn failing_on(mut self, token: Token, window: LookbackWindow) -> Self {
        self.failing.insert((token, window));
        self
    }

    /// Every query seen so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<(Token, LookbackWindow)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WindowSource for StubWindowSource {
    async fn range_aggregate(
        &self,
        token: Token,
        window: LookbackWindow,
    ) -> Result<WindowStat, SinkError> {
        self.calls.lock().unwrap().push((token, window));
        if self.failing.contains(&(token, window)) {
            return Err(SinkError::Unavailable(format!("{token} {window} query failed")));
        }
        Ok(self.stats.get(&(token, window)).cloned().unwrap_or_default())
    }
}
