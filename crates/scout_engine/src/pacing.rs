//! Human-like pacing: randomized think times and character-by-character input.

use std::time::Duration;

use rand::Rng;
use scout_logging::scout_trace;
use serde::Deserialize;

use crate::driver::{BrowserDriver, DriverError, ElementHandle};

/// Inclusive range of milliseconds a pause is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange::fixed(0);

    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub keystroke: DelayRange,
    pub think: DelayRange,
    pub digit: DelayRange,
    pub after_navigate: DelayRange,
    pub after_login: DelayRange,
    pub after_code: DelayRange,
    pub before_search: DelayRange,
    pub after_search: DelayRange,
    pub after_filter: DelayRange,
    pub before_collect: DelayRange,
    pub scroll_wait: DelayRange,
    pub confirm_wait: DelayRange,
    pub after_overlay: DelayRange,
    pub inter_term: DelayRange,
    pub scroll_min_px: i64,
    pub scroll_max_px: i64,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            keystroke: DelayRange::new(100, 300),
            think: DelayRange::new(1_000, 2_000),
            digit: DelayRange::fixed(200),
            after_navigate: DelayRange::fixed(5_000),
            after_login: DelayRange::fixed(8_000),
            after_code: DelayRange::fixed(3_000),
            before_search: DelayRange::fixed(3_000),
            after_search: DelayRange::fixed(5_000),
            after_filter: DelayRange::fixed(2_000),
            before_collect: DelayRange::new(2_000, 4_000),
            scroll_wait: DelayRange::new(3_000, 5_000),
            confirm_wait: DelayRange::fixed(3_000),
            after_overlay: DelayRange::fixed(2_000),
            inter_term: DelayRange::new(20_000, 35_000),
            scroll_min_px: 500,
            scroll_max_px: 800,
        }
    }
}

impl PacingSettings {
    /// No waiting at all; scroll distances unchanged.
    pub fn instant() -> Self {
        Self {
            keystroke: DelayRange::ZERO,
            think: DelayRange::ZERO,
            digit: DelayRange::ZERO,
            after_navigate: DelayRange::ZERO,
            after_login: DelayRange::ZERO,
            after_code: DelayRange::ZERO,
            before_search: DelayRange::ZERO,
            after_search: DelayRange::ZERO,
            after_filter: DelayRange::ZERO,
            before_collect: DelayRange::ZERO,
            scroll_wait: DelayRange::ZERO,
            confirm_wait: DelayRange::ZERO,
            after_overlay: DelayRange::ZERO,
            inter_term: DelayRange::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pacer {
    settings: PacingSettings,
}

impl Pacer {
    pub fn new(settings: PacingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PacingSettings {
        &self.settings
    }

    pub async fn pause(&self, range: DelayRange) {
        let delay = range.sample();
        if delay.is_zero() {
            return;
        }
        scout_trace!("Pausing {} ms", delay.as_millis());
        tokio::time::sleep(delay).await;
    }

    pub async fn think(&self) {
        self.pause(self.settings.think).await;
    }

    pub fn scroll_amount(&self) -> i64 {
        let (min, max) = (self.settings.scroll_min_px, self.settings.scroll_max_px);
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    /// Clears `element`, then sends `text` one character at a time with a
    /// keystroke pause after each.
    pub async fn type_text(
        &self,
        driver: &dyn BrowserDriver,
        element: &ElementHandle,
        text: &str,
    ) -> Result<(), DriverError> {
        driver.clear(element).await?;
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            driver.send_keys(element, ch.encode_utf8(&mut buf)).await?;
            self.pause(self.settings.keystroke).await;
        }
        Ok(())
    }
}
