//! Sleep-based pacing between profile visits and search pages.
//!
//! Pauses are not retries, and they are taken on the error path too.

use std::time::Duration;

/// Delays applied by the crawl loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacer {
    /// Pause after every profile visit.
    pub profile_delay: Duration,

    /// Pause between two search pages.
    pub page_delay: Duration,

    /// Maximum random jitter added on top of each delay (uniform [0, jitter]).
    ///
    /// Set to `Duration::ZERO` to disable.
    pub jitter: Duration,
}

impl Pacer {
    pub fn new(profile_delay: Duration, page_delay: Duration) -> Self {
        Self {
            profile_delay,
            page_delay,
            jitter: Duration::ZERO,
        }
    }

    /// No pauses at all.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub async fn after_target(&self) {
        self.pause(self.profile_delay).await;
    }

    pub async fn after_page(&self) {
        self.pause(self.page_delay).await;
    }

    async fn pause(&self, base: Duration) {
        let delay = self.effective_delay(base);
        if delay.is_zero() {
            return;
        }
        tracing::debug!(sleep_ms = %delay.as_millis(), "Pacing");
        tokio::time::sleep(delay).await;
    }

    /// `base` plus random jitter.
    fn effective_delay(&self, base: Duration) -> Duration {
        if self.jitter.is_zero() {
            return base;
        }
        let jitter_ms = rand_jitter_ms(self.jitter.as_millis() as u64);
        base + Duration::from_millis(jitter_ms)
    }
}

impl Default for Pacer {
    /// 2 seconds between profiles, 5 seconds between pages.
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(5))
    }
}

// xorshift64 seeded from the clock; good enough for jitter, not for anything else.
fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
