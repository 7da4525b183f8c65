use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::pacing::Pacer;

/// Startup options passed through to a browser-backed render session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Explicit browser binary. When unset the session searches well-known locations.
    pub chrome_path: Option<PathBuf>,
    /// Window width and height in pixels.
    pub window: (u32, u32),
    pub user_agent: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            window: (1920, 1080),
            user_agent: None,
        }
    }
}

/// Scalar settings for one crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Budget for each render, search page and profile alike.
    pub page_load_timeout: Duration,
    /// Pause after every profile visit.
    pub profile_delay: Duration,
    /// Pause between search pages.
    pub page_delay: Duration,
    /// Random extra pause (uniform [0, jitter]) added to each delay.
    pub jitter: Duration,
    pub browser: BrowserOptions,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_load_timeout: Duration::from_secs(10),
            profile_delay: Duration::from_secs(2),
            page_delay: Duration::from_secs(5),
            jitter: Duration::ZERO,
            browser: BrowserOptions::default(),
        }
    }
}

impl CrawlConfig {
    /// Config with no pacing delays, for tests and offline runs.
    pub fn unpaced() -> Self {
        Self {
            profile_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    pub fn with_delays(mut self, profile_delay: Duration, page_delay: Duration) -> Self {
        self.profile_delay = profile_delay;
        self.page_delay = page_delay;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.page_load_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "page_load_timeout must be greater than zero".into(),
            ));
        }
        let (width, height) = self.browser.window;
        if width == 0 || height == 0 {
            return Err(AppError::ConfigError(format!(
                "Invalid window size {width}x{height}"
            )));
        }
        Ok(())
    }

    pub fn pacer(&self) -> Pacer {
        Pacer::new(self.profile_delay, self.page_delay).with_jitter(self.jitter)
    }
}
