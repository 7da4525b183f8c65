use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use scout_core::config::BrowserOptions;
use scout_core::error::AppError;
use scout_core::traits::{RenderSession, RenderedPage, WaitSpec};
use tokio::task::JoinHandle;

/// How often the marker is checked while waiting for it.
const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Render session driving one Chromium tab over the DevTools Protocol.
///
/// The tab is opened once and reused for every navigation, so the site sees
/// a single browsing context for the whole crawl. Call [`close`](Self::close)
/// when done; dropping the session kills the browser without a clean exit.
///
/// # Example
///
/// ```rust,no_run
/// use scout_client::ChromeSession;
/// use scout_core::config::BrowserOptions;
/// use scout_core::traits::{RenderSession, WaitSpec};
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = ChromeSession::launch(&BrowserOptions::default()).await?;
/// let wait = WaitSpec::new("h1", Duration::from_secs(10));
/// let page = session.render("https://example.com", &wait).await?;
/// println!("{} bytes", page.html.len());
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Start a browser per `options` and open the tab all renders go through.
    pub async fn launch(options: &BrowserOptions) -> Result<Self, AppError> {
        let (width, height) = options.window;
        let mut builder = BrowserConfig::builder()
            .with_head()
            .no_sandbox()
            .disable_default_args()
            .window_size(width, height);

        if let Some(bin) = locate_chrome(options.chrome_path.as_deref()) {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }
        if options.headless {
            builder = builder.arg("--headless=new").arg("--disable-gpu");
        }
        if let Some(user_agent) = &options.user_agent {
            builder = builder.arg(format!("--user-agent={user_agent}"));
        }

        let config = builder
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::RenderError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to open tab: {e}")))?;

        tracing::info!(headless = options.headless, width, height, "Browser session started");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Shut the browser down and wait for the handler task to finish.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser did not close cleanly: {e}");
        }
        let _ = self.browser.wait().await;
        let _ = self.handler.await;
    }

    /// Poll until `marker` matches. A failed CDP call ends the wait.
    async fn wait_for_marker(&self, marker: &str) -> Result<(), AppError> {
        let script = marker_script(marker)?;
        loop {
            let present = self
                .page
                .evaluate(script.clone())
                .await
                .map_err(|e| AppError::RenderError(format!("Failed to check marker '{marker}': {e}")))?
                .into_value::<bool>()
                .unwrap_or(false);
            if present {
                return Ok(());
            }
            tokio::time::sleep(MARKER_POLL_INTERVAL).await;
        }
    }
}

impl RenderSession for ChromeSession {
    async fn render(&mut self, url: &str, wait: &WaitSpec) -> Result<RenderedPage, AppError> {
        let started = Instant::now();

        match tokio::time::timeout(wait.timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(AppError::RenderError(format!("Failed to navigate to {url}: {e}")));
            }
            Err(_) => return Err(AppError::Timeout(wait.timeout.as_secs())),
        }

        let remaining = wait.timeout.saturating_sub(started.elapsed());
        match tokio::time::timeout(remaining, self.wait_for_marker(&wait.marker)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(wait.timed_out()),
        }

        let html = self
            .page
            .content()
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to read page content: {e}")))?;
        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(RenderedPage {
            url: final_url,
            html,
        })
    }
}

/// In-page expression that is true once `marker` matches an element.
fn marker_script(marker: &str) -> Result<String, AppError> {
    let quoted = serde_json::to_string(marker)?;
    Ok(format!("document.querySelector({quoted}) !== null"))
}

/// Pick the Chrome/Chromium binary to launch.
///
/// An explicit path always wins, then `$CHROME_BIN` if it exists. Otherwise
/// the real binary inside a snap is preferred over the `/snap/bin` wrapper,
/// which strips unknown CLI flags and breaks headless mode. `None` lets
/// chromiumoxide do its own lookup.
pub(crate) fn locate_chrome(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates: &[&str] = &[
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}
