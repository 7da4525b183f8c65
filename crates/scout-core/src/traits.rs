use std::future::Future;
use std::time::Duration;

use scraper::Html;

use crate::error::AppError;
use crate::locator::compile;

/// What a render must wait for before it may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    /// CSS selector of the element that marks the document as loaded.
    pub marker: String,
    /// Upper bound on navigation plus marker wait.
    pub timeout: Duration,
}

impl WaitSpec {
    pub fn new(marker: impl Into<String>, timeout: Duration) -> Self {
        Self {
            marker: marker.into(),
            timeout,
        }
    }

    /// The error a session returns when the marker never shows up.
    pub fn timed_out(&self) -> AppError {
        AppError::MarkerTimeout {
            marker: self.marker.clone(),
            secs: self.timeout.as_secs(),
        }
    }
}

/// Serialized DOM of a rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// URL after any redirects.
    pub url: String,
    pub html: String,
}

/// A single browsing session: renders one URL at a time.
///
/// `render` takes `&mut self`: whoever navigates holds the session
/// exclusively, so two navigations can never interleave.
// TODO: Expose a cancellation hook so long crawls can be stopped between targets
pub trait RenderSession: Send {
    /// Navigate to `url` and return the document once `wait.marker` is present.
    ///
    /// Returns [`AppError::MarkerTimeout`] if the marker does not appear
    /// within `wait.timeout`.
    fn render(
        &mut self,
        url: &str,
        wait: &WaitSpec,
    ) -> impl Future<Output = Result<RenderedPage, AppError>> + Send;
}

/// Whether `html` contains an element matching the CSS selector `marker`.
pub fn has_marker(html: &str, marker: &str) -> Result<bool, AppError> {
    let selector = compile(marker)?;
    let document = Html::parse_document(html);
    Ok(document.select(&selector).next().is_some())
}
