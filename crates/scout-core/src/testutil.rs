//! Test utilities: a scripted render session, a recording reporter and
//! HTML fixtures.
//!
//! Mocks use `Arc<Mutex<_>>` for interior mutability so a clone kept by the
//! test can assert on what the code under test did.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::crawl::{CrawlEvent, CrawlReporter, CrawlStats};
use crate::error::AppError;
use crate::locator::{Locator, LocatorChain};
use crate::schema::{SearchSpec, SiteSchema};
use crate::traits::{RenderSession, RenderedPage, WaitSpec, has_marker};

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

/// Render session that serves canned HTML per URL.
///
/// Unknown URLs fail with HTTP 404. Registered errors are returned once;
/// later visits to the same URL fall through to 404.
#[derive(Clone, Default)]
pub struct MockSession {
    pages: Arc<Mutex<HashMap<String, Result<String, AppError>>>>,
    waits: Arc<Mutex<Vec<(String, WaitSpec)>>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(html.to_string()));
        self
    }

    pub fn with_error(self, url: &str, error: AppError) -> Self {
        self.pages.lock().unwrap().insert(url.to_string(), Err(error));
        self
    }

    /// Every render call as (url, wait), in call order.
    pub fn waits(&self) -> Vec<(String, WaitSpec)> {
        self.waits.lock().unwrap().clone()
    }

    /// Every URL rendered, in call order.
    pub fn visits(&self) -> Vec<String> {
        self.waits().into_iter().map(|(url, _)| url).collect()
    }
}

impl RenderSession for MockSession {
    async fn render(&mut self, url: &str, wait: &WaitSpec) -> Result<RenderedPage, AppError> {
        self.waits
            .lock()
            .unwrap()
            .push((url.to_string(), wait.clone()));

        let html = {
            let mut pages = self.pages.lock().unwrap();
            match pages.remove(url) {
                Some(Ok(html)) => {
                    pages.insert(url.to_string(), Ok(html.clone()));
                    html
                }
                Some(Err(e)) => return Err(e),
                None => return Err(AppError::HttpError(format!("HTTP 404 for {url}"))),
            }
        };

        if !has_marker(&html, &wait.marker)? {
            return Err(wait.timed_out());
        }
        Ok(RenderedPage {
            url: url.to_string(),
            html,
        })
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Crawl reporter that records event labels and the final stats.
#[derive(Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<String>>>,
    stats: Arc<Mutex<Option<CrawlStats>>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == label).count()
    }

    pub fn finished_stats(&self) -> Option<CrawlStats> {
        self.stats.lock().unwrap().clone()
    }
}

impl CrawlReporter for RecordingReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        let label = match &event {
            CrawlEvent::Started { .. } => "started",
            CrawlEvent::PageStarted { .. } => "page_started",
            CrawlEvent::TargetsListed { .. } => "targets_listed",
            CrawlEvent::PageFailed { .. } => "page_failed",
            CrawlEvent::TargetFailed { .. } => "target_failed",
            CrawlEvent::TargetExtracted { .. } => "target_extracted",
            CrawlEvent::PageCompleted { .. } => "page_completed",
            CrawlEvent::Finished { stats } => {
                *self.stats.lock().unwrap() = Some((*stats).clone());
                "finished"
            }
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Built-in profile schema behind a search spec for `talent.example.com`.
pub fn test_schema() -> SiteSchema {
    let builtin = SiteSchema::builtin().expect("builtin schema is valid");
    SiteSchema {
        search: SearchSpec {
            url_template: "https://talent.example.com/search?q={keyword}&page={page}".into(),
            results_marker: ".profiles-list".into(),
            target_links: LocatorChain::new(vec![
                Locator::attribute("data-test", "profile-link").unwrap(),
                Locator::path(".profiles-list a[href]").unwrap(),
            ]),
            target_path: "/freelancers/".into(),
            base_url: "https://talent.example.com".into(),
        },
        profile: builtin.profile,
    }
}

/// Search results page linking to each of `hrefs`.
pub fn search_page_html(hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">Profile</a></li>"#))
        .collect();
    format!(
        r#"<html><body><header><a href="/login">Log in</a></header><div class="profiles-list"><ul>{links}</ul></div></body></html>"#
    )
}

/// Minimal profile that satisfies the ready marker and has a name.
pub fn profile_html(name: &str) -> String {
    format!(
        r#"<html><body><div data-test="freelancer-profile"><h2 itemprop="name">{name}</h2></div></body></html>"#
    )
}

/// A fully populated profile using the primary attribute locators.
pub const PROFILE_HTML: &str = r#"
<html>
<body>
<div data-test="freelancer-profile">
  <header>
    <h2 itemprop="name">Jane Doe</h2>
    <h3 data-test="freelancer-title">Senior Rust Engineer</h3>
    <span itemprop="locality">Lisbon, Portugal</span>
  </header>
  <div class="profile-stats">
    <span data-test="hourly-rate">$85.00/hr</span>
    <span data-test="job-success-score">98% Job Success</span>
    <div data-test="total-jobs">42</div>
    <div data-test="total-hours">1,230</div>
  </div>
  <p data-test="freelancer-bio">I build fast, reliable backends in Rust.</p>

  <section data-test="availability">
    <span class="hours">More than 30 hrs/week</span>
    <span class="response-time">&lt; 24 hrs response time</span>
    <span>Open to contract to hire</span>
  </section>

  <section data-test="offer-details">
    <h3>Rust REST API in a week</h3>
    <span data-test="offer-price">$500</span>
    <span>7 day delivery</span>
  </section>

  <section data-test="consultation">
    <p>$30 per 30 min Zoom meeting</p>
  </section>

  <section data-test="work-history">
    <div data-test="job-tile">
      <h4>Build a crawler</h4>
      <span class="job-dates">Jan 2023 - Mar 2023</span>
      <span class="rating">5.0</span>
      <p class="feedback">Excellent work, delivered early.</p>
      <span>$1,200 earned</span>
    </div>
    <div data-test="job-tile">
      <h4>Fix async deadlock</h4>
      <span class="job-dates">Apr 2023 - Present</span>
    </div>
  </section>

  <ul class="skills-list">
    <li data-test="skill">Rust</li>
    <li data-test="skill">Tokio</li>
    <li data-test="skill">Web Scraping</li>
  </ul>

  <section data-test="project-catalog">
    <div data-test="project-tile">
      <h4>Production-ready Rust API</h4>
      <span class="price">$250</span>
      <a href="/services/product/rust-api">View project</a>
    </div>
  </section>

  <section data-test="testimonials">
    <div data-test="testimonial">
      <blockquote>Jane untangled our scraping pipeline in days.</blockquote>
      <span class="author-name">John Smith</span>
      <span class="author-company">Acme Data</span>
    </div>
  </section>
</div>
</body>
</html>
"#;
