//! Crawl orchestration: search pages → profile URLs → profile records.
//!
//! ```text
//! Idle --run--> PerPage { list targets --> PerTarget { render, extract, pause } --> callback } --pause--> ... --> Idle
//! ```
//!
//! Pages are visited in ascending order and targets in first-seen document
//! order, one render at a time through the single owned session. Target and
//! page failures are reported and skipped; only a crawl that produced no
//! records at all is surfaced to the caller, as [`CrawlResult::NothingFound`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::CrawlConfig;
use crate::error::AppError;
use crate::profile::{ProfileRecord, extract_profile_html};
use crate::schema::SiteSchema;
use crate::traits::{RenderSession, WaitSpec};
use crate::walker::PageWalker;

/// Records produced from one search-results page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult {
    pub page_number: u32,
    pub records: Vec<ProfileRecord>,
}

/// Terminal result of a crawl.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlResult {
    /// At least one record, in page order then target order.
    Records(Vec<ProfileRecord>),
    /// The crawl ran but produced nothing; usually a markup change upstream.
    NothingFound,
}

impl CrawlResult {
    pub fn is_nothing_found(&self) -> bool {
        matches!(self, CrawlResult::NothingFound)
    }

    pub fn records(&self) -> &[ProfileRecord] {
        match self {
            CrawlResult::Records(records) => records,
            CrawlResult::NothingFound => &[],
        }
    }

    pub fn into_records(self) -> Vec<ProfileRecord> {
        match self {
            CrawlResult::Records(records) => records,
            CrawlResult::NothingFound => Vec::new(),
        }
    }
}

/// Counters for one crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub crawl_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_attempted: u32,
    pub pages_failed: u32,
    pub targets_attempted: usize,
    pub targets_failed: usize,
    pub records: usize,
}

impl CrawlStats {
    fn new() -> Self {
        Self {
            crawl_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            pages_attempted: 0,
            pages_failed: 0,
            targets_attempted: 0,
            targets_failed: 0,
            records: 0,
        }
    }
}

/// Events emitted by the crawler for monitoring/logging.
#[derive(Debug, Clone)]
pub enum CrawlEvent<'a> {
    Started {
        crawl_id: Uuid,
        keyword: &'a str,
        num_pages: u32,
    },
    PageStarted {
        page: u32,
        url: &'a str,
    },
    TargetsListed {
        page: u32,
        count: usize,
    },
    PageFailed {
        page: u32,
        error: &'a AppError,
    },
    TargetFailed {
        page: u32,
        url: &'a str,
        error: &'a AppError,
    },
    TargetExtracted {
        page: u32,
        url: &'a str,
        record: &'a ProfileRecord,
    },
    PageCompleted {
        page: u32,
        records: usize,
    },
    Finished {
        stats: &'a CrawlStats,
    },
}

/// Receives crawl events. Scoped to one crawl by being passed into `run`.
pub trait CrawlReporter: Send + Sync {
    fn report(&self, event: CrawlEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCrawlReporter;

impl CrawlReporter for TracingCrawlReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::Started {
                crawl_id,
                keyword,
                num_pages,
            } => {
                tracing::info!(%crawl_id, %keyword, %num_pages, "Crawl started");
            }
            CrawlEvent::PageStarted { page, url } => {
                tracing::info!(%page, %url, "Listing search page");
            }
            CrawlEvent::TargetsListed { page, count } => {
                tracing::info!(%page, %count, "Found profiles");
            }
            CrawlEvent::PageFailed { page, error } => {
                tracing::warn!(%page, %error, timed_out = error.is_timeout(), "Search page failed, skipping");
            }
            CrawlEvent::TargetFailed { page, url, error } => {
                tracing::warn!(%page, %url, %error, timed_out = error.is_timeout(), "Profile failed, skipping");
            }
            CrawlEvent::TargetExtracted { page, url, record } => {
                tracing::info!(%page, %url, name = ?record.name(), "Profile extracted");
                if record.is_blank() {
                    tracing::warn!(%url, "Profile produced no data; selectors may be outdated");
                }
            }
            CrawlEvent::PageCompleted { page, records } => {
                tracing::info!(%page, %records, "Page complete");
            }
            CrawlEvent::Finished { stats } => {
                tracing::info!(
                    crawl_id = %stats.crawl_id,
                    records = %stats.records,
                    pages_failed = %stats.pages_failed,
                    targets_failed = %stats.targets_failed,
                    "Crawl finished"
                );
            }
        }
    }
}

/// Drives a crawl through one exclusively owned render session.
pub struct Crawler<R: RenderSession> {
    session: R,
    schema: SiteSchema,
    config: CrawlConfig,
}

impl<R: RenderSession> Crawler<R> {
    pub fn new(session: R, schema: SiteSchema, config: CrawlConfig) -> Self {
        Self {
            session,
            schema,
            config,
        }
    }

    /// Give the session back, e.g. to shut the browser down.
    pub fn into_session(self) -> R {
        self.session
    }

    /// Crawl `num_pages` search pages for `keyword`.
    pub async fn run<CR: CrawlReporter>(
        &mut self,
        keyword: &str,
        num_pages: u32,
        reporter: &CR,
    ) -> Result<CrawlResult, AppError> {
        self.run_with_callback(keyword, num_pages, reporter, |_| {})
            .await
    }

    /// Like [`run`](Self::run), calling `on_page` once per listed page with
    /// that page's records, before the next page starts.
    ///
    /// Pages whose listing failed get no callback. Errors are returned only
    /// for an invalid invocation; every site failure is recovered.
    pub async fn run_with_callback<CR, F>(
        &mut self,
        keyword: &str,
        num_pages: u32,
        reporter: &CR,
        mut on_page: F,
    ) -> Result<CrawlResult, AppError>
    where
        CR: CrawlReporter,
        F: FnMut(&PageResult),
    {
        if num_pages == 0 {
            return Err(AppError::ConfigError("num_pages must be at least 1".into()));
        }
        self.config.validate()?;

        let pacer = self.config.pacer();
        let mut stats = CrawlStats::new();
        let mut all_records = Vec::new();

        reporter.report(CrawlEvent::Started {
            crawl_id: stats.crawl_id,
            keyword,
            num_pages,
        });

        for page in 1..=num_pages {
            stats.pages_attempted += 1;

            let walker = PageWalker::new(&self.schema.search, self.config.page_load_timeout);
            let page_url = walker.page_url(keyword, page);
            reporter.report(CrawlEvent::PageStarted {
                page,
                url: &page_url,
            });

            match walker.list_targets(&mut self.session, keyword, page).await {
                Ok(targets) => {
                    reporter.report(CrawlEvent::TargetsListed {
                        page,
                        count: targets.len(),
                    });

                    let mut records = Vec::with_capacity(targets.len());
                    for url in &targets {
                        stats.targets_attempted += 1;
                        match self.visit(url).await {
                            Ok(record) => {
                                reporter.report(CrawlEvent::TargetExtracted {
                                    page,
                                    url,
                                    record: &record,
                                });
                                records.push(record);
                            }
                            Err(error) => {
                                stats.targets_failed += 1;
                                reporter.report(CrawlEvent::TargetFailed {
                                    page,
                                    url,
                                    error: &error,
                                });
                            }
                        }
                        pacer.after_target().await;
                    }

                    let result = PageResult {
                        page_number: page,
                        records,
                    };
                    on_page(&result);
                    reporter.report(CrawlEvent::PageCompleted {
                        page,
                        records: result.records.len(),
                    });
                    all_records.extend(result.records);
                }
                Err(error) => {
                    stats.pages_failed += 1;
                    reporter.report(CrawlEvent::PageFailed {
                        page,
                        error: &error,
                    });
                }
            }

            if page < num_pages {
                pacer.after_page().await;
            }
        }

        stats.records = all_records.len();
        stats.finished_at = Some(Utc::now());
        reporter.report(CrawlEvent::Finished { stats: &stats });

        if all_records.is_empty() {
            Ok(CrawlResult::NothingFound)
        } else {
            Ok(CrawlResult::Records(all_records))
        }
    }

    /// Render one profile and run the full assembler tree over it.
    async fn visit(&mut self, url: &str) -> Result<ProfileRecord, AppError> {
        let wait = WaitSpec::new(
            self.schema.profile.ready_marker.clone(),
            self.config.page_load_timeout,
        );
        let rendered = self.session.render(url, &wait).await?;
        Ok(extract_profile_html(&rendered.html, &self.schema.profile, url))
    }
}
