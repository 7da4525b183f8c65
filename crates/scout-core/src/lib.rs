pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod locator;
pub mod outcome;
pub mod pacing;
pub mod postprocess;
pub mod profile;
pub mod schema;
pub mod scope;
pub mod traits;
pub mod walker;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{BrowserOptions, CrawlConfig};
pub use crawl::{
    CrawlEvent, CrawlReporter, CrawlResult, CrawlStats, Crawler, PageResult, TracingCrawlReporter,
};
pub use error::AppError;
pub use extract::{FieldSpec, Record, ValueSource, assemble, extract_field, extract_list};
pub use locator::{Locator, LocatorChain};
pub use outcome::{Absence, ExtractionOutcome};
pub use profile::{ProfileRecord, extract_profile, extract_profile_html};
pub use schema::SiteSchema;
pub use traits::{RenderSession, RenderedPage, WaitSpec, has_marker};
pub use walker::PageWalker;
