mod output;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use scout_client::HttpSession;
use scout_core::config::{BrowserOptions, CrawlConfig};
use scout_core::traits::RenderSession;
use scout_core::{
    AppError, CrawlResult, Crawler, PageResult, SiteSchema, TracingCrawlReporter,
    extract_profile_html,
};

use crate::output::{Checkpoints, emit};

#[derive(Parser)]
#[command(name = "scout", version, about = "Talent-site profile crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl search result pages for a keyword and extract every linked profile
    Crawl {
        /// Search keyword
        keyword: String,

        /// Number of search pages to crawl, starting at page 1
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// How documents are rendered
        #[arg(short, long, value_enum, default_value_t = Renderer::Browser)]
        renderer: Renderer,

        /// Site schema JSON (defaults to the built-in schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Write page_<n>.json after every search page
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,

        /// Write the final records here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: CrawlSettings,
    },

    /// Extract a profile record from a saved HTML document
    Extract {
        /// Saved profile HTML
        #[arg(short, long)]
        file: PathBuf,

        /// Source URL recorded on the profile (defaults to the file path)
        #[arg(short, long)]
        url: Option<String>,

        /// Site schema JSON (defaults to the built-in schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },

    /// Print the built-in site schema
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Renderer {
    /// Plain HTTP GET; no JavaScript
    Http,
    /// Chromium over the DevTools Protocol
    Browser,
}

/// Crawl settings resolvable from the environment (and `.env`).
#[derive(clap::Args)]
struct CrawlSettings {
    /// Seconds to wait for a document and its ready marker
    #[arg(long, env = "SCRAPER_PAGE_LOAD_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Seconds to pause after every profile
    #[arg(long, env = "SCRAPER_PROFILE_DELAY", default_value_t = 2.0)]
    profile_delay: f64,

    /// Seconds to pause between search pages
    #[arg(long, env = "SCRAPER_PAGE_DELAY", default_value_t = 5.0)]
    page_delay: f64,

    /// Maximum random seconds added to each pause
    #[arg(long, env = "SCRAPER_JITTER", default_value_t = 0.0)]
    jitter: f64,

    /// Run the browser without a visible window
    #[arg(long, env = "SCRAPER_HEADLESS")]
    headless: bool,

    /// Chrome/Chromium binary to launch
    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// User-Agent sent by either renderer
    #[arg(long, env = "SCRAPER_USER_AGENT")]
    user_agent: Option<String>,
}

impl CrawlSettings {
    fn to_config(&self) -> Result<CrawlConfig> {
        let config = CrawlConfig {
            page_load_timeout: Duration::from_secs(self.timeout),
            profile_delay: seconds("profile delay", self.profile_delay)?,
            page_delay: seconds("page delay", self.page_delay)?,
            jitter: seconds("jitter", self.jitter)?,
            browser: BrowserOptions {
                headless: self.headless,
                chrome_path: self.chrome_path.clone(),
                user_agent: self.user_agent.clone(),
                ..BrowserOptions::default()
            },
        };
        config.validate()?;
        Ok(config)
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("Invalid {name}: {value}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            keyword,
            pages,
            renderer,
            schema,
            checkpoint_dir,
            output,
            settings,
        } => {
            let schema = load_schema(schema.as_deref())?;
            let config = settings.to_config()?;
            let checkpoints = checkpoint_dir
                .as_deref()
                .map(Checkpoints::create)
                .transpose()?;
            cmd_crawl(
                &keyword,
                pages,
                renderer,
                schema,
                config,
                checkpoints.as_ref(),
                output.as_deref(),
            )
            .await?;
        }
        Commands::Extract { file, url, schema } => {
            let schema = load_schema(schema.as_deref())?;
            cmd_extract(&file, url.as_deref(), &schema)?;
        }
        Commands::Schema => {
            println!("{}", SiteSchema::builtin_json());
        }
    }

    Ok(())
}

fn load_schema(path: Option<&Path>) -> Result<SiteSchema> {
    let schema = match path {
        Some(path) => SiteSchema::from_path(path)?,
        None => SiteSchema::builtin().context("Built-in schema is invalid")?,
    };
    Ok(schema)
}

async fn cmd_crawl(
    keyword: &str,
    pages: u32,
    renderer: Renderer,
    schema: SiteSchema,
    config: CrawlConfig,
    checkpoints: Option<&Checkpoints>,
    output: Option<&Path>,
) -> Result<()> {
    tracing::info!(%keyword, %pages, ?renderer, "Starting crawl");

    let result = match renderer {
        Renderer::Http => {
            let session = match &config.browser.user_agent {
                Some(ua) => HttpSession::with_user_agent(ua)?,
                None => HttpSession::new()?,
            };
            let (result, _) = crawl_with(session, schema, config, keyword, pages, checkpoints).await;
            result?
        }
        Renderer::Browser => crawl_in_browser(schema, config, keyword, pages, checkpoints).await?,
    };

    if result.is_nothing_found() {
        anyhow::bail!("No profiles were extracted; the site markup may have changed");
    }
    let records = result.into_records();
    tracing::info!(count = records.len(), "Crawl produced records");
    emit(&records, output)
}

#[cfg(feature = "browser")]
async fn crawl_in_browser(
    schema: SiteSchema,
    config: CrawlConfig,
    keyword: &str,
    pages: u32,
    checkpoints: Option<&Checkpoints>,
) -> Result<CrawlResult> {
    let session = scout_client::ChromeSession::launch(&config.browser)
        .await
        .context("Failed to start browser session")?;
    let (result, session) = crawl_with(session, schema, config, keyword, pages, checkpoints).await;
    session.close().await;
    Ok(result?)
}

#[cfg(not(feature = "browser"))]
async fn crawl_in_browser(
    _schema: SiteSchema,
    _config: CrawlConfig,
    _keyword: &str,
    _pages: u32,
    _checkpoints: Option<&Checkpoints>,
) -> Result<CrawlResult> {
    anyhow::bail!("Browser renderer not compiled in; rebuild with --features browser or use --renderer http")
}

/// Run a crawl and hand the session back so the caller can shut it down.
async fn crawl_with<R: RenderSession>(
    session: R,
    schema: SiteSchema,
    config: CrawlConfig,
    keyword: &str,
    pages: u32,
    checkpoints: Option<&Checkpoints>,
) -> (Result<CrawlResult, AppError>, R) {
    let mut crawler = Crawler::new(session, schema, config);
    let result = crawler
        .run_with_callback(keyword, pages, &TracingCrawlReporter, |page: &PageResult| {
            if let Some(checkpoints) = checkpoints {
                match checkpoints.write(page) {
                    Ok(path) => tracing::info!(path = %path.display(), "Checkpoint written"),
                    Err(e) => tracing::warn!("Failed to write checkpoint: {e:#}"),
                }
            }
        })
        .await;
    (result, crawler.into_session())
}

fn cmd_extract(file: &Path, url: Option<&str>, schema: &SiteSchema) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read HTML file: {}", file.display()))?;
    let source = url.map(str::to_string).unwrap_or_else(|| file.display().to_string());

    let record = extract_profile_html(&html, &schema.profile, &source);
    if record.is_blank() {
        tracing::warn!("No fields matched; the document may not be a profile page");
    }
    emit(&record, None)
}
