/// Smoke-test for `ChromeSession`.
///
/// Launches a headless Chromium, renders <https://example.com> twice through
/// the same tab, and verifies the rendered HTML contains the expected `<h1>`.
///
/// Run with:
///   cargo run --example browser_smoke --features browser
use std::time::Duration;

use scout_client::ChromeSession;
use scout_core::config::BrowserOptions;
use scout_core::traits::{RenderSession, WaitSpec};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let options = BrowserOptions {
        headless: true,
        ..BrowserOptions::default()
    };
    println!("Launching headless browser…");
    let mut session = ChromeSession::launch(&options).await?;

    let wait = WaitSpec::new("h1", Duration::from_secs(15));
    for attempt in 1..=2 {
        let page = session.render("https://example.com", &wait).await?;
        assert!(
            page.html.contains("Example Domain"),
            "Expected heading not found in rendered HTML"
        );
        println!("render {attempt}: {} bytes from {}", page.html.len(), page.url);
    }

    let missing = WaitSpec::new("#never-there", Duration::from_secs(2));
    let err = session
        .render("https://example.com", &missing)
        .await
        .expect_err("marker should time out");
    println!("missing marker → {err}");

    session.close().await;
    Ok(())
}
