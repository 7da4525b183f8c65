use std::collections::HashSet;
use std::time::Duration;

use scraper::Html;
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::error::AppError;
use crate::schema::SearchSpec;
use crate::scope::Scope;
use crate::traits::{RenderSession, WaitSpec};

/// Turns one search-results page into the profile URLs it links to.
pub struct PageWalker<'a> {
    spec: &'a SearchSpec,
    timeout: Duration,
}

impl<'a> PageWalker<'a> {
    pub fn new(spec: &'a SearchSpec, timeout: Duration) -> Self {
        Self { spec, timeout }
    }

    /// Concrete URL of a search page; the keyword is form-encoded.
    pub fn page_url(&self, keyword: &str, page: u32) -> String {
        let keyword: String = byte_serialize(keyword.as_bytes()).collect();
        self.spec
            .url_template
            .replace("{keyword}", &keyword)
            .replace("{page}", &page.to_string())
    }

    /// Render a search page and return its deduplicated profile URLs.
    ///
    /// Fails if the page cannot be rendered or its results marker never
    /// appears: without the marker no link on the page can be trusted.
    pub async fn list_targets<R: RenderSession>(
        &self,
        session: &mut R,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<String>, AppError> {
        let url = self.page_url(keyword, page);
        let wait = WaitSpec::new(self.spec.results_marker.clone(), self.timeout);
        let rendered = session.render(&url, &wait).await?;
        self.targets_from_html(&rendered.html)
    }

    /// Profile URLs linked from `html`, in first-seen document order.
    ///
    /// Relative hrefs are resolved against the base URL, fragments dropped,
    /// and only same-host URLs whose path contains the target path are kept.
    pub fn targets_from_html(&self, html: &str) -> Result<Vec<String>, AppError> {
        let base = Url::parse(&self.spec.base_url).map_err(|e| {
            AppError::SchemaError(format!("Invalid base URL '{}': {e}", self.spec.base_url))
        })?;

        let document = Html::parse_document(html);
        let links = match self.spec.target_links.resolve(&document.root_element()) {
            Some((_, links)) => links,
            None => return Ok(Vec::new()),
        };

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for link in links {
            let Some(href) = link.attribute("href") else {
                continue;
            };
            let Ok(mut resolved) = base.join(href.trim()) else {
                tracing::debug!(%href, "Skipping unparsable href");
                continue;
            };
            if resolved.host_str() != base.host_str()
                || !resolved.path().contains(&self.spec.target_path)
            {
                continue;
            }
            resolved.set_fragment(None);
            let target = resolved.to_string();
            if seen.insert(target.clone()) {
                targets.push(target);
            }
        }
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{Locator, LocatorChain};
    use crate::testutil::{MockSession, search_page_html};

    fn spec() -> SearchSpec {
        SearchSpec {
            url_template: "https://talent.example.com/search?q={keyword}&page={page}".into(),
            results_marker: ".profiles-list".into(),
            target_links: LocatorChain::new(vec![
                Locator::attribute("data-test", "profile-link").unwrap(),
                Locator::path(".profiles-list a[href]").unwrap(),
            ]),
            target_path: "/freelancers/".into(),
            base_url: "https://talent.example.com".into(),
        }
    }

    #[test]
    fn builds_page_url_with_encoded_keyword() {
        let spec = spec();
        let walker = PageWalker::new(&spec, Duration::from_secs(1));
        assert_eq!(
            walker.page_url("rust & go", 3),
            "https://talent.example.com/search?q=rust+%26+go&page=3"
        );
    }

    #[test]
    fn duplicate_hrefs_collapse_to_one_target() {
        let spec = spec();
        let walker = PageWalker::new(&spec, Duration::from_secs(1));
        let html = search_page_html(&["/freelancers/~01", "/freelancers/~01"]);

        let targets = walker.targets_from_html(&html).unwrap();

        assert_eq!(targets, vec!["https://talent.example.com/freelancers/~01"]);
    }

    #[test]
    fn keeps_first_seen_order_and_filters_non_profiles() {
        let spec = spec();
        let walker = PageWalker::new(&spec, Duration::from_secs(1));
        let html = search_page_html(&[
            "/freelancers/~02",
            "/agencies/acme",
            "https://talent.example.com/freelancers/~01#reviews",
            "/freelancers/~02",
            "/freelancers/~01",
        ]);

        let targets = walker.targets_from_html(&html).unwrap();

        assert_eq!(
            targets,
            vec![
                "https://talent.example.com/freelancers/~02",
                "https://talent.example.com/freelancers/~01",
            ]
        );
    }

    #[test]
    fn drops_off_site_profile_links() {
        let spec = spec();
        let walker = PageWalker::new(&spec, Duration::from_secs(1));
        let html = search_page_html(&[
            "https://other.example/freelancers/x",
            "//mirror.example/freelancers/~03",
            "/freelancers/~03",
        ]);

        let targets = walker.targets_from_html(&html).unwrap();

        assert_eq!(targets, vec!["https://talent.example.com/freelancers/~03"]);
    }

    #[test]
    fn falls_back_to_structural_link_locator() {
        let spec = spec();
        let walker = PageWalker::new(&spec, Duration::from_secs(1));
        let html = r#"<div class="profiles-list"><a href="/freelancers/~09">Ann</a><a>no href</a></div>"#;

        let targets = walker.targets_from_html(html).unwrap();

        assert_eq!(targets, vec!["https://talent.example.com/freelancers/~09"]);
    }

    #[test]
    fn page_without_links_has_no_targets() {
        let spec = spec();
        let walker = PageWalker::new(&spec, Duration::from_secs(1));
        let targets = walker
            .targets_from_html(r#"<div class="profiles-list"></div>"#)
            .unwrap();
        assert!(targets.is_empty());
    }

    #[tokio::test]
    async fn list_targets_renders_page_url_with_results_marker() {
        let spec = spec();
        let walker = PageWalker::new(&spec, Duration::from_secs(7));
        let url = walker.page_url("rust", 1);
        let mut session = MockSession::new().with_page(&url, &search_page_html(&["/freelancers/~01"]));

        let targets = walker.list_targets(&mut session, "rust", 1).await.unwrap();

        assert_eq!(targets.len(), 1);
        let waits = session.waits();
        assert_eq!(waits.len(), 1);
        assert_eq!(waits[0].0, url);
        assert_eq!(waits[0].1, WaitSpec::new(".profiles-list", Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn missing_results_marker_fails_the_page() {
        let spec = spec();
        let walker = PageWalker::new(&spec, Duration::from_secs(1));
        let url = walker.page_url("rust", 1);
        let mut session = MockSession::new().with_page(&url, "<html><body>Loading...</body></html>");

        let err = walker.list_targets(&mut session, "rust", 1).await.unwrap_err();

        assert!(matches!(err, AppError::MarkerTimeout { .. }));
    }
}
