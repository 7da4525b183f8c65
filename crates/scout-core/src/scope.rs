//! Queryable document scopes.
//!
//! A scope is the whole rendered document or any sub-tree of it. Extraction
//! code only ever sees a scope, never the render session that produced it.

use scraper::ElementRef;

use crate::locator::Locator;

/// A node or sub-tree that locators can be evaluated against.
///
/// Matches are scopes themselves, so list items can be assembled recursively.
pub trait Scope: Sized {
    /// All nodes under this scope matched by `locator`, in document order.
    fn find(&self, locator: &Locator) -> Vec<Self>;

    /// Visible text with whitespace runs collapsed to single spaces.
    fn text_content(&self) -> String;

    /// Raw attribute value, if present.
    fn attribute(&self, name: &str) -> Option<String>;
}

impl<'a> Scope for ElementRef<'a> {
    fn find(&self, locator: &Locator) -> Vec<Self> {
        let candidates = self.select(locator.selector());
        match locator.needle() {
            Some(needle) => {
                let matching: Vec<Self> = candidates
                    .filter(|el| el.text_content().contains(needle))
                    .collect();
                innermost(matching)
            }
            None => candidates.collect(),
        }
    }

    fn text_content(&self) -> String {
        normalize_whitespace(&self.text().collect::<String>())
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }
}

/// Keep only matches with no matching descendant.
fn innermost(matching: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    matching
        .iter()
        .copied()
        .filter(|el| {
            !matching
                .iter()
                .any(|other| other.id() != el.id() && other.ancestors().any(|a| a.id() == el.id()))
        })
        .collect()
}

/// Collapse whitespace runs and trim.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn text_contains_filters_candidates() {
        let html = Html::parse_document(
            "<ul><li>Hourly rate</li><li>$30 per 30 min Zoom meeting</li></ul>",
        );
        let locator = Locator::text_contains("li", "Zoom").unwrap();
        let found = html.root_element().find(&locator);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text_content(), "$30 per 30 min Zoom meeting");
    }

    #[test]
    fn text_contains_prefers_innermost_match() {
        let html = Html::parse_document(
            r#"<div class="stats"><div class="row"><div>Total jobs 42</div><div>Total hours 1,230</div></div></div>"#,
        );
        let locator = Locator::text_contains(".stats div", "Total hours").unwrap();
        let found = html.root_element().find(&locator);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text_content(), "Total hours 1,230");
    }

    #[test]
    fn text_contains_keeps_sibling_matches() {
        let html = Html::parse_document(
            "<ul><li><span>Zoom 30 min</span></li><li>Zoom 60 min</li></ul>",
        );
        let locator = Locator::text_contains("li, span", "Zoom").unwrap();
        let found: Vec<String> = html
            .root_element()
            .find(&locator)
            .iter()
            .map(|el| el.text_content())
            .collect();
        assert_eq!(found, ["Zoom 30 min", "Zoom 60 min"]);
    }

    #[test]
    fn text_content_collapses_whitespace() {
        let html = Html::parse_document("<h1>\n   Jane \n  <span>Doe</span>\n</h1>");
        let h1 = html.root_element().find(&Locator::path("h1").unwrap());
        assert_eq!(h1[0].text_content(), "Jane Doe");
    }

    #[test]
    fn attribute_reads_raw_value() {
        let html = Html::parse_document(r#"<a href="/freelancers/~01abc">x</a>"#);
        let links = html.root_element().find(&Locator::path("a").unwrap());
        assert_eq!(
            links[0].attribute("href").as_deref(),
            Some("/freelancers/~01abc")
        );
        assert_eq!(links[0].attribute("title"), None);
    }
}
