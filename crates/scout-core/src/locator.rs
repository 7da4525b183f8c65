//! Locators and ordered fallback chains.
//!
//! A [`Locator`] is one (strategy, selector) pair. A [`LocatorChain`] is an
//! ordered list of them, evaluated first-match-wins: the first locator that
//! matches at least one node decides the result and later locators are never
//! queried. Chains are plain data, so the same resolution routine serves every
//! field of every record.

use std::fmt;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::scope::Scope;

/// How a locator finds nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Exact attribute value, e.g. `data-test="freelancer-name"`.
    ExactAttribute,
    /// Structural CSS path, e.g. `section.work-history > ul > li`.
    StructuralPath,
    /// Nodes under a CSS path whose text contains a needle.
    TextContains,
}

/// Serialized form of a [`Locator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorSpec {
    Attribute { name: String, value: String },
    Path(String),
    Text { within: String, contains: String },
}

/// A compiled (strategy, selector) pair. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "LocatorSpec", into = "LocatorSpec")]
pub struct Locator {
    spec: LocatorSpec,
    selector: Selector,
}

impl Locator {
    /// Match elements whose attribute `name` equals `value` exactly.
    pub fn attribute(name: &str, value: &str) -> Result<Self, AppError> {
        Self::try_from(LocatorSpec::Attribute {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Match elements by structural CSS path.
    pub fn path(css: &str) -> Result<Self, AppError> {
        Self::try_from(LocatorSpec::Path(css.to_string()))
    }

    /// Match elements under `within` whose text contains `needle`.
    pub fn text_contains(within: &str, needle: &str) -> Result<Self, AppError> {
        Self::try_from(LocatorSpec::Text {
            within: within.to_string(),
            contains: needle.to_string(),
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self.spec {
            LocatorSpec::Attribute { .. } => Strategy::ExactAttribute,
            LocatorSpec::Path(_) => Strategy::StructuralPath,
            LocatorSpec::Text { .. } => Strategy::TextContains,
        }
    }

    /// The compiled CSS selector candidates are drawn from.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Text a candidate must contain, for [`Strategy::TextContains`].
    pub fn needle(&self) -> Option<&str> {
        match &self.spec {
            LocatorSpec::Text { contains, .. } => Some(contains),
            _ => None,
        }
    }
}

impl TryFrom<LocatorSpec> for Locator {
    type Error = AppError;

    fn try_from(spec: LocatorSpec) -> Result<Self, Self::Error> {
        let css = match &spec {
            LocatorSpec::Attribute { name, value } => {
                format!("[{}=\"{}\"]", name, value.replace('\\', "\\\\").replace('"', "\\\""))
            }
            LocatorSpec::Path(css) => css.clone(),
            LocatorSpec::Text { within, .. } => within.clone(),
        };
        let selector = compile(&css)?;
        Ok(Self { spec, selector })
    }
}

impl From<Locator> for LocatorSpec {
    fn from(locator: Locator) -> Self {
        locator.spec
    }
}

impl PartialEq for Locator {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.spec {
            LocatorSpec::Attribute { name, value } => write!(f, "attribute[{name}={value:?}]"),
            LocatorSpec::Path(css) => write!(f, "path({css})"),
            LocatorSpec::Text { within, contains } => write!(f, "text({within} ~ {contains:?})"),
        }
    }
}

/// Parse a CSS selector, mapping parse failures to [`AppError::InvalidSelector`].
pub fn compile(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Ordered fallback list of locators, evaluated first-match-wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocatorChain(Vec<Locator>);

impl LocatorChain {
    pub fn new(locators: Vec<Locator>) -> Self {
        Self(locators)
    }

    /// Shorthand for a single-locator chain.
    pub fn single(locator: Locator) -> Self {
        Self(vec![locator])
    }

    pub fn locators(&self) -> &[Locator] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve the chain against `scope`.
    ///
    /// Returns the index of the winning locator and its matches (document
    /// order), or `None` if no locator matched anything.
    pub fn resolve<S: Scope>(&self, scope: &S) -> Option<(usize, Vec<S>)> {
        self.0.iter().enumerate().find_map(|(idx, locator)| {
            let nodes = scope.find(locator);
            if nodes.is_empty() {
                None
            } else {
                Some((idx, nodes))
            }
        })
    }
}

impl From<Locator> for LocatorChain {
    fn from(locator: Locator) -> Self {
        Self::single(locator)
    }
}

impl fmt::Display for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn builds_each_strategy() {
        assert_eq!(
            Locator::attribute("data-test", "name").unwrap().strategy(),
            Strategy::ExactAttribute
        );
        assert_eq!(
            Locator::path("div > h2").unwrap().strategy(),
            Strategy::StructuralPath
        );
        let text = Locator::text_contains("li", "Zoom").unwrap();
        assert_eq!(text.strategy(), Strategy::TextContains);
        assert_eq!(text.needle(), Some("Zoom"));
    }

    #[test]
    fn invalid_css_is_rejected_at_construction() {
        let err = Locator::path("div[").unwrap_err();
        assert!(matches!(err, AppError::InvalidSelector { .. }));
    }

    #[test]
    fn attribute_values_with_quotes_are_escaped() {
        let locator = Locator::attribute("title", "say \"hi\"").unwrap();
        let html = Html::parse_fragment(r#"<p title='say "hi"'>quoted</p>"#);
        let found = html.root_element().find(&locator);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn deserializes_from_json() {
        let chain: LocatorChain = serde_json::from_value(serde_json::json!([
            {"attribute": {"name": "data-test", "value": "rate"}},
            {"path": "span.rate"},
            {"text": {"within": "span", "contains": "/hr"}}
        ]))
        .unwrap();
        assert_eq!(chain.locators().len(), 3);
        assert_eq!(chain.locators()[2].strategy(), Strategy::TextContains);
    }

    #[test]
    fn deserializing_bad_selector_fails() {
        let result: Result<Locator, _> = serde_json::from_value(serde_json::json!({"path": "a[["}));
        assert!(result.is_err());
    }

    #[test]
    fn serializes_back_to_spec() {
        let locator = Locator::path("h1.name").unwrap();
        let json = serde_json::to_value(&locator).unwrap();
        assert_eq!(json, serde_json::json!({"path": "h1.name"}));
    }

    #[test]
    fn display_is_stable() {
        let chain = LocatorChain::new(vec![
            Locator::attribute("data-test", "title").unwrap(),
            Locator::path("h2").unwrap(),
        ]);
        assert_eq!(chain.to_string(), r#"attribute[data-test="title"] | path(h2)"#);
    }

    #[test]
    fn resolve_returns_first_matching_locator() {
        let html = Html::parse_document(
            r#"<html><body><h2 class="b">second</h2><h3>third</h3></body></html>"#,
        );
        let chain = LocatorChain::new(vec![
            Locator::path("h1").unwrap(),
            Locator::path("h2.b").unwrap(),
            Locator::path("h3").unwrap(),
        ]);
        let (idx, nodes) = chain.resolve(&html.root_element()).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text_content(), "second");
    }

    #[test]
    fn empty_chain_never_resolves() {
        let html = Html::parse_document("<p>x</p>");
        assert!(LocatorChain::default().resolve(&html.root_element()).is_none());
    }
}
