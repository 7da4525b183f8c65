//! Site extraction schema: what to look for on search pages and profiles.
//!
//! The schema is data. Selectors and post-processing grammars change when the
//! site's markup changes; the engine does not. A built-in schema is embedded
//! at compile time and any other can be loaded from a JSON file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use crate::extract::FieldSpec;
use crate::locator::{LocatorChain, compile};

const BUILTIN: &str = include_str!("../schemas/upwork.json");

/// A single-record section (basic info, availability, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Sub-tree to assemble against. When set and unresolved, the section is
    /// null; when unset, the document root is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<LocatorChain>,
    pub fields: Vec<FieldSpec>,
}

/// A repeated section (work history, catalog, testimonials).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSectionSpec {
    /// Enclosing sub-tree. When set and unresolved, the section is null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<LocatorChain>,
    /// One match per list item.
    pub items: LocatorChain,
    pub fields: Vec<FieldSpec>,
}

/// Field specs for every section of a profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSchema {
    /// CSS selector that must be present before a profile is extracted.
    pub ready_marker: String,
    pub basic_info: SectionSpec,
    pub availability: SectionSpec,
    pub offer_details: SectionSpec,
    pub consultation_rate: SectionSpec,
    pub work_history: ListSectionSpec,
    pub skills: FieldSpec,
    pub project_catalog: ListSectionSpec,
    pub testimonials: ListSectionSpec,
}

/// How to page through search results and pick out profile links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Search URL with `{keyword}` and `{page}` placeholders.
    pub url_template: String,
    /// CSS selector that marks a loaded results page.
    pub results_marker: String,
    /// Elements carrying profile hrefs.
    pub target_links: LocatorChain,
    /// Only hrefs containing this path fragment are profile links.
    pub target_path: String,
    /// Base for resolving relative hrefs.
    pub base_url: String,
}

/// Complete schema for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSchema {
    pub search: SearchSpec,
    pub profile: ProfileSchema,
}

impl SiteSchema {
    /// The schema embedded in the binary.
    pub fn builtin() -> Result<Self, AppError> {
        Self::from_json(BUILTIN)
    }

    /// Raw JSON of the embedded schema, for users who want to edit a copy.
    pub fn builtin_json() -> &'static str {
        BUILTIN
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let schema: Self = serde_json::from_str(json)
            .map_err(|e| AppError::SchemaError(format!("Invalid schema JSON: {e}")))?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::SchemaError(format!("Failed to read schema file {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Check everything serde cannot: marker selectors, template placeholders, base URL.
    pub fn validate(&self) -> Result<(), AppError> {
        compile(&self.search.results_marker)?;
        compile(&self.profile.ready_marker)?;

        if !self.search.url_template.contains("{page}") {
            return Err(AppError::SchemaError(
                "search.url_template must contain a {page} placeholder".into(),
            ));
        }
        if !self.search.url_template.contains("{keyword}") {
            return Err(AppError::SchemaError(
                "search.url_template must contain a {keyword} placeholder".into(),
            ));
        }
        if self.search.target_links.is_empty() {
            return Err(AppError::SchemaError(
                "search.target_links must declare at least one locator".into(),
            ));
        }
        Url::parse(&self.search.base_url).map_err(|e| {
            AppError::SchemaError(format!("Invalid search.base_url '{}': {e}", self.search.base_url))
        })?;

        let lists = [
            ("work_history", &self.profile.work_history),
            ("project_catalog", &self.profile.project_catalog),
            ("testimonials", &self.profile.testimonials),
        ];
        for (name, list) in lists {
            if list.items.is_empty() {
                return Err(AppError::SchemaError(format!(
                    "profile.{name}.items must declare at least one locator"
                )));
            }
            unique_field_names(name, &list.fields)?;
        }

        let sections = [
            ("basic_info", &self.profile.basic_info),
            ("availability", &self.profile.availability),
            ("offer_details", &self.profile.offer_details),
            ("consultation_rate", &self.profile.consultation_rate),
        ];
        for (name, section) in sections {
            unique_field_names(name, &section.fields)?;
        }

        Ok(())
    }
}

/// Field names are record keys, so each may appear once per section.
fn unique_field_names(section: &str, fields: &[FieldSpec]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(AppError::SchemaError(format!(
                "profile.{section} declares field '{}' more than once",
                field.name
            )));
        }
    }
    Ok(())
}
