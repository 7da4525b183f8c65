use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::extract::{Record, assemble, extract_field, extract_list};
use crate::schema::{ListSectionSpec, ProfileSchema, SectionSpec};
use crate::scope::Scope;

/// Everything extracted from one profile document.
///
/// Each section is independently nullable. A record with every section null
/// is still returned: partial data beats none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// URL the record was extracted from.
    pub source_locator: String,
    pub basic_info: Option<Record>,
    pub availability: Option<Record>,
    pub offer_details: Option<Record>,
    pub consultation_rate: Option<Record>,
    pub work_history: Option<Vec<Record>>,
    pub skills: Option<Vec<String>>,
    pub project_catalog: Option<Vec<Record>>,
    pub testimonials: Option<Vec<Record>>,
}

impl ProfileRecord {
    /// Display name from the basic info section, if found.
    pub fn name(&self) -> Option<&str> {
        self.basic_info.as_ref().and_then(|info| info.get_str("name"))
    }

    /// True if no section produced any value.
    pub fn is_blank(&self) -> bool {
        let record_blank = |r: &Option<Record>| r.as_ref().is_none_or(Record::all_null);
        let list_blank = |l: &Option<Vec<Record>>| l.as_ref().is_none_or(Vec::is_empty);

        record_blank(&self.basic_info)
            && record_blank(&self.availability)
            && record_blank(&self.offer_details)
            && record_blank(&self.consultation_rate)
            && list_blank(&self.work_history)
            && self.skills.as_ref().is_none_or(Vec::is_empty)
            && list_blank(&self.project_catalog)
            && list_blank(&self.testimonials)
    }
}

/// Run the whole profile assembler tree against a document scope.
pub fn extract_profile<S: Scope>(root: &S, schema: &ProfileSchema, source_locator: &str) -> ProfileRecord {
    ProfileRecord {
        source_locator: source_locator.to_string(),
        basic_info: section(root, &schema.basic_info),
        availability: section(root, &schema.availability),
        offer_details: section(root, &schema.offer_details),
        consultation_rate: section(root, &schema.consultation_rate),
        work_history: list_section(root, &schema.work_history),
        skills: skills(root, schema),
        project_catalog: list_section(root, &schema.project_catalog),
        testimonials: list_section(root, &schema.testimonials),
    }
}

/// Parse a rendered document and extract a profile from it.
pub fn extract_profile_html(html: &str, schema: &ProfileSchema, source_locator: &str) -> ProfileRecord {
    let document = Html::parse_document(html);
    extract_profile(&document.root_element(), schema, source_locator)
}

fn section<S: Scope>(root: &S, spec: &SectionSpec) -> Option<Record> {
    match &spec.scope {
        Some(chain) => {
            let (_, scopes) = chain.resolve(root)?;
            Some(assemble(&scopes[0], &spec.fields))
        }
        None => Some(assemble(root, &spec.fields)),
    }
}

fn list_section<S: Scope>(root: &S, spec: &ListSectionSpec) -> Option<Vec<Record>> {
    match &spec.container {
        Some(chain) => {
            let (_, containers) = chain.resolve(root)?;
            Some(extract_list(&containers[0], &spec.items, &spec.fields))
        }
        None => Some(extract_list(root, &spec.items, &spec.fields)),
    }
}

fn skills<S: Scope>(root: &S, schema: &ProfileSchema) -> Option<Vec<String>> {
    let value = extract_field(root, &schema.skills).found()?;
    let items = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        serde_json::Value::String(s) => vec![s],
        _ => return None,
    };
    Some(items)
}
