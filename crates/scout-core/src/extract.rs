//! Field extraction, record assembly and list extraction.
//!
//! - [`extract_field`] runs one locator chain plus post-processor.
//! - [`assemble`] runs many fields against one scope and always returns a
//!   record with every declared key.
//! - [`extract_list`] splits a scope into item sub-scopes and assembles each.
//!
//! None of these return errors: every failure mode is an
//! [`ExtractionOutcome::Absent`] or a `null` in the record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::locator::LocatorChain;
use crate::outcome::{Absence, ExtractionOutcome};
use crate::postprocess::{PostProcessor, RawValue};
use crate::scope::Scope;

/// Where the raw value of a matched node comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Text of the first matched node.
    #[default]
    Text,
    /// Text of every matched node.
    AllText,
    /// Named attribute of the first matched node.
    Attr(String),
}

/// One named field: where to look, what to read, how to convert it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub locate: LocatorChain,
    #[serde(default)]
    pub source: ValueSource,
    #[serde(default)]
    pub post: PostProcessor,
}

impl FieldSpec {
    /// A text field with the default post-processor.
    pub fn text(name: &str, locate: impl Into<LocatorChain>) -> Self {
        Self {
            name: name.to_string(),
            locate: locate.into(),
            source: ValueSource::Text,
            post: PostProcessor::Text,
        }
    }

    pub fn with_source(mut self, source: ValueSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_post(mut self, post: PostProcessor) -> Self {
        self.post = post;
        self
    }
}

/// A structured, possibly partial, mapping of field name to value.
///
/// Absent fields are present as `null`, so two records assembled from the
/// same field list always have the same key set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Value of a field; `Some(&Value::Null)` for an absent field and `None`
    /// for a field that was never declared.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String value of a field, if it was found and is a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn is_null(&self, field: &str) -> bool {
        matches!(self.0.get(field), Some(Value::Null) | None)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// True if every declared field came back absent.
    pub fn all_null(&self) -> bool {
        self.0.values().all(Value::is_null)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Resolve `chain` against `scope` and read the raw value.
///
/// First-match-wins: once a locator matches, later locators are not queried,
/// even if reading from the matched node then fails.
pub fn extract_raw<S: Scope>(
    scope: &S,
    chain: &LocatorChain,
    source: &ValueSource,
) -> ExtractionOutcome<RawValue> {
    let Some((_, nodes)) = chain.resolve(scope) else {
        return ExtractionOutcome::Absent(Absence::NoMatch);
    };

    match source {
        ValueSource::Text => ExtractionOutcome::Found(RawValue::Single(nodes[0].text_content())),
        ValueSource::AllText => ExtractionOutcome::Found(RawValue::Many(
            nodes.iter().map(Scope::text_content).collect(),
        )),
        ValueSource::Attr(name) => match nodes[0].attribute(name) {
            Some(value) => ExtractionOutcome::Found(RawValue::Single(value)),
            None => ExtractionOutcome::Absent(Absence::MissingAttribute(name.clone())),
        },
    }
}

/// Extract one field: locate, read, post-process.
pub fn extract_field<S: Scope>(scope: &S, field: &FieldSpec) -> ExtractionOutcome<Value> {
    extract_raw(scope, &field.locate, &field.source).and_then(|raw| field.post.apply(&raw))
}

/// Assemble a record from `fields`, one independent extraction per field.
pub fn assemble<S: Scope>(scope: &S, fields: &[FieldSpec]) -> Record {
    let mut map = Map::with_capacity(fields.len());
    for field in fields {
        let value = match extract_field(scope, field) {
            ExtractionOutcome::Found(value) => value,
            ExtractionOutcome::Absent(reason) => {
                tracing::trace!(field = %field.name, %reason, "Field absent");
                Value::Null
            }
        };
        map.insert(field.name.clone(), value);
    }
    Record(map)
}

/// Locate repeated sub-scopes with `items` and assemble each one.
///
/// Output order is document order and output length equals the number of
/// sub-scopes, even when an item's fields are all absent. No matching
/// sub-scopes yields an empty list.
pub fn extract_list<S: Scope>(scope: &S, items: &LocatorChain, fields: &[FieldSpec]) -> Vec<Record> {
    match items.resolve(scope) {
        Some((_, subscopes)) => subscopes.iter().map(|item| assemble(item, fields)).collect(),
        None => Vec::new(),
    }
}
