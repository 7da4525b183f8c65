//! Post-processors turning raw node text into typed field values.
//!
//! Every processor is total: input it cannot interpret becomes
//! [`Absence::Unparsable`], never an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::AppError;
use crate::outcome::{Absence, ExtractionOutcome};

static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("valid number regex"));

static CURRENCY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£¥]\s*(\d[\d,]*(?:\.\d+)?)").expect("valid currency regex")
});

static RANGE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[-–—]\s+|\s+[-–—]\s*").expect("valid range regex"));

static YEAR_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})\s*[-–—]\s*(\d{4}|Present)$").expect("valid year range regex")
});

/// Raw value pulled from the matched node(s), before post-processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Text or attribute of the first matched node.
    Single(String),
    /// Text of every matched node, in document order.
    Many(Vec<String>),
}

/// A regular expression that (de)serializes as its source string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, AppError> {
        Regex::new(source)
            .map(Self)
            .map_err(|e| AppError::InvalidPattern {
                pattern: source.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Pattern {
    type Error = AppError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(&source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.0.as_str().to_string()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Conversion applied to a raw value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostProcessor {
    /// Non-empty trimmed string.
    #[default]
    Text,
    /// First numeric token as a float ("1,234 hours" → 1234.0).
    Number,
    /// First numeric token as an integer; fractional values are rejected.
    Integer,
    /// Amount following a currency symbol ("$45.00/hr" → 45.0).
    Currency,
    /// "Jan 2020 - Present" → `{"start": "Jan 2020", "end": "Present"}`.
    ///
    /// The dash needs surrounding whitespace, except between two bare years
    /// ("2020-2021"). ISO dates such as "2020-01-15" are unparsable.
    DateRange,
    /// Separator-delimited list of non-empty parts.
    Split { separator: String },
    /// Non-empty strings collected into an array.
    List,
    /// Named captures of a regex as an object; numeric captures become numbers.
    Pattern { regex: Pattern },
}

impl PostProcessor {
    /// Convert `raw` into a typed value.
    ///
    /// For [`RawValue::Many`], scalar processors are applied per item and the
    /// parsable items are returned as an array.
    pub fn apply(&self, raw: &RawValue) -> ExtractionOutcome<Value> {
        match (self, raw) {
            (PostProcessor::List, RawValue::Single(s)) => list(std::slice::from_ref(s)),
            (PostProcessor::List, RawValue::Many(items)) => list(items),
            (PostProcessor::Split { separator }, RawValue::Many(items)) => {
                let parts: Vec<String> = items
                    .iter()
                    .flat_map(|item| item.split(separator.as_str()))
                    .map(str::to_string)
                    .collect();
                list(&parts)
            }
            (_, RawValue::Single(s)) => self.apply_one(s),
            (_, RawValue::Many(items)) => {
                let values: Vec<Value> = items
                    .iter()
                    .filter_map(|item| self.apply_one(item).found())
                    .collect();
                if values.is_empty() {
                    unparsable(&items.join(" | "))
                } else {
                    ExtractionOutcome::Found(Value::Array(values))
                }
            }
        }
    }

    fn apply_one(&self, raw: &str) -> ExtractionOutcome<Value> {
        let raw = raw.trim();
        match self {
            PostProcessor::Text => {
                if raw.is_empty() {
                    unparsable(raw)
                } else {
                    ExtractionOutcome::Found(Value::String(raw.to_string()))
                }
            }
            PostProcessor::Number => match NUMBER_TOKEN.find(raw).and_then(|m| parse_float(m.as_str())) {
                Some(n) => ExtractionOutcome::Found(Value::Number(n)),
                None => unparsable(raw),
            },
            PostProcessor::Integer => {
                let parsed = NUMBER_TOKEN
                    .find(raw)
                    .and_then(|m| m.as_str().replace(',', "").parse::<i64>().ok());
                match parsed {
                    Some(n) => ExtractionOutcome::Found(Value::from(n)),
                    None => unparsable(raw),
                }
            }
            PostProcessor::Currency => {
                let amount = CURRENCY_TOKEN
                    .captures(raw)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| parse_float(m.as_str()));
                match amount {
                    Some(n) => ExtractionOutcome::Found(Value::Number(n)),
                    None => unparsable(raw),
                }
            }
            PostProcessor::DateRange => match split_range(raw) {
                Some((start, end)) => {
                    let mut obj = Map::new();
                    obj.insert("start".into(), Value::String(start.to_string()));
                    obj.insert("end".into(), Value::String(end.to_string()));
                    ExtractionOutcome::Found(Value::Object(obj))
                }
                None => unparsable(raw),
            },
            PostProcessor::Split { separator } => {
                let parts: Vec<String> = raw.split(separator.as_str()).map(str::to_string).collect();
                list(&parts)
            }
            PostProcessor::List => list(&[raw.to_string()]),
            PostProcessor::Pattern { regex } => match_pattern(regex, raw),
        }
    }
}

fn split_range(raw: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = RANGE_SEPARATOR.splitn(raw, 2).map(str::trim).collect();
    if let [start, end] = parts.as_slice()
        && !start.is_empty()
        && !end.is_empty()
    {
        return Some((*start, *end));
    }
    let caps = YEAR_RANGE.captures(raw)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

fn match_pattern(pattern: &Pattern, raw: &str) -> ExtractionOutcome<Value> {
    let Some(caps) = pattern.0.captures(raw) else {
        return unparsable(raw);
    };

    let names: Vec<&str> = pattern.0.capture_names().flatten().collect();
    if names.is_empty() {
        return ExtractionOutcome::Found(Value::String(caps[0].to_string()));
    }

    let mut obj = Map::new();
    for name in names {
        let value = match caps.name(name) {
            Some(m) => scalar(m.as_str().trim()),
            None => Value::Null,
        };
        obj.insert(name.to_string(), value);
    }
    ExtractionOutcome::Found(Value::Object(obj))
}

/// A capture that is entirely numeric becomes a number, anything else a string.
fn scalar(raw: &str) -> Value {
    let cleaned = raw.replace(',', "");
    if let Ok(n) = cleaned.parse::<i64>() {
        return Value::from(n);
    }
    match parse_float(raw) {
        Some(n) => Value::Number(n),
        None => Value::String(raw.to_string()),
    }
}

fn parse_float(token: &str) -> Option<Number> {
    token
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
}

fn list(items: &[String]) -> ExtractionOutcome<Value> {
    let values: Vec<Value> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| Value::String(s.to_string()))
        .collect();
    if values.is_empty() {
        unparsable(&items.join(" | "))
    } else {
        ExtractionOutcome::Found(Value::Array(values))
    }
}

fn unparsable(raw: &str) -> ExtractionOutcome<Value> {
    ExtractionOutcome::Absent(Absence::Unparsable(raw.to_string()))
}
