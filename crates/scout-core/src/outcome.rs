use std::fmt;

/// Why a field came back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absence {
    /// No locator in the chain matched any node.
    NoMatch,
    /// A node matched but did not carry the requested attribute.
    MissingAttribute(String),
    /// A value was found but the post-processor rejected it.
    Unparsable(String),
}

impl fmt::Display for Absence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Absence::NoMatch => write!(f, "no locator matched"),
            Absence::MissingAttribute(name) => write!(f, "matched node has no '{name}' attribute"),
            Absence::Unparsable(raw) => write!(f, "could not parse {raw:?}"),
        }
    }
}

/// Result of extracting one field: a value, or a typed absence.
///
/// Absence is an ordinary value. It ends up as `null` in the assembled
/// record and is never reported as a crawl failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome<T> {
    Found(T),
    Absent(Absence),
}

impl<T> ExtractionOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, ExtractionOutcome::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            ExtractionOutcome::Found(value) => Some(value),
            ExtractionOutcome::Absent(_) => None,
        }
    }

    pub fn absence(&self) -> Option<&Absence> {
        match self {
            ExtractionOutcome::Found(_) => None,
            ExtractionOutcome::Absent(reason) => Some(reason),
        }
    }

    /// Chain a fallible step; its absence replaces this outcome.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> ExtractionOutcome<U>) -> ExtractionOutcome<U> {
        match self {
            ExtractionOutcome::Found(value) => f(value),
            ExtractionOutcome::Absent(reason) => ExtractionOutcome::Absent(reason),
        }
    }
}
