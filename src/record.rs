//! A single row of named, typed fields.

use crate::literal::Literal;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the identifier grammar required of field, aggregator and rule
/// names throughout the engine: `^[A-Za-z][A-Za-z0-9_]*$`.
pub static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Mapping from field name to `Literal`, insertion-ordered. The field set
/// is schema-defined and identical across records in a dataset.
#[derive(Debug, Clone, Default)]
pub struct Record(pub IndexMap<String, Literal>);

impl Record {
    pub fn new() -> Self {
        Record(IndexMap::new())
    }

    pub fn get(&self, field: &str) -> Option<&Literal> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Literal) {
        self.0.insert(field.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|s| s.as_str())
    }
}

impl FromIterator<(String, Literal)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Literal)>>(iter: T) -> Self {
        Record(IndexMap::from_iter(iter))
    }
}
