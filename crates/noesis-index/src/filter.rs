use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Typed metadata value attached to an index entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetadataValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// A predicate over entry metadata. Search applies all filters conjunctively.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Key present and equal to the value.
    Eq(String, MetadataValue),
    /// Key present and equal to one of the values.
    In(String, Vec<MetadataValue>),
    /// Numeric key within `[min, max]`; open bounds are `None`.
    Range {
        key: String,
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl Filter {
    pub fn eq(key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::Eq(key.into(), value.into())
    }

    pub fn range(key: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::Range {
            key: key.into(),
            min,
            max,
        }
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Self::Eq(key, expected) => metadata.get(key) == Some(expected),
            Self::In(key, options) => metadata.get(key).is_some_and(|v| options.contains(v)),
            Self::Range { key, min, max } => {
                let Some(n) = metadata.get(key).and_then(MetadataValue::as_number) else {
                    return false;
                };
                min.map_or(true, |lo| n >= lo) && max.map_or(true, |hi| n <= hi)
            }
        }
    }
}

pub(crate) fn matches_all(filters: &[Filter], metadata: &Metadata) -> bool {
    filters.iter().all(|f| f.matches(metadata))
}
