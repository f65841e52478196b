//! Runtime flow records.
//!
//! A dataset is just an iterable of rows; each row maps column names to
//! values. The [`FlowRecord`] trait is the only interface the executor needs,
//! so embedders can route their own record types without copying into a
//! [`FlowRow`].

use std::borrow::Cow;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A single cell of a flow row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlowValue {
    Number(f64),
    Text(String),
    Null,
}

impl FlowValue {
    /// The canonical string used for routing-tree branch lookup.
    ///
    /// Integral numbers render without a decimal point so that `5.0` and a
    /// textual `"5"` land in the same branch. Nulls have no key and always
    /// fall through to the default branch.
    pub fn as_key(&self) -> Option<Cow<'_, str>> {
        match self {
            FlowValue::Text(s) => Some(Cow::Borrowed(s)),
            FlowValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    Some(Cow::Owned(format!("{}", *n as i64)))
                } else {
                    Some(Cow::Owned(n.to_string()))
                }
            }
            FlowValue::Null => None,
        }
    }

    /// The numeric value, if there is one. Used by measure aggregation.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FlowValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for FlowValue {
    fn from(s: &str) -> Self {
        FlowValue::Text(s.to_string())
    }
}

impl From<String> for FlowValue {
    fn from(s: String) -> Self {
        FlowValue::Text(s)
    }
}

impl From<f64> for FlowValue {
    fn from(n: f64) -> Self {
        FlowValue::Number(n)
    }
}

impl From<i64> for FlowValue {
    fn from(n: i64) -> Self {
        FlowValue::Number(n as f64)
    }
}

/// The default owned row representation.
pub type FlowRow = AHashMap<String, FlowValue>;

/// Read access to one flow row. Unknown columns return `None`.
pub trait FlowRecord {
    fn value(&self, column: &str) -> Option<&FlowValue>;
}

impl FlowRecord for FlowRow {
    fn value(&self, column: &str) -> Option<&FlowValue> {
        let v = self.get(column)?;
        match v {
            FlowValue::Null => None,
            _ => Some(v),
        }
    }
}

impl<T: FlowRecord> FlowRecord for &T {
    fn value(&self, column: &str) -> Option<&FlowValue> {
        (*self).value(column)
    }
}
