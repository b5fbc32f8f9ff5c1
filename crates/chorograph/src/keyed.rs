//! Keyed data.
//!
//! Data records arrive as a flat array of JSON values. [`KeyedData::key_by`]
//! indexes them by a key read through a [`KeyAccessor`] so that features can
//! look up their record in constant time.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;

use chorograph_core::feature::value_to_key;

use crate::error::ChorographError;

/// Computes the key of a data record.
pub type KeyFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// How the key of a data record is found.
#[derive(Clone)]
pub enum KeyAccessor {
    /// Dot-separated path into the record, such as `"location.id"`
    Field(String),
    /// A caller-supplied function
    Func(KeyFn),
}

impl KeyAccessor {
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    pub fn func<F>(key_fn: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        Self::Func(Arc::new(key_fn))
    }

    /// Returns the key of `datum`, if it has one.
    ///
    /// Strings are used as is; numbers and booleans are stringified.
    pub fn key_of(&self, datum: &Value) -> Option<String> {
        match self {
            Self::Field(path) => lookup_path(datum, path).and_then(value_to_key),
            Self::Func(key_fn) => key_fn(datum),
        }
    }
}

impl fmt::Debug for KeyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(path) => f.debug_tuple("Field").field(path).finish(),
            Self::Func(_) => write!(f, "Func(..)"),
        }
    }
}

/// Follows a dot-separated path through objects and arrays.
///
/// Array elements are addressed by numeric segments, as in `"values.0"`.
/// An empty path returns `value` itself.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Data records indexed by key, in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyedData {
    records: IndexMap<String, Value>,
}

impl KeyedData {
    /// Indexes `data` by the key `accessor` reads from each record.
    ///
    /// Records without a key are skipped. On duplicate keys the last record
    /// wins, unless `strict` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ChorographError::DuplicateKey`] if `strict` is set and two
    /// records share a key.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chorograph::keyed::{KeyAccessor, KeyedData};
    /// # use serde_json::json;
    /// let data = vec![
    ///     json!({"location": {"id": 1}, "value": 3.5}),
    ///     json!({"location": {"id": 2}, "value": 7}),
    /// ];
    ///
    /// let keyed = KeyedData::key_by(&data, &KeyAccessor::field("location.id"), false).unwrap();
    /// assert_eq!(keyed.value_of("2", "value"), Some(7.0));
    /// ```
    pub fn key_by(
        data: &[Value],
        accessor: &KeyAccessor,
        strict: bool,
    ) -> Result<Self, ChorographError> {
        let mut records = IndexMap::with_capacity(data.len());
        let mut skipped = 0usize;

        for (index, datum) in data.iter().enumerate() {
            let Some(key) = accessor.key_of(datum) else {
                warn!(index, accessor:?; "Skipping data record without a key");
                skipped += 1;
                continue;
            };
            if records.insert(key.clone(), datum.clone()).is_some() && strict {
                return Err(ChorographError::DuplicateKey(key));
            }
        }

        debug!(records = records.len(), skipped; "Keyed data rebuilt");
        Ok(Self { records })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.records.get(key)
    }

    /// Reads a numeric value from the record with `key`.
    ///
    /// Numbers are used directly; strings are parsed as numbers.
    pub fn value_of(&self, key: &str, value_field: &str) -> Option<f64> {
        match lookup_path(self.get(key)?, value_field)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns every numeric value found at `value_field`
    pub fn values<'a>(&'a self, value_field: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.records
            .keys()
            .filter_map(move |key| self.value_of(key, value_field))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.records.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
