use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::ScalarValue;

/// One decoded row: a unique-keyed mapping from column name to [`ScalarValue`].
///
/// Columns keep the order in which they were first set, which for decoded rows is
/// the order the engine returned them in. Setting an existing column replaces its
/// value in place. Looking up a column that is not present behaves like NULL in
/// the typed accessors.
///
/// Lookups scan the columns linearly, so setting every column of a row is
/// quadratic in its width. Equality compares column/value pairs and ignores
/// column order.
///
/// ```rust
/// use sql_recordset::prelude::*;
///
/// let mut rec = Record::new();
/// rec.set("id", "7");
/// rec.set("name", ScalarValue::Null);
/// assert_eq!(rec.int64("id"), 7);
/// assert_eq!(rec.str("name"), "");
/// assert_eq!(rec.columns().collect::<Vec<_>>(), ["id", "name"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record {
    entries: Vec<(String, ScalarValue)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.entries.iter().position(|(name, _)| name == column)
    }

    /// Set `column` to `value`, returning the previous value if the column existed.
    pub fn set(
        &mut self,
        column: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Option<ScalarValue> {
        let column = column.into();
        let value = value.into();
        match self.position(&column) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((column, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.position(column).map(|idx| &self.entries[idx].1)
    }

    /// Remove `column`, keeping the order of the remaining columns.
    pub fn remove(&mut self, column: &str) -> Option<ScalarValue> {
        self.position(column)
            .map(|idx| self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn value(&self, column: &str) -> &ScalarValue {
        static NULL: ScalarValue = ScalarValue::Null;
        self.get(column).unwrap_or(&NULL)
    }

    #[must_use]
    pub fn str(&self, column: &str) -> &str {
        self.value(column).as_str()
    }

    #[must_use]
    pub fn nullable_str(&self, column: &str) -> Option<&str> {
        self.value(column).as_nullable_str()
    }

    #[must_use]
    pub fn float64(&self, column: &str) -> f64 {
        self.value(column).as_f64()
    }

    #[must_use]
    pub fn int64(&self, column: &str) -> i64 {
        self.value(column).as_i64()
    }

    #[must_use]
    pub fn time(&self, column: &str) -> DateTime<FixedOffset> {
        self.value(column).as_time()
    }

    #[must_use]
    pub fn nullable_time(&self, column: &str) -> Option<DateTime<FixedOffset>> {
        self.value(column).as_nullable_time()
    }

    /// Every column as plain text, NULL rendered as `""`.
    #[must_use]
    pub fn stringify(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), value.as_string()))
            .collect()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(column, value)| other.get(column) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<ScalarValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, ScalarValue);
    type IntoIter = std::vec::IntoIter<(String, ScalarValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of column names to strings or nulls")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, value)) = access.next_entry::<String, ScalarValue>()? {
            record.set(name, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}
