//! Helper utilities for testing and development.

use crate::results::Record;
use crate::types::ScalarValue;

/// Build a record from `(column, value)` pairs, `None` meaning NULL.
#[must_use]
pub fn record(pairs: &[(&str, Option<&str>)]) -> Record {
    pairs
        .iter()
        .map(|(column, value)| (*column, ScalarValue::from(*value)))
        .collect()
}
