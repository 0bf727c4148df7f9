use std::collections::BTreeMap;

use super::row::Record;

/// An ordered sequence of records: cursor order when decoded, caller order when
/// handed to a batch operation.
pub type RecordSet = Vec<Record>;

/// Flatten a record set into plain string maps, NULL rendered as `""`.
///
/// Useful for feeding rows to templates or table printers that only deal in text.
#[must_use]
pub fn stringify(records: &[Record]) -> Vec<BTreeMap<String, String>> {
    records
        .iter()
        .map(|record| record.stringify().into_iter().collect())
        .collect()
}
