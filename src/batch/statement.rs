//! SQL text synthesis for batch operations.
//!
//! Statements use backtick-quoted identifiers and `?` positional placeholders.
//! NULL values are never bound: they become `IS NULL` in predicates and a literal
//! `NULL` in SET lists.

use crate::error::BatchOp;
use crate::results::Record;
use crate::types::ScalarValue;

/// Quote an identifier with backticks, doubling any embedded backtick.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `<VERB> INTO <table> (<columns>) VALUES (?, ...)` for Insert or Replace.
#[must_use]
pub fn insert_sql(op: BatchOp, table: &str, columns: &[&str]) -> String {
    let cols = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "{} INTO {} ({cols}) VALUES ({placeholders})",
        op.verb(),
        quote_ident(table)
    )
}

/// Key predicate joined with `AND`; non-null key values are appended to `args`.
fn key_predicate<'a, I>(keys: I, args: &mut Vec<ScalarValue>) -> String
where
    I: IntoIterator<Item = (&'a str, &'a ScalarValue)>,
{
    keys.into_iter()
        .map(|(column, value)| {
            if value.is_null() {
                format!("({} IS NULL)", quote_ident(column))
            } else {
                args.push(value.clone());
                format!("({} = ?)", quote_ident(column))
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Per-row DELETE over the key columns of `record`. Missing keys count as NULL.
#[must_use]
pub fn delete_sql(table: &str, record: &Record, keys: &[&str]) -> (String, Vec<ScalarValue>) {
    static NULL: ScalarValue = ScalarValue::Null;
    let mut args = Vec::with_capacity(keys.len());
    let predicate = key_predicate(
        keys.iter().map(|k| (*k, record.get(k).unwrap_or(&NULL))),
        &mut args,
    );
    (
        format!("DELETE FROM {} WHERE {predicate}", quote_ident(table)),
        args,
    )
}

/// Per-row UPDATE setting every column of `settable` where `keys` match.
///
/// Bind order is the SET values followed by the key values.
#[must_use]
pub fn update_sql(
    table: &str,
    settable: &Record,
    keys: &[(&str, ScalarValue)],
) -> (String, Vec<ScalarValue>) {
    let mut args = Vec::with_capacity(settable.len() + keys.len());
    let sets = settable
        .iter()
        .map(|(column, value)| {
            if value.is_null() {
                format!("{} = NULL", quote_ident(column))
            } else {
                args.push(value.clone());
                format!("{} = ?", quote_ident(column))
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    let predicate = key_predicate(keys.iter().map(|(k, v)| (*k, v)), &mut args);
    (
        format!("UPDATE {} SET {sets} WHERE {predicate}", quote_ident(table)),
        args,
    )
}
