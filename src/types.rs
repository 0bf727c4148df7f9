use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A nullable scalar as it comes off the wire.
///
/// Every non-null database value is carried in its textual form regardless of the
/// column's native type. The typed accessors coerce on read and never fail: NULL
/// or malformed text yields the target type's zero value.
///
/// ```rust
/// use sql_recordset::prelude::*;
///
/// let price = ScalarValue::from("12.50");
/// assert_eq!(price.as_f64(), 12.5);
/// assert_eq!(price.as_i64(), 0);
///
/// let missing = ScalarValue::Null;
/// assert_eq!(missing.as_str(), "");
/// assert!(missing.as_nullable_str().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ScalarValue {
    /// SQL NULL
    #[default]
    Null,
    /// Textual wire representation of a non-null value
    Text(String),
}

impl ScalarValue {
    /// Build a non-null value.
    pub fn text(value: impl Into<String>) -> Self {
        ScalarValue::Text(value.into())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The text, or `""` for NULL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ScalarValue::Text(s) => s,
            ScalarValue::Null => "",
        }
    }

    /// Owned copy of [`ScalarValue::as_str`].
    #[must_use]
    pub fn as_string(&self) -> String {
        self.as_str().to_owned()
    }

    /// The text, or `None` for NULL. Empty text is present, not absent.
    #[must_use]
    pub fn as_nullable_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            ScalarValue::Null => None,
        }
    }

    /// Parse as a float; NULL or unparsable text gives `0.0`.
    ///
    /// Decimal and exponent forms, `inf`/`nan` spellings and hexadecimal
    /// mantissas with a binary exponent (`0x1p-2`) are accepted.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.as_nullable_str()
            .and_then(|s| s.parse::<f64>().ok().or_else(|| parse_hex_float(s)))
            .unwrap_or(0.0)
    }

    /// Parse as a base-10 integer; NULL, unparsable or out-of-range text gives `0`.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.as_nullable_str()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0)
    }

    /// Parse as an RFC 3339 timestamp; failure gives [`ScalarValue::zero_time`].
    #[must_use]
    pub fn as_time(&self) -> DateTime<FixedOffset> {
        self.as_nullable_time().unwrap_or_else(Self::zero_time)
    }

    /// Parse as an RFC 3339 timestamp; NULL or failure gives `None`.
    ///
    /// Only the canonical layout is accepted: an uppercase `T` separator, a zone
    /// of `Z` or `±hh:mm`, and seconds below 60.
    #[must_use]
    pub fn as_nullable_time(&self) -> Option<DateTime<FixedOffset>> {
        self.as_nullable_str()
            .filter(|s| is_canonical_rfc3339(s))
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }

    /// The zero timestamp, `0001-01-01T00:00:00Z`.
    #[must_use]
    pub fn zero_time() -> DateTime<FixedOffset> {
        NaiveDate::from_ymd_opt(1, 1, 1)
            .unwrap_or_default()
            .and_time(NaiveTime::default())
            .and_utc()
            .fixed_offset()
    }
}

/// Shape check chrono's RFC 3339 parser is more lenient about.
fn is_canonical_rfc3339(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 20 || b[10] != b'T' || &b[17..19] == b"60" {
        return false;
    }
    if b.ends_with(b"Z") {
        return true;
    }
    let zone = &b[b.len() - 6..];
    matches!(zone[0], b'+' | b'-')
        && zone[3] == b':'
        && [1, 2, 4, 5].iter().all(|&i| zone[i].is_ascii_digit())
}

/// `[+-]0x<hex>[.<hex>]p[+-]<dec>`, the hexadecimal float form.
fn parse_hex_float(s: &str) -> Option<f64> {
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let rest = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))?;
    let (mantissa, exponent) = rest.split_once(['p', 'P'])?;
    let exponent: i32 = exponent.parse().ok()?;
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int.is_empty() && frac.is_empty() {
        return None;
    }

    let mut value = 0.0_f64;
    for c in int.chars() {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    let mut scale = 1.0 / 16.0;
    for c in frac.chars() {
        value += f64::from(c.to_digit(16)?) * scale;
        scale /= 16.0;
    }
    let value = value * 2.0_f64.powi(exponent);
    Some(if negative { -value } else { value })
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ScalarValue::Null, Into::into)
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_nullable_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer).map(ScalarValue::from)
    }
}
