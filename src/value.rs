/// GridTable Cell Values
///
/// A `CellValue` is one loosely-typed field of a record. Records arrive from
/// JSON-ish sources, so a column may hold numbers, numeric strings, booleans
/// and nulls side by side. The coercions here are the single place where the
/// engine decides what "numeric", "truthy" or "the text of a cell" means.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Display format used for date cells when they are stringified.
pub(crate) const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A single field value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Coerce to a finite number.
    ///
    /// Numbers pass through, text is trimmed and must parse completely.
    /// Booleans, nulls, dates, empty strings and spellings such as `"inf"` or
    /// `"NaN"` are not numbers.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if v.is_finite() => Some(*v),
            CellValue::Text(s) => parse_finite(s),
            _ => None,
        }
    }

    /// True when the value is a number or a string that parses fully to a
    /// finite float.
    pub fn is_numeric_like(&self) -> bool {
        match self {
            CellValue::Number(_) => true,
            CellValue::Text(s) => parse_finite(s).is_some(),
            _ => false,
        }
    }

    /// Truthiness in the tri-state boolean sense: `true`, `1`, `"1"`.
    pub fn is_truthy_flag(&self) -> bool {
        match self {
            CellValue::Bool(v) => *v,
            CellValue::Number(v) => *v == 1.0,
            CellValue::Text(s) => s == "1",
            _ => false,
        }
    }

    /// Falsiness in the tri-state boolean sense: `false`, `0`, `"0"`.
    pub fn is_falsy_flag(&self) -> bool {
        match self {
            CellValue::Bool(v) => !*v,
            CellValue::Number(v) => *v == 0.0,
            CellValue::Text(s) => s == "0",
            _ => false,
        }
    }

    /// Values dropped from option lists: null, false, 0, NaN and "".
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Bool(v) => !*v,
            CellValue::Number(v) => *v == 0.0 || v.is_nan(),
            CellValue::Text(s) => s.is_empty(),
            CellValue::Date(_) => false,
        }
    }

    /// The literal text of the cell; null becomes the empty string.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(v) => v.to_string(),
            CellValue::Number(v) => number_to_string(*v),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => d.format(DATE_DISPLAY_FORMAT).to_string(),
        }
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    // Rust accepts "inf"/"nan" spellings; cells never mean those.
    if trimmed.is_empty() || trimmed.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Shortest round-trip representation, with the spellings a browser would use
/// for the non-finite cases.
pub(crate) fn number_to_string(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if v == 0.0 {
        "0".to_string()
    } else {
        v.to_string()
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(v: NaiveDateTime) -> Self {
        CellValue::Date(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Null),
            serde_json::Value::String(s) => CellValue::Text(s),
            // Nested structures are kept as their JSON text
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&CellValue> for serde_json::Value {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Date(_) => serde_json::Value::String(value.to_display_string()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CellValue::Number(_) => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Date(_) => serializer.serialize_str(&self.to_display_string()),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(CellValue::from)
    }
}
