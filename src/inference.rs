//! Column type inference.
//!
//! Each column is classified from the non-null values of the sample (the
//! first [`SAMPLE_SIZE`](crate::table::SAMPLE_SIZE) records). Values are
//! counted independently per category and the categories are then tested in
//! a fixed precedence:
//!
//! 1. boolean: more than 70% boolean literals, or every value is `0`/`1`
//! 2. date: more than 70% date-like
//! 3. numeric: more than 80% numeric-like
//! 4. text
//!
//! Booleans come first so 0/1 flag columns do not read as numbers, and dates
//! come before numbers so millisecond timestamps do not either.

use crate::dates::is_date_like;
use crate::table::Record;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const BOOLEAN_THRESHOLD: f64 = 0.7;
pub const DATE_THRESHOLD: f64 = 0.7;
pub const NUMERIC_THRESHOLD: f64 = 0.8;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    #[default]
    Text,
    Numeric,
    /// Mostly `true`/`false` literals
    Boolean,
    /// Only `0`/`1` (numbers or strings)
    BinaryBoolean,
    Date,
}

impl ColumnType {
    /// Both boolean flavours.
    pub fn is_boolean(&self) -> bool {
        matches!(self, ColumnType::Boolean | ColumnType::BinaryBoolean)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Numeric)
    }

    pub fn is_date(&self) -> bool {
        matches!(self, ColumnType::Date)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::Text)
    }

    /// Serialized name, e.g. `binaryBoolean`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Numeric => "numeric",
            ColumnType::Boolean => "boolean",
            ColumnType::BinaryBoolean => "binaryBoolean",
            ColumnType::Date => "date",
        }
    }
}

/// Inferred type per column
pub type ColumnTypes = HashMap<String, ColumnType>;

/// Per-category tallies over a column's non-null sampled values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueCounts {
    pub non_null: usize,
    pub boolean: usize,
    pub binary: usize,
    pub date: usize,
    pub numeric: usize,
}

impl ValueCounts {
    pub fn observe(&mut self, value: &CellValue) {
        if value.is_null() {
            return;
        }
        self.non_null += 1;
        // each value lands in the first category it fits
        if matches!(value, CellValue::Bool(_)) {
            self.boolean += 1;
        } else if is_binary(value) {
            self.binary += 1;
        } else if is_date_like(value) {
            self.date += 1;
        } else if value.is_numeric_like() {
            self.numeric += 1;
        }
    }

    pub fn classify(&self) -> ColumnType {
        if self.non_null == 0 {
            return ColumnType::Text;
        }
        let n = self.non_null as f64;

        if self.boolean as f64 > n * BOOLEAN_THRESHOLD {
            ColumnType::Boolean
        } else if self.binary == self.non_null {
            ColumnType::BinaryBoolean
        } else if self.date as f64 > n * DATE_THRESHOLD {
            ColumnType::Date
        } else if self.numeric as f64 > n * NUMERIC_THRESHOLD {
            ColumnType::Numeric
        } else {
            ColumnType::Text
        }
    }
}

fn is_binary(value: &CellValue) -> bool {
    match value {
        CellValue::Number(v) => *v == 0.0 || *v == 1.0,
        CellValue::Text(s) => s == "0" || s == "1",
        _ => false,
    }
}

/// Classify one column from the sample.
pub fn infer_column_type(sample: &[Record], column: &str) -> ColumnType {
    let mut counts = ValueCounts::default();
    for record in sample {
        counts.observe(record.value(column));
    }
    counts.classify()
}

/// Classify every column from the sample.
pub fn infer_column_types(sample: &[Record], columns: &[String]) -> ColumnTypes {
    columns
        .iter()
        .map(|column| (column.clone(), infer_column_type(sample, column)))
        .collect()
}
