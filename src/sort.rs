//! Multi-key stable sorting of filtered rows.
//!
//! Rows are never moved: sorting permutes a list of record indices. Keys are
//! compared in order and the first non-equal key decides. Nulls (and absent
//! fields) go to the end for both directions and keep their filtered order
//! among themselves.

use crate::dates::parse_to_date;
use crate::error::{GridError, Result};
use crate::inference::{ColumnType, ColumnTypes};
use crate::table::Record;
use crate::value::CellValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort order specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// A single sort key specifying a column and order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    #[serde(rename = "field")]
    pub column: String,
    #[serde(rename = "direction")]
    pub order: SortOrder,
}

impl SortKey {
    pub fn ascending(column: impl Into<String>) -> Self {
        SortKey::new(column, SortOrder::Ascending)
    }

    pub fn descending(column: impl Into<String>) -> Self {
        SortKey::new(column, SortOrder::Descending)
    }

    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        SortKey {
            column: column.into(),
            order,
        }
    }
}

/// Ordered sort keys; empty means keep the filtered order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new(keys: Vec<SortKey>) -> Self {
        SortSpec { keys }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn order_of(&self, column: &str) -> Option<SortOrder> {
        self.keys.iter().find(|k| k.column == column).map(|k| k.order)
    }

    /// Add a key, replacing any existing key on the same column.
    pub fn push(&mut self, key: SortKey) {
        match self.keys.iter_mut().find(|k| k.column == key.column) {
            Some(existing) => existing.order = key.order,
            None => self.keys.push(key),
        }
    }

    /// Header click: ascending, then descending, then removed.
    pub fn toggle(&mut self, column: &str) {
        match self.keys.iter().position(|k| k.column == column) {
            None => self.keys.push(SortKey::ascending(column)),
            Some(i) => match self.keys[i].order {
                SortOrder::Ascending => self.keys[i].order = SortOrder::Descending,
                SortOrder::Descending => {
                    self.keys.remove(i);
                }
            },
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Every key must name a known column.
    pub fn validate(&self, columns: &[String]) -> Result<()> {
        match self.keys.iter().find(|k| !columns.contains(&k.column)) {
            Some(key) => Err(GridError::UnknownSortColumn(key.column.clone())),
            None => Ok(()),
        }
    }
}

/// Case-insensitive comparison that orders digit runs by value, so
/// `item9 < item10`. Case only breaks ties.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = take_digits(&mut left);
                let run_b = take_digits(&mut right);
                let ord = compare_digit_runs(&run_a, &run_b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare two non-null cells without column context.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (CellValue::Date(x), CellValue::Date(y)) => x.cmp(y),
        (CellValue::Bool(x), CellValue::Bool(y)) => x.cmp(y),
        (a, b) => natural_cmp(&a.to_display_string(), &b.to_display_string()),
    }
}

/// Compare two non-null cells of a column: numeric columns coerce numeric
/// strings, date columns compare parsed dates.
pub fn compare_in_column(a: &CellValue, b: &CellValue, column_type: ColumnType) -> Ordering {
    match column_type {
        ColumnType::Numeric => {
            if let (Some(x), Some(y)) = (a.to_number(), b.to_number()) {
                return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            }
        }
        ColumnType::Date => {
            if let (Some(x), Some(y)) = (parse_to_date(a), parse_to_date(b)) {
                return x.cmp(&y);
            }
        }
        _ => {}
    }
    compare_cells(a, b)
}

fn compare_by_key(a: &CellValue, b: &CellValue, key: &SortKey, column_type: ColumnType) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => key.order.apply(compare_in_column(a, b, column_type)),
    }
}

/// Sort `indices` into `records` by the spec. Stable.
pub fn sort_indices(records: &[Record], indices: &[usize], spec: &SortSpec, types: &ColumnTypes) -> Vec<usize> {
    let mut sorted = indices.to_vec();
    if spec.is_empty() {
        return sorted;
    }

    let keys: Vec<(&SortKey, ColumnType)> = spec
        .keys()
        .iter()
        .map(|key| (key, types.get(&key.column).copied().unwrap_or_default()))
        .collect();

    sorted.sort_by(|&a, &b| {
        let (row_a, row_b) = (&records[a], &records[b]);
        for (key, column_type) in &keys {
            let cmp = compare_by_key(row_a.value(&key.column), row_b.value(&key.column), key, *column_type);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
    sorted
}
