/// GridTable Aggregation
///
/// Column sums over the filtered (not paginated) rows, and the footer cells
/// built from them.
///
/// A column is summed when it is neither a date nor a boolean column and its
/// first non-null value in the filtered set is numeric-like. Every non-null
/// value then contributes: numeric strings are coerced and anything that does
/// not coerce adds zero, so no row is ever excluded from a sum.

use crate::format::format_number;
use crate::inference::ColumnTypes;
use crate::table::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sum per summable column
pub type AggregateMap = HashMap<String, f64>;

/// Sum the summable columns of `records[indices]`.
pub fn column_sums(records: &[Record], indices: &[usize], columns: &[String], types: &ColumnTypes) -> AggregateMap {
    let mut sums = AggregateMap::new();
    if indices.is_empty() {
        return sums;
    }

    for column in columns {
        let column_type = types.get(column).copied().unwrap_or_default();
        if column_type.is_date() || column_type.is_boolean() {
            continue;
        }

        let mut values = indices
            .iter()
            .filter_map(|&i| records.get(i))
            .map(|r| r.value(column))
            .filter(|v| !v.is_null())
            .peekable();

        match values.peek() {
            Some(first) if first.is_numeric_like() => {}
            _ => continue,
        }

        let sum: f64 = values.map(|v| v.to_number().unwrap_or(0.0)).sum();
        sums.insert(column.clone(), sum);
    }
    sums
}

/// Columns whose footer sums are emphasised
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightColumns {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl HighlightColumns {
    /// Negative wins when a column is listed in both.
    pub fn highlight_for(&self, column: &str) -> Highlight {
        if self.negative.iter().any(|c| c == column) {
            Highlight::Negative
        } else if self.positive.iter().any(|c| c == column) {
            Highlight::Positive
        } else {
            Highlight::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Highlight {
    #[default]
    None,
    Positive,
    Negative,
}

/// One footer cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterCell {
    pub column: String,
    pub text: String,
    pub highlight: Highlight,
}

/// Footer summary row.
///
/// The first column is the label column: `Total`, or `Total: <sum>` when it
/// has a sum itself. Other columns get a cell only when they have a sum.
pub fn footer_cells(
    columns: &[String],
    sums: &AggregateMap,
    types: &ColumnTypes,
    highlights: &HighlightColumns,
) -> Vec<FooterCell> {
    let mut cells = Vec::new();
    for (i, column) in columns.iter().enumerate() {
        let column_type = types.get(column).copied().unwrap_or_default();
        let sum = sums.get(column).filter(|_| !column_type.is_boolean() && !column_type.is_date());

        let cell = match (i, sum) {
            (0, Some(sum)) => FooterCell {
                column: column.clone(),
                text: format!("Total: {}", format_number(*sum)),
                highlight: highlights.highlight_for(column),
            },
            (0, None) => FooterCell {
                column: column.clone(),
                text: "Total".to_string(),
                highlight: Highlight::None,
            },
            (_, Some(sum)) => FooterCell {
                column: column.clone(),
                text: format_number(*sum),
                highlight: highlights.highlight_for(column),
            },
            (_, None) => continue,
        };
        cells.push(cell);
    }
    cells
}
