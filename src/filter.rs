/// GridTable Filtering
///
/// A `FilterState` holds one optional filter per column. Before a pass the
/// state is compiled into a `FilterEvaluator`: each active column filter
/// becomes a predicate chosen from the filter's shape and the column's
/// inferred type, with numeric expressions parsed once up front. A row passes
/// when every predicate accepts it.
///
/// # Predicate selection
///
/// - a value set (`In`) is a multiselect membership test; option columns
///   always use it, even when their type was inferred as boolean
/// - a tri-state flag keeps truthy (`true`, `1`, `"1"`) or falsy rows
/// - a date range keeps rows whose cell parses to a date inside the range,
///   with the start day from 00:00:00.000 and the end day to 23:59:59.999
/// - text on a numeric column goes through the numeric expression parser
/// - text on a boolean column does not restrict anything
/// - any other text is a case-insensitive substring match

use crate::dates::{end_of_day, parse_to_date, start_of_day};
use crate::expr::{parse_numeric_filter, NumericFilter};
use crate::inference::{ColumnType, ColumnTypes};
use crate::sort::compare_cells;
use crate::table::{Record, Table};
use crate::value::CellValue;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The value a user entered for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FilterValue {
    /// Free text, or a numeric expression on numeric columns
    Text(String),
    /// Tri-state: `Some(true)`, `Some(false)`, or `None` for all rows
    Flag(Option<bool>),
    /// Inclusive day range, either side open
    DateRange(Option<NaiveDate>, Option<NaiveDate>),
    /// Multiselect set; empty means no restriction
    In(Vec<CellValue>),
}

impl FilterValue {
    /// True when the value does not restrict anything.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Flag(flag) => flag.is_none(),
            FilterValue::DateRange(start, end) => start.is_none() && end.is_none(),
            FilterValue::In(values) => values.is_empty(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(flag: bool) -> Self {
        FilterValue::Flag(Some(flag))
    }
}

/// How the grid offers a column's filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    #[default]
    Contains,
    Equals,
    DateRange,
    In,
}

impl MatchMode {
    /// Default mode for a column: option columns first, then by type.
    pub fn for_column(column_type: ColumnType, is_option_column: bool) -> Self {
        if is_option_column {
            MatchMode::In
        } else if column_type.is_boolean() {
            MatchMode::Equals
        } else if column_type.is_date() {
            MatchMode::DateRange
        } else {
            MatchMode::Contains
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFilter {
    pub value: Option<FilterValue>,
    pub match_mode: MatchMode,
}

impl ColumnFilter {
    pub fn is_active(&self) -> bool {
        self.value.as_ref().map_or(false, |v| !v.is_empty())
    }
}

/// Per-column filters, keyed by column name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    filters: BTreeMap<String, ColumnFilter>,
}

impl FilterState {
    pub fn new() -> Self {
        FilterState::default()
    }

    /// An empty filter for every column with its default match mode.
    pub fn initial(columns: &[String], types: &ColumnTypes, option_columns: &[String]) -> Self {
        let filters = columns
            .iter()
            .map(|column| {
                let column_type = types.get(column).copied().unwrap_or_default();
                let is_option = option_columns.contains(column);
                let filter = ColumnFilter {
                    value: None,
                    match_mode: MatchMode::for_column(column_type, is_option),
                };
                (column.clone(), filter)
            })
            .collect();
        FilterState { filters }
    }

    /// Set or clear a column's value, keeping its match mode.
    pub fn set(&mut self, column: &str, value: Option<FilterValue>) {
        self.filters.entry(column.to_string()).or_default().value = value;
    }

    /// Builder form of [`FilterState::set`].
    pub fn with(mut self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.set(column, Some(value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilter> {
        self.filters.get(column)
    }

    pub fn value(&self, column: &str) -> Option<&FilterValue> {
        self.filters.get(column).and_then(|f| f.value.as_ref())
    }

    /// Clear every value; match modes stay.
    pub fn clear(&mut self) {
        for filter in self.filters.values_mut() {
            filter.value = None;
        }
    }

    pub fn is_active(&self) -> bool {
        self.filters.values().any(ColumnFilter::is_active)
    }

    pub fn active_columns(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .filter(|(_, f)| f.is_active())
            .map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnFilter)> {
        self.filters.iter().map(|(c, f)| (c.as_str(), f))
    }
}

/// A compiled per-column test
#[derive(Debug, Clone)]
enum Predicate {
    OneOf(Vec<CellValue>),
    Flag(bool),
    DateRange {
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    },
    Numeric(NumericFilter),
    /// Lowercased needle
    Text(String),
}

impl Predicate {
    fn compile(value: &FilterValue, column_type: ColumnType, is_option_column: bool) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        let predicate = match value {
            FilterValue::In(values) => Predicate::OneOf(values.clone()),
            FilterValue::Flag(flag) => Predicate::Flag((*flag)?),
            FilterValue::DateRange(start, end) => Predicate::DateRange {
                start: start.map(start_of_day),
                end: end.map(end_of_day),
            },
            FilterValue::Text(text) => {
                if column_type.is_boolean() && !is_option_column {
                    return None;
                }
                if column_type.is_numeric() {
                    Predicate::Numeric(parse_numeric_filter(text)?)
                } else {
                    Predicate::Text(text.to_lowercase())
                }
            }
        };
        Some(predicate)
    }

    fn matches(&self, cell: &CellValue) -> bool {
        match self {
            Predicate::OneOf(values) => values.iter().any(|v| same_option(v, cell)),
            Predicate::Flag(true) => cell.is_truthy_flag(),
            Predicate::Flag(false) => cell.is_falsy_flag(),
            Predicate::DateRange { start, end } => match parse_to_date(cell) {
                Some(date) => start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e),
                None => false,
            },
            Predicate::Numeric(op) => op.matches(cell),
            Predicate::Text(needle) => cell.to_display_string().to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Option membership: equal values, or equal text for non-null values.
fn same_option(option: &CellValue, cell: &CellValue) -> bool {
    option == cell
        || (!option.is_null() && !cell.is_null() && option.to_display_string() == cell.to_display_string())
}

/// Compiled filter state for one pass.
///
/// Only active filters are compiled; an evaluator with no predicates keeps
/// every row.
#[derive(Debug, Clone, Default)]
pub struct FilterEvaluator {
    predicates: Vec<(String, Predicate)>,
}

impl FilterEvaluator {
    pub fn new(filters: &FilterState, types: &ColumnTypes, option_columns: &[String]) -> Self {
        let predicates = filters
            .iter()
            .filter_map(|(column, filter)| {
                let value = filter.value.as_ref()?;
                let column_type = types.get(column).copied().unwrap_or_default();
                let is_option = option_columns.iter().any(|c| c == column);
                Predicate::compile(value, column_type, is_option).map(|p| (column.to_string(), p))
            })
            .collect();
        FilterEvaluator { predicates }
    }

    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates
            .iter()
            .all(|(column, predicate)| predicate.matches(record.value(column)))
    }

    /// Indices of the matching records, in record order.
    pub fn apply(&self, records: &[Record]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record))
            .map(|(i, _)| i)
            .collect()
    }

    /// Narrow an existing index list.
    pub fn apply_to_indices(&self, records: &[Record], indices: &[usize]) -> Vec<usize> {
        indices
            .iter()
            .copied()
            .filter(|&i| records.get(i).map_or(false, |r| self.matches(r)))
            .collect()
    }
}

/// An entry of a multiselect list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionItem {
    pub label: String,
    pub value: CellValue,
}

/// Distinct non-blank values of a column over the whole table, ordered.
pub fn option_values(table: &Table, column: &str) -> Vec<OptionItem> {
    let mut values: Vec<CellValue> = Vec::new();
    for record in table.iter_rows() {
        let value = record.value(column);
        if value.is_blank() || values.contains(value) {
            continue;
        }
        values.push(value.clone());
    }
    values.sort_by(compare_cells);
    values
        .into_iter()
        .map(|value| OptionItem {
            label: value.to_display_string(),
            value,
        })
        .collect()
}

/// Option lists for every configured option column.
pub fn option_values_for(table: &Table, option_columns: &[String]) -> BTreeMap<String, Vec<OptionItem>> {
    option_columns
        .iter()
        .map(|column| (column.clone(), option_values(table, column)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infer_column_types;
    use crate::record;

    fn types_of(records: &[Record], columns: &[&str]) -> ColumnTypes {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        infer_column_types(records, &columns)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_text_and_numeric_filters_combine_with_and() {
        let rows = vec![
            record! { "a" => 2, "b" => "x", "c" => true },
            record! { "a" => 5, "b" => "y", "c" => false },
            record! { "a" => 10, "b" => "xy", "c" => true },
        ];
        let types = types_of(&rows, &["a", "b", "c"]);
        let filters = FilterState::new().with("a", ">3").with("b", "x");
        let evaluator = FilterEvaluator::new(&filters, &types, &[]);
        assert_eq!(evaluator.apply(&rows), vec![2]);
    }

    #[test]
    fn test_text_filter_is_case_insensitive_and_null_safe() {
        let rows = vec![
            record! { "name" => "Alice" },
            record! { "name" => CellValue::Null },
            record! { "other" => 1 },
            record! { "name" => "MALICE" },
        ];
        let types = types_of(&rows, &["name"]);
        let filters = FilterState::new().with("name", "alic");
        let evaluator = FilterEvaluator::new(&filters, &types, &[]);
        assert_eq!(evaluator.apply(&rows), vec![0, 3]);
    }

    #[test]
    fn test_tri_state_boolean() {
        let rows = vec![
            record! { "flag" => 1 },
            record! { "flag" => "0" },
            record! { "flag" => 0 },
            record! { "flag" => "1" },
            record! { "flag" => CellValue::Null },
        ];
        let types = types_of(&rows, &["flag"]);
        assert_eq!(types["flag"], ColumnType::BinaryBoolean);

        let keep_true = FilterEvaluator::new(&FilterState::new().with("flag", true), &types, &[]);
        assert_eq!(keep_true.apply(&rows), vec![0, 3]);

        let keep_false = FilterEvaluator::new(&FilterState::new().with("flag", false), &types, &[]);
        assert_eq!(keep_false.apply(&rows), vec![1, 2]);

        let mut all = FilterState::new();
        all.set("flag", Some(FilterValue::Flag(None)));
        let keep_all = FilterEvaluator::new(&all, &types, &[]);
        assert!(keep_all.is_empty());
        assert_eq!(keep_all.apply(&rows).len(), 5);
    }

    #[test]
    fn test_date_range_is_inclusive_by_day() {
        let rows = vec![
            record! { "d" => "2024-01-01" },
            record! { "d" => "2024-06-15T23:30:00" },
            record! { "d" => "2024-06-16" },
            record! { "d" => "garbage" },
        ];
        let mut types = ColumnTypes::new();
        types.insert("d".to_string(), ColumnType::Date);

        let mut filters = FilterState::new();
        filters.set("d", Some(FilterValue::DateRange(Some(date(2024, 1, 1)), Some(date(2024, 6, 15)))));
        let evaluator = FilterEvaluator::new(&filters, &types, &[]);
        assert_eq!(evaluator.apply(&rows), vec![0, 1]);

        filters.set("d", Some(FilterValue::DateRange(None, Some(date(2024, 1, 1)))));
        let evaluator = FilterEvaluator::new(&filters, &types, &[]);
        assert_eq!(evaluator.apply(&rows), vec![0]);

        filters.set("d", Some(FilterValue::DateRange(Some(date(2024, 6, 16)), None)));
        let evaluator = FilterEvaluator::new(&filters, &types, &[]);
        assert_eq!(evaluator.apply(&rows), vec![2]);

        filters.set("d", Some(FilterValue::DateRange(None, None)));
        let evaluator = FilterEvaluator::new(&filters, &types, &[]);
        assert_eq!(evaluator.apply(&rows), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_multiselect_on_option_column() {
        let rows = vec![
            record! { "status" => "open" },
            record! { "status" => "closed" },
            record! { "status" => 3 },
            record! { "status" => "pending" },
        ];
        let types = types_of(&rows, &["status"]);
        let options = vec!["status".to_string()];

        let mut filters = FilterState::initial(&["status".to_string()], &types, &options);
        assert_eq!(filters.get("status").unwrap().match_mode, MatchMode::In);

        filters.set("status", Some(FilterValue::In(vec!["open".into(), "3".into()])));
        let evaluator = FilterEvaluator::new(&filters, &types, &options);
        assert_eq!(evaluator.apply(&rows), vec![0, 2]);

        filters.set("status", Some(FilterValue::In(vec![])));
        let evaluator = FilterEvaluator::new(&filters, &types, &options);
        assert!(evaluator.is_empty());
    }

    #[test]
    fn test_option_column_takes_precedence_over_boolean() {
        let rows = vec![record! { "f" => 1 }, record! { "f" => 0 }];
        let types = types_of(&rows, &["f"]);
        assert!(types["f"].is_boolean());
        let options = vec!["f".to_string()];

        let initial = FilterState::initial(&["f".to_string()], &types, &options);
        assert_eq!(initial.get("f").unwrap().match_mode, MatchMode::In);

        let filters = FilterState::new().with("f", FilterValue::In(vec![0.into()]));
        assert_eq!(FilterEvaluator::new(&filters, &types, &options).apply(&rows), vec![1]);
    }

    #[test]
    fn test_text_on_boolean_column_is_ignored() {
        let rows = vec![record! { "ok" => true }, record! { "ok" => false }];
        let types = types_of(&rows, &["ok"]);
        let filters = FilterState::new().with("ok", "zzz");
        assert_eq!(FilterEvaluator::new(&filters, &types, &[]).apply(&rows), vec![0, 1]);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let rows: Vec<Record> = (0..50)
            .map(|i| record! { "n" => i, "s" => format!("item-{}", i % 7) })
            .collect();
        let types = types_of(&rows, &["n", "s"]);
        let filters = FilterState::new().with("n", "5<>40").with("s", "item-3");
        let evaluator = FilterEvaluator::new(&filters, &types, &[]);

        let once = evaluator.apply(&rows);
        let twice = evaluator.apply_to_indices(&rows, &once);
        assert_eq!(once, twice);
        assert!(!once.is_empty());
    }

    #[test]
    fn test_initial_match_modes() {
        let rows = vec![record! { "b" => true, "d" => "2024-01-01", "n" => 2.5, "t" => "x" }];
        let columns: Vec<String> = ["b", "d", "n", "t"].iter().map(|s| s.to_string()).collect();
        let types = infer_column_types(&rows, &columns);
        let state = FilterState::initial(&columns, &types, &[]);
        assert_eq!(state.get("b").unwrap().match_mode, MatchMode::Equals);
        assert_eq!(state.get("d").unwrap().match_mode, MatchMode::DateRange);
        assert_eq!(state.get("n").unwrap().match_mode, MatchMode::Contains);
        assert_eq!(state.get("t").unwrap().match_mode, MatchMode::Contains);
        assert!(!state.is_active());
    }

    #[test]
    fn test_option_values_are_distinct_and_ordered() {
        let table = Table::new("t", vec![
            record! { "c" => "beta" },
            record! { "c" => "alpha" },
            record! { "c" => "" },
            record! { "c" => CellValue::Null },
            record! { "c" => "beta" },
            record! { "c" => "item10" },
            record! { "c" => "item9" },
        ]);
        let labels: Vec<String> = option_values(&table, "c").into_iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["alpha", "beta", "item9", "item10"]);
    }

    #[test]
    fn test_filter_state_serde() {
        let filters = FilterState::new()
            .with("a", ">3")
            .with("flag", true);
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["a"]["value"], serde_json::json!({"kind": "text", "value": ">3"}));
        let back: FilterState = serde_json::from_value(json).unwrap();
        assert_eq!(back, filters);
    }
}
