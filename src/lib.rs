/// GridTable - Client-Side Tabular Data Engine
///
/// Takes an arbitrary array of loosely-typed records and derives what a data
/// grid needs to render it: a semantic type per column, per-column filters
/// (with a small numeric expression language, date ranges, multiselect sets
/// and tri-state booleans), a stable multi-column sort, column sums over the
/// filtered rows, a pixel width estimate per column, and the visible page.

pub mod error;
pub mod value;
pub mod table;
pub mod dates;
pub mod inference;
pub mod expr;
pub mod filter;
pub mod sort;
pub mod aggregate;
pub mod format;
pub mod width;
pub mod state;
pub mod pipeline;
pub mod debounce;

pub use error::{GridError, Result};
pub use value::CellValue;
pub use table::{Record, Table, SAMPLE_SIZE};
pub use inference::{infer_column_type, infer_column_types, ColumnType, ColumnTypes};
pub use expr::{parse_numeric_filter, FilterOpKind, NumericFilter};
pub use filter::{option_values, ColumnFilter, FilterEvaluator, FilterState, FilterValue, MatchMode, OptionItem};
pub use sort::{sort_indices, SortKey, SortOrder, SortSpec};
pub use aggregate::{column_sums, footer_cells, AggregateMap, FooterCell, Highlight, HighlightColumns};
pub use format::{format_cell_value, format_header_name, format_number};
pub use width::{estimate_column_widths, WidthMap};
pub use state::ViewState;
pub use pipeline::{GridConfig, GridOutput, Page, Pipeline, PipelineStats, ROWS_PER_PAGE_OPTIONS};
pub use debounce::Debouncer;
#[cfg(feature = "async")]
pub use debounce::DebounceHandle;

// Python bindings - only when python feature is enabled
#[cfg(feature = "python")]
mod python_bindings;
#[cfg(feature = "python")]
pub use python_bindings::*;

/// Build a [`Record`] from `name => value` pairs, in order.
///
/// ```
/// use gridtable::{record, CellValue};
///
/// let row = record! { "id" => 7, "name" => "widget", "price" => CellValue::Null };
/// assert_eq!(row.keys().collect::<Vec<_>>(), vec!["id", "name", "price"]);
/// ```
#[macro_export]
macro_rules! record {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut record = $crate::Record::new();
        $( record.insert($key, $value); )*
        record
    }};
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(table: &Table, filters: &FilterState, sort: &SortSpec) -> GridOutput {
        Pipeline::new(GridConfig::default())
            .run(table, filters, sort, Page::new(0, 100))
            .unwrap()
    }

    #[test]
    fn test_filter_and_sum_workflow() {
        let table = Table::new("abc", vec![
            record! { "a" => 2, "b" => "x", "c" => true },
            record! { "a" => 5, "b" => "y", "c" => false },
            record! { "a" => 10, "b" => "xy", "c" => true },
        ]);
        let filters = FilterState::new().with("a", ">3").with("b", "x");
        let output = run(&table, &filters, &SortSpec::default());

        assert_eq!(output.visible_rows, vec![table.records()[2].clone()]);
        assert_eq!(output.total_filtered_count, 1);
        assert_eq!(output.aggregates.get("a"), Some(&10.0));
        assert!(!output.aggregates.contains_key("c"));
        assert_eq!(output.column_types["c"], ColumnType::Boolean);
    }

    #[test]
    fn test_two_of_three_dates_is_text() {
        let table = Table::new("dates", vec![
            record! { "d" => "2024-01-01" },
            record! { "d" => "2024-06-15" },
            record! { "d" => "not-a-date" },
        ]);
        let output = run(&table, &FilterState::new(), &SortSpec::default());
        assert_eq!(output.column_types["d"], ColumnType::Text);
    }

    #[test]
    fn test_empty_dataset() {
        for table in [
            Table::empty("empty"),
            Table::from_json("json", "[]").unwrap(),
            Table::from_json("json", r#"{"rows": 3}"#).unwrap(),
        ] {
            let output = run(&table, &FilterState::new().with("x", "abc"), &SortSpec::default());
            assert!(output.columns.is_empty());
            assert!(output.visible_rows.is_empty());
            assert_eq!(output.total_filtered_count, 0);
            assert!(output.aggregates.is_empty());
            assert!(output.column_widths.is_empty());
            assert_eq!(output.frozen_column(), None);
        }
    }

    #[test]
    fn test_columns_are_union_in_first_seen_order() {
        let table = Table::from_json("mixed", r#"[
            {"id": 1, "name": "a"},
            {"id": 2, "email": "b@example.com"},
            {"name": "c", "id": 3, "phone": null}
        ]"#).unwrap();
        let output = run(&table, &FilterState::new(), &SortSpec::default());
        assert_eq!(output.columns, vec!["id", "name", "email", "phone"]);
        assert_eq!(output.frozen_column(), Some("id"));
    }

    #[test]
    fn test_multi_sort_keeps_ties_in_filtered_order() {
        let table = Table::new("staff", vec![
            record! { "team" => "red", "score" => 2, "who" => "p" },
            record! { "team" => "blue", "score" => 2, "who" => "q" },
            record! { "team" => "red", "score" => 2, "who" => "r" },
            record! { "team" => "blue", "score" => 9, "who" => "s" },
            record! { "team" => "red", "score" => 9, "who" => "t" },
        ]);
        let mut view = ViewState::new();
        view.toggle_sort("team");
        view.toggle_sort("score");
        view.toggle_sort("score");

        let output = run(&table, &view.filters, &view.sort);
        let order: Vec<String> = output.visible_rows.iter().map(|r| r.value("who").to_display_string()).collect();
        assert_eq!(order, vec!["s", "q", "t", "p", "r"]);
    }

    #[test]
    fn test_interaction_round_trip() {
        let records: Vec<Record> = (1..=45)
            .map(|i| record! {
                "id" => i,
                "region" => if i % 3 == 0 { "north" } else { "south" },
                "amount" => i as f64 * 1.5,
                "shipped" => i % 2,
            })
            .collect();
        let table = Table::new("orders", records);
        let config = GridConfig {
            option_columns: vec!["region".to_string()],
            ..GridConfig::default()
        };
        let mut pipeline = Pipeline::new(config.clone());

        let mut view = ViewState::new();
        let first = pipeline.run(&table, &view.filters, &view.sort, view.page).unwrap();
        view.reset_for(&first.columns, &first.column_types, &config);
        assert_eq!(first.column_types["shipped"], ColumnType::BinaryBoolean);
        assert_eq!(first.page_count, 5);

        view.go_to_page(3);
        view.set_filter("region", Some(FilterValue::In(vec!["north".into()])));
        assert_eq!(view.page.offset, 0);
        view.set_filter("shipped", Some(FilterValue::Flag(Some(true))));

        let output = pipeline.run(&table, &view.filters, &view.sort, view.page).unwrap();
        // multiples of 3 that are odd: 3, 9, 15, 21, 27, 33, 39, 45
        assert_eq!(output.total_filtered_count, 8);
        assert_eq!(output.aggregates["amount"], 192.0 * 1.5);
        assert!(!output.aggregates.contains_key("shipped"));
        assert_eq!(output.visible_rows.len(), 8);
    }
}
