/// GridTable View State
///
/// The interaction state a caller owns between pipeline runs: filters, sort
/// and page. Filter, sort and page-size edits send the page back to the start.

use crate::filter::{FilterState, FilterValue};
use crate::inference::ColumnTypes;
use crate::pipeline::{GridConfig, Page};
use crate::sort::SortSpec;
use serde::{Deserialize, Serialize};

/// Caller-owned interaction state between pipeline passes.
///
/// Every edit that changes which rows are shown, or how many fit on a page,
/// returns to the first page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub filters: FilterState,
    pub sort: SortSpec,
    pub page: Page,
}

impl ViewState {
    pub fn new() -> Self {
        ViewState::default()
    }

    /// Fresh state for a newly loaded dataset: default filters per column, no
    /// sort, first page. The page size is kept.
    pub fn reset_for(&mut self, columns: &[String], types: &ColumnTypes, config: &GridConfig) {
        self.filters = FilterState::initial(columns, types, &config.option_columns);
        self.sort.clear();
        self.page.offset = 0;
    }

    pub fn set_filter(&mut self, column: &str, value: Option<FilterValue>) {
        self.filters.set(column, value);
        self.page.offset = 0;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page.offset = 0;
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.page.offset = 0;
    }

    /// Cycle a column through ascending, descending and unsorted.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort.toggle(column);
        self.page.offset = 0;
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page.size = size;
        self.page.offset = 0;
    }

    /// Move to a zero-based page.
    pub fn go_to_page(&mut self, page: usize) {
        self.page.offset = page.saturating_mul(self.page.size);
    }
}
