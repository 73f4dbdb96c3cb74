/// GridTable Pipeline
///
/// The pipeline turns one immutable table plus the caller's filters, sort
/// spec and page into everything a grid renders:
///
/// ```text
/// records -> columns -> types -> filtered -> sorted -> page window
///                          |         |
///                          |         +-> aggregates
///                          +-> widths (sample only)
/// ```
///
/// Every stage is a pure function of its inputs and is memoised on them. A
/// stage cache holds only the last input it saw, which is enough for a grid
/// where one input changes at a time: editing the sort reuses the filtered
/// rows, paging reuses the sorted rows, and nothing is recomputed when the
/// same inputs are run again.
///
/// # Examples
///
/// ```
/// use gridtable::{record, FilterState, GridConfig, Page, Pipeline, SortSpec, Table};
///
/// let table = Table::new("scores", vec![
///     record! { "name" => "ann", "score" => 3 },
///     record! { "name" => "bob", "score" => 12 },
///     record! { "name" => "cat", "score" => 7 },
/// ]);
///
/// let mut pipeline = Pipeline::new(GridConfig::default());
/// let filters = FilterState::new().with("score", ">= 5");
/// let output = pipeline.run(&table, &filters, &SortSpec::default(), Page::default()).unwrap();
///
/// assert_eq!(output.total_filtered_count, 2);
/// assert_eq!(output.aggregates["score"], 19.0);
/// ```

use crate::aggregate::{column_sums, footer_cells, AggregateMap, FooterCell, HighlightColumns};
use crate::error::{GridError, Result};
use crate::filter::{option_values_for, FilterEvaluator, FilterState, OptionItem};
use crate::inference::{infer_column_types, ColumnTypes};
use crate::sort::{sort_indices, SortSpec};
use crate::table::{Record, Table};
use crate::width::{estimate_column_widths, WidthMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Page sizes offered by the paginator.
pub const ROWS_PER_PAGE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Grid behaviour switches and column roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    pub enable_sort: bool,
    pub enable_filter: bool,
    pub enable_summation: bool,
    /// Columns filtered by multiselect over their distinct values
    pub option_columns: Vec<String>,
    pub highlight_columns: HighlightColumns,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            enable_sort: true,
            enable_filter: true,
            enable_summation: true,
            option_columns: Vec::new(),
            highlight_columns: HighlightColumns::default(),
        }
    }
}

impl GridConfig {
    /// Parse a (possibly partial) JSON configuration object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The window of sorted rows to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub offset: usize,
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Page { offset: 0, size: ROWS_PER_PAGE_OPTIONS[0] }
    }
}

impl Page {
    pub fn new(offset: usize, size: usize) -> Self {
        Page { offset, size }
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(GridError::InvalidPage);
        }
        Ok(())
    }

    /// Number of pages for `total` rows; at least one.
    pub fn page_count(&self, total: usize) -> usize {
        if self.size == 0 {
            return 1;
        }
        total.div_ceil(self.size).max(1)
    }

    /// Zero-based page the offset falls on.
    pub fn current_page(&self) -> usize {
        if self.size == 0 {
            return 0;
        }
        self.offset / self.size
    }

    /// Index range of the window within `total` rows; empty past the end.
    pub fn range(&self, total: usize) -> Range<usize> {
        let start = self.offset.min(total);
        let end = self.offset.saturating_add(self.size).min(total);
        start..end
    }
}

/// Everything a grid needs to render one pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOutput {
    /// Discovered columns; the first is the frozen column
    pub columns: Vec<String>,
    pub column_types: ColumnTypes,
    pub visible_rows: Vec<Record>,
    pub total_filtered_count: usize,
    pub aggregates: AggregateMap,
    pub column_widths: WidthMap,
    pub footer: Vec<FooterCell>,
    pub options: BTreeMap<String, Vec<OptionItem>>,
    pub page: Page,
    pub page_count: usize,
}

impl GridOutput {
    /// Column pinned to the left edge.
    pub fn frozen_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }
}

/// Recompute counters, one per stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub passes: u64,
    pub inferences: u64,
    pub width_estimates: u64,
    pub option_scans: u64,
    pub filter_runs: u64,
    pub sort_runs: u64,
    pub aggregate_runs: u64,
}

/// The last input a stage saw and what it produced
#[derive(Debug)]
struct Cached<K, V> {
    key: K,
    value: V,
}

/// Return the cached value for `key`, computing it when the key changed.
fn memoize<'a, K: PartialEq, V>(
    slot: &'a mut Option<Cached<K, V>>,
    key: K,
    counter: &mut u64,
    stage: &str,
    compute: impl FnOnce() -> V,
) -> (&'a V, bool) {
    let fresh = slot.as_ref().map_or(true, |cached| cached.key != key);
    if fresh {
        *slot = None;
        *counter += 1;
        log::debug!("pipeline: recomputing {}", stage);
    }
    let cached = slot.get_or_insert_with(|| Cached { key, value: compute() });
    (&cached.value, fresh)
}

type FilterKey = (u64, FilterState, Vec<String>);

/// Memoised grid pipeline.
///
/// Holds no records itself; the table is passed to each [`Pipeline::run`]
/// and identified by its snapshot id.
#[derive(Debug, Default)]
pub struct Pipeline {
    config: GridConfig,
    types: Option<Cached<u64, ColumnTypes>>,
    widths: Option<Cached<(u64, bool), WidthMap>>,
    options: Option<Cached<(u64, Vec<String>), BTreeMap<String, Vec<OptionItem>>>>,
    filtered: Option<Cached<FilterKey, Vec<usize>>>,
    sorted: Option<Cached<(u64, SortSpec), Vec<usize>>>,
    aggregates: Option<Cached<(u64, bool), AggregateMap>>,
    /// Bumped whenever the filtered rows are recomputed
    filter_generation: u64,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(config: GridConfig) -> Self {
        Pipeline {
            config,
            ..Pipeline::default()
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Replace the configuration. Stages whose inputs changed recompute on
    /// the next run.
    pub fn set_config(&mut self, config: GridConfig) {
        self.config = config;
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Drop every cached stage.
    pub fn invalidate(&mut self) {
        self.types = None;
        self.widths = None;
        self.options = None;
        self.filtered = None;
        self.sorted = None;
        self.aggregates = None;
    }

    /// Run one pass.
    ///
    /// Fails only on caller mistakes: a zero page size, or a sort key naming
    /// a column the table does not have. Data problems never fail a pass.
    pub fn run(&mut self, table: &Table, filters: &FilterState, sort: &SortSpec, page: Page) -> Result<GridOutput> {
        page.validate()?;
        let config = &self.config;
        if config.enable_sort && !table.is_empty() {
            sort.validate(table.columns())?;
        }

        let snapshot = table.snapshot_id();
        let columns = table.columns();
        let records = table.records();
        let stats = &mut self.stats;

        let (types, _) = memoize(&mut self.types, snapshot, &mut stats.inferences, "column types", || {
            infer_column_types(table.sample(), columns)
        });

        let (widths, _) = memoize(
            &mut self.widths,
            (snapshot, config.enable_sort),
            &mut stats.width_estimates,
            "column widths",
            || estimate_column_widths(table.sample(), columns, types, config.enable_sort),
        );

        let (options, _) = memoize(
            &mut self.options,
            (snapshot, config.option_columns.clone()),
            &mut stats.option_scans,
            "option values",
            || option_values_for(table, &config.option_columns),
        );

        let active_filters = if config.enable_filter { filters.clone() } else { FilterState::new() };
        let (filtered, refiltered) = memoize(
            &mut self.filtered,
            (snapshot, active_filters.clone(), config.option_columns.clone()),
            &mut stats.filter_runs,
            "filtered rows",
            || FilterEvaluator::new(&active_filters, types, &config.option_columns).apply(records),
        );
        if refiltered {
            self.filter_generation += 1;
        }
        let generation = self.filter_generation;

        let active_sort = if config.enable_sort { sort.clone() } else { SortSpec::default() };
        let (sorted, _) = memoize(
            &mut self.sorted,
            (generation, active_sort.clone()),
            &mut stats.sort_runs,
            "sorted rows",
            || sort_indices(records, filtered, &active_sort, types),
        );

        let (aggregates, _) = memoize(
            &mut self.aggregates,
            (generation, config.enable_summation),
            &mut stats.aggregate_runs,
            "aggregates",
            || {
                if config.enable_summation {
                    column_sums(records, filtered, columns, types)
                } else {
                    AggregateMap::new()
                }
            },
        );

        let footer = if config.enable_summation {
            footer_cells(columns, aggregates, types, &config.highlight_columns)
        } else {
            Vec::new()
        };

        let window = page.range(sorted.len());
        let visible_rows: Vec<Record> = sorted[window].iter().map(|&i| records[i].clone()).collect();

        stats.passes += 1;
        log::debug!(
            "pipeline: table '{}' pass {}: {} of {} rows match, showing {}",
            table.name(),
            stats.passes,
            sorted.len(),
            records.len(),
            visible_rows.len()
        );

        Ok(GridOutput {
            columns: columns.to_vec(),
            column_types: types.clone(),
            visible_rows,
            total_filtered_count: sorted.len(),
            aggregates: aggregates.clone(),
            column_widths: widths.clone(),
            footer,
            options: options.clone(),
            page,
            page_count: page.page_count(sorted.len()),
        })
    }
}
