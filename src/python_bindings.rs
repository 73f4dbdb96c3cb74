/// Python bindings for GridTable using PyO3
///
/// Exposes a `Grid` class that owns a record set, the interaction state and a
/// memoised pipeline, so a Python front end can drive filtering, sorting and
/// paging and read back everything it needs to render.

use pyo3::prelude::*;
use pyo3::exceptions::PyValueError;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::aggregate::{Highlight, HighlightColumns};
use crate::error::GridError;
use crate::filter::{FilterState, FilterValue};
use crate::format::format_header_name as rust_format_header_name;
use crate::pipeline::{GridConfig, GridOutput, Page, Pipeline};
use crate::sort::{SortKey, SortOrder, SortSpec};
use crate::state::ViewState;
use crate::table::{Record, Table};
use crate::value::CellValue;

fn grid_err(e: GridError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

// ============================================================================
// Value Conversions
// ============================================================================

/// Convert a Python datetime.datetime or datetime.date to a naive date-time
fn py_to_datetime(value: &Bound<'_, PyAny>) -> PyResult<Option<NaiveDateTime>> {
    let py = value.py();
    let datetime_mod = py.import_bound("datetime")?;
    let datetime_type = datetime_mod.getattr("datetime")?;
    let date_type = datetime_mod.getattr("date")?;

    // datetime must be checked before date (datetime is subclass of date)
    let has_time = value.is_instance(&datetime_type)?;
    if !has_time && !value.is_instance(&date_type)? {
        return Ok(None);
    }

    let year: i32 = value.getattr("year")?.extract()?;
    let month: u32 = value.getattr("month")?.extract()?;
    let day: u32 = value.getattr("day")?.extract()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| PyValueError::new_err("Invalid date"))?;

    let (hour, minute, second, micro) = if has_time {
        (
            value.getattr("hour")?.extract()?,
            value.getattr("minute")?.extract()?,
            value.getattr("second")?.extract()?,
            value.getattr("microsecond")?.extract()?,
        )
    } else {
        (0, 0, 0, 0)
    };

    date.and_hms_micro_opt(hour, minute, second, micro)
        .map(Some)
        .ok_or_else(|| PyValueError::new_err("Invalid time"))
}

/// Convert a Python value to a cell.
///
/// Unknown objects are kept as their `str()` text.
fn py_to_cell_value(value: &Bound<'_, PyAny>) -> PyResult<CellValue> {
    if value.is_none() {
        return Ok(CellValue::Null);
    }
    // bool is a subclass of int, so it goes first
    if value.is_instance_of::<PyBool>() {
        return Ok(CellValue::Bool(value.extract()?));
    }
    if value.is_instance_of::<PyInt>() || value.is_instance_of::<PyFloat>() {
        return Ok(CellValue::Number(value.extract::<f64>()?));
    }
    if value.is_instance_of::<PyString>() {
        return Ok(CellValue::Text(value.extract()?));
    }
    if let Some(dt) = py_to_datetime(value)? {
        return Ok(CellValue::Date(dt));
    }
    Ok(CellValue::Text(value.str()?.to_string()))
}

fn cell_value_to_py(py: Python, value: &CellValue) -> PyResult<PyObject> {
    match value {
        CellValue::Null => Ok(py.None()),
        CellValue::Bool(v) => Ok(v.to_object(py)),
        CellValue::Number(v) => {
            if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
                Ok((*v as i64).to_object(py))
            } else {
                Ok(v.to_object(py))
            }
        }
        CellValue::Text(v) => Ok(v.to_object(py)),
        CellValue::Date(dt) => {
            let datetime_mod = py.import_bound("datetime")?;
            let obj = datetime_mod.getattr("datetime")?.call1((
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second(),
                dt.nanosecond() / 1_000,
            ))?;
            Ok(obj.to_object(py))
        }
    }
}

fn py_to_record(row: &Bound<'_, PyDict>) -> PyResult<Record> {
    let mut record = Record::new();
    for (key, value) in row.iter() {
        let name: String = match key.extract() {
            Ok(name) => name,
            Err(_) => key.str()?.to_string(),
        };
        record.insert(name, py_to_cell_value(&value)?);
    }
    Ok(record)
}

fn record_to_py(py: Python, record: &Record) -> PyResult<PyObject> {
    let dict = PyDict::new_bound(py);
    for (name, value) in record.iter() {
        dict.set_item(name, cell_value_to_py(py, value)?)?;
    }
    Ok(dict.to_object(py))
}

/// Rows that are not dicts are skipped, like non-object JSON rows.
fn py_to_table(records: &Bound<'_, PyList>) -> PyResult<Table> {
    let mut rows = Vec::with_capacity(records.len());
    for item in records.iter() {
        if let Ok(row) = item.downcast::<PyDict>() {
            rows.push(py_to_record(row)?);
        }
    }
    if rows.len() < records.len() {
        log::warn!("grid: skipped {} non-dict rows", records.len() - rows.len());
    }
    Ok(Table::new("grid", rows))
}

fn parse_day(text: Option<&str>) -> PyResult<Option<NaiveDate>> {
    text.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| PyValueError::new_err(format!("Expected YYYY-MM-DD date, got '{}'", s)))
    })
    .transpose()
}

fn highlight_name(highlight: Highlight) -> Option<&'static str> {
    match highlight {
        Highlight::None => None,
        Highlight::Positive => Some("positive"),
        Highlight::Negative => Some("negative"),
    }
}

fn output_to_py(py: Python, output: &GridOutput) -> PyResult<PyObject> {
    let dict = PyDict::new_bound(py);
    dict.set_item("columns", output.columns.clone())?;

    let types = PyDict::new_bound(py);
    for (column, ty) in &output.column_types {
        types.set_item(column, ty.as_str())?;
    }
    dict.set_item("column_types", types)?;

    let rows = PyList::empty_bound(py);
    for record in &output.visible_rows {
        rows.append(record_to_py(py, record)?)?;
    }
    dict.set_item("rows", rows)?;

    dict.set_item("total_filtered_count", output.total_filtered_count)?;
    dict.set_item("aggregates", output.aggregates.clone())?;
    dict.set_item("column_widths", output.column_widths.clone())?;

    let footer = PyList::empty_bound(py);
    for cell in &output.footer {
        let entry = PyDict::new_bound(py);
        entry.set_item("column", &cell.column)?;
        entry.set_item("text", &cell.text)?;
        entry.set_item("highlight", highlight_name(cell.highlight))?;
        footer.append(entry)?;
    }
    dict.set_item("footer", footer)?;

    let options = PyDict::new_bound(py);
    for (column, items) in &output.options {
        let values = PyList::empty_bound(py);
        for item in items {
            values.append((item.label.clone(), cell_value_to_py(py, &item.value)?))?;
        }
        options.set_item(column, values)?;
    }
    dict.set_item("options", options)?;

    dict.set_item("offset", output.page.offset)?;
    dict.set_item("page_size", output.page.size)?;
    dict.set_item("page_count", output.page_count)?;
    Ok(dict.to_object(py))
}

// ============================================================================
// Grid
// ============================================================================

/// Python-exposed Grid class
#[pyclass(name = "Grid", unsendable)]
pub struct PyGrid {
    table: Table,
    pipeline: Pipeline,
    view: ViewState,
}

impl PyGrid {
    fn with_table(table: Table, config: GridConfig) -> PyResult<Self> {
        let mut grid = PyGrid {
            table,
            pipeline: Pipeline::new(config),
            view: ViewState::new(),
        };
        grid.reset_view()?;
        Ok(grid)
    }

    fn reset_view(&mut self) -> PyResult<()> {
        let output = self
            .pipeline
            .run(&self.table, &FilterState::new(), &SortSpec::default(), Page::default())
            .map_err(grid_err)?;
        let config = self.pipeline.config().clone();
        self.view.reset_for(&output.columns, &output.column_types, &config);
        Ok(())
    }
}

#[pymethods]
impl PyGrid {
    /// Create a grid over a list of dicts.
    ///
    /// Args:
    ///     records: list of dict rows; other items are skipped
    ///     enable_sort / enable_filter / enable_summation: feature switches
    ///     option_columns: columns filtered by multiselect
    ///     positive_columns / negative_columns: footer highlights
    #[new]
    #[pyo3(signature = (
        records,
        enable_sort=true,
        enable_filter=true,
        enable_summation=true,
        option_columns=None,
        positive_columns=None,
        negative_columns=None
    ))]
    fn new(
        records: &Bound<'_, PyList>,
        enable_sort: bool,
        enable_filter: bool,
        enable_summation: bool,
        option_columns: Option<Vec<String>>,
        positive_columns: Option<Vec<String>>,
        negative_columns: Option<Vec<String>>,
    ) -> PyResult<Self> {
        let config = GridConfig {
            enable_sort,
            enable_filter,
            enable_summation,
            option_columns: option_columns.unwrap_or_default(),
            highlight_columns: HighlightColumns {
                positive: positive_columns.unwrap_or_default(),
                negative: negative_columns.unwrap_or_default(),
            },
        };
        PyGrid::with_table(py_to_table(records)?, config)
    }

    /// Create a grid from JSON text: records array plus optional config object.
    #[staticmethod]
    #[pyo3(signature = (records_json, config_json=None))]
    fn from_json(records_json: &str, config_json: Option<&str>) -> PyResult<Self> {
        let table = Table::from_json("grid", records_json).map_err(grid_err)?;
        let config = match config_json {
            Some(json) => GridConfig::from_json_str(json).map_err(grid_err)?,
            None => GridConfig::default(),
        };
        PyGrid::with_table(table, config)
    }

    /// Replace the records; filters and sort are reset.
    fn load(&mut self, records: &Bound<'_, PyList>) -> PyResult<()> {
        self.table = py_to_table(records)?;
        self.reset_view()
    }

    fn __len__(&self) -> usize {
        self.table.len()
    }

    fn __repr__(&self) -> String {
        format!("Grid(rows={}, columns={})", self.table.len(), self.table.columns().len())
    }

    fn columns(&self) -> Vec<String> {
        self.table.columns().to_vec()
    }

    /// Display names of the columns, e.g. "Created At"
    fn headers(&self) -> Vec<String> {
        self.table.columns().iter().map(|c| rust_format_header_name(c)).collect()
    }

    /// Free text, or a numeric expression such as ">= 10" or "5 <> 20"
    fn set_text_filter(&mut self, column: &str, text: &str) {
        self.view.set_filter(column, Some(FilterValue::Text(text.to_string())));
    }

    /// True, False, or None for all rows
    #[pyo3(signature = (column, flag=None))]
    fn set_flag_filter(&mut self, column: &str, flag: Option<bool>) {
        self.view.set_filter(column, Some(FilterValue::Flag(flag)));
    }

    /// Inclusive range of "YYYY-MM-DD" days; either side may be None
    #[pyo3(signature = (column, start=None, end=None))]
    fn set_date_range(&mut self, column: &str, start: Option<&str>, end: Option<&str>) -> PyResult<()> {
        let range = FilterValue::DateRange(parse_day(start)?, parse_day(end)?);
        self.view.set_filter(column, Some(range));
        Ok(())
    }

    /// Keep rows whose value is one of `values`; an empty list keeps all
    fn set_options(&mut self, column: &str, values: &Bound<'_, PyList>) -> PyResult<()> {
        let values = values
            .iter()
            .map(|v| py_to_cell_value(&v))
            .collect::<PyResult<Vec<_>>>()?;
        self.view.set_filter(column, Some(FilterValue::In(values)));
        Ok(())
    }

    fn clear_filter(&mut self, column: &str) {
        self.view.set_filter(column, None);
    }

    fn clear_filters(&mut self) {
        self.view.clear_filters();
    }

    /// Cycle a column through ascending, descending and unsorted
    fn toggle_sort(&mut self, column: &str) {
        self.view.toggle_sort(column);
    }

    /// Replace the sort with (column, "asc" | "desc") pairs
    fn set_sort(&mut self, keys: Vec<(String, String)>) -> PyResult<()> {
        let keys = keys
            .into_iter()
            .map(|(column, order)| match order.to_lowercase().as_str() {
                "asc" | "ascending" => Ok(SortKey::new(column, SortOrder::Ascending)),
                "desc" | "descending" => Ok(SortKey::new(column, SortOrder::Descending)),
                other => Err(PyValueError::new_err(format!("Unknown sort order '{}'", other))),
            })
            .collect::<PyResult<Vec<_>>>()?;
        self.view.set_sort(SortSpec::new(keys));
        Ok(())
    }

    fn set_page_size(&mut self, size: usize) {
        self.view.set_page_size(size);
    }

    /// Go to a zero-based page
    fn go_to_page(&mut self, page: usize) {
        self.view.go_to_page(page);
    }

    /// Run the pipeline and return the render data as a dict
    fn run(&mut self, py: Python) -> PyResult<PyObject> {
        let output = self
            .pipeline
            .run(&self.table, &self.view.filters, &self.view.sort, self.view.page)
            .map_err(grid_err)?;
        output_to_py(py, &output)
    }

    /// Stage recompute counters
    fn stats(&self, py: Python) -> PyResult<PyObject> {
        let stats = self.pipeline.stats();
        let dict = PyDict::new_bound(py);
        dict.set_item("passes", stats.passes)?;
        dict.set_item("inferences", stats.inferences)?;
        dict.set_item("filter_runs", stats.filter_runs)?;
        dict.set_item("sort_runs", stats.sort_runs)?;
        dict.set_item("aggregate_runs", stats.aggregate_runs)?;
        Ok(dict.to_object(py))
    }
}

/// Title-case a column key, e.g. "order_total" -> "Order Total"
#[pyfunction]
fn format_header_name(key: &str) -> String {
    rust_format_header_name(key)
}

// ============================================================================
// Module Definition
// ============================================================================

/// Python module for GridTable
#[pymodule]
fn gridtable(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyGrid>()?;
    m.add_function(wrap_pyfunction!(format_header_name, m)?)?;
    Ok(())
}
