/// GridTable command line front end
///
/// Runs one pipeline pass over a JSON array of records and prints the result,
/// either as the JSON render data or as a plain text grid.

use std::io::Read;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use gridtable::{
    format_cell_value, format_header_name, CellValue, FilterValue, GridConfig, GridOutput, Page, Pipeline, SortKey,
    SortSpec, Table, ViewState,
};

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Parser)]
#[command(about = "Filter, sort, sum and page a JSON array of records.")]
struct Args {
    /// JSON file holding an array of records ("-" reads stdin).
    records: PathBuf,

    /// JSON grid configuration (enableSort, optionColumns, highlightColumns, ...).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Text or numeric-expression filter, `column=value` (repeatable).
    #[arg(long = "filter", value_parser = parse_text_filter)]
    filters: Vec<(String, FilterValue)>,

    /// Tri-state boolean filter, `column=true|false` (repeatable).
    #[arg(long = "flag", value_parser = parse_flag_filter)]
    flags: Vec<(String, FilterValue)>,

    /// Inclusive date range, `column=YYYY-MM-DD..YYYY-MM-DD`; either side may be empty.
    #[arg(long = "date", value_parser = parse_date_filter)]
    dates: Vec<(String, FilterValue)>,

    /// Multiselect filter, `column=a,b,c` (repeatable).
    #[arg(long = "in", value_parser = parse_options_filter)]
    options: Vec<(String, FilterValue)>,

    /// Sort key, `column` or `column:desc` (repeatable, in priority order).
    #[arg(long = "sort", value_parser = parse_sort_key)]
    sort: Vec<SortKey>,

    /// Zero-based page to show.
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Rows per page.
    #[arg(long, default_value_t = Page::default().size)]
    rows: usize,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

fn split_assignment(s: &str) -> Result<(String, &str), String> {
    match s.split_once('=') {
        Some((column, value)) if !column.is_empty() => Ok((column.to_string(), value)),
        _ => Err(format!("expected `column=value`, got `{}`", s)),
    }
}

fn parse_text_filter(s: &str) -> Result<(String, FilterValue), String> {
    let (column, value) = split_assignment(s)?;
    Ok((column, FilterValue::Text(value.to_string())))
}

fn parse_flag_filter(s: &str) -> Result<(String, FilterValue), String> {
    let (column, value) = split_assignment(s)?;
    let flag = match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        "" | "all" => None,
        other => return Err(format!("expected true, false or all, got `{}`", other)),
    };
    Ok((column, FilterValue::Flag(flag)))
}

fn parse_day(s: &str) -> Result<Option<NaiveDate>, String> {
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| format!("bad date `{}`: {}", s, e))
}

fn parse_date_filter(s: &str) -> Result<(String, FilterValue), String> {
    let (column, value) = split_assignment(s)?;
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected `start..end`, got `{}`", value))?;
    Ok((column, FilterValue::DateRange(parse_day(start)?, parse_day(end)?)))
}

fn parse_options_filter(s: &str) -> Result<(String, FilterValue), String> {
    let (column, value) = split_assignment(s)?;
    let values: Vec<CellValue> = value.split(',').filter(|v| !v.is_empty()).map(CellValue::from).collect();
    Ok((column, FilterValue::In(values)))
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    match s.rsplit_once(':') {
        Some((column, "desc")) => Ok(SortKey::descending(column)),
        Some((column, "asc")) => Ok(SortKey::ascending(column)),
        _ => Ok(SortKey::ascending(s)),
    }
}

fn read_input(path: &PathBuf) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.chars().take(width).collect()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

fn render_table(output: &GridOutput) -> String {
    let widths: Vec<usize> = output
        .columns
        .iter()
        .map(|c| output.column_widths.get(c).map_or(12, |w| (*w / gridtable::width::CHAR_WIDTH) as usize))
        .collect();

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::new();
    out.push(line(output.columns.iter().map(|c| format_header_name(c)).collect()));
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"));
    for record in &output.visible_rows {
        out.push(line(
            output
                .columns
                .iter()
                .map(|c| {
                    let ty = output.column_types.get(c).copied().unwrap_or_default();
                    format_cell_value(record.value(c), ty)
                })
                .collect(),
        ));
    }
    if !output.footer.is_empty() {
        out.push(line(
            output
                .columns
                .iter()
                .map(|c| {
                    output
                        .footer
                        .iter()
                        .find(|cell| &cell.column == c)
                        .map(|cell| cell.text.clone())
                        .unwrap_or_default()
                })
                .collect(),
        ));
    }
    out.push(format!(
        "page {} of {} ({} matching rows)",
        output.page.current_page() + 1,
        output.page_count,
        output.total_filtered_count
    ));
    out.join("\n")
}

fn main() -> gridtable::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();

    let table = Table::from_json("records", &read_input(&args.records)?)?;
    let config = match &args.config {
        Some(path) => GridConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => GridConfig::default(),
    };
    log::info!("loaded {} records with {} columns", table.len(), table.columns().len());

    let mut view = ViewState::new();
    for (column, value) in args.filters.into_iter().chain(args.flags).chain(args.dates).chain(args.options) {
        view.set_filter(&column, Some(value));
    }
    view.set_sort(SortSpec::new(args.sort));
    view.set_page_size(args.rows);
    view.go_to_page(args.page);

    let mut pipeline = Pipeline::new(config);
    let output = pipeline.run(&table, &view.filters, &view.sort, view.page)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Table => println!("{}", render_table(&output)),
    }
    Ok(())
}
