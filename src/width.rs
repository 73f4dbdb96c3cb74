//! Column width estimation.
//!
//! Widths are pixel estimates derived from the sample only. Text columns size
//! to their content using `min(max(median, p75), p95)` of the formatted cell
//! lengths, which follows typical long values without letting a single
//! outlier widen the column. Boolean, date and numeric columns use a fixed
//! content minimum instead. The result is clamped to a band per type.

use crate::format::{format_cell_value, format_header_name};
use crate::inference::{ColumnType, ColumnTypes};
use crate::table::Record;
use crate::value::CellValue;
use std::collections::HashMap;

/// Approximate pixels per character
pub const CHAR_WIDTH: u32 = 9;
/// Room for the sort indicator when sorting is enabled
pub const SORT_PADDING: u32 = 30;

/// Width per column, in pixels
pub type WidthMap = HashMap<String, u32>;

/// Sizing rules for one column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthBand {
    /// Fixed content width; `None` means size from the sample
    pub content_min: Option<u32>,
    pub min: u32,
    pub max: u32,
}

impl WidthBand {
    pub fn for_type(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Boolean | ColumnType::BinaryBoolean => WidthBand { content_min: Some(50), min: 100, max: 180 },
            ColumnType::Date => WidthBand { content_min: Some(120), min: 180, max: 280 },
            ColumnType::Numeric => WidthBand { content_min: Some(70), min: 130, max: 250 },
            ColumnType::Text => WidthBand { content_min: None, min: 140, max: 400 },
        }
    }
}

/// `min(max(median, p75), p95)` of the lengths; `None` when empty.
pub fn typical_length(lengths: &[usize]) -> Option<usize> {
    if lengths.is_empty() {
        return None;
    }
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    let at = |fraction: f64| sorted[((n as f64 * fraction).floor() as usize).min(n - 1)];

    let median = sorted[n / 2];
    Some(median.max(at(0.75)).min(at(0.95)))
}

/// Width of one column given its header and sampled cell lengths.
pub fn column_width(header_len: usize, cell_lengths: &[usize], column_type: ColumnType, enable_sort: bool) -> u32 {
    let band = WidthBand::for_type(column_type);
    let header_width = header_len as u32 * CHAR_WIDTH;

    let base = match band.content_min {
        Some(content_min) => header_width.max(content_min),
        None => {
            let content_len = typical_length(cell_lengths).unwrap_or(header_len);
            (content_len as u32 * CHAR_WIDTH).max(header_width)
        }
    };

    let padding = if enable_sort { SORT_PADDING } else { 0 };
    (base + padding).clamp(band.min, band.max)
}

/// Estimate every column's width with a caller-supplied cell length.
///
/// Header length is taken from the title-cased display name. An empty sample
/// yields an empty map.
pub fn estimate_column_widths_with<F>(
    sample: &[Record],
    columns: &[String],
    types: &ColumnTypes,
    enable_sort: bool,
    cell_len: F,
) -> WidthMap
where
    F: Fn(&CellValue, ColumnType) -> usize,
{
    let mut widths = WidthMap::new();
    if sample.is_empty() {
        return widths;
    }

    for column in columns {
        let column_type = types.get(column).copied().unwrap_or_default();
        let header_len = format_header_name(column).chars().count();
        let lengths: Vec<usize> = sample
            .iter()
            .map(|r| r.value(column))
            .filter(|v| !v.is_null())
            .map(|v| cell_len(v, column_type))
            .collect();
        widths.insert(column.clone(), column_width(header_len, &lengths, column_type, enable_sort));
    }
    widths
}

/// Estimate widths from the formatted cell text.
pub fn estimate_column_widths(sample: &[Record], columns: &[String], types: &ColumnTypes, enable_sort: bool) -> WidthMap {
    estimate_column_widths_with(sample, columns, types, enable_sort, |value, column_type| {
        format_cell_value(value, column_type).chars().count()
    })
}

/// Scroll area height for a viewport width: small, medium and wide screens.
pub fn scroll_height(viewport_width: u32) -> u32 {
    match viewport_width {
        0..=639 => 400,
        640..=1023 => 500,
        _ => 600,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_short_text_clamps_to_band_minimum() {
        // header "Name" is 36px, content p75/p95 is 9 chars (81px), +30 = 111
        assert_eq!(column_width(4, &[3, 5, 9], ColumnType::Text, true), 140);
    }

    #[test]
    fn test_typical_length_resists_outliers() {
        let mut lengths = vec![20; 30];
        lengths.push(300);
        assert_eq!(typical_length(&lengths), Some(20));
        assert_eq!(column_width(4, &lengths, ColumnType::Text, true), 210);

        assert_eq!(typical_length(&[30; 10]), Some(30));
        assert_eq!(column_width(4, &[30; 10], ColumnType::Text, true), 300);
        assert_eq!(column_width(4, &[80; 10], ColumnType::Text, true), 400);
        assert_eq!(typical_length(&[]), None);
    }

    #[test]
    fn test_typed_columns_use_fixed_content_widths() {
        assert_eq!(column_width(4, &[], ColumnType::Boolean, true), 100);
        assert_eq!(column_width(4, &[], ColumnType::BinaryBoolean, false), 100);
        assert_eq!(column_width(4, &[], ColumnType::Date, true), 180);
        assert_eq!(column_width(4, &[], ColumnType::Numeric, true), 130);
        // long headers widen typed columns up to the band maximum
        assert_eq!(column_width(20, &[], ColumnType::Numeric, true), 210);
        assert_eq!(column_width(40, &[], ColumnType::Numeric, true), 250);
    }

    #[test]
    fn test_sort_padding() {
        assert_eq!(column_width(1, &[20], ColumnType::Text, true), 210);
        assert_eq!(column_width(1, &[20], ColumnType::Text, false), 180);
    }

    #[test]
    fn test_text_without_values_uses_header_length() {
        assert_eq!(column_width(30, &[], ColumnType::Text, false), 270);
    }

    #[test]
    fn test_estimate_column_widths() {
        let sample = vec![
            record! { "customer_name" => "Alexandra Johnson", "paid" => true, "total" => 1234.5 },
            record! { "customer_name" => "Bo", "paid" => false, "total" => 99 },
        ];
        let columns: Vec<String> = ["customer_name", "paid", "total"].iter().map(|c| c.to_string()).collect();
        let types = crate::inference::infer_column_types(&sample, &columns);

        let widths = estimate_column_widths(&sample, &columns, &types, true);
        // header "Customer Name" is 13 chars, p75 content is 17 chars: 153 + 30
        assert_eq!(widths["customer_name"], 183);
        assert_eq!(widths["paid"], 100);
        assert_eq!(widths["total"], 130);

        let again = estimate_column_widths(&sample, &columns, &types, true);
        assert_eq!(widths, again);
        assert!(estimate_column_widths(&[], &columns, &types, true).is_empty());
    }

    #[test]
    fn test_scroll_height() {
        assert_eq!(scroll_height(320), 400);
        assert_eq!(scroll_height(640), 500);
        assert_eq!(scroll_height(1920), 600);
    }
}
