//! Display formatting for cells, numbers and headers.

use convert_case::{Case, Casing};

use crate::dates::format_date_value;
use crate::inference::ColumnType;
use crate::value::{number_to_string, CellValue};

/// en-US number text: thousands separators, no decimals for integers and
/// exactly two for fractions.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return number_to_string(v);
    }

    let text = if v.fract() == 0.0 {
        format!("{:.0}", v.abs())
    } else {
        format!("{:.2}", v.abs())
    };
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + text.len() / 3 + 1);
    // -0.001 rounds to 0.00 and loses its sign
    if v < 0.0 && text.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Cell text as the grid shows it.
pub fn format_cell_value(value: &CellValue, column_type: ColumnType) -> String {
    match value {
        CellValue::Null => String::new(),
        _ if column_type.is_date() => format_date_value(value),
        CellValue::Number(n) => format_number(*n),
        other => other.to_display_string(),
    }
}

/// Column header text: `order_total` → `Order Total`, `createdAt` → `Created At`.
///
/// Underscores become spaces first, then the key is title-cased, splitting
/// words at case changes and letter/digit boundaries.
pub fn format_header_name(key: &str) -> String {
    key.replace("__", " ").replace('_', " ").to_case(Case::Title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1234.0), "1,234");
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(-1234.5), "-1,234.50");
        assert_eq!(format_number(999.999), "1,000.00");
        assert_eq!(format_number(0.126), "0.13");
        assert_eq!(format_number(-0.001), "0.00");
        assert_eq!(format_number(100.0), "100");
    }

    #[test]
    fn test_format_cell_value() {
        assert_eq!(format_cell_value(&CellValue::Null, ColumnType::Numeric), "");
        assert_eq!(format_cell_value(&CellValue::from(2500), ColumnType::Numeric), "2,500");
        assert_eq!(format_cell_value(&CellValue::from("2500"), ColumnType::Numeric), "2500");
        assert_eq!(format_cell_value(&CellValue::from("2024-01-15"), ColumnType::Date), "Jan 15, 2024");
        assert_eq!(format_cell_value(&CellValue::from("later"), ColumnType::Date), "later");
        assert_eq!(format_cell_value(&CellValue::from(true), ColumnType::Boolean), "true");
    }

    #[test]
    fn test_format_header_name() {
        assert_eq!(format_header_name("order_total"), "Order Total");
        assert_eq!(format_header_name("createdAt"), "Created At");
        assert_eq!(format_header_name("__id__"), "Id");
        assert_eq!(format_header_name("XMLHttpRequest"), "Xml Http Request");
        assert_eq!(format_header_name("unit_priceUSD"), "Unit Price Usd");
        assert_eq!(format_header_name("address2line"), "Address 2 Line");
        assert_eq!(format_header_name("Name"), "Name");
        assert_eq!(format_header_name(""), "");
    }
}
