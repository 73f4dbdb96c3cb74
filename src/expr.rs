//! Numeric filter expressions.
//!
//! Filter inputs on numeric columns accept a small operator language:
//! - `10 <> 20` (inclusive range, bounds may be given in either order)
//! - `<= 10`, `>= 10`, `< 10`, `> 10`, `= 10`
//! - a bare number such as `12`, matched as a substring of the cell text so
//!   partial input already narrows the rows (`12` matches `1200`)
//!
//! Numbers take an optional `+`/`-` sign, which may be separated from the
//! digits by whitespace (`< - 10`). Anything else falls back to a
//! case-insensitive text search; parsing never fails.

use crate::value::CellValue;
use serde::{Deserialize, Serialize};

/// A parsed numeric filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NumericFilter {
    Range { min: f64, max: f64 },
    LessOrEqual { value: f64 },
    GreaterOrEqual { value: f64 },
    LessThan { value: f64 },
    GreaterThan { value: f64 },
    Equal { value: f64 },
    /// Bare number: substring of the literal cell text
    Contains { value: String },
    /// Not numeric at all: case-insensitive substring
    Text { value: String },
}

/// Discriminant of a [`NumericFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOpKind {
    Range,
    LessOrEqual,
    GreaterOrEqual,
    LessThan,
    GreaterThan,
    Equal,
    Contains,
    Text,
}

impl NumericFilter {
    pub fn kind(&self) -> FilterOpKind {
        match self {
            NumericFilter::Range { .. } => FilterOpKind::Range,
            NumericFilter::LessOrEqual { .. } => FilterOpKind::LessOrEqual,
            NumericFilter::GreaterOrEqual { .. } => FilterOpKind::GreaterOrEqual,
            NumericFilter::LessThan { .. } => FilterOpKind::LessThan,
            NumericFilter::GreaterThan { .. } => FilterOpKind::GreaterThan,
            NumericFilter::Equal { .. } => FilterOpKind::Equal,
            NumericFilter::Contains { .. } => FilterOpKind::Contains,
            NumericFilter::Text { .. } => FilterOpKind::Text,
        }
    }

    /// Apply the filter to a cell.
    ///
    /// Comparisons require the cell to coerce to a number; cells that do not
    /// fail them. The two substring forms work on the cell text.
    pub fn matches(&self, cell: &CellValue) -> bool {
        match self {
            NumericFilter::Contains { value } => cell.to_display_string().contains(value.as_str()),
            NumericFilter::Text { value } => cell
                .to_display_string()
                .to_lowercase()
                .contains(&value.to_lowercase()),
            op => match cell.to_number() {
                Some(n) => compare(op, n),
                None => false,
            },
        }
    }
}

fn compare(op: &NumericFilter, n: f64) -> bool {
    match op {
        NumericFilter::Range { min, max } => n >= *min && n <= *max,
        NumericFilter::LessOrEqual { value } => n <= *value,
        NumericFilter::GreaterOrEqual { value } => n >= *value,
        NumericFilter::LessThan { value } => n < *value,
        NumericFilter::GreaterThan { value } => n > *value,
        NumericFilter::Equal { value } => n == *value,
        NumericFilter::Contains { .. } | NumericFilter::Text { .. } => false,
    }
}

/// Cursor over the filter input
struct Scanner {
    input: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Scanner {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Consume `token` if the input continues with it.
    fn eat(&mut self, token: &str) -> bool {
        let len = token.chars().count();
        let matches = self.pos + len <= self.input.len()
            && self.input[self.pos..self.pos + len].iter().copied().eq(token.chars());
        if matches {
            self.pos += len;
        }
        matches
    }

    fn read_digits(&mut self, out: &mut String) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.advance();
                count += 1;
            } else {
                break;
            }
        }
        count
    }

    /// Read `[+-]? \s* digits ('.' digits?)?`.
    fn read_signed_number(&mut self) -> Option<f64> {
        let start = self.pos;
        let mut num_str = String::new();

        if let Some(sign @ ('+' | '-')) = self.peek() {
            self.advance();
            num_str.push(sign);
            self.skip_whitespace();
        }

        if self.read_digits(&mut num_str) == 0 {
            self.pos = start;
            return None;
        }

        if self.peek() == Some('.') {
            self.advance();
            let mut fraction = String::new();
            if self.read_digits(&mut fraction) > 0 {
                num_str.push('.');
                num_str.push_str(&fraction);
            }
        }

        match num_str.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.pos = start;
                None
            }
        }
    }
}

/// Comparison operators, longest first so `<=` is not read as `<`.
const OPERATORS: &[(&str, fn(f64) -> NumericFilter)] = &[
    ("<=", |value| NumericFilter::LessOrEqual { value }),
    (">=", |value| NumericFilter::GreaterOrEqual { value }),
    ("<", |value| NumericFilter::LessThan { value }),
    (">", |value| NumericFilter::GreaterThan { value }),
    ("=", |value| NumericFilter::Equal { value }),
];

/// Parse a numeric column's filter input.
///
/// Returns `None` for empty or all-whitespace input (no filter).
pub fn parse_numeric_filter(input: &str) -> Option<NumericFilter> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(
        parse_range(trimmed)
            .or_else(|| parse_comparison(trimmed))
            .or_else(|| parse_bare_number(trimmed))
            .unwrap_or_else(|| NumericFilter::Text { value: trimmed.to_string() }),
    )
}

fn parse_range(input: &str) -> Option<NumericFilter> {
    let mut scanner = Scanner::new(input);
    let a = scanner.read_signed_number()?;
    scanner.skip_whitespace();
    if !scanner.eat("<>") {
        return None;
    }
    scanner.skip_whitespace();
    let b = scanner.read_signed_number()?;
    if !scanner.at_end() {
        return None;
    }
    Some(NumericFilter::Range { min: a.min(b), max: a.max(b) })
}

fn parse_comparison(input: &str) -> Option<NumericFilter> {
    OPERATORS.iter().find_map(|(token, build)| {
        let mut scanner = Scanner::new(input);
        if !scanner.eat(token) {
            return None;
        }
        scanner.skip_whitespace();
        let value = scanner.read_signed_number()?;
        scanner.at_end().then(|| build(value))
    })
}

fn parse_bare_number(input: &str) -> Option<NumericFilter> {
    let mut scanner = Scanner::new(input);
    scanner.read_signed_number()?;
    if !scanner.at_end() {
        return None;
    }
    let value: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    Some(NumericFilter::Contains { value })
}
