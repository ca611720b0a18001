use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell read from a profile file
// ---------------------------------------------------------------------------

/// A cell is numeric when its text parses as a float, otherwise the raw text
/// is kept as-is. Nothing is ever dropped at this level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Numeric(f64),
    Text(String),
}

impl CellValue {
    /// Coerce raw field text. Surrounding whitespace is ignored for the
    /// numeric attempt but preserved in the text fallback.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) => CellValue::Numeric(v),
            Err(_) => CellValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Numeric(v) => Some(*v),
            CellValue::Text(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Numeric(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dialect – per-file delimiter and header guess
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub has_header: bool,
}

impl Dialect {
    /// Printable name of the delimiter for log messages.
    pub fn delimiter_name(&self) -> &'static str {
        match self.delimiter {
            b';' => "semicolon",
            b',' => "comma",
            b'\t' => "tab",
            _ => "other",
        }
    }
}

// ---------------------------------------------------------------------------
// ParsedRow / ParsedFile – RowParser output
// ---------------------------------------------------------------------------

/// One Y value of one file. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub source: String,
    /// 0-based position among the file's data rows (header excluded).
    pub row_index: usize,
    pub value: CellValue,
}

/// Header texts found at the configured X and Y positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPair {
    pub x: String,
    pub y: String,
}

/// Everything the parser pulled out of a single file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub filename: String,
    pub dialect: Dialect,
    pub headers: Option<HeaderPair>,
    /// X values keyed by row index, parallel to `rows`.
    pub x_values: Vec<(usize, CellValue)>,
    pub rows: Vec<ParsedRow>,
    /// Positions of data rows skipped because they lacked a configured column.
    pub short_rows: Vec<usize>,
}

impl ParsedFile {
    /// Number of row positions the file spans, counting skipped rows.
    pub fn row_span(&self) -> usize {
        let last_kept = self.rows.last().map(|r| r.row_index + 1).unwrap_or(0);
        let last_short = self.short_rows.last().map(|i| i + 1).unwrap_or(0);
        last_kept.max(last_short)
    }
}

// ---------------------------------------------------------------------------
// ReferenceHeaders – labels fixed by the first parsed file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHeaders {
    pub x: String,
    pub y: String,
    /// False when the labels were synthesized because the first file had no
    /// header row; mismatch detection is off in that case.
    pub from_header: bool,
}

impl ReferenceHeaders {
    pub fn from_pair(pair: &HeaderPair) -> Self {
        ReferenceHeaders {
            x: pair.x.clone(),
            y: pair.y.clone(),
            from_header: true,
        }
    }

    pub fn fallback(x_col: usize, y_col: usize) -> Self {
        ReferenceHeaders {
            x: format!("Column {x_col}"),
            y: format!("Column {y_col}"),
            from_header: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AggregateRow – StatsAggregator output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateRow {
    pub row_index: usize,
    pub mean: f64,
    /// Population standard deviation; NaN with fewer than 2 contributors.
    pub stdev: f64,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_numbers_and_text() {
        assert_eq!(CellValue::coerce("3.5"), CellValue::Numeric(3.5));
        assert_eq!(CellValue::coerce(" 12 "), CellValue::Numeric(12.0));
        assert_eq!(CellValue::coerce("1e3"), CellValue::Numeric(1000.0));
        assert_eq!(CellValue::coerce("n/a"), CellValue::Text("n/a".into()));
        assert_eq!(CellValue::coerce(""), CellValue::Text(String::new()));
    }

    #[test]
    fn row_span_counts_skipped_tail() {
        let file = ParsedFile {
            filename: "a.csv".into(),
            dialect: Dialect { delimiter: b',', has_header: false },
            headers: None,
            x_values: vec![(0, CellValue::Numeric(1.0))],
            rows: vec![ParsedRow {
                source: "a.csv".into(),
                row_index: 0,
                value: CellValue::Numeric(2.0),
            }],
            short_rows: vec![3],
        };
        assert_eq!(file.row_span(), 4);
    }
}
