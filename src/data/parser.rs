use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use super::model::{CellValue, Dialect, HeaderPair, ParsedFile, ParsedRow};
use crate::config::ColumnSpec;
use crate::report::{Reporter, Severity};

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read a whole file as text. Invalid UTF-8 is replaced rather than rejected
/// and a leading byte-order mark is removed. The handle is closed on return.
pub fn read_content(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

// ---------------------------------------------------------------------------
// Column extraction
// ---------------------------------------------------------------------------

/// Extract the configured X and Y columns from `content`.
///
/// Every data row yields one [`ParsedRow`] holding the coerced Y value and one
/// X entry at the same row index. Rows missing either column are skipped with
/// a warning; their positions still count, so alignment stays positional.
pub fn parse_content(
    filename: &str,
    content: &str,
    dialect: Dialect,
    columns: ColumnSpec,
    reporter: &mut dyn Reporter,
) -> ParsedFile {
    let mut reader = ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let (xi, yi) = (columns.x_index(), columns.y_index());
    let mut records = reader.records();

    let mut headers = None;
    if dialect.has_header {
        match records.next() {
            Some(Ok(record)) => {
                if record.get(xi).is_none() || record.get(yi).is_none() {
                    reporter.report(
                        Severity::Warn,
                        &format!(
                            "{filename}: header row has {} fields, column headings missing",
                            record.len()
                        ),
                    );
                }
                headers = Some(HeaderPair {
                    x: record.get(xi).unwrap_or("").to_string(),
                    y: record.get(yi).unwrap_or("").to_string(),
                });
            }
            Some(Err(err)) => {
                reporter.report(Severity::Warn, &format!("{filename}: unreadable header row: {err}"));
            }
            None => {}
        }
    }

    let mut parsed = ParsedFile {
        filename: filename.to_string(),
        dialect,
        headers,
        x_values: Vec::new(),
        rows: Vec::new(),
        short_rows: Vec::new(),
    };

    for (row_index, result) in records.enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                reporter.report(
                    Severity::Warn,
                    &format!("{filename}: skipping row {}: {err}", row_index + 1),
                );
                parsed.short_rows.push(row_index);
                continue;
            }
        };
        let (Some(x), Some(y)) = (record.get(xi), record.get(yi)) else {
            reporter.report(
                Severity::Warn,
                &format!(
                    "{filename}: skipping row {}: {} fields, column {} required",
                    row_index + 1,
                    record.len(),
                    columns.x.max(columns.y)
                ),
            );
            parsed.short_rows.push(row_index);
            continue;
        };
        parsed.x_values.push((row_index, CellValue::coerce(x)));
        parsed.rows.push(ParsedRow {
            source: parsed.filename.clone(),
            row_index,
            value: CellValue::coerce(y),
        });
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str, dialect: Dialect, columns: ColumnSpec) -> (ParsedFile, Vec<String>) {
        let mut warnings = Vec::new();
        let mut sink = |s: Severity, m: &str| {
            if s == Severity::Warn {
                warnings.push(m.to_string());
            }
        };
        let file = parse_content("p.csv", content, dialect, columns, &mut sink);
        (file, warnings)
    }

    const SEMI_HEADER: Dialect = Dialect { delimiter: b';', has_header: true };

    #[test]
    fn extracts_headers_and_coerced_values() {
        let (file, warnings) = parse(
            "Radius;Label;Inters.\n10;a;3\n20;b;NaN?\n",
            SEMI_HEADER,
            ColumnSpec { x: 1, y: 3 },
        );
        assert!(warnings.is_empty());
        assert_eq!(
            file.headers,
            Some(HeaderPair { x: "Radius".into(), y: "Inters.".into() })
        );
        assert_eq!(file.x_values, vec![(0, CellValue::Numeric(10.0)), (1, CellValue::Numeric(20.0))]);
        assert_eq!(file.rows[0].value, CellValue::Numeric(3.0));
        assert_eq!(file.rows[1].value, CellValue::Text("NaN?".into()));
        assert_eq!(file.rows[1].row_index, 1);
        assert_eq!(file.rows[1].source, "p.csv");
    }

    #[test]
    fn short_rows_are_skipped_but_keep_their_position() {
        let dialect = Dialect { delimiter: b',', has_header: false };
        let (file, warnings) = parse("1,2\n3\n5,6\n", dialect, ColumnSpec::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(file.short_rows, vec![1]);
        let indices: Vec<usize> = file.rows.iter().map(|r| r.row_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(file.row_span(), 3);
    }

    #[test]
    fn headerless_file_has_no_headers() {
        let dialect = Dialect { delimiter: b'\t', has_header: false };
        let (file, _) = parse("0\t1\n1\t4\n", dialect, ColumnSpec::default());
        assert_eq!(file.headers, None);
        assert_eq!(file.rows.len(), 2);
    }

    #[test]
    fn read_content_strips_bom_and_tolerates_bad_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bom.csv");
        std::fs::write(&path, b"\xef\xbb\xbfr;n\n1;\xff\n").unwrap();
        let text = read_content(&path).unwrap();
        assert!(text.starts_with("r;n"));
        assert!(text.contains('\u{fffd}'));
        assert!(read_content(&tmp.path().join("missing.csv")).is_err());
    }
}
