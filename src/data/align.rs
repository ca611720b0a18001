use super::model::{CellValue, ParsedFile, ParsedRow, ReferenceHeaders};
use crate::config::ColumnSpec;
use crate::error::HeaderMismatch;

// ---------------------------------------------------------------------------
// AggregationContext – running state of one pipeline run
// ---------------------------------------------------------------------------

/// Accumulates parsed files in processing order.
///
/// Rows are aligned by position, never by X value. The X series follows the
/// running maximum row count: the first file to supply an X value for a row
/// index fixes it. A position no file has supplied yet stays `None`.
#[derive(Debug, Clone, Default)]
pub struct AggregationContext {
    reference: Option<ReferenceHeaders>,
    x_series: Vec<Option<CellValue>>,
    rows: Vec<ParsedRow>,
    files: Vec<String>,
}

impl AggregationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one file. Returns the Y heading mismatch against the reference,
    /// if any; the file's data is merged either way.
    pub fn absorb(&mut self, file: ParsedFile, columns: ColumnSpec) -> Option<HeaderMismatch> {
        let mismatch = match (&self.reference, &file.headers) {
            (Some(reference), Some(pair)) if reference.from_header && pair.y != reference.y => {
                Some(HeaderMismatch {
                    file: file.filename.clone(),
                    found: pair.y.clone(),
                    expected: reference.y.clone(),
                })
            }
            _ => None,
        };
        if self.reference.is_none() {
            self.reference = Some(match &file.headers {
                Some(pair) => ReferenceHeaders::from_pair(pair),
                None => ReferenceHeaders::fallback(columns.x, columns.y),
            });
        }

        let span = file.row_span();
        for (row_index, x) in file.x_values {
            if row_index >= self.x_series.len() {
                self.x_series.resize(row_index + 1, None);
            }
            let slot = &mut self.x_series[row_index];
            if slot.is_none() {
                *slot = Some(x);
            }
        }
        // Skipped tail rows still occupy positions.
        if span > self.x_series.len() {
            self.x_series.resize(span, None);
        }

        self.rows.extend(file.rows);
        self.files.push(file.filename);
        mismatch
    }

    pub fn reference(&self) -> Option<&ReferenceHeaders> {
        self.reference.as_ref()
    }

    pub fn x_series(&self) -> &[Option<CellValue>] {
        &self.x_series
    }

    pub fn rows(&self) -> &[ParsedRow] {
        &self.rows
    }

    /// Filenames of absorbed files, in processing order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dialect, HeaderPair};

    fn file(name: &str, header: Option<(&str, &str)>, xs: &[f64], ys: &[f64]) -> ParsedFile {
        ParsedFile {
            filename: name.into(),
            dialect: Dialect { delimiter: b',', has_header: header.is_some() },
            headers: header.map(|(x, y)| HeaderPair { x: x.into(), y: y.into() }),
            x_values: xs.iter().enumerate().map(|(i, &x)| (i, CellValue::Numeric(x))).collect(),
            rows: ys
                .iter()
                .enumerate()
                .map(|(i, &y)| ParsedRow {
                    source: name.into(),
                    row_index: i,
                    value: CellValue::Numeric(y),
                })
                .collect(),
            short_rows: Vec::new(),
        }
    }

    #[test]
    fn first_file_sets_reference_and_later_mismatch_is_reported() {
        let mut ctx = AggregationContext::new();
        let cols = ColumnSpec::default();
        assert!(ctx.absorb(file("a", Some(("r", "n")), &[1.0], &[2.0]), cols).is_none());
        let mismatch = ctx.absorb(file("b", Some(("r", "count")), &[1.0], &[3.0]), cols);
        assert_eq!(
            mismatch,
            Some(HeaderMismatch { file: "b".into(), found: "count".into(), expected: "n".into() })
        );
        assert_eq!(ctx.reference().unwrap().y, "n");
        assert_eq!(ctx.rows().len(), 2);
        assert_eq!(ctx.files(), ["a", "b"]);
    }

    #[test]
    fn x_series_grows_with_the_longest_file() {
        let mut ctx = AggregationContext::new();
        let cols = ColumnSpec::default();
        ctx.absorb(file("a", None, &[0.0, 1.0, 2.0, 3.0, 4.0], &[1.0; 5]), cols);
        ctx.absorb(file("b", None, &[9.0, 9.0, 9.0, 9.0, 9.0], &[1.0; 5]), cols);
        ctx.absorb(
            file("c", None, &[7.0, 7.0, 7.0, 7.0, 7.0, 5.0, 6.0], &[1.0; 7]),
            cols,
        );
        let xs: Vec<f64> = ctx.x_series().iter().map(|x| x.as_ref().unwrap().as_f64().unwrap()).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn headerless_reference_disables_mismatch_checks() {
        let mut ctx = AggregationContext::new();
        let cols = ColumnSpec { x: 1, y: 4 };
        ctx.absorb(file("a", None, &[0.0], &[1.0]), cols);
        assert_eq!(ctx.reference().unwrap().y, "Column 4");
        assert!(ctx.absorb(file("b", Some(("r", "n")), &[0.0], &[1.0]), cols).is_none());
    }

    #[test]
    fn gaps_in_the_x_series_stay_empty() {
        let mut ctx = AggregationContext::new();
        let mut f = file("a", None, &[], &[]);
        f.x_values = vec![(0, CellValue::Numeric(0.0)), (2, CellValue::Numeric(2.0))];
        f.short_rows = vec![1, 3];
        ctx.absorb(f, ColumnSpec::default());
        assert_eq!(ctx.x_series().len(), 4);
        assert!(ctx.x_series()[1].is_none());
        assert!(ctx.x_series()[3].is_none());

        let mut g = file("b", None, &[], &[]);
        g.x_values = vec![(1, CellValue::Numeric(1.0)), (2, CellValue::Numeric(8.0))];
        ctx.absorb(g, ColumnSpec::default());
        assert_eq!(ctx.x_series()[1], Some(CellValue::Numeric(1.0)));
        assert_eq!(ctx.x_series()[2], Some(CellValue::Numeric(2.0)));
    }
}
