use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::OutputSelection;
use crate::data::align::AggregationContext;
use crate::data::model::{AggregateRow, CellValue};

// ---------------------------------------------------------------------------
// Result data model
// ---------------------------------------------------------------------------

/// A titled, rectangular table. `None` cells are empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<CellValue>>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)?.as_ref()
    }

    /// Write as CSV with a heading row. Empty cells become empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.columns).context("writing table heading")?;
        for row in &self.rows {
            out.write_record(row.iter().map(render_cell))
                .with_context(|| format!("writing table {}", self.title))?;
        }
        out.flush().context("flushing table")?;
        Ok(())
    }
}

fn render_cell(cell: &Option<CellValue>) -> String {
    match cell {
        Some(CellValue::Numeric(v)) if v.is_nan() => String::new(),
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(render_cell).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                rendered
                    .iter()
                    .filter_map(|r| r.get(i).map(|s| s.chars().count()))
                    .chain(std::iter::once(c.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        writeln!(f, "{}", self.title)?;
        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:>w$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };
        writeln!(f, "{}", line(self.columns.as_slice()))?;
        for row in &rendered {
            writeln!(f, "{}", line(row.as_slice()))?;
        }
        Ok(())
    }
}

/// Data triple for a mean ± SD line plot. NaN marks a missing value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSeries {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub mean: Vec<f64>,
    pub stdev: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTables {
    pub merged: Option<Table>,
    pub statistics: Option<Table>,
    pub plot: Option<PlotSeries>,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Assemble the tables `selection` asks for. `stats` is only read when the
/// statistics table is requested.
pub fn build(
    identifier: &str,
    selection: OutputSelection,
    ctx: &AggregationContext,
    stats: &[AggregateRow],
) -> ResultTables {
    let mut tables = ResultTables::default();
    if selection.wants_merged() {
        tables.merged = Some(merged_table(identifier, ctx));
    }
    if selection.wants_statistics() {
        tables.statistics = Some(statistics_table(identifier, ctx, stats));
        tables.plot = Some(plot_series(identifier, ctx, stats));
    }
    tables
}

fn x_label(ctx: &AggregationContext) -> String {
    ctx.reference().map(|r| r.x.clone()).unwrap_or_default()
}

/// One row per X series entry, one column per absorbed file.
pub fn merged_table(identifier: &str, ctx: &AggregationContext) -> Table {
    let file_column: HashMap<&str, usize> = ctx
        .files()
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i + 1))
        .collect();

    let width = ctx.files().len() + 1;
    let mut rows: Vec<Vec<Option<CellValue>>> = ctx
        .x_series()
        .iter()
        .map(|x| {
            let mut row = vec![None; width];
            row[0] = x.clone();
            row
        })
        .collect();

    for parsed in ctx.rows() {
        let Some(&col) = file_column.get(parsed.source.as_str()) else {
            continue;
        };
        if let Some(row) = rows.get_mut(parsed.row_index) {
            row[col] = Some(parsed.value.clone());
        }
    }

    let mut columns = Vec::with_capacity(width);
    columns.push(x_label(ctx));
    columns.extend(ctx.files().iter().cloned());

    Table {
        title: format!("MergedFiles{identifier}"),
        columns,
        rows,
    }
}

/// Columns X, Mean, StdDev, N. Rows without numeric contributors keep Mean
/// and StdDev empty with N = 0; StdDev is empty below two contributors.
pub fn statistics_table(identifier: &str, ctx: &AggregationContext, stats: &[AggregateRow]) -> Table {
    let by_row: HashMap<usize, &AggregateRow> = stats.iter().map(|s| (s.row_index, s)).collect();

    let rows = ctx
        .x_series()
        .iter()
        .enumerate()
        .map(|(i, x)| match by_row.get(&i) {
            Some(s) => vec![
                x.clone(),
                Some(CellValue::Numeric(s.mean)),
                (!s.stdev.is_nan()).then_some(CellValue::Numeric(s.stdev)),
                Some(CellValue::Numeric(s.count as f64)),
            ],
            None => vec![x.clone(), None, None, Some(CellValue::Numeric(0.0))],
        })
        .collect();

    Table {
        title: format!("Stats{identifier}"),
        columns: vec![x_label(ctx), "Mean".into(), "StdDev".into(), "N".into()],
        rows,
    }
}

/// Points whose X value is numeric, with the matching mean and SD.
pub fn plot_series(identifier: &str, ctx: &AggregationContext, stats: &[AggregateRow]) -> PlotSeries {
    let by_row: HashMap<usize, &AggregateRow> = stats.iter().map(|s| (s.row_index, s)).collect();
    let mut series = PlotSeries {
        title: identifier.to_string(),
        x_label: x_label(ctx),
        y_label: "Mean\u{00B1}SD".to_string(),
        x: Vec::new(),
        mean: Vec::new(),
        stdev: Vec::new(),
    };

    for (i, x) in ctx.x_series().iter().enumerate() {
        let Some(x) = x.as_ref().and_then(CellValue::as_f64) else {
            continue;
        };
        let (mean, stdev) = by_row.get(&i).map_or((f64::NAN, f64::NAN), |s| (s.mean, s.stdev));
        series.x.push(x);
        series.mean.push(mean);
        series.stdev.push(stdev);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnSpec;
    use crate::data::model::{Dialect, HeaderPair, ParsedFile, ParsedRow};
    use crate::data::stats::aggregate;

    fn file(name: &str, ys: &[CellValue]) -> ParsedFile {
        ParsedFile {
            filename: name.into(),
            dialect: Dialect { delimiter: b',', has_header: true },
            headers: Some(HeaderPair { x: "Radius".into(), y: "N".into() }),
            x_values: (0..ys.len()).map(|i| (i, CellValue::Numeric(i as f64 * 10.0))).collect(),
            rows: ys
                .iter()
                .enumerate()
                .map(|(i, v)| ParsedRow { source: name.into(), row_index: i, value: v.clone() })
                .collect(),
            short_rows: Vec::new(),
        }
    }

    fn context() -> AggregationContext {
        use CellValue::{Numeric, Text};
        let mut ctx = AggregationContext::new();
        let cols = ColumnSpec::default();
        ctx.absorb(file("a.csv", &[Numeric(1.0), Numeric(2.0)]), cols);
        ctx.absorb(file("b.csv", &[Numeric(3.0), Text("n/a".into()), Numeric(5.0)]), cols);
        ctx
    }

    #[test]
    fn merged_table_layout() {
        let ctx = context();
        let table = merged_table("X", &ctx);
        assert_eq!(table.title, "MergedFilesX");
        assert_eq!(table.columns, ["Radius", "a.csv", "b.csv"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.cell(1, "b.csv"), Some(&CellValue::Text("n/a".into())));
        assert_eq!(table.cell(2, "a.csv"), None);
        assert_eq!(table.cell(2, "Radius"), Some(&CellValue::Numeric(20.0)));
    }

    #[test]
    fn statistics_table_blanks() {
        let ctx = context();
        let stats = aggregate(ctx.rows());
        let table = statistics_table("X", &ctx, &stats);
        assert_eq!(table.columns, ["Radius", "Mean", "StdDev", "N"]);
        assert_eq!(table.cell(0, "Mean"), Some(&CellValue::Numeric(2.0)));
        assert_eq!(table.cell(0, "StdDev"), Some(&CellValue::Numeric(1.0)));
        assert_eq!(table.cell(1, "StdDev"), None);
        assert_eq!(table.cell(1, "N"), Some(&CellValue::Numeric(1.0)));
    }

    #[test]
    fn zero_contributor_rows_use_empty_cells() {
        use CellValue::{Numeric, Text};
        let mut ctx = AggregationContext::new();
        ctx.absorb(file("a.csv", &[Numeric(1.0), Text("-".into())]), ColumnSpec::default());
        let stats = aggregate(ctx.rows());
        let table = statistics_table("X", &ctx, &stats);
        assert_eq!(table.rows[1], vec![Some(Numeric(10.0)), None, None, Some(Numeric(0.0))]);
    }

    #[test]
    fn selection_controls_outputs() {
        let ctx = context();
        let stats = aggregate(ctx.rows());
        let merged = build("X", OutputSelection::MergedOnly, &ctx, &stats);
        assert!(merged.merged.is_some() && merged.statistics.is_none() && merged.plot.is_none());
        let both = build("X", OutputSelection::Both, &ctx, &stats);
        let plot = both.plot.unwrap();
        assert_eq!(plot.x, vec![0.0, 10.0, 20.0]);
        assert_eq!(plot.mean[2], 5.0);
        assert!(plot.stdev[2].is_nan());
        assert_eq!(plot.y_label, "Mean\u{00B1}SD");
    }

    #[test]
    fn csv_export() {
        let ctx = context();
        let stats = aggregate(ctx.rows());
        let mut buf = Vec::new();
        statistics_table("X", &ctx, &stats).write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Radius,Mean,StdDev,N\n0,2,1,2\n10,2,,1\n20,5,,1\n");
    }
}
