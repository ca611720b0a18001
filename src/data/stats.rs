use std::collections::BTreeMap;

use super::model::{AggregateRow, ParsedRow};

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor `n`). NaN below two values.
pub fn population_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

/// One [`AggregateRow`] per row index with at least one numeric contributor,
/// ascending by row index. Text cells are left out, not coerced.
pub fn aggregate(rows: &[ParsedRow]) -> Vec<AggregateRow> {
    let mut by_row: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for row in rows {
        if let Some(v) = row.value.as_f64() {
            by_row.entry(row.row_index).or_default().push(v);
        }
    }

    by_row
        .into_iter()
        .map(|(row_index, values)| AggregateRow {
            row_index,
            mean: mean(&values),
            stdev: population_stdev(&values),
            count: values.len(),
        })
        .collect()
}

/// True when there was at least one numeric value and all of them are zero.
pub fn all_zero(rows: &[ParsedRow]) -> bool {
    let mut numeric = rows.iter().filter_map(|r| r.value.as_f64()).peekable();
    numeric.peek().is_some() && numeric.all(|v| v == 0.0)
}
