use csv::ReaderBuilder;
use thiserror::Error;

use super::model::Dialect;

/// Bytes of leading content inspected per file.
pub const SAMPLE_LEN: usize = 1024;

/// Candidate delimiters, in order of preference when several fit equally well.
const CANDIDATES: [u8; 3] = [b',', b'\t', b';'];

/// Share of sample lines that must agree on the delimiter count.
const MIN_CONSISTENCY: f64 = 0.9;

/// Data rows compared against the first row when guessing a header.
const HEADER_PROBE_ROWS: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SniffError {
    #[error("file is empty")]
    Empty,
    #[error("Could not determine delimiter")]
    NoDelimiter,
}

/// Infer delimiter and header presence from the start of `content`.
pub fn sniff(content: &str) -> Result<Dialect, SniffError> {
    let lines = sample_lines(content);
    if lines.is_empty() {
        return Err(SniffError::Empty);
    }
    let delimiter = guess_delimiter(&lines).ok_or(SniffError::NoDelimiter)?;
    let has_header = guess_header(&lines, delimiter);
    Ok(Dialect { delimiter, has_header })
}

/// Non-blank complete lines of the first [`SAMPLE_LEN`] bytes. A line cut by
/// the sample boundary is dropped unless it is the only one.
fn sample_lines(content: &str) -> Vec<&str> {
    let mut end = content.len().min(SAMPLE_LEN);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &content[..end];
    let truncated = end < content.len();

    let mut lines: Vec<&str> = sample.lines().collect();
    if truncated && lines.len() > 1 && !sample.ends_with('\n') {
        lines.pop();
    }
    lines.retain(|l| !l.trim().is_empty());
    lines
}

/// Occurrences of `delimiter` outside double-quoted sections.
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            quoted = !quoted;
        } else if b == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

/// Pick the candidate whose per-line count is most consistent. A candidate
/// whose modal count is zero never qualifies.
fn guess_delimiter(lines: &[&str]) -> Option<u8> {
    let mut best: Option<(u8, f64)> = None;

    for &delimiter in &CANDIDATES {
        let counts: Vec<usize> = lines.iter().map(|l| count_unquoted(l, delimiter)).collect();
        let modal = modal_count(&counts);
        if modal == 0 {
            continue;
        }
        let agreeing = counts.iter().filter(|&&c| c == modal).count();
        let consistency = agreeing as f64 / counts.len() as f64;
        if consistency < MIN_CONSISTENCY {
            continue;
        }
        if best.map_or(true, |(_, score)| consistency > score) {
            best = Some((delimiter, consistency));
        }
    }

    best.map(|(d, _)| d)
}

/// Most frequent value; ties go to the larger count.
fn modal_count(counts: &[usize]) -> usize {
    let mut freq: std::collections::BTreeMap<usize, usize> = std::collections::BTreeMap::new();
    for &c in counts {
        *freq.entry(c).or_default() += 1;
    }
    freq.into_iter()
        .max_by(|(ca, na), (cb, nb)| na.cmp(nb).then(ca.cmp(cb)))
        .map(|(c, _)| c)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Length(usize),
}

fn kind_of(field: &str) -> ColumnKind {
    if field.trim().parse::<f64>().is_ok() {
        ColumnKind::Numeric
    } else {
        ColumnKind::Length(field.chars().count())
    }
}

/// Vote per column: a first row that looks unlike the consistently typed
/// rows below it counts for a header, one that looks alike counts against.
fn guess_header(lines: &[&str], delimiter: u8) -> bool {
    let joined = lines.join("\n");
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(joined.as_bytes());

    let mut records = reader.records().filter_map(Result::ok);
    let Some(header) = records.next() else {
        return false;
    };
    let width = header.len();

    // None once a column shows two different kinds.
    let mut kinds: Vec<Option<Option<ColumnKind>>> = vec![Some(None); width];
    for record in records.take(HEADER_PROBE_ROWS) {
        if record.len() != width {
            continue;
        }
        for (slot, field) in kinds.iter_mut().zip(record.iter()) {
            let kind = kind_of(field);
            *slot = match *slot {
                Some(None) => Some(Some(kind)),
                Some(Some(seen)) if seen == kind => Some(Some(seen)),
                _ => None,
            };
        }
    }

    let mut votes: i32 = 0;
    for (kind, field) in kinds.iter().zip(header.iter()) {
        match kind {
            Some(Some(ColumnKind::Numeric)) => {
                votes += if kind_of(field) == ColumnKind::Numeric { -1 } else { 1 };
            }
            Some(Some(ColumnKind::Length(n))) => {
                votes += if field.chars().count() != *n { 1 } else { -1 };
            }
            _ => {}
        }
    }
    votes > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_candidate_delimiter() {
        let semi = sniff("Radius;Inters.\n10;3\n20;5\n30;2\n").unwrap();
        assert_eq!(semi.delimiter, b';');
        let comma = sniff("r,n\n1,2\n3,4\n").unwrap();
        assert_eq!(comma.delimiter, b',');
        let tab = sniff("1\t2\n3\t4\n").unwrap();
        assert_eq!(tab.delimiter, b'\t');
    }

    #[test]
    fn decimal_commas_do_not_beat_semicolons() {
        let dialect = sniff("x;y\n1,5;2,25\n2,5;3\n3,5;4,75\n").unwrap();
        assert_eq!(dialect.delimiter, b';');
    }

    #[test]
    fn header_detection() {
        assert!(sniff("Radius,Count\n1,2\n2,3\n3,4\n").unwrap().has_header);
        assert!(!sniff("0,2\n1,3\n2,4\n").unwrap().has_header);
    }

    #[test]
    fn quoted_delimiters_are_ignored() {
        let dialect = sniff("\"a;b\",1\n\"c;d\",2\n\"e;f\",3\n").unwrap();
        assert_eq!(dialect.delimiter, b',');
    }

    #[test]
    fn single_column_has_no_delimiter() {
        assert_eq!(sniff("1\n2\n3\n"), Err(SniffError::NoDelimiter));
    }

    #[test]
    fn empty_content_is_rejected() {
        assert_eq!(sniff(""), Err(SniffError::Empty));
        assert_eq!(sniff("\n  \n"), Err(SniffError::Empty));
    }

    #[test]
    fn only_the_leading_sample_is_inspected() {
        let mut content = String::from("a;b\n");
        while content.len() < SAMPLE_LEN * 2 {
            content.push_str("1;2\n");
        }
        // Past the sample, a comma-only tail must not change the verdict.
        for _ in 0..200 {
            content.push_str("1,2,3,4\n");
        }
        assert_eq!(sniff(&content).unwrap().delimiter, b';');
    }
}
