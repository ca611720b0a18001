use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::RunConfig;
use crate::data::align::AggregationContext;
use crate::data::model::AggregateRow;
use crate::data::{parser, select, sniff, stats};
use crate::error::{GroupError, HeaderMismatch, SkipReason, SkippedFile};
use crate::output::{self, ResultTables};
use crate::report::{Reporter, Severity};

/// Everything one run produced, including the per-file conditions that were
/// absorbed along the way.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub tables: ResultTables,
    /// Empty unless statistics were requested.
    pub stats: Vec<AggregateRow>,
    pub files_found: usize,
    pub files_merged: usize,
    pub skipped: Vec<SkippedFile>,
    pub header_mismatches: Vec<HeaderMismatch>,
    /// Every numeric value merged was zero.
    pub all_zero: bool,
}

/// Run the whole pipeline once, without cancellation.
pub fn run(config: &RunConfig, reporter: &mut dyn Reporter) -> Result<RunOutcome, GroupError> {
    run_with_cancel(config, reporter, &AtomicBool::new(false))
}

/// Run the pipeline, checking `cancel` before each file.
pub fn run_with_cancel(
    config: &RunConfig,
    reporter: &mut dyn Reporter,
    cancel: &AtomicBool,
) -> Result<RunOutcome, GroupError> {
    match execute(config, reporter, cancel) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            reporter.report(Severity::Error, &err.to_string());
            Err(err)
        }
    }
}

fn execute(
    config: &RunConfig,
    reporter: &mut dyn Reporter,
    cancel: &AtomicBool,
) -> Result<RunOutcome, GroupError> {
    config.validate()?;

    let files = select::select_files(config)?;
    reporter.report(
        Severity::Info,
        &format!(
            "Parsing {} for files matching \"{}\": {} found",
            config.input_dir.display(),
            config.glob_pattern(),
            files.len()
        ),
    );

    let mut ctx = AggregationContext::new();
    let mut skipped = Vec::new();
    let mut header_mismatches = Vec::new();

    for (idx, path) in files.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(GroupError::Cancelled { processed: idx });
        }

        let filename = display_name(path);
        reporter.report(Severity::Info, &format!("Parsing file {}: {filename}...", idx + 1));

        let merged = process_file(config, path, &filename, &mut ctx, &mut header_mismatches, reporter);
        if let Err(reason) = merged {
            let severity = match reason {
                SkipReason::Directory => Severity::Warn,
                _ => Severity::Error,
            };
            reporter.report(severity, &format!("Skipping {filename}... {reason}"));
            skipped.push(SkippedFile { path: path.clone(), reason });
        }
    }

    if ctx.is_empty() {
        return Err(GroupError::EmptyResult { files: files.len() });
    }
    reporter.report(Severity::Info, "No more files to parse...");

    let all_zero = stats::all_zero(ctx.rows());
    if all_zero {
        reporter.report(Severity::Warn, "All merged values are zero");
    }

    let identifier = config.data_identifier();
    if config.output.wants_merged() {
        reporter.report(Severity::Info, "Building table with merged Y-data...");
    }
    let row_stats = if config.output.wants_statistics() {
        reporter.report(Severity::Info, "Retrieving statistics for merged Y-data...");
        stats::aggregate(ctx.rows())
    } else {
        Vec::new()
    };
    let tables = output::build(&identifier, config.output, &ctx, &row_stats);
    reporter.report(Severity::Info, "Parsing concluded.");

    Ok(RunOutcome {
        tables,
        stats: row_stats,
        files_found: files.len(),
        files_merged: ctx.files().len(),
        skipped,
        header_mismatches,
        all_zero,
    })
}

/// Read, sniff, parse and merge one file. Any failure leaves `ctx` untouched.
fn process_file(
    config: &RunConfig,
    path: &Path,
    filename: &str,
    ctx: &mut AggregationContext,
    header_mismatches: &mut Vec<HeaderMismatch>,
    reporter: &mut dyn Reporter,
) -> Result<(), SkipReason> {
    if path.is_dir() {
        return Err(SkipReason::Directory);
    }
    let content = parser::read_content(path).map_err(|e| SkipReason::Unreadable(format!("{e:#}")))?;
    let dialect = sniff::sniff(&content).map_err(|e| SkipReason::Dialect(e.to_string()))?;
    log::debug!(
        "{filename}: {} delimited, header row: {}",
        dialect.delimiter_name(),
        dialect.has_header
    );

    let parsed = parser::parse_content(filename, &content, dialect, config.columns, reporter);
    let has_headers = parsed.headers.is_some();
    let is_reference = ctx.reference().is_none();

    if let Some(mismatch) = ctx.absorb(parsed, config.columns) {
        reporter.report(
            Severity::Warn,
            &format!(
                "Y-data heading mismatch: Found '{}' expected '{}'",
                mismatch.found, mismatch.expected
            ),
        );
        header_mismatches.push(mismatch);
    }

    if !has_headers {
        reporter.report(Severity::Info, "File has no column headings...");
    } else if let Some(reference) = ctx.reference().filter(|_| is_reference) {
        reporter.report(
            Severity::Info,
            &format!(
                "Setting X-data reference: column {} heading: '{}'",
                config.columns.x, reference.x
            ),
        );
        reporter.report(
            Severity::Info,
            &format!(
                "Setting Y-data reference: column {} heading: '{}'",
                config.columns.y, reference.y
            ),
        );
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn cancellation_is_checked_between_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.csv"), "r,n\n1,2\n").unwrap();
        let cancel = AtomicBool::new(true);
        let mut sink = |_: Severity, _: &str| {};
        let err = run_with_cancel(&RunConfig::new(tmp.path()), &mut sink, &cancel).unwrap_err();
        assert!(matches!(err, GroupError::Cancelled { processed: 0 }));
    }

    #[test]
    fn terminal_failures_reach_the_reporter() {
        let tmp = tempfile::tempdir().unwrap();
        let mut errors = Vec::new();
        let mut sink = |s: Severity, m: &str| {
            if s == Severity::Error {
                errors.push(m.to_string());
            }
        };
        let result = run(&RunConfig::new(tmp.path()), &mut sink);
        assert!(matches!(result, Err(GroupError::Discovery { .. })));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("does not contain files matching"));
    }

    #[test]
    fn invalid_columns_fail_before_discovery() {
        let mut config = RunConfig::new("/definitely/not/here");
        config.columns.x = 0;
        let mut sink = |_: Severity, _: &str| {};
        assert!(matches!(run(&config, &mut sink), Err(GroupError::Config(_))));
    }
}
