//! Merge per-subject profile files into one table and summarize them row by
//! row (mean, population standard deviation, contributor count).
//!
//! The library reads files and hands back data; it never prints or writes.
//! Progress goes through a [`Reporter`].

pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod report;

pub use config::{ColumnSpec, ExtensionFilter, OutputSelection, RunConfig};
pub use data::model::{AggregateRow, CellValue, ReferenceHeaders};
pub use error::{ConfigError, GroupError, HeaderMismatch, SkipReason, SkippedFile};
pub use output::{PlotSeries, ResultTables, Table};
pub use pipeline::{run, run_with_cancel, RunOutcome};
pub use report::{LogReporter, Reporter, Severity};
