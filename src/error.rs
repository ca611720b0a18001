use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid run parameters, caught before any file is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} column index is 1-based and must be at least 1")]
    ZeroColumn(&'static str),
    #[error("invalid extension filter '{0}'")]
    Extension(String),
    #[error("unknown output selection '{0}' (expected merged, stats or both)")]
    Output(String),
}

/// Conditions that end a run without producing tables.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error(
        "The directory {} does not contain files matching the specified pattern \"{pattern}\" (or it does not exist)",
        dir.display()
    )]
    Discovery { dir: PathBuf, pattern: String },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("{files} files were parsed but no valid data existed")]
    EmptyResult { files: usize },

    #[error("run cancelled after {processed} files")]
    Cancelled { processed: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a single file did not contribute. Never fatal for the run.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Directory,
    Unreadable(String),
    Dialect(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Directory => write!(f, "path is a directory"),
            SkipReason::Unreadable(msg) => write!(f, "could not be read: {msg}"),
            SkipReason::Dialect(msg) => write!(f, "{msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Y heading of a later file differs from the reference one. Data is still merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMismatch {
    pub file: String,
    pub found: String,
    pub expected: String,
}
