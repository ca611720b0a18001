use std::path::{Path, PathBuf};

use glob::MatchOptions;

use crate::config::RunConfig;
use crate::error::GroupError;

/// Resolve the run's file set: every entry directly inside `input_dir` whose
/// name matches `*<name_filter>*<ext>`, sorted lexicographically by path.
///
/// The pattern is matched against entry names only, so it never descends into
/// subdirectories. Hidden entries need a literal leading dot in the pattern.
/// Directories that happen to match are kept; the pipeline skips them with a
/// warning so the user sees why they were ignored.
pub fn select_files(config: &RunConfig) -> Result<Vec<PathBuf>, GroupError> {
    let dir = config.input_dir.as_path();
    let pattern = config.glob_pattern();

    let Ok(entries) = std::fs::read_dir(dir) else {
        return Err(discovery_failure(dir, &pattern));
    };
    let matcher = glob::Pattern::new(&pattern)?;
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| matcher.matches_with(name, options))
        })
        .map(|entry| entry.path())
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(discovery_failure(dir, &pattern));
    }
    Ok(files)
}

fn discovery_failure(dir: &Path, pattern: &str) -> GroupError {
    GroupError::Discovery {
        dir: dir.to_path_buf(),
        pattern: pattern.to_string(),
    }
}
