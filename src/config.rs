use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// ExtensionFilter
// ---------------------------------------------------------------------------

/// File extension restriction. `Any` matches every file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExtensionFilter {
    #[default]
    Any,
    /// Always stored with its leading dot, e.g. `.csv`.
    Only(String),
}

impl ExtensionFilter {
    /// Suffix appended to the glob pattern.
    pub fn as_suffix(&self) -> &str {
        match self {
            ExtensionFilter::Any => "",
            ExtensionFilter::Only(ext) => ext,
        }
    }
}

impl FromStr for ExtensionFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.to_ascii_lowercase().starts_with("any") {
            return Ok(ExtensionFilter::Any);
        }
        if s.contains(['/', '\\']) {
            return Err(ConfigError::Extension(s.to_string()));
        }
        let ext = if s.starts_with('.') {
            s.to_string()
        } else {
            format!(".{s}")
        };
        Ok(ExtensionFilter::Only(ext))
    }
}

impl TryFrom<String> for ExtensionFilter {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExtensionFilter> for String {
    fn from(value: ExtensionFilter) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionFilter::Any => write!(f, "any extension"),
            ExtensionFilter::Only(ext) => write!(f, "{ext}"),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnSpec
// ---------------------------------------------------------------------------

/// 1-based positions of the X and Y columns, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub x: usize,
    pub y: usize,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        ColumnSpec { x: 1, y: 2 }
    }
}

impl ColumnSpec {
    pub fn new(x: usize, y: usize) -> Result<Self, ConfigError> {
        let spec = ColumnSpec { x, y };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.x == 0 {
            return Err(ConfigError::ZeroColumn("X"));
        }
        if self.y == 0 {
            return Err(ConfigError::ZeroColumn("Y"));
        }
        Ok(())
    }

    pub fn x_index(&self) -> usize {
        self.x - 1
    }

    pub fn y_index(&self) -> usize {
        self.y - 1
    }
}

// ---------------------------------------------------------------------------
// OutputSelection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSelection {
    MergedOnly,
    StatisticsOnly,
    #[default]
    Both,
}

impl OutputSelection {
    pub fn wants_merged(self) -> bool {
        matches!(self, OutputSelection::MergedOnly | OutputSelection::Both)
    }

    pub fn wants_statistics(self) -> bool {
        matches!(self, OutputSelection::StatisticsOnly | OutputSelection::Both)
    }
}

impl FromStr for OutputSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merged" | "merged data" | "merged_only" => Ok(OutputSelection::MergedOnly),
            "stats" | "statistics" | "row statistics" | "statistics_only" => {
                Ok(OutputSelection::StatisticsOnly)
            }
            "both" => Ok(OutputSelection::Both),
            other => Err(ConfigError::Output(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Pre-resolved parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    /// Substring (glob syntax allowed) a filename must contain. Empty matches all.
    pub name_filter: String,
    pub extension: ExtensionFilter,
    pub columns: ColumnSpec,
    pub output: OutputSelection,
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            input_dir: PathBuf::from("."),
            name_filter: String::new(),
            extension: ExtensionFilter::Any,
            columns: ColumnSpec::default(),
            output: OutputSelection::Both,
            verbose: false,
        }
    }
}

impl RunConfig {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        RunConfig {
            input_dir: input_dir.into(),
            ..Default::default()
        }
    }

    /// Load a config from a JSON document. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.columns.validate()
    }

    /// Filename glob, without the directory part. Runs of `*` collapse to one
    /// so an empty filter reads `*.csv` rather than a recursive `**`.
    pub fn glob_pattern(&self) -> String {
        let raw = format!("*{}*{}", self.name_filter, self.extension.as_suffix());
        let mut pattern = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c == '*' && pattern.ends_with('*') {
                continue;
            }
            pattern.push(c);
        }
        pattern
    }

    /// Label shared by every output of the run.
    pub fn data_identifier(&self) -> String {
        format!("Col#{} [{}]", self.columns.y, self.glob_pattern())
    }
}
