use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use profile_merge::{
    pipeline, ColumnSpec, ExtensionFilter, LogReporter, OutputSelection, ResultTables, RunConfig,
    Table,
};

/// Merge per-subject profile tables found in a directory and summarize them
/// row by row.
#[derive(Parser, Debug)]
#[command(name = "profile-merge", version, about)]
struct Cli {
    /// Directory containing the files to merge
    dir: Option<PathBuf>,

    /// JSON run configuration; flags given on the command line take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only consider files whose name contains this text (glob syntax allowed)
    #[arg(short = 'c', long)]
    contains: Option<String>,

    /// File extension to consider, e.g. ".csv"; "any" matches every file
    #[arg(short, long)]
    extension: Option<ExtensionFilter>,

    /// 1-based column holding the X values shared by all profiles
    #[arg(short = 'x', long)]
    x_col: Option<usize>,

    /// 1-based column holding the Y values to aggregate
    #[arg(short = 'y', long)]
    y_col: Option<usize>,

    /// Tables to build: merged, stats or both
    #[arg(short, long)]
    output: Option<OutputSelection>,

    /// Log progress, warnings and per-file errors
    #[arg(short, long)]
    verbose: bool,

    /// Write each table as CSV into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Write the mean ± SD plot series as JSON to this file
    #[arg(long)]
    plot_json: Option<PathBuf>,
}

impl Cli {
    fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(dir) = &self.dir {
            config.input_dir = dir.clone();
        }
        if let Some(contains) = &self.contains {
            config.name_filter = contains.clone();
        }
        if let Some(ext) = &self.extension {
            config.extension = ext.clone();
        }
        let x = self.x_col.unwrap_or(config.columns.x);
        let y = self.y_col.unwrap_or(config.columns.y);
        config.columns = ColumnSpec::new(x, y)?;
        if let Some(output) = self.output {
            config.output = output;
        }
        config.verbose |= self.verbose;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.resolve();
    // A JSON config may turn verbosity on, so the level waits for resolution.
    let verbose = config.as_ref().map_or(cli.verbose, |c| c.verbose);
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level(verbose))).init();

    match config.and_then(|config| run(&cli, &config)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn log_level(verbose: bool) -> &'static str {
    if verbose {
        "info"
    } else {
        "error"
    }
}

/// Returns `false` when the run ended on a terminal condition. Those are
/// already reported through the reporter.
fn run(cli: &Cli, config: &RunConfig) -> Result<bool> {
    let mut reporter = LogReporter::new(config.verbose);
    let Ok(outcome) = pipeline::run(config, &mut reporter) else {
        return Ok(false);
    };

    print_tables(&outcome.tables);
    if let Some(dir) = &cli.export_dir {
        export_tables(dir, &outcome.tables)?;
    }
    if let (Some(path), Some(plot)) = (&cli.plot_json, &outcome.tables.plot) {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), plot).context("writing plot series")?;
    }
    Ok(true)
}

fn print_tables(tables: &ResultTables) {
    for table in [&tables.merged, &tables.statistics].into_iter().flatten() {
        println!("{table}");
    }
}

fn export_tables(dir: &Path, tables: &ResultTables) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for table in [&tables.merged, &tables.statistics].into_iter().flatten() {
        let path = dir.join(export_name(table));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        table.write_csv(BufWriter::new(file))?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

/// Table titles carry glob characters; keep file names portable.
fn export_name(table: &Table) -> String {
    let stem: String = table
        .title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("{stem}.csv")
}
