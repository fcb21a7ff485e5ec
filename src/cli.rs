//! Command-line interface for shelve.
//!
//! A thin shell around the engine: it assembles a validated configuration
//! from flags and the optional TOML file, runs the organizer or the undo
//! engine, and renders the per-file event stream with colored output and a
//! spinner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::classifier::{Classifier, SortMode};
use crate::config::OrganizerConfig;
use crate::organizer::{FileOutcome, OrganizeError, Organizer};
use crate::output::OutputFormatter;
use crate::undo::UndoManager;

/// Classification mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Group by sniffed content category ("IMAGE", "TEXT", ...).
    Content,
    /// Group by upper-cased file extension.
    Extension,
    /// Group by last-modified date (YYYY-MM-DD).
    Date,
    /// Group by custom extension=folder rules.
    Custom,
}

impl From<ModeArg> for SortMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Content => SortMode::ContentCategory,
            ModeArg::Extension => SortMode::Extension,
            ModeArg::Date => SortMode::ModifiedDate,
            ModeArg::Custom => SortMode::Custom,
        }
    }
}

/// Sort files into subdirectories, with preview and undo support.
#[derive(Debug, Parser)]
#[command(name = "shelve", version, about)]
pub struct Cli {
    /// Directory whose files should be organized.
    pub directory: PathBuf,

    /// Classification mode for this run.
    #[arg(short, long, value_enum, default_value_t = ModeArg::Extension)]
    pub mode: ModeArg,

    /// Report intended moves without touching the file system.
    #[arg(short, long)]
    pub preview: bool,

    /// Revert the most recent organization run instead of organizing.
    #[arg(short, long)]
    pub undo: bool,

    /// Custom rule of the form EXT=FOLDER (repeatable; used by --mode custom).
    #[arg(short, long = "rule", value_name = "EXT=FOLDER")]
    pub rules: Vec<String>,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Runs the CLI with already-parsed arguments.
pub fn run(cli: Cli) -> Result<(), String> {
    if cli.undo {
        return run_undo(&cli.directory);
    }

    let config = OrganizerConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let mut rules = config
        .custom_rules()
        .map_err(|e| format!("Error in configured rules: {}", e))?;
    for raw in &cli.rules {
        let (extension, folder) = parse_rule(raw)?;
        rules
            .insert(&extension, &folder)
            .map_err(|e| format!("Invalid rule '{}': {}", raw, e))?;
    }
    let excludes = config
        .compile_excludes()
        .map_err(|e| format!("Error compiling exclude filters: {}", e))?;

    let mode: SortMode = cli.mode.into();
    if mode == SortMode::Custom && rules.is_empty() {
        OutputFormatter::warning("Custom mode with no rules: every file will land in OTHER/.");
    }

    if cli.preview {
        OutputFormatter::info(&format!(
            "Preview of organizing: {}",
            cli.directory.display()
        ));
    } else {
        OutputFormatter::info(&format!("Organizing: {}", cli.directory.display()));
    }

    let organizer =
        Organizer::new(&cli.directory, Classifier::new(mode, rules)).with_excludes(excludes);

    let spinner = OutputFormatter::create_spinner(if cli.preview {
        "previewed"
    } else {
        "organized"
    });
    let mut folder_counts: HashMap<String, usize> = HashMap::new();

    let result = organizer.organize(cli.preview, |outcome| {
        spinner.inc(1);
        match outcome {
            FileOutcome::Previewed { name, folder } => {
                spinner.println(format!("[PREVIEW] {} → {}/", name, folder));
                *folder_counts.entry(folder.clone()).or_insert(0) += 1;
            }
            FileOutcome::Moved { name, folder } => {
                spinner.println(format!("Moved: {} → {}/", name, folder));
                *folder_counts.entry(folder.clone()).or_insert(0) += 1;
            }
            FileOutcome::Failed { name, reason } => {
                spinner.println(format!("Failed: {} ({})", name, reason));
            }
        }
    });
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e @ OrganizeError::LogWriteFailed { .. }) => {
            // Files have already moved; without the log this run cannot be
            // undone. Make that impossible to miss.
            OutputFormatter::error(&e.to_string());
            OutputFormatter::error(
                "Files were moved but the move log could not be saved: undo is NOT available for this run.",
            );
            return Err(e.to_string());
        }
        Err(e) => return Err(e.to_string()),
    };

    OutputFormatter::summary_table(&folder_counts, report.moved + report.previewed);

    if !report.is_clean() {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be processed and were left in place.",
            report.failed
        ));
    }

    if cli.preview {
        OutputFormatter::preview_notice("No files were modified.");
    } else {
        OutputFormatter::success("Organization complete!");
        OutputFormatter::info(&format!(
            "Run 'shelve {} --undo' to revert this run.",
            cli.directory.display()
        ));
    }

    Ok(())
}

/// Reverts the most recent run recorded in the directory's move log.
fn run_undo(directory: &Path) -> Result<(), String> {
    match UndoManager::undo(directory) {
        Ok(report) => {
            for path in &report.restored {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                OutputFormatter::success(&format!("Restored: {}", name));
            }
            if report.skipped > 0 {
                OutputFormatter::warning(&format!(
                    "Skipped {} record(s) whose files no longer exist.",
                    report.skipped
                ));
            }
            for (path, reason) in &report.failed {
                OutputFormatter::error(&format!("Could not restore {}: {}", path.display(), reason));
            }
            OutputFormatter::success(&format!(
                "Undo complete. {} file(s) restored.",
                report.restored.len()
            ));
            Ok(())
        }
        // A missing log is a no-op, not a failure.
        Err(OrganizeError::NoLogFound { .. }) => {
            OutputFormatter::warning("No move log found. Nothing to undo.");
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Parses an `EXT=FOLDER` rule flag.
fn parse_rule(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((extension, folder)) if !extension.trim().is_empty() => {
            Ok((extension.trim().to_string(), folder.trim().to_string()))
        }
        _ => Err(format!(
            "Invalid rule '{}': expected the form EXT=FOLDER (e.g. jpg=Images)",
            raw
        )),
    }
}
