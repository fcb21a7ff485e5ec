//! Output formatting and styling for the CLI shell.
//!
//! Centralizes colored output, the run spinner, and the end-of-run summary
//! table so formatting stays consistent across organize, preview, and undo.

use std::collections::HashMap;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a preview-mode notice.
    pub fn preview_notice(message: &str) {
        println!("{}", format!("[PREVIEW] {}", message).yellow());
    }

    /// Spinner for runs whose file count is unknown up front.
    ///
    /// Per-file output should go through [`ProgressBar::println`] so lines
    /// print above the spinner.
    pub fn create_spinner(message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {pos} files {msg}")
                .expect("Invalid spinner template"),
        );
        pb.set_message(message.to_string());
        pb
    }

    /// Prints a summary table of file counts per destination folder.
    pub fn summary_table(folder_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut folders: Vec<_> = folder_counts.iter().collect();
        folders.sort_by_key(|&(name, _)| name);

        let max_folder_len = folders
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Folder" width

        println!(
            "{:<width$} | {}",
            "Folder".bold(),
            "Files".bold(),
            width = max_folder_len
        );
        println!("{}", "-".repeat(max_folder_len + 10));

        for (folder, count) in &folders {
            let file_word = if **count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                file_word,
                width = max_folder_len
            );
        }

        println!("{}", "-".repeat(max_folder_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_folder_len
        );
    }
}
