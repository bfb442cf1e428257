//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! a progress bar over the difficulty files, and the closing summary table.

use crate::file_organizer::RunSummary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for operations
/// - Summary tables with statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mapset_organizer::output::OutputFormatter;
    /// OutputFormatter::success("Copied audio: audio.mp3");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mapset_organizer::output::OutputFormatter;
    /// OutputFormatter::warning("Background file not found: bg.jpg");
    /// ```
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message.yellow());
    }

    /// Prints an informational message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates and returns a progress bar over the difficulty files.
    ///
    /// The bar draws to stderr and stays hidden when stderr is not a terminal.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mapset_organizer::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(4);
    /// pb.suspend(|| OutputFormatter::success("Created folder: Hard"));
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the closing table with per-outcome counts of a run.
    pub fn summary_table(summary: &RunSummary) {
        Self::header("SUMMARY");

        let organized_label = if summary.dry_run {
            "Would organize"
        } else {
            "Organized"
        };
        let rows = [
            (organized_label, summary.organized(), Color::Green),
            ("Skipped", summary.skipped(), Color::Yellow),
            ("Warnings", summary.warnings(), Color::Yellow),
            ("Failures", summary.failures(), Color::Red),
        ];

        let width = rows
            .iter()
            .map(|(label, _, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(7); // "Outcome" column header

        println!("{:<width$} | {}", "Outcome".bold(), "Count".bold(), width = width);
        println!("{}", "-".repeat(width + 10));

        for (label, count, color) in rows {
            let count_text = if count == 0 {
                count.to_string().normal()
            } else {
                count.to_string().color(color)
            };
            println!("{:<width$} | {}", label, count_text, width = width);
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            summary.outcomes.len().to_string().bold(),
            if summary.outcomes.len() == 1 {
                "difficulty"
            } else {
                "difficulties"
            },
            width = width
        );
    }
}
