//! Command-line orchestration for mapset-organizer.
//!
//! This module drives a whole run over a mapset folder:
//! - Validating the folder and listing difficulty files
//! - Extracting metadata and deriving folder names
//! - Creating folders and copying the three assets
//! - Reporting progress, warnings and the final summary

use crate::config::{CompiledConfig, OrganizerConfig};
use crate::file_organizer::{
    AssetOutcome, AssetRole, DifficultyOutcome, DifficultyResult, FileOrganizer, OrganizeError,
    OrganizeResult, RunSummary, SkipReason,
};
use crate::metadata::{self, DifficultyMetadata};
use crate::naming;
use crate::output::OutputFormatter;
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for one organizing run.
#[derive(Debug, Clone, Default)]
pub struct OrganizeOptions {
    /// If true, report what would happen without writing anything.
    pub dry_run: bool,
    /// Where to write a JSON report of the run, if anywhere.
    pub report_path: Option<PathBuf>,
}

/// Organizes a mapset folder with configuration discovered from the environment.
///
/// # Examples
///
/// ```no_run
/// use mapset_organizer::cli::{run_cli, OrganizeOptions};
/// use std::path::Path;
///
/// match run_cli(Path::new("/path/to/mapset"), &OrganizeOptions::default()) {
///     Ok(summary) => println!("Organized {} difficulties", summary.organized()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(dir_path: &Path, options: &OrganizeOptions) -> OrganizeResult<RunSummary> {
    run_cli_with_config(dir_path, options, None)
}

/// Organizes a mapset folder with an optional explicit configuration file.
///
/// Only folder-level problems are returned as errors: an invalid mapset folder,
/// an unreadable listing, or a bad configuration. Everything that goes wrong
/// for a single difficulty is recorded in the returned summary instead.
pub fn run_cli_with_config(
    dir_path: &Path,
    options: &OrganizeOptions,
    config_path: Option<&Path>,
) -> OrganizeResult<RunSummary> {
    validate_source_dir(dir_path)?;

    let config = OrganizerConfig::load(config_path)?.compile()?;

    let summary = organize_mapset(dir_path, &config, options.dry_run)?;

    if let Some(report_path) = &options.report_path {
        match summary.save(report_path) {
            Ok(()) => OutputFormatter::info(&format!(
                "Report written to {}",
                report_path.display()
            )),
            Err(e) => OutputFormatter::error(&e.to_string()),
        }
    }

    Ok(summary)
}

/// Fails unless `dir_path` exists and is a directory.
fn validate_source_dir(dir_path: &Path) -> OrganizeResult<()> {
    if !dir_path.exists() {
        return Err(OrganizeError::InvalidSourceDir {
            path: dir_path.to_path_buf(),
            reason: "folder does not exist".to_string(),
        });
    }
    if !dir_path.is_dir() {
        return Err(OrganizeError::InvalidSourceDir {
            path: dir_path.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(())
}

/// Lists the difficulty files directly inside `base_path`, sorted by name.
pub fn list_difficulty_files(
    base_path: &Path,
    config: &CompiledConfig,
) -> OrganizeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(base_path).map_err(|e| OrganizeError::ListingFailed {
        path: base_path.to_path_buf(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        // Follows symlinks, like asset resolution does
        .filter(|entry| entry.path().is_file())
        .filter(|entry| config.is_difficulty_file(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();

    files.sort();
    Ok(files)
}

/// Processes every difficulty file of the mapset folder in turn.
fn organize_mapset(
    base_path: &Path,
    config: &CompiledConfig,
    dry_run: bool,
) -> OrganizeResult<RunSummary> {
    let display_path = fs::canonicalize(base_path).unwrap_or_else(|_| base_path.to_path_buf());
    if dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing mapset folder: {}",
            display_path.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Analyzing mapset folder: {}",
            display_path.display()
        ));
    }

    let files = list_difficulty_files(base_path, config)?;
    let mut summary = RunSummary::new(base_path.to_path_buf(), dry_run);

    if files.is_empty() {
        OutputFormatter::plain(&format!(
            "No {} files found in the specified folder.",
            config.suffix()
        ));
        return Ok(summary);
    }

    OutputFormatter::plain(&format!(
        "Found {} {} files. Analyzing...",
        files.len(),
        config.suffix()
    ));

    let pb = OutputFormatter::create_progress_bar(files.len() as u64);

    for file in &files {
        let file_name = display_name(file);
        pb.set_message(file_name.clone());

        let result = organize_difficulty(base_path, file, config, dry_run, &pb);
        if let DifficultyResult::Skipped { reason } = &result {
            pb.suspend(|| OutputFormatter::error(&format!("Skipping {}: {}", file_name, reason)));
        }

        summary.add_outcome(DifficultyOutcome {
            difficulty: file.clone(),
            result,
        });
        pb.inc(1);
    }

    pb.finish_and_clear();

    if dry_run {
        OutputFormatter::dry_run_notice("Dry run complete. No files were written.");
    } else {
        OutputFormatter::success("Organization complete!");
    }
    OutputFormatter::summary_table(&summary);

    Ok(summary)
}

/// Runs extraction, naming and placement for one difficulty file.
fn organize_difficulty(
    base_path: &Path,
    file: &Path,
    config: &CompiledConfig,
    dry_run: bool,
    pb: &ProgressBar,
) -> DifficultyResult {
    let mut meta = match metadata::extract(file) {
        Ok(meta) => meta,
        Err(e) => {
            return DifficultyResult::Skipped {
                reason: SkipReason::Extraction(e),
            };
        }
    };

    if let Some(e) = &meta.read_error {
        pb.suspend(|| {
            OutputFormatter::warning(&format!(
                "Warning: reading {} stopped early ({}); using the metadata read so far",
                display_name(file),
                e
            ))
        });
    }

    let folder_name = naming::folder_name(&meta);
    if !naming::is_usable_folder_name(&folder_name) {
        return DifficultyResult::Skipped {
            reason: SkipReason::InvalidFolderName(folder_name),
        };
    }
    let folder = base_path.join(&folder_name);

    let folder_created = if dry_run {
        match FileOrganizer::check_folder(base_path, &folder_name) {
            Ok(would_create) => {
                pb.suspend(|| {
                    OutputFormatter::dry_run_notice(&format!(
                        "Would {} folder: {}",
                        if would_create { "create" } else { "use existing" },
                        folder_name
                    ))
                });
                would_create
            }
            Err(e) => {
                return DifficultyResult::Skipped {
                    reason: SkipReason::FolderCreation(e),
                };
            }
        }
    } else {
        match FileOrganizer::ensure_folder(base_path, &folder_name) {
            Ok(created) => {
                pb.suspend(|| {
                    if created {
                        OutputFormatter::success(&format!("Created folder: {}", folder_name));
                    } else {
                        OutputFormatter::plain(&format!("Using existing folder: {}", folder_name));
                    }
                });
                created
            }
            Err(e) => {
                return DifficultyResult::Skipped {
                    reason: SkipReason::FolderCreation(e),
                };
            }
        }
    };

    let assets = asset_references(&meta, config)
        .into_iter()
        .map(|(role, reference)| {
            let outcome = FileOrganizer::place_asset(base_path, &folder, role, &reference, dry_run);
            pb.suspend(|| report_asset(&outcome, &reference));
            outcome
        })
        .collect();

    DifficultyResult::Organized {
        folder_name,
        folder,
        folder_created,
        assets,
        read_error: meta.read_error.take(),
    }
}

/// The files to place for a difficulty, in copy order.
///
/// The difficulty's own name is taken from its path as-is, so names that are
/// not valid UTF-8 still resolve to the file on disk.
fn asset_references(
    meta: &DifficultyMetadata,
    config: &CompiledConfig,
) -> Vec<(AssetRole, PathBuf)> {
    let own_name = meta
        .source_path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| meta.source_path.clone());
    let mut references = vec![(AssetRole::Difficulty, own_name)];

    if config.settings.copy_audio {
        references.push((AssetRole::Audio, PathBuf::from(&meta.audio_filename)));
    }

    if config.settings.copy_background
        && let Some(background) = meta.background()
    {
        references.push((AssetRole::Background, PathBuf::from(background)));
    }

    references
}

fn report_asset(outcome: &AssetOutcome, reference: &Path) {
    let role = outcome.role().label();
    let reference = reference.display();
    match outcome {
        AssetOutcome::Copied { mime_type, .. } => {
            let mime_info = mime_type
                .as_ref()
                .map(|m| format!(" ({})", m))
                .unwrap_or_default();
            OutputFormatter::success(&format!("  - Copied {}: {}{}", role, reference, mime_info));
        }
        AssetOutcome::WouldCopy { .. } => {
            OutputFormatter::dry_run_notice(&format!("  - Would copy {}: {}", role, reference));
        }
        AssetOutcome::Missing { .. } => {
            OutputFormatter::warning(&format!(
                "  - Warning: {} file not found: {}",
                capitalize(role),
                reference
            ));
        }
        AssetOutcome::UnsafeReference { .. } => {
            OutputFormatter::warning(&format!(
                "  - Warning: {} reference points outside the mapset folder: {}",
                role, reference
            ));
        }
        AssetOutcome::Failed { error, .. } => {
            OutputFormatter::error(&format!("  - {}", error));
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
