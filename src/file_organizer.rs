/// Placement of difficulty files and their assets into per-difficulty folders.
///
/// This module creates the output folders inside the mapset folder, copies the
/// difficulty file together with its referenced audio and background, and records
/// what happened to each asset so a run can be summarized and reported.
/// Source files are only ever read, never moved or deleted.
use crate::config::ConfigError;
use crate::metadata::ExtractError;
use serde_json::{Value, json};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Errors that can occur while organizing a mapset folder.
#[derive(Debug)]
pub enum OrganizeError {
    /// The mapset folder does not exist or is not a directory.
    InvalidSourceDir { path: PathBuf, reason: String },
    /// The mapset folder exists but could not be listed.
    ListingFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a difficulty folder.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to copy a file into a difficulty folder.
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to write the run report.
    ReportWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Configuration could not be loaded or compiled.
    Config(ConfigError),
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSourceDir { path, reason } => {
                write!(f, "Invalid mapset folder {}: {}", path.display(), reason)
            }
            Self::ListingFailed { path, source } => {
                write!(f, "Failed to list {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create folder {}: {}",
                    path.display(),
                    source
                )
            }
            Self::CopyFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::ReportWriteFailed { path, source } => {
                write!(f, "Failed to write report {}: {}", path.display(), source)
            }
            Self::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for OrganizeError {}

impl From<ConfigError> for OrganizeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Result type for organizing operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Which of a difficulty's three files an asset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    Difficulty,
    Audio,
    Background,
}

impl AssetRole {
    pub fn label(&self) -> &'static str {
        match self {
            AssetRole::Difficulty => "difficulty",
            AssetRole::Audio => "audio",
            AssetRole::Background => "background",
        }
    }
}

/// What happened to one asset of a difficulty.
#[derive(Debug)]
pub enum AssetOutcome {
    /// Copied into the difficulty folder.
    Copied {
        role: AssetRole,
        source: PathBuf,
        destination: PathBuf,
        /// MIME type sniffed from the file content, if recognized.
        mime_type: Option<String>,
    },
    /// Would be copied; dry runs only.
    WouldCopy {
        role: AssetRole,
        source: PathBuf,
        destination: PathBuf,
    },
    /// The referenced file does not exist in the mapset folder.
    Missing { role: AssetRole, source: PathBuf },
    /// The reference points outside the mapset folder.
    UnsafeReference { role: AssetRole, reference: PathBuf },
    /// The copy itself failed.
    Failed { role: AssetRole, error: OrganizeError },
}

impl AssetOutcome {
    pub fn role(&self) -> AssetRole {
        match self {
            Self::Copied { role, .. }
            | Self::WouldCopy { role, .. }
            | Self::Missing { role, .. }
            | Self::UnsafeReference { role, .. }
            | Self::Failed { role, .. } => *role,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Missing { .. } | Self::UnsafeReference { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    fn to_json(&self) -> Value {
        let role = self.role().label();
        match self {
            Self::Copied {
                source,
                destination,
                mime_type,
                ..
            } => json!({
                "role": role,
                "status": "copied",
                "source": source.to_string_lossy().to_string(),
                "destination": destination.to_string_lossy().to_string(),
                "mime_type": mime_type,
            }),
            Self::WouldCopy {
                source,
                destination,
                ..
            } => json!({
                "role": role,
                "status": "would_copy",
                "source": source.to_string_lossy().to_string(),
                "destination": destination.to_string_lossy().to_string(),
            }),
            Self::Missing { source, .. } => json!({
                "role": role,
                "status": "missing",
                "source": source.to_string_lossy().to_string(),
            }),
            Self::UnsafeReference { reference, .. } => json!({
                "role": role,
                "status": "unsafe_reference",
                "reference": reference.to_string_lossy().to_string(),
            }),
            Self::Failed { error, .. } => json!({
                "role": role,
                "status": "failed",
                "error": error.to_string(),
            }),
        }
    }
}

/// Why a difficulty file produced no folder.
#[derive(Debug)]
pub enum SkipReason {
    Extraction(ExtractError),
    InvalidFolderName(String),
    FolderCreation(OrganizeError),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extraction(e) => write!(f, "{}", e),
            Self::InvalidFolderName(name) => write!(f, "unusable folder name '{}'", name),
            Self::FolderCreation(e) => write!(f, "{}", e),
        }
    }
}

/// Result of processing a single difficulty file.
#[derive(Debug)]
pub enum DifficultyResult {
    Organized {
        folder_name: String,
        folder: PathBuf,
        /// False when the folder already existed.
        folder_created: bool,
        assets: Vec<AssetOutcome>,
        /// Set when the difficulty file could not be read to the end.
        read_error: Option<std::io::Error>,
    },
    Skipped { reason: SkipReason },
}

#[derive(Debug)]
pub struct DifficultyOutcome {
    pub difficulty: PathBuf,
    pub result: DifficultyResult,
}

impl DifficultyOutcome {
    pub fn assets(&self) -> &[AssetOutcome] {
        match &self.result {
            DifficultyResult::Organized { assets, .. } => assets,
            DifficultyResult::Skipped { .. } => &[],
        }
    }

    /// True if the difficulty was organized from a partially read file.
    pub fn was_read_partially(&self) -> bool {
        matches!(
            self.result,
            DifficultyResult::Organized {
                read_error: Some(_),
                ..
            }
        )
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.result, DifficultyResult::Skipped { .. })
    }

    fn to_json(&self) -> Value {
        let difficulty = self.difficulty.to_string_lossy().to_string();
        match &self.result {
            DifficultyResult::Organized {
                folder_name,
                folder,
                folder_created,
                assets,
                read_error,
            } => json!({
                "difficulty": difficulty,
                "status": "organized",
                "folder_name": folder_name,
                "folder": folder.to_string_lossy().to_string(),
                "folder_created": folder_created,
                "assets": assets.iter().map(AssetOutcome::to_json).collect::<Vec<_>>(),
                "read_error": read_error.as_ref().map(|e| e.to_string()),
            }),
            DifficultyResult::Skipped { reason } => json!({
                "difficulty": difficulty,
                "status": "skipped",
                "reason": reason.to_string(),
            }),
        }
    }
}

/// Everything that happened during one run over a mapset folder.
#[derive(Debug)]
pub struct RunSummary {
    /// RFC 3339 timestamp of when the run started.
    pub timestamp: String,
    pub source_dir: PathBuf,
    pub dry_run: bool,
    pub outcomes: Vec<DifficultyOutcome>,
}

impl RunSummary {
    pub fn new(source_dir: PathBuf, dry_run: bool) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source_dir,
            dry_run,
            outcomes: Vec::new(),
        }
    }

    pub fn add_outcome(&mut self, outcome: DifficultyOutcome) {
        self.outcomes.push(outcome);
    }

    /// Number of difficulty files that got a folder.
    pub fn organized(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_skipped()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    /// Number of missing or unsafe asset references plus partially read
    /// difficulty files.
    pub fn warnings(&self) -> usize {
        let partial_reads = self
            .outcomes
            .iter()
            .filter(|o| o.was_read_partially())
            .count();
        self.assets().filter(|a| a.is_warning()).count() + partial_reads
    }

    /// Number of copies that failed.
    pub fn failures(&self) -> usize {
        self.assets().filter(|a| a.is_failure()).count()
    }

    fn assets(&self) -> impl Iterator<Item = &AssetOutcome> {
        self.outcomes.iter().flat_map(|o| o.assets().iter())
    }

    /// Finds the outcome for a difficulty file by its file name.
    pub fn outcome_for(&self, file_name: &str) -> Option<&DifficultyOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.difficulty.file_name().is_some_and(|n| n == file_name))
    }

    pub fn to_json(&self) -> Value {
        json!({
            "timestamp": self.timestamp,
            "source_dir": self.source_dir.to_string_lossy().to_string(),
            "dry_run": self.dry_run,
            "organized": self.organized(),
            "skipped": self.skipped(),
            "warnings": self.warnings(),
            "failures": self.failures(),
            "difficulties": self.outcomes.iter().map(DifficultyOutcome::to_json).collect::<Vec<_>>(),
        })
    }

    /// Writes the summary as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> OrganizeResult<()> {
        let json_string = serde_json::to_string_pretty(&self.to_json()).map_err(|e| {
            OrganizeError::ReportWriteFailed {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            }
        })?;

        fs::write(path, json_string).map_err(|e| OrganizeError::ReportWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Copies difficulty files and their assets into difficulty folders.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Makes sure `base_path/folder_name` exists as a directory.
    ///
    /// Returns `Ok(true)` if the folder was created and `Ok(false)` if it was
    /// already there. An existing entry that is not a directory is an error.
    pub fn ensure_folder(base_path: &Path, folder_name: &str) -> OrganizeResult<bool> {
        let folder = base_path.join(folder_name);

        if folder.is_dir() {
            return Ok(false);
        }

        match fs::create_dir(&folder) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && folder.is_dir() => {
                Ok(false)
            }
            Err(e) => Err(OrganizeError::DirectoryCreationFailed {
                path: folder,
                source: e,
            }),
        }
    }

    /// Reports what `ensure_folder` would do without touching the filesystem.
    ///
    /// Returns `Ok(true)` if the folder would be created, `Ok(false)` if it would
    /// be reused, and the same error `ensure_folder` gives when a non-directory
    /// entry already holds the name.
    pub fn check_folder(base_path: &Path, folder_name: &str) -> OrganizeResult<bool> {
        let folder = base_path.join(folder_name);

        if folder.is_dir() {
            Ok(false)
        } else if folder.exists() {
            Err(OrganizeError::DirectoryCreationFailed {
                path: folder,
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "a file with this name already exists",
                ),
            })
        } else {
            Ok(true)
        }
    }

    /// Turns an asset reference into a path relative to the mapset folder.
    ///
    /// Returns `None` for absolute references and references that climb out of
    /// the mapset folder, since those cannot be placed inside the output folder.
    pub fn relative_reference(reference: impl AsRef<Path>) -> Option<PathBuf> {
        let mut relative = PathBuf::new();
        for component in reference.as_ref().components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if relative.as_os_str().is_empty() {
            None
        } else {
            Some(relative)
        }
    }

    /// Copies `base_path/relative` to `folder/relative`, overwriting any existing file.
    ///
    /// Intermediate directories under `folder` are created for nested references.
    pub fn copy_into(base_path: &Path, folder: &Path, relative: &Path) -> OrganizeResult<PathBuf> {
        let source = base_path.join(relative);
        let destination = folder.join(relative);

        if let Some(parent) = destination.parent()
            && parent != folder
        {
            fs::create_dir_all(parent).map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::copy(&source, &destination).map_err(|e| OrganizeError::CopyFailed {
            source: source.clone(),
            destination: destination.clone(),
            source_error: e,
        })?;

        Ok(destination)
    }

    /// Places one referenced asset into `folder`.
    ///
    /// A missing or unsafe reference is not an error; it is returned as an
    /// outcome so the caller can warn and move on. With `dry_run` set nothing is
    /// written.
    pub fn place_asset(
        base_path: &Path,
        folder: &Path,
        role: AssetRole,
        reference: impl AsRef<Path>,
        dry_run: bool,
    ) -> AssetOutcome {
        let reference = reference.as_ref();
        let Some(relative) = Self::relative_reference(reference) else {
            return AssetOutcome::UnsafeReference {
                role,
                reference: reference.to_path_buf(),
            };
        };

        let source = base_path.join(&relative);
        if !source.is_file() {
            return AssetOutcome::Missing { role, source };
        }

        if dry_run {
            return AssetOutcome::WouldCopy {
                role,
                source,
                destination: folder.join(&relative),
            };
        }

        match Self::copy_into(base_path, folder, &relative) {
            Ok(destination) => AssetOutcome::Copied {
                role,
                mime_type: sniff_mime_type(&source),
                source,
                destination,
            },
            Err(error) => AssetOutcome::Failed { role, error },
        }
    }
}

/// Detects the MIME type of a file from its leading bytes.
fn sniff_mime_type(path: &Path) -> Option<String> {
    infer::get_from_path(path)
        .ok()
        .flatten()
        .map(|kind| kind.mime_type().to_string())
}
