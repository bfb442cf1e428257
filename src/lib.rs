//! mapset-organizer - split an osu! mapset folder into per-difficulty folders
//!
//! This library reads the metadata of each `.osu` difficulty file in a mapset
//! folder, derives a readable folder name for it, and copies the difficulty file
//! together with its audio and background image into that folder. Original
//! files are left untouched.

pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod metadata;
pub mod naming;
pub mod output;

pub use config::{CompiledConfig, ConfigError, OrganizerConfig};
pub use file_organizer::{
    AssetOutcome, AssetRole, DifficultyOutcome, DifficultyResult, FileOrganizer, OrganizeError,
    OrganizeResult, RunSummary, SkipReason,
};
pub use metadata::{DifficultyMetadata, ExtractError};

pub use cli::{OrganizeOptions, run_cli, run_cli_with_config};
