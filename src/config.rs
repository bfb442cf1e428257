//! Organizer configuration.
//!
//! Settings are loaded from an optional TOML file. Every key has a default, so
//! running without a configuration file processes every `*.osu` file in the
//! mapset folder and copies all three assets.
//!
//! # Configuration File Format
//!
//! ```toml
//! [organizer]
//! extension = "osu"
//! copy_audio = true
//! copy_background = true
//!
//! [filters.exclude]
//! filenames = ["old version.osu"]
//! patterns = ["*(backup)*.osu"]
//! regex = ["^test_"]
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Which kind of exclude pattern failed to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Glob,
    Regex,
}

impl PatternKind {
    fn label(self) -> &'static str {
        match self {
            PatternKind::Glob => "glob",
            PatternKind::Regex => "regex",
        }
    }
}

/// Why a configuration could not be used.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    NotFound(PathBuf),
    /// The file exists but could not be read.
    Unreadable { path: PathBuf, reason: String },
    /// Bad TOML, or a setting with an unusable value.
    Invalid(String),
    /// An exclude pattern that does not compile.
    BadPattern {
        kind: PatternKind,
        pattern: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::Unreadable { path, reason } => {
                write!(f, "Cannot read configuration {}: {}", path.display(), reason)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::BadPattern {
                kind,
                pattern,
                reason,
            } => write!(
                f,
                "Invalid {} exclude pattern '{}': {}",
                kind.label(),
                pattern,
                reason
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub organizer: OrganizerSettings,

    #[serde(default)]
    pub filters: FilterRules,
}

/// What counts as a difficulty file and which assets to copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerSettings {
    /// Difficulty file suffix without the dot, matched case-insensitively.
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_true")]
    pub copy_audio: bool,

    #[serde(default = "default_true")]
    pub copy_background: bool,
}

fn default_extension() -> String {
    "osu".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OrganizerSettings {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            copy_audio: true,
            copy_background: true,
        }
    }
}

/// Rules for leaving difficulty files out of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Difficulty files matching any of these are not organized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Name of the per-folder configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".mapsetrc.toml";

/// Configuration files tried when none is given, in order.
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(
            PathBuf::from(home)
                .join(".config")
                .join("mapset-organizer")
                .join("config.toml"),
        );
    }
    paths
}

impl OrganizerConfig {
    /// Loads the configuration for a run.
    ///
    /// An explicit `config_path` must exist. Without one, the first existing
    /// file among `.mapsetrc.toml` in the working directory and
    /// `~/.config/mapset-organizer/config.toml` is used, and the built-in
    /// defaults apply when neither exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let chosen = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_paths().into_iter().find(|p| p.is_file()),
        };

        match chosen {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Compile configuration into the matcher used while listing the mapset folder.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        CompiledConfig::new(self)
    }
}

/// Configuration with all patterns pre-compiled.
#[derive(Debug)]
pub struct CompiledConfig {
    pub settings: OrganizerSettings,
    suffix: String,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledConfig {
    fn new(config: OrganizerConfig) -> Result<Self, ConfigError> {
        let exclude = config.filters.exclude;

        let exclude_patterns = exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::BadPattern {
                    kind: PatternKind::Glob,
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::BadPattern {
                    kind: PatternKind::Regex,
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let extension = config.organizer.extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(ConfigError::Invalid(
                "organizer.extension must not be empty".to_string(),
            ));
        }
        let suffix = format!(".{}", extension.to_lowercase());

        Ok(Self {
            settings: config.organizer,
            suffix,
            exclude_filenames: exclude.filenames.into_iter().collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// The dotted, lower-case suffix difficulty files must end with.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Returns true if `file_name` names a difficulty file that should be organized.
    ///
    /// The suffix is matched case-insensitively; exclusion rules are checked after.
    pub fn is_difficulty_file(&self, file_name: &str) -> bool {
        if !file_name.to_lowercase().ends_with(&self.suffix) {
            return false;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(toml: &str) -> CompiledConfig {
        OrganizerConfig::from_toml(toml)
            .expect("valid toml")
            .compile()
            .expect("valid patterns")
    }

    #[test]
    fn test_default_config() {
        let config = OrganizerConfig::default();
        assert_eq!(config.organizer.extension, "osu");
        assert!(config.organizer.copy_audio);
        assert!(config.organizer.copy_background);
        assert!(config.compile().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let compiled = compiled("");
        assert_eq!(compiled.suffix(), ".osu");
        assert!(compiled.settings.copy_audio);
    }

    #[test]
    fn test_suffix_matches_case_insensitively() {
        let compiled = compiled("");
        assert!(compiled.is_difficulty_file("Artist - Song (Mapper) [Hard].osu"));
        assert!(compiled.is_difficulty_file("LOUD.OSU"));
        assert!(compiled.is_difficulty_file("mixed.OsU"));
        assert!(!compiled.is_difficulty_file("audio.mp3"));
        assert!(!compiled.is_difficulty_file("notes.osu.bak"));
        assert!(!compiled.is_difficulty_file("storyboard.osb"));
    }

    #[test]
    fn test_custom_extension() {
        let compiled = compiled("[organizer]\nextension = \".OSB\"\n");
        assert_eq!(compiled.suffix(), ".osb");
        assert!(compiled.is_difficulty_file("story.osb"));
        assert!(!compiled.is_difficulty_file("diff.osu"));
    }

    #[test]
    fn test_empty_extension_is_rejected() {
        let result = OrganizerConfig::from_toml("[organizer]\nextension = \".\"\n")
            .expect("valid toml")
            .compile();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_asset_switches() {
        let compiled = compiled("[organizer]\ncopy_background = false\n");
        assert!(compiled.settings.copy_audio);
        assert!(!compiled.settings.copy_background);
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = compiled("[filters.exclude]\nfilenames = [\"old.osu\"]\n");
        assert!(!compiled.is_difficulty_file("old.osu"));
        assert!(compiled.is_difficulty_file("new.osu"));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let compiled = compiled("[filters.exclude]\npatterns = [\"*backup*\"]\n");
        assert!(!compiled.is_difficulty_file("map (backup).osu"));
        assert!(compiled.is_difficulty_file("map.osu"));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = compiled("[filters.exclude]\nregex = ['^test_.*\\.osu$']\n");
        assert!(!compiled.is_difficulty_file("test_easy.osu"));
        assert!(compiled.is_difficulty_file("easy.osu"));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let result = OrganizerConfig::from_toml("[filters.exclude]\nregex = [\"[invalid(\"]\n")
            .expect("valid toml")
            .compile();
        assert!(matches!(
            result,
            Err(ConfigError::BadPattern {
                kind: PatternKind::Regex,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_glob_pattern_returns_error() {
        let result = OrganizerConfig::from_toml("[filters.exclude]\npatterns = [\"[invalid\"]\n")
            .expect("valid toml")
            .compile();
        let err = result.expect_err("glob should be rejected");
        assert!(matches!(
            err,
            ConfigError::BadPattern {
                kind: PatternKind::Glob,
                ..
            }
        ));
        assert!(err.to_string().starts_with("Invalid glob exclude pattern '[invalid'"));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = OrganizerConfig::from_toml("[organizer\nextension = ");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_explicit_missing_config_file() {
        let result = OrganizerConfig::load(Some(Path::new("/non/existent/config.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_explicit_config_file_is_loaded() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[organizer]\ncopy_audio = false\n").expect("write config");

        let config = OrganizerConfig::load(Some(&path)).expect("config should load");
        assert!(!config.organizer.copy_audio);
        assert!(config.organizer.copy_background);
    }

    #[test]
    fn test_invalid_config_file_names_the_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[organizer\n").expect("write config");

        let err = OrganizerConfig::load(Some(&path)).expect_err("broken TOML should fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_directory_as_config_is_unreadable() {
        let dir = tempfile::TempDir::new().expect("temp dir");

        let result = OrganizerConfig::load(Some(dir.path()));
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }

    #[test]
    fn test_default_paths_start_with_local_file() {
        let paths = default_config_paths();
        assert_eq!(paths[0], PathBuf::from(LOCAL_CONFIG_FILE));
    }
}
