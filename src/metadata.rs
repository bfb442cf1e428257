/// Metadata extraction from `.osu` difficulty files.
///
/// A difficulty file is read line by line. Each line is matched against a small
/// table of field rules; the background rule only applies while the reader is
/// inside the `[Events]` section. Repeated fields overwrite earlier values.
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Fields extracted from one difficulty file.
#[derive(Debug)]
pub struct DifficultyMetadata {
    /// Path of the difficulty file the fields were read from.
    pub source_path: PathBuf,
    /// Audio file referenced by `AudioFilename:`. Never empty.
    pub audio_filename: String,
    /// Background image declared in the `[Events]` section.
    pub background_filename: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Difficulty label (`Version:`).
    pub version: Option<String>,
    /// Error that stopped reading before the end of the file. The other
    /// fields hold whatever was parsed up to that point.
    pub read_error: Option<std::io::Error>,
}

impl DifficultyMetadata {
    /// Returns the background reference if it is set and not blank.
    pub fn background(&self) -> Option<&str> {
        non_blank(self.background_filename.as_deref())
    }

    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    pub fn artist(&self) -> Option<&str> {
        non_blank(self.artist.as_deref())
    }

    pub fn version(&self) -> Option<&str> {
        non_blank(self.version.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reasons a difficulty file cannot be used.
#[derive(Debug)]
pub enum ExtractError {
    /// No non-empty `AudioFilename:` line was found.
    MissingAudioReference { path: PathBuf },
    /// The file could not be opened or read at all.
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAudioReference { path } => {
                write!(f, "no audio filename found in {}", path.display())
            }
            Self::Unreadable { path, source } => {
                write!(f, "could not read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Where the reader currently is in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Events,
}

impl Section {
    /// Applies a line to the state machine. Only header lines change state.
    fn next(self, line: &str) -> Self {
        let trimmed = line.trim();
        if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
            return self;
        }
        if trimmed == "[Events]" {
            Section::Events
        } else {
            Section::Outside
        }
    }
}

/// Fields collected so far, before validation.
#[derive(Debug, Default)]
struct PartialMetadata {
    audio_filename: Option<String>,
    background_filename: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    version: Option<String>,
}

type Setter = fn(&mut PartialMetadata, String);

struct FieldRule {
    regex: Regex,
    events_only: bool,
    apply: Setter,
}

fn rule(pattern: &str, events_only: bool, apply: Setter) -> FieldRule {
    FieldRule {
        regex: Regex::new(pattern).expect("field pattern is a valid regex"),
        events_only,
        apply,
    }
}

/// Field rules in match order. Every rule is tried on every line.
fn field_rules() -> &'static [FieldRule] {
    static RULES: OnceLock<Vec<FieldRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            rule(r"AudioFilename:\s*(.+)", false, |m, v| {
                m.audio_filename = Some(v)
            }),
            rule(r"Title:(.+)", false, |m, v| m.title = Some(v)),
            rule(r"Artist:(.+)", false, |m, v| m.artist = Some(v)),
            rule(r"Version:(.+)", false, |m, v| m.version = Some(v)),
            rule(r#"\d+,\d+,"(.+)","#, true, |m, v| {
                m.background_filename = Some(v)
            }),
        ]
    })
}

impl PartialMetadata {
    fn scan_line(&mut self, line: &str, section: Section) {
        for rule in field_rules() {
            if rule.events_only && section != Section::Events {
                continue;
            }
            if let Some(value) = rule.regex.captures(line).and_then(|c| c.get(1)) {
                (rule.apply)(self, value.as_str().trim().to_string());
            }
        }
    }

    fn finish(
        self,
        source_path: &Path,
        read_error: Option<std::io::Error>,
    ) -> Result<DifficultyMetadata, ExtractError> {
        let audio_filename = self
            .audio_filename
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ExtractError::MissingAudioReference {
                path: source_path.to_path_buf(),
            })?;

        Ok(DifficultyMetadata {
            source_path: source_path.to_path_buf(),
            audio_filename,
            background_filename: self.background_filename,
            title: self.title,
            artist: self.artist,
            version: self.version,
            read_error,
        })
    }
}

/// Extracts metadata from difficulty text that is already in memory.
///
/// `source_path` is only recorded in the result; nothing is read from it.
pub fn extract_from_str(
    source_path: &Path,
    content: &str,
) -> Result<DifficultyMetadata, ExtractError> {
    let mut fields = PartialMetadata::default();
    let mut section = Section::Outside;

    for line in content.lines() {
        section = section.next(line);
        fields.scan_line(line, section);
    }

    fields.finish(source_path, None)
}

/// Reads and extracts metadata from a difficulty file on disk.
///
/// # Errors
///
/// Returns `ExtractError::Unreadable` if the file cannot be opened, and
/// `ExtractError::MissingAudioReference` if no audio reference was found.
pub fn extract(path: &Path) -> Result<DifficultyMetadata, ExtractError> {
    let file = File::open(path).map_err(|e| ExtractError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;

    extract_from_reader(path, BufReader::new(file))
}

/// Extracts metadata from a line-oriented reader.
///
/// Lines are decoded lossily so files in legacy encodings still yield their
/// ASCII keys. A read error part way through keeps whatever was parsed before
/// it and is returned in `DifficultyMetadata::read_error`.
pub fn extract_from_reader<R: BufRead>(
    source_path: &Path,
    mut reader: R,
) -> Result<DifficultyMetadata, ExtractError> {
    let mut fields = PartialMetadata::default();
    let mut section = Section::Outside;
    let mut buf = Vec::new();
    let mut read_error = None;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let decoded = String::from_utf8_lossy(&buf);
                let line = decoded.trim_end_matches(['\n', '\r']);
                section = section.next(line);
                fields.scan_line(line, section);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                read_error = Some(e);
                break;
            }
        }
    }

    fields.finish(source_path, read_error)
}
