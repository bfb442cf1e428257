/// Folder-name derivation for organized difficulties.
use crate::metadata::DifficultyMetadata;

/// Characters that are not allowed in folder names on common filesystems.
pub const RESERVED_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces every reserved character with `_`.
///
/// The result contains no reserved characters, so applying it twice gives the
/// same string as applying it once.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Returns the label identifying the difficulty: its version, or the
/// difficulty file name without extension when no version is set.
pub fn base_label(meta: &DifficultyMetadata) -> String {
    if let Some(version) = meta.version() {
        return version.to_string();
    }

    meta.source_path
        .file_stem()
        .or_else(|| meta.source_path.file_name())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Computes the output folder name for a difficulty.
///
/// With both artist and title present the name is `Artist - Title [Label]`,
/// otherwise it is just the label. The result is always sanitized.
///
/// # Examples
///
/// ```
/// use mapset_organizer::metadata::extract_from_str;
/// use mapset_organizer::naming::folder_name;
/// use std::path::Path;
///
/// let meta = extract_from_str(
///     Path::new("diff.osu"),
///     "AudioFilename: a.mp3\nTitle:Foo\nArtist:Bar\nVersion:Hard\n",
/// )
/// .unwrap();
/// assert_eq!(folder_name(&meta), "Bar - Foo [Hard]");
/// ```
pub fn folder_name(meta: &DifficultyMetadata) -> String {
    let label = sanitize(&base_label(meta));

    match (meta.artist(), meta.title()) {
        (Some(artist), Some(title)) => sanitize(&format!("{} - {} [{}]", artist, title, label)),
        _ => label,
    }
}

/// Returns true if `name` can be used as a single child directory name.
pub fn is_usable_folder_name(name: &str) -> bool {
    !name.trim().is_empty() && name != "." && name != ".."
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn meta(
        file: &str,
        artist: Option<&str>,
        title: Option<&str>,
        version: Option<&str>,
    ) -> DifficultyMetadata {
        DifficultyMetadata {
            source_path: PathBuf::from(file),
            audio_filename: "audio.mp3".to_string(),
            background_filename: None,
            title: title.map(str::to_string),
            artist: artist.map(str::to_string),
            version: version.map(str::to_string),
            read_error: None,
        }
    }

    #[test]
    fn test_sanitize_replaces_reserved_chars() {
        assert_eq!(sanitize(r#"a\b/c:d*e?f"g<h>i|j"#), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize("plain name [Hard]"), "plain name [Hard]");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "",
            "Hard",
            "A/B: C?",
            r#"<<"*"||\\"#,
            "日本語: タイトル",
            "____",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_folder_name_with_artist_and_title() {
        let m = meta("diff.osu", Some("A"), Some("B"), Some("C"));
        assert_eq!(folder_name(&m), sanitize("A - B [C]"));
    }

    #[test]
    fn test_folder_name_version_only() {
        let m = meta("diff.osu", None, None, Some("C"));
        assert_eq!(folder_name(&m), sanitize("C"));

        let blank = meta("diff.osu", Some("  "), Some("B"), Some("C"));
        assert_eq!(folder_name(&blank), "C");
    }

    #[test]
    fn test_folder_name_falls_back_to_file_stem() {
        let m = meta("/maps/diff.osu", None, None, None);
        assert_eq!(folder_name(&m), sanitize("diff"));

        let blank_version = meta("/maps/diff.osu", None, None, Some(" "));
        assert_eq!(folder_name(&blank_version), "diff");
    }

    #[test]
    fn test_folder_name_with_stem_and_artist_title() {
        let m = meta("/maps/Normal.osu", Some("Artist"), Some("Song"), None);
        assert_eq!(folder_name(&m), "Artist - Song [Normal]");
    }

    #[test]
    fn test_folder_name_sanitizes_every_part() {
        let m = meta("x.osu", Some("AC/DC"), Some("What?"), Some("Hard: 2"));
        assert_eq!(folder_name(&m), "AC_DC - What_ [Hard_ 2]");
    }

    #[test]
    fn test_usable_folder_names() {
        assert!(is_usable_folder_name("Hard"));
        assert!(!is_usable_folder_name(""));
        assert!(!is_usable_folder_name("   "));
        assert!(!is_usable_folder_name("."));
        assert!(!is_usable_folder_name(".."));
    }
}
