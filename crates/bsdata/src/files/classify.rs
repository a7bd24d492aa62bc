//! Path/name classification for BattleScribe data files
//!
//! Pure string transforms mapping file names onto the three data file kinds
//! and their compressed/uncompressed container forms. A data file is either
//! raw XML (`.gst`/`.cat`/`.ros`) or wrapped in a single-entry zip
//! (`.gstz`/`.catz`/`.rosz`, with legacy `.gst.zip`/`.cat.zip`/`.ros.zip`
//! spellings that normalize to the modern ones).

pub const ROSTER_EXTENSION: &str = ".ros";
pub const CATALOGUE_EXTENSION: &str = ".cat";
pub const GAME_SYSTEM_EXTENSION: &str = ".gst";

pub const ROSTER_COMPRESSED_EXTENSION: &str = ".rosz";
pub const CATALOGUE_COMPRESSED_EXTENSION: &str = ".catz";
pub const GAME_SYSTEM_COMPRESSED_EXTENSION: &str = ".gstz";

pub const ROSTER_COMPRESSED_EXTENSION_OLD: &str = ".ros.zip";
pub const CATALOGUE_COMPRESSED_EXTENSION_OLD: &str = ".cat.zip";
pub const GAME_SYSTEM_COMPRESSED_EXTENSION_OLD: &str = ".gst.zip";

pub const INDEX_COMPRESSED_EXTENSION: &str = ".bsi";
pub const XML_EXTENSION: &str = ".xml";
pub const INDEX_FILE_NAME: &str = "index.xml";
pub const INDEX_COMPRESSED_FILE_NAME: &str = "index.bsi";

/// The three concrete data file kinds.
///
/// Declared in the order files sort in listings: game systems first, then
/// catalogues, then rosters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataKind {
    GameSystem,
    Catalogue,
    Roster,
}

impl DataKind {
    /// Wire value used in the index document (`gamesystem`/`catalogue`/`roster`)
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::GameSystem => "gamesystem",
            DataKind::Catalogue => "catalogue",
            DataKind::Roster => "roster",
        }
    }

    pub fn from_str(value: &str) -> Option<DataKind> {
        match value.to_ascii_lowercase().as_str() {
            "gamesystem" => Some(DataKind::GameSystem),
            "catalogue" => Some(DataKind::Catalogue),
            "roster" => Some(DataKind::Roster),
            _ => None,
        }
    }
}

fn normalized(path: &str) -> String {
    path.trim().to_ascii_lowercase()
}

/// Returns the file name component of a path (no directories).
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Strips the last extension from a file name.
fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Classify a path as one of the three data file kinds, in either container
/// form. Returns `None` for anything else, including the index file.
pub fn classify(path: &str) -> Option<DataKind> {
    if is_game_system_path(path) {
        Some(DataKind::GameSystem)
    } else if is_catalogue_path(path) {
        Some(DataKind::Catalogue)
    } else if is_roster_path(path) {
        Some(DataKind::Roster)
    } else {
        None
    }
}

pub fn is_roster_path(path: &str) -> bool {
    let path = normalized(path);
    path.ends_with(ROSTER_EXTENSION)
        || path.ends_with(ROSTER_COMPRESSED_EXTENSION)
        || path.ends_with(ROSTER_COMPRESSED_EXTENSION_OLD)
}

pub fn is_catalogue_path(path: &str) -> bool {
    let path = normalized(path);
    path.ends_with(CATALOGUE_EXTENSION)
        || path.ends_with(CATALOGUE_COMPRESSED_EXTENSION)
        || path.ends_with(CATALOGUE_COMPRESSED_EXTENSION_OLD)
}

pub fn is_game_system_path(path: &str) -> bool {
    let path = normalized(path);
    path.ends_with(GAME_SYSTEM_EXTENSION)
        || path.ends_with(GAME_SYSTEM_COMPRESSED_EXTENSION)
        || path.ends_with(GAME_SYSTEM_COMPRESSED_EXTENSION_OLD)
}

pub fn is_data_file_path(path: &str) -> bool {
    classify(path).is_some()
}

pub fn is_index_path(path: &str) -> bool {
    let path = normalized(path);
    path.ends_with(INDEX_COMPRESSED_EXTENSION) || path.ends_with(INDEX_FILE_NAME)
}

pub fn is_compressed_path(path: &str) -> bool {
    let path = normalized(path);
    path.ends_with(CATALOGUE_COMPRESSED_EXTENSION)
        || path.ends_with(CATALOGUE_COMPRESSED_EXTENSION_OLD)
        || path.ends_with(GAME_SYSTEM_COMPRESSED_EXTENSION)
        || path.ends_with(GAME_SYSTEM_COMPRESSED_EXTENSION_OLD)
        || path.ends_with(ROSTER_COMPRESSED_EXTENSION)
        || path.ends_with(ROSTER_COMPRESSED_EXTENSION_OLD)
        || path.ends_with(INDEX_COMPRESSED_EXTENSION)
}

/// Legacy `.x.zip` names normalize to the modern compressed extension.
fn normalize_legacy_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    for (old, new) in [
        (GAME_SYSTEM_COMPRESSED_EXTENSION_OLD, GAME_SYSTEM_COMPRESSED_EXTENSION),
        (CATALOGUE_COMPRESSED_EXTENSION_OLD, CATALOGUE_COMPRESSED_EXTENSION),
        (ROSTER_COMPRESSED_EXTENSION_OLD, ROSTER_COMPRESSED_EXTENSION),
    ] {
        if lower.ends_with(old) {
            return format!("{}{}", &name[..name.len() - old.len()], new);
        }
    }
    name.to_string()
}

/// Returns the file name (no path) with a compressed extension
/// (`.gstz`/`.catz`/`.rosz`/`.bsi`). Unrecognized names pass through.
pub fn compressed_file_name(path: &str) -> String {
    let name = normalize_legacy_name(base_name(path));

    if is_compressed_path(&name) {
        return name;
    }

    if is_game_system_path(&name) {
        format!("{}{}", stem(&name), GAME_SYSTEM_COMPRESSED_EXTENSION)
    } else if is_catalogue_path(&name) {
        format!("{}{}", stem(&name), CATALOGUE_COMPRESSED_EXTENSION)
    } else if is_roster_path(&name) {
        format!("{}{}", stem(&name), ROSTER_COMPRESSED_EXTENSION)
    } else if is_index_path(&name) {
        format!("{}{}", stem(&name), INDEX_COMPRESSED_EXTENSION)
    } else {
        name
    }
}

/// Returns the file name (no path) with an uncompressed extension
/// (`.gst`/`.cat`/`.ros`/`.xml`). Unrecognized names pass through.
pub fn uncompressed_file_name(path: &str) -> String {
    let name = normalize_legacy_name(base_name(path));

    if !is_compressed_path(&name) {
        return name;
    }

    if is_game_system_path(&name) {
        format!("{}{}", stem(&name), GAME_SYSTEM_EXTENSION)
    } else if is_catalogue_path(&name) {
        format!("{}{}", stem(&name), CATALOGUE_EXTENSION)
    } else if is_roster_path(&name) {
        format!("{}{}", stem(&name), ROSTER_EXTENSION)
    } else if is_index_path(&name) {
        format!("{}{}", stem(&name), XML_EXTENSION)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify("wh40k.gst"), Some(DataKind::GameSystem));
        assert_eq!(classify("marines.cat"), Some(DataKind::Catalogue));
        assert_eq!(classify("my list.ros"), Some(DataKind::Roster));
        assert_eq!(classify("wh40k.gstz"), Some(DataKind::GameSystem));
        assert_eq!(classify("marines.catz"), Some(DataKind::Catalogue));
        assert_eq!(classify("my list.rosz"), Some(DataKind::Roster));
        assert_eq!(classify("legacy.gst.zip"), Some(DataKind::GameSystem));
        assert_eq!(classify("legacy.cat.zip"), Some(DataKind::Catalogue));
        assert_eq!(classify("legacy.ros.zip"), Some(DataKind::Roster));
        assert_eq!(classify("index.bsi"), None);
        assert_eq!(classify("README.md"), None);
        assert_eq!(classify("archive.zip"), None);
    }

    #[test]
    fn test_classify_is_case_insensitive_and_trims() {
        assert_eq!(classify("  Marines.CAT  "), Some(DataKind::Catalogue));
        assert_eq!(classify("WH40K.GSTZ"), Some(DataKind::GameSystem));
    }

    #[test]
    fn test_index_paths() {
        assert!(is_index_path("index.bsi"));
        assert!(is_index_path("index.xml"));
        assert!(is_index_path("some/dir/index.bsi"));
        assert!(!is_index_path("marines.catz"));
    }

    #[test]
    fn test_compressed_round_trip() {
        for name in ["a.gst", "b.cat", "c.ros", "d.gstz", "e.cat.zip", "index.xml"] {
            // Stable under repeated classification
            assert_eq!(classify(name), classify(name));
            // compressed(uncompressed(x)) == compressed(x)
            assert_eq!(
                compressed_file_name(&uncompressed_file_name(name)),
                compressed_file_name(name)
            );
        }
    }

    #[test]
    fn test_compressed_names_are_compressed() {
        for name in ["a.gst", "b.cat", "c.ros", "d.catz", "e.ros.zip"] {
            assert!(is_compressed_path(&compressed_file_name(name)));
            assert!(!is_compressed_path(&uncompressed_file_name(name)));
        }
    }

    #[test]
    fn test_legacy_names_normalize() {
        assert_eq!(compressed_file_name("old.gst.zip"), "old.gstz");
        assert_eq!(compressed_file_name("old.cat.zip"), "old.catz");
        assert_eq!(compressed_file_name("old.ros.zip"), "old.rosz");
        assert_eq!(uncompressed_file_name("old.cat.zip"), "old.cat");
    }

    #[test]
    fn test_name_transforms_strip_directories() {
        assert_eq!(compressed_file_name("repo-v1.0/data/marines.cat"), "marines.catz");
        assert_eq!(uncompressed_file_name("repo-v1.0/data/marines.catz"), "marines.cat");
    }

    #[test]
    fn test_unrecognized_names_pass_through() {
        assert_eq!(compressed_file_name("notes.txt"), "notes.txt");
        assert_eq!(uncompressed_file_name("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_index_name_transforms() {
        assert_eq!(compressed_file_name("index.xml"), "index.bsi");
        assert_eq!(uncompressed_file_name("index.bsi"), "index.xml");
    }
}
