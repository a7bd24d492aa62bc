//! Typed records for the three BattleScribe data file kinds
//!
//! The readers in [`crate::files::reader`] construct these directly from the
//! document they parsed, so downstream code dispatches on the closed
//! [`DataFile`] enum instead of inspecting runtime types.

use crate::files::classify::DataKind;
use crate::files::index::DataIndex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogue {
    pub id: String,
    pub name: String,
    pub revision: i32,
    pub battle_scribe_version: String,
    pub game_system_id: String,
    pub game_system_revision: i32,
    pub author_name: String,
    pub author_contact: String,
    pub author_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSystem {
    pub id: String,
    pub name: String,
    pub revision: i32,
    pub battle_scribe_version: String,
    pub author_name: String,
    pub author_contact: String,
    pub author_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    /// Rosters carry no id attribute; stays at its zero value.
    pub id: String,
    pub name: String,
    pub description: String,
    pub battle_scribe_version: String,
    pub points: f64,
    pub points_limit: f64,
    pub game_system_id: String,
    pub game_system_name: String,
    pub game_system_revision: i32,
    pub author_name: String,
    pub author_contact: String,
    pub author_url: String,
}

/// A parsed data file of one of the three concrete kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum DataFile {
    Catalogue(Catalogue),
    GameSystem(GameSystem),
    Roster(Roster),
}

impl DataFile {
    pub fn kind(&self) -> DataKind {
        match self {
            DataFile::Catalogue(_) => DataKind::Catalogue,
            DataFile::GameSystem(_) => DataKind::GameSystem,
            DataFile::Roster(_) => DataKind::Roster,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DataFile::Catalogue(c) => &c.id,
            DataFile::GameSystem(g) => &g.id,
            DataFile::Roster(r) => &r.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DataFile::Catalogue(c) => &c.name,
            DataFile::GameSystem(g) => &g.name,
            DataFile::Roster(r) => &r.name,
        }
    }

    /// Rosters carry no revision attribute and report zero.
    pub fn revision(&self) -> i32 {
        match self {
            DataFile::Catalogue(c) => c.revision,
            DataFile::GameSystem(g) => g.revision,
            DataFile::Roster(_) => 0,
        }
    }

    pub fn battle_scribe_version(&self) -> &str {
        match self {
            DataFile::Catalogue(c) => &c.battle_scribe_version,
            DataFile::GameSystem(g) => &g.battle_scribe_version,
            DataFile::Roster(r) => &r.battle_scribe_version,
        }
    }

    pub fn author_name(&self) -> &str {
        match self {
            DataFile::Catalogue(c) => &c.author_name,
            DataFile::GameSystem(g) => &g.author_name,
            DataFile::Roster(r) => &r.author_name,
        }
    }

    pub fn author_contact(&self) -> &str {
        match self {
            DataFile::Catalogue(c) => &c.author_contact,
            DataFile::GameSystem(g) => &g.author_contact,
            DataFile::Roster(r) => &r.author_contact,
        }
    }

    pub fn author_url(&self) -> &str {
        match self {
            DataFile::Catalogue(c) => &c.author_url,
            DataFile::GameSystem(g) => &g.author_url,
            DataFile::Roster(r) => &r.author_url,
        }
    }
}

/// One cached repository file: the compressed bytes plus the typed record
/// they were derived from. The generated index is cached alongside the data
/// files under its well-known name.
#[derive(Debug, Clone)]
pub enum RepoFile {
    Data { file: DataFile, data: Vec<u8> },
    Index { index: DataIndex, data: Vec<u8> },
}

impl RepoFile {
    /// The compressed bytes served for this file.
    pub fn data(&self) -> &[u8] {
        match self {
            RepoFile::Data { data, .. } => data,
            RepoFile::Index { data, .. } => data,
        }
    }

    pub fn as_data_file(&self) -> Option<&DataFile> {
        match self {
            RepoFile::Data { file, .. } => Some(file),
            RepoFile::Index { .. } => None,
        }
    }
}
