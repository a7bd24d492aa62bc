//! Data file handling: classification, containers, documents and the index

pub mod archive;
pub mod classify;
pub mod index;
pub mod model;
pub mod reader;

pub use classify::DataKind;
pub use index::{BATTLESCRIBE_VERSION, DataIndex, DataIndexEntry};
pub use model::{Catalogue, DataFile, GameSystem, RepoFile, Roster};
