//! The generated repository index document
//!
//! One index is built per repository on every cache refresh. It lists every
//! data file in the latest release so clients can discover files without
//! listing the archive. The index is persisted as a versioned XML document
//! using the same attribute conventions as the data files themselves, then
//! wrapped in a single-entry zip under `index.bsi`.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::Result;
use crate::files::classify::DataKind;
use crate::files::model::DataFile;

/// Schema version stamped on the generated index document.
pub const BATTLESCRIBE_VERSION: &str = "2.02";

/// One index line: identity and version attributes lifted from a parsed data
/// file, keyed by the compressed file name it is served under.
#[derive(Debug, Clone, PartialEq)]
pub struct DataIndexEntry {
    pub file_path: String,
    pub data_type: DataKind,
    pub data_id: String,
    pub data_name: String,
    pub data_battle_scribe_version: String,
    pub data_revision: i32,
    pub last_modified: Option<OffsetDateTime>,
}

impl DataIndexEntry {
    /// Build an entry from a parsed data file. The closed [`DataFile`] enum
    /// guarantees the entry's type matches exactly one concrete kind.
    pub fn new(file_path: impl Into<String>, file: &DataFile) -> Self {
        Self {
            file_path: file_path.into(),
            data_type: file.kind(),
            data_id: file.id().to_string(),
            data_name: file.name().to_string(),
            data_battle_scribe_version: file.battle_scribe_version().to_string(),
            data_revision: file.revision(),
            last_modified: None,
        }
    }
}

/// The per-repository manifest of data files.
#[derive(Debug, Clone, Default)]
pub struct DataIndex {
    pub name: String,
    pub index_url: String,
    pub repository_urls: Vec<String>,
    pub entries: Vec<DataIndexEntry>,
}

impl DataIndex {
    pub fn new(
        name: impl Into<String>,
        index_url: impl Into<String>,
        repository_urls: Vec<String>,
    ) -> Self {
        // Preserve order, drop duplicates
        let mut unique = Vec::new();
        for url in repository_urls {
            if !unique.contains(&url) {
                unique.push(url);
            }
        }

        Self {
            name: name.into(),
            index_url: index_url.into(),
            repository_urls: unique,
            entries: Vec::new(),
        }
    }

    pub fn push_entry(&mut self, entry: DataIndexEntry) {
        self.entries.push(entry);
    }

    /// Serialize the index to its XML document form.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let root = writer
            .create_element("dataIndex")
            .with_attribute(("battleScribeVersion", BATTLESCRIBE_VERSION))
            .with_attribute(("name", self.name.as_str()))
            .with_attribute(("indexUrl", self.index_url.as_str()));

        root.write_inner_content(|writer| -> std::io::Result<()> {
            writer
                .create_element("repositoryUrls")
                .write_inner_content(|writer| -> std::io::Result<()> {
                    for url in &self.repository_urls {
                        writer
                            .create_element("repositoryUrl")
                            .with_attribute(("value", url.as_str()))
                            .write_empty()?;
                    }
                    Ok(())
                })?;

            writer
                .create_element("dataIndexEntries")
                .write_inner_content(|writer| -> std::io::Result<()> {
                    for entry in &self.entries {
                        let mut element = writer
                            .create_element("dataIndexEntry")
                            .with_attribute(("filePath", entry.file_path.as_str()))
                            .with_attribute(("dataType", entry.data_type.as_str()))
                            .with_attribute(("dataId", entry.data_id.as_str()))
                            .with_attribute(("dataName", entry.data_name.as_str()))
                            .with_attribute((
                                "dataBattleScribeVersion",
                                entry.data_battle_scribe_version.as_str(),
                            ))
                            .with_attribute((
                                "dataRevision",
                                entry.data_revision.to_string().as_str(),
                            ));
                        if let Some(last_modified) = entry.last_modified {
                            let stamp = last_modified
                                .format(&Rfc3339)
                                .map_err(|e| std::io::Error::other(e))?;
                            element = element.with_attribute(("lastModified", stamp.as_str()));
                        }
                        element.write_empty()?;
                    }
                    Ok(())
                })?;

            Ok(())
        })?;

        Ok(writer.into_inner().into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::model::GameSystem;

    fn sample_entry() -> DataIndexEntry {
        let file = DataFile::GameSystem(GameSystem {
            id: "gs1".to_string(),
            name: "WH40K".to_string(),
            revision: 7,
            battle_scribe_version: "2.02".to_string(),
            ..Default::default()
        });
        DataIndexEntry::new("wh40k.gstz", &file)
    }

    #[test]
    fn test_entry_from_data_file() {
        let entry = sample_entry();
        assert_eq!(entry.file_path, "wh40k.gstz");
        assert_eq!(entry.data_type, DataKind::GameSystem);
        assert_eq!(entry.data_id, "gs1");
        assert_eq!(entry.data_revision, 7);
    }

    #[test]
    fn test_repository_urls_deduplicated_in_order() {
        let index = DataIndex::new(
            "repo",
            "http://example.com/repos/repo/index.bsi",
            vec![
                "http://a.example".to_string(),
                "http://b.example".to_string(),
                "http://a.example".to_string(),
            ],
        );
        assert_eq!(index.repository_urls, vec!["http://a.example", "http://b.example"]);
    }

    #[test]
    fn test_to_xml() {
        let mut index = DataIndex::new(
            "repo",
            "http://example.com/repos/repo/index.bsi",
            vec!["http://a.example".to_string()],
        );
        index.push_entry(sample_entry());

        let xml = String::from_utf8(index.to_xml().unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains("<dataIndex battleScribeVersion=\"2.02\" name=\"repo\""));
        assert!(xml.contains("<repositoryUrl value=\"http://a.example\"/>"));
        assert!(xml.contains("dataType=\"gamesystem\""));
        assert!(xml.contains("dataId=\"gs1\""));
        assert!(xml.contains("dataRevision=\"7\""));
    }
}
