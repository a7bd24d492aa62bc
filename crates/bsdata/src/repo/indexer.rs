//! Repository indexer
//!
//! Turns one repository's uncompressed file buffers into the compressed,
//! indexed record set that gets cached and served. Indexing is atomic per
//! invocation: a reader failure or a precompressed input aborts the whole
//! pass and leaves no partial result.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::files::archive;
use crate::files::classify::{
    self, DataKind, INDEX_COMPRESSED_FILE_NAME, INDEX_FILE_NAME,
};
use crate::files::index::{DataIndex, DataIndexEntry};
use crate::files::model::{DataFile, RepoFile};
use crate::files::reader;

/// Index a repository's data files.
///
/// `files` maps file paths to uncompressed document bytes; the `BTreeMap`
/// keeps iteration deterministic so duplicate-id resolution is reproducible.
/// Paths that are not recognized data files are skipped. Paths already in
/// compressed form violate the caller contract and fail the pass.
///
/// The returned map is keyed by compressed file name and includes the
/// generated index itself under `index.bsi`.
pub fn index_repository(
    repository_name: &str,
    index_url: &str,
    repository_urls: Vec<String>,
    files: &BTreeMap<String, Vec<u8>>,
) -> Result<HashMap<String, RepoFile>> {
    let mut index = DataIndex::new(repository_name, index_url, repository_urls);
    let mut output = HashMap::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (path, bytes) in files {
        let Some(kind) = classify::classify(path) else {
            debug!("skipping unrecognized file {path}");
            continue;
        };
        if classify::is_compressed_path(path) {
            return Err(Error::PrecompressedInput(path.clone()));
        }

        let file = match kind {
            DataKind::GameSystem => DataFile::GameSystem(reader::read_game_system(bytes)?),
            DataKind::Catalogue => DataFile::Catalogue(reader::read_catalogue(bytes)?),
            DataKind::Roster => DataFile::Roster(reader::read_roster(bytes)?),
        };

        // First occurrence of an id wins
        if !seen_ids.insert(file.id().to_string()) {
            debug!("skipping duplicate data file id {} at {path}", file.id());
            continue;
        }

        let compressed_name = classify::compressed_file_name(path);
        let data = archive::pack(&classify::uncompressed_file_name(path), bytes)?;
        index.push_entry(DataIndexEntry::new(&compressed_name, &file));
        output.insert(compressed_name, RepoFile::Data { file, data });
    }

    let document = index.to_xml()?;
    let data = archive::pack(INDEX_FILE_NAME, &document)?;
    output.insert(
        INDEX_COMPRESSED_FILE_NAME.to_string(),
        RepoFile::Index { index, data },
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME_SYSTEM_XML: &[u8] = br#"<gameSystem id="gs1" battleScribeVersion="2.02"
        revision="5" name="WH40K" authorName="a" authorContact="b" authorUrl="c"/>"#;

    fn catalogue_xml(id: &str, name: &str) -> Vec<u8> {
        format!(
            r#"<catalogue id="{id}" gameSystemId="gs1" battleScribeVersion="2.02"
                revision="3" name="{name}" authorName="a" authorContact="b" authorUrl="c"/>"#
        )
        .into_bytes()
    }

    fn sample_files() -> BTreeMap<String, Vec<u8>> {
        let mut files = BTreeMap::new();
        files.insert("wh40k.gst".to_string(), GAME_SYSTEM_XML.to_vec());
        files.insert("marines.cat".to_string(), catalogue_xml("c1", "Marines"));
        files.insert("README.md".to_string(), b"docs".to_vec());
        files
    }

    fn index_of(output: &HashMap<String, RepoFile>) -> &DataIndex {
        match output.get(INDEX_COMPRESSED_FILE_NAME).unwrap() {
            RepoFile::Index { index, .. } => index,
            other => panic!("expected index, got {other:?}"),
        }
    }

    #[test]
    fn test_index_repository() {
        let output = index_repository(
            "test-repo",
            "http://example.com/repos/test-repo/index.bsi",
            Vec::new(),
            &sample_files(),
        )
        .unwrap();

        // Two data files plus the index, all under compressed names
        assert_eq!(output.len(), 3);
        assert!(output.contains_key("wh40k.gstz"));
        assert!(output.contains_key("marines.catz"));
        assert!(output.contains_key(INDEX_COMPRESSED_FILE_NAME));

        let index = index_of(&output);
        assert_eq!(index.name, "test-repo");
        assert_eq!(index.entries.len(), 2);
        assert!(index.entries.iter().any(|e| e.file_path == "wh40k.gstz"));

        // Stored bytes are the compressed container holding the original document
        let packed = output.get("wh40k.gstz").unwrap().data();
        let unpacked = archive::decompress_single_entry(packed).unwrap().unwrap();
        assert_eq!(unpacked, GAME_SYSTEM_XML);
    }

    #[test]
    fn test_indexing_is_idempotent() {
        let files = sample_files();
        let first = index_repository("r", "http://u", Vec::new(), &files).unwrap();
        let second = index_repository("r", "http://u", Vec::new(), &files).unwrap();

        let mut first_entries: Vec<_> = index_of(&first)
            .entries
            .iter()
            .map(|e| (e.data_id.clone(), e.data_type, e.data_revision))
            .collect();
        let mut second_entries: Vec<_> = index_of(&second)
            .entries
            .iter()
            .map(|e| (e.data_id.clone(), e.data_type, e.data_revision))
            .collect();
        first_entries.sort();
        second_entries.sort();
        assert_eq!(first_entries, second_entries);
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let mut files = BTreeMap::new();
        files.insert("a-first.cat".to_string(), catalogue_xml("dup", "First"));
        files.insert("b-second.cat".to_string(), catalogue_xml("dup", "Second"));

        let output = index_repository("r", "http://u", Vec::new(), &files).unwrap();
        assert!(output.contains_key("a-first.catz"));
        assert!(!output.contains_key("b-second.catz"));

        let index = index_of(&output);
        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.entries[0].data_name, "First");
    }

    #[test]
    fn test_precompressed_input_fails() {
        let mut files = sample_files();
        files.insert("oops.catz".to_string(), b"already compressed".to_vec());

        let err = index_repository("r", "http://u", Vec::new(), &files).unwrap_err();
        assert!(matches!(err, Error::PrecompressedInput(_)), "got {err:?}");
    }

    #[test]
    fn test_malformed_data_file_aborts_pass() {
        let mut files = sample_files();
        files.insert("broken.cat".to_string(), b"<catalogue/>".to_vec());

        let err = index_repository("r", "http://u", Vec::new(), &files).unwrap_err();
        assert!(matches!(err, Error::MalformedDataFile(_)), "got {err:?}");
    }
}
