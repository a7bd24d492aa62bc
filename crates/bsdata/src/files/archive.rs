//! In-memory zip packing and unpacking
//!
//! Data files travel as single-entry zip containers and release snapshots
//! arrive as whole-repository zip archives. Everything here is buffered in
//! memory; the archives involved are small.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Error, Result};
use crate::files::classify;

fn archive_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::Archive(format!("{context}: {err}"))
}

/// Read every entry of a zip archive fully into memory.
///
/// Directory entries are skipped and a leading `/` is stripped from entry
/// names.
pub fn unpack(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive =
        ZipArchive::new(Cursor::new(data)).map_err(|e| archive_error("failed to read archive", e))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| archive_error("failed to read archive entry", e))?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().trim_start_matches('/').to_string();
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| archive_error(&format!("failed to decompress entry {name}"), e))?;
        entries.push((name, buf));
    }

    Ok(entries)
}

/// Create a new single-entry zip archive.
///
/// The entry name must be in uncompressed form; compressed names are a caller
/// bug, not data-dependent behavior.
pub fn pack(entry_name: &str, data: &[u8]) -> Result<Vec<u8>> {
    if classify::is_compressed_path(entry_name) {
        return Err(Error::Archive(format!(
            "zip entry name must have an uncompressed file extension: {entry_name}"
        )));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(classify::uncompressed_file_name(entry_name), SimpleFileOptions::default())
        .map_err(|e| archive_error("failed to start zip entry", e))?;
    writer.write_all(data)?;
    let cursor = writer
        .finish()
        .map_err(|e| archive_error("failed to finish archive", e))?;

    Ok(cursor.into_inner())
}

/// Returns the bytes of the first file entry in the archive, or `None` if
/// the archive holds no file entries.
pub fn decompress_single_entry(data: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut archive =
        ZipArchive::new(Cursor::new(data)).map_err(|e| archive_error("failed to read archive", e))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| archive_error("failed to read archive entry", e))?;
        if entry.is_dir() {
            continue;
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| archive_error("failed to decompress entry", e))?;
        return Ok(Some(buf));
    }

    Ok(None)
}
