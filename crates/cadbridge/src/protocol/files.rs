use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::Builder;

use super::errors::ProtocolError;

/// Writes the provided bytes to the path using an atomic persist step.
///
/// Data is flushed before the temporary file is renamed into place so a
/// polling reader never observes a partially written document.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "target path did not have a parent directory",
        )
    })?;

    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("cadbridge"),
    );
    builder.suffix(".tmp");

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

/// Serializes `value` as indented JSON and writes it atomically.
pub(crate) fn write_json<T: Serialize>(
    path: &Path,
    document: &'static str,
    value: &T,
) -> Result<(), ProtocolError> {
    let mut payload = serde_json::to_vec_pretty(value)
        .map_err(|source| ProtocolError::Encode { document, source })?;
    payload.push(b'\n');
    atomic_write(path, &payload).map_err(|source| ProtocolError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a JSON document, treating a missing or blank file as absent.
pub(crate) fn read_json<T: DeserializeOwned>(
    path: &Path,
    document: &'static str,
) -> Result<Option<T>, ProtocolError> {
    let Some(bytes) = read_optional(path)? else {
        return Ok(None);
    };
    let trimmed = bytes.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(trimmed)
        .map(Some)
        .map_err(|source| ProtocolError::Malformed {
            document,
            path: path.to_path_buf(),
            source,
        })
}

/// Removes a file, reporting whether anything was deleted.
pub(crate) fn remove_if_present(path: &Path) -> Result<bool, ProtocolError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ProtocolError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ProtocolError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ProtocolError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
