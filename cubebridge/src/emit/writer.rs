//! All-or-nothing file writes.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Created,
    Updated,
    Unchanged,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Created => "created",
            FileStatus::Updated => "updated",
            FileStatus::Unchanged => "unchanged",
        }
    }
}

/// Write `contents` to `path` unless it already holds exactly these bytes.
/// The new content lands in a temp file next to the target and is renamed
/// over it, so a failed write leaves the old file (or nothing) behind.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> io::Result<FileStatus> {
    let existed = match std::fs::read(path) {
        Ok(existing) if existing == contents => return Ok(FileStatus::Unchanged),
        Ok(_) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(e),
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(if existed {
        FileStatus::Updated
    } else {
        FileStatus::Created
    })
}
