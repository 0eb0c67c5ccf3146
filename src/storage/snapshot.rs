//! Snapshot files.
//!
//! The whole [`Keyspace`] (every namespace plus the expiration table) is
//! encoded with bincode. Writes go to a sibling `.tmp` file which is then
//! renamed over the target, so a crash mid-write never leaves a truncated
//! snapshot behind.

use crate::storage::keyspace::Keyspace;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl SnapshotError {
    /// True when the snapshot file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Serializes `keyspace` to `path`, creating parent directories as needed.
pub fn save(keyspace: &Keyspace, path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        bincode::serialize_into(&mut writer, keyspace)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads a keyspace back from `path`.
pub fn load(path: &Path) -> Result<Keyspace, SnapshotError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}
