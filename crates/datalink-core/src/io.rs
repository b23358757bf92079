use crate::error::Result;
use crate::paths;
use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Serialize `value` as YAML and swap it into place at `path`.
///
/// The temp file lives next to the target so the final rename stays on one
/// filesystem. A reader never sees a half-written config.
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_yaml::to_string(value)?;
    let dir = match path.parent() {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read YAML from `path`, or `None` if the file does not exist.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(serde_yaml::from_str(&data)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Create `.datalink/` under `root`. Returns `true` if it did not exist yet.
pub fn ensure_datalink_dir(root: &Path) -> Result<bool> {
    let dir = paths::datalink_dir(root);
    if dir.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(&dir)?;
    Ok(true)
}
