use crate::error::{DataLinkError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DATALINK_DIR: &str = ".datalink";
pub const CONFIG_FILE: &str = ".datalink/config.yaml";
pub const METADATA_DB_FILE: &str = ".datalink/metadata.redb";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn datalink_dir(root: &Path) -> PathBuf {
    root.join(DATALINK_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn metadata_db_path(root: &Path) -> PathBuf {
    root.join(METADATA_DB_FILE)
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Validate a data link or storage cluster name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 128 || !name_re().is_match(name) {
        return Err(DataLinkError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
