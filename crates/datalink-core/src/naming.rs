//! Canonical bkbase resource names.
//!
//! Every name the remote platform sees is derived here from monitor-side
//! identifiers. The transforms are pure: the same input always yields the
//! same name, so repeated provisioning runs address the same resources.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::error::{DataLinkError, Result};

/// Prefix marking resources owned by the monitoring platform.
pub const NAME_PREFIX: &str = "bkm_";

/// Longest name the remote platform accepts for data ids and result tables.
pub const MAX_NAME_LEN: usize = 50;

const HASH_SUFFIX_LEN: usize = 8;

static ILLEGAL_RE: OnceLock<Regex> = OnceLock::new();

fn illegal_re() -> &'static Regex {
    ILLEGAL_RE.get_or_init(|| Regex::new(r"[^a-z0-9_]").unwrap())
}

/// Canonical bkbase data id name for a data source's `data_name`.
pub fn compose_bkdata_data_id_name(data_name: &str) -> Result<String> {
    canonical_name(data_name)
}

/// Canonical bkbase result table (vmrt) name for a monitor `table_id`.
pub fn compose_bkdata_table_id(table_id: &str) -> Result<String> {
    canonical_name(table_id)
}

/// Tracking identifier of a result table on the bkbase side: `{biz_id}_{vmrt_name}`.
pub fn compose_bkbase_table_id(bkdata_biz_id: u32, vmrt_name: &str) -> String {
    format!("{bkdata_biz_id}_{vmrt_name}")
}

fn canonical_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DataLinkError::InvalidName(raw.to_string()));
    }
    let lowered = trimmed.to_lowercase();
    let sanitized = illegal_re().replace_all(&lowered, "_");
    let name = format!("{NAME_PREFIX}{sanitized}");
    if name.len() <= MAX_NAME_LEN {
        return Ok(name);
    }

    // Keep the readable head, disambiguate with a digest of the untouched input.
    let digest = Sha256::digest(trimmed.as_bytes());
    let suffix: String = digest
        .iter()
        .take(HASH_SUFFIX_LEN / 2)
        .map(|b| format!("{b:02x}"))
        .collect();
    let head = &name[..MAX_NAME_LEN - HASH_SUFFIX_LEN - 1];
    Ok(format!("{head}_{suffix}"))
}
