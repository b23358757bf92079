//! Local view of remotely provisioned result tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DataLinkResourceStatus, StorageType};

/// Tracking record for one provisioned pipeline.
///
/// Identity is `(data_link_name, bkbase_table_id)`. The orchestrator creates
/// it as `Initializing` before submitting configs; the synchronizer fills in
/// the storage identifiers and marks it `Ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BkBaseResultTable {
    pub data_link_name: String,
    pub bkbase_table_id: String,
    pub bkbase_data_name: String,
    pub bkbase_vmrt_name: String,
    pub monitor_table_id: String,
    pub storage_type: StorageType,
    #[serde(default)]
    pub storage_id: Option<u32>,
    pub status: DataLinkResourceStatus,
    pub create_time: DateTime<Utc>,
    pub last_modify_time: DateTime<Utc>,
}

impl BkBaseResultTable {
    pub fn new(
        data_link_name: impl Into<String>,
        bkbase_table_id: impl Into<String>,
        monitor_table_id: impl Into<String>,
        storage_type: StorageType,
    ) -> Self {
        let now = Utc::now();
        Self {
            data_link_name: data_link_name.into(),
            bkbase_table_id: bkbase_table_id.into(),
            bkbase_data_name: String::new(),
            bkbase_vmrt_name: String::new(),
            monitor_table_id: monitor_table_id.into(),
            storage_type,
            storage_id: None,
            status: DataLinkResourceStatus::Initializing,
            create_time: now,
            last_modify_time: now,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.status == DataLinkResourceStatus::Ok && self.storage_id.is_some()
    }
}
