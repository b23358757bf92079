//! Storage cluster registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DataLinkError, Result};
use crate::paths::validate_name;
use crate::store::MetadataDb;
use crate::types::StorageType;

/// A storage cluster data links can bind result tables to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub cluster_id: u32,
    pub cluster_name: String,
    pub cluster_type: StorageType,
    pub create_time: DateTime<Utc>,
}

impl ClusterInfo {
    pub fn new(cluster_id: u32, cluster_name: impl Into<String>, cluster_type: StorageType) -> Self {
        Self {
            cluster_id,
            cluster_name: cluster_name.into(),
            cluster_type,
            create_time: Utc::now(),
        }
    }
}

impl MetadataDb {
    /// Register a new cluster. Names are unique.
    pub fn register_cluster(&self, cluster: ClusterInfo) -> Result<ClusterInfo> {
        validate_name(&cluster.cluster_name)?;
        let scope = self.begin_write()?;
        let (stored, created) = scope.get_or_create(cluster)?;
        if !created {
            return Err(DataLinkError::ClusterExists(stored.cluster_name));
        }
        scope.commit()?;
        Ok(stored)
    }

    pub fn cluster_by_name(&self, cluster_name: &str) -> Result<Option<ClusterInfo>> {
        self.get::<ClusterInfo>(cluster_name)
    }

    pub fn clusters(&self) -> Result<Vec<ClusterInfo>> {
        self.list::<ClusterInfo>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, MetadataDb) {
        let dir = TempDir::new().unwrap();
        let db = MetadataDb::open(&dir.path().join("metadata.redb")).unwrap();
        (dir, db)
    }

    #[test]
    fn register_then_lookup() {
        let (_dir, db) = open_tmp();
        db.register_cluster(ClusterInfo::new(3, "vm-cluster-01", StorageType::VictoriaMetrics))
            .unwrap();

        let found = db.cluster_by_name("vm-cluster-01").unwrap().unwrap();
        assert_eq!(found.cluster_id, 3);
        assert!(db.cluster_by_name("vm-cluster-02").unwrap().is_none());
    }

    #[test]
    fn duplicate_name_is_rejected_and_original_kept() {
        let (_dir, db) = open_tmp();
        db.register_cluster(ClusterInfo::new(3, "vm-cluster-01", StorageType::VictoriaMetrics))
            .unwrap();
        let err = db
            .register_cluster(ClusterInfo::new(9, "vm-cluster-01", StorageType::VictoriaMetrics))
            .unwrap_err();
        assert!(matches!(err, DataLinkError::ClusterExists(name) if name == "vm-cluster-01"));
        assert_eq!(
            db.cluster_by_name("vm-cluster-01").unwrap().unwrap().cluster_id,
            3
        );
    }

    #[test]
    fn invalid_name_is_rejected() {
        let (_dir, db) = open_tmp();
        let err = db
            .register_cluster(ClusterInfo::new(1, "VM Cluster", StorageType::VictoriaMetrics))
            .unwrap_err();
        assert!(matches!(err, DataLinkError::InvalidName(_)));
        assert!(db.clusters().unwrap().is_empty());
    }
}
