//! Pipeline-stage config records and their wire fragments.
//!
//! A data link is provisioned as three resources submitted together:
//!
//! ```text
//! ResultTable  ← the logical table on the bkbase side
//! VmStorageBinding  ← binds that table to a VictoriaMetrics cluster
//! Databus  ← routes the source data id into one or more sinks
//! ```
//!
//! Each record is persisted locally (see [`crate::store`]) and renders a
//! [`ConfigFragment`] for submission via [`crate::provisioner::Provisioner`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Settings;
use crate::types::{DataLinkKind, DataLinkResourceStatus};

/// Transform applied by the bus to standard v2 time series payloads.
pub const STANDARD_V2_TRANSFORM_NAME: &str = "log_to_metric";
pub const STANDARD_V2_TRANSFORM_FORMAT: &str = "bkmonitor_standard_v2";

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Reference to another resource by kind, name and namespace.
///
/// Sink descriptors embedded in a bus fragment use this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: DataLinkKind,
    pub name: String,
    pub namespace: String,
}

impl ResourceRef {
    pub fn new(kind: DataLinkKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTableSpec {
    pub alias: String,
    pub biz_id: u32,
    pub data_type: String,
    pub description: String,
    pub maintainers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmStorageBindingSpec {
    pub data: ResourceRef,
    pub storage: ResourceRef,
    pub maintainers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub kind: String,
    pub name: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabusSpec {
    pub sources: Vec<ResourceRef>,
    pub sinks: Vec<ResourceRef>,
    pub transforms: Vec<Transform>,
    pub maintainers: Vec<String>,
}

/// One kind-tagged resource in an apply request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ConfigFragment {
    ResultTable {
        metadata: Metadata,
        spec: ResultTableSpec,
    },
    VmStorageBinding {
        metadata: Metadata,
        spec: VmStorageBindingSpec,
    },
    Databus {
        metadata: Metadata,
        spec: DatabusSpec,
    },
}

impl ConfigFragment {
    pub fn kind(&self) -> DataLinkKind {
        match self {
            Self::ResultTable { .. } => DataLinkKind::ResultTable,
            Self::VmStorageBinding { .. } => DataLinkKind::VmStorageBinding,
            Self::Databus { .. } => DataLinkKind::Databus,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::ResultTable { metadata, .. }
            | Self::VmStorageBinding { metadata, .. }
            | Self::Databus { metadata, .. } => metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata().namespace
    }

    /// Sink descriptors; empty for every kind except `Databus`.
    pub fn sinks(&self) -> &[ResourceRef] {
        match self {
            Self::Databus { spec, .. } => &spec.sinks,
            _ => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Local record of a bkbase result table resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTableConfig {
    pub name: String,
    pub namespace: String,
    pub data_link_name: String,
    pub status: DataLinkResourceStatus,
    pub create_time: DateTime<Utc>,
    pub last_modify_time: DateTime<Utc>,
}

impl ResultTableConfig {
    pub fn new(
        name: impl Into<String>,
        data_link_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            namespace: namespace.into(),
            data_link_name: data_link_name.into(),
            status: DataLinkResourceStatus::Initializing,
            create_time: now,
            last_modify_time: now,
        }
    }

    pub fn compose_config(&self, settings: &Settings) -> ConfigFragment {
        let mut labels = BTreeMap::new();
        labels.insert("bk_biz_id".to_string(), settings.bkdata_biz_id.to_string());
        ConfigFragment::ResultTable {
            metadata: Metadata {
                name: self.name.clone(),
                namespace: self.namespace.clone(),
                labels,
            },
            spec: ResultTableSpec {
                alias: self.name.clone(),
                biz_id: settings.bkdata_biz_id,
                data_type: "metric".to_string(),
                description: self.name.clone(),
                maintainers: settings.maintainers.clone(),
            },
        }
    }
}

/// Local record binding a result table to a VictoriaMetrics cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmStorageBindingConfig {
    pub name: String,
    pub namespace: String,
    pub data_link_name: String,
    pub vm_cluster_name: String,
    pub status: DataLinkResourceStatus,
    pub create_time: DateTime<Utc>,
    pub last_modify_time: DateTime<Utc>,
}

impl VmStorageBindingConfig {
    pub fn new(
        name: impl Into<String>,
        vm_cluster_name: impl Into<String>,
        data_link_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            namespace: namespace.into(),
            data_link_name: data_link_name.into(),
            vm_cluster_name: vm_cluster_name.into(),
            status: DataLinkResourceStatus::Initializing,
            create_time: now,
            last_modify_time: now,
        }
    }

    /// How a bus refers to this binding when routing into it.
    pub fn as_sink(&self) -> ResourceRef {
        ResourceRef::new(DataLinkKind::VmStorageBinding, &self.name, &self.namespace)
    }

    pub fn compose_config(&self, settings: &Settings) -> ConfigFragment {
        ConfigFragment::VmStorageBinding {
            metadata: Metadata {
                name: self.name.clone(),
                namespace: self.namespace.clone(),
                labels: BTreeMap::new(),
            },
            spec: VmStorageBindingSpec {
                data: ResourceRef::new(DataLinkKind::ResultTable, &self.name, &self.namespace),
                storage: ResourceRef::new(
                    DataLinkKind::VmStorage,
                    &self.vm_cluster_name,
                    &self.namespace,
                ),
                maintainers: settings.maintainers.clone(),
            },
        }
    }
}

/// Local record of the bus routing a data id into storage sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBusConfig {
    pub name: String,
    pub namespace: String,
    pub data_link_name: String,
    pub data_id_name: String,
    pub status: DataLinkResourceStatus,
    pub create_time: DateTime<Utc>,
    pub last_modify_time: DateTime<Utc>,
}

impl DataBusConfig {
    pub fn new(
        name: impl Into<String>,
        data_id_name: impl Into<String>,
        data_link_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            namespace: namespace.into(),
            data_link_name: data_link_name.into(),
            data_id_name: data_id_name.into(),
            status: DataLinkResourceStatus::Initializing,
            create_time: now,
            last_modify_time: now,
        }
    }

    pub fn compose_config(&self, settings: &Settings, sinks: Vec<ResourceRef>) -> ConfigFragment {
        ConfigFragment::Databus {
            metadata: Metadata {
                name: self.name.clone(),
                namespace: self.namespace.clone(),
                labels: BTreeMap::new(),
            },
            spec: DatabusSpec {
                sources: vec![ResourceRef::new(
                    DataLinkKind::DataId,
                    &self.data_id_name,
                    &self.namespace,
                )],
                sinks,
                transforms: vec![Transform {
                    kind: "PreDefinedLogic".to_string(),
                    name: STANDARD_V2_TRANSFORM_NAME.to_string(),
                    format: STANDARD_V2_TRANSFORM_FORMAT.to_string(),
                }],
                maintainers: settings.maintainers.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
