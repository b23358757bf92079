use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// DataLinkStrategy
// ---------------------------------------------------------------------------

/// The provisioning recipe a data link was created with. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLinkStrategy {
    /// Standard single-metric-per-table time series link.
    BkStandardV2TimeSeries,
    /// Federated cluster proxy time series link.
    BcsFederalProxyTimeSeries,
    /// Federated cluster subset time series link.
    BcsFederalSubsetTimeSeries,
}

impl DataLinkStrategy {
    pub fn all() -> &'static [DataLinkStrategy] {
        &[
            DataLinkStrategy::BkStandardV2TimeSeries,
            DataLinkStrategy::BcsFederalProxyTimeSeries,
            DataLinkStrategy::BcsFederalSubsetTimeSeries,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataLinkStrategy::BkStandardV2TimeSeries => "bk_standard_v2_time_series",
            DataLinkStrategy::BcsFederalProxyTimeSeries => "bcs_federal_proxy_time_series",
            DataLinkStrategy::BcsFederalSubsetTimeSeries => "bcs_federal_subset_time_series",
        }
    }

    /// Storage backend every table provisioned by this strategy lands in.
    pub fn storage_type(self) -> StorageType {
        match self {
            DataLinkStrategy::BkStandardV2TimeSeries
            | DataLinkStrategy::BcsFederalProxyTimeSeries
            | DataLinkStrategy::BcsFederalSubsetTimeSeries => StorageType::VictoriaMetrics,
        }
    }
}

impl fmt::Display for DataLinkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataLinkStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataLinkStrategy::all()
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| format!("unknown data link strategy: {s}"))
    }
}

// ---------------------------------------------------------------------------
// DataLinkKind
// ---------------------------------------------------------------------------

/// Resource kinds understood by the remote provisioning API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataLinkKind {
    DataId,
    ResultTable,
    VmStorageBinding,
    Databus,
    VmStorage,
}

impl DataLinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataLinkKind::DataId => "DataId",
            DataLinkKind::ResultTable => "ResultTable",
            DataLinkKind::VmStorageBinding => "VmStorageBinding",
            DataLinkKind::Databus => "Databus",
            DataLinkKind::VmStorage => "VmStorage",
        }
    }
}

impl fmt::Display for DataLinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DataLinkResourceStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a provisioned resource or tracking record.
///
/// Transitions: `Initializing → Creating | Pending → Ok | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataLinkResourceStatus {
    Initializing,
    Creating,
    Pending,
    Ok,
    Failed,
}

impl DataLinkResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DataLinkResourceStatus::Initializing => "Initializing",
            DataLinkResourceStatus::Creating => "Creating",
            DataLinkResourceStatus::Pending => "Pending",
            DataLinkResourceStatus::Ok => "Ok",
            DataLinkResourceStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for DataLinkResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StorageType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    VictoriaMetrics,
    Elasticsearch,
    Influxdb,
    Kafka,
}

impl StorageType {
    pub fn all() -> &'static [StorageType] {
        &[
            StorageType::VictoriaMetrics,
            StorageType::Elasticsearch,
            StorageType::Influxdb,
            StorageType::Kafka,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageType::VictoriaMetrics => "victoria_metrics",
            StorageType::Elasticsearch => "elasticsearch",
            StorageType::Influxdb => "influxdb",
            StorageType::Kafka => "kafka",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown storage type: {s}"))
    }
}

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

/// The ingestion side of a data link: a registered data id and its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub bk_data_id: u32,
    pub data_name: String,
}

impl DataSource {
    pub fn new(bk_data_id: u32, data_name: impl Into<String>) -> Self {
        Self {
            bk_data_id,
            data_name: data_name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
