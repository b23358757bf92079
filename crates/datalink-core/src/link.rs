//! Data link provisioning workflow.
//!
//! ```text
//! apply_data_link
//!     │  1. declare tracking record (Initializing)
//!     ▼
//! compose_configs       ← one write scope: ResultTable, VmStorageBinding, Databus
//!     │  2. ordered fragments
//!     ▼
//! apply_data_link_with_retry  ← Provisioner, RetryPolicy::DATA_LINK_APPLY
//!     │  3. remote response
//!     ▼
//! sync_metadata         ← separate pass: storage ids resolved, status Ok
//! ```
//!
//! Both the orchestrator and the synchronizer address the tracking record by
//! `(data_link_name, bkbase_table_id)`, derived by [`LinkNames::derive`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::error::{DataLinkError, Result};
use crate::naming;
use crate::paths::validate_name;
use crate::provisioner::Provisioner;
use crate::resources::{ConfigFragment, DataBusConfig, ResultTableConfig, VmStorageBindingConfig};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::store::MetadataDb;
use crate::tracking::BkBaseResultTable;
use crate::types::{DataLinkResourceStatus, DataLinkStrategy, DataSource, StorageType};

static THREAD_SLEEPER: ThreadSleeper = ThreadSleeper;

// ---------------------------------------------------------------------------
// LinkNames
// ---------------------------------------------------------------------------

/// Canonical bkbase names for one (data source, table) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkNames {
    pub bkbase_data_name: String,
    pub bkbase_vmrt_name: String,
    pub bkbase_table_id: String,
}

impl LinkNames {
    pub fn derive(settings: &Settings, data_source: &DataSource, table_id: &str) -> Result<Self> {
        let bkbase_data_name = naming::compose_bkdata_data_id_name(&data_source.data_name)?;
        let bkbase_vmrt_name = naming::compose_bkdata_table_id(table_id)?;
        let bkbase_table_id =
            naming::compose_bkbase_table_id(settings.bkdata_biz_id, &bkbase_vmrt_name);
        Ok(Self {
            bkbase_data_name,
            bkbase_vmrt_name,
            bkbase_table_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Provisioning context
// ---------------------------------------------------------------------------

/// Collaborators a provisioning run needs.
pub struct Provisioning<'a> {
    pub db: &'a MetadataDb,
    pub settings: &'a Settings,
    pub provisioner: &'a dyn Provisioner,
    pub sleeper: &'a dyn Sleeper,
    pub retry: RetryPolicy,
}

impl<'a> Provisioning<'a> {
    pub fn new(db: &'a MetadataDb, settings: &'a Settings, provisioner: &'a dyn Provisioner) -> Self {
        Self {
            db,
            settings,
            provisioner,
            sleeper: &THREAD_SLEEPER,
            retry: RetryPolicy::DATA_LINK_APPLY,
        }
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }
}

// ---------------------------------------------------------------------------
// SyncOutcome
// ---------------------------------------------------------------------------

/// Result of a reconciliation pass. Reconciliation never fails its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced {
        record: BkBaseResultTable,
        created: bool,
    },
    SkippedClusterNotFound {
        cluster_name: String,
    },
    Failed {
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// LinkResources
// ---------------------------------------------------------------------------

/// Everything stored locally for one data link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkResources {
    pub result_tables: Vec<ResultTableConfig>,
    pub storage_bindings: Vec<VmStorageBindingConfig>,
    pub databuses: Vec<DataBusConfig>,
    pub tracking: Vec<BkBaseResultTable>,
}

// ---------------------------------------------------------------------------
// DataLink
// ---------------------------------------------------------------------------

/// A named, strategy-typed pipeline from a data source to a storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLink {
    pub data_link_name: String,
    pub namespace: String,
    pub data_link_strategy: DataLinkStrategy,
    pub create_time: DateTime<Utc>,
    pub last_modify_time: DateTime<Utc>,
}

impl DataLink {
    pub fn new(
        data_link_name: impl Into<String>,
        namespace: impl Into<String>,
        data_link_strategy: DataLinkStrategy,
    ) -> Self {
        let now = Utc::now();
        Self {
            data_link_name: data_link_name.into(),
            namespace: namespace.into(),
            data_link_strategy,
            create_time: now,
            last_modify_time: now,
        }
    }

    /// Fetch-or-create a data link. The strategy of an existing link is immutable.
    pub fn create(
        db: &MetadataDb,
        data_link_name: &str,
        namespace: &str,
        data_link_strategy: DataLinkStrategy,
    ) -> Result<DataLink> {
        validate_name(data_link_name)?;
        let scope = db.begin_write()?;
        let (link, created) =
            scope.get_or_create(DataLink::new(data_link_name, namespace, data_link_strategy))?;
        if link.data_link_strategy != data_link_strategy {
            return Err(DataLinkError::DataLinkExists {
                name: link.data_link_name,
                strategy: link.data_link_strategy,
            });
        }
        scope.commit()?;
        if created {
            tracing::info!(data_link_name, strategy = %data_link_strategy, "data link created");
        }
        Ok(link)
    }

    pub fn load(db: &MetadataDb, data_link_name: &str) -> Result<DataLink> {
        db.get::<DataLink>(data_link_name)?
            .ok_or_else(|| DataLinkError::DataLinkNotFound(data_link_name.to_string()))
    }

    pub fn list(db: &MetadataDb) -> Result<Vec<DataLink>> {
        db.list::<DataLink>()
    }

    pub fn storage_type(&self) -> StorageType {
        self.data_link_strategy.storage_type()
    }

    /// Local records belonging to this link.
    pub fn resources(&self, db: &MetadataDb) -> Result<LinkResources> {
        let name = self.data_link_name.as_str();
        Ok(LinkResources {
            result_tables: db
                .list::<ResultTableConfig>()?
                .into_iter()
                .filter(|r| r.data_link_name == name)
                .collect(),
            storage_bindings: db
                .list::<VmStorageBindingConfig>()?
                .into_iter()
                .filter(|r| r.data_link_name == name)
                .collect(),
            databuses: db
                .list::<DataBusConfig>()?
                .into_iter()
                .filter(|r| r.data_link_name == name)
                .collect(),
            tracking: db
                .list::<BkBaseResultTable>()?
                .into_iter()
                .filter(|r| r.data_link_name == name)
                .collect(),
        })
    }

    // -----------------------------------------------------------------------
    // Config composition
    // -----------------------------------------------------------------------

    /// Build the full, ordered config set for this link's strategy.
    ///
    /// Records are fetched-or-created in one write scope; on any failure
    /// nothing is persisted.
    pub fn compose_configs(
        &self,
        db: &MetadataDb,
        settings: &Settings,
        data_source: &DataSource,
        table_id: &str,
        vm_cluster_name: &str,
    ) -> Result<Vec<ConfigFragment>> {
        let span = tracing::info_span!(
            "compose_configs",
            data_link_name = %self.data_link_name,
            strategy = %self.data_link_strategy,
        );
        let _enter = span.enter();

        match self.data_link_strategy {
            DataLinkStrategy::BkStandardV2TimeSeries => self.compose_standard_time_series_configs(
                db,
                settings,
                data_source,
                table_id,
                vm_cluster_name,
            ),
            DataLinkStrategy::BcsFederalProxyTimeSeries
            | DataLinkStrategy::BcsFederalSubsetTimeSeries => {
                tracing::error!("no config composition for this strategy");
                Err(DataLinkError::UnsupportedStrategy(self.data_link_strategy))
            }
        }
    }

    fn compose_standard_time_series_configs(
        &self,
        db: &MetadataDb,
        settings: &Settings,
        data_source: &DataSource,
        table_id: &str,
        vm_cluster_name: &str,
    ) -> Result<Vec<ConfigFragment>> {
        tracing::info!(
            bk_data_id = data_source.bk_data_id,
            table_id,
            vm_cluster_name,
            "start to compose configs"
        );
        let names = LinkNames::derive(settings, data_source, table_id)?;
        tracing::info!(
            bkbase_data_name = %names.bkbase_data_name,
            bkbase_vmrt_name = %names.bkbase_vmrt_name,
            "composing with canonical names"
        );

        let (result_table, binding, bus) = self
            .persist_standard_records(db, &names, vm_cluster_name)
            .inspect_err(|e| tracing::error!(error = %e, "compose failed, rolled back"))?;

        let sinks = vec![binding.as_sink()];
        Ok(vec![
            result_table.compose_config(settings),
            binding.compose_config(settings),
            bus.compose_config(settings, sinks),
        ])
    }

    fn persist_standard_records(
        &self,
        db: &MetadataDb,
        names: &LinkNames,
        vm_cluster_name: &str,
    ) -> Result<(ResultTableConfig, VmStorageBindingConfig, DataBusConfig)> {
        let scope = db.begin_write()?;
        let (result_table, _) = scope.get_or_create(ResultTableConfig::new(
            &names.bkbase_vmrt_name,
            &self.data_link_name,
            &self.namespace,
        ))?;
        let (binding, _) = scope.get_or_create(VmStorageBindingConfig::new(
            &names.bkbase_vmrt_name,
            vm_cluster_name,
            &self.data_link_name,
            &self.namespace,
        ))?;
        let (bus, _) = scope.get_or_create(DataBusConfig::new(
            &names.bkbase_vmrt_name,
            &names.bkbase_data_name,
            &self.data_link_name,
            &self.namespace,
        ))?;
        scope.commit()?;
        Ok((result_table, binding, bus))
    }

    // -----------------------------------------------------------------------
    // Orchestration
    // -----------------------------------------------------------------------

    /// Declare the tracking record, compose configs and submit them.
    ///
    /// Does not mark the tracking record `Ok`; that is [`Self::sync_metadata`]'s
    /// job. A failure after step 1 leaves the record `Initializing`.
    pub fn apply_data_link(
        &self,
        ctx: &Provisioning<'_>,
        data_source: &DataSource,
        table_id: &str,
        vm_cluster_name: &str,
    ) -> Result<Value> {
        let span = tracing::info_span!(
            "apply_data_link",
            data_link_name = %self.data_link_name,
            strategy = %self.data_link_strategy,
        );
        let _enter = span.enter();

        self.declare_tracking_record(ctx, data_source, table_id)
            .inspect_err(|e| tracing::error!(error = %e, "declare tracking record failed"))?;

        let configs = self
            .compose_configs(ctx.db, ctx.settings, data_source, table_id, vm_cluster_name)
            .inspect_err(|e| tracing::error!(error = %e, "compose configs failed"))?;
        tracing::info!(fragments = configs.len(), "applying configs");
        tracing::debug!(configs = ?configs, "config set");

        let response = self
            .apply_data_link_with_retry(ctx, &configs)
            .inspect_err(|e| tracing::error!(error = %e, "apply failed"))?;

        tracing::info!(%response, "apply succeeded");
        Ok(response)
    }

    fn declare_tracking_record(
        &self,
        ctx: &Provisioning<'_>,
        data_source: &DataSource,
        table_id: &str,
    ) -> Result<BkBaseResultTable> {
        let names = LinkNames::derive(ctx.settings, data_source, table_id)?;
        let mut candidate = BkBaseResultTable::new(
            &self.data_link_name,
            &names.bkbase_table_id,
            table_id,
            self.storage_type(),
        );
        candidate.bkbase_data_name = names.bkbase_data_name;
        candidate.bkbase_vmrt_name = names.bkbase_vmrt_name;

        let scope = ctx.db.begin_write()?;
        let (record, created) = scope.get_or_create(candidate)?;
        scope.commit()?;
        if created {
            tracing::info!(bkbase_table_id = %record.bkbase_table_id, "tracking record declared");
        }
        Ok(record)
    }

    /// Submit `configs`, retrying the whole set per [`Provisioning::retry`].
    pub fn apply_data_link_with_retry(
        &self,
        ctx: &Provisioning<'_>,
        configs: &[ConfigFragment],
    ) -> Result<Value> {
        let span = tracing::info_span!(
            "apply_data_link_with_retry",
            data_link_name = %self.data_link_name,
        );
        let _enter = span.enter();

        ctx.retry.run(ctx.sleeper, |attempt| {
            tracing::debug!(attempt, "submitting");
            ctx.provisioner.apply_data_link(configs)
        })
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    /// Record resolved storage identifiers on the tracking record and mark it `Ok`.
    ///
    /// Best effort: an unknown cluster is reported as skipped, any other
    /// failure as `Failed`, and neither is returned as an error.
    pub fn sync_metadata(
        &self,
        ctx: &Provisioning<'_>,
        data_source: &DataSource,
        table_id: &str,
        storage_cluster_name: &str,
    ) -> SyncOutcome {
        let span = tracing::info_span!(
            "sync_metadata",
            data_link_name = %self.data_link_name,
            strategy = %self.data_link_strategy,
        );
        let _enter = span.enter();

        match self.try_sync_metadata(ctx, data_source, table_id, storage_cluster_name) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "sync_metadata failed, rolled back");
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_sync_metadata(
        &self,
        ctx: &Provisioning<'_>,
        data_source: &DataSource,
        table_id: &str,
        storage_cluster_name: &str,
    ) -> Result<SyncOutcome> {
        let names = LinkNames::derive(ctx.settings, data_source, table_id)?;
        let storage_type = self.storage_type();

        let Some(cluster) = ctx.db.cluster_by_name(storage_cluster_name)? else {
            tracing::error!(storage_cluster_name, "storage cluster does not exist");
            return Ok(SyncOutcome::SkippedClusterNotFound {
                cluster_name: storage_cluster_name.to_string(),
            });
        };

        let scope = ctx.db.begin_write()?;
        let (record, created) = scope.update_or_create(
            BkBaseResultTable::new(
                &self.data_link_name,
                &names.bkbase_table_id,
                table_id,
                storage_type,
            ),
            |rt| {
                rt.bkbase_data_name = names.bkbase_data_name.clone();
                rt.bkbase_vmrt_name = names.bkbase_vmrt_name.clone();
                rt.monitor_table_id = table_id.to_string();
                rt.storage_type = storage_type;
                rt.storage_id = Some(cluster.cluster_id);
                rt.status = DataLinkResourceStatus::Ok;
                rt.last_modify_time = Utc::now();
            },
        )?;
        scope.commit()?;

        tracing::info!(
            bkbase_table_id = %record.bkbase_table_id,
            storage_id = cluster.cluster_id,
            created,
            "metadata synced"
        );
        Ok(SyncOutcome::Synced { record, created })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
