//! Persistent metadata store using redb.
//!
//! # Table design
//!
//! One table per record type. Keys are UTF-8 composites of the record's
//! identity fields joined by `0x1f` (unit separator), values are JSON:
//!
//! ```text
//! result_table_configs         name ␟ data_link_name ␟ namespace
//! vm_storage_binding_configs   name ␟ vm_cluster_name ␟ data_link_name ␟ namespace
//! databus_configs              name ␟ data_id_name ␟ data_link_name ␟ namespace
//! bkbase_result_tables         data_link_name ␟ bkbase_table_id
//! data_links                   data_link_name
//! clusters                     cluster_name
//! ```
//!
//! redb allows a single write transaction at a time, so a fetch-or-create
//! inside a [`WriteScope`] cannot race another writer into a duplicate.
//! Dropping a scope without [`WriteScope::commit`] rolls back every write
//! made through it.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cluster::ClusterInfo;
use crate::error::{store_err, Result};
use crate::link::DataLink;
use crate::resources::{DataBusConfig, ResultTableConfig, VmStorageBindingConfig};
use crate::tracking::BkBaseResultTable;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

const DATA_LINKS: JsonTable = TableDefinition::new("data_links");
const RESULT_TABLE_CONFIGS: JsonTable = TableDefinition::new("result_table_configs");
const VM_STORAGE_BINDING_CONFIGS: JsonTable = TableDefinition::new("vm_storage_binding_configs");
const DATABUS_CONFIGS: JsonTable = TableDefinition::new("databus_configs");
const BKBASE_RESULT_TABLES: JsonTable = TableDefinition::new("bkbase_result_tables");
const CLUSTERS: JsonTable = TableDefinition::new("clusters");

const ALL_TABLES: [JsonTable; 6] = [
    DATA_LINKS,
    RESULT_TABLE_CONFIGS,
    VM_STORAGE_BINDING_CONFIGS,
    DATABUS_CONFIGS,
    BKBASE_RESULT_TABLES,
    CLUSTERS,
];

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

const KEY_SEPARATOR: &str = "\u{1f}";

pub fn composite_key(parts: &[&str]) -> String {
    parts.join(KEY_SEPARATOR)
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A value stored in one of the metadata tables, addressed by its identity key.
pub trait Record: Serialize + DeserializeOwned {
    const TABLE: JsonTable;

    fn key(&self) -> String;
}

impl Record for DataLink {
    const TABLE: JsonTable = DATA_LINKS;

    fn key(&self) -> String {
        self.data_link_name.clone()
    }
}

impl Record for ResultTableConfig {
    const TABLE: JsonTable = RESULT_TABLE_CONFIGS;

    fn key(&self) -> String {
        composite_key(&[&self.name, &self.data_link_name, &self.namespace])
    }
}

impl Record for VmStorageBindingConfig {
    const TABLE: JsonTable = VM_STORAGE_BINDING_CONFIGS;

    fn key(&self) -> String {
        composite_key(&[
            &self.name,
            &self.vm_cluster_name,
            &self.data_link_name,
            &self.namespace,
        ])
    }
}

impl Record for DataBusConfig {
    const TABLE: JsonTable = DATABUS_CONFIGS;

    fn key(&self) -> String {
        composite_key(&[
            &self.name,
            &self.data_id_name,
            &self.data_link_name,
            &self.namespace,
        ])
    }
}

impl Record for BkBaseResultTable {
    const TABLE: JsonTable = BKBASE_RESULT_TABLES;

    fn key(&self) -> String {
        composite_key(&[&self.data_link_name, &self.bkbase_table_id])
    }
}

impl Record for ClusterInfo {
    const TABLE: JsonTable = CLUSTERS;

    fn key(&self) -> String {
        self.cluster_name.clone()
    }
}

// ---------------------------------------------------------------------------
// MetadataDb
// ---------------------------------------------------------------------------

/// Persistent store for data links, their config records and tracking records.
pub struct MetadataDb {
    db: Database,
}

impl MetadataDb {
    /// Open or create the redb database at `path`, creating every table.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(store_err)?;
        let wt = db.begin_write().map_err(store_err)?;
        for table in ALL_TABLES {
            wt.open_table(table).map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(Self { db })
    }

    /// Start an atomic write scope. Nothing is persisted until `commit`.
    pub fn begin_write(&self) -> Result<WriteScope> {
        let txn = self.db.begin_write().map_err(store_err)?;
        Ok(WriteScope { txn })
    }

    pub fn get<T: Record>(&self, key: &str) -> Result<Option<T>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(T::TABLE).map_err(store_err)?;
        let raw = table
            .get(key)
            .map_err(store_err)?
            .map(|guard| guard.value().to_vec());
        match raw {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All records of one type, in key order.
    pub fn list<T: Record>(&self) -> Result<Vec<T>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(T::TABLE).map_err(store_err)?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (_, v) = entry.map_err(store_err)?;
            result.push(serde_json::from_slice(v.value())?);
        }
        Ok(result)
    }

    pub fn count<T: Record>(&self) -> Result<usize> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(T::TABLE).map_err(store_err)?;
        let n = table.iter().map_err(store_err)?.count();
        Ok(n)
    }

    /// Write raw bytes under `key`, bypassing serialization.
    #[cfg(test)]
    pub(crate) fn put_raw<T: Record>(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(T::TABLE).map_err(store_err)?;
            table.insert(key, bytes).map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WriteScope
// ---------------------------------------------------------------------------

/// One atomic unit of work against [`MetadataDb`].
pub struct WriteScope {
    txn: WriteTransaction,
}

impl WriteScope {
    pub fn get<T: Record>(&self, key: &str) -> Result<Option<T>> {
        let table = self.txn.open_table(T::TABLE).map_err(store_err)?;
        let raw = table
            .get(key)
            .map_err(store_err)?
            .map(|guard| guard.value().to_vec());
        match raw {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Return the stored record with `candidate`'s key, or store `candidate`.
    ///
    /// An existing record is returned untouched; its non-key fields are
    /// never overwritten. The flag is `true` when `candidate` was inserted.
    pub fn get_or_create<T: Record>(&self, candidate: T) -> Result<(T, bool)> {
        let key = candidate.key();
        if let Some(existing) = self.get::<T>(&key)? {
            return Ok((existing, false));
        }
        self.put(&candidate)?;
        Ok((candidate, true))
    }

    /// Apply `update` to the stored record with `candidate`'s key (or to
    /// `candidate` itself when absent) and store the result in place.
    pub fn update_or_create<T: Record>(
        &self,
        candidate: T,
        update: impl FnOnce(&mut T),
    ) -> Result<(T, bool)> {
        let key = candidate.key();
        let (mut record, created) = match self.get::<T>(&key)? {
            Some(existing) => (existing, false),
            None => (candidate, true),
        };
        update(&mut record);
        debug_assert_eq!(record.key(), key, "update must not change identity fields");
        self.put(&record)?;
        Ok((record, created))
    }

    pub fn put<T: Record>(&self, record: &T) -> Result<()> {
        let key = record.key();
        let value = serde_json::to_vec(record)?;
        let mut table = self.txn.open_table(T::TABLE).map_err(store_err)?;
        table
            .insert(key.as_str(), value.as_slice())
            .map_err(store_err)?;
        Ok(())
    }

    pub fn commit(self) -> Result<()> {
        self.txn.commit().map_err(store_err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
