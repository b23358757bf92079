//! `datalink-core`: provisioning and reconciliation of monitoring data links.
//!
//! A data link routes a registered data source into a storage backend on the
//! remote data platform. This crate composes the resource configs a link
//! needs, submits them with bounded retry, and keeps a local metadata store
//! in step with what was provisioned.

pub mod cluster;
pub mod config;
pub mod error;
pub mod io;
pub mod link;
pub mod naming;
pub mod paths;
pub mod provisioner;
pub mod resources;
pub mod retry;
pub mod store;
pub mod tracking;
pub mod types;

pub use error::{DataLinkError, Result};
pub use link::{DataLink, LinkNames, Provisioning, SyncOutcome};
