use thiserror::Error;

use crate::types::DataLinkStrategy;

#[derive(Debug, Error)]
pub enum DataLinkError {
    #[error("not initialized: run 'datalink init'")]
    NotInitialized,

    #[error("data link not found: {0}")]
    DataLinkNotFound(String),

    #[error("data link '{name}' already exists with strategy {strategy}")]
    DataLinkExists {
        name: String,
        strategy: DataLinkStrategy,
    },

    #[error("storage cluster already registered: {0}")]
    ClusterExists(String),

    #[error("unsupported data link strategy: {0}")]
    UnsupportedStrategy(DataLinkStrategy),

    #[error("invalid name '{0}': must be lowercase alphanumeric with underscores or hyphens")]
    InvalidName(String),

    #[error("metadata store error: {0}")]
    Store(String),

    #[error("provisioning API returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DataLinkError>;

/// Stringify a redb failure into [`DataLinkError::Store`].
pub(crate) fn store_err(e: impl std::fmt::Display) -> DataLinkError {
    DataLinkError::Store(e.to_string())
}
