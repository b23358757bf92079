use crate::error::{DataLinkError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

/// Connection details for the remote provisioning API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub app_code: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default = "default_username")]
    pub username: String,
    /// Per-attempt request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api/bk-base/prod".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            app_code: String::new(),
            app_secret: String::new(),
            username: default_username(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Namespace new data links and their resources are created in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Business id prefixed to canonical bkbase table ids.
    #[serde(default = "default_bkdata_biz_id")]
    pub bkdata_biz_id: u32,
    #[serde(default = "default_maintainers")]
    pub maintainers: Vec<String>,
    #[serde(default)]
    pub api: ApiConfig,
}

fn default_version() -> u32 {
    1
}

fn default_namespace() -> String {
    "bkmonitor".to_string()
}

fn default_bkdata_biz_id() -> u32 {
    2
}

fn default_maintainers() -> Vec<String> {
    vec!["admin".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            namespace: default_namespace(),
            bkdata_biz_id: default_bkdata_biz_id(),
            maintainers: default_maintainers(),
            api: ApiConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(root: &Path) -> Result<Self> {
        crate::io::read_yaml(&paths::config_path(root))?.ok_or(DataLinkError::NotInitialized)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_yaml(&paths::config_path(root), self)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.namespace.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "namespace is empty; resources cannot be addressed".to_string(),
            });
        }

        if self.maintainers.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no maintainers configured; provisioned resources will be unowned"
                    .to_string(),
            });
        }

        let url = self.api.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("api.base_url '{url}' is not an http(s) URL"),
            });
        }

        if self.api.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "api.timeout_secs is 0; every apply attempt will time out".to_string(),
            });
        }

        if self.api.app_code.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "api.app_code is empty; the gateway will likely reject requests"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
