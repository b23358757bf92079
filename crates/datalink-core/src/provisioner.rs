//! Remote provisioning API client.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{DataLinkError, Result};
use crate::resources::ConfigFragment;

/// Path of the apply endpoint, relative to `api.base_url`.
pub const APPLY_PATH: &str = "/v4/apply/";

/// Gateway authentication header carrying app credentials as JSON.
pub const AUTH_HEADER: &str = "X-Bkapi-Authorization";

const MAX_ERROR_BODY: usize = 512;

/// Submits an ordered set of config fragments to the provisioning service.
///
/// Implementations must tolerate resubmission of the same set: callers
/// retry whole submissions on any error.
pub trait Provisioner {
    fn apply_data_link(&self, configs: &[ConfigFragment]) -> Result<Value>;
}

#[derive(Serialize)]
struct ApplyRequest<'a> {
    config: &'a [ConfigFragment],
}

/// [`Provisioner`] backed by the bkbase HTTP API.
pub struct HttpProvisioner {
    client: reqwest::blocking::Client,
    apply_url: String,
    auth: String,
}

impl HttpProvisioner {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()?;
        let auth = serde_json::json!({
            "bk_app_code": api.app_code,
            "bk_app_secret": api.app_secret,
            "bk_username": api.username,
        })
        .to_string();
        Ok(Self {
            client,
            apply_url: format!("{}{}", api.base_url.trim_end_matches('/'), APPLY_PATH),
            auth,
        })
    }
}

impl Provisioner for HttpProvisioner {
    fn apply_data_link(&self, configs: &[ConfigFragment]) -> Result<Value> {
        tracing::debug!(url = %self.apply_url, fragments = configs.len(), "submitting configs");
        let resp = self
            .client
            .post(&self.apply_url)
            .header(AUTH_HEADER, &self.auth)
            .json(&ApplyRequest { config: configs })
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(DataLinkError::Remote {
                status: status.as_u16(),
                message: truncate_on_char_boundary(body, MAX_ERROR_BODY),
            });
        }

        let value: Value = serde_json::from_str(&body)?;
        if value.get("result").and_then(Value::as_bool) == Some(false) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("apply rejected without a message")
                .to_string();
            return Err(DataLinkError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let data = value.get("data").filter(|d| !d.is_null()).cloned();
        Ok(data.unwrap_or(value))
    }
}

/// Cut `text` to at most `max` bytes without splitting a character.
fn truncate_on_char_boundary(mut text: String, max: usize) -> String {
    if text.len() > max {
        let cut = text
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|&i| i <= max)
            .last()
            .unwrap_or(0);
        text.truncate(cut);
    }
    text
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::resources::ResultTableConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn provisioner_for(server: &mockito::Server) -> HttpProvisioner {
        let api = ApiConfig {
            base_url: format!("{}/", server.url()),
            app_code: "bk_monitorv3".to_string(),
            app_secret: "s3cret".to_string(),
            username: "admin".to_string(),
            timeout_secs: 5,
        };
        HttpProvisioner::new(&api).unwrap()
    }

    fn fragments() -> Vec<ConfigFragment> {
        let settings = Settings::default();
        vec![ResultTableConfig::new("bkm_t", "link", "bkmonitor").compose_config(&settings)]
    }

    #[test]
    fn posts_configs_with_auth_and_returns_data() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", APPLY_PATH)
            .match_header(
                "x-bkapi-authorization",
                Matcher::Regex(r#""bk_app_code":"bk_monitorv3""#.to_string()),
            )
            .match_body(Matcher::PartialJson(json!({
                "config": [{ "kind": "ResultTable", "metadata": { "name": "bkm_t" } }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": true, "code": "00", "data": {"applied": 1}}"#)
            .create();

        let response = provisioner_for(&server).apply_data_link(&fragments()).unwrap();
        assert_eq!(response, json!({ "applied": 1 }));
        mock.assert();
    }

    #[test]
    fn http_error_becomes_remote_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", APPLY_PATH)
            .with_status(502)
            .with_body("bad gateway")
            .create();

        let err = provisioner_for(&server)
            .apply_data_link(&fragments())
            .unwrap_err();
        match err {
            DataLinkError::Remote { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn result_false_envelope_is_an_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", APPLY_PATH)
            .with_status(200)
            .with_body(r#"{"result": false, "message": "namespace not found", "data": null}"#)
            .create();

        let err = provisioner_for(&server)
            .apply_data_link(&fragments())
            .unwrap_err();
        assert!(
            matches!(&err, DataLinkError::Remote { message, .. } if message == "namespace not found"),
            "got {err:?}"
        );
    }

    #[test]
    fn long_non_ascii_error_body_is_cut_on_a_char_boundary() {
        let body = format!("{}{}", "x".repeat(MAX_ERROR_BODY - 1), "链路配置错误".repeat(50));
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", APPLY_PATH)
            .with_status(500)
            .with_body(body.as_str())
            .create();

        let err = provisioner_for(&server)
            .apply_data_link(&fragments())
            .unwrap_err();
        match err {
            DataLinkError::Remote { status, message } => {
                assert_eq!(status, 500);
                assert!(message.len() <= MAX_ERROR_BODY, "len {}", message.len());
                assert!(body.starts_with(&message));
                assert_eq!(message.len(), MAX_ERROR_BODY - 1);
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn truncation_keeps_short_text_and_whole_chars() {
        assert_eq!(truncate_on_char_boundary("ok".to_string(), 8), "ok");
        assert_eq!(truncate_on_char_boundary("链路配置".to_string(), 7), "链路");
        assert_eq!(truncate_on_char_boundary("链路配置".to_string(), 6), "链路");
        assert_eq!(truncate_on_char_boundary("链路".to_string(), 2), "");
    }

    #[test]
    fn null_data_returns_whole_envelope() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", APPLY_PATH)
            .with_status(200)
            .with_body(r#"{"result": true, "code": "00", "data": null}"#)
            .create();

        let response = provisioner_for(&server).apply_data_link(&fragments()).unwrap();
        assert_eq!(response, json!({ "result": true, "code": "00", "data": null }));
    }
}
