//! Global runtime configuration, fetched from the backend before anything
//! else can initialize.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::{Error, Result};

const GLOBAL_CONFIG_PATH: &str = "config/global";

/// Auth bootstrap parameters served by `GET /config/global`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Tenant domain of the remote auth provider.
    pub domain: String,
    pub client_id: String,
    pub audience: String,
    pub scope: String,
    /// The backend serves this flag as a string ("true"/"false").
    #[serde(default)]
    fake_login: Option<String>,
}

impl GlobalConfig {
    /// Whether the backend asks for the fake-login provider (local dev).
    pub fn use_fake_login(&self) -> bool {
        self.fake_login.as_deref().map(parse_bool).unwrap_or(false)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Fetch-once loader for [`GlobalConfig`].
///
/// The first `load` issues the request; later callers get the cached value
/// or suspend until the in-flight fetch resolves. A failed load surfaces as
/// [`Error::ConfigLoad`] and caches nothing; the application is expected to
/// treat that as fatal rather than degrade.
#[derive(Debug)]
pub struct ConfigLoader {
    http: Client,
    base_url: String,
    cell: OnceCell<GlobalConfig>,
}

impl ConfigLoader {
    pub fn new(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url,
            cell: OnceCell::new(),
        }
    }

    /// The configuration, fetching it on first use.
    pub async fn load(&self) -> Result<&GlobalConfig> {
        self.cell.get_or_try_init(|| self.fetch()).await
    }

    /// The configuration, if a load already completed.
    pub fn get(&self) -> Option<&GlobalConfig> {
        self.cell.get()
    }

    async fn fetch(&self) -> Result<GlobalConfig> {
        let url = format!("{}/{}", self.base_url, GLOBAL_CONFIG_PATH);
        log::info!("Fetching global config from {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| Error::ConfigLoad(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ConfigLoad(format!("{url} returned {status}")));
        }

        let config = response
            .json::<GlobalConfig>()
            .await
            .map_err(|err| Error::ConfigLoad(format!("malformed config payload: {err}")))?;

        log::info!("Global config loaded (domain: {})", config.domain);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for value in ["1", "true", "TRUE", " yes ", "Y", "on"] {
            assert!(parse_bool(value), "value {value:?} should be true");
        }
        for value in ["0", "false", "no", "off", ""] {
            assert!(!parse_bool(value), "value {value:?} should be false");
        }
    }

    #[test]
    fn deserializes_camel_case_wire_format() {
        let config: GlobalConfig = serde_json::from_str(
            r#"{
                "domain": "tenant.example.auth",
                "clientId": "abc123",
                "audience": "https://api.example.net",
                "scope": "openid profile",
                "fakeLogin": "false"
            }"#,
        )
        .expect("config");

        assert_eq!(config.client_id, "abc123");
        assert!(!config.use_fake_login());
    }

    #[test]
    fn fake_login_defaults_to_off() {
        let config: GlobalConfig = serde_json::from_str(
            r#"{"domain": "d", "clientId": "c", "audience": "a", "scope": "s"}"#,
        )
        .expect("config");
        assert!(!config.use_fake_login());

        let config: GlobalConfig = serde_json::from_str(
            r#"{"domain": "d", "clientId": "c", "audience": "a", "scope": "s", "fakeLogin": "true"}"#,
        )
        .expect("config");
        assert!(config.use_fake_login());
    }
}
