//! Token providers - the surface consumed from the remote auth provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::GlobalConfig;
use crate::error::{Error, Result};

/// What the client needs from an identity provider: a silent token fetch
/// plus login/logout redirect targets. Implementations must not prompt.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh access token without interactive prompting.
    async fn fetch_token_silently(&self) -> Result<String>;

    /// Where to send the user for an interactive login.
    fn login_url(&self, return_to: &str) -> Result<Url>;

    /// Where to send the user to end the provider session.
    fn logout_url(&self, return_to: &str) -> Result<Url>;
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenEndpointResponse {
    fn reason(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "provider returned no token".to_string())
    }
}

/// Real provider: refresh-token grant against the tenant's OIDC token
/// endpoint. "Silent" means a cached refresh token stands in for the user;
/// without one the fetch fails and the caller must go interactive.
#[derive(Debug, Clone)]
pub struct OidcProvider {
    http: Client,
    issuer: String,
    client_id: String,
    audience: String,
    scope: String,
    refresh_token: Option<String>,
}

impl OidcProvider {
    pub fn new(http: Client, config: &GlobalConfig, refresh_token: Option<String>) -> Self {
        Self {
            http,
            issuer: format!("https://{}", config.domain),
            client_id: config.client_id.clone(),
            audience: config.audience.clone(),
            scope: config.scope.clone(),
            refresh_token,
        }
    }

    /// Point the provider at an explicit issuer URL instead of
    /// `https://{domain}`. Used when the backend proxies the tenant, and by
    /// tests.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.issuer, path))
            .map_err(|err| Error::TokenFetch(format!("bad provider URL: {err}")))
    }
}

#[async_trait]
impl TokenProvider for OidcProvider {
    async fn fetch_token_silently(&self) -> Result<String> {
        let refresh_token = self.refresh_token.as_deref().ok_or_else(|| {
            Error::TokenFetch("no cached provider session; interactive login required".to_string())
        })?;

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("audience", self.audience.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let url = self.endpoint("oauth/token")?;
        log::debug!("Silent token fetch against {url}");

        let response = self
            .http
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|err| Error::TokenFetch(err.to_string()))?;

        let status = response.status();
        let body = response
            .json::<TokenEndpointResponse>()
            .await
            .map_err(|err| Error::TokenFetch(format!("malformed token response: {err}")))?;

        if !status.is_success() {
            return Err(Error::TokenFetch(format!("{status}: {}", body.reason())));
        }

        let reason = body.reason();
        body.access_token
            .ok_or_else(|| Error::TokenFetch(reason))
    }

    fn login_url(&self, return_to: &str) -> Result<Url> {
        let mut url = self.endpoint("authorize")?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("audience", &self.audience)
            .append_pair("scope", &self.scope)
            .append_pair("redirect_uri", return_to);
        Ok(url)
    }

    fn logout_url(&self, return_to: &str) -> Result<Url> {
        let mut url = self.endpoint("v2/logout")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("returnTo", return_to);
        Ok(url)
    }
}

/// Fake-login provider for local development: hands back a fixed credential
/// and loops redirects straight back to the app.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token_silently(&self) -> Result<String> {
        self.token
            .clone()
            .ok_or_else(|| Error::TokenFetch("no static token configured".to_string()))
    }

    fn login_url(&self, return_to: &str) -> Result<Url> {
        Url::parse(return_to).map_err(|err| Error::TokenFetch(err.to_string()))
    }

    fn logout_url(&self, return_to: &str) -> Result<Url> {
        Url::parse(return_to).map_err(|err| Error::TokenFetch(err.to_string()))
    }
}
