//! lorebase_client - client library for a knowledge-base chat backend.
//!
//! Wires the pieces in dependency order: global config is fetched first,
//! the auth provider is built from it, the session manager drives the
//! token lifecycle, and the chat/knowledge clients attach bearer tokens
//! from the session to every request.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod knowledge;

use std::sync::Arc;

use reqwest::Client;

pub use auth::{OidcProvider, SessionManager, StaticTokenProvider, TokenProvider};
pub use chat::{ChatTransport, Conversation, Message, Role};
pub use config::{ConfigLoader, GlobalConfig};
pub use error::{Error, Result};
pub use knowledge::{DirectSubmission, KnowledgeClient, SubmissionReceipt, UrlSubmission};
pub use session_state::{Session, SessionPhase, ADMIN_SCOPE};

/// Credential material available for silent login.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Refresh token from a previous interactive login.
    pub refresh_token: Option<String>,
    /// Fixed access token; forces the static provider (fake login).
    pub access_token: Option<String>,
}

/// Everything a front end needs, initialized in order: config, provider,
/// session, transports.
#[derive(Debug)]
pub struct LorebaseClient {
    config: GlobalConfig,
    session: Arc<SessionManager>,
    chat: ChatTransport,
    knowledge: KnowledgeClient,
}

impl LorebaseClient {
    /// Connect to a backend: fetch global config, build the provider, and
    /// run the initial silent token fetch.
    ///
    /// A config failure is fatal and returned as [`Error::ConfigLoad`]. A
    /// token failure is not: the client comes up unauthenticated and the
    /// caller decides whether to refresh again or go interactive.
    pub async fn connect(base_url: &str, credentials: Credentials) -> Result<Self> {
        let http = Client::builder().build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let loader = ConfigLoader::new(http.clone(), base_url.clone());
        let config = loader.load().await?.clone();

        let provider: Arc<dyn TokenProvider> =
            if config.use_fake_login() || credentials.access_token.is_some() {
                log::info!("Using static token provider");
                Arc::new(StaticTokenProvider::new(credentials.access_token))
            } else {
                Arc::new(OidcProvider::new(
                    http.clone(),
                    &config,
                    credentials.refresh_token,
                ))
            };

        let session = Arc::new(SessionManager::new(provider));
        // The machine starts in `checking`; run the entry fetch now.
        session.refresh().await;

        Ok(Self {
            chat: ChatTransport::new(http.clone(), base_url.clone(), Arc::clone(&session)),
            knowledge: KnowledgeClient::new(http, base_url, Arc::clone(&session)),
            session,
            config,
        })
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.session.session()
    }

    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn chat(&self) -> &ChatTransport {
        &self.chat
    }

    pub fn knowledge(&self) -> &KnowledgeClient {
        &self.knowledge
    }
}
