//! Knowledge-base submission API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::auth::SessionManager;
use crate::error::{Error, Result};

const DEFAULT_CRAWL_DEPTH: u32 = 3;

/// Direct text submission for `POST /pinecone/add`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSubmission {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub date_submitted: DateTime<Utc>,
}

impl DirectSubmission {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            date_submitted: Utc::now(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// URL ingestion request for `POST /pinecone/add-from-url`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlSubmission {
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub crawl_entire_site: bool,
    pub crawl_depth: u32,
}

impl UrlSubmission {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            tags: Vec::new(),
            crawl_entire_site: false,
            crawl_depth: DEFAULT_CRAWL_DEPTH,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Crawl the whole site instead of the single page.
    pub fn crawl_site(mut self, depth: u32) -> Self {
        self.crawl_entire_site = true;
        self.crawl_depth = depth;
        self
    }
}

/// What the backend reports for an accepted submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionReceipt {
    pub message: String,
    #[serde(default)]
    pub chunks: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the knowledge-base ingestion endpoints.
///
/// URL-based submission is an admin affordance: callers should consult
/// `Session::is_admin` before offering it, but the server is what actually
/// enforces the scope.
#[derive(Debug)]
pub struct KnowledgeClient {
    http: Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl KnowledgeClient {
    pub fn new(http: Client, base_url: String, session: Arc<SessionManager>) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    /// Submit text directly to the knowledge base.
    pub async fn add_direct(&self, submission: &DirectSubmission) -> Result<SubmissionReceipt> {
        if submission.title.trim().is_empty() || submission.content.trim().is_empty() {
            return Err(Error::InvalidSubmission(
                "both a title and content are required".to_string(),
            ));
        }
        self.post("pinecone/add", submission).await
    }

    /// Ask the backend to ingest a URL.
    ///
    /// Fire-and-forget: an Accepted status means a crawl was queued, not
    /// that any content landed yet.
    pub async fn add_from_url(&self, submission: &UrlSubmission) -> Result<SubmissionReceipt> {
        if submission.title.trim().is_empty() || submission.url.trim().is_empty() {
            return Err(Error::InvalidSubmission(
                "both a title and a URL are required".to_string(),
            ));
        }
        self.post("pinecone/add-from-url", submission).await
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<SubmissionReceipt> {
        let token = self.session.bearer_token()?;
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error.or(parsed.message))
                .unwrap_or(body);
            return Err(Error::Status { status, reason });
        }

        Ok(response.json::<SubmissionReceipt>().await?)
    }
}
