//! Streaming chat transport.

use std::sync::{Arc, RwLock};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;

use crate::auth::SessionManager;
use crate::chat::conversation::{Conversation, Message};
use crate::chat::decode::ChunkAssembler;
use crate::error::{Error, Result};

/// Issues chat requests and assembles the streamed reply into the
/// conversation it owns. Observers read cloned snapshots only.
#[derive(Debug)]
pub struct ChatTransport {
    http: Client,
    base_url: String,
    session: Arc<SessionManager>,
    conversation: RwLock<Conversation>,
    // Serializes sends so the conversation never holds two pending replies.
    stream_guard: Mutex<()>,
}

impl ChatTransport {
    pub fn new(http: Client, base_url: String, session: Arc<SessionManager>) -> Self {
        Self {
            http,
            base_url,
            session,
            conversation: RwLock::new(Conversation::new()),
            stream_guard: Mutex::new(()),
        }
    }

    /// Read-only snapshot of the conversation.
    pub fn conversation(&self) -> Vec<Message> {
        self.conversation
            .read()
            .expect("conversation lock")
            .messages()
            .to_vec()
    }

    /// Send a message and stream the reply into the conversation.
    ///
    /// Whitespace-only input is a no-op returning `Ok(None)`. On success
    /// the fully assembled reply is returned; on failure the pending
    /// bubble has already been replaced by an error message and the error
    /// is returned as well. Never retries.
    pub async fn send_message(&self, text: &str) -> Result<Option<String>> {
        self.send_message_watched(text, None).await
    }

    /// Like [`Self::send_message`], additionally forwarding each appended
    /// fragment to `watcher` as it arrives. A dropped receiver means the
    /// owning view was torn down: reading stops and the connection is
    /// released without committing anything further.
    pub async fn send_message_watched(
        &self,
        text: &str,
        watcher: Option<&Sender<String>>,
    ) -> Result<Option<String>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let _streaming = self.stream_guard.lock().await;

        {
            let mut conversation = self.conversation.write().expect("conversation lock");
            conversation.push_user(trimmed);
            conversation.begin_pending();
        }

        match self.stream_reply(trimmed, watcher).await {
            Ok(reply) => {
                self.conversation
                    .write()
                    .expect("conversation lock")
                    .finish_pending();
                Ok(Some(reply))
            }
            Err(err) => {
                log::error!("Chat request failed: {err}");
                self.conversation
                    .write()
                    .expect("conversation lock")
                    .fail_pending(format!("Error: {err}"));
                Err(err)
            }
        }
    }

    async fn stream_reply(&self, text: &str, watcher: Option<&Sender<String>>) -> Result<String> {
        let token = self.session.bearer_token()?;
        let url = format!("{}/chat", self.base_url);
        log::debug!("POST {url}");

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "text/plain")
            .header("Authorization", format!("Bearer {token}"))
            .body(text.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(Error::Status { status, reason });
        }

        let mut assembler = ChunkAssembler::new();
        let mut stream = response.bytes_stream();

        // Chunks are awaited one at a time; accumulation is monotonic and
        // gap-free by construction.
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let fragment = assembler.push(&chunk).to_string();
            if fragment.is_empty() {
                continue;
            }
            self.conversation
                .write()
                .expect("conversation lock")
                .update_pending(assembler.text());
            if let Some(tx) = watcher {
                if tx.send(fragment).await.is_err() {
                    log::warn!("Reply watcher dropped; abandoning stream");
                    return Ok(assembler.text().to_string());
                }
            }
        }

        let reply = assembler.finish().to_string();
        self.conversation
            .write()
            .expect("conversation lock")
            .update_pending(&reply);
        Ok(reply)
    }
}
