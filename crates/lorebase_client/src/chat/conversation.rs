//! Conversation log for one chat view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    Error,
}

/// One entry in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered message log with at most one pending assistant reply.
///
/// Streamed text replaces the pending message's content in place, so the
/// log order never changes while a reply is arriving. An empty pending
/// message is what a front end renders as the loading indicator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: Option<usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether an assistant reply is still streaming in.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Append the user's message.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(Role::User, text));
    }

    /// Append an empty assistant message to stream the reply into.
    pub fn begin_pending(&mut self) {
        // The transport serializes sends, so a leftover pending slot means
        // a previous stream was abandoned; close it out rather than grow a
        // second one.
        if self.pending.is_some() {
            self.finish_pending();
        }
        self.messages.push(Message::new(Role::Assistant, ""));
        self.pending = Some(self.messages.len() - 1);
    }

    /// Replace the pending message's content with the text streamed so far.
    pub fn update_pending(&mut self, text: impl Into<String>) {
        if let Some(index) = self.pending {
            self.messages[index].text = text.into();
        }
    }

    /// Clear the pending marker, keeping whatever content accumulated.
    pub fn finish_pending(&mut self) {
        self.pending = None;
    }

    /// Replace the pending message with an error-role message; with no
    /// pending slot the error is appended instead.
    pub fn fail_pending(&mut self, reason: impl Into<String>) {
        let message = Message::new(Role::Error, reason);
        match self.pending.take() {
            Some(index) => self.messages[index] = message,
            None => self.messages.push(message),
        }
    }
}
