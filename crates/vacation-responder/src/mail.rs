//! Mail provider capability interface.
//!
//! The polling pipeline never talks to an HTTP API directly. It consumes the
//! [`MailProvider`] trait, which covers exactly the calls a tick needs:
//! label lookup and creation, unread-thread listing, thread retrieval,
//! sending a raw message, and modifying a thread's labels.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// System label marking a thread or message as unread.
pub const UNREAD_LABEL: &str = "UNREAD";

/// Label as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// Request body for creating a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    pub name: String,
    pub label_list_visibility: String,
    pub message_list_visibility: String,
}

impl NewLabel {
    /// A label shown both in the label list and on messages in the message list.
    pub fn visible(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label_list_visibility: "labelShow".to_string(),
            message_list_visibility: "show".to_string(),
        }
    }
}

/// Single message header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Message inside a thread, reduced to its headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    pub id: String,
    pub headers: Vec<Header>,
}

/// Conversation thread fetched fresh on every tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailThread {
    pub id: String,
    pub messages: Vec<MailMessage>,
}

impl MailThread {
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Calls the polling pipeline makes against a mailbox.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// List every label on the account.
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a label and return its id.
    async fn create_label(&self, label: NewLabel) -> Result<String>;

    /// List ids of unread threads, in provider order.
    async fn list_unread_threads(&self, max_results: u32) -> Result<Vec<String>>;

    /// Fetch a thread with its messages' headers.
    async fn get_thread(&self, thread_id: &str) -> Result<MailThread>;

    /// Send a base64url-encoded RFC 2822 message into an existing thread.
    async fn send_message(&self, raw: &str, label_ids: &[String], thread_id: &str) -> Result<()>;

    /// Add and remove labels on a thread.
    async fn modify_thread(
        &self,
        thread_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()>;
}

/// Produces an authorized mail provider at the start of every tick.
#[allow(async_fn_in_trait)]
pub trait MailConnector {
    async fn connect(&self) -> Result<Arc<dyn MailProvider>>;
}
