//! In-memory mailbox used by the pipeline tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::error::{ResponderError, Result};
use crate::mail::{
    Header, LabelInfo, MailConnector, MailMessage, MailProvider, MailThread, NewLabel,
    UNREAD_LABEL,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub raw: String,
    pub label_ids: Vec<String>,
    pub thread_id: String,
}

#[derive(Default)]
struct MailboxState {
    labels: Vec<LabelInfo>,
    threads: Vec<MailThread>,
    thread_labels: HashMap<String, HashSet<String>>,
    sent: Vec<SentMessage>,
    created_labels: usize,
    get_calls: usize,
    fail_list: bool,
    fail_get: HashSet<String>,
    fail_send: HashSet<String>,
    fail_modify: HashSet<String>,
}

/// Mailbox whose threads and labels live in memory. Sending a reply does not
/// add a message to the thread; only the label change marks it handled.
#[derive(Default)]
pub struct FakeMailbox {
    state: Mutex<MailboxState>,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().labels.push(LabelInfo {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Add an unread thread; each entry of `messages` is one message's headers.
    pub fn with_unread_thread(self, id: &str, messages: Vec<Vec<Header>>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let messages = messages
                .into_iter()
                .enumerate()
                .map(|(i, headers)| MailMessage {
                    id: format!("{}-m{}", id, i),
                    headers,
                })
                .collect();
            state.threads.push(MailThread {
                id: id.to_string(),
                messages,
            });
            state
                .thread_labels
                .entry(id.to_string())
                .or_default()
                .insert(UNREAD_LABEL.to_string());
        }
        self
    }

    pub fn failing_list(self) -> Self {
        self.state.lock().unwrap().fail_list = true;
        self
    }

    pub fn failing_get(self, thread_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_get
            .insert(thread_id.to_string());
        self
    }

    pub fn failing_send(self, thread_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_send
            .insert(thread_id.to_string());
        self
    }

    pub fn failing_modify(self, thread_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_modify
            .insert(thread_id.to_string());
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn labels(&self) -> Vec<LabelInfo> {
        self.state.lock().unwrap().labels.clone()
    }

    pub fn created_labels(&self) -> usize {
        self.state.lock().unwrap().created_labels
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn thread_has_label(&self, thread_id: &str, label_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .thread_labels
            .get(thread_id)
            .is_some_and(|labels| labels.contains(label_id))
    }

    pub fn is_unread(&self, thread_id: &str) -> bool {
        self.thread_has_label(thread_id, UNREAD_LABEL)
    }
}

/// Fixed headers of a first message from `from`.
pub fn inbound(message_id: &str, from: &str, subject: &str) -> Vec<Header> {
    vec![
        Header::new("Message-ID", message_id),
        Header::new("From", from),
        Header::new("Subject", subject),
    ]
}

#[async_trait]
impl MailProvider for FakeMailbox {
    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        Ok(self.labels())
    }

    async fn create_label(&self, label: NewLabel) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.created_labels += 1;
        let id = format!("Label_{}", state.labels.len() + 1);
        state.labels.push(LabelInfo {
            id: id.clone(),
            name: label.name,
        });
        Ok(id)
    }

    async fn list_unread_threads(&self, max_results: u32) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.fail_list {
            return Err(ResponderError::provider("threads.list", "503 Service Unavailable"));
        }
        Ok(state
            .threads
            .iter()
            .filter(|thread| {
                state
                    .thread_labels
                    .get(&thread.id)
                    .is_some_and(|labels| labels.contains(UNREAD_LABEL))
            })
            .take(max_results as usize)
            .map(|thread| thread.id.clone())
            .collect())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<MailThread> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        if state.fail_get.contains(thread_id) {
            return Err(ResponderError::provider("threads.get", "500 Backend Error"));
        }
        state
            .threads
            .iter()
            .find(|thread| thread.id == thread_id)
            .cloned()
            .ok_or_else(|| ResponderError::provider("threads.get", "404 Not Found"))
    }

    async fn send_message(&self, raw: &str, label_ids: &[String], thread_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send.contains(thread_id) {
            return Err(ResponderError::provider("messages.send", "400 Invalid To header"));
        }
        state.sent.push(SentMessage {
            raw: raw.to_string(),
            label_ids: label_ids.to_vec(),
            thread_id: thread_id.to_string(),
        });
        Ok(())
    }

    async fn modify_thread(
        &self,
        thread_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_modify.contains(thread_id) {
            return Err(ResponderError::provider("threads.modify", "500 Backend Error"));
        }
        let labels = state.thread_labels.entry(thread_id.to_string()).or_default();
        for id in remove_label_ids {
            labels.remove(id);
        }
        labels.extend(add_label_ids.iter().cloned());
        Ok(())
    }
}

/// Connector handing out the same in-memory mailbox on every tick.
pub struct FakeConnector {
    mailbox: Arc<FakeMailbox>,
}

impl FakeConnector {
    pub fn new(mailbox: Arc<FakeMailbox>) -> Self {
        Self { mailbox }
    }
}

impl MailConnector for FakeConnector {
    async fn connect(&self) -> Result<Arc<dyn MailProvider>> {
        let provider: Arc<dyn MailProvider> = self.mailbox.clone();
        Ok(provider)
    }
}

/// Connector whose authorization always fails.
pub struct FailingConnector;

impl MailConnector for FailingConnector {
    async fn connect(&self) -> Result<Arc<dyn MailProvider>> {
        Err(ResponderError::Auth("browser login failed: user cancelled".to_string()))
    }
}
