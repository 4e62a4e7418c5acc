//! Per-thread reply fan-out.
//!
//! Every qualifying thread gets its own task. The dispatcher waits for all of
//! them and reports which threads were answered and which failed, so a tick
//! only finishes once every reply has been sent or has failed.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::{ResponderError, Result};
use crate::mail::{MailProvider, UNREAD_LABEL};
use crate::reply::{ReplyHeaders, ReplyMessage};

/// Reply that could not be completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedReply {
    pub thread_id: String,
    pub error: String,
}

/// Outcome of one dispatch, in the order the threads were handed in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: Vec<String>,
    pub failed: Vec<FailedReply>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.sent.len() + self.failed.len()
    }
}

#[derive(Debug, Clone)]
pub struct ReplyDispatcher {
    body: String,
}

impl ReplyDispatcher {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Reply to every thread concurrently and wait for all replies.
    pub async fn dispatch(
        &self,
        provider: Arc<dyn MailProvider>,
        label_id: &str,
        thread_ids: &[String],
    ) -> DispatchReport {
        if thread_ids.is_empty() {
            tracing::info!("No new mail received");
            return DispatchReport::default();
        }

        tracing::info!(
            "{} mail(s) received! Sending responses...",
            thread_ids.len()
        );

        let mut tasks = JoinSet::new();
        let mut slots = HashMap::with_capacity(thread_ids.len());
        for (index, thread_id) in thread_ids.iter().enumerate() {
            let provider = Arc::clone(&provider);
            let label_id = label_id.to_string();
            let thread_id = thread_id.clone();
            let body = self.body.clone();
            let handle = tasks.spawn(async move {
                reply_to_thread(provider.as_ref(), &label_id, &thread_id, &body).await
            });
            slots.insert(handle.id(), index);
        }

        let mut outcomes: Vec<Option<Result<()>>> = thread_ids.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (task_id, result) = match joined {
                Ok((task_id, result)) => (task_id, result),
                Err(e) => (e.id(), Err(ResponderError::from(e))),
            };
            if let Some(&index) = slots.get(&task_id) {
                outcomes[index] = Some(result);
            }
        }

        let mut report = DispatchReport::default();
        for (thread_id, outcome) in thread_ids.iter().zip(outcomes) {
            let error = match outcome {
                Some(Ok(())) => {
                    report.sent.push(thread_id.clone());
                    continue;
                }
                Some(Err(e)) => e.to_string(),
                None => "reply task did not complete".to_string(),
            };
            tracing::warn!("Failed to reply to thread {}: {}", thread_id, error);
            report.failed.push(FailedReply {
                thread_id: thread_id.clone(),
                error,
            });
        }

        tracing::info!(
            "Sent {} of {} vacation replies",
            report.sent.len(),
            report.attempted()
        );
        report
    }
}

/// Fetch the thread, send the reply into it, then mark it read and labeled.
async fn reply_to_thread(
    provider: &dyn MailProvider,
    label_id: &str,
    thread_id: &str,
    body: &str,
) -> Result<()> {
    let thread = provider.get_thread(thread_id).await?;
    let first = thread
        .messages
        .first()
        .ok_or(ResponderError::MissingField("thread message"))?;

    let reply = ReplyMessage::new(ReplyHeaders::from_headers(&first.headers), body);
    let labels = vec![label_id.to_string()];

    provider
        .send_message(&reply.to_raw(), &labels, thread_id)
        .await?;
    provider
        .modify_thread(thread_id, &labels, &[UNREAD_LABEL.to_string()])
        .await?;

    tracing::debug!("Replied to {} in thread {}", reply.to, thread_id);
    Ok(())
}
