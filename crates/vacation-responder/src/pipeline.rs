//! One polling tick: authorize, ensure the label, find new threads, reply.

use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

use crate::config::ResponderConfig;
use crate::dispatcher::{DispatchReport, ReplyDispatcher};
use crate::error::Result;
use crate::labels::LabelManager;
use crate::mail::MailConnector;
use crate::scanner::ThreadScanner;
use crate::scheduler::PollJob;

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub label_id: String,
    pub candidates: Vec<String>,
    pub dispatch: DispatchReport,
}

pub struct Pipeline<C> {
    connector: C,
    labels: LabelManager,
    scanner: ThreadScanner,
    dispatcher: ReplyDispatcher,
}

impl<C: MailConnector> Pipeline<C> {
    pub fn new(
        connector: C,
        labels: LabelManager,
        scanner: ThreadScanner,
        dispatcher: ReplyDispatcher,
    ) -> Self {
        Self {
            connector,
            labels,
            scanner,
            dispatcher,
        }
    }

    pub fn from_config(connector: C, config: &ResponderConfig) -> Self {
        Self::new(
            connector,
            LabelManager::new(config.label_name.clone()),
            ThreadScanner::new(config.max_unread_threads),
            ReplyDispatcher::new(config.reply_body.clone()),
        )
    }

    /// Run every stage once. Authorization, label and listing failures abort
    /// the tick; per-thread reply failures are part of the report.
    pub async fn run_tick(&self) -> Result<TickReport> {
        tracing::info!("Fetch time: {}", Utc::now().to_rfc3339());

        let provider = self.connector.connect().await?;
        let label_id = self.labels.ensure_label(provider.as_ref()).await?;
        let candidates = self.scanner.find_new_threads(provider.as_ref()).await?;
        let dispatch = self
            .dispatcher
            .dispatch(Arc::clone(&provider), &label_id, &candidates)
            .await;

        Ok(TickReport {
            label_id,
            candidates,
            dispatch,
        })
    }
}

impl<C: MailConnector> PollJob for Pipeline<C> {
    async fn run(&self) -> anyhow::Result<()> {
        let report = self
            .run_tick()
            .await
            .with_context(|| format!("Poll for label '{}' aborted", self.labels.name()))?;

        tracing::debug!(
            "Poll complete: {} new thread(s), {} replied, {} failed",
            report.candidates.len(),
            report.dispatch.sent.len(),
            report.dispatch.failed.len()
        );
        Ok(())
    }
}
