use crate::error::Result;
use crate::mail::MailProvider;

/// Finds unread threads that still hold a single message, i.e. first
/// contact that nobody has answered yet.
#[derive(Debug, Clone)]
pub struct ThreadScanner {
    max_results: u32,
}

impl ThreadScanner {
    pub fn new(max_results: u32) -> Self {
        Self { max_results }
    }

    /// List unread threads and keep those with exactly one message, in
    /// provider order.
    ///
    /// A failed listing is returned as an error. A failure while fetching any
    /// single thread drops the whole batch for this tick instead of returning
    /// a partial result.
    pub async fn find_new_threads(&self, provider: &dyn MailProvider) -> Result<Vec<String>> {
        let unread = provider.list_unread_threads(self.max_results).await?;
        tracing::debug!("Found {} unread threads", unread.len());

        match Self::single_message_threads(provider, &unread).await {
            Ok(candidates) => Ok(candidates),
            Err(e) => {
                tracing::warn!(
                    "Skipping this poll, failed to inspect {} unread threads: {}",
                    unread.len(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    async fn single_message_threads(
        provider: &dyn MailProvider,
        thread_ids: &[String],
    ) -> Result<Vec<String>> {
        let mut candidates = Vec::new();
        for id in thread_ids {
            let thread = provider.get_thread(id).await?;
            if thread.message_count() == 1 {
                candidates.push(id.clone());
            }
        }
        Ok(candidates)
    }
}
