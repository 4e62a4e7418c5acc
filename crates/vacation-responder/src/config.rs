use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ResponderError, Result};

/// Label applied to every thread that received an automatic reply.
pub const DEFAULT_LABEL: &str = "vacation";

/// Body of the automatic reply.
pub const DEFAULT_REPLY_BODY: &str = "On Vacation! 😎";

#[derive(Debug, Clone, Parser)]
#[command(name = "vacation-responder")]
#[command(about = "Auto-reply to first-time senders while you are away")]
#[command(
    long_about = "Polls a Gmail mailbox for unread threads that contain a single message,\n\
    sends each sender a vacation reply in the same thread, then marks the thread\n\
    read and applies the vacation label."
)]
pub struct ResponderConfig {
    /// OAuth client registration file (installed or web application).
    #[arg(
        long,
        value_name = "FILE",
        default_value = "credentials.json",
        env = "VACATION_CREDENTIALS_PATH"
    )]
    pub credentials_path: PathBuf,

    /// File holding the authorized-user refresh token.
    ///
    /// Created after the first browser login. Delete it to start fresh.
    #[arg(
        long,
        value_name = "FILE",
        default_value = "token.json",
        env = "VACATION_TOKEN_PATH"
    )]
    pub token_path: PathBuf,

    /// Name of the label applied to answered threads.
    #[arg(long = "label", default_value = DEFAULT_LABEL, env = "VACATION_LABEL")]
    pub label_name: String,

    /// Seconds between polls.
    #[arg(
        long = "interval-secs",
        value_name = "SECS",
        default_value_t = 60,
        env = "VACATION_POLL_INTERVAL_SECS"
    )]
    pub poll_interval_secs: u64,

    /// Maximum unread threads listed per poll.
    #[arg(
        long = "max-unread",
        value_name = "COUNT",
        default_value_t = 10_000,
        env = "VACATION_MAX_UNREAD"
    )]
    pub max_unread_threads: u32,

    /// HTML body sent in every reply.
    #[arg(long, default_value = DEFAULT_REPLY_BODY, env = "VACATION_REPLY_BODY")]
    pub reply_body: String,

    /// Run a single poll and exit.
    #[arg(long)]
    pub once: bool,
}

impl ResponderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(ResponderError::config(
                "VACATION_POLL_INTERVAL_SECS must be greater than zero",
            ));
        }
        if self.max_unread_threads == 0 {
            return Err(ResponderError::config(
                "VACATION_MAX_UNREAD must be greater than zero",
            ));
        }
        if self.label_name.trim().is_empty() {
            return Err(ResponderError::config("VACATION_LABEL must not be empty"));
        }
        Ok(())
    }
}
