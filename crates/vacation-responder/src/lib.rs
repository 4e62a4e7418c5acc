//! Gmail vacation responder.
//!
//! Polls a mailbox on a fixed interval, finds unread threads that hold a
//! single message, answers each one with a vacation reply in the same
//! thread, then marks the thread read and applies a marker label. The
//! mailbox's own read and label state is the only record of what has been
//! answered.

pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod gmail_client;
pub mod labels;
pub mod mail;
pub mod pipeline;
pub mod reply;
pub mod scanner;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use error::{ResponderError, Result};
