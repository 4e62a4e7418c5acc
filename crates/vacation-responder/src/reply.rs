//! Vacation reply composition.
//!
//! Builds the minimal RFC 2822 message sent back into a thread and encodes it
//! into the base64url form the provider's send call expects.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;

use crate::mail::Header;

/// Routing headers taken from the first message of a thread.
///
/// Missing headers are left empty rather than treated as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyHeaders {
    pub message_id: String,
    pub from: String,
    pub subject: String,
}

impl ReplyHeaders {
    /// Pick `Message-ID`, `From` and `Subject`. Header names compare
    /// case-insensitively and the first occurrence wins.
    pub fn from_headers(headers: &[Header]) -> Self {
        let find = |wanted: &str| {
            headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(wanted))
                .map(|h| h.value.clone())
                .unwrap_or_default()
        };

        Self {
            message_id: find("Message-ID"),
            from: find("From"),
            subject: find("Subject"),
        }
    }
}

/// Encode a header value as a MIME encoded-word (utf-8, base64).
pub fn encode_subject(subject: &str) -> String {
    format!("=?utf-8?B?{}?=", STANDARD.encode(subject.as_bytes()))
}

/// Reply to a single thread, alive only for the duration of a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMessage {
    pub to: String,
    pub in_reply_to: String,
    pub references: String,
    pub subject: String,
    pub body: String,
}

impl ReplyMessage {
    /// Address the reply to the original sender, threaded on its Message-ID.
    /// The subject is reused unchanged.
    pub fn new(headers: ReplyHeaders, body: impl Into<String>) -> Self {
        Self {
            to: headers.from,
            references: headers.message_id.clone(),
            in_reply_to: headers.message_id,
            subject: headers.subject,
            body: body.into(),
        }
    }

    pub fn to_rfc2822(&self) -> String {
        [
            format!("To: {}", self.to),
            format!("In-Reply-To: {}", self.in_reply_to),
            format!("References: {}", self.references),
            "Content-Type: text/html; charset=utf-8".to_string(),
            "MIME-Version: 1.0".to_string(),
            format!("Subject: {}", encode_subject(&self.subject)),
            String::new(),
            self.body.clone(),
        ]
        .join("\r\n")
    }

    /// Base64url without padding, as accepted by the send call.
    pub fn to_raw(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_rfc2822().as_bytes())
    }
}
