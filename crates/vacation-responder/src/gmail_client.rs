//! Gmail API implementation of the mail capability interface.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use google_gmail1::api::{Label, Message, ModifyThreadRequest, Thread};
use google_gmail1::common::GetToken;
use google_gmail1::hyper_rustls::HttpsConnector;
use google_gmail1::Gmail;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::io::Cursor;
use std::sync::Arc;

use crate::credentials::CredentialStore;
use crate::error::{ResponderError, Result};
use crate::mail::{
    Header, LabelInfo, MailConnector, MailMessage, MailProvider, MailThread, NewLabel,
};

const USER_ID: &str = "me";

const UNREAD_QUERY: &str = "is:unread";

/// Headers requested when fetching a thread; everything a reply needs.
const REPLY_HEADERS: [&str; 3] = ["Message-ID", "From", "Subject"];

/// Client for interacting with Gmail API
pub struct GmailClient {
    hub: Gmail<HttpsConnector<HttpConnector>>,
}

impl GmailClient {
    /// Create a Gmail client on top of an authorized token source
    pub fn new(auth: impl GetToken + 'static) -> Result<Self> {
        let connector = google_gmail1::hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| {
                ResponderError::config(format!("Failed to load native TLS roots: {}", e))
            })?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);
        let hub = Gmail::new(client, auth);

        Ok(Self { hub })
    }

    fn parse_thread(thread: Thread) -> MailThread {
        let messages = thread
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(Self::parse_message)
            .collect();

        MailThread {
            id: thread.id.unwrap_or_default(),
            messages,
        }
    }

    fn parse_message(message: Message) -> MailMessage {
        let headers = message
            .payload
            .and_then(|payload| payload.headers)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|header| match (header.name, header.value) {
                (Some(name), value) => Some(Header::new(name, value.unwrap_or_default())),
                (None, _) => None,
            })
            .collect();

        MailMessage {
            id: message.id.unwrap_or_default(),
            headers,
        }
    }
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let (_, response) = self
            .hub
            .users()
            .labels_list(USER_ID)
            .doit()
            .await
            .map_err(|e| ResponderError::provider("labels.list", e))?;

        let labels = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(|label| match (label.id, label.name) {
                (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                _ => None,
            })
            .collect();

        Ok(labels)
    }

    async fn create_label(&self, label: NewLabel) -> Result<String> {
        let request = Label {
            name: Some(label.name),
            label_list_visibility: Some(label.label_list_visibility),
            message_list_visibility: Some(label.message_list_visibility),
            ..Default::default()
        };

        let (_, created) = self
            .hub
            .users()
            .labels_create(request, USER_ID)
            .doit()
            .await
            .map_err(|e| ResponderError::provider("labels.create", e))?;

        created.id.ok_or(ResponderError::MissingField("label id"))
    }

    async fn list_unread_threads(&self, max_results: u32) -> Result<Vec<String>> {
        let (_, response) = self
            .hub
            .users()
            .threads_list(USER_ID)
            .q(UNREAD_QUERY)
            .max_results(max_results)
            .doit()
            .await
            .map_err(|e| ResponderError::provider("threads.list", e))?;

        Ok(response
            .threads
            .unwrap_or_default()
            .into_iter()
            .filter_map(|thread| thread.id)
            .collect())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<MailThread> {
        let mut call = self
            .hub
            .users()
            .threads_get(USER_ID, thread_id)
            .format("metadata");
        for header in REPLY_HEADERS {
            call = call.add_metadata_headers(header);
        }

        let (_, thread) = call
            .doit()
            .await
            .map_err(|e| ResponderError::provider("threads.get", e))?;

        Ok(Self::parse_thread(thread))
    }

    async fn send_message(&self, raw: &str, label_ids: &[String], thread_id: &str) -> Result<()> {
        let bytes = URL_SAFE_NO_PAD.decode(raw)?;
        let metadata = Message {
            thread_id: Some(thread_id.to_string()),
            label_ids: Some(label_ids.to_vec()),
            ..Default::default()
        };
        let mime_type: mime::Mime = "message/rfc822"
            .parse()
            .map_err(|e| ResponderError::provider("messages.send", e))?;

        self.hub
            .users()
            .messages_send(metadata, USER_ID)
            .upload(Cursor::new(bytes), mime_type)
            .await
            .map_err(|e| ResponderError::provider("messages.send", e))?;

        Ok(())
    }

    async fn modify_thread(
        &self,
        thread_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        let request = ModifyThreadRequest {
            add_label_ids: Some(add_label_ids.to_vec()),
            remove_label_ids: Some(remove_label_ids.to_vec()),
        };

        self.hub
            .users()
            .threads_modify(request, USER_ID, thread_id)
            .doit()
            .await
            .map_err(|e| ResponderError::provider("threads.modify", e))?;

        Ok(())
    }
}

/// Authorizes through the credential store and opens a Gmail client.
pub struct GmailConnector {
    store: CredentialStore,
}

impl GmailConnector {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }
}

impl MailConnector for GmailConnector {
    async fn connect(&self) -> Result<Arc<dyn MailProvider>> {
        let auth = self.store.authorize().await?;
        let client: Arc<dyn MailProvider> = Arc::new(GmailClient::new(auth)?);
        Ok(client)
    }
}
