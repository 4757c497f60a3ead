//! Gmail API client: the single seam between the auto-responder and Gmail

use async_trait::async_trait;
use google_gmail1::api::{Label, Message, ModifyMessageRequest};
use std::io::Cursor;
use tracing::debug;

use crate::auth::{GmailHub, MODIFY_SCOPE};
use crate::error::{GmailError, Result};
use crate::models::{self, LabelInfo, Thread};

/// Headers requested when fetching a thread
const THREAD_METADATA_HEADERS: &[&str] = &["From", "To", "Subject", "Received"];

/// A message ready to be sent into an existing thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub thread_id: String,
    /// RFC 5322 text: headers, blank line, body
    pub rfc822: String,
}

/// Trait defining the Gmail operations the auto-responder needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Email address of the authenticated account
    async fn get_profile_email(&self) -> Result<String>;

    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a new label shown in both the label and message lists
    async fn create_label(&self, name: &str) -> Result<LabelInfo>;

    /// List ids of all threads matching a search query, in service order
    async fn list_threads(&self, query: &str) -> Result<Vec<String>>;

    /// Fetch a thread with every message's headers and label ids
    async fn get_thread(&self, thread_id: &str) -> Result<Thread>;

    /// Send a message within its thread, returning the new message id
    async fn send_message(&self, message: &OutgoingMessage) -> Result<String>;

    /// Apply a label to a message
    async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()>;
}

/// Production Gmail client backed by the google-gmail1 hub
pub struct ProductionGmailClient {
    hub: GmailHub,
}

impl ProductionGmailClient {
    pub fn new(hub: GmailHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl MailClient for ProductionGmailClient {
    async fn get_profile_email(&self) -> Result<String> {
        let (_, profile) = self
            .hub
            .users()
            .get_profile("me")
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        profile
            .email_address
            .ok_or_else(|| GmailError::DataShape("profile has no email address".to_string()))
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        debug!("Calling Gmail API to list labels...");
        let (_, response) = self
            .hub
            .users()
            .labels_list("me")
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        let labels = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(models::parse_api_label)
            .collect::<Result<Vec<_>>>()?;

        debug!("Successfully parsed {} labels", labels.len());
        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> Result<LabelInfo> {
        let label = Label {
            name: Some(name.to_string()),
            message_list_visibility: Some("show".to_string()),
            label_list_visibility: Some("labelShow".to_string()),
            ..Default::default()
        };

        let (_, created) = self
            .hub
            .users()
            .labels_create(label, "me")
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        let id = created
            .id
            .ok_or_else(|| GmailError::LabelError("Created label has no ID".to_string()))?;

        Ok(LabelInfo {
            id,
            name: created.name.unwrap_or_else(|| name.to_string()),
        })
    }

    async fn list_threads(&self, query: &str) -> Result<Vec<String>> {
        let mut all_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut call = self.hub.users().threads_list("me").q(query);

            if let Some(token) = page_token.as_ref() {
                call = call.page_token(token);
            }

            let (_, response) = call.add_scope(MODIFY_SCOPE).doit().await?;

            all_ids.extend(
                response
                    .threads
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|thread| thread.id),
            );

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!("Query '{}' matched {} threads", query, all_ids.len());
        Ok(all_ids)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        let mut call = self
            .hub
            .users()
            .threads_get("me", thread_id)
            .format("metadata");

        for header in THREAD_METADATA_HEADERS {
            call = call.add_metadata_headers(header);
        }

        let (_, thread) = call.add_scope(MODIFY_SCOPE).doit().await?;
        models::parse_api_thread(thread, thread_id)
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<String> {
        let metadata = Message {
            thread_id: Some(message.thread_id.clone()),
            ..Default::default()
        };

        let mime_type: mime::Mime = "message/rfc822"
            .parse()
            .map_err(|e: mime::FromStrError| GmailError::ApiError(e.to_string()))?;

        // The media upload carries the raw RFC 5322 bytes; the service does
        // the transfer encoding itself.
        let (_, sent) = self
            .hub
            .users()
            .messages_send(metadata, "me")
            .add_scope(MODIFY_SCOPE)
            .upload(Cursor::new(message.rfc822.clone().into_bytes()), mime_type)
            .await?;

        sent.id
            .ok_or_else(|| GmailError::DataShape("sent message has no id".to_string()))
    }

    async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()> {
        let modify_request = ModifyMessageRequest {
            add_label_ids: Some(vec![label_id.to_string()]),
            remove_label_ids: None,
        };

        self.hub
            .users()
            .messages_modify(modify_request, "me", message_id)
            .add_scope(MODIFY_SCOPE)
            .doit()
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mock_client_behind_shared_handle() {
        let mut mock = MockMailClient::new();
        mock.expect_get_profile_email()
            .times(1)
            .returning(|| Ok("me@example.com".to_string()));
        mock.expect_list_threads()
            .withf(|query| query == "after:1700000000")
            .times(1)
            .returning(|_| Ok(vec!["t1".to_string(), "t2".to_string()]));

        let client: Arc<dyn MailClient> = Arc::new(mock);

        assert_eq!(client.get_profile_email().await.unwrap(), "me@example.com");
        assert_eq!(
            client.list_threads("after:1700000000").await.unwrap(),
            vec!["t1".to_string(), "t2".to_string()]
        );
    }

    #[test]
    fn test_thread_metadata_headers_cover_reply_fields() {
        for header in ["From", "To", "Subject", "Received"] {
            assert!(THREAD_METADATA_HEADERS.contains(&header));
        }
    }
}
