//! Per-thread reply decision, reply composition and labelling

use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{MailClient, OutgoingMessage};
use crate::config::ReplyConfig;
use crate::error::Result;
use crate::models::{HandledThread, LabelInfo, OriginalEmail, ReplyOutcome};

/// Header set and body of an automated reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedReply {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ComposedReply {
    /// RFC 5322 text: CRLF-separated headers, a blank line, then the body
    pub fn to_rfc822(&self) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{}",
            self.from, self.to, self.subject, self.body
        )
    }
}

#[derive(Debug, Clone)]
pub struct ReplyTemplate {
    pub body: String,
    pub swap_addresses: bool,
}

impl ReplyTemplate {
    pub fn from_config(config: &ReplyConfig) -> Self {
        Self {
            body: config.body.clone(),
            swap_addresses: config.swap_addresses,
        }
    }

    /// Headers are copied from the original as-is: From stays From and To
    /// stays To, unless `swap_addresses` is set.
    pub fn compose(&self, original: &OriginalEmail) -> ComposedReply {
        let (from, to) = if self.swap_addresses {
            (original.to.clone(), original.from.clone())
        } else {
            (original.from.clone(), original.to.clone())
        };

        ComposedReply {
            from,
            to,
            subject: original.subject.clone(),
            body: self.body.clone(),
        }
    }
}

impl Default for ReplyTemplate {
    fn default() -> Self {
        Self::from_config(&ReplyConfig::default())
    }
}

/// Decides whether a thread needs an automated reply and sends it
pub struct ReplyDecider {
    client: Arc<dyn MailClient>,
    template: ReplyTemplate,
    dry_run: bool,
}

impl ReplyDecider {
    pub fn new(client: Arc<dyn MailClient>, template: ReplyTemplate, dry_run: bool) -> Self {
        Self {
            client,
            template,
            dry_run,
        }
    }

    /// Reply to a thread nobody has answered yet and mark it with `label`.
    ///
    /// A label already on the original message means the thread was handled
    /// by an earlier scan, whatever the thread looks like now.
    ///
    /// The thread's headers are validated before anything is sent, so a
    /// malformed thread fails with a `DataShape` error and no side effects.
    pub async fn process_thread(&self, thread_id: &str, label: &LabelInfo) -> Result<ReplyOutcome> {
        let thread = self.client.get_thread(thread_id).await?;
        let original_message = thread.original()?;
        let original = OriginalEmail::from_message(original_message)?;
        let replies = thread.replies();

        let handled = HandledThread {
            thread_id: thread.id.clone(),
            sender_email: original.from.clone(),
            received_time: original.received_time.clone(),
        };

        if original_message.has_label(&label.id) {
            return Ok(ReplyOutcome::PreviouslyHandled(handled));
        }

        if !replies.is_empty() {
            debug!(
                "Thread {} already has {} replies, leaving it alone",
                thread.id,
                replies.len()
            );
            return Ok(ReplyOutcome::NotAutoReplied {
                thread_id: thread.id.clone(),
            });
        }

        let reply = self.template.compose(&original);

        if self.dry_run {
            info!(
                "[dry run] would reply to thread {} from {} with subject '{}'",
                thread.id, reply.to, reply.subject
            );
            return Ok(ReplyOutcome::WouldReply(handled));
        }

        let outgoing = OutgoingMessage {
            thread_id: thread.id.clone(),
            rfc822: reply.to_rfc822(),
        };
        let sent_id = self.client.send_message(&outgoing).await?;
        debug!("Sent reply {} in thread {}", sent_id, thread.id);

        self.client
            .apply_label(&original_message.id, &label.id)
            .await?;
        debug!(
            "Applied label {} to message {}",
            label.name, original_message.id
        );

        Ok(ReplyOutcome::AutoReplied(handled))
    }
}
