use google_gmail1::api;

use crate::error::{GmailError, Result};

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single message inside a thread, reduced to what the reply logic reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub headers: Vec<Header>,
    pub label_ids: Vec<String>,
}

impl Message {
    /// First header with this name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn has_label(&self, label_id: &str) -> bool {
        self.label_ids.iter().any(|id| id == label_id)
    }
}

/// A conversation; messages are in chronological order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
    pub messages: Vec<Message>,
}

impl Thread {
    /// The message that started the thread
    pub fn original(&self) -> Result<&Message> {
        self.messages
            .first()
            .ok_or_else(|| GmailError::DataShape(format!("thread {} has no messages", self.id)))
    }

    /// Every message after the original
    pub fn replies(&self) -> &[Message] {
        self.messages.get(1..).unwrap_or_default()
    }
}

/// Header values of the original email that drive the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub received_time: Option<String>,
}

impl OriginalEmail {
    /// Parse the reply-relevant headers out of a thread's first message.
    ///
    /// `From` is required. `To` and `Subject` default to empty, and the
    /// received time is absent when there is no usable `Received` header
    /// (mail sent from this account has none).
    pub fn from_message(message: &Message) -> Result<Self> {
        let from = message
            .header("From")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                GmailError::DataShape(format!("message {} has no From header", message.id))
            })?
            .to_string();

        Ok(Self {
            from,
            to: message.header("To").unwrap_or_default().to_string(),
            subject: message.header("Subject").unwrap_or_default().to_string(),
            received_time: message.header("Received").and_then(parse_received_time),
        })
    }
}

/// The timestamp part of a `Received` header: the text after the first `;`
pub fn parse_received_time(value: &str) -> Option<String> {
    let (_, timestamp) = value.split_once(';')?;
    let timestamp = timestamp.split(';').next().unwrap_or_default().trim();
    if timestamp.is_empty() {
        None
    } else {
        Some(timestamp.to_string())
    }
}

/// A thread this system has (or would have) taken care of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandledThread {
    pub thread_id: String,
    pub sender_email: String,
    pub received_time: Option<String>,
}

impl HandledThread {
    pub fn received_display(&self) -> &str {
        self.received_time.as_deref().unwrap_or("unknown")
    }
}

/// Result of looking at one thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// No replies yet; a reply was sent and the marker label applied
    AutoReplied(HandledThread),
    /// Marker label already present from an earlier run
    PreviouslyHandled(HandledThread),
    /// Dry run: a reply would have been sent
    WouldReply(HandledThread),
    /// The thread has genuine replies and was never auto-handled
    NotAutoReplied { thread_id: String },
}

impl ReplyOutcome {
    pub fn handled(&self) -> Option<&HandledThread> {
        match self {
            ReplyOutcome::AutoReplied(h)
            | ReplyOutcome::PreviouslyHandled(h)
            | ReplyOutcome::WouldReply(h) => Some(h),
            ReplyOutcome::NotAutoReplied { .. } => None,
        }
    }

    pub fn sent_reply(&self) -> bool {
        matches!(self, ReplyOutcome::AutoReplied(_))
    }
}

/// Convert a Gmail API message, failing on a missing id
pub fn parse_api_message(msg: api::Message) -> Result<Message> {
    let id = msg
        .id
        .ok_or_else(|| GmailError::DataShape("message without id".to_string()))?;

    let headers = msg
        .payload
        .and_then(|p| p.headers)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|h| match (h.name, h.value) {
            (Some(name), Some(value)) => Some(Header { name, value }),
            _ => None,
        })
        .collect();

    Ok(Message {
        id,
        headers,
        label_ids: msg.label_ids.unwrap_or_default(),
    })
}

/// Convert a Gmail API thread; `fallback_id` is used when the response omits it
pub fn parse_api_thread(thread: api::Thread, fallback_id: &str) -> Result<Thread> {
    let id = thread.id.unwrap_or_else(|| fallback_id.to_string());
    let messages = thread
        .messages
        .unwrap_or_default()
        .into_iter()
        .map(parse_api_message)
        .collect::<Result<Vec<_>>>()?;

    Ok(Thread { id, messages })
}

/// Convert a Gmail API label; both id and name are required
pub fn parse_api_label(label: api::Label) -> Result<LabelInfo> {
    match (label.id, label.name) {
        (Some(id), Some(name)) => Ok(LabelInfo { id, name }),
        (None, name) => Err(GmailError::DataShape(format!(
            "label {} has no id",
            name.unwrap_or_default()
        ))),
        (Some(id), None) => Err(GmailError::DataShape(format!("label {} has no name", id))),
    }
}
