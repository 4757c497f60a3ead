//! Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use gmail_autoreply::client::{MailClient, OutgoingMessage};
use gmail_autoreply::config::Config;
use gmail_autoreply::error::{GmailError, Result};
use gmail_autoreply::models::{Header, LabelInfo, Message, Thread};
use std::collections::VecDeque;
use std::sync::Mutex;

pub const ACCOUNT: &str = "me@example.com";

/// Received header value as Gmail reports it for incoming mail
pub const RECEIVED: &str =
    "by 2002:a05:6a10:1234 with SMTP id abc; Wed, 14 Oct 2026 09:15:02 -0700 (PDT)";

/// Create an incoming message with From/To/Subject/Received headers
pub fn incoming_message(id: &str, from: &str, subject: &str) -> Message {
    Message {
        id: id.to_string(),
        headers: vec![
            Header::new("From", from),
            Header::new("To", ACCOUNT),
            Header::new("Subject", subject),
            Header::new("Received", RECEIVED),
        ],
        label_ids: vec!["INBOX".to_string(), "UNREAD".to_string()],
    }
}

/// Create a reply written by a person in the mailbox
pub fn human_reply(id: &str, subject: &str) -> Message {
    Message {
        id: id.to_string(),
        headers: vec![
            Header::new("From", ACCOUNT),
            Header::new("Subject", format!("Re: {}", subject)),
        ],
        label_ids: vec!["SENT".to_string()],
    }
}

pub fn thread(id: &str, messages: Vec<Message>) -> Thread {
    Thread {
        id: id.to_string(),
        messages,
    }
}

/// A single-message thread from `from`
pub fn unanswered_thread(id: &str, from: &str, subject: &str) -> Thread {
    thread(id, vec![incoming_message(&format!("{}-m1", id), from, subject)])
}

/// Config with the default label and the development schedule
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.schedule = gmail_autoreply::config::ScheduleConfig::development();
    config
}

#[derive(Default)]
struct FakeState {
    labels: Vec<LabelInfo>,
    threads: Vec<Thread>,
    queries: Vec<String>,
    sent: Vec<OutgoingMessage>,
    applied_labels: Vec<(String, String)>,
    list_labels_calls: usize,
    create_label_calls: usize,
    list_threads_failures: VecDeque<GmailError>,
    detached_sends: bool,
    next_id: u64,
}

/// In-memory mailbox implementing the mail client seam
///
/// Threads keep their insertion order. Sending a message appends it to its
/// thread, so a later scan sees the auto-reply the way Gmail would show it,
/// unless the fake was built `with_detached_sends`.
#[derive(Default)]
pub struct FakeMailClient {
    state: Mutex<FakeState>,
}

impl FakeMailClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().labels.push(LabelInfo {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_thread(self, thread: Thread) -> Self {
        self.add_thread(thread);
        self
    }

    /// Sent messages stay out of their thread, as when Gmail does not
    /// thread a reply that lacks In-Reply-To/References
    pub fn with_detached_sends(self) -> Self {
        self.state.lock().unwrap().detached_sends = true;
        self
    }

    /// Deliver a new thread between scans
    pub fn add_thread(&self, thread: Thread) {
        self.state.lock().unwrap().threads.push(thread);
    }

    /// Make the next thread listing fail with `error`
    pub fn fail_next_list(&self, error: GmailError) {
        self.state
            .lock()
            .unwrap()
            .list_threads_failures
            .push_back(error);
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn applied_labels(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().applied_labels.clone()
    }

    pub fn labels(&self) -> Vec<LabelInfo> {
        self.state.lock().unwrap().labels.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn list_labels_calls(&self) -> usize {
        self.state.lock().unwrap().list_labels_calls
    }

    pub fn create_label_calls(&self) -> usize {
        self.state.lock().unwrap().create_label_calls
    }

    pub fn thread(&self, id: &str) -> Option<Thread> {
        self.state
            .lock()
            .unwrap()
            .threads
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }
}

fn sender_of(query: &str) -> Option<&str> {
    query
        .split_whitespace()
        .find_map(|term| term.strip_prefix("from:"))
}

#[async_trait]
impl MailClient for FakeMailClient {
    async fn get_profile_email(&self) -> Result<String> {
        Ok(ACCOUNT.to_string())
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let mut state = self.state.lock().unwrap();
        state.list_labels_calls += 1;
        Ok(state.labels.clone())
    }

    async fn create_label(&self, name: &str) -> Result<LabelInfo> {
        let mut state = self.state.lock().unwrap();
        state.create_label_calls += 1;
        if state.labels.iter().any(|l| l.name == name) {
            return Err(GmailError::BadRequest(format!(
                "Label name exists or conflicts: {}",
                name
            )));
        }
        state.next_id += 1;
        let label = LabelInfo {
            id: format!("Label_{}", state.next_id),
            name: name.to_string(),
        };
        state.labels.push(label.clone());
        Ok(label)
    }

    async fn list_threads(&self, query: &str) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.queries.push(query.to_string());
        if let Some(error) = state.list_threads_failures.pop_front() {
            return Err(error);
        }

        let sender = sender_of(query);
        Ok(state
            .threads
            .iter()
            .filter(|t| match sender {
                Some(address) => t
                    .messages
                    .first()
                    .and_then(|m| m.header("From"))
                    .is_some_and(|from| from.contains(address)),
                None => true,
            })
            .map(|t| t.id.clone())
            .collect())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        self.thread(thread_id)
            .ok_or_else(|| GmailError::NotFound(format!("thread {}", thread_id)))
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("sent-{}", state.next_id);

        let detached = state.detached_sends;
        let thread = state
            .threads
            .iter_mut()
            .find(|t| t.id == message.thread_id)
            .ok_or_else(|| GmailError::NotFound(format!("thread {}", message.thread_id)))?;
        if !detached {
            thread.messages.push(Message {
                id: id.clone(),
                headers: vec![Header::new("From", ACCOUNT)],
                label_ids: vec!["SENT".to_string()],
            });
        }

        state.sent.push(message.clone());
        Ok(id)
    }

    async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let message = state
            .threads
            .iter_mut()
            .flat_map(|t| t.messages.iter_mut())
            .find(|m| m.id == message_id)
            .ok_or_else(|| GmailError::NotFound(format!("message {}", message_id)))?;

        if !message.has_label(label_id) {
            message.label_ids.push(label_id.to_string());
        }
        state
            .applied_labels
            .push((message_id.to_string(), label_id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_of_query() {
        assert_eq!(sender_of("from:boss@example.com after:1700000000"), Some("boss@example.com"));
        assert_eq!(sender_of("after:1700000000"), None);
    }

    #[test]
    fn test_incoming_message_headers() {
        let msg = incoming_message("m1", "alice@example.com", "Hello");
        assert_eq!(msg.header("from"), Some("alice@example.com"));
        assert_eq!(msg.header("To"), Some(ACCOUNT));
    }
}
