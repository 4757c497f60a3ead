//! Gmail Auto-Reply
//!
//! Polls a Gmail mailbox and sends exactly one automatic reply to every
//! thread started today that nobody has answered yet. Replied threads carry
//! a marker label so later scans recognise them.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 installed-app flow with token caching
//! - **Scanning**: today's threads, optionally restricted to one sender
//! - **Reply decision**: reply, skip as already handled, or skip as answered
//! - **Label Management**: lookup-or-create of the marker label
//! - **Scheduling**: repeat scans at random intervals until stopped
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use gmail_autoreply::{auth, cli, client::ProductionGmailClient, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let hub = auth::initialize_gmail_hub(
//!         "credentials.json".as_ref(),
//!         ".gmail-autoreply/token.json".as_ref(),
//!     )
//!     .await?;
//!
//!     let scanner = cli::build_scanner(Arc::new(ProductionGmailClient::new(hub)), &config);
//!     let report = scanner.scan(&config.scan.sender.parse()?).await?;
//!     println!("{} replies sent", report.replies_sent());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`client`] - Mail client trait and Gmail API implementation
//! - [`cli`] - Command-line interface and bootstrap
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`label_manager`] - Marker label lookup and creation
//! - [`models`] - Core data structures
//! - [`policy`] - Reaction to failed scans
//! - [`responder`] - Reply composition and per-thread decision
//! - [`scanner`] - Search query and one scan pass
//! - [`scheduler`] - Randomised polling loop

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod label_manager;
pub mod models;
pub mod policy;
pub mod responder;
pub mod scanner;
pub mod scheduler;

// Re-export commonly used types for convenience
pub use error::{GmailError, Result};

// Core data models
pub use models::{HandledThread, LabelInfo, Message, OriginalEmail, ReplyOutcome, Thread};

// Config types
pub use config::{Config, ExecutionConfig, PolicyConfig, ReplyConfig, ScanConfig, ScheduleConfig};

// Client traits
pub use client::{MailClient, OutgoingMessage, ProductionGmailClient};

// Components
pub use label_manager::LabelManager;
pub use policy::{ErrorPolicy, OnError, PolicyDecision};
pub use responder::{ComposedReply, ReplyDecider, ReplyTemplate};
pub use scanner::{Clock, ScanReport, SearchQuery, SenderFilter, SystemClock, ThreadScanner};
pub use scheduler::{random_interval, RunSummary, Scheduler, StopReason};

// CLI types (for binary usage)
pub use cli::{Cli, Commands};
