//! Thread scanning: today's query, lookup of matching threads, per-thread replies

use chrono::{DateTime, Local, NaiveTime, Offset, TimeZone};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::MailClient;
use crate::config::ANYONE;
use crate::error::{GmailError, Result};
use crate::label_manager::LabelManager;
use crate::models::{HandledThread, ReplyOutcome};
use crate::responder::ReplyDecider;

/// Which senders a scan looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderFilter {
    Anyone,
    Address(String),
}

impl FromStr for SenderFilter {
    type Err = GmailError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GmailError::ConfigError(
                "sender filter cannot be empty".to_string(),
            ));
        }
        if trimmed.eq_ignore_ascii_case(ANYONE) {
            Ok(SenderFilter::Anyone)
        } else {
            Ok(SenderFilter::Address(trimmed.to_string()))
        }
    }
}

impl fmt::Display for SenderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderFilter::Anyone => f.write_str("incoming emails"),
            SenderFilter::Address(address) => f.write_str(address),
        }
    }
}

/// Source of "now", swappable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Longest DST gap searched for the first local minute of a day
const MAX_DST_GAP_MINUTES: i64 = 180;

/// Unix timestamp of the first instant of `now`'s local day
///
/// Normally 00:00:00. When a DST jump skips midnight the day starts at the
/// first local minute that exists, e.g. 01:00.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);

    (0..=MAX_DST_GAP_MINUTES)
        .map(|minutes| midnight + chrono::Duration::minutes(minutes))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| {
            midnight.and_utc().timestamp() - i64::from(now.offset().fix().local_minus_utc())
        })
}

/// The Gmail search for one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub sender: SenderFilter,
    pub after: i64,
}

impl SearchQuery {
    pub fn new(sender: SenderFilter, after: i64) -> Self {
        Self { sender, after }
    }

    /// Everything from `sender` received since local midnight today
    pub fn for_today<Tz: TimeZone>(sender: SenderFilter, now: &DateTime<Tz>) -> Self {
        Self::new(sender, start_of_day(now))
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sender {
            SenderFilter::Anyone => write!(f, "after:{}", self.after),
            SenderFilter::Address(address) => write!(f, "from:{} after:{}", address, self.after),
        }
    }
}

/// What one scan did
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub query: String,
    pub threads_found: usize,
    pub outcomes: Vec<ReplyOutcome>,
    /// Threads left alone because their data was malformed: (thread id, reason)
    pub skipped: Vec<(String, String)>,
}

impl ScanReport {
    fn new(scan_id: Uuid, query: String) -> Self {
        Self {
            scan_id,
            query,
            threads_found: 0,
            outcomes: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn replies_sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.sent_reply()).count()
    }

    pub fn handled(&self) -> impl Iterator<Item = &HandledThread> {
        self.outcomes.iter().filter_map(ReplyOutcome::handled)
    }
}

/// Runs scans: query, marker label, then each thread in listing order
pub struct ThreadScanner {
    client: Arc<dyn MailClient>,
    labels: LabelManager,
    decider: ReplyDecider,
    clock: Arc<dyn Clock>,
}

impl ThreadScanner {
    pub fn new(
        client: Arc<dyn MailClient>,
        labels: LabelManager,
        decider: ReplyDecider,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            labels,
            decider,
            clock,
        }
    }

    pub async fn scan(&self, sender: &SenderFilter) -> Result<ScanReport> {
        let scan_id = Uuid::new_v4();
        let span = info_span!("scan", %scan_id);
        self.scan_inner(scan_id, sender).instrument(span).await
    }

    async fn scan_inner(&self, scan_id: Uuid, sender: &SenderFilter) -> Result<ScanReport> {
        info!("Checking for {}", sender);

        let query = SearchQuery::for_today(sender.clone(), &self.clock.now()).to_string();
        let mut report = ScanReport::new(scan_id, query);

        let thread_ids = self.client.list_threads(&report.query).await?;
        report.threads_found = thread_ids.len();

        if thread_ids.is_empty() {
            info!("No threads found.");
            return Ok(report);
        }

        let label = self.labels.ensure_label().await?;

        for thread_id in &thread_ids {
            match self.decider.process_thread(thread_id, &label).await {
                Ok(outcome) => {
                    if let Some(handled) = outcome.handled() {
                        info!(
                            "{} - {} - {} auto replied",
                            handled.thread_id,
                            handled.sender_email,
                            handled.received_display()
                        );
                    }
                    report.outcomes.push(outcome);
                }
                Err(e) if e.is_data_shape() => {
                    warn!("Skipping thread {}: {}", thread_id, e);
                    report.skipped.push((thread_id.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Scan finished: {} threads, {} replies sent, {} skipped",
            report.threads_found,
            report.replies_sent(),
            report.skipped.len()
        );
        Ok(report)
    }
}
