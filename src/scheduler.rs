//! Polling loop: scan, wait a random interval, scan again
//!
//! The loop ends when the shutdown future resolves during a wait, when the
//! optional scan limit is reached, or when the [`ErrorPolicy`] halts it
//! after a failed scan. Randomness comes from any [`rand::Rng`] so tests can
//! seed it, and waits use `tokio::time` so tests can pause the clock.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::error::{GmailError, Result};
use crate::policy::{ErrorPolicy, PolicyDecision};
use crate::scanner::ScanReport;

/// Uniform random integer in `[min, max]`, both ends included
pub fn random_interval<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> u64 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    rng.gen_range(low..=high)
}

/// Why the loop stopped without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    ScanLimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub scans: u64,
    pub failed_scans: u64,
    pub replies_sent: usize,
    pub stop_reason: StopReason,
}

pub struct Scheduler<R> {
    schedule: ScheduleConfig,
    rng: R,
    policy: ErrorPolicy,
    max_scans: Option<u64>,
}

impl<R: Rng> Scheduler<R> {
    pub fn new(schedule: ScheduleConfig, rng: R, policy: ErrorPolicy) -> Self {
        Self {
            schedule,
            rng,
            policy,
            max_scans: None,
        }
    }

    /// Stop after this many scans instead of running forever
    pub fn with_max_scans(mut self, max_scans: u64) -> Self {
        self.max_scans = Some(max_scans);
        self
    }

    /// Next wait between two scans
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_secs(random_interval(
            &mut self.rng,
            self.schedule.min_interval_secs,
            self.schedule.max_interval_secs,
        ))
    }

    /// Run `scan` now and then after every wait until something stops the loop.
    ///
    /// A scan that fails and is halted by the policy ends the loop with that
    /// error. The shutdown future is only observed between scans; a scan in
    /// progress always runs to completion.
    pub async fn run<F, Fut, S>(&mut self, mut scan: F, shutdown: S) -> Result<RunSummary>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ScanReport>>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut scans = 0u64;
        let mut failed_scans = 0u64;
        let mut replies_sent = 0usize;

        loop {
            scans += 1;
            match scan().await {
                Ok(report) => {
                    replies_sent += report.replies_sent();
                    self.policy.record_success();
                }
                Err(e) => {
                    failed_scans += 1;
                    error!("Scan failed: {}", e);
                    if self.policy.record_failure(&e) == PolicyDecision::Halt {
                        return Err(halted(e, scans));
                    }
                }
            }

            if self.max_scans.is_some_and(|max| scans >= max) {
                info!("Reached scan limit of {}, stopping", scans);
                return Ok(RunSummary {
                    scans,
                    failed_scans,
                    replies_sent,
                    stop_reason: StopReason::ScanLimitReached,
                });
            }

            let delay = self.next_delay();
            info!("Waiting for {} seconds...", delay.as_secs());

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping after {} scans", scans);
                    return Ok(RunSummary {
                        scans,
                        failed_scans,
                        replies_sent,
                        stop_reason: StopReason::Shutdown,
                    });
                }
            }
        }
    }
}

fn halted(error: GmailError, scans: u64) -> GmailError {
    error!("Polling stopped after {} scans", scans);
    error
}
