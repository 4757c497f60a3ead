//! What to do when a scan fails
//!
//! The scan loop itself never decides whether to keep polling after an
//! error. It reports every scan result to an [`ErrorPolicy`], which counts
//! consecutive failures and answers with a [`PolicyDecision`].
//!
//! - **Halt** (default): the first failed scan stops polling.
//! - **ContinueOnTransient**: rate limits, 5xx and network errors let the
//!   loop carry on at its normal pace until `max_consecutive_failures`
//!   scans in a row have failed; permanent errors still halt.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PolicyConfig;
use crate::error::GmailError;

/// Configured reaction to a failed scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    #[default]
    Halt,
    ContinueOnTransient,
}

/// Outcome of reporting a failure to the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Wait the usual interval and scan again
    Continue,
    /// Stop polling
    Halt,
}

#[derive(Debug, Clone)]
pub struct ErrorPolicy {
    on_error: OnError,
    max_consecutive_failures: u32,
    consecutive_failures: u32,
}

impl ErrorPolicy {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            on_error: config.on_error,
            max_consecutive_failures: config.max_consecutive_failures.max(1),
            consecutive_failures: 0,
        }
    }

    /// Policy that stops on the first failure
    pub fn halt() -> Self {
        Self::new(&PolicyConfig::default())
    }

    pub fn record_success(&mut self) {
        if self.consecutive_failures > 0 {
            debug!(
                "Scan succeeded after {} failed scans, resetting failure count",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self, error: &GmailError) -> PolicyDecision {
        self.consecutive_failures += 1;

        match self.on_error {
            OnError::Halt => PolicyDecision::Halt,
            OnError::ContinueOnTransient => {
                if error.is_permanent() {
                    return PolicyDecision::Halt;
                }
                if self.consecutive_failures >= self.max_consecutive_failures {
                    warn!(
                        "{} consecutive scans failed, giving up",
                        self.consecutive_failures
                    );
                    return PolicyDecision::Halt;
                }
                warn!(
                    "Transient failure {}/{}, will scan again",
                    self.consecutive_failures, self.max_consecutive_failures
                );
                PolicyDecision::Continue
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
