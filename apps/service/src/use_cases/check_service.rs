use std::sync::Arc;

use tracing::debug;

use crate::domain::{Clock, LogEntry, LogEntryOptions, LogRepository, LogSeverity, SystemClock};
use crate::error::RepositoryError;
use crate::monitoring::checker::Checker;

const ORIGIN: &str = "check_service";

/// Result of probing one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Up { url: String, status: u16 },
    /// `reason` always names the url
    Down { url: String, reason: String },
}

impl CheckOutcome {
    pub fn is_up(&self) -> bool {
        matches!(self, CheckOutcome::Up { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            CheckOutcome::Up { url, .. } | CheckOutcome::Down { url, .. } => url,
        }
    }

    /// The entry recorded for this outcome
    pub fn log_entry(&self, origin: &str, clock: &dyn Clock) -> LogEntry {
        let options = match self {
            CheckOutcome::Up { url, .. } => {
                LogEntryOptions::new(format!("Service {url} working"), LogSeverity::Low, origin)
            }
            CheckOutcome::Down { reason, .. } => {
                LogEntryOptions::new(reason.clone(), LogSeverity::High, origin)
            }
        };
        LogEntry::new(options, clock)
    }
}

/// Probe `url` once and classify the result
pub(crate) async fn probe(checker: &dyn Checker, url: &str) -> CheckOutcome {
    match checker.check(url).await {
        Ok(response) if response.is_ok() => {
            CheckOutcome::Up { url: url.to_string(), status: response.status }
        }
        Ok(response) => CheckOutcome::Down {
            url: url.to_string(),
            reason: format!("{url} is not ok. Error on check service: status {}", response.status),
        },
        Err(e) => CheckOutcome::Down { url: url.to_string(), reason: format!("{url} is not ok. {e}") },
    }
}

/// Checks one URL and records the outcome in a single repository
pub struct CheckService {
    repository: Arc<dyn LogRepository>,
    checker: Arc<dyn Checker>,
    clock: Arc<dyn Clock>,
}

impl CheckService {
    pub fn new(repository: Arc<dyn LogRepository>, checker: Arc<dyn Checker>) -> Self {
        Self { repository, checker, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Probe `url` and save exactly one entry.
    ///
    /// Repository failures are returned as `Err` and nothing else happens for that call.
    pub async fn execute(&self, url: &str) -> Result<CheckOutcome, RepositoryError> {
        let outcome = probe(self.checker.as_ref(), url).await;
        let entry = outcome.log_entry(ORIGIN, self.clock.as_ref());

        self.repository.save_log(&entry).await?;
        debug!(url, up = outcome.is_up(), "check recorded in {}", self.repository.name());

        Ok(outcome)
    }
}
