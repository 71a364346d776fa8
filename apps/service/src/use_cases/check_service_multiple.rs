use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::check_service::{CheckOutcome, probe};
use crate::domain::{Clock, LogRepository, SystemClock};
use crate::error::RepositoryError;
use crate::monitoring::checker::Checker;

const ORIGIN: &str = "check_service_multiple";

/// How the fan-out reacts when a repository rejects the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOutPolicy {
    /// Try every repository and report each failure
    #[default]
    ContinueOnError,
    /// Stop at the first failing repository; later ones are not called
    StopOnFirstError,
}

/// A repository that could not store the entry
#[derive(Debug)]
pub struct RepositoryFailure {
    /// Position in the repository list
    pub index: usize,
    pub repository: String,
    pub error: RepositoryError,
}

#[derive(Debug)]
pub struct FanOutReport {
    pub outcome: CheckOutcome,
    pub failures: Vec<RepositoryFailure>,
}

impl FanOutReport {
    pub fn is_up(&self) -> bool {
        self.outcome.is_up()
    }

    pub fn is_fully_persisted(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Checks one URL and records the outcome in every configured repository
pub struct CheckServiceMultiple {
    repositories: Vec<Arc<dyn LogRepository>>,
    checker: Arc<dyn Checker>,
    clock: Arc<dyn Clock>,
    policy: FanOutPolicy,
}

impl CheckServiceMultiple {
    pub fn new(repositories: Vec<Arc<dyn LogRepository>>, checker: Arc<dyn Checker>) -> Self {
        Self { repositories, checker, clock: Arc::new(SystemClock), policy: FanOutPolicy::default() }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: FanOutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn execute(&self, url: &str) -> FanOutReport {
        let outcome = probe(self.checker.as_ref(), url).await;
        let entry = outcome.log_entry(ORIGIN, self.clock.as_ref());

        let mut failures = Vec::new();
        for (index, repository) in self.repositories.iter().enumerate() {
            if let Err(error) = repository.save_log(&entry).await {
                warn!("Failed to save log for {} in {}: {}", url, repository.name(), error);
                failures.push(RepositoryFailure {
                    index,
                    repository: repository.name().to_string(),
                    error,
                });

                if self.policy == FanOutPolicy::StopOnFirstError {
                    break;
                }
            }
        }

        debug!(
            url,
            up = outcome.is_up(),
            repositories = self.repositories.len(),
            failed = failures.len(),
            "check fanned out"
        );

        FanOutReport { outcome, failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogSeverity;
    use crate::error::ProbeError;
    use crate::use_cases::test_support::{RecordingRepository, StubChecker, fixed_clock};

    fn service(repositories: &[Arc<RecordingRepository>], checker: StubChecker) -> CheckServiceMultiple {
        let repositories = repositories
            .iter()
            .map(|r| r.clone() as Arc<dyn LogRepository>)
            .collect();
        CheckServiceMultiple::new(repositories, Arc::new(checker)).with_clock(Arc::new(fixed_clock()))
    }

    #[tokio::test]
    async fn test_success_writes_same_entry_to_every_repository() {
        let repositories: Vec<_> =
            ["fs", "sqlite", "memory"].iter().map(|n| Arc::new(RecordingRepository::new(n))).collect();

        let report = service(&repositories, StubChecker::status(200)).execute("https://good.example").await;

        assert!(report.is_up());
        assert!(report.is_fully_persisted());

        let first = repositories[0].entries();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].level(), LogSeverity::Low);
        assert_eq!(first[0].message(), "Service https://good.example working");
        assert_eq!(first[0].origin(), ORIGIN);
        for repository in &repositories {
            assert_eq!(repository.entries(), first);
        }
    }

    #[tokio::test]
    async fn test_failure_writes_high_entry_everywhere() {
        let repositories: Vec<_> =
            ["a", "b"].iter().map(|n| Arc::new(RecordingRepository::new(n))).collect();
        let checker = StubChecker::error(ProbeError::Request("dns error".into()));

        let report = service(&repositories, checker).execute("https://bad.example").await;

        match &report.outcome {
            CheckOutcome::Down { reason, .. } => {
                assert!(reason.contains("https://bad.example"));
                assert!(reason.contains("dns error"));
            }
            other => panic!("expected Down, got {other:?}"),
        }
        for repository in &repositories {
            let entries = repository.entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].level(), LogSeverity::High);
            assert!(entries[0].message().contains("https://bad.example"));
        }
    }

    #[tokio::test]
    async fn test_no_repositories_keeps_outcome() {
        let up = service(&[], StubChecker::status(200)).execute("https://good.example").await;
        assert!(up.is_up());
        assert!(up.is_fully_persisted());

        let down = service(&[], StubChecker::status(503)).execute("https://bad.example").await;
        assert!(!down.is_up());
        assert_eq!(down.outcome.url(), "https://bad.example");
    }

    #[tokio::test]
    async fn test_continue_on_error_attempts_all_repositories() {
        let first = Arc::new(RecordingRepository::new("first"));
        let broken = Arc::new(RecordingRepository::failing("broken"));
        let last = Arc::new(RecordingRepository::new("last"));

        let report = service(&[first.clone(), broken.clone(), last.clone()], StubChecker::status(200))
            .execute("https://good.example")
            .await;

        assert!(report.is_up());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].repository, "broken");
        assert_eq!(first.entries().len(), 1);
        assert_eq!(broken.save_calls(), 1);
        assert_eq!(last.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_on_first_error_skips_remaining_repositories() {
        let first = Arc::new(RecordingRepository::new("first"));
        let broken = Arc::new(RecordingRepository::failing("broken"));
        let last = Arc::new(RecordingRepository::new("last"));

        let report = service(&[first.clone(), broken.clone(), last.clone()], StubChecker::status(200))
            .with_policy(FanOutPolicy::StopOnFirstError)
            .execute("https://good.example")
            .await;

        assert!(report.is_up());
        assert!(!report.is_fully_persisted());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(first.save_calls(), 1);
        assert_eq!(last.save_calls(), 0);
    }
}
