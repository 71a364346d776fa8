//! In-memory doubles shared by the use case tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::domain::{EmailSender, FixedClock, LogEntry, LogRepository, LogSeverity, Recipients, SendMailOptions};
use crate::error::{EmailError, ProbeError, RepositoryError};
use crate::monitoring::checker::{Checker, ProbeResponse};

pub fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
}

/// Repository that keeps entries in memory, or fails every write.
pub struct RecordingRepository {
    name: String,
    fail: bool,
    entries: Mutex<Vec<LogEntry>>,
    save_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl RecordingRepository {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail: false,
            entries: Mutex::new(Vec::new()),
            save_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self { fail: true, ..Self::new(name) }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogRepository for RecordingRepository {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save_log(&self, entry: &LogEntry) -> Result<(), RepositoryError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RepositoryError::Pool(format!("{} is unavailable", self.name)));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn get_logs(&self, severity: LogSeverity) -> Result<Vec<LogEntry>, RepositoryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries().into_iter().filter(|e| e.level() == severity).collect())
    }
}

pub struct StubChecker {
    result: Result<ProbeResponse, ProbeError>,
    script: Mutex<VecDeque<u16>>,
}

impl StubChecker {
    pub fn status(status: u16) -> Self {
        Self { result: Ok(ProbeResponse { status, latency_ms: 12 }), script: Mutex::new(VecDeque::new()) }
    }

    pub fn error(error: ProbeError) -> Self {
        Self { result: Err(error), script: Mutex::new(VecDeque::new()) }
    }

    /// Answer with `statuses` in order, then keep repeating `then`
    pub fn sequence(statuses: &[u16], then: u16) -> Self {
        let checker = Self::status(then);
        checker.script.lock().unwrap().extend(statuses.iter().copied());
        checker
    }
}

#[async_trait]
impl Checker for StubChecker {
    async fn check(&self, _target: &str) -> Result<ProbeResponse, ProbeError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(status) => Ok(ProbeResponse { status, latency_ms: 12 }),
            None => self.result.clone(),
        }
    }
}

/// Sender returning a canned result and remembering who it was asked to mail.
pub struct StubEmailSender {
    result: Result<bool, EmailError>,
    recipients: Mutex<Vec<Recipients>>,
}

impl StubEmailSender {
    pub fn returning(result: Result<bool, EmailError>) -> Self {
        Self { result, recipients: Mutex::new(Vec::new()) }
    }

    pub fn recipients(&self) -> Vec<Recipients> {
        self.recipients.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for StubEmailSender {
    async fn send_email(&self, _options: SendMailOptions) -> bool {
        matches!(self.result, Ok(true))
    }

    async fn send_email_with_file_system_logs(
        &self,
        recipients: &Recipients,
    ) -> Result<bool, EmailError> {
        self.recipients.lock().unwrap().push(recipients.clone());
        self.result.clone()
    }
}
