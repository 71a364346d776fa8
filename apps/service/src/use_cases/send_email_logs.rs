use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    Clock, EmailSender, LogEntry, LogEntryOptions, LogRepository, LogSeverity, Recipients, SystemClock,
};
use crate::error::RepositoryError;

const ORIGIN: &str = "send_email_logs";
const FAILED_TO_SEND: &str = "Error: Failed to send email";

/// Mails the stored logs and records delivery failures
pub struct SendEmailLogs {
    sender: Arc<dyn EmailSender>,
    repository: Arc<dyn LogRepository>,
    clock: Arc<dyn Clock>,
}

impl SendEmailLogs {
    pub fn new(sender: Arc<dyn EmailSender>, repository: Arc<dyn LogRepository>) -> Self {
        Self { sender, repository, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns `Ok(false)` when delivery failed; sender errors never escape. Only a
    /// failure to record that failure is an `Err`.
    pub async fn execute(&self, recipients: impl Into<Recipients>) -> Result<bool, RepositoryError> {
        let recipients = recipients.into();

        let message = match self.sender.send_email_with_file_system_logs(&recipients).await {
            Ok(true) => {
                info!("Logs sent to {}", recipients.addresses().join(", "));
                return Ok(true);
            }
            Ok(false) => FAILED_TO_SEND.to_string(),
            Err(error) => error.to_string(),
        };

        warn!("Sending logs failed: {}", message);
        let entry = LogEntry::new(
            LogEntryOptions::new(message, LogSeverity::High, ORIGIN),
            self.clock.as_ref(),
        );
        self.repository.save_log(&entry).await?;

        Ok(false)
    }
}
