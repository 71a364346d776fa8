/// Domain layer - log entries and the collaborator traits the use cases depend on

pub mod clock;
pub mod email;
pub mod log_entry;
pub mod repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use email::{Attachment, EmailSender, Recipients, SendMailOptions};
pub use log_entry::{LogEntry, LogEntryOptions, LogSeverity};
pub use repository::LogRepository;
