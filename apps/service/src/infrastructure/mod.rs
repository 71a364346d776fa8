/// Adapters for the domain traits: log storage and email delivery

pub mod file_system_log_repository;
pub mod smtp_email_service;
pub mod sqlite_log_repository;

pub use file_system_log_repository::FileSystemLogRepository;
pub use smtp_email_service::SmtpEmailService;
pub use sqlite_log_repository::SqliteLogRepository;
