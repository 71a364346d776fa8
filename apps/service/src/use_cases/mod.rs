/// Use cases - checking endpoints and mailing logs
///
/// Each use case receives its collaborators as trait objects and returns an explicit
/// result; none of them keeps mutable state between calls.
pub mod check_service;
pub mod check_service_multiple;
pub mod send_email_logs;

#[cfg(test)]
pub(crate) mod test_support;

pub use check_service::{CheckOutcome, CheckService};
pub use check_service_multiple::{CheckServiceMultiple, FanOutPolicy, FanOutReport, RepositoryFailure};
pub use send_email_logs::SendEmailLogs;
