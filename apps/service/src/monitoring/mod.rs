pub mod checker;
/// Monitoring engine module - probes targets on a schedule
///
/// This module is responsible for:
/// - Executing HTTP/HTTPS checks
/// - Scheduling monitoring tasks
/// - Validating configured targets
pub mod scheduler;
pub mod validation;

pub use checker::{Checker, HttpChecker, ProbeResponse};
pub use scheduler::{FailureAlert, MonitorConfig, MonitoringScheduler};
