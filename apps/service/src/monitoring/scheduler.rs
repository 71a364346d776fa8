use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use crate::domain::Recipients;
use crate::use_cases::{CheckOutcome, CheckServiceMultiple, FanOutReport, SendEmailLogs};

/// Monitor configuration for scheduling
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub target: String,
    pub interval: Duration,
    pub enabled: bool,
}

impl MonitorConfig {
    pub fn new(target: impl Into<String>, interval: Duration) -> Self {
        Self { target: target.into(), interval, enabled: true }
    }
}

/// Mails the logs when a target goes down
pub struct FailureAlert {
    send_logs: Arc<SendEmailLogs>,
    recipients: Vec<String>,
}

impl FailureAlert {
    pub fn new(send_logs: Arc<SendEmailLogs>, recipients: Vec<String>) -> Self {
        Self { send_logs, recipients }
    }

    async fn notify(&self, target: &str) {
        match self.send_logs.execute(Recipients::Many(self.recipients.clone())).await {
            Ok(true) => info!("Failure alert for {} sent", target),
            Ok(false) => warn!("Failure alert for {} could not be delivered", target),
            Err(e) => error!("Failure alert for {} could not be recorded: {}", target, e),
        }
    }
}

/// Monitoring scheduler - runs the fan-out check for each target on its own timer
pub struct MonitoringScheduler {
    check: Arc<CheckServiceMultiple>,
    alert: Option<Arc<FailureAlert>>,
    report_tx: Option<mpsc::Sender<FanOutReport>>,
}

impl MonitoringScheduler {
    pub fn new(check: Arc<CheckServiceMultiple>) -> Self {
        Self { check, alert: None, report_tx: None }
    }

    pub fn with_alert(mut self, alert: FailureAlert) -> Self {
        self.alert = Some(Arc::new(alert));
        self
    }

    /// Forward every report; a task stops once the receiver is dropped
    pub fn with_report_channel(mut self, report_tx: mpsc::Sender<FanOutReport>) -> Self {
        self.report_tx = Some(report_tx);
        self
    }

    /// Schedule a single monitor for periodic checking
    pub fn schedule_monitor(&self, config: MonitorConfig) -> JoinHandle<()> {
        let check = self.check.clone();
        let alert = self.alert.clone();
        let report_tx = self.report_tx.clone();

        tokio::spawn(async move {
            if !config.enabled {
                return;
            }

            let mut timer = interval(config.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Alert on the transition to down, not on every failed tick
            let mut was_up = true;

            loop {
                timer.tick().await;

                let report = check.execute(&config.target).await;
                log_report(&report);

                if let Some(alert) = &alert {
                    if was_up && !report.is_up() {
                        alert.notify(&config.target).await;
                    }
                }
                was_up = report.is_up();

                if let Some(tx) = &report_tx {
                    if let Err(e) = tx.send(report).await {
                        error!("Failed to send check report: {}", e);
                        break;
                    }
                }
            }
        })
    }

    /// Schedule multiple monitors
    pub fn schedule_monitors(&self, configs: Vec<MonitorConfig>) -> Vec<JoinHandle<()>> {
        configs.into_iter().map(|config| self.schedule_monitor(config)).collect()
    }
}

fn log_report(report: &FanOutReport) {
    match &report.outcome {
        CheckOutcome::Up { url, status } => info!("{} is up ({})", url, status),
        CheckOutcome::Down { reason, .. } => warn!("{}", reason),
    }
    for failure in &report.failures {
        error!(
            "Log repository #{} ({}) rejected entry for {}: {}",
            failure.index,
            failure.repository,
            report.outcome.url(),
            failure.error
        );
    }
}
