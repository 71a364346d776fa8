use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use vigil::Config;
use vigil::domain::{EmailSender, LogRepository, LogSeverity};
use vigil::infrastructure::{FileSystemLogRepository, SmtpEmailService, SqliteLogRepository};
use vigil::monitoring::{FailureAlert, HttpChecker, MonitorConfig, MonitoringScheduler};
use vigil::pool::open_local_pool;
use vigil::use_cases::{CheckOutcome, CheckServiceMultiple, SendEmailLogs};

#[derive(Debug, Parser)]
#[command(name = "vigil", version, about = "Periodic endpoint checks with structured logs")]
struct Cli {
    /// Path to the config file (defaults to $XDG_CONFIG_HOME/vigil/config.toml)
    #[arg(long, short, global = true, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check every configured target on its interval until interrupted
    Run,
    /// Check a single URL once and record the outcome
    Check { url: String },
    /// Email the log files (to the configured alert recipients by default)
    SendLogs { recipients: Vec<String> },
    /// Print stored log entries
    Logs {
        #[arg(long, short, default_value = "low")]
        severity: LogSeverity,
    },
    /// Print the effective configuration
    Config,
}

/// Everything the commands need, built once from the config
struct Services {
    config: Config,
    file_repository: Arc<FileSystemLogRepository>,
    repositories: Vec<Arc<dyn LogRepository>>,
    email: Option<Arc<dyn EmailSender>>,
}

impl Services {
    async fn build(config: Config) -> Result<Self> {
        let file_repository = Arc::new(
            FileSystemLogRepository::open(&config.storage.log_directory)
                .await
                .with_context(|| format!("opening log directory {}", config.storage.log_directory.display()))?,
        );

        let mut repositories: Vec<Arc<dyn LogRepository>> = vec![file_repository.clone()];
        if let Some(path) = &config.storage.sqlite_path {
            let pool = open_local_pool(path, 4).await?;
            repositories.push(Arc::new(SqliteLogRepository::open(pool).await?));
        }

        let email: Option<Arc<dyn EmailSender>> = match &config.smtp {
            Some(smtp) => Some(Arc::new(SmtpEmailService::from_settings(smtp, file_repository.log_files())?)),
            None => None,
        };

        Ok(Self { config, file_repository, repositories, email })
    }

    fn check_service(&self) -> Result<CheckServiceMultiple> {
        let checker = Arc::new(HttpChecker::new(self.config.monitor.timeout_seconds)?);
        Ok(CheckServiceMultiple::new(self.repositories.clone(), checker)
            .with_policy(self.config.monitor.fan_out_policy))
    }

    fn send_email_logs(&self) -> Option<SendEmailLogs> {
        self.email
            .clone()
            .map(|sender| SendEmailLogs::new(sender, self.file_repository.clone()))
    }
}

async fn run(services: Services) -> Result<ExitCode> {
    let config = &services.config;
    if config.monitor.targets.is_empty() {
        bail!("no targets configured (monitor.targets or VIGIL_TARGETS)");
    }

    let mut scheduler = MonitoringScheduler::new(Arc::new(services.check_service()?));
    if config.alerts.notify_on_failure {
        match services.send_email_logs() {
            Some(send_logs) => {
                scheduler = scheduler
                    .with_alert(FailureAlert::new(Arc::new(send_logs), config.alerts.recipients.clone()));
            }
            None => warn!("alerts.notify_on_failure is set but SMTP is not configured"),
        }
    }

    let interval = Duration::from_secs(config.monitor.interval_seconds);
    let handles = scheduler.schedule_monitors(
        config.monitor.targets.iter().map(|target| MonitorConfig::new(target.clone(), interval)).collect(),
    );
    info!("Monitoring {} target(s) every {}s", handles.len(), config.monitor.interval_seconds);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    for handle in handles {
        handle.abort();
    }
    Ok(ExitCode::SUCCESS)
}

async fn check(services: Services, url: &str) -> Result<ExitCode> {
    vigil::monitoring::validation::validate_target_url(url)?;
    let report = services.check_service()?.execute(url).await;

    match &report.outcome {
        CheckOutcome::Up { url, status } => println!("UP   {url} ({status})"),
        CheckOutcome::Down { reason, .. } => println!("DOWN {reason}"),
    }
    for failure in &report.failures {
        eprintln!("failed to record in {}: {}", failure.repository, failure.error);
    }

    Ok(if report.is_up() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn send_logs(services: Services, recipients: Vec<String>) -> Result<ExitCode> {
    let recipients = if recipients.is_empty() { services.config.alerts.recipients.clone() } else { recipients };
    if recipients.is_empty() {
        bail!("no recipients given and alerts.recipients is empty");
    }

    let send_logs = services.send_email_logs().context("SMTP is not configured ([smtp] or VIGIL_SMTP_*)")?;
    if send_logs.execute(recipients).await? {
        println!("Logs sent");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Sending logs failed; see logs-high.log");
        Ok(ExitCode::FAILURE)
    }
}

async fn print_logs(services: Services, severity: LogSeverity) -> Result<ExitCode> {
    for entry in services.file_repository.get_logs(severity).await? {
        println!("{entry}");
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_config(cli.config.as_ref())?.with_env_overrides()?;
    if let Err(e) = logger::init_tracing(&config.log_level) {
        eprintln!("tracing already initialized: {e}");
    }
    config.validate()?;

    if let Command::Config = cli.command {
        print!("{config}");
        return Ok(ExitCode::SUCCESS);
    }

    let services = Services::build(config).await?;
    match cli.command {
        Command::Run => run(services).await,
        Command::Check { url } => check(services, &url).await,
        Command::SendLogs { recipients } => send_logs(services, recipients).await,
        Command::Logs { severity } => print_logs(services, severity).await,
        Command::Config => Ok(ExitCode::SUCCESS),
    }
}
