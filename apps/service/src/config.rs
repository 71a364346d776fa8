use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::monitoring::validation::{validate_check_interval, validate_target_url, validate_timeout};
use crate::use_cases::FanOutPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default tracing level when RUST_LOG is unset
    pub log_level: String,
    pub monitor: MonitorSettings,
    pub storage: StorageSettings,
    pub alerts: AlertSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub targets: Vec<String>,
    pub interval_seconds: u64,
    pub timeout_seconds: u64,
    pub fan_out_policy: FanOutPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub log_directory: path::PathBuf,
    /// SQLite log store; off unless set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<path::PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub recipients: Vec<String>,
    /// Mail the logs to `recipients` whenever a check goes down
    pub notify_on_failure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS (port 465)
    Tls,
    #[default]
    StartTls,
    /// Plain text, local relays only
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub security: SmtpSecurity,
    pub timeout_seconds: u64,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "vigil@localhost".into(),
            security: SmtpSecurity::StartTls,
            timeout_seconds: 30,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            targets: vec!["https://www.google.com".into()],
            interval_seconds: 5,
            timeout_seconds: 10,
            fan_out_policy: FanOutPolicy::ContinueOnError,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { log_directory: "logs".into(), sqlite_path: None }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            monitor: MonitorSettings::default(),
            storage: StorageSettings::default(),
            alerts: AlertSettings::default(),
            smtp: None,
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/vigil/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::var_os("HOME") {
        path::PathBuf::from(home_dir).join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("vigil/config.toml"))
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_1(f, "Log Level", &self.log_level)?;

        write_title_1(f, "Monitor")?;
        write_1(f, "Targets", &self.monitor.targets.join(", "))?;
        write_1(f, "Interval (s)", &self.monitor.interval_seconds)?;
        write_1(f, "Timeout (s)", &self.monitor.timeout_seconds)?;
        write_1(f, "Fan-out Policy", &format!("{:?}", self.monitor.fan_out_policy))?;

        write_title_1(f, "Storage")?;
        write_1(f, "Log Directory", &self.storage.log_directory.display())?;
        match &self.storage.sqlite_path {
            Some(path) => write_1(f, "SQLite Path", &path.display())?,
            None => write_1(f, "SQLite Path", &"disabled")?,
        }

        write_title_1(f, "Alerts")?;
        write_1(f, "Recipients", &self.alerts.recipients.join(", "))?;
        write_1(f, "Notify On Failure", &self.alerts.notify_on_failure)?;

        write_title_1(f, "SMTP")?;
        match &self.smtp {
            Some(smtp) => {
                write_1(f, "Host", &format!("{}:{}", smtp.host, smtp.port))?;
                write_1(f, "Security", &format!("{:?}", smtp.security))?;
                write_1(f, "From", &smtp.from)?;
                write_1(f, "Username", &smtp.username)?;
                write_1(f, "Password", &if smtp.password.is_empty() { "" } else { "********" })?;
            }
            None => write_1(f, "Status", &"not configured")?,
        }

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/vigil/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(ConfigError::ReadFailed)?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
        }

        fs::write(path, config_str).map_err(ConfigError::WriteFailed)
    }

    /// Apply `VIGIL_*` overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply `VIGIL_*` overrides using `lookup` to resolve variables
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let parse_u64 = |key: &str, value: String| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid(format!("{key} must be a number, got {value:?}")))
        };

        if let Some(value) = lookup("VIGIL_LOG_LEVEL") {
            self.log_level = value;
        }
        if let Some(value) = lookup("VIGIL_TARGETS") {
            self.monitor.targets = split_list(&value);
        }
        if let Some(value) = lookup("VIGIL_CHECK_INTERVAL") {
            self.monitor.interval_seconds = parse_u64("VIGIL_CHECK_INTERVAL", value)?;
        }
        if let Some(value) = lookup("VIGIL_LOG_DIR") {
            self.storage.log_directory = value.into();
        }
        if let Some(value) = lookup("VIGIL_SQLITE_PATH") {
            self.storage.sqlite_path = Some(value).filter(|v| !v.trim().is_empty()).map(Into::into);
        }
        if let Some(value) = lookup("VIGIL_ALERT_RECIPIENTS") {
            self.alerts.recipients = split_list(&value);
        }

        let smtp_keys = [
            "VIGIL_SMTP_HOST",
            "VIGIL_SMTP_PORT",
            "VIGIL_SMTP_USERNAME",
            "VIGIL_SMTP_PASSWORD",
            "VIGIL_SMTP_FROM",
        ];
        if self.smtp.is_some() || smtp_keys.iter().any(|key| lookup(key).is_some()) {
            let mut smtp = self.smtp.take().unwrap_or_default();
            if let Some(value) = lookup("VIGIL_SMTP_HOST") {
                smtp.host = value;
            }
            if let Some(value) = lookup("VIGIL_SMTP_PORT") {
                smtp.port = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid(format!("VIGIL_SMTP_PORT must be a port, got {value:?}")))?;
            }
            if let Some(value) = lookup("VIGIL_SMTP_USERNAME") {
                smtp.username = value;
            }
            if let Some(value) = lookup("VIGIL_SMTP_PASSWORD") {
                smtp.password = value;
            }
            if let Some(value) = lookup("VIGIL_SMTP_FROM") {
                smtp.from = value;
            }
            self.smtp = Some(smtp);
        }

        Ok(self)
    }

    /// Check targets and timings before anything is scheduled
    pub fn validate(&self) -> Result<(), ConfigError> {
        for target in &self.monitor.targets {
            validate_target_url(target)?;
        }
        validate_check_interval(self.monitor.interval_seconds)?;
        validate_timeout(self.monitor.timeout_seconds)?;

        if let Some(smtp) = &self.smtp {
            if smtp.host.trim().is_empty() {
                return Err(ConfigError::Invalid("smtp.host must not be empty".into()));
            }
            if smtp.from.trim().is_empty() {
                return Err(ConfigError::Invalid("smtp.from must not be empty".into()));
            }
        }

        if self.alerts.notify_on_failure && self.alerts.recipients.is_empty() {
            return Err(ConfigError::Invalid(
                "alerts.notify_on_failure requires at least one recipient".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_sqlite_store_is_opt_in() {
        assert_eq!(Config::default().storage.sqlite_path, None);

        let enabled = Config::default()
            .with_overrides(lookup(&[("VIGIL_SQLITE_PATH", "/var/lib/vigil/logs.db")]))
            .unwrap();
        assert_eq!(enabled.storage.sqlite_path, Some("/var/lib/vigil/logs.db".into()));

        let disabled = enabled.with_overrides(lookup(&[("VIGIL_SQLITE_PATH", "")])).unwrap();
        assert_eq!(disabled.storage.sqlite_path, None);
    }

    #[test]
    fn test_from_config_writes_default_and_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config");

        let created = Config::from_config(Some(&path)).unwrap();
        assert_eq!(created, Config::default());
        assert!(dir.path().join("nested/config.toml").exists());

        let reread = Config::from_config(Some(&path)).unwrap();
        assert_eq!(reread, created);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[monitor]
targets = ["https://a.example", "https://b.example"]
fan_out_policy = "stop_on_first_error"

[smtp]
host = "smtp.example.com"
security = "tls"
"#,
        )
        .unwrap();

        let config = Config::from_config(Some(&path)).unwrap();
        assert_eq!(config.monitor.targets.len(), 2);
        assert_eq!(config.monitor.interval_seconds, 5);
        assert_eq!(config.monitor.fan_out_policy, FanOutPolicy::StopOnFirstError);
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.security, SmtpSecurity::Tls);
        assert_eq!(smtp.port, 587);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "monitor = 12").unwrap();

        assert!(matches!(Config::from_config(Some(&path)), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides(lookup(&[
                ("VIGIL_TARGETS", "https://a.example, https://b.example,"),
                ("VIGIL_CHECK_INTERVAL", "30"),
                ("VIGIL_SMTP_HOST", "mail.example.com"),
                ("VIGIL_SMTP_PASSWORD", "secret"),
                ("VIGIL_ALERT_RECIPIENTS", "ops@example.com"),
            ]))
            .unwrap();

        assert_eq!(config.monitor.targets, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.monitor.interval_seconds, 30);
        assert_eq!(config.alerts.recipients, vec!["ops@example.com"]);
        let smtp = config.smtp.clone().unwrap();
        assert_eq!(smtp.host, "mail.example.com");
        assert_eq!(smtp.password, "secret");

        let printed = config.to_string();
        assert!(printed.contains("********"));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let result = Config::default().with_overrides(lookup(&[("VIGIL_CHECK_INTERVAL", "soon")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.monitor.targets.push("ftp://files.example".into());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.monitor.interval_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.alerts.notify_on_failure = true;
        assert!(config.validate().is_err());
    }
}
