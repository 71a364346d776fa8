//! Validation of configured monitor targets and timing settings.

use url::Url;

use crate::error::ConfigError;

const MIN_INTERVAL: u64 = 1;
const MAX_INTERVAL: u64 = 86400; // 24 hours
const MIN_TIMEOUT: u64 = 1;
const MAX_TIMEOUT: u64 = 300; // 5 minutes

/// Validate an HTTP/HTTPS target URL
pub fn validate_target_url(target: &str) -> Result<(), ConfigError> {
    let url = Url::parse(target)
        .map_err(|e| ConfigError::Invalid(format!("Invalid URL {target}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::Invalid(format!(
                "Invalid scheme for HTTP monitor {target}: {other}"
            )));
        }
    }

    if url.host_str().is_none() {
        return Err(ConfigError::Invalid(format!("Missing host in {target}")));
    }

    if url.port() == Some(0) {
        return Err(ConfigError::Invalid(format!("Port 0 is not valid in {target}")));
    }

    Ok(())
}

/// Validate check interval bounds
pub fn validate_check_interval(interval_seconds: u64) -> Result<(), ConfigError> {
    if !(MIN_INTERVAL..=MAX_INTERVAL).contains(&interval_seconds) {
        return Err(ConfigError::Invalid(format!(
            "Check interval out of range: {interval_seconds} seconds (allowed: {MIN_INTERVAL}..={MAX_INTERVAL})"
        )));
    }
    Ok(())
}

/// Validate request timeout bounds
pub fn validate_timeout(timeout_seconds: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT..=MAX_TIMEOUT).contains(&timeout_seconds) {
        return Err(ConfigError::Invalid(format!(
            "Timeout out of range: {timeout_seconds} seconds (allowed: {MIN_TIMEOUT}..={MAX_TIMEOUT})"
        )));
    }
    Ok(())
}
