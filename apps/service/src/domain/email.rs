use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::EmailError;

/// One or many recipient addresses. Validation is left to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    pub fn addresses(&self) -> Vec<&str> {
        match self {
            Recipients::One(address) => vec![address.as_str()],
            Recipients::Many(addresses) => addresses.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Recipients::One(address.to_string())
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Recipients::One(address)
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Recipients::Many(addresses)
    }
}

impl From<&[&str]> for Recipients {
    fn from(addresses: &[&str]) -> Self {
        Recipients::Many(addresses.iter().map(|a| a.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(addresses: [&str; N]) -> Self {
        Recipients::from(&addresses[..])
    }
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SendMailOptions {
    pub to: Recipients,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

/// Outbound email delivery.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send a plain HTML email. Errors are logged and reported as `false`.
    async fn send_email(&self, options: SendMailOptions) -> bool;

    /// Send the file-system logs as attachments
    async fn send_email_with_file_system_logs(
        &self,
        recipients: &Recipients,
    ) -> Result<bool, EmailError>;
}
