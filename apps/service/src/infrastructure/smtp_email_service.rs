//! SMTP delivery for operator emails.
//!
//! Uses lettre's blocking transport on the blocking thread pool. The transport is a
//! type parameter so tests can substitute `StubTransport`.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, error};

use crate::config::{SmtpSecurity, SmtpSettings};
use crate::domain::{Attachment, EmailSender, Recipients, SendMailOptions};
use crate::error::EmailError;

const LOGS_SUBJECT: &str = "Server logs";
const LOGS_BODY: &str = "<h3>Server logs</h3>\
<p>The current log files of the monitoring service are attached.</p>\
<p>Severity files: <code>logs-all.log</code>, <code>logs-high.log</code>, <code>logs-medium.log</code>.</p>";

pub struct SmtpEmailService<T = SmtpTransport> {
    transport: T,
    from: Mailbox,
    log_files: Vec<PathBuf>,
}

impl SmtpEmailService<SmtpTransport> {
    /// Build an SMTP transport from settings; `log_files` are attached to log reports
    pub fn from_settings(settings: &SmtpSettings, log_files: Vec<PathBuf>) -> Result<Self, EmailError> {
        let builder = match settings.security {
            SmtpSecurity::Tls => SmtpTransport::relay(&settings.host)
                .map_err(|e| EmailError::Transport(format!("SMTP relay configuration error: {e}")))?,
            SmtpSecurity::StartTls => SmtpTransport::starttls_relay(&settings.host)
                .map_err(|e| EmailError::Transport(format!("SMTP relay configuration error: {e}")))?,
            SmtpSecurity::None => SmtpTransport::builder_dangerous(&settings.host),
        };

        let mut builder =
            builder.port(settings.port).timeout(Some(Duration::from_secs(settings.timeout_seconds)));
        if !settings.username.is_empty() {
            builder = builder
                .credentials(Credentials::new(settings.username.clone(), settings.password.clone()));
        }

        Self::new(builder.build(), &settings.from, log_files)
    }
}

impl<T> SmtpEmailService<T>
where
    T: Transport + Clone + Send + Sync + 'static,
    T::Error: Display + Send + 'static,
{
    pub fn new(transport: T, from: &str, log_files: Vec<PathBuf>) -> Result<Self, EmailError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| EmailError::Message(format!("Invalid from address {from}: {e}")))?;

        Ok(Self { transport, from, log_files })
    }

    async fn build_message(&self, options: &SendMailOptions) -> Result<Message, EmailError> {
        let mut builder = Message::builder().from(self.from.clone()).subject(options.subject.as_str());
        for address in options.to.addresses() {
            let mailbox = address
                .parse::<Mailbox>()
                .map_err(|e| EmailError::Message(format!("Invalid email address {address}: {e}")))?;
            builder = builder.to(mailbox);
        }

        let mut multipart = MultiPart::mixed().singlepart(SinglePart::html(options.html_body.clone()));
        for attachment in &options.attachments {
            let body = tokio::fs::read(&attachment.path).await.map_err(|e| {
                EmailError::Message(format!("Failed to read attachment {}: {e}", attachment.path.display()))
            })?;
            multipart = multipart
                .singlepart(MailAttachment::new(attachment.filename.clone()).body(body, ContentType::TEXT_PLAIN));
        }

        builder
            .multipart(multipart)
            .map_err(|e| EmailError::Message(format!("Failed to build email: {e}")))
    }

    async fn deliver(&self, message: Message) -> Result<(), EmailError> {
        let transport = self.transport.clone();
        let result = tokio::task::spawn_blocking(move || {
            transport.send(&message).map(|_| ()).map_err(|e| e.to_string())
        })
        .await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(EmailError::Transport(format!("SMTP delivery failed: {e}"))),
            Err(e) => Err(EmailError::Transport(format!("Task execution failed: {e}"))),
        }
    }

    async fn try_send(&self, options: &SendMailOptions) -> Result<(), EmailError> {
        let message = self.build_message(options).await?;
        self.deliver(message).await?;
        debug!("Email '{}' sent to {}", options.subject, options.to.addresses().join(", "));
        Ok(())
    }

    async fn existing_log_attachments(&self) -> Vec<Attachment> {
        let mut attachments = Vec::with_capacity(self.log_files.len());
        for path in &self.log_files {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                attachments.push(Attachment { filename: file_name(path), path: path.clone() });
            }
        }
        attachments
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_else(|| "logs.log".into())
}

#[async_trait]
impl<T> EmailSender for SmtpEmailService<T>
where
    T: Transport + Clone + Send + Sync + 'static,
    T::Error: Display + Send + 'static,
{
    async fn send_email(&self, options: SendMailOptions) -> bool {
        match self.try_send(&options).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send email '{}': {}", options.subject, e);
                false
            }
        }
    }

    async fn send_email_with_file_system_logs(
        &self,
        recipients: &Recipients,
    ) -> Result<bool, EmailError> {
        if recipients.addresses().is_empty() {
            return Ok(false);
        }

        let options = SendMailOptions {
            to: recipients.clone(),
            subject: LOGS_SUBJECT.to_string(),
            html_body: LOGS_BODY.to_string(),
            attachments: self.existing_log_attachments().await,
        };

        self.try_send(&options).await?;
        Ok(true)
    }
}
