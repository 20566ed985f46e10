//! Outbound channels for notifications
//!
//! - [`SmtpMailer`]: STARTTLS relay with credentials from the environment.
//!   One pooled session is reused for every send and released when the
//!   mailer is dropped.
//! - [`OutboxMailer`]: writes one file per recipient into a directory, for
//!   dry runs and for delivering by other means.

use anyhow::{bail, Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::{Category, Code, Detail, Severity};
use lettre::{Message, SmtpTransport, Transport};
use secret_santa_core::{DeliveryError, Mailer, Notification};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the SMTP password
pub const PASSWORD_ENV: &str = "SANTA_SMTP_PASSWORD";

/// SMTP reply 535: authentication credentials invalid
const AUTH_FAILED: Code = Code {
    severity: Severity::PermanentNegativeCompletion,
    category: Category::Unspecified3,
    detail: Detail::Five,
};

/// Connection settings for the SMTP relay
///
/// The password is deliberately not part of this struct; it is read from
/// [`PASSWORD_ENV`] when the mailer is built and never stored elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub from: Option<String>,
    pub send_timeout_secs: u64,
}

impl SmtpConfig {
    /// Sender address: `from` if set, otherwise the login user
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.user.as_deref())
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("SMTP host must not be empty");
        }
        if self.send_timeout_secs == 0 {
            bail!("send timeout must be > 0 seconds");
        }
        if self.sender().is_none() {
            bail!("no sender address: pass --from or --smtp-user");
        }
        Ok(())
    }
}

// ============================================================================
// SMTP
// ============================================================================

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the relay client
    ///
    /// No connection is opened here; the first send connects and
    /// authenticates, so credential problems surface per recipient.
    pub fn new(config: &SmtpConfig, password: Option<String>) -> Result<Self> {
        config.validate()?;

        let sender = config.sender().unwrap_or_default();
        let from: Mailbox = sender
            .parse()
            .with_context(|| format!("invalid sender address {:?}", sender))?;

        let mut builder = SmtpTransport::starttls_relay(&config.host)
            .with_context(|| format!("invalid SMTP relay {:?}", config.host))?
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.send_timeout_secs)));

        if let Some(user) = &config.user {
            let password = password
                .with_context(|| format!("{} is not set for SMTP user {:?}", PASSWORD_ENV, user))?;
            builder = builder.credentials(Credentials::new(user.clone(), password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&mut self, notification: &Notification) -> Result<(), DeliveryError> {
        let to: Mailbox =
            notification
                .to
                .parse()
                .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
                    address: notification.to.clone(),
                    reason: e.to_string(),
                })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        self.transport
            .send(&message)
            .map(|_| ())
            .map_err(classify_smtp_error)
    }
}

fn classify_smtp_error(error: lettre::transport::smtp::Error) -> DeliveryError {
    classify_reply(error.status(), error.to_string())
}

/// Only the server's reply code decides; message text is not inspected
fn classify_reply(status: Option<Code>, message: String) -> DeliveryError {
    if status == Some(AUTH_FAILED) {
        DeliveryError::Authentication(message)
    } else {
        DeliveryError::Transport(message)
    }
}

// ============================================================================
// Outbox
// ============================================================================

/// Writes each notification to `<dir>/<NNN>-<santa>.txt`
///
/// The directory must be new or empty so files from an earlier run are never
/// mixed into this one.
#[derive(Debug)]
pub struct OutboxMailer {
    dir: PathBuf,
    written: usize,
}

impl OutboxMailer {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create outbox {}", dir.display()))?;
        let mut entries = fs::read_dir(dir)
            .with_context(|| format!("failed to read outbox {}", dir.display()))?;
        if entries.next().is_some() {
            bail!("outbox {} is not empty", dir.display());
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    fn file_name(&self, santa: &str) -> String {
        let safe: String = santa
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{:03}-{}.txt", self.written + 1, safe)
    }
}

impl Mailer for OutboxMailer {
    fn send(&mut self, notification: &Notification) -> Result<(), DeliveryError> {
        let path = self.dir.join(self.file_name(&notification.santa));
        // numbers are never reused, even after a failed write
        self.written += 1;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| DeliveryError::Io(format!("{}: {}", path.display(), e)))?;

        write!(
            file,
            "To: {}\nSubject: {}\n\n{}",
            notification.to, notification.subject, notification.body
        )
        .map_err(|e| DeliveryError::Io(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }
}
