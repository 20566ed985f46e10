//! Notification Dispatcher
//!
//! Sends each santa one message naming their santee. Sends happen in santa
//! order, one at a time, through a single [`Mailer`].
//!
//! # Critical Invariants
//!
//! 1. **Need to know**: a santee's identity only ever appears in the body of
//!    the message addressed to their santa. It is never logged.
//! 2. **Isolation**: a failed send is recorded and skipped; later recipients
//!    are still attempted.
//! 3. **No rollback**: failures never touch the secret log or messages that
//!    were already sent.

pub mod template;

pub use template::{Template, TemplateError};

use crate::models::{Assignment, Registry};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Subject line used when none is configured
pub const DEFAULT_SUBJECT: &str = "Your mission, should you choose to accept it...";

/// Errors that can occur while delivering one notification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("authentication with the outbound channel failed: {0}")]
    Authentication(String),

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("I/O failure: {0}")]
    Io(String),

    #[error("santa {santa:?} is not in the registry")]
    UnknownRecipient { santa: String },
}

/// One outbound message
///
/// The `Debug` output redacts the body, which holds the santee's identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Notification {
    /// Identity of the recipient
    pub santa: String,

    /// Recipient's contact address
    pub to: String,

    pub subject: String,

    pub body: String,
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("santa", &self.santa)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("body", &"<redacted>")
            .finish()
    }
}

/// Outbound channel for notifications
pub trait Mailer {
    fn send(&mut self, notification: &Notification) -> Result<(), DeliveryError>;
}

impl<M: Mailer + ?Sized> Mailer for &mut M {
    fn send(&mut self, notification: &Notification) -> Result<(), DeliveryError> {
        (**self).send(notification)
    }
}

impl<M: Mailer + ?Sized> Mailer for Box<M> {
    fn send(&mut self, notification: &Notification) -> Result<(), DeliveryError> {
        (**self).send(notification)
    }
}

/// A recipient whose notification was not delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub santa: String,
    pub error: DeliveryError,
}

/// Outcome of a dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Santas whose message was accepted by the mailer, in send order
    pub delivered: Vec<String>,

    pub failed: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    /// True if every recipient was notified
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Renders and sends one notification per santa
pub struct Dispatcher<M: Mailer> {
    mailer: M,
    subject: String,
}

impl<M: Mailer> Dispatcher<M> {
    pub fn new(mailer: M) -> Self {
        Self {
            mailer,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Notify every santa of their santee
    ///
    /// Never fails as a whole; per-recipient failures are collected in the
    /// returned report.
    pub fn dispatch(
        &mut self,
        registry: &Registry,
        assignment: &Assignment,
        template: &Template,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (santa, santee) in assignment.pairs() {
            let Some(participant) = registry.get(santa) else {
                let error = DeliveryError::UnknownRecipient {
                    santa: santa.to_string(),
                };
                warn!(santa, error = %error, "skipping recipient");
                report.failed.push(DeliveryFailure {
                    santa: santa.to_string(),
                    error,
                });
                continue;
            };

            let notification = Notification {
                santa: santa.to_string(),
                to: participant.address().to_string(),
                subject: self.subject.clone(),
                body: template.render(santa, santee),
            };

            info!(santa, to = participant.address(), "sending assignment");
            match self.mailer.send(&notification) {
                Ok(()) => report.delivered.push(santa.to_string()),
                Err(error) => {
                    warn!(santa, error = %error, "delivery failed");
                    report.failed.push(DeliveryFailure {
                        santa: santa.to_string(),
                        error,
                    });
                }
            }
        }

        report
    }

    pub fn into_mailer(self) -> M {
        self.mailer
    }
}
