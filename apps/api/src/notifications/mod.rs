//! Outbound candidate email.
//!
//! All mail leaves through the `Mailer` trait. `AppState` holds an
//! `Arc<dyn Mailer>`: `SmtpMailer` in production, a recording double in tests.

pub mod handlers;
pub mod render;
pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::candidate::{Candidate, CandidateStatus};
use render::{Template, TemplateError};

pub use smtp::SmtpMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// A single fully-rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message, returning once the relay has accepted or rejected it.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

const SELECTED_SUBJECT: &str = "Congratulations! You've been selected";
const REJECTED_SUBJECT: &str = "Thank you for applying";

/// Composes the decision notice for a candidate whose status was just updated.
/// Any status other than `selected` gets the rejection notice.
pub fn status_email(candidate: &Candidate) -> OutgoingEmail {
    let (subject, body) = match candidate.status {
        CandidateStatus::Selected => (
            SELECTED_SUBJECT,
            format!(
                "Dear {},\n\nWe are pleased to inform you that you have been selected for the position.",
                candidate.name
            ),
        ),
        _ => (
            REJECTED_SUBJECT,
            format!(
                "Dear {},\n\nWe regret to inform you that you have not been selected at this time.",
                candidate.name
            ),
        ),
    };

    OutgoingEmail {
        to: candidate.email.clone(),
        subject: subject.to_string(),
        body,
    }
}

/// Caller-supplied subject/body pair, validated before anything is sent.
#[derive(Debug, Clone)]
pub struct BulkMessage {
    subject: Template,
    body: Template,
}

impl BulkMessage {
    pub fn parse(subject: &str, body: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            subject: Template::parse(subject)?,
            body: Template::parse(body)?,
        })
    }

    pub fn for_candidate(&self, candidate: &Candidate) -> OutgoingEmail {
        OutgoingEmail {
            to: candidate.email.clone(),
            subject: self.subject.render(&candidate.name),
            body: self.body.render(&candidate.name),
        }
    }
}

/// A batch stopped at its first delivery failure.
#[derive(Debug, Error)]
#[error("Emails sent to {sent} of {total} candidates before delivery failed")]
pub struct BulkSendError {
    pub sent: usize,
    pub total: usize,
    #[source]
    pub source: MailError,
}

/// Sends one rendered message per candidate, in order, stopping at the first failure.
/// Returns how many were delivered.
pub async fn send_to_all(
    mailer: &dyn Mailer,
    message: &BulkMessage,
    candidates: &[Candidate],
) -> Result<usize, BulkSendError> {
    for (sent, candidate) in candidates.iter().enumerate() {
        mailer
            .send(&message.for_candidate(candidate))
            .await
            .map_err(|source| BulkSendError {
                sent,
                total: candidates.len(),
                source,
            })?;
    }
    Ok(candidates.len())
}
