//! Message, sender and recipient value types
//!
//! All of these are immutable once constructed: builders hand back new
//! values, nothing mutates in place after a message has been assembled.

use serde::Serialize;

/// The originator of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub from_email: String,
    /// Reply-to address; falls back to `from_email` when unset
    pub reply_to_email: Option<String>,
}

impl Sender {
    pub fn new(name: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from_email: from_email.into(),
            reply_to_email: None,
        }
    }

    pub fn with_reply_to(mut self, reply_to_email: impl Into<String>) -> Self {
        self.reply_to_email = Some(reply_to_email.into());
        self
    }

    /// Effective reply-to address
    pub fn reply_to(&self) -> &str {
        self.reply_to_email.as_deref().unwrap_or(&self.from_email)
    }
}

/// A single message recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub display_name: Option<String>,
}

impl Recipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// A fully composed email, ready for a provider
///
/// The recipients-non-empty invariant is enforced by the dispatch service
/// before a message reaches any provider, not by providers themselves.
#[derive(Debug, Clone)]
pub struct Message {
    pub subject: String,
    pub html_body: String,
    pub plain_text_body: Option<String>,
    pub sender: Sender,
    pub recipients: Vec<Recipient>,
}

impl Message {
    pub fn new(
        subject: impl Into<String>,
        html_body: impl Into<String>,
        sender: Sender,
        recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            subject: subject.into(),
            html_body: html_body.into(),
            plain_text_body: None,
            sender,
            recipients,
        }
    }

    pub fn with_plain_text_body(mut self, plain_text_body: impl Into<String>) -> Self {
        self.plain_text_body = Some(plain_text_body.into());
        self
    }
}

/// Output of a template render; produced exclusively by the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub subject: String,
    pub html_body: String,
    pub plain_text_body: String,
}

/// Capability contract for data handed to the template renderer.
///
/// `Serialize` is the explicit field-mapping step: every public field of the
/// model becomes available to the template body under its serialized name.
/// Field types must be representable as JSON; that is the model author's
/// responsibility. Beyond the field map, a model must expose a subject line
/// and a contact email.
pub trait TemplateModel: Serialize {
    fn subject(&self) -> &str;
    fn email(&self) -> &str;
}
