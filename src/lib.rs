//! Mailbridge - email delivery abstraction
//!
//! This crate decouples "compose an email" from "how it physically gets
//! delivered". A logical message (subject, HTML/text body, sender,
//! recipients) is either handed over as-is or rendered from a named
//! template plus a typed model, then dispatched through one of several
//! interchangeable backends:
//! - Transactional email API (SendGrid-compatible HTTP)
//! - AWS SES (v2 API)
//! - Console output for local development
//!
//! Every failure is normalized into a single [`MailError`] taxonomy with a
//! stable code, a coarse category, and an optional nested cause.

pub mod config;
pub mod domain;
pub mod error;
pub mod provider;
pub mod service;
pub mod template;

// Re-export commonly used types
pub use config::{
    DevelopmentConfig, Environment, MailerConfig, ProviderConfig, SesConfig, TemplateStoreConfig,
    TransactionalApiConfig,
};
pub use domain::{Message, Recipient, RenderedTemplate, Sender, TemplateModel};
pub use error::{ErrorCategory, ErrorCode, MailError, Result};
pub use provider::{
    build_provider, ConsoleSink, DevelopmentProvider, EmailProvider, SesProvider, StdoutSink,
    TransactionalApiProvider,
};
pub use service::Mailer;
pub use template::{FileTemplateStore, TemplateRenderer, TemplateSource, TemplateStore};
