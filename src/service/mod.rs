//! Dispatch service
//!
//! Orchestrates template store, renderer and the active provider. One
//! renderer call and one provider call per invocation; no retries at this
//! layer. Any retry policy belongs to the caller, keyed off the returned
//! error's category.

use crate::config::{MailerConfig, TemplateStoreConfig};
use crate::domain::{Message, Recipient, Sender, TemplateModel};
use crate::error::{ErrorCode, MailError, Result};
use crate::provider::{build_provider, EmailProvider};
use crate::template::{FileTemplateStore, TemplateRenderer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Entry point for sending email
pub struct Mailer {
    provider: Arc<dyn EmailProvider>,
    renderer: Arc<TemplateRenderer>,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("provider", &self.provider.provider_name())
            .finish_non_exhaustive()
    }
}

impl Mailer {
    pub fn new(provider: Arc<dyn EmailProvider>, renderer: Arc<TemplateRenderer>) -> Self {
        Self { provider, renderer }
    }

    /// Wire a mailer from validated configuration: template store, renderer
    /// and exactly one provider, selected here and never re-selected per
    /// call.
    pub async fn from_config(config: &MailerConfig) -> Result<Self> {
        config.validate().map_err(|e| {
            MailError::new(
                ErrorCode::InvalidConfiguration,
                format!("invalid mailer configuration: {}", e),
            )
        })?;

        let TemplateStoreConfig::File { root } = &config.template_store;
        let store = FileTemplateStore::new(root)?;
        let renderer = Arc::new(TemplateRenderer::new(Arc::new(store)));
        let provider = build_provider(&config.provider, config.environment).await?;

        Ok(Self::new(provider, renderer))
    }

    /// Send a pre-composed message through the active provider.
    ///
    /// Pass-through: no validation beyond what the provider enforces.
    pub async fn send(&self, message: &Message, cancel: &CancellationToken) -> Result<()> {
        self.provider.send(message, cancel).await
    }

    /// Render a named template against `model` and send the result.
    ///
    /// Input validation runs before the renderer or provider is touched; a
    /// renderer failure is wrapped as `TemplateError` with the cause nested,
    /// and the provider is never called.
    pub async fn send_from_template<M>(
        &self,
        template_name: &str,
        model: &M,
        sender: &Sender,
        recipients: &[Recipient],
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        M: TemplateModel + Sync,
    {
        if template_name.trim().is_empty() {
            return Err(MailError::new(
                ErrorCode::InvalidInput,
                "template name must not be empty",
            ));
        }
        if recipients.is_empty() {
            return Err(MailError::new(
                ErrorCode::InvalidInput,
                "at least one recipient is required",
            ));
        }

        let rendered = match self.renderer.render(template_name, model).await {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::error!(template = template_name, error = %e, "template rendering failed");
                return Err(MailError::new(
                    ErrorCode::TemplateError,
                    format!("failed to render template '{}'", template_name),
                )
                .with_source(e));
            }
        };

        let message = Message::new(
            rendered.subject,
            rendered.html_body,
            sender.clone(),
            recipients.to_vec(),
        )
        .with_plain_text_body(rendered.plain_text_body);

        self.provider.send(&message, cancel).await
    }
}
