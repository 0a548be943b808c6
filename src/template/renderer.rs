//! Template compilation, caching and execution
//!
//! Templates are compiled once per `{name}_{format}` key and kept for the
//! lifetime of the renderer; the store is consulted on every render. Racing
//! first renders of the same template may each compile the source, which is
//! harmless: registry inserts are serialized behind the write lock and the
//! last writer wins.
//!
//! The cache is never evicted. Growth is bounded by template-name
//! cardinality, which the host application controls.

use crate::domain::{RenderedTemplate, TemplateModel};
use crate::error::{ErrorCode, MailError, Result};
use crate::template::helpers::register_helpers;
use crate::template::store::TemplateStore;
use handlebars::Handlebars;
use std::sync::{Arc, RwLock};

/// Renders named templates against typed models.
///
/// Safe to share across tasks; the compiled-template registry supports
/// concurrent reads and serialized inserts.
pub struct TemplateRenderer {
    store: Arc<dyn TemplateStore>,
    registry: RwLock<Handlebars<'static>>,
}

impl TemplateRenderer {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        let mut registry = Handlebars::new();
        // Substitution is verbatim for both formats; the text format must
        // never be HTML-escaped.
        registry.register_escape_fn(handlebars::no_escape);
        register_helpers(&mut registry);

        Self {
            store,
            registry: RwLock::new(registry),
        }
    }

    /// Render both formats of `template_name` against `model`.
    ///
    /// The render is atomic: either both formats succeed or the whole call
    /// fails. Missing field references render as empty string.
    pub async fn render<M>(&self, template_name: &str, model: &M) -> Result<RenderedTemplate>
    where
        M: TemplateModel + Sync,
    {
        let source = self.store.load(template_name).await?;

        let html_key = cache_key(template_name, "html");
        let text_key = cache_key(template_name, "text");
        self.ensure_compiled(&html_key, &source.html, template_name)?;
        self.ensure_compiled(&text_key, &source.text, template_name)?;

        let context = serde_json::to_value(model).map_err(|e| {
            MailError::new(
                ErrorCode::RenderError,
                format!(
                    "model for template '{}' is not serializable: {}",
                    template_name, e
                ),
            )
        })?;
        if !context.is_object() {
            return Err(MailError::new(
                ErrorCode::RenderError,
                format!(
                    "model for template '{}' must serialize to an object",
                    template_name
                ),
            ));
        }

        let html_body = self.execute(&html_key, template_name, &context)?;
        let plain_text_body = self.execute(&text_key, template_name, &context)?;

        Ok(RenderedTemplate {
            subject: model.subject().to_string(),
            html_body,
            plain_text_body,
        })
    }

    /// Number of compiled templates currently cached
    pub fn cached_template_count(&self) -> usize {
        match self.registry.read() {
            Ok(registry) => registry.get_templates().len(),
            Err(_) => 0,
        }
    }

    fn ensure_compiled(&self, key: &str, source: &str, template_name: &str) -> Result<()> {
        {
            let registry = self.read_registry()?;
            if registry.has_template(key) {
                return Ok(());
            }
        }

        let mut registry = self
            .registry
            .write()
            .map_err(|_| MailError::unexpected("template registry lock poisoned"))?;
        registry.register_template_string(key, source).map_err(|e| {
            tracing::error!(template = template_name, error = %e, "template compilation failed");
            MailError::new(
                ErrorCode::CompilationError,
                format!("template '{}' failed to compile: {}", template_name, e),
            )
        })
    }

    fn execute(&self, key: &str, template_name: &str, context: &serde_json::Value) -> Result<String> {
        let registry = self.read_registry()?;
        registry.render(key, context).map_err(|e| {
            tracing::error!(template = template_name, error = %e, "template execution failed");
            MailError::new(
                ErrorCode::RenderError,
                format!("template '{}' failed to render: {}", template_name, e),
            )
        })
    }

    fn read_registry(&self) -> Result<std::sync::RwLockReadGuard<'_, Handlebars<'static>>> {
        self.registry
            .read()
            .map_err(|_| MailError::unexpected("template registry lock poisoned"))
    }
}

fn cache_key(template_name: &str, format: &str) -> String {
    format!("{}_{}", template_name, format)
}
