//! Template loading, compilation and rendering
//!
//! The store resolves a template name to raw HTML + text source and re-reads
//! the backing files on every call (source hot-reload stays possible). The
//! renderer owns the compiled-template cache, so compile cost is paid once
//! per template name and format for the lifetime of the renderer.

mod helpers;
mod renderer;
mod store;

pub use renderer::TemplateRenderer;
pub use store::{FileTemplateStore, TemplateSource, TemplateStore};

#[cfg(test)]
pub use store::MockTemplateStore;
