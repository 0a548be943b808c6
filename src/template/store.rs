//! Template source storage
//!
//! A template name maps to a pair of source documents, `{name}.html` and
//! `{name}.txt`, under a fixed root directory. The file-backed store defends
//! against path traversal: both resolved paths are prefix-checked against
//! the canonical root before any file access, and re-checked after
//! canonicalization so a symlink cannot escape the root either.

use crate::error::{ErrorCategory, ErrorCode, MailError, Result};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Raw template source for both formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub html: String,
    pub text: String,
}

/// Resolves a template name to raw source strings.
///
/// Implementations cache nothing; the renderer owns compile caching.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn load(&self, template_name: &str) -> Result<TemplateSource>;
}

/// File-backed template store
#[derive(Debug)]
pub struct FileTemplateStore {
    root: PathBuf,
}

impl FileTemplateStore {
    /// Create a store rooted at `root`. The root must exist; it is
    /// canonicalized once here so every later prefix check compares
    /// canonical paths.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::fs::canonicalize(root.as_ref()).map_err(|e| {
            MailError::new(
                ErrorCode::InvalidConfiguration,
                format!(
                    "template root '{}' is not accessible: {}",
                    root.as_ref().display(),
                    e
                ),
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve `{root}/{name}.{ext}` and reject any resolution that leaves
    /// the root. Purely lexical; runs before any filesystem access.
    fn resolve(&self, template_name: &str, extension: &str) -> Result<PathBuf> {
        let candidate = self.root.join(format!("{}.{}", template_name, extension));
        let normalized = normalize_lexically(&candidate);

        if !normalized.starts_with(&self.root) {
            return Err(MailError::new(
                ErrorCode::InvalidTemplatePath,
                format!(
                    "template name '{}' resolves outside the template root",
                    template_name
                ),
            ));
        }

        Ok(normalized)
    }

    async fn read_template_file(
        &self,
        path: &Path,
        template_name: &str,
        missing_code: ErrorCode,
    ) -> Result<String> {
        // Existence check first so a missing file reports the dedicated
        // not-found code rather than a generic read error.
        match tokio::fs::metadata(path).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MailError::new(
                    missing_code,
                    format!("template file does not exist: {}", path.display()),
                ));
            }
            Err(e) => return Err(read_error(path, &e)),
        }

        // Re-check after canonicalization: a symlink inside the root must
        // not point outside it.
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| read_error(path, &e))?;
        if !canonical.starts_with(&self.root) {
            return Err(MailError::new(
                ErrorCode::InvalidTemplatePath,
                format!(
                    "template name '{}' resolves outside the template root",
                    template_name
                ),
            ));
        }

        let content = tokio::fs::read_to_string(&canonical)
            .await
            .map_err(|e| read_error(path, &e))?;

        if content.trim().is_empty() {
            return Err(MailError::new(
                ErrorCode::TemplateReadError,
                format!("template file is empty: {}", path.display()),
            ));
        }

        Ok(content)
    }
}

#[async_trait]
impl TemplateStore for FileTemplateStore {
    async fn load(&self, template_name: &str) -> Result<TemplateSource> {
        if template_name.trim().is_empty() {
            return Err(MailError::new(
                ErrorCode::InvalidTemplatePath,
                "template name must not be empty",
            ));
        }

        // Both paths are validated before either file is read.
        let html_path = self.resolve(template_name, "html")?;
        let text_path = self.resolve(template_name, "txt")?;

        let html = self
            .read_template_file(&html_path, template_name, ErrorCode::HtmlTemplateNotFound)
            .await?;
        let text = self
            .read_template_file(&text_path, template_name, ErrorCode::TextTemplateNotFound)
            .await?;

        Ok(TemplateSource { html, text })
    }
}

/// Classify an I/O fault. Permission faults are an authorization problem,
/// everything else is internal; both wrap the original error's kind and text.
fn read_error(path: &Path, e: &io::Error) -> MailError {
    let err = MailError::new(
        ErrorCode::TemplateReadError,
        format!(
            "failed to read template file '{}': {}: {}",
            path.display(),
            e.kind(),
            e
        ),
    );
    if e.kind() == io::ErrorKind::PermissionDenied {
        err.with_category(ErrorCategory::Unauthorized)
    } else {
        err
    }
}

/// Collapse `.` and `..` components without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    normalized
}
