//! Unified error handling for mailbridge
//!
//! Every operation in the crate returns [`Result`]. Failures carry a stable
//! machine-readable [`ErrorCode`], a coarse [`ErrorCategory`] for
//! programmatic handling (retry only on `External`, never on `Validation`),
//! a detailed message, and an optional nested cause. Lower-layer errors are
//! chained through `source` rather than discarded.

use std::fmt;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, MailError>;

/// Coarse-grained failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad caller input
    Validation,
    /// A referenced resource (template file) does not exist
    NotFound,
    /// Credential or permission failure
    Unauthorized,
    /// A downstream provider rejected or rate-limited the request
    External,
    /// Defect or unexpected fault inside this crate
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::External => "external",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Stable error identifiers, suitable for programmatic branching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Template store
    InvalidTemplatePath,
    HtmlTemplateNotFound,
    TextTemplateNotFound,
    TemplateReadError,
    // Renderer
    CompilationError,
    RenderError,
    // Dispatch service
    TemplateError,
    InvalidInput,
    // Transactional API provider
    AuthenticationError,
    RateLimitExceeded,
    ValidationError,
    ApiError,
    // SES provider
    AccountPaused,
    ConfigNotFound,
    ConfigPaused,
    DomainNotVerified,
    MessageRejected,
    // Cross-cutting
    OperationCancelled,
    InvalidConfiguration,
    UnexpectedError,
}

impl ErrorCode {
    /// Stable snake_case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTemplatePath => "invalid_template_path",
            Self::HtmlTemplateNotFound => "html_template_not_found",
            Self::TextTemplateNotFound => "text_template_not_found",
            Self::TemplateReadError => "template_read_error",
            Self::CompilationError => "compilation_error",
            Self::RenderError => "render_error",
            Self::TemplateError => "template_error",
            Self::InvalidInput => "invalid_input",
            Self::AuthenticationError => "authentication_error",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ValidationError => "validation_error",
            Self::ApiError => "api_error",
            Self::AccountPaused => "account_paused",
            Self::ConfigNotFound => "config_not_found",
            Self::ConfigPaused => "config_paused",
            Self::DomainNotVerified => "domain_not_verified",
            Self::MessageRejected => "message_rejected",
            Self::OperationCancelled => "operation_cancelled",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::UnexpectedError => "unexpected_error",
        }
    }

    /// Short human-readable label
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidTemplatePath => "Invalid template path",
            Self::HtmlTemplateNotFound => "HTML template not found",
            Self::TextTemplateNotFound => "Text template not found",
            Self::TemplateReadError => "Template could not be read",
            Self::CompilationError => "Template failed to compile",
            Self::RenderError => "Template failed to render",
            Self::TemplateError => "Template processing failed",
            Self::InvalidInput => "Invalid input",
            Self::AuthenticationError => "Authentication failed",
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::ValidationError => "Request rejected as invalid",
            Self::ApiError => "Email API error",
            Self::AccountPaused => "Account sending paused",
            Self::ConfigNotFound => "Configuration set not found",
            Self::ConfigPaused => "Configuration set sending paused",
            Self::DomainNotVerified => "Sender domain not verified",
            Self::MessageRejected => "Message rejected",
            Self::OperationCancelled => "Operation cancelled",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::UnexpectedError => "Unexpected error",
        }
    }

    /// The category this code maps to when the cause does not dictate
    /// otherwise. `TemplateReadError` is the one code whose category varies
    /// (Unauthorized on permission faults).
    pub fn default_category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTemplatePath
            | Self::InvalidInput
            | Self::ValidationError
            | Self::OperationCancelled
            | Self::InvalidConfiguration => ErrorCategory::Validation,
            Self::HtmlTemplateNotFound | Self::TextTemplateNotFound => ErrorCategory::NotFound,
            Self::AuthenticationError => ErrorCategory::Unauthorized,
            Self::RateLimitExceeded
            | Self::ApiError
            | Self::AccountPaused
            | Self::ConfigNotFound
            | Self::ConfigPaused
            | Self::DomainNotVerified
            | Self::MessageRejected => ErrorCategory::External,
            Self::TemplateReadError
            | Self::CompilationError
            | Self::RenderError
            | Self::TemplateError
            | Self::UnexpectedError => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one failure shape every operation in this crate returns
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct MailError {
    /// Stable machine-readable identifier
    pub code: ErrorCode,
    /// Coarse classification for retry/handling decisions
    pub category: ErrorCategory,
    /// Detailed text for logs and diagnostics
    pub message: String,
    /// Nested cause, when a lower layer produced the original failure
    #[source]
    pub source: Option<Box<MailError>>,
}

impl MailError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            category: code.default_category(),
            message: message.into(),
            source: None,
        }
    }

    /// Override the default category (e.g. a read fault caused by a
    /// permission error is Unauthorized, not Internal)
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = category;
        self
    }

    /// Chain a lower-layer error as the cause
    pub fn with_source(mut self, source: MailError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Short human label derived from the code
    pub fn reason(&self) -> &'static str {
        self.code.reason()
    }

    /// Wrap an unanticipated fault crossing a component boundary,
    /// preserving the underlying error's text
    pub fn unexpected(detail: impl fmt::Display) -> Self {
        Self::new(ErrorCode::UnexpectedError, detail.to_string())
    }

    pub fn cancelled() -> Self {
        Self::new(
            ErrorCode::OperationCancelled,
            "the operation was cancelled by the caller",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_strings_are_stable() {
        assert_eq!(ErrorCode::InvalidTemplatePath.as_str(), "invalid_template_path");
        assert_eq!(ErrorCode::RateLimitExceeded.as_str(), "rate_limit_exceeded");
        assert_eq!(ErrorCode::UnexpectedError.as_str(), "unexpected_error");
    }

    #[test]
    fn test_default_categories() {
        assert_eq!(
            ErrorCode::InvalidInput.default_category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ErrorCode::HtmlTemplateNotFound.default_category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ErrorCode::AuthenticationError.default_category(),
            ErrorCategory::Unauthorized
        );
        assert_eq!(
            ErrorCode::MessageRejected.default_category(),
            ErrorCategory::External
        );
        assert_eq!(
            ErrorCode::RenderError.default_category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_error_display_includes_code_and_message() {
        let err = MailError::new(ErrorCode::ApiError, "status 503, body: unavailable");
        let text = err.to_string();
        assert!(text.contains("api_error"));
        assert!(text.contains("503"));
    }

    #[test]
    fn test_category_override() {
        let err = MailError::new(ErrorCode::TemplateReadError, "permission denied")
            .with_category(ErrorCategory::Unauthorized);
        assert_eq!(err.category, ErrorCategory::Unauthorized);
    }

    #[test]
    fn test_source_chaining() {
        let inner = MailError::new(ErrorCode::RenderError, "render failed for 'welcome'");
        let outer = MailError::new(ErrorCode::TemplateError, "template 'welcome' failed")
            .with_source(inner);

        let nested = outer.source.as_ref().expect("inner error should be kept");
        assert_eq!(nested.code, ErrorCode::RenderError);

        // std::error::Error::source reports the chained cause too
        let dyn_source = std::error::Error::source(&outer).expect("source");
        assert!(dyn_source.to_string().contains("render_error"));
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(
            MailError::cancelled().reason(),
            "Operation cancelled"
        );
    }
}
