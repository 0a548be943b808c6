//! Delivery backends
//!
//! Every backend implements [`EmailProvider`]: one outbound call per send,
//! cooperative cancellation, and failures normalized into the crate's error
//! taxonomy. Providers are stateless between calls and hold their transport
//! clients as immutable, reusable handles.

mod development;
mod ses;
mod transactional;

pub use development::{ConsoleSink, DevelopmentProvider, StdoutSink};
pub use ses::SesProvider;
pub use transactional::TransactionalApiProvider;

use crate::config::{Environment, ProviderConfig};
use crate::domain::Message;
use crate::error::{ErrorCode, MailError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Uniform send contract over all delivery backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver a fully composed message. Exactly one attempt; cancellation
    /// before or during the outbound call yields `OperationCancelled`.
    async fn send(&self, message: &Message, cancel: &CancellationToken) -> Result<()>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

impl std::fmt::Debug for dyn EmailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailProvider")
            .field("provider", &self.provider_name())
            .finish()
    }
}

/// Build the configured provider.
///
/// Selection happens once at construction and is never re-evaluated per
/// call. The development provider is a local-mode stand-in and is rejected
/// outside the development environment.
pub async fn build_provider(
    config: &ProviderConfig,
    environment: Environment,
) -> Result<Arc<dyn EmailProvider>> {
    match config {
        ProviderConfig::TransactionalApi(api_config) => {
            Ok(Arc::new(TransactionalApiProvider::new(api_config)?))
        }
        ProviderConfig::CloudSes(ses_config) => {
            Ok(Arc::new(SesProvider::from_config(ses_config).await?))
        }
        ProviderConfig::Development(dev_config) => {
            if !environment.is_development() {
                return Err(MailError::new(
                    ErrorCode::InvalidConfiguration,
                    "the development provider may only be selected in the development environment",
                ));
            }
            Ok(Arc::new(DevelopmentProvider::new(dev_config.clone())))
        }
    }
}
