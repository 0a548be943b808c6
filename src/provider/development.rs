//! Console provider for local development
//!
//! Never performs network I/O and never fails on its own: the message is
//! written in a human-readable form to a console-like sink. Only a
//! caller-initiated cancellation is reported as an error, to keep the send
//! contract uniform across providers. The sink is injectable so tests can
//! capture output instead of printing.

use super::EmailProvider;
use crate::config::DevelopmentConfig;
use crate::domain::Message;
use crate::error::{MailError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Console-like output target
pub trait ConsoleSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Default sink: standard output
pub struct StdoutSink;

impl ConsoleSink for StdoutSink {
    fn write_line(&self, line: &str) {
        println!("{}", line);
    }
}

pub struct DevelopmentProvider {
    config: DevelopmentConfig,
    sink: Arc<dyn ConsoleSink>,
}

impl DevelopmentProvider {
    pub fn new(config: DevelopmentConfig) -> Self {
        Self::with_sink(config, Arc::new(StdoutSink))
    }

    pub fn with_sink(config: DevelopmentConfig, sink: Arc<dyn ConsoleSink>) -> Self {
        Self { config, sink }
    }

    fn format_recipients(message: &Message) -> String {
        message
            .recipients
            .iter()
            .map(|r| match &r.display_name {
                Some(name) => format!("{} <{}>", name, r.email),
                None => r.email.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
impl EmailProvider for DevelopmentProvider {
    async fn send(&self, message: &Message, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(MailError::cancelled());
        }

        self.sink.write_line("==== email (development) ====");
        self.sink.write_line(&format!(
            "From:     {} <{}>",
            message.sender.name, message.sender.from_email
        ));
        self.sink
            .write_line(&format!("Reply-To: {}", message.sender.reply_to()));
        self.sink
            .write_line(&format!("To:       {}", Self::format_recipients(message)));
        self.sink
            .write_line(&format!("Subject:  {}", message.subject));

        if self.config.show_html_body {
            self.sink.write_line("---- html body ----");
            self.sink.write_line(&message.html_body);
        }
        if self.config.show_text_body {
            if let Some(text) = &message.plain_text_body {
                self.sink.write_line("---- text body ----");
                self.sink.write_line(text);
            }
        }
        self.sink.write_line("=============================");

        tracing::info!(
            recipients = message.recipients.len(),
            subject = %message.subject,
            "development provider wrote email to console"
        );

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Recipient, Sender};
    use crate::error::ErrorCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CaptureSink {
        lines: Mutex<Vec<String>>,
    }

    impl CaptureSink {
        fn new() -> Self {
            Self {
                lines: Mutex::new(Vec::new()),
            }
        }

        fn contents(&self) -> String {
            self.lines.lock().unwrap().join("\n")
        }
    }

    impl ConsoleSink for CaptureSink {
        fn write_line(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    fn sample_message() -> Message {
        Message::new(
            "Hi there",
            "<p>Hello</p>",
            Sender::new("Acme", "noreply@acme.test").with_reply_to("support@acme.test"),
            vec![
                Recipient::new("a@b.test").with_display_name("Alice"),
                Recipient::new("c@d.test"),
            ],
        )
        .with_plain_text_body("Hello")
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = DevelopmentProvider::new(DevelopmentConfig::default());
        let cancel = CancellationToken::new();

        for _ in 0..3 {
            assert!(provider.send(&sample_message(), &cancel).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_writes_headers_and_html_body() {
        let sink = Arc::new(CaptureSink::new());
        let provider =
            DevelopmentProvider::with_sink(DevelopmentConfig::default(), Arc::clone(&sink) as _);

        provider
            .send(&sample_message(), &CancellationToken::new())
            .await
            .unwrap();

        let output = sink.contents();
        assert!(output.contains("Acme <noreply@acme.test>"));
        assert!(output.contains("Reply-To: support@acme.test"));
        assert!(output.contains("Alice <a@b.test>, c@d.test"));
        assert!(output.contains("Subject:  Hi there"));
        assert!(output.contains("<p>Hello</p>"));
        // text body is off by default
        assert!(!output.contains("text body"));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_short_circuits() {
        let sink = Arc::new(CaptureSink::new());
        let provider =
            DevelopmentProvider::with_sink(DevelopmentConfig::default(), Arc::clone(&sink) as _);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = provider.send(&sample_message(), &cancel).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OperationCancelled);
        // Nothing was written once the abort was observed
        assert!(sink.contents().is_empty());
    }

    /// Counts INFO-level events on the current thread
    #[derive(Clone)]
    struct InfoCounter(Arc<AtomicUsize>);

    impl tracing::Subscriber for InfoCounter {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }
        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}
        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}
        fn event(&self, event: &tracing::Event<'_>) {
            if *event.metadata().level() == tracing::Level::INFO {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        fn enter(&self, _: &tracing::span::Id) {}
        fn exit(&self, _: &tracing::span::Id) {}
    }

    #[tokio::test]
    async fn test_emits_exactly_one_info_log_per_send() {
        let infos = Arc::new(AtomicUsize::new(0));
        let _guard = tracing::subscriber::set_default(InfoCounter(Arc::clone(&infos)));

        let provider = DevelopmentProvider::with_sink(
            DevelopmentConfig::default(),
            Arc::new(CaptureSink::new()) as _,
        );
        let cancel = CancellationToken::new();

        provider.send(&sample_message(), &cancel).await.unwrap();
        assert_eq!(infos.load(Ordering::SeqCst), 1);

        provider.send(&sample_message(), &cancel).await.unwrap();
        assert_eq!(infos.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_body_flags() {
        let sink = Arc::new(CaptureSink::new());
        let config = DevelopmentConfig {
            show_html_body: false,
            show_text_body: true,
        };
        let provider = DevelopmentProvider::with_sink(config, Arc::clone(&sink) as _);

        provider
            .send(&sample_message(), &CancellationToken::new())
            .await
            .unwrap();

        let output = sink.contents();
        assert!(!output.contains("<p>Hello</p>"));
        assert!(output.contains("---- text body ----"));
        assert!(output.contains("Hello"));
    }
}
