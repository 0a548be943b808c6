//! Transactional email API provider
//!
//! Speaks the SendGrid v3 mail-send JSON shape over HTTP. One POST per
//! send; the HTTP outcome is classified into the error taxonomy with the
//! raw status and response body preserved for diagnosis.

use super::EmailProvider;
use crate::config::TransactionalApiConfig;
use crate::domain::Message;
use crate::error::{ErrorCode, MailError, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

const SEND_PATH: &str = "/v3/mail/send";

pub struct TransactionalApiProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct MailPayload<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    reply_to: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl TransactionalApiProvider {
    pub fn new(config: &TransactionalApiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            MailError::new(
                ErrorCode::InvalidConfiguration,
                format!("failed to build HTTP client: {}", e),
            )
        })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn build_payload<'a>(message: &'a Message) -> MailPayload<'a> {
        let to = message
            .recipients
            .iter()
            .map(|r| Address {
                email: &r.email,
                name: r.display_name.as_deref(),
            })
            .collect();

        // The API requires text/plain before text/html.
        let mut content = Vec::with_capacity(2);
        if let Some(text) = &message.plain_text_body {
            content.push(Content {
                content_type: "text/plain",
                value: text,
            });
        }
        content.push(Content {
            content_type: "text/html",
            value: &message.html_body,
        });

        MailPayload {
            personalizations: vec![Personalization { to }],
            from: Address {
                email: &message.sender.from_email,
                name: Some(&message.sender.name),
            },
            reply_to: Address {
                email: message.sender.reply_to(),
                name: None,
            },
            subject: &message.subject,
            content,
        }
    }

    fn classify(status: reqwest::StatusCode, body: String, rate_headers: Vec<String>) -> MailError {
        let detail = format!("status {}, body: {}", status.as_u16(), body);

        match status.as_u16() {
            401 => MailError::new(
                ErrorCode::AuthenticationError,
                format!("mail API authentication failed: {}", detail),
            ),
            429 => {
                let mut message = format!("mail API rate limit exceeded: {}", detail);
                if !rate_headers.is_empty() {
                    message.push_str(&format!(
                        ", rate limit headers: {}",
                        rate_headers.join(", ")
                    ));
                }
                MailError::new(ErrorCode::RateLimitExceeded, message)
            }
            400 => MailError::new(
                ErrorCode::ValidationError,
                format!("mail API rejected the request: {}", detail),
            ),
            _ => MailError::new(
                ErrorCode::ApiError,
                format!("mail API call failed: {}", detail),
            ),
        }
    }
}

#[async_trait]
impl EmailProvider for TransactionalApiProvider {
    async fn send(&self, message: &Message, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(MailError::cancelled());
        }

        let payload = Self::build_payload(message);
        let request = self
            .http_client
            .post(format!("{}{}", self.base_url, SEND_PATH))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(MailError::cancelled()),
            result = request => result.map_err(|e| {
                MailError::new(
                    ErrorCode::ApiError,
                    format!("transport error calling mail API: {}", e),
                )
            })?,
        };

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Rate-limit headers are captured before the body consumes the
        // response.
        let rate_headers: Vec<String> = response
            .headers()
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("x-ratelimit"))
            .map(|(name, value)| {
                format!("{}: {}", name, value.to_str().unwrap_or("<non-ascii>"))
            })
            .collect();
        let body = response.text().await.unwrap_or_default();

        let err = Self::classify(status, body, rate_headers);
        tracing::error!(provider = "transactional_api", status = status.as_u16(), error = %err, "email send failed");
        Err(err)
    }

    fn provider_name(&self) -> &'static str {
        "transactional_api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransactionalApiConfig;
    use crate::domain::{Recipient, Sender};
    use crate::error::ErrorCategory;

    fn sample_message() -> Message {
        Message::new(
            "Hi",
            "<p>Hello</p>",
            Sender::new("Acme", "noreply@acme.test"),
            vec![Recipient::new("a@b.test").with_display_name("Alice")],
        )
        .with_plain_text_body("Hello")
    }

    #[test]
    fn test_payload_shape() {
        let message = sample_message();
        let payload = TransactionalApiProvider::build_payload(&message);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["from"]["email"], "noreply@acme.test");
        assert_eq!(json["from"]["name"], "Acme");
        assert_eq!(json["reply_to"]["email"], "noreply@acme.test");
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "a@b.test");
        assert_eq!(json["personalizations"][0]["to"][0]["name"], "Alice");
        // text/plain must precede text/html
        assert_eq!(json["content"][0]["type"], "text/plain");
        assert_eq!(json["content"][1]["type"], "text/html");
        assert_eq!(json["subject"], "Hi");
    }

    #[test]
    fn test_payload_without_text_body() {
        let message = Message::new(
            "Hi",
            "<p>Hello</p>",
            Sender::new("Acme", "noreply@acme.test").with_reply_to("support@acme.test"),
            vec![Recipient::new("a@b.test")],
        );
        let payload = TransactionalApiProvider::build_payload(&message);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["content"].as_array().unwrap().len(), 1);
        assert_eq!(json["content"][0]["type"], "text/html");
        assert_eq!(json["reply_to"]["email"], "support@acme.test");
        // Recipient without display name serializes no name field
        assert!(json["personalizations"][0]["to"][0].get("name").is_none());
    }

    #[test]
    fn test_classification() {
        let err = TransactionalApiProvider::classify(
            reqwest::StatusCode::UNAUTHORIZED,
            "bad key".to_string(),
            vec![],
        );
        assert_eq!(err.code, ErrorCode::AuthenticationError);
        assert_eq!(err.category, ErrorCategory::Unauthorized);
        assert!(err.message.contains("401"));
        assert!(err.message.contains("bad key"));

        let err = TransactionalApiProvider::classify(
            reqwest::StatusCode::BAD_REQUEST,
            "missing subject".to_string(),
            vec![],
        );
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.category, ErrorCategory::Validation);

        let err = TransactionalApiProvider::classify(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            String::new(),
            vec![],
        );
        assert_eq!(err.code, ErrorCode::ApiError);
        assert_eq!(err.category, ErrorCategory::External);
    }

    #[test]
    fn test_rate_limit_headers_appended() {
        let err = TransactionalApiProvider::classify(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "slow down".to_string(),
            vec![
                "x-ratelimit-remaining: 0".to_string(),
                "x-ratelimit-reset: 1724400000".to_string(),
            ],
        );
        assert_eq!(err.code, ErrorCode::RateLimitExceeded);
        assert_eq!(err.category, ErrorCategory::External);
        assert!(err.message.contains("x-ratelimit-remaining: 0"));
        assert!(err.message.contains("x-ratelimit-reset: 1724400000"));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_short_circuits() {
        let provider = TransactionalApiProvider::new(&TransactionalApiConfig {
            api_key: "SG.key".to_string(),
            base_url: "https://api.invalid".to_string(),
        })
        .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = provider.send(&sample_message(), &cancel).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OperationCancelled);
    }
}
