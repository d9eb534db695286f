//! HTTP client for the messaging provider REST API.
//!
//! Handles basic authentication, channel-prefixed addressing, timeout
//! management, and exponential backoff retry. Every failure is reported as a
//! `Delivery` error naming the recipient.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, warn};

use flock_core::config::MessagingConfig;
use flock_core::error::{FlockError, FlockResult};

use crate::provider::{DeliveryReceipt, MessagingProvider};
use crate::response::{MessageResource, ProviderError};

/// Retry configuration for provider requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first.
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// HTTP status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            retryable_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << attempt.min(16));
        let max_ms = self.max_delay.as_millis() as u64;
        Duration::from_millis(delay_ms.min(max_ms))
    }
}

/// Twilio-style messaging client.
#[derive(Clone)]
pub struct MessagingClient {
    inner: Client,
    /// Full URL of the account's Messages resource.
    messages_url: String,
    account_sid: String,
    auth_token: String,
    /// Sender address with channel prefix.
    from: String,
    config: MessagingConfig,
    retry_config: RetryConfig,
}

impl MessagingClient {
    /// Create a client from messaging configuration.
    ///
    /// Fails with `MissingConfig` if credentials or sender are absent.
    pub fn new(config: &MessagingConfig) -> FlockResult<Self> {
        config.validate()?;

        let inner = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FlockError::Http(format!("failed to build HTTP client: {e}")))?;

        let retry_config = RetryConfig {
            max_retries: config.max_retries,
            ..RetryConfig::default()
        };

        Ok(Self {
            inner,
            messages_url: messages_url(&config.api_base_url, &config.account_sid),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.address(&config.from_number),
            config: config.clone(),
            retry_config,
        })
    }

    /// Set custom retry configuration.
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// URL messages are posted to.
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// Sender address including channel prefix.
    pub fn from_address(&self) -> &str {
        &self.from
    }

    /// Post one message, retrying transient failures.
    pub async fn send_message(&self, to: &str, body: &str) -> FlockResult<MessageResource> {
        let to_address = self.config.address(to);
        let delivery_error = |message: String| FlockError::Delivery {
            recipient: to.to_string(),
            message,
        };

        let mut last_error = String::from("max retries exceeded");

        for attempt in 0..=self.retry_config.max_retries {
            if attempt > 0 {
                let delay = self.retry_config.delay_for(attempt - 1);
                warn!(
                    "retrying message to {} (attempt {}/{}) after {:.1}s",
                    to,
                    attempt + 1,
                    self.retry_config.max_retries + 1,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }

            let request = self
                .inner
                .post(&self.messages_url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .form(&[
                    ("To", to_address.as_str()),
                    ("From", self.from.as_str()),
                    ("Body", body),
                ]);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if self.retry_config.retryable_statuses.contains(&status.as_u16())
                        && attempt < self.retry_config.max_retries
                    {
                        warn!("retryable status {} sending to {}", status.as_u16(), to);
                        last_error = format!("retryable status {status}");
                        continue;
                    }

                    return Self::read_response(response).await.map_err(delivery_error);
                }
                Err(e) => {
                    let is_retryable = e.is_timeout() || e.is_connect();
                    let message = if e.is_timeout() {
                        format!("request timed out: {e}")
                    } else if e.is_connect() {
                        format!("connection failed: {e}")
                    } else {
                        format!("request failed: {e}")
                    };

                    if is_retryable && attempt < self.retry_config.max_retries {
                        warn!("retryable error sending to {}: {}", to, message);
                        last_error = message;
                        continue;
                    }

                    return Err(delivery_error(message));
                }
            }
        }

        Err(delivery_error(last_error))
    }

    /// Turn a final response into the created resource or an error message.
    async fn read_response(response: Response) -> Result<MessageResource, String> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;

        if status.is_success() {
            let resource: MessageResource = serde_json::from_str(&text)
                .map_err(|e| format!("failed to parse provider response: {e}"))?;
            if let Some(code) = resource.error_code {
                let detail = resource.error_message.clone().unwrap_or_default();
                return Err(format!("provider error {code}: {detail}"));
            }
            return Ok(resource);
        }

        Err(describe_failure(status, &text))
    }
}

#[async_trait]
impl MessagingProvider for MessagingClient {
    fn name(&self) -> &str {
        "messaging-api"
    }

    async fn send(&self, to: &str, body: &str) -> FlockResult<DeliveryReceipt> {
        let resource = self.send_message(to, body).await?;
        let receipt = DeliveryReceipt {
            recipient: to.to_string(),
            message_id: resource.sid,
            status: resource.status.unwrap_or_else(|| "accepted".to_string()),
            accepted_at: Utc::now(),
        };
        info!(
            "message to {} accepted ({})",
            to,
            receipt.message_id.as_deref().unwrap_or("no id")
        );
        Ok(receipt)
    }
}

/// Messages resource URL for an account.
pub fn messages_url(api_base_url: &str, account_sid: &str) -> String {
    format!(
        "{}/2010-04-01/Accounts/{}/Messages.json",
        api_base_url.trim_end_matches('/'),
        account_sid
    )
}

/// Describe a non-success response from its body, falling back to the status.
fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ProviderError>(body) {
        Ok(err) => err.describe(status.as_u16()),
        Err(_) => {
            debug!("unparseable provider error body: {body}");
            format!("HTTP {}", status.as_u16())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MessagingConfig {
        MessagingConfig {
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
            from_number: "+14155238886".into(),
            ..MessagingConfig::default()
        }
    }

    #[test]
    fn test_messages_url() {
        assert_eq!(
            messages_url("https://api.twilio.com/", "AC123"),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_client_requires_credentials() {
        let err = MessagingClient::new(&MessagingConfig::default()).err().unwrap();
        assert!(matches!(err, FlockError::MissingConfig(_)));
    }

    #[test]
    fn test_client_prefixes_sender() {
        let client = MessagingClient::new(&config()).unwrap();
        assert_eq!(client.from_address(), "whatsapp:+14155238886");
        assert!(client.messages_url().ends_with("/Accounts/AC123/Messages.json"));
    }

    #[test]
    fn test_retry_delay_backoff() {
        let retry = RetryConfig {
            max_retries: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(3),
            retryable_statuses: vec![503],
        };
        assert_eq!(retry.delay_for(0), Duration::from_millis(500));
        assert_eq!(retry.delay_for(1), Duration::from_millis(1000));
        assert_eq!(retry.delay_for(2), Duration::from_millis(2000));
        assert_eq!(retry.delay_for(3), Duration::from_secs(3));
    }

    #[test]
    fn test_describe_failure() {
        let body = r#"{"code":63016,"message":"Outside the allowed window"}"#;
        assert_eq!(
            describe_failure(StatusCode::BAD_REQUEST, body),
            "HTTP 400, code 63016: Outside the allowed window"
        );
        assert_eq!(describe_failure(StatusCode::BAD_GATEWAY, "<html>"), "HTTP 502");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_delivery_error() {
        let mut config = config();
        config.api_base_url = "http://127.0.0.1:9".into();
        config.max_retries = 0;
        config.timeout_ms = 2_000;
        let client = MessagingClient::new(&config).unwrap();

        let err = client.send("+27821234567", "hello").await.unwrap_err();
        match err {
            FlockError::Delivery { recipient, .. } => assert_eq!(recipient, "+27821234567"),
            other => panic!("expected delivery error, got {other:?}"),
        }
    }
}
