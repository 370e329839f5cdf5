// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! Provides [`AnthropicClient`], which sets the authentication headers and
//! retries transient failures once before giving up.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use coachbot_core::CoachError;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// Default Messages API endpoint.
pub const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
    api_url: String,
}

impl AnthropicClient {
    /// Creates a client that authenticates with `api_key` and sends
    /// `api_version` as the `anthropic-version` header.
    pub fn new(api_key: &str, api_version: &str) -> Result<Self, CoachError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| CoachError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                CoachError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| CoachError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
            api_url: API_URL.to_string(),
        })
    }

    /// Overrides the endpoint (proxies, wiremock).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    #[cfg(test)]
    fn without_retry_delay(mut self) -> Self {
        self.retry_delay = Duration::ZERO;
        self
    }

    /// Sends a request and returns the full response.
    ///
    /// On transient errors (429, 500, 503, 529), retries once after a short delay.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, CoachError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .json(request)
                .send()
                .await
                .map_err(|e| CoachError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| CoachError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| CoachError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(CoachError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Anthropic API error ({}): {}",
                    api_err.error.type_, api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(CoachError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| CoachError::Provider {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }
}

/// Status codes worth one more attempt.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AnthropicClient {
        AnthropicClient::new("test-api-key", "2023-06-01")
            .unwrap()
            .with_api_url(server.uri())
            .without_retry_delay()
    }

    fn request() -> MessageRequest {
        MessageRequest::user_prompt("claude-test", "Explain HOT updates".into(), 450, 0.4)
    }

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "claude-test",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 5}
        })
    }

    #[tokio::test]
    async fn sends_auth_headers_and_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-test",
                "max_tokens": 450
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("tip")))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).complete_message(&request()).await.unwrap();
        assert_eq!(response.id, "msg_test");
        assert_eq!(response.text(), "tip");
    }

    #[tokio::test]
    async fn retries_once_on_overload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("after retry")))
            .mount(&server)
            .await;

        let response = client(&server).complete_message(&request()).await.unwrap();
        assert_eq!(response.text(), "after retry");
    }

    #[tokio::test]
    async fn client_error_reports_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "type": "error",
                "error": {"type": "invalid_request_error", "message": "Bad model"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).complete_message(&request()).await.unwrap_err();
        assert!(matches!(err, CoachError::Provider { .. }));
        assert!(err.to_string().contains("invalid_request_error"), "got: {err}");
    }

    #[tokio::test]
    async fn gives_up_after_second_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server).complete_message(&request()).await.unwrap_err();
        assert!(err.to_string().contains("503"), "got: {err}");
    }

    #[test]
    fn invalid_key_is_a_config_error() {
        let err = AnthropicClient::new("bad\nkey", "2023-06-01").unwrap_err();
        assert!(matches!(err, CoachError::Config(_)));
    }
}
