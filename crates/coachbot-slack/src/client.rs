// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for Slack incoming webhooks and the Web API.
//!
//! Web API calls authenticate with the bot token (the app-level token for
//! `apps.connections.open`) and treat any response whose `ok` field is not
//! `true` as a [`CoachError::Channel`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use coachbot_config::model::{SlackConfig, SlackMode};
use coachbot_core::{CoachError, MessagePublisher, OutboundMessage, PublishReceipt};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    mode: SlackMode,
    webhook_url: Option<String>,
    bot_token: Option<String>,
    app_token: Option<String>,
    default_channel: Option<String>,
    api_base_url: String,
}

impl SlackClient {
    /// Build a client from the `[slack]` section.
    ///
    /// Credentials are not checked here; see [`SlackClient::ensure_can_publish`].
    pub fn from_config(config: &SlackConfig) -> Result<Self, CoachError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CoachError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            mode: config.mode,
            webhook_url: config.webhook_url.clone().filter(|u| !u.is_empty()),
            bot_token: config.bot_token.clone().filter(|t| !t.is_empty()),
            app_token: config.app_token.clone().filter(|t| !t.is_empty()),
            default_channel: config.channel_id.clone().filter(|c| !c.is_empty()),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Overrides the Web API base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn mode(&self) -> SlackMode {
        self.mode
    }

    pub fn has_bot_token(&self) -> bool {
        self.bot_token.is_some()
    }

    pub fn has_app_token(&self) -> bool {
        self.app_token.is_some()
    }

    /// Fail early when the configured mode is missing its credential.
    pub fn ensure_can_publish(&self) -> Result<(), CoachError> {
        match self.mode {
            SlackMode::Webhook if self.webhook_url.is_none() => Err(CoachError::Config(
                "slack.webhook_url is required in webhook mode".into(),
            )),
            SlackMode::Bot if self.bot_token.is_none() => Err(CoachError::Config(
                "slack.bot_token is required in bot mode".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Post to the incoming webhook. Webhooks report no message timestamp.
    pub async fn post_webhook(&self, message: &OutboundMessage) -> Result<(), CoachError> {
        let url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| CoachError::Config("slack.webhook_url is not set".into()))?;

        let response = self
            .http
            .post(url)
            .json(&json!({"text": message.text, "blocks": message.blocks}))
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoachError::Channel {
                message: format!("webhook returned {status}: {body}"),
                source: None,
            });
        }
        info!("posted message via webhook");
        Ok(())
    }

    /// `chat.postMessage`, returning the new message's timestamp.
    pub async fn post_message(
        &self,
        message: &OutboundMessage,
    ) -> Result<PublishReceipt, CoachError> {
        let channel = message
            .channel
            .as_deref()
            .or(self.default_channel.as_deref())
            .ok_or_else(|| CoachError::Config("no Slack channel to post to".into()))?;

        let response = self
            .call(
                "chat.postMessage",
                &json!({"channel": channel, "text": message.text, "blocks": message.blocks}),
            )
            .await?;
        let ts = response.get("ts").and_then(Value::as_str).map(str::to_string);
        info!(channel, ts = ts.as_deref().unwrap_or("-"), "posted message via bot");
        Ok(PublishReceipt { ts })
    }

    pub async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        text: &str,
    ) -> Result<(), CoachError> {
        self.call(
            "chat.postEphemeral",
            &json!({"channel": channel, "user": user, "text": text}),
        )
        .await?;
        Ok(())
    }

    /// `chat.update` with a full replacement block list.
    pub async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        blocks: &[Value],
    ) -> Result<(), CoachError> {
        self.call(
            "chat.update",
            &json!({"channel": channel, "ts": ts, "blocks": blocks}),
        )
        .await?;
        debug!(channel, ts, "updated message blocks");
        Ok(())
    }

    /// Profile picture of `user_id` from `users.info`, if the profile has one.
    pub async fn user_avatar(&self, user_id: &str) -> Result<Option<String>, CoachError> {
        let mut url = reqwest::Url::parse(&format!("{}/users.info", self.api_base_url))
            .map_err(|e| CoachError::Config(format!("invalid slack.api_base_url: {e}")))?;
        url.query_pairs_mut().append_pair("user", user_id);

        let response = self
            .http
            .get(url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .map_err(request_failed)?;
        let body = read_api_response("users.info", response).await?;

        let profile = body.get("user").and_then(|u| u.get("profile"));
        let avatar = ["image_72", "image_48", "image_192", "image_original"]
            .iter()
            .find_map(|field| {
                profile
                    .and_then(|p| p.get(*field))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
            })
            .map(str::to_string);
        Ok(avatar)
    }

    /// `apps.connections.open`: a fresh Socket Mode WebSocket URL.
    pub async fn open_socket_url(&self) -> Result<String, CoachError> {
        let app_token = self
            .app_token
            .as_deref()
            .ok_or_else(|| CoachError::Config("slack.app_token is not set".into()))?;

        let response = self
            .http
            .post(format!("{}/apps.connections.open", self.api_base_url))
            .bearer_auth(app_token)
            .send()
            .await
            .map_err(request_failed)?;
        let body = read_api_response("apps.connections.open", response).await?;

        body.get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CoachError::Channel {
                message: "apps.connections.open returned no url".into(),
                source: None,
            })
    }

    fn token(&self) -> Result<&str, CoachError> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| CoachError::Config("slack.bot_token is not set".into()))
    }

    async fn call(&self, method: &str, body: &Value) -> Result<Value, CoachError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.api_base_url))
            .bearer_auth(self.token()?)
            .json(body)
            .send()
            .await
            .map_err(request_failed)?;
        read_api_response(method, response).await
    }
}

#[async_trait]
impl MessagePublisher for SlackClient {
    async fn publish(&self, message: &OutboundMessage) -> Result<PublishReceipt, CoachError> {
        match self.mode {
            SlackMode::Webhook => {
                self.post_webhook(message).await?;
                Ok(PublishReceipt::default())
            }
            SlackMode::Bot => self.post_message(message).await,
        }
    }
}

fn request_failed(e: reqwest::Error) -> CoachError {
    CoachError::Channel {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn read_api_response(method: &str, response: reqwest::Response) -> Result<Value, CoachError> {
    let status = response.status();
    let text = response.text().await.map_err(request_failed)?;
    if !status.is_success() {
        return Err(CoachError::Channel {
            message: format!("{method} returned {status}: {text}"),
            source: None,
        });
    }

    let parsed: ApiResponse = serde_json::from_str(&text).map_err(|e| CoachError::Channel {
        message: format!("{method} returned unparsable body: {e}"),
        source: Some(Box::new(e)),
    })?;
    if !parsed.ok {
        return Err(CoachError::Channel {
            message: format!(
                "Slack API error ({method}): {}",
                parsed.error.as_deref().unwrap_or("unknown_error")
            ),
            source: None,
        });
    }
    Ok(Value::Object(parsed.rest))
}
