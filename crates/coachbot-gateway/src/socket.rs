// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack Socket Mode receiver.
//!
//! An alternative to the HTTP endpoint for workspaces that cannot expose a
//! public URL. The receiver asks `apps.connections.open` for a WebSocket URL,
//! acknowledges every envelope as soon as it arrives, and sends interactive
//! `block_actions` payloads through the same vote path as `/slack/actions`.
//! Slack rotates connections with a `disconnect` message; the receiver then
//! opens a new one.

use std::future::Future;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use coachbot_core::{CoachError, VotePayload};
use coachbot_slack::{InteractionPayload, SlackClient};

use crate::handlers::accept_interaction;
use crate::server::GatewayState;

/// Pause before reopening a connection that failed.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// One message received over the Socket Mode connection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocketEnvelope {
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Present on every message that must be acknowledged.
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
    /// Why Slack is closing the connection, on `disconnect` messages.
    #[serde(default)]
    pub reason: Option<String>,
}

impl SocketEnvelope {
    pub fn parse(text: &str) -> Result<Self, CoachError> {
        serde_json::from_str(text)
            .map_err(|e| CoachError::InvalidPayload(format!("socket message is not valid JSON: {e}")))
    }

    /// The acknowledgement frame, for messages that carry an envelope id.
    pub fn ack(&self) -> Option<String> {
        self.envelope_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| json!({"envelope_id": id}).to_string())
    }

    pub fn is_disconnect(&self) -> bool {
        self.kind == "disconnect"
    }
}

/// Record the vote carried by an `interactive` envelope.
///
/// Returns `Ok(None)` for envelopes that are not button clicks.
pub async fn handle_envelope(
    state: &GatewayState,
    envelope: SocketEnvelope,
) -> Result<Option<VotePayload>, CoachError> {
    if envelope.kind != "interactive" {
        debug!(kind = %envelope.kind, "ignoring socket envelope");
        return Ok(None);
    }
    let Some(payload) = envelope.payload else {
        return Err(CoachError::InvalidPayload("interactive envelope has no payload".into()));
    };
    let interaction = InteractionPayload::from_value(payload)?;
    if !interaction.is_block_actions() {
        debug!(kind = ?interaction.kind, "ignoring non-button interaction");
        return Ok(None);
    }
    accept_interaction(state, interaction).await.map(Some)
}

/// Keeps a Socket Mode connection open and feeds its clicks to the ledger.
pub struct SocketModeReceiver {
    state: GatewayState,
    slack: SlackClient,
    reconnect_delay: Duration,
}

impl SocketModeReceiver {
    /// `slack` must carry an app-level token.
    pub fn new(state: GatewayState, slack: SlackClient) -> Result<Self, CoachError> {
        if !slack.has_app_token() {
            return Err(CoachError::Config(
                "slack.app_token is required for Socket Mode".into(),
            ));
        }
        Ok(Self {
            state,
            slack,
            reconnect_delay: RECONNECT_DELAY,
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Receive until `shutdown` resolves, reconnecting whenever a connection ends.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), CoachError>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        loop {
            let delay = tokio::select! {
                () = &mut shutdown => break,
                result = self.run_connection() => match result {
                    Ok(()) => {
                        info!("socket connection ended, reconnecting");
                        Duration::ZERO
                    }
                    Err(e) => {
                        warn!(error = %e, "socket connection failed");
                        self.reconnect_delay
                    }
                },
            };
            tokio::select! {
                () = &mut shutdown => break,
                () = tokio::time::sleep(delay) => {}
            }
        }
        info!("socket mode stopped");
        Ok(())
    }

    /// One connection, from `apps.connections.open` until Slack closes it.
    async fn run_connection(&self) -> Result<(), CoachError> {
        let url = self.slack.open_socket_url().await?;
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| socket_error("failed to connect", e))?;
        info!("socket mode connected");

        let (mut sink, mut source) = stream.split();
        while let Some(frame) = source.next().await {
            let text = match frame.map_err(|e| socket_error("read failed", e))? {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    debug!(?frame, "socket closed by peer");
                    return Ok(());
                }
                _ => continue,
            };

            let envelope = match SocketEnvelope::parse(text.as_str()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(error = %e, "dropping unreadable socket message");
                    continue;
                }
            };
            if let Some(ack) = envelope.ack() {
                sink.send(Message::Text(ack.into()))
                    .await
                    .map_err(|e| socket_error("ack failed", e))?;
            }
            if envelope.is_disconnect() {
                info!(reason = envelope.reason.as_deref().unwrap_or("-"), "slack requested reconnect");
                return Ok(());
            }
            if envelope.kind == "hello" {
                debug!("socket mode hello");
                continue;
            }

            if let Err(e) = handle_envelope(&self.state, envelope).await {
                warn!(error = %e, "rejecting socket interaction");
            }
        }
        Ok(())
    }
}

fn socket_error(context: &str, e: tokio_tungstenite::tungstenite::Error) -> CoachError {
    CoachError::Channel {
        message: format!("socket mode {context}: {e}"),
        source: Some(Box::new(e)),
    }
}
