// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock publisher for deterministic testing.
//!
//! `RecordingPublisher` implements `MessagePublisher` and captures every
//! message handed to it for assertion in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use coachbot_core::{CoachError, MessagePublisher, OutboundMessage, PublishReceipt};

/// A publisher that remembers what it was asked to send.
pub struct RecordingPublisher {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    ts: Option<String>,
    fail: bool,
}

impl RecordingPublisher {
    /// Succeeds without reporting a message timestamp, like a webhook.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            ts: None,
            fail: false,
        }
    }

    /// Succeeds and reports `ts`, like `chat.postMessage`.
    pub fn with_ts(ts: &str) -> Self {
        Self {
            ts: Some(ts.to_string()),
            ..Self::new()
        }
    }

    /// Rejects every message with a channel error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, message: &OutboundMessage) -> Result<PublishReceipt, CoachError> {
        if self.fail {
            return Err(CoachError::Channel {
                message: "mock publisher configured to fail".into(),
                source: None,
            });
        }
        self.sent.lock().await.push(message.clone());
        Ok(PublishReceipt {
            ts: self.ts.clone(),
        })
    }
}
