// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery seam for posting a generated tip to the chat platform.

use async_trait::async_trait;

use crate::error::CoachError;
use crate::types::{OutboundMessage, PublishReceipt};

/// Delivers outbound messages to a chat platform.
///
/// The Slack client implements this for webhook and bot delivery; tests
/// substitute a recording publisher.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: &OutboundMessage) -> Result<PublishReceipt, CoachError>;
}
