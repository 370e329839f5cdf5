// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content seam: turns the day's topic into the tip body.

use async_trait::async_trait;

use crate::error::CoachError;

/// Writes the body of a daily tip for a topic.
///
/// The Anthropic client implements this; tests substitute a scripted generator.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Body text for `topic`, without the title line.
    async fn generate(&self, topic: &str) -> Result<String, CoachError>;
}
