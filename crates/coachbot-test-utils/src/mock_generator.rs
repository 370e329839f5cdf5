// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted content generator for deterministic testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use coachbot_core::{CoachError, ContentGenerator};

/// Returns a fixed body for every topic and remembers which topics it was asked for.
pub struct ScriptedGenerator {
    body: Option<String>,
    topics: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    /// Answers every topic with `body`.
    pub fn replying(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            topics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fails every request with a provider error.
    pub fn failing() -> Self {
        Self {
            body: None,
            topics: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn requested_topics(&self) -> Vec<String> {
        self.topics.lock().await.clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(&self, topic: &str) -> Result<String, CoachError> {
        self.topics.lock().await.push(topic.to_string());
        self.body.clone().ok_or_else(|| CoachError::Provider {
            message: "scripted generator configured to fail".into(),
            source: None,
        })
    }
}
