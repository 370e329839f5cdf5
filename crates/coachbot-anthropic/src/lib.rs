// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic-backed tip generator for Coachbot.
//!
//! [`TipGenerator`] implements [`ContentGenerator`] by sending one prompt per
//! topic to the Messages API and returning the trimmed text of the reply.
//!
//! API key resolution order: `generator.api_key` -> `ANTHROPIC_API_KEY` -> error.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::info;

use coachbot_config::model::GeneratorConfig;
use coachbot_core::{CoachError, ContentGenerator};

pub use client::AnthropicClient;
use types::MessageRequest;

/// Environment variable consulted when the config carries no key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Writes daily tips with an Anthropic model.
#[derive(Debug, Clone)]
pub struct TipGenerator {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl TipGenerator {
    /// Build a generator from the `[generator]` section.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, CoachError> {
        let api_key = resolve_api_key(
            config.api_key.as_deref(),
            std::env::var(API_KEY_ENV).ok(),
        )?;
        let client = AnthropicClient::new(&api_key, &config.api_version)?
            .with_api_url(config.api_url.clone());
        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ContentGenerator for TipGenerator {
    async fn generate(&self, topic: &str) -> Result<String, CoachError> {
        info!(model = %self.model, topic, "generating tip");
        let request =
            MessageRequest::user_prompt(&self.model, tip_prompt(topic), self.max_tokens, self.temperature);
        let response = self.client.complete_message(&request).await?;

        let text = response.text();
        if text.is_empty() {
            return Err(CoachError::Provider {
                message: format!("model returned no text for topic `{topic}`"),
                source: None,
            });
        }
        info!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "tip generated"
        );
        Ok(text)
    }
}

/// The instruction sent for one topic.
pub fn tip_prompt(topic: &str) -> String {
    format!(
        r#"You are an expert Postgres database administrator and educator.
Your task is to create a "Daily SQL Coach" tip about the following topic: "{topic}".

Requirements:
1. One-sentence headline.
2. 2-3 actionable bullet points (highest impact first).
3. A SQL snippet (5-15 lines) demonstrating the concept.
4. One "Why this matters:" sentence.
5. Max ~1200 characters total.
6. Do not include generic fluff.
7. Do not propose destructive SQL (DROP/DELETE/TRUNCATE).
8. Be accurate and technical.
9. Format for Slack (you can use *bold*, `code`, ```code blocks```).

Output the message directly. Do not wrap in JSON.
"#
    )
}

/// Picks the configured key, else the environment's; blank values count as missing.
fn resolve_api_key(configured: Option<&str>, from_env: Option<String>) -> Result<String, CoachError> {
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| from_env.filter(|k| !k.trim().is_empty()))
        .ok_or_else(|| {
            CoachError::Config(format!(
                "Anthropic API key not found. Set generator.api_key in config or {API_KEY_ENV}."
            ))
        })
}
