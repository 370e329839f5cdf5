// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Coachbot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use coachbot_core::JobScope;
use serde::{Deserialize, Serialize};

/// Topics used when neither the job nor a curriculum file supplies any.
pub const DEFAULT_TOPICS: &[&str] = &[
    "sargable date predicates",
    "avoiding extract() in WHERE clauses",
    "composite indexes for join+filter",
    "efficient group-by month/year",
    "pg_trgm for LIKE/regex",
    "VACUUM/ANALYZE and planner stats",
    "sort/aggregate spill and work_mem",
    "partial indexes and selective predicates",
    "CTEs vs subqueries performance",
    "Heap Only Tuples (HOT) updates",
    "Index-only scans",
    "BRIN indexes for time-series",
    "JSONB indexing and query performance",
    "EXPLAIN ANALYZE interpretation",
    "Connection pooling importance",
    "Postgres lock monitoring",
    "Autovacuum tuning",
    "Partitioning strategies",
    "Lateral joins",
];

/// Top-level Coachbot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CoachConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where ledgers and dedupe markers live.
    #[serde(default)]
    pub state: StateConfig,

    /// Calendar settings for the scheduled run.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Topic pool settings.
    #[serde(default)]
    pub topics: TopicsConfig,

    /// Slack delivery and interactive-action settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Interactive-action receiver settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Language-model settings for writing the daily tip.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Independently scheduled content streams.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

impl CoachConfig {
    /// Looks up a job by name.
    pub fn job(&self, name: &str) -> Option<&JobConfig> {
        self.jobs.iter().find(|job| job.name == name)
    }

    /// Renders the configuration as TOML, e.g. to print the effective defaults.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// State directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    /// Directory holding ledger and dedupe files. Created if absent.
    #[serde(default = "default_state_dir")]
    pub dir: String,

    /// Used when `dir` cannot be created (read-only file systems).
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,

    /// Skip a scheduled run that already posted today.
    #[serde(default = "default_dedupe_enabled")]
    pub dedupe_enabled: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
            fallback_dir: default_fallback_dir(),
            dedupe_enabled: default_dedupe_enabled(),
        }
    }
}

fn default_state_dir() -> String {
    "/state".to_string()
}

fn default_fallback_dir() -> String {
    std::env::temp_dir()
        .join("coachbot-state")
        .to_string_lossy()
        .into_owned()
}

fn default_dedupe_enabled() -> bool {
    true
}

/// Schedule configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// IANA time zone that decides which calendar day a run belongs to.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// How the topic pool is sourced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicMode {
    /// Built-in or per-job topic lists.
    #[default]
    Rotation,
    /// Topics read from the curriculum file.
    Curated,
}

/// Topic pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TopicsConfig {
    #[serde(default)]
    pub mode: TopicMode,

    /// YAML (`.yml`/`.yaml`) or TOML file with a top-level `topics` list, read in curated mode.
    #[serde(default = "default_curriculum_file")]
    pub curriculum_file: String,

    /// Pool used when a job has no topics of its own.
    #[serde(default = "default_topic_list")]
    pub defaults: Vec<String>,

    /// Number of next-topic candidates offered for voting.
    #[serde(default = "default_poll_size")]
    pub poll_size: usize,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            mode: TopicMode::default(),
            curriculum_file: default_curriculum_file(),
            defaults: default_topic_list(),
            poll_size: default_poll_size(),
        }
    }
}

fn default_curriculum_file() -> String {
    "/app/curriculum.yml".to_string()
}

fn default_topic_list() -> Vec<String> {
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}

fn default_poll_size() -> usize {
    3
}

/// How tips are delivered to Slack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlackMode {
    /// Incoming webhook; no message timestamp comes back.
    #[default]
    Webhook,
    /// `chat.postMessage` with a bot token.
    Bot,
}

/// Slack configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    #[serde(default)]
    pub mode: SlackMode,

    /// Incoming webhook URL (webhook mode).
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Bot token (`xoxb-...`), required in bot mode and for live tally updates.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Signing secret for verifying interactive requests. `None` disables verification.
    #[serde(default)]
    pub signing_secret: Option<String>,

    /// App-level token (`xapp-...`) for receiving actions over Socket Mode.
    #[serde(default)]
    pub app_token: Option<String>,

    /// Default channel for jobs that do not name one.
    #[serde(default)]
    pub channel_id: Option<String>,

    /// Web API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            mode: SlackMode::default(),
            webhook_url: None,
            bot_token: None,
            signing_secret: None,
            app_token: None,
            channel_id: None,
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

/// HTTP receiver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Anthropic Messages API settings for tip generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// API key. Falls back to the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Value of the `anthropic-version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Messages endpoint URL.
    #[serde(default = "default_generator_url")]
    pub api_url: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_version: default_api_version(),
            api_url: default_generator_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_generator_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_max_tokens() -> u32 {
    450
}

fn default_temperature() -> f32 {
    0.4
}

/// One independently scheduled content stream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Job name; part of every ledger and dedupe file name for this job.
    pub name: String,

    /// Destination channel. Falls back to `slack.channel_id`.
    #[serde(default)]
    pub channel: Option<String>,

    /// Bold title prepended to every post.
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    /// Topic pool for this job. Empty means the shared pool.
    #[serde(default)]
    pub topics: Vec<String>,
}

impl JobConfig {
    /// A job absent from the config file: default title, shared pool.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel: None,
            title_prefix: default_title_prefix(),
            topics: Vec::new(),
        }
    }

    /// The ledger scope of this job, resolving the channel against Slack defaults.
    pub fn scope(&self, slack: &SlackConfig) -> JobScope {
        JobScope::new(
            Some(self.name.clone()),
            self.channel.clone().or_else(|| slack.channel_id.clone()),
        )
    }
}

fn default_title_prefix() -> String {
    "Daily Postgres Coach".to_string()
}
