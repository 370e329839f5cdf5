// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Everything a command needs once configuration is loaded.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use coachbot_anthropic::TipGenerator;
use coachbot_config::model::JobConfig;
use coachbot_config::CoachConfig;
use coachbot_core::{Clock, CoachError, JobScope, SystemClock};
use coachbot_ledger::{prepare_state_dir, DedupeGuard, LedgerStore, PreparedState};
use coachbot_slack::SlackClient;
use coachbot_topic::calendar::DATE_FORMAT;
use coachbot_topic::{TopicPool, TopicSelector};

use crate::ScopeArgs;

pub struct RunContext {
    pub config: CoachConfig,
    pub store: Arc<LedgerStore>,
    pub dedupe: DedupeGuard,
    pub clock: Arc<dyn Clock>,
}

impl RunContext {
    /// Prepare the state directory and wire the ledger against the system clock.
    pub fn prepare(config: CoachConfig) -> Self {
        let prepared = prepare_state_dir(
            Path::new(&config.state.dir),
            Path::new(&config.state.fallback_dir),
            config.state.dedupe_enabled,
        );
        Self::with_state(config, prepared, Arc::new(SystemClock))
    }

    pub fn with_state(config: CoachConfig, prepared: PreparedState, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(LedgerStore::new(&prepared.dir)),
            dedupe: DedupeGuard::new(&prepared.dir, prepared.dedupe_enabled),
            config,
            clock,
        }
    }

    /// The named job from config, or an ad-hoc job with defaults.
    pub fn job(&self, name: &str) -> JobConfig {
        self.config.job(name).cloned().unwrap_or_else(|| {
            debug!(job = name, "job not in config, using defaults");
            JobConfig::named(name)
        })
    }

    /// Scope for inspection commands. A job without `--channel` uses its
    /// configured channel.
    pub fn scope(&self, args: &ScopeArgs) -> JobScope {
        match (&args.job, &args.channel) {
            (Some(job), Some(channel)) => JobScope::for_channel(job, channel),
            (Some(job), None) => self.job(job).scope(&self.config.slack),
            (None, channel) => JobScope::new(None, channel.clone()),
        }
    }

    /// `override_date` when given and well formed, else today in the
    /// configured timezone.
    pub fn today(&self, override_date: Option<&str>) -> Result<String, CoachError> {
        match override_date {
            Some(date) => NaiveDate::parse_from_str(date, DATE_FORMAT)
                .map(|d| d.format(DATE_FORMAT).to_string())
                .map_err(|e| CoachError::InvalidPayload(format!("invalid date `{date}`: {e}"))),
            None => Ok(coachbot_topic::today(
                &self.config.schedule.timezone,
                self.clock.now(),
            )),
        }
    }

    pub fn selector(&self, job: &JobConfig) -> TopicSelector<'_> {
        TopicSelector::new(&self.store, TopicPool::resolve(&self.config.topics, Some(job)))
    }

    /// A Slack client that has what its mode needs to post.
    /// The language-model client for `run`, from the `[generator]` section.
    pub fn generator(&self) -> Result<TipGenerator, CoachError> {
        TipGenerator::from_config(&self.config.generator)
    }

    pub fn publisher(&self) -> Result<SlackClient, CoachError> {
        let client = SlackClient::from_config(&self.config.slack)?;
        client.ensure_can_publish()?;
        Ok(client)
    }
}

/// A context over a temp state dir, clock pinned to 2026-02-06T23:30:00Z.
#[cfg(test)]
pub(crate) fn fixture(config: CoachConfig) -> (RunContext, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let prepared = PreparedState {
        dir: dir.path().to_path_buf(),
        dedupe_enabled: true,
    };
    let clock = Arc::new(coachbot_core::FixedClock::at_epoch(1_770_420_600));
    (RunContext::with_state(config, prepared, clock), dir)
}
