// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for ledger-backed integration tests.
//!
//! `TestHarness` owns a temp state directory, a [`LedgerStore`] over it, a
//! pinned clock, and a dedupe guard, so tests can record and tally votes
//! without touching the real filesystem layout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use coachbot_core::{Clock, CoachError, FixedClock, JobScope, VoteKind, VotePayload};
use coachbot_ledger::{DedupeGuard, LedgerStore, Tally, VoteRecorder};

/// 2026-02-06T12:00:00Z
pub const DEFAULT_EPOCH: i64 = 1_770_379_200;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    epoch: i64,
    dedupe_enabled: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
            dedupe_enabled: true,
        }
    }

    /// Pin the clock to these epoch seconds.
    pub fn at_epoch(mut self, epoch: i64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_dedupe(mut self, enabled: bool) -> Self {
        self.dedupe_enabled = enabled;
        self
    }

    pub fn build(self) -> Result<TestHarness, CoachError> {
        let temp_dir = tempfile::TempDir::new().map_err(CoachError::storage)?;
        let state_dir = temp_dir.path().join("state");
        std::fs::create_dir_all(&state_dir).map_err(CoachError::storage)?;

        Ok(TestHarness {
            store: Arc::new(LedgerStore::new(&state_dir)),
            clock: Arc::new(FixedClock::at_epoch(self.epoch)),
            dedupe: DedupeGuard::new(&state_dir, self.dedupe_enabled),
            state_dir,
            _temp_dir: temp_dir,
        })
    }
}

/// A temp state directory with the ledger pieces wired up.
pub struct TestHarness {
    pub store: Arc<LedgerStore>,
    pub clock: Arc<FixedClock>,
    pub dedupe: DedupeGuard,
    state_dir: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub fn new() -> Result<Self, CoachError> {
        Self::builder().build()
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// The clock as the trait object the gateway expects.
    pub fn clock_handle(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn recorder(&self) -> VoteRecorder<'_> {
        VoteRecorder::new(&self.store, self.clock.as_ref())
    }

    pub fn tally(&self) -> Tally<'_> {
        Tally::new(&self.store)
    }

    /// Record a vote, returning the ledger path it landed in.
    pub fn record(&self, payload: &VotePayload) -> Result<PathBuf, CoachError> {
        self.recorder().record_vote(payload)
    }

    /// Names of the files currently in the state directory, sorted.
    pub fn state_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.state_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Fluent builder for [`VotePayload`]s.
#[derive(Debug, Clone)]
pub struct VoteBuilder {
    payload: VotePayload,
}

impl VoteBuilder {
    pub fn new(user_id: &str, kind: VoteKind) -> Self {
        Self {
            payload: VotePayload::new(user_id, kind),
        }
    }

    pub fn thumbs_up(user_id: &str) -> Self {
        Self::new(user_id, VoteKind::ThumbsUp)
    }

    pub fn thumbs_down(user_id: &str) -> Self {
        Self::new(user_id, VoteKind::ThumbsDown)
    }

    pub fn nominate(user_id: &str, candidate: &str) -> Self {
        let mut builder = Self::new(user_id, VoteKind::TopicNomination);
        builder.payload.candidate = Some(candidate.to_string());
        builder
    }

    pub fn message(mut self, message_id: &str) -> Self {
        self.payload.message_id = Some(message_id.to_string());
        self
    }

    pub fn scope(mut self, job: &str, channel: &str) -> Self {
        self.payload.job = Some(job.to_string());
        self.payload.channel = Some(channel.to_string());
        self
    }

    pub fn job(mut self, job: &str) -> Self {
        self.payload.job = Some(job.to_string());
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.payload.send_date = Some(date.to_string());
        self
    }

    pub fn topic(mut self, topic: &str) -> Self {
        self.payload.topic = Some(topic.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.payload.user_name = Some(name.to_string());
        self
    }

    pub fn avatar(mut self, url: &str) -> Self {
        self.payload.user_avatar = Some(url.to_string());
        self
    }

    pub fn build(self) -> VotePayload {
        self.payload
    }
}

/// Scope shorthand for tests.
pub fn scope(job: &str, channel: &str) -> JobScope {
    JobScope::for_channel(job, channel)
}
