// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upserting votes into the feedback and topic-vote ledgers.

use std::path::PathBuf;

use tracing::{debug, info};

use coachbot_core::{Clock, CoachError, VotePayload};

use crate::model::{LedgerEntry, VoteRecord};
use crate::store::LedgerStore;

/// Records votes against a [`LedgerStore`] using a [`Clock`] for timestamps.
pub struct VoteRecorder<'a> {
    store: &'a LedgerStore,
    clock: &'a dyn Clock,
}

impl<'a> VoteRecorder<'a> {
    pub fn new(store: &'a LedgerStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Insert or replace the voter's record on the payload's entry.
    ///
    /// Thumbs votes go to the feedback ledger, everything else to the topic
    /// ledger. A voter keeps exactly one record per entry: a repeat vote
    /// overwrites kind, candidate and timestamp, and the avatar only when the
    /// new payload carries one. The stored display name is never changed.
    ///
    /// Returns the path of the ledger that was written.
    pub fn record_vote(&self, payload: &VotePayload) -> Result<PathBuf, CoachError> {
        let path = self.store.path_for(payload.ledger_kind(), &payload.scope());
        let key = payload.ledger_key();
        let now = self.clock.epoch_seconds();

        let replaced = self.store.update(&path, |ledger| {
            let entry = ledger
                .entry(key.clone())
                .or_insert_with(|| LedgerEntry::from_payload(payload));
            upsert_vote(entry, payload, now)
        })?;

        info!(
            key = %key,
            user = %payload.user_id,
            vote = %payload.kind,
            scope = %payload.scope(),
            replaced,
            "vote recorded"
        );
        Ok(path)
    }

    /// Attach an avatar URL to every existing record of `user_id` on the
    /// payload's entry. Does nothing when the entry or the voter is absent,
    /// and never creates either.
    ///
    /// Returns whether any record changed.
    pub fn set_avatar(
        &self,
        payload: &VotePayload,
        user_id: &str,
        image_url: &str,
    ) -> Result<bool, CoachError> {
        if image_url.is_empty() {
            return Ok(false);
        }
        let path = self.store.path_for(payload.ledger_kind(), &payload.scope());
        if !path.exists() {
            return Ok(false);
        }
        let key = payload.ledger_key();

        let changed = self.store.update(&path, |ledger| {
            let Some(entry) = ledger.get_mut(&key) else {
                return false;
            };
            let mut changed = false;
            for vote in entry.votes.iter_mut().filter(|v| v.user_id == user_id) {
                vote.user_avatar = Some(image_url.to_string());
                changed = true;
            }
            changed
        })?;

        debug!(key = %key, user = %user_id, changed, "avatar update");
        Ok(changed)
    }
}

/// Returns true when an existing record was overwritten.
fn upsert_vote(entry: &mut LedgerEntry, payload: &VotePayload, now: i64) -> bool {
    let avatar = payload.user_avatar.as_deref().filter(|a| !a.is_empty());
    let mut replaced = false;

    for vote in entry
        .votes
        .iter_mut()
        .filter(|v| v.user_id == payload.user_id)
    {
        vote.kind = payload.kind.clone();
        vote.candidate = payload.candidate.clone();
        vote.recorded_at = now;
        if let Some(avatar) = avatar {
            vote.user_avatar = Some(avatar.to_string());
        }
        replaced = true;
    }

    if !replaced {
        entry.votes.push(VoteRecord {
            user_id: payload.user_id.clone(),
            user_name: payload.user_name.clone(),
            user_avatar: avatar.map(str::to_string),
            kind: payload.kind.clone(),
            candidate: payload.candidate.clone(),
            recorded_at: now,
        });
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachbot_core::{FixedClock, JobScope, LedgerKind, VoteKind, KEYLESS_LEDGER_KEY};

    fn thumbs(user: &str, kind: VoteKind) -> VotePayload {
        let mut p = VotePayload::new(user, kind);
        p.message_id = Some("m1".into());
        p.job = Some("pg".into());
        p.channel = Some("C1".into());
        p.topic = Some("indexes".into());
        p
    }

    #[test]
    fn first_vote_creates_entry_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let clock = FixedClock::at_epoch(1_000);
        let recorder = VoteRecorder::new(&store, &clock);

        let mut payload = thumbs("U1", VoteKind::ThumbsUp);
        payload.user_name = Some("ann".into());
        payload.send_date = Some("2024-05-01".into());
        let path = recorder.record_vote(&payload).unwrap();
        assert!(path.ends_with("feedback_pg_C1.json"));

        let ledger = store.load(&path);
        let entry = &ledger["m1"];
        assert_eq!(entry.topic.as_deref(), Some("indexes"));
        assert_eq!(entry.job.as_deref(), Some("pg"));
        assert_eq!(entry.send_date.as_deref(), Some("2024-05-01"));
        assert_eq!(entry.votes.len(), 1);
        assert_eq!(entry.votes[0].recorded_at, 1_000);
        assert_eq!(entry.votes[0].user_name.as_deref(), Some("ann"));
    }

    #[test]
    fn repeat_vote_replaces_but_keeps_name_and_avatar() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());

        let mut first = thumbs("U1", VoteKind::ThumbsUp);
        first.user_name = Some("ann".into());
        first.user_avatar = Some("http://img/ann".into());
        VoteRecorder::new(&store, &FixedClock::at_epoch(10))
            .record_vote(&first)
            .unwrap();

        let mut second = thumbs("U1", VoteKind::ThumbsDown);
        second.user_name = Some("renamed".into());
        let path = VoteRecorder::new(&store, &FixedClock::at_epoch(20))
            .record_vote(&second)
            .unwrap();

        let ledger = store.load(&path);
        let votes = &ledger["m1"].votes;
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].kind, VoteKind::ThumbsDown);
        assert_eq!(votes[0].recorded_at, 20);
        assert_eq!(votes[0].user_name.as_deref(), Some("ann"));
        assert_eq!(votes[0].user_avatar.as_deref(), Some("http://img/ann"));
    }

    #[test]
    fn nominations_go_to_the_topic_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let clock = FixedClock::at_epoch(1);
        let recorder = VoteRecorder::new(&store, &clock);

        let mut payload = thumbs("U1", VoteKind::TopicNomination);
        payload.candidate = Some("vacuum".into());
        let path = recorder.record_vote(&payload).unwrap();
        assert_eq!(
            path,
            store.path_for(LedgerKind::TopicVotes, &JobScope::for_channel("pg", "C1"))
        );
        assert!(!store
            .path_for(LedgerKind::Feedback, &JobScope::for_channel("pg", "C1"))
            .exists());
        assert_eq!(store.load(&path)["m1"].votes[0].candidate.as_deref(), Some("vacuum"));
    }

    #[test]
    fn key_falls_back_to_ts_then_topic_then_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let clock = FixedClock::at_epoch(1);
        let recorder = VoteRecorder::new(&store, &clock);

        let mut by_ts = VotePayload::new("U1", VoteKind::ThumbsUp);
        by_ts.platform_ts = Some("1700.01".into());
        by_ts.topic = Some("indexes".into());
        recorder.record_vote(&by_ts).unwrap();

        let mut by_topic = VotePayload::new("U1", VoteKind::ThumbsUp);
        by_topic.topic = Some("indexes".into());
        recorder.record_vote(&by_topic).unwrap();

        let keyless = VotePayload::new("U1", VoteKind::ThumbsUp);
        let path = recorder.record_vote(&keyless).unwrap();

        let ledger = store.load(&path);
        assert!(path.ends_with("feedback.json"));
        assert!(ledger.contains_key("1700.01"));
        assert!(ledger.contains_key("indexes"));
        assert!(ledger.contains_key(KEYLESS_LEDGER_KEY));
    }

    #[test]
    fn set_avatar_updates_existing_voter_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let clock = FixedClock::at_epoch(1);
        let recorder = VoteRecorder::new(&store, &clock);

        let payload = thumbs("U1", VoteKind::ThumbsUp);
        assert!(!recorder.set_avatar(&payload, "U1", "http://img").unwrap());

        let path = recorder.record_vote(&payload).unwrap();
        assert!(recorder.set_avatar(&payload, "U1", "http://img").unwrap());
        assert!(!recorder.set_avatar(&payload, "U2", "http://img").unwrap());
        assert!(!recorder.set_avatar(&payload, "U1", "").unwrap());

        let ledger = store.load(&path);
        assert_eq!(ledger["m1"].votes.len(), 1);
        assert_eq!(ledger["m1"].votes[0].user_avatar.as_deref(), Some("http://img"));
    }

    #[test]
    fn set_avatar_on_unknown_entry_writes_nothing_new() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let clock = FixedClock::at_epoch(1);
        let recorder = VoteRecorder::new(&store, &clock);
        let path = recorder.record_vote(&thumbs("U1", VoteKind::ThumbsUp)).unwrap();

        let mut other = thumbs("U1", VoteKind::ThumbsUp);
        other.message_id = Some("m2".into());
        assert!(!recorder.set_avatar(&other, "U1", "http://img").unwrap());
        assert!(!store.load(&path).contains_key("m2"));
    }

    #[test]
    fn recording_keeps_legacy_entries_with_null_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path());
        let clock = FixedClock::at_epoch(10);
        let path = store.path_for(LedgerKind::TopicVotes, &JobScope::unscoped());
        std::fs::write(
            &path,
            r#"{"old": {"topic": "vacuum", "votes": [{"user_id": null, "vote": "thumbs_up", "timestamp": 1}]}}"#,
        )
        .unwrap();

        let mut nomination = VotePayload::new("U2", VoteKind::TopicNomination);
        nomination.message_id = Some("new".into());
        nomination.candidate = Some("wal".into());
        VoteRecorder::new(&store, &clock).record_vote(&nomination).unwrap();

        let ledger = store.load(&path);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger["old"].votes[0].kind, VoteKind::ThumbsUp);
        assert_eq!(ledger["old"].votes[0].recorded_at, 1);
        assert_eq!(ledger["new"].votes[0].candidate.as_deref(), Some("wal"));
    }
}
