// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only aggregation over the ledgers.
//!
//! Nothing here returns an error. Store failures are logged by the store and
//! show up as zero counts or no winner.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use coachbot_core::{AvatarRef, JobScope, LedgerKind, VoteKind};

use crate::model::VoteRecord;
use crate::store::LedgerStore;

/// Most avatars shown next to a tally.
pub const MAX_RECENT_AVATARS: usize = 3;

/// Alt text for avatars whose voter never gave a name.
const DEFAULT_ALT_TEXT: &str = "User";

/// Thumbs tally for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackCounts {
    pub thumbs_up: usize,
    pub thumbs_down: usize,
    /// Every record on the entry, whatever its kind.
    pub total: usize,
    pub recent_avatars: Vec<AvatarRef>,
}

/// Nomination tally for one poll option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollOption {
    pub count: usize,
    pub recent_avatars: Vec<AvatarRef>,
}

/// Candidate to its tally.
pub type PollTally = BTreeMap<String, PollOption>;

pub struct Tally<'a> {
    store: &'a LedgerStore,
}

impl<'a> Tally<'a> {
    pub fn new(store: &'a LedgerStore) -> Self {
        Self { store }
    }

    pub fn feedback_counts(&self, message_id: &str, scope: &JobScope) -> FeedbackCounts {
        let path = self.store.path_for(LedgerKind::Feedback, scope);
        let ledger = self.store.load(&path);
        let Some(entry) = ledger.get(message_id) else {
            return FeedbackCounts::default();
        };

        let count = |kind: &VoteKind| entry.votes.iter().filter(|v| &v.kind == kind).count();
        FeedbackCounts {
            thumbs_up: count(&VoteKind::ThumbsUp),
            thumbs_down: count(&VoteKind::ThumbsDown),
            total: entry.votes.len(),
            recent_avatars: recent_avatars(&entry.votes),
        }
    }

    /// Tally nominations on one message for each requested candidate.
    ///
    /// Every requested candidate is present in the result, with zero votes
    /// when nobody picked it. Matching is exact.
    pub fn poll_details(
        &self,
        message_id: &str,
        candidates: &[String],
        scope: &JobScope,
    ) -> PollTally {
        let path = self.store.path_for(LedgerKind::TopicVotes, scope);
        let ledger = self.store.load(&path);
        let votes = ledger
            .get(message_id)
            .map(|entry| entry.votes.as_slice())
            .unwrap_or_default();

        candidates
            .iter()
            .map(|candidate| {
                let matching: Vec<&VoteRecord> = votes
                    .iter()
                    .filter(|v| {
                        v.kind == VoteKind::TopicNomination
                            && v.candidate.as_deref() == Some(candidate.as_str())
                    })
                    .collect();
                let option = PollOption {
                    count: matching.len(),
                    recent_avatars: recent_avatars(matching),
                };
                (candidate.clone(), option)
            })
            .collect()
    }

    /// The most nominated candidate across every entry sent on `send_date`.
    ///
    /// Scope only picks the ledger file; entries are not filtered by their
    /// own job/channel fields. Ties go to the alphabetically first candidate.
    pub fn winning_next_topic(&self, send_date: &str, scope: &JobScope) -> Option<String> {
        let path = self.store.path_for(LedgerKind::TopicVotes, scope);
        let ledger = self.store.load(&path);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in ledger
            .values()
            .filter(|e| e.send_date.as_deref() == Some(send_date))
        {
            for vote in entry
                .votes
                .iter()
                .filter(|v| v.kind == VoteKind::TopicNomination)
            {
                if let Some(candidate) = vote.candidate.as_deref().filter(|c| !c.is_empty()) {
                    *counts.entry(candidate).or_default() += 1;
                }
            }
        }

        counts
            .into_iter()
            .min_by(|(a_name, a_count), (b_name, b_count)| {
                b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
            })
            .map(|(name, _)| name.to_string())
    }
}

/// Up to [`MAX_RECENT_AVATARS`] avatars, newest vote first, one per user.
///
/// Records without a user id or avatar are skipped. Equal timestamps keep
/// ledger order.
pub fn recent_avatars<'v>(votes: impl IntoIterator<Item = &'v VoteRecord>) -> Vec<AvatarRef> {
    let mut sorted: Vec<&VoteRecord> = votes.into_iter().collect();
    sorted.sort_by_key(|v| Reverse(v.recorded_at));

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter_map(|v| {
            let image = v.user_avatar.as_deref().filter(|a| !a.is_empty())?;
            if v.user_id.is_empty() || !seen.insert(v.user_id.as_str()) {
                return None;
            }
            Some(AvatarRef {
                image_url: image.to_string(),
                alt_text: v
                    .user_name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| DEFAULT_ALT_TEXT.to_string()),
            })
        })
        .take(MAX_RECENT_AVATARS)
        .collect()
}
