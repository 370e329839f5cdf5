// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the ledger, topic selector, and Slack collaborators.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Ledger key written by older deployments for votes that carried no
/// message id, timestamp, or topic.
pub const KEYLESS_LEDGER_KEY: &str = "None";

/// Which ledger a vote is persisted to.
///
/// The string form is the file name stem used on disk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum LedgerKind {
    /// Thumbs up / thumbs down feedback on a posted tip.
    #[strum(serialize = "feedback")]
    #[serde(rename = "feedback")]
    Feedback,
    /// Nominations for the next run's topic.
    #[strum(serialize = "votes")]
    #[serde(rename = "votes")]
    TopicVotes,
}

impl LedgerKind {
    /// Routes a vote kind to its ledger. Everything that is not thumbs feedback
    /// counts as topic voting.
    pub fn for_vote(kind: &VoteKind) -> Self {
        match kind {
            VoteKind::ThumbsUp | VoteKind::ThumbsDown => LedgerKind::Feedback,
            _ => LedgerKind::TopicVotes,
        }
    }

    /// File name stem for this ledger.
    pub fn file_stem(&self) -> &'static str {
        match self {
            LedgerKind::Feedback => "feedback",
            LedgerKind::TopicVotes => "votes",
        }
    }
}

/// Classification of a single vote event.
///
/// Serialized with the strings existing ledger files use. Strings this
/// version does not know about deserialize to [`VoteKind::Unknown`], which
/// no tally ever counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VoteKind {
    ThumbsUp,
    ThumbsDown,
    TopicNomination,
    Unknown(String),
}

impl VoteKind {
    pub fn as_str(&self) -> &str {
        match self {
            VoteKind::ThumbsUp => "thumbs_up",
            VoteKind::ThumbsDown => "thumbs_down",
            VoteKind::TopicNomination => "vote_next_topic",
            VoteKind::Unknown(raw) => raw,
        }
    }

    pub fn is_feedback(&self) -> bool {
        matches!(self, VoteKind::ThumbsUp | VoteKind::ThumbsDown)
    }
}

impl From<String> for VoteKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "thumbs_up" => VoteKind::ThumbsUp,
            "thumbs_down" => VoteKind::ThumbsDown,
            "vote_next_topic" => VoteKind::TopicNomination,
            _ => VoteKind::Unknown(raw),
        }
    }
}

impl From<VoteKind> for String {
    fn from(kind: VoteKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for VoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (job, channel) pair a ledger or dedupe marker is partitioned by.
///
/// Empty strings are normalized to `None`, so a blank channel behaves exactly
/// like a missing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobScope {
    job: Option<String>,
    channel: Option<String>,
}

impl JobScope {
    pub fn new(job: Option<String>, channel: Option<String>) -> Self {
        Self {
            job: non_empty(job),
            channel: non_empty(channel),
        }
    }

    /// Scope for a job posting to a specific channel.
    pub fn for_channel(job: impl Into<String>, channel: impl Into<String>) -> Self {
        Self::new(Some(job.into()), Some(channel.into()))
    }

    /// The legacy scope shared by every job and channel.
    pub fn unscoped() -> Self {
        Self::default()
    }

    pub fn job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }
}

impl std::fmt::Display for JobScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}",
            self.job().unwrap_or("-"),
            self.channel().unwrap_or("-")
        )
    }
}

/// One inbound vote, as produced by the interactive-action receiver.
///
/// Every optional field documents its default by being `None`; the ledger
/// decides what a missing value means. Field names on the wire match the
/// vote payloads earlier tooling produced, so scripts can pipe JSON straight
/// into `coachbot vote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePayload {
    /// Correlation key of the voted message.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Platform message timestamp, used as the key when `message_id` is absent.
    #[serde(default, rename = "ts")]
    pub platform_ts: Option<String>,
    /// Topic of the voted message; the key of last resort.
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Calendar date (`YYYY-MM-DD`) the voted message was sent on.
    #[serde(default, rename = "date")]
    pub send_date: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, rename = "user_image")]
    pub user_avatar: Option<String>,
    #[serde(rename = "vote")]
    pub kind: VoteKind,
    /// Nominated topic; only meaningful for [`VoteKind::TopicNomination`].
    #[serde(default)]
    pub candidate: Option<String>,
}

impl VotePayload {
    /// A payload with only the voter and the kind set.
    pub fn new(user_id: impl Into<String>, kind: VoteKind) -> Self {
        Self {
            message_id: None,
            platform_ts: None,
            topic: None,
            job: None,
            channel: None,
            send_date: None,
            user_id: user_id.into(),
            user_name: None,
            user_avatar: None,
            kind,
            candidate: None,
        }
    }

    pub fn scope(&self) -> JobScope {
        JobScope::new(self.job.clone(), self.channel.clone())
    }

    pub fn ledger_kind(&self) -> LedgerKind {
        LedgerKind::for_vote(&self.kind)
    }

    /// Key of the ledger entry this vote lands in.
    ///
    /// Falls back from the message id to the platform timestamp to the topic,
    /// so a vote is never dropped for lack of a key.
    pub fn ledger_key(&self) -> String {
        [&self.message_id, &self.platform_ts, &self.topic]
            .into_iter()
            .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(KEYLESS_LEDGER_KEY)
            .to_string()
    }
}

/// A voter avatar shown next to a tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRef {
    pub image_url: String,
    pub alt_text: String,
}

/// A message ready to hand to a [`MessagePublisher`](crate::MessagePublisher).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    /// Destination channel. Webhook delivery ignores it.
    pub channel: Option<String>,
    /// Plain-text fallback.
    pub text: String,
    /// Block Kit layout.
    pub blocks: serde_json::Value,
}

/// What the platform told us about a delivered message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Platform timestamp of the posted message, when the delivery mode reports one.
    pub ts: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
