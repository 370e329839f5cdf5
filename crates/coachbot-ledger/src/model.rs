// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk ledger records.
//!
//! Every field is optional and `null` reads as absent, so files written by
//! older deployments keep loading. Field names are the ones already on disk.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use coachbot_core::{VoteKind, VotePayload};

/// A ledger file: entry key to entry.
pub type LedgerFile = BTreeMap<String, LedgerEntry>;

/// The votes gathered for one posted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, rename = "date")]
    pub send_date: Option<String>,
    /// At most one record per user id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub votes: Vec<VoteRecord>,
}

impl LedgerEntry {
    /// A new, vote-less entry carrying the payload's metadata.
    pub fn from_payload(payload: &VotePayload) -> Self {
        Self {
            message_id: payload.message_id.clone(),
            topic: payload.topic.clone(),
            job: payload.job.clone(),
            channel: payload.channel.clone(),
            send_date: payload.send_date.clone(),
            votes: Vec::new(),
        }
    }

    pub fn vote_of(&self, user_id: &str) -> Option<&VoteRecord> {
        self.votes.iter().find(|v| v.user_id == user_id)
    }
}

/// One user's current vote on an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    /// Empty when the platform omitted the voter.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, rename = "user_image")]
    pub user_avatar: Option<String>,
    #[serde(rename = "vote", default = "unknown_kind", deserialize_with = "kind_or_unknown")]
    pub kind: VoteKind,
    #[serde(default)]
    pub candidate: Option<String>,
    /// Epoch seconds of the most recent upsert.
    #[serde(default, rename = "timestamp", deserialize_with = "null_as_default")]
    pub recorded_at: i64,
}

fn unknown_kind() -> VoteKind {
    VoteKind::Unknown(String::new())
}

fn kind_or_unknown<'de, D>(deserializer: D) -> Result<VoteKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<VoteKind>::deserialize(deserializer)?.unwrap_or_else(unknown_kind))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
