// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive `block_actions` payloads and the metadata carried in button values.
//!
//! Slack posts the payload as JSON in the `payload` form field. Only the
//! fields Coachbot reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};

use coachbot_core::{CoachError, VoteKind, VotePayload};

/// Action id of the upvote button.
pub const THUMBS_UP_ACTION: &str = "thumbs_up";
/// Action id of the downvote button.
pub const THUMBS_DOWN_ACTION: &str = "thumbs_down";
/// Prefix shared by all next-topic buttons; Slack needs a unique id per button.
pub const NEXT_TOPIC_ACTION_PREFIX: &str = "vote_next_topic";

/// JSON stored in a button's `value`, identifying the message being voted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,
    /// Older buttons carried the message timestamp here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

impl ActionMeta {
    /// Parse a button value; anything unparsable is empty metadata.
    pub fn from_value(value: Option<&str>) -> Self {
        value
            .filter(|v| !v.is_empty())
            .and_then(|v| serde_json::from_str(v).ok())
            .unwrap_or_default()
    }

    /// Button value for this metadata.
    pub fn to_value(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn with_candidate(&self, candidate: &str) -> Self {
        Self {
            candidate: Some(candidate.to_string()),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionPayload {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub user: SlackUser,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
    #[serde(default)]
    pub container: Container,
    #[serde(default)]
    pub channel: Option<ChannelRef>,
    #[serde(default)]
    pub message: Option<SlackMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockAction {
    #[serde(default)]
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub message_ts: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelRef {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackMessage {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub blocks: Vec<serde_json::Value>,
}

/// Classify a button by its action id.
pub fn vote_kind_for_action(action_id: &str) -> Option<VoteKind> {
    match action_id {
        THUMBS_UP_ACTION => Some(VoteKind::ThumbsUp),
        THUMBS_DOWN_ACTION => Some(VoteKind::ThumbsDown),
        id if id.starts_with(NEXT_TOPIC_ACTION_PREFIX) => Some(VoteKind::TopicNomination),
        _ => None,
    }
}

impl InteractionPayload {
    /// Parse the JSON carried in the `payload` form field.
    pub fn parse(raw: &str) -> Result<Self, CoachError> {
        serde_json::from_str(raw)
            .map_err(|e| CoachError::InvalidPayload(format!("payload is not valid JSON: {e}")))
    }

    /// Parse a payload already decoded from a Socket Mode envelope.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoachError> {
        serde_json::from_value(value)
            .map_err(|e| CoachError::InvalidPayload(format!("payload has unexpected shape: {e}")))
    }

    /// Whether this is a button click, as opposed to a modal or shortcut.
    pub fn is_block_actions(&self) -> bool {
        self.kind.as_deref().is_none_or(|k| k == "block_actions")
    }

    /// Timestamp of the message holding the buttons.
    pub fn message_ts(&self) -> Option<&str> {
        non_empty(self.container.message_ts.as_deref())
            .or_else(|| non_empty(self.message.as_ref().and_then(|m| m.ts.as_deref())))
    }

    /// Channel the buttons were clicked in.
    pub fn channel_id(&self) -> Option<&str> {
        non_empty(self.channel.as_ref().and_then(|c| c.id.as_deref()))
            .or_else(|| non_empty(self.container.channel_id.as_deref()))
    }

    /// Blocks of the original message, empty when Slack did not include it.
    pub fn message_blocks(&self) -> Vec<serde_json::Value> {
        self.message
            .as_ref()
            .map(|m| m.blocks.clone())
            .unwrap_or_default()
    }

    /// Turn the first action into a vote.
    ///
    /// Metadata missing from the button value is filled from the
    /// surrounding payload: the message timestamp stands in for the message
    /// id. The click's channel stands in for the posting channel only on
    /// buttons without a job; a job's buttons name exactly the ledger scope
    /// the post was made under, channel or not.
    pub fn to_vote(&self) -> Result<VotePayload, CoachError> {
        let action = self
            .actions
            .first()
            .ok_or_else(|| CoachError::InvalidPayload("no actions in payload".into()))?;
        let kind = vote_kind_for_action(&action.action_id).ok_or_else(|| {
            CoachError::InvalidPayload(format!("unrecognized action `{}`", action.action_id))
        })?;
        let user_id = non_empty(self.user.id.as_deref())
            .ok_or_else(|| CoachError::InvalidPayload("payload has no user id".into()))?;

        let meta = ActionMeta::from_value(action.value.as_deref());
        let message_ts = self.message_ts().map(str::to_string);

        let mut vote = VotePayload::new(user_id, kind);
        vote.message_id = meta
            .message_id
            .filter(|m| !m.is_empty())
            .or_else(|| message_ts.clone())
            .or(meta.ts);
        vote.platform_ts = message_ts;
        let meta_channel = meta.channel.filter(|c| !c.is_empty());
        vote.channel = match meta.job.as_deref() {
            Some(job) if !job.is_empty() => meta_channel,
            _ => meta_channel.or_else(|| self.channel_id().map(str::to_string)),
        };
        vote.topic = meta.topic;
        vote.job = meta.job;
        vote.send_date = meta.date;
        vote.user_name = non_empty(self.user.username.as_deref())
            .or_else(|| non_empty(self.user.name.as_deref()))
            .map(str::to_string);
        vote.candidate = meta.candidate;
        Ok(vote)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
