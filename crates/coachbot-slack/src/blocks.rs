// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Block Kit layout for the daily post and its vote counters.

use serde_json::{json, Value};

use coachbot_core::{AvatarRef, OutboundMessage};
use coachbot_ledger::FeedbackCounts;

use crate::interaction::{ActionMeta, NEXT_TOPIC_ACTION_PREFIX, THUMBS_DOWN_ACTION, THUMBS_UP_ACTION};

/// Plain-text fallback: bold title, blank line, body.
pub fn fallback_text(title: &str, body: &str) -> String {
    format!("*{title}*\n\n{body}")
}

/// The daily post: title, body, feedback buttons, optional next-topic poll,
/// and a zeroed count line.
pub fn daily_message(
    channel: Option<String>,
    title: &str,
    body: &str,
    meta: &ActionMeta,
    candidates: &[String],
) -> OutboundMessage {
    let mut blocks = vec![
        json!({
            "type": "header",
            "text": {"type": "plain_text", "text": title, "emoji": true}
        }),
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": body}
        }),
        feedback_actions(meta),
    ];
    if !candidates.is_empty() {
        blocks.push(json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": "*Vote for tomorrow's topic:*"}
        }));
        blocks.push(next_topic_actions(meta, candidates));
    }
    blocks.push(count_block(&FeedbackCounts::default()));

    OutboundMessage {
        channel,
        text: fallback_text(title, body),
        blocks: Value::Array(blocks),
    }
}

pub fn feedback_actions(meta: &ActionMeta) -> Value {
    let value = meta.to_value();
    json!({
        "type": "actions",
        "block_id": "feedback",
        "elements": [
            button(THUMBS_UP_ACTION, "⬆️", &value),
            button(THUMBS_DOWN_ACTION, "⬇️", &value),
        ]
    })
}

/// One button per candidate, each with its own action id and the candidate
/// in its metadata.
pub fn next_topic_actions(meta: &ActionMeta, candidates: &[String]) -> Value {
    let elements: Vec<Value> = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            button(
                &format!("{NEXT_TOPIC_ACTION_PREFIX}_{i}"),
                candidate,
                &meta.with_candidate(candidate).to_value(),
            )
        })
        .collect();
    json!({
        "type": "actions",
        "block_id": "next_topic",
        "elements": elements
    })
}

fn button(action_id: &str, label: &str, value: &str) -> Value {
    json!({
        "type": "button",
        "action_id": action_id,
        "text": {"type": "plain_text", "text": label, "emoji": true},
        "value": value
    })
}

/// `⬆️ {up}   ⬇️ {down}  total: {total}` followed by voter avatars.
pub fn count_text(counts: &FeedbackCounts) -> String {
    format!(
        "⬆️ {}   ⬇️ {}  total: {}",
        counts.thumbs_up, counts.thumbs_down, counts.total
    )
}

pub fn count_block(counts: &FeedbackCounts) -> Value {
    let mut elements = vec![json!({"type": "mrkdwn", "text": count_text(counts)})];
    elements.extend(counts.recent_avatars.iter().map(avatar_element));
    json!({"type": "context", "elements": elements})
}

fn avatar_element(avatar: &AvatarRef) -> Value {
    json!({
        "type": "image",
        "image_url": avatar.image_url,
        "alt_text": avatar.alt_text
    })
}

/// Replace a trailing context block with `count`, or append it.
pub fn replace_count_block(mut blocks: Vec<Value>, count: Value) -> Vec<Value> {
    let trailing_context = blocks
        .last()
        .and_then(|b| b.get("type"))
        .and_then(Value::as_str)
        == Some("context");
    if trailing_context {
        blocks.pop();
    }
    blocks.push(count);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(up: usize, down: usize) -> FeedbackCounts {
        FeedbackCounts {
            thumbs_up: up,
            thumbs_down: down,
            total: up + down,
            recent_avatars: vec![AvatarRef {
                image_url: "http://img/u1".into(),
                alt_text: "ann".into(),
            }],
        }
    }

    #[test]
    fn count_text_format() {
        assert_eq!(count_text(&counts(1, 2)), "⬆️ 1   ⬇️ 2  total: 3");
    }

    #[test]
    fn count_block_carries_avatars() {
        let block = count_block(&counts(1, 0));
        assert_eq!(block["type"], "context");
        assert_eq!(block["elements"][1]["type"], "image");
        assert_eq!(block["elements"][1]["alt_text"], "ann");
    }

    #[test]
    fn replace_swaps_trailing_context() {
        let blocks = vec![json!({"type": "section"}), json!({"type": "context", "elements": []})];
        let out = replace_count_block(blocks, count_block(&counts(2, 0)));
        assert_eq!(out.len(), 2);
        assert_eq!(out[1]["elements"][0]["text"], "⬆️ 2   ⬇️ 0  total: 2");
    }

    #[test]
    fn replace_appends_otherwise() {
        let blocks = vec![json!({"type": "section"})];
        let out = replace_count_block(blocks, count_block(&counts(0, 1)));
        assert_eq!(out.len(), 2);

        let out = replace_count_block(Vec::new(), count_block(&counts(0, 1)));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn daily_message_layout() {
        let meta = ActionMeta {
            message_id: Some("m1".into()),
            ..ActionMeta::default()
        };
        let candidates = vec!["vacuum".to_string(), "wal".to_string()];
        let msg = daily_message(Some("C1".into()), "Coach", "Use indexes.", &meta, &candidates);

        assert_eq!(msg.text, "*Coach*\n\nUse indexes.");
        let blocks = msg.blocks.as_array().unwrap();
        assert_eq!(blocks.len(), 6);
        assert_eq!(blocks[2]["elements"][0]["action_id"], "thumbs_up");
        assert_eq!(blocks[4]["elements"][1]["action_id"], "vote_next_topic_1");
        let value = blocks[4]["elements"][1]["value"].as_str().unwrap();
        assert_eq!(
            ActionMeta::from_value(Some(value)).candidate.as_deref(),
            Some("wal")
        );
        assert_eq!(blocks[5]["type"], "context");
    }

    #[test]
    fn daily_message_without_poll() {
        let msg = daily_message(None, "Coach", "tip", &ActionMeta::default(), &[]);
        assert_eq!(msg.blocks.as_array().unwrap().len(), 4);
    }
}
