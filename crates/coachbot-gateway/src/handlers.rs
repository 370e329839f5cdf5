// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles GET /health and POST /slack/actions, plus the vote path shared
//! with the Socket Mode receiver.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use coachbot_core::{CoachError, VotePayload};
use coachbot_ledger::{Tally, VoteRecorder};
use coachbot_slack::blocks::{count_block, replace_count_block};
use coachbot_slack::{InteractionPayload, SlackClient};

use crate::server::GatewayState;

/// Text of the acknowledgement shown to the voter.
pub const VOTE_ACK_TEXT: &str = "Thanks — your vote was recorded.";

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Ephemeral acknowledgement returned to Slack.
#[derive(Debug, Serialize)]
pub struct ActionAck {
    pub response_type: &'static str,
    pub replace_original: bool,
    pub text: &'static str,
}

impl ActionAck {
    fn recorded() -> Self {
        Self {
            response_type: "ephemeral",
            replace_original: false,
            text: VOTE_ACK_TEXT,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

#[derive(Debug, Deserialize)]
struct ActionForm {
    #[serde(default)]
    payload: Option<String>,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// POST /slack/actions
///
/// Records the vote and acknowledges it. The acknowledgement is sent even
/// when the ledger write fails, so Slack never shows the voter an error for
/// a storage problem. With a bot client configured, avatar lookup, the
/// ephemeral confirmation, and the count refresh run in the background.
pub async fn post_slack_actions(State(state): State<GatewayState>, body: Bytes) -> Response {
    let interaction = match parse_interaction(&body) {
        Ok(interaction) => interaction,
        Err(e) => return bad_request(e),
    };
    match accept_interaction(&state, interaction).await {
        Ok(_) => Json(ActionAck::recorded()).into_response(),
        Err(e) => bad_request(e),
    }
}

/// Turn a click into a vote, record it, and schedule the Slack follow-ups.
///
/// Shared by the HTTP endpoint and the Socket Mode receiver. Fails only when
/// the payload is not a usable vote; a failed ledger write is logged.
pub async fn accept_interaction(
    state: &GatewayState,
    interaction: InteractionPayload,
) -> Result<VotePayload, CoachError> {
    let vote = interaction.to_vote()?;

    if let Err(e) = record_blocking(state, vote.clone()).await {
        error!(error = %e, key = %vote.ledger_key(), "failed to record vote");
    }

    if let Some(slack) = state.slack.clone() {
        let state = state.clone();
        let spawned = vote.clone();
        tokio::spawn(async move {
            follow_up(state, slack, interaction, spawned).await;
        });
    }
    Ok(vote)
}

fn parse_interaction(body: &[u8]) -> Result<InteractionPayload, CoachError> {
    let form: ActionForm = serde_urlencoded::from_bytes(body)
        .map_err(|e| CoachError::InvalidPayload(format!("malformed form body: {e}")))?;
    let raw = form
        .payload
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| CoachError::InvalidPayload("missing payload field".into()))?;
    InteractionPayload::parse(&raw)
}

fn bad_request(e: CoachError) -> Response {
    warn!(error = %e, "rejecting interactive payload");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            ok: false,
            error: e.to_string(),
        }),
    )
        .into_response()
}

async fn record_blocking(state: &GatewayState, vote: VotePayload) -> Result<(), CoachError> {
    let store = state.store.clone();
    let clock = state.clock.clone();
    tokio::task::spawn_blocking(move || {
        VoteRecorder::new(&store, clock.as_ref())
            .record_vote(&vote)
            .map(|_| ())
    })
    .await
    .map_err(|e| CoachError::Internal(format!("vote task panicked: {e}")))?
}

/// Best-effort Slack side effects after a vote. Failures are logged only.
async fn follow_up(
    state: GatewayState,
    slack: SlackClient,
    interaction: InteractionPayload,
    vote: VotePayload,
) {
    match slack.user_avatar(&vote.user_id).await {
        Ok(Some(avatar)) => {
            let store = state.store.clone();
            let clock = state.clock.clone();
            let vote = vote.clone();
            let result = tokio::task::spawn_blocking(move || {
                VoteRecorder::new(&store, clock.as_ref()).set_avatar(&vote, &vote.user_id, &avatar)
            })
            .await;
            match result {
                Ok(Ok(changed)) => debug!(changed, "stored voter avatar"),
                Ok(Err(e)) => warn!(error = %e, "failed to store voter avatar"),
                Err(e) => warn!(error = %e, "avatar task panicked"),
            }
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, user = %vote.user_id, "avatar lookup failed"),
    }

    let Some(channel) = interaction.channel_id().map(str::to_string) else {
        debug!("no channel on interaction, skipping confirmation and refresh");
        return;
    };

    if let Err(e) = slack
        .post_ephemeral(&channel, &vote.user_id, VOTE_ACK_TEXT)
        .await
    {
        warn!(error = %e, "failed to send ephemeral confirmation");
    }

    if !vote.kind.is_feedback() {
        return;
    }
    let Some(ts) = interaction.message_ts().map(str::to_string) else {
        return;
    };

    let store = state.store.clone();
    let key = vote.ledger_key();
    let scope = vote.scope();
    let counts = match tokio::task::spawn_blocking(move || {
        Tally::new(&store).feedback_counts(&key, &scope)
    })
    .await
    {
        Ok(counts) => counts,
        Err(e) => {
            warn!(error = %e, "count task panicked");
            return;
        }
    };

    let blocks = replace_count_block(interaction.message_blocks(), count_block(&counts));
    match slack.update_message(&channel, &ts, &blocks).await {
        Ok(()) => info!(
            channel = %channel,
            ts = %ts,
            up = counts.thumbs_up,
            down = counts.thumbs_down,
            "refreshed vote counts"
        ),
        Err(e) => warn!(error = %e, "failed to update original message with counts"),
    }
}
