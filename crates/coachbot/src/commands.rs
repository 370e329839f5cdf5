// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled-run and ledger inspection commands.
//!
//! A daily run is dedupe check, topic selection, generation, post, and
//! marking the job as sent. `run` does all of it in one process; `topic` and
//! `post` split it for schedulers that generate content elsewhere.

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info};

use coachbot_config::CoachConfig;
use coachbot_core::{CoachError, ContentGenerator, MessagePublisher, VotePayload};
use coachbot_ledger::{content_hash, Tally, VoteRecorder};
use coachbot_slack::blocks::daily_message;
use coachbot_slack::ActionMeta;
use coachbot_topic::TopicChoice;

use crate::context::RunContext;
use crate::ScopeArgs;

/// What `post` sent.
#[derive(Debug, Serialize)]
pub struct PostReport {
    pub message_id: String,
    pub date: String,
    pub topic: String,
    /// Platform timestamp; webhooks do not report one.
    pub ts: Option<String>,
    pub candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
struct VoteReport {
    recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Debug, Serialize)]
struct WinnerReport<'a> {
    date: &'a str,
    winner: Option<String>,
}

/// `coachbot topic`: print the topic, or nothing when the job already posted today.
pub fn topic(ctx: &RunContext, job: &str, date: Option<&str>) -> Result<(), CoachError> {
    let today = ctx.today(date)?;
    if let Some(choice) = choose_topic(ctx, job, &today) {
        println!("{}", choice.topic);
    }
    Ok(())
}

pub fn choose_topic(ctx: &RunContext, job_name: &str, today: &str) -> Option<TopicChoice> {
    let job = ctx.job(job_name);
    let scope = job.scope(&ctx.config.slack);
    if ctx.dedupe.already_sent_today(&scope, today) {
        info!(job = job_name, date = today, "already sent today, skipping");
        return None;
    }
    Some(ctx.selector(&job).select(today, &scope))
}

/// `coachbot run`: the whole daily run, printing a [`PostReport`] when a post went out.
pub async fn run(
    ctx: &RunContext,
    generator: &dyn ContentGenerator,
    publisher: &dyn MessagePublisher,
    job: &str,
    date: Option<&str>,
) -> Result<(), CoachError> {
    if let Some(report) = run_daily(ctx, generator, publisher, job, date).await? {
        print_json(&report)?;
    }
    Ok(())
}

/// Pick today's topic, generate content for it and publish.
///
/// Returns `None` before generating anything when the job already posted on
/// the date. A generation failure leaves no marker, so a retry can post.
pub async fn run_daily(
    ctx: &RunContext,
    generator: &dyn ContentGenerator,
    publisher: &dyn MessagePublisher,
    job_name: &str,
    date: Option<&str>,
) -> Result<Option<PostReport>, CoachError> {
    let today = ctx.today(date)?;
    let Some(choice) = choose_topic(ctx, job_name, &today) else {
        return Ok(None);
    };
    info!(job = job_name, topic = %choice.topic, source = ?choice.source, "generating daily content");

    let content = generator.generate(&choice.topic).await?;
    publish_daily(ctx, publisher, job_name, &choice.topic, &content, Some(today.as_str())).await
}

/// `coachbot post`: publish and print a [`PostReport`] as JSON.
pub async fn post(
    ctx: &RunContext,
    publisher: &dyn MessagePublisher,
    job: &str,
    topic: &str,
    content: &str,
    date: Option<&str>,
) -> Result<(), CoachError> {
    if let Some(report) = publish_daily(ctx, publisher, job, topic, content, date).await? {
        print_json(&report)?;
    }
    Ok(())
}

/// Publish the daily message for `job` and mark it sent.
///
/// Returns `None` without publishing when the job already posted on the
/// date. A failed marker write is logged; the message is already out.
pub async fn publish_daily(
    ctx: &RunContext,
    publisher: &dyn MessagePublisher,
    job_name: &str,
    topic: &str,
    content: &str,
    date: Option<&str>,
) -> Result<Option<PostReport>, CoachError> {
    if content.trim().is_empty() {
        return Err(CoachError::InvalidPayload("post content is empty".into()));
    }

    let job = ctx.job(job_name);
    let scope = job.scope(&ctx.config.slack);
    let today = ctx.today(date)?;
    if ctx.dedupe.already_sent_today(&scope, &today) {
        info!(job = job_name, date = %today, "already sent today, not posting");
        return Ok(None);
    }

    let candidates = ctx
        .selector(&job)
        .poll_candidates(&today, topic, ctx.config.topics.poll_size);
    let message_id = format!("{}:{today}", job.name);
    let channel = scope.channel().map(str::to_string);
    let meta = ActionMeta {
        message_id: Some(message_id.clone()),
        topic: Some(topic.to_string()),
        date: Some(today.clone()),
        job: Some(job.name.clone()),
        channel: channel.clone(),
        ..ActionMeta::default()
    };
    let message = daily_message(channel, &job.title_prefix, content, &meta, &candidates);

    let receipt = publisher.publish(&message).await?;
    info!(
        job = %job.name,
        message_id = %message_id,
        ts = receipt.ts.as_deref().unwrap_or("-"),
        "posted daily message"
    );

    if let Err(e) = ctx.dedupe.mark_sent(&scope, &today, &content_hash(content)) {
        error!(error = %e, job = %job.name, "failed to update dedupe marker");
    }

    Ok(Some(PostReport {
        message_id,
        date: today,
        topic: topic.to_string(),
        ts: receipt.ts,
        candidates,
    }))
}

/// Post body from a file, or stdin when no file is given.
pub fn read_content(path: Option<&Path>) -> Result<String, CoachError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(CoachError::storage),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(CoachError::storage)?;
            Ok(content)
        }
    }
}

pub fn read_vote(reader: impl Read) -> Result<VotePayload, CoachError> {
    serde_json::from_reader(reader)
        .map_err(|e| CoachError::InvalidPayload(format!("vote is not valid JSON: {e}")))
}

/// `coachbot vote`. A failed save is logged and reported, not fatal.
pub fn vote(ctx: &RunContext, payload: &VotePayload) -> Result<(), CoachError> {
    let report = match VoteRecorder::new(&ctx.store, ctx.clock.as_ref()).record_vote(payload) {
        Ok(path) => VoteReport {
            recorded: true,
            path: Some(path.display().to_string()),
        },
        Err(e) => {
            error!(error = %e, user = %payload.user_id, "failed to record vote");
            VoteReport {
                recorded: false,
                path: None,
            }
        }
    };
    print_json(&report)
}

pub fn feedback(ctx: &RunContext, message_id: &str, scope: &ScopeArgs) -> Result<(), CoachError> {
    let counts = Tally::new(&ctx.store).feedback_counts(message_id, &ctx.scope(scope));
    print_json(&counts)
}

pub fn poll(
    ctx: &RunContext,
    message_id: &str,
    candidates: &[String],
    scope: &ScopeArgs,
) -> Result<(), CoachError> {
    let tally = Tally::new(&ctx.store).poll_details(message_id, candidates, &ctx.scope(scope));
    print_json(&tally)
}

pub fn winner(ctx: &RunContext, date: &str, scope: &ScopeArgs) -> Result<(), CoachError> {
    let winner = Tally::new(&ctx.store).winning_next_topic(date, &ctx.scope(scope));
    print_json(&WinnerReport { date, winner })
}

pub fn print_config(config: &CoachConfig) -> Result<(), CoachError> {
    let rendered = config
        .to_toml_string()
        .map_err(|e| CoachError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), CoachError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| CoachError::Internal(format!("failed to render JSON: {e}")))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachbot_config::model::JobConfig;
    use coachbot_core::{JobScope, VoteKind};
    use coachbot_test_utils::{RecordingPublisher, ScriptedGenerator};
    use coachbot_topic::TopicSource;

    use crate::context::fixture;

    fn postgres_config() -> CoachConfig {
        let mut config = CoachConfig::default();
        config.jobs.push(JobConfig {
            channel: Some("C1".into()),
            title_prefix: "Postgres Coach".into(),
            topics: vec!["indexes".into(), "vacuum".into(), "wal".into(), "mvcc".into()],
            ..JobConfig::named("postgres")
        });
        config
    }

    #[tokio::test]
    async fn post_publishes_and_marks_sent() {
        let (ctx, _dir) = fixture(postgres_config());
        let publisher = RecordingPublisher::with_ts("1700.01");

        let report = publish_daily(&ctx, &publisher, "postgres", "indexes", "Use btree.", None)
            .await
            .unwrap()
            .expect("first post goes out");

        assert_eq!(report.message_id, "postgres:2026-02-06");
        assert_eq!(report.ts.as_deref(), Some("1700.01"));
        assert_eq!(report.candidates.len(), 3);
        assert!(!report.candidates.contains(&"indexes".to_string()));

        let sent = publisher.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel.as_deref(), Some("C1"));
        assert_eq!(sent[0].text, "*Postgres Coach*\n\nUse btree.");

        let scope = JobScope::for_channel("postgres", "C1");
        assert!(ctx.dedupe.already_sent_today(&scope, "2026-02-06"));
        assert!(choose_topic(&ctx, "postgres", "2026-02-06").is_none());
    }

    #[tokio::test]
    async fn second_post_same_day_is_skipped() {
        let (ctx, _dir) = fixture(postgres_config());
        let publisher = RecordingPublisher::new();

        publish_daily(&ctx, &publisher, "postgres", "indexes", "one", None)
            .await
            .unwrap();
        let again = publish_daily(&ctx, &publisher, "postgres", "indexes", "two", None)
            .await
            .unwrap();

        assert!(again.is_none());
        assert_eq!(publisher.sent_count().await, 1);
    }

    #[tokio::test]
    async fn failed_publish_leaves_no_marker() {
        let (ctx, _dir) = fixture(postgres_config());
        let publisher = RecordingPublisher::failing();

        let err = publish_daily(&ctx, &publisher, "postgres", "indexes", "tip", None)
            .await
            .unwrap_err();

        assert!(matches!(err, CoachError::Channel { .. }));
        assert!(choose_topic(&ctx, "postgres", "2026-02-06").is_some());
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let (ctx, _dir) = fixture(postgres_config());
        let publisher = RecordingPublisher::new();

        let err = publish_daily(&ctx, &publisher, "postgres", "indexes", "  \n", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoachError::InvalidPayload(_)));
        assert_eq!(publisher.sent_count().await, 0);
    }

    #[test]
    fn topic_prefers_yesterdays_winner() {
        let (ctx, _dir) = fixture(postgres_config());
        let seeded = choose_topic(&ctx, "postgres", "2026-02-07").unwrap();
        assert_eq!(seeded.source, TopicSource::Seeded);

        let mut nomination = VotePayload::new("u1", VoteKind::TopicNomination);
        nomination.message_id = Some("postgres:2026-02-06".into());
        nomination.job = Some("postgres".into());
        nomination.channel = Some("C1".into());
        nomination.send_date = Some("2026-02-06".into());
        nomination.candidate = Some("partitioning".into());
        vote(&ctx, &nomination).unwrap();

        let voted = choose_topic(&ctx, "postgres", "2026-02-07").unwrap();
        assert_eq!(voted.topic, "partitioning");
        assert_eq!(voted.source, TopicSource::Voted);
    }

    #[tokio::test]
    async fn run_generates_for_selected_topic_and_posts() {
        let (ctx, _dir) = fixture(postgres_config());
        let generator = ScriptedGenerator::replying("Use partial indexes.");
        let publisher = RecordingPublisher::with_ts("1700.02");
        let expected = choose_topic(&ctx, "postgres", "2026-02-07").unwrap().topic;

        let report = run_daily(&ctx, &generator, &publisher, "postgres", Some("2026-02-07"))
            .await
            .unwrap()
            .expect("first run posts");

        assert_eq!(report.topic, expected);
        assert_eq!(generator.requested_topics().await, vec![expected]);
        assert_eq!(report.message_id, "postgres:2026-02-07");
        assert_eq!(report.date, "2026-02-07");

        let sent = publisher.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "*Postgres Coach*\n\nUse partial indexes.");
        assert!(choose_topic(&ctx, "postgres", "2026-02-07").is_none());
    }

    #[tokio::test]
    async fn run_skips_generation_when_already_sent() {
        let (ctx, _dir) = fixture(postgres_config());
        let publisher = RecordingPublisher::new();
        publish_daily(&ctx, &publisher, "postgres", "indexes", "tip", None)
            .await
            .unwrap();

        let generator = ScriptedGenerator::replying("another tip");
        let report = run_daily(&ctx, &generator, &publisher, "postgres", None)
            .await
            .unwrap();

        assert!(report.is_none());
        assert!(generator.requested_topics().await.is_empty());
        assert_eq!(publisher.sent_count().await, 1);
    }

    #[tokio::test]
    async fn run_generation_failure_posts_nothing() {
        let (ctx, _dir) = fixture(postgres_config());
        let generator = ScriptedGenerator::failing();
        let publisher = RecordingPublisher::new();

        let err = run_daily(&ctx, &generator, &publisher, "postgres", None)
            .await
            .unwrap_err();

        assert!(matches!(err, CoachError::Provider { .. }));
        assert_eq!(publisher.sent_count().await, 0);
        assert!(choose_topic(&ctx, "postgres", "2026-02-06").is_some());
    }

    fn button_value(blocks: &serde_json::Value, action_id: &str) -> String {
        blocks
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|block| block["elements"].as_array())
            .flatten()
            .find(|element| element["action_id"] == action_id)
            .and_then(|element| element["value"].as_str())
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn webhook_job_without_channel_reads_its_own_nominations() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let mut config = CoachConfig::default();
        config.jobs.push(JobConfig {
            topics: vec!["indexes".into(), "vacuum".into(), "wal".into(), "mvcc".into()],
            ..JobConfig::named("postgres")
        });
        let (ctx, _dir) = fixture(config);
        let publisher = RecordingPublisher::new();
        let report = publish_daily(&ctx, &publisher, "postgres", "indexes", "tip", None)
            .await
            .unwrap()
            .unwrap();
        let candidate = report.candidates[0].clone();

        let sent = publisher.sent_messages().await;
        let payload = serde_json::json!({
            "type": "block_actions",
            "user": {"id": "U1", "username": "ada"},
            "actions": [{
                "action_id": "vote_next_topic_0",
                "value": button_value(&sent[0].blocks, "vote_next_topic_0"),
            }],
            "container": {"channel_id": "C9"},
            "channel": {"id": "C9"}
        });
        let body = serde_urlencoded::to_string([("payload", payload.to_string())]).unwrap();
        let state = coachbot_gateway::GatewayState::new(ctx.store.clone(), ctx.clock.clone());
        let response = coachbot_gateway::build_router(state)
            .oneshot(
                Request::post("/slack/actions")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let next = choose_topic(&ctx, "postgres", "2026-02-07").unwrap();
        assert_eq!(next.source, TopicSource::Voted);
        assert_eq!(next.topic, candidate);
        assert!(ctx.store.state_dir().join("votes_postgres.json").exists());
        assert!(!ctx.store.state_dir().join("votes_postgres_C9.json").exists());
    }

    #[test]
    fn read_vote_accepts_wire_names() {
        let raw = r#"{"user_id": "u1", "vote": "thumbs_up", "message_id": "m1",
                      "job": "postgres", "channel": "C1", "user_image": "http://img"}"#;
        let payload = read_vote(raw.as_bytes()).unwrap();
        assert_eq!(payload.kind, VoteKind::ThumbsUp);
        assert_eq!(payload.user_avatar.as_deref(), Some("http://img"));

        assert!(matches!(
            read_vote("not json".as_bytes()),
            Err(CoachError::InvalidPayload(_))
        ));
    }

    #[test]
    fn read_content_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tip.md");
        std::fs::write(&path, "Use EXPLAIN.").unwrap();
        assert_eq!(read_content(Some(path.as_path())).unwrap(), "Use EXPLAIN.");
        assert!(read_content(Some(dir.path().join("missing.md").as_path())).is_err());
    }
}
