// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File naming for ledgers and dedupe markers.
//!
//! Scoping is done purely by file name: `{stem}_{job}_{channel}.json`,
//! `{stem}_{job}.json`, or the legacy unscoped `{stem}.json`. A channel
//! without a job never produces a scoped name.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use coachbot_core::{JobScope, LedgerKind};

/// File name stem of per-(job, channel) dedupe markers.
pub const DEDUPE_STEM: &str = "last_sent";

/// Resolve the ledger file for a kind and optional job/channel.
pub fn resolve_path(
    state_dir: &Path,
    kind: LedgerKind,
    job: Option<&str>,
    channel: Option<&str>,
) -> PathBuf {
    scoped_file(state_dir, kind.file_stem(), job, channel)
}

/// Resolve the ledger file for a kind within a [`JobScope`].
pub fn ledger_path(state_dir: &Path, kind: LedgerKind, scope: &JobScope) -> PathBuf {
    resolve_path(state_dir, kind, scope.job(), scope.channel())
}

/// Build `{stem}[_{job}[_{channel}]].json` under `state_dir`.
pub fn scoped_file(
    state_dir: &Path,
    stem: &str,
    job: Option<&str>,
    channel: Option<&str>,
) -> PathBuf {
    let job = job.filter(|j| !j.is_empty());
    let channel = channel.filter(|c| !c.is_empty());

    let name = match (job, channel) {
        (Some(job), Some(channel)) => format!(
            "{stem}_{}_{}.json",
            sanitize_component(job),
            sanitize_component(channel)
        ),
        (Some(job), None) => format!("{stem}_{}.json", sanitize_component(job)),
        (None, _) => format!("{stem}.json"),
    };
    state_dir.join(name)
}

/// Replace anything outside `[A-Za-z0-9_.-]` with `_` so identifiers can
/// never escape the state directory.
pub fn sanitize_component(raw: &str) -> Cow<'_, str> {
    let safe = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
    if raw.chars().all(safe) && raw != "." && raw != ".." {
        return Cow::Borrowed(raw);
    }
    let replaced: String = raw.chars().map(|c| if safe(c) { c } else { '_' }).collect();
    match replaced.as_str() {
        "." | ".." => Cow::Owned(replaced.replace('.', "_")),
        _ => Cow::Owned(replaced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_and_channel_scope_the_file() {
        let p = resolve_path(Path::new("/s"), LedgerKind::Feedback, Some("postgres"), Some("C1"));
        assert_eq!(p, PathBuf::from("/s/feedback_postgres_C1.json"));
    }

    #[test]
    fn job_only_scope() {
        let p = resolve_path(Path::new("/s"), LedgerKind::TopicVotes, Some("postgres"), None);
        assert_eq!(p, PathBuf::from("/s/votes_postgres.json"));
    }

    #[test]
    fn channel_without_job_is_unscoped() {
        let p = resolve_path(Path::new("/s"), LedgerKind::Feedback, None, Some("C1"));
        assert_eq!(p, PathBuf::from("/s/feedback.json"));

        let p = resolve_path(Path::new("/s"), LedgerKind::Feedback, None, None);
        assert_eq!(p, PathBuf::from("/s/feedback.json"));
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let p = resolve_path(Path::new("/s"), LedgerKind::Feedback, Some(""), Some("C1"));
        assert_eq!(p, PathBuf::from("/s/feedback.json"));

        let p = resolve_path(Path::new("/s"), LedgerKind::Feedback, Some("pg"), Some(""));
        assert_eq!(p, PathBuf::from("/s/feedback_pg.json"));
    }

    #[test]
    fn scope_helper_matches_raw_resolver() {
        let scope = JobScope::for_channel("data_engineering", "C9");
        assert_eq!(
            ledger_path(Path::new("/s"), LedgerKind::TopicVotes, &scope),
            PathBuf::from("/s/votes_data_engineering_C9.json")
        );
    }

    #[test]
    fn hostile_identifiers_stay_inside_state_dir() {
        let p = resolve_path(Path::new("/s"), LedgerKind::Feedback, Some("../etc"), Some("a/b"));
        assert_eq!(p, PathBuf::from("/s/feedback_.._etc_a_b.json"));
        assert_eq!(p.parent(), Some(Path::new("/s")));
        assert_eq!(sanitize_component(".."), "__");
        assert_eq!(sanitize_component("dev-ops.v2"), "dev-ops.v2");
    }

    #[test]
    fn dedupe_marker_uses_same_scheme() {
        let p = scoped_file(Path::new("/s"), DEDUPE_STEM, Some("postgres"), Some("C1"));
        assert_eq!(p, PathBuf::from("/s/last_sent_postgres_C1.json"));
    }
}
