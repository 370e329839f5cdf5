// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat-file persistence for Coachbot.
//!
//! Votes are kept in JSON ledgers under a state directory, partitioned by
//! kind (thumbs feedback vs. next-topic nominations) and by (job, channel)
//! through the file name. The same directory holds the per-scope markers
//! that stop a job from posting twice on one day.

pub mod dedupe;
pub mod model;
pub mod path;
pub mod recorder;
pub mod state;
pub mod store;
pub mod tally;

pub use dedupe::{content_hash, DedupeGuard, DedupeMarker};
pub use model::{LedgerEntry, LedgerFile, VoteRecord};
pub use path::resolve_path;
pub use recorder::VoteRecorder;
pub use state::{prepare_state_dir, PreparedState};
pub use store::{LedgerStore, LoadOutcome};
pub use tally::{recent_avatars, FeedbackCounts, PollOption, PollTally, Tally};
