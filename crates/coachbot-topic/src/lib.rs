// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily topic selection.
//!
//! Each run resolves "today" in the configured timezone, then uses the
//! previous day's winning nomination for the job's scope if there is one.
//! Otherwise it picks from the job's topic pool with an RNG seeded by the
//! date, so reruns on the same day agree.

pub mod calendar;
pub mod pool;
pub mod selector;

pub use calendar::{date_seed, previous_day, today};
pub use pool::TopicPool;
pub use selector::{TopicChoice, TopicSelector, TopicSource};
