// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Picking today's topic and the next-topic poll options.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use strum::Display;
use tracing::info;

use coachbot_core::JobScope;
use coachbot_ledger::{LedgerStore, Tally};

use crate::calendar::{date_seed, previous_day};
use crate::pool::TopicPool;

/// Why a topic was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TopicSource {
    /// Winner of the previous day's next-topic poll.
    Voted,
    /// Deterministic pick from the pool, seeded by the date.
    Seeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicChoice {
    pub topic: String,
    pub source: TopicSource,
}

pub struct TopicSelector<'a> {
    tally: Tally<'a>,
    pool: TopicPool,
}

impl<'a> TopicSelector<'a> {
    pub fn new(store: &'a LedgerStore, pool: TopicPool) -> Self {
        Self {
            tally: Tally::new(store),
            pool,
        }
    }

    pub fn pool(&self) -> &TopicPool {
        &self.pool
    }

    /// Yesterday's winning nomination for `scope`, or a seeded pick.
    ///
    /// A voted topic need not be in the pool.
    pub fn select(&self, today: &str, scope: &JobScope) -> TopicChoice {
        let winner = previous_day(today)
            .and_then(|yesterday| self.tally.winning_next_topic(&yesterday, scope));

        let choice = match winner {
            Some(topic) => TopicChoice {
                topic,
                source: TopicSource::Voted,
            },
            None => TopicChoice {
                topic: self.seeded_pick(today),
                source: TopicSource::Seeded,
            },
        };
        info!(scope = %scope, date = today, topic = %choice.topic, source = %choice.source, "selected topic");
        choice
    }

    /// Up to `n` distinct pool topics other than `topic`, stable for a date.
    pub fn poll_candidates(&self, today: &str, topic: &str, n: usize) -> Vec<String> {
        let others: Vec<&String> = self
            .pool
            .topics()
            .iter()
            .filter(|t| t.as_str() != topic)
            .collect();
        let mut rng = StdRng::seed_from_u64(date_seed(today).wrapping_add(1));
        others
            .choose_multiple(&mut rng, n)
            .map(|t| (*t).clone())
            .collect()
    }

    fn seeded_pick(&self, today: &str) -> String {
        let topics = self.pool.topics();
        let mut rng = StdRng::seed_from_u64(date_seed(today));
        topics[rng.gen_range(0..topics.len())].clone()
    }
}
