// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where a job's candidate topics come from.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use coachbot_config::model::{JobConfig, TopicMode, TopicsConfig, DEFAULT_TOPICS};
use coachbot_core::CoachError;

/// A non-empty, duplicate-free list of topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPool(Vec<String>);

impl TopicPool {
    /// Returns `None` when no non-blank topic remains after dedup.
    pub fn new(topics: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut unique: Vec<String> = Vec::new();
        for topic in topics {
            let topic = topic.trim().to_string();
            if !topic.is_empty() && !unique.contains(&topic) {
                unique.push(topic);
            }
        }
        (!unique.is_empty()).then_some(Self(unique))
    }

    /// The built-in Postgres curriculum.
    pub fn builtin() -> Self {
        Self(DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect())
    }

    /// Pick the pool for `job`: its own topics, else the curated curriculum
    /// file in `curated` mode, else the configured defaults, else the
    /// built-in list.
    pub fn resolve(config: &TopicsConfig, job: Option<&JobConfig>) -> Self {
        if let Some(pool) = job.and_then(|j| Self::new(j.topics.iter().cloned())) {
            debug!(job = job.map(|j| j.name.as_str()), "using job topic list");
            return pool;
        }

        if config.mode == TopicMode::Curated {
            let path = Path::new(&config.curriculum_file);
            match load_curriculum(path) {
                Ok(Some(pool)) => return pool,
                Ok(None) => {
                    warn!(path = %path.display(), "curriculum has no topics, using defaults")
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load curriculum file, using defaults")
                }
            }
        }

        Self::new(config.defaults.iter().cloned()).unwrap_or_else(Self::builtin)
    }

    pub fn topics(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Curriculum {
    #[serde(default)]
    topics: Vec<String>,
}

/// Read a curriculum file with a top-level `topics` list.
///
/// `.yml` and `.yaml` files are parsed as YAML, anything else as TOML.
pub fn load_curriculum(path: &Path) -> Result<Option<TopicPool>, CoachError> {
    let raw = fs::read_to_string(path).map_err(CoachError::storage)?;
    let invalid = |e: &dyn std::fmt::Display| CoachError::Config(format!("{}: {e}", path.display()));

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));
    let curriculum: Curriculum = if is_yaml {
        serde_yaml::from_str::<Option<Curriculum>>(&raw)
            .map_err(|e| invalid(&e))?
            .unwrap_or_default()
    } else {
        toml::from_str(&raw).map_err(|e| invalid(&e))?
    };
    Ok(TopicPool::new(curriculum.topics))
}
