// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! "Already posted today" markers, one per (job, channel).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use coachbot_core::{CoachError, JobScope};

use crate::path::{scoped_file, DEDUPE_STEM};
use crate::store::write_atomic;

/// Contents of a `last_sent_*.json` marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeMarker {
    pub last_sent_date: String,
    #[serde(default)]
    pub last_message_hash: Option<String>,
}

/// Lowercase hex SHA-256 of posted content.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct DedupeGuard {
    state_dir: PathBuf,
    enabled: bool,
}

impl DedupeGuard {
    pub fn new(state_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            state_dir: state_dir.into(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn marker_path(&self, scope: &JobScope) -> PathBuf {
        scoped_file(&self.state_dir, DEDUPE_STEM, scope.job(), scope.channel())
    }

    /// Whether `scope` already posted on `date`.
    ///
    /// A disabled guard, a missing marker, and an unreadable marker all
    /// answer `false`; the last one is logged.
    pub fn already_sent_today(&self, scope: &JobScope, date: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let path = self.marker_path(scope);
        match read_marker(&path) {
            Ok(Some(marker)) if marker.last_sent_date == date => {
                info!(scope = %scope, date, "message already sent today, skipping");
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read dedupe marker");
                false
            }
        }
    }

    /// Record that `scope` posted on `date`. No-op when disabled.
    pub fn mark_sent(
        &self,
        scope: &JobScope,
        date: &str,
        content_hash: &str,
    ) -> Result<(), CoachError> {
        if !self.enabled {
            return Ok(());
        }
        let marker = DedupeMarker {
            last_sent_date: date.to_string(),
            last_message_hash: Some(content_hash.to_string()),
        };
        let bytes = serde_json::to_vec(&marker).map_err(CoachError::storage)?;
        let path = self.marker_path(scope);
        write_atomic(&path, &bytes)?;
        info!(scope = %scope, date, "updated dedupe marker");
        Ok(())
    }
}

fn read_marker(path: &Path) -> Result<Option<DedupeMarker>, CoachError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CoachError::storage(e)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(CoachError::storage)
}
