// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Choosing a usable state directory at startup.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

/// The directory ledgers and markers will live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedState {
    pub dir: PathBuf,
    /// False when dedupe was disabled by config or because no directory
    /// could be created.
    pub dedupe_enabled: bool,
}

/// Create `primary`, or failing that `fallback`.
///
/// When neither can be created the primary path is kept (ledger writes will
/// fail and be logged) and dedupe is turned off so runs are not blocked.
pub fn prepare_state_dir(primary: &Path, fallback: &Path, dedupe_enabled: bool) -> PreparedState {
    let primary_err = match fs::create_dir_all(primary) {
        Ok(()) => {
            return PreparedState {
                dir: primary.to_path_buf(),
                dedupe_enabled,
            };
        }
        Err(e) => e,
    };
    warn!(
        dir = %primary.display(),
        error = %primary_err,
        fallback = %fallback.display(),
        "failed to create state directory, trying fallback"
    );

    match fs::create_dir_all(fallback) {
        Ok(()) => {
            info!(dir = %fallback.display(), "using fallback state directory");
            PreparedState {
                dir: fallback.to_path_buf(),
                dedupe_enabled,
            }
        }
        Err(e) => {
            error!(
                dir = %fallback.display(),
                error = %e,
                "failed to create fallback state directory, disabling dedupe"
            );
            PreparedState {
                dir: primary.to_path_buf(),
                dedupe_enabled: false,
            }
        }
    }
}
