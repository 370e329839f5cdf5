// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./coachbot.toml` > `~/.config/coachbot/coachbot.toml` > `/etc/coachbot/coachbot.toml`
//! with environment variable overrides via `COACHBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CoachConfig;

/// Sections that may be targeted by `COACHBOT_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "logging",
    "state",
    "schedule",
    "topics",
    "slack",
    "server",
    "generator",
];

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/coachbot/coachbot.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "coachbot.toml";

/// User configuration file under the XDG config directory, if one can be located.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("coachbot/coachbot.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/coachbot/coachbot.toml` (system-wide)
/// 3. `~/.config/coachbot/coachbot.toml` (user XDG config)
/// 4. `./coachbot.toml` (local directory)
/// 5. `COACHBOT_*` environment variables
pub fn load_config() -> Result<CoachConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CoachConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CoachConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CoachConfig, figment::Error> {
    tracing::debug!(path = %path.display(), "loading configuration file");
    Figment::new()
        .merge(Serialized::defaults(CoachConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CoachConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Only the leading section name is turned into a dot, so
/// `COACHBOT_SLACK_SIGNING_SECRET` maps to `slack.signing_secret` and not
/// `slack.signing.secret`.
fn env_provider() -> Env {
    Env::prefixed("COACHBOT_").map(|key| env_key_to_path(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a config key path.
pub(crate) fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
