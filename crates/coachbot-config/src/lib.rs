// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Coachbot.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `COACHBOT_*` environment variable overrides, and
//! miette diagnostic rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use coachbot_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("state dir: {}", config.state.dir);
//! ```

use std::path::Path;

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CoachConfig;

/// Load configuration and validate it.
///
/// With `explicit` set, only that file (plus env overrides) is read; otherwise
/// the XDG hierarchy is merged. Figment errors are converted to diagnostics
/// with source spans when the offending file can be read back.
pub fn load_and_validate(explicit: Option<&Path>) -> Result<CoachConfig, Vec<ConfigError>> {
    let loaded = match explicit {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };

    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources(explicit);
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<CoachConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources(explicit: Option<&Path>) -> Vec<(String, String)> {
    let candidates: Vec<std::path::PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => {
            let mut paths = vec![
                std::env::current_dir()
                    .map(|d| d.join(loader::LOCAL_CONFIG_PATH))
                    .unwrap_or_else(|_| loader::LOCAL_CONFIG_PATH.into()),
            ];
            paths.extend(loader::user_config_path());
            paths.push(loader::SYSTEM_CONFIG_PATH.into());
            paths
        }
    };

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
