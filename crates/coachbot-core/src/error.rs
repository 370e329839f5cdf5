// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Coachbot workspace.

use thiserror::Error;

/// The primary error type used across Coachbot crates.
#[derive(Debug, Error)]
pub enum CoachError {
    /// Configuration errors (missing credentials, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// State directory errors (unwritable file, serialization failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat platform errors (HTTP failure, non-ok API response).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Language-model errors (HTTP failure, API error, empty completion).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An inbound interactive payload could not be turned into a vote.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Request signature verification failed.
    #[error("signature rejected: {0}")]
    Signature(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoachError {
    /// Wraps any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CoachError::Storage {
            source: Box::new(err),
        }
    }
}
