// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack integration for Coachbot.
//!
//! Covers both directions: posting the daily message (incoming webhook or
//! `chat.postMessage`) and handling the button clicks Slack sends back
//! (request signature checks, payload parsing, and count refreshes).

pub mod blocks;
pub mod client;
pub mod interaction;
pub mod signature;

pub use client::SlackClient;
pub use interaction::{ActionMeta, InteractionPayload};
pub use signature::SignatureVerifier;
