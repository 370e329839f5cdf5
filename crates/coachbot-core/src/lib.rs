// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Coachbot.
//!
//! This crate provides the error type, the vote and scope types shared by the
//! ledger and the chat-platform collaborators, and the trait seams (clock,
//! publisher, content generator) that let every other crate be tested in
//! isolation.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CoachError;
pub use types::{
    AvatarRef, JobScope, LedgerKind, OutboundMessage, PublishReceipt, VoteKind, VotePayload,
    KEYLESS_LEDGER_KEY,
};

pub use traits::{Clock, ContentGenerator, FixedClock, MessagePublisher, SystemClock};
