// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the ledger, the scheduled run, and the chat platform.

pub mod clock;
pub mod generator;
pub mod publisher;

pub use clock::{Clock, FixedClock, SystemClock};
pub use generator::ContentGenerator;
pub use publisher::MessagePublisher;
