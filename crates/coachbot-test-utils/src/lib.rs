// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Coachbot integration tests.
//!
//! Provides a temp-directory harness, a mock publisher and a scripted
//! generator for fast, deterministic, CI-runnable tests without Slack.
//!
//! # Components
//!
//! - [`TestHarness`] - Temp state directory, ledger store, fixed clock, dedupe guard
//! - [`VoteBuilder`] - Fluent construction of vote payloads
//! - [`RecordingPublisher`] - Mock publisher that captures outbound messages
//! - [`ScriptedGenerator`] - Content generator with a fixed reply

pub mod harness;
pub mod mock_generator;
pub mod mock_publisher;

pub use harness::{scope, TestHarness, VoteBuilder};
pub use mock_generator::ScriptedGenerator;
pub use mock_publisher::RecordingPublisher;
